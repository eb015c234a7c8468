//! Web scraper for Grand Prix result pages
//!
//! Fetches one encyclopedia article per (event, season), picks the race or
//! qualifying results table by its headers and writes every table found into
//! one raw CSV.
//!
//! # Example
//!
//! ```no_run
//! use f1race::data::TableKind;
//! use f1race::scraper::{ResultsScraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scraper = ResultsScraper::new(ScraperConfig::default())?;
//!
//!     let summary = scraper
//!         .scrape_to_file(TableKind::Race, "data/raw/f1_corrida_bruto.csv", |_, _| {})
//!         .await?;
//!     println!("Scraped {} pages", summary.pages_with_table);
//!
//!     Ok(())
//! }
//! ```

mod catalog;
mod client;
mod tables;

pub use catalog::{
    all_pages, first_race_pages, page_url, PageRequest, FIRST_RACE_OF_YEAR, RACES_BY_YEAR,
    WIKI_BASE_URL,
};
pub use client::{ScraperConfig, ScraperError, WikiClient};
pub use tables::{extract_results_table, list_tables, matches_kind, TableOverview};

use std::path::Path;
use tracing::{info, warn};

use crate::data::csv_loader::write_table;
use crate::data::schema::TableKind;
use crate::data::table::Table;
use crate::error::{PipelineError, Result};

/// What happened to one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Scraped { rows: usize },
    NoTable,
    Failed,
}

/// Counts from one scraping run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub pages: usize,
    pub pages_with_table: usize,
    pub failed_pages: usize,
    pub rows: usize,
}

/// Tables found on one page by [`ResultsScraper::inspect`]
#[derive(Debug, Clone)]
pub struct PageTables {
    pub page: PageRequest,
    /// `None` when the page could not be fetched or parsed
    pub tables: Option<Vec<TableOverview>>,
}

/// Tag every row of a page table with its season and event
pub fn tag_table(mut table: Table, page: &PageRequest) -> Table {
    table.add_column("Ano", Some(page.season.to_string()));
    table.add_column("GP", Some(page.event.clone()));
    table
}

/// Results scraper over the event catalog
pub struct ResultsScraper {
    client: WikiClient,
    pages: Vec<PageRequest>,
}

impl ResultsScraper {
    /// Scraper over every catalog page
    pub fn new(config: ScraperConfig) -> Result<Self> {
        Self::with_pages(config, all_pages())
    }

    /// Scraper over a chosen page list
    pub fn with_pages(config: ScraperConfig, pages: Vec<PageRequest>) -> Result<Self> {
        Ok(Self {
            client: WikiClient::new(config)?,
            pages,
        })
    }

    pub fn pages(&self) -> &[PageRequest] {
        &self.pages
    }

    /// Fetch one page and extract its results table
    pub async fn scrape_page(
        &self,
        page: &PageRequest,
        kind: TableKind,
    ) -> std::result::Result<Option<Table>, ScraperError> {
        let html = self.client.fetch_page(&page.url()).await?;
        Ok(extract_results_table(&html, kind)?.map(|t| tag_table(t, page)))
    }

    /// Scrape every page, calling `on_page` after each one
    ///
    /// Pages that fail or have no matching table are skipped.
    pub async fn scrape<F>(&self, kind: TableKind, mut on_page: F) -> (Vec<Table>, ScrapeSummary)
    where
        F: FnMut(&PageRequest, PageOutcome),
    {
        let mut tables = Vec::new();
        let mut summary = ScrapeSummary {
            pages: self.pages.len(),
            ..Default::default()
        };

        for page in &self.pages {
            let outcome = match self.scrape_page(page, kind).await {
                Ok(Some(table)) => {
                    let rows = table.height();
                    summary.pages_with_table += 1;
                    summary.rows += rows;
                    tables.push(table);
                    PageOutcome::Scraped { rows }
                }
                Ok(None) => {
                    warn!("No {} table on {} {}", kind.label(), page.event, page.season);
                    PageOutcome::NoTable
                }
                Err(e) => {
                    warn!("Skipping {} {}: {}", page.event, page.season, e);
                    summary.failed_pages += 1;
                    PageOutcome::Failed
                }
            };
            on_page(page, outcome);
        }

        (tables, summary)
    }

    /// Scrape every page and write the combined raw table
    ///
    /// Fails with [`PipelineError::NothingScraped`] and writes nothing when
    /// no page produced a table.
    pub async fn scrape_to_file<P, F>(
        &self,
        kind: TableKind,
        path: P,
        on_page: F,
    ) -> Result<ScrapeSummary>
    where
        P: AsRef<Path>,
        F: FnMut(&PageRequest, PageOutcome),
    {
        let (tables, summary) = self.scrape(kind, on_page).await;
        write_scraped(tables, kind, path)?;
        Ok(summary)
    }

    /// List the tables of each page without extracting any of them
    pub async fn inspect(&self, pages: &[PageRequest]) -> Vec<PageTables> {
        let mut out = Vec::with_capacity(pages.len());

        for page in pages {
            let listed = self
                .client
                .fetch_page(&page.url())
                .await
                .and_then(|html| list_tables(&html));
            let tables = match listed {
                Ok(tables) => {
                    info!("{} {}: {} tables", page.event, page.season, tables.len());
                    Some(tables)
                }
                Err(e) => {
                    warn!("Could not inspect {} {}: {}", page.event, page.season, e);
                    None
                }
            };
            out.push(PageTables {
                page: page.clone(),
                tables,
            });
        }

        out
    }
}

/// Concatenate page tables and write them as a raw CSV
pub fn write_scraped<P: AsRef<Path>>(
    tables: Vec<Table>,
    kind: TableKind,
    path: P,
) -> Result<Table> {
    if tables.is_empty() {
        return Err(PipelineError::NothingScraped(kind.label()));
    }

    let combined = Table::concat(tables);
    write_table(&combined, &path)?;
    info!(
        "Saved {} raw {} rows to {:?}",
        combined.height(),
        kind.label(),
        path.as_ref()
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_table(columns: &[&str], row: &[&str]) -> Table {
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            vec![row.iter().map(|v| Some(v.to_string())).collect()],
        )
        .unwrap()
    }

    #[test]
    fn test_tag_table() {
        let page = PageRequest::new("Grande_Prêmio_de_Mônaco", 2021);
        let table = tag_table(page_table(&["Pos.", "Piloto"], &["1", "Max Verstappen"]), &page);

        assert_eq!(table.columns(), &["Pos.", "Piloto", "Ano", "GP"]);
        assert_eq!(table.get(0, "Ano"), Some("2021"));
        assert_eq!(table.get(0, "GP"), Some("Grande_Prêmio_de_Mônaco"));
    }

    #[test]
    fn test_write_scraped_nothing_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f1_corrida_bruto.csv");

        let err = write_scraped(vec![], TableKind::Race, &path).unwrap_err();

        assert!(matches!(err, PipelineError::NothingScraped(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_scraped_unions_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw").join("f1_classificacao_bruto.csv");
        let tables = vec![
            page_table(&["Pos.", "Piloto", "Ano"], &["1", "Hamilton", "2014"]),
            page_table(&["Pos.", "Driver", "Ano"], &["1", "Verstappen", "2022"]),
        ];

        let combined = write_scraped(tables, TableKind::Qualifying, &path).unwrap();

        assert_eq!(combined.columns(), &["Pos.", "Piloto", "Ano", "Driver"]);
        assert_eq!(combined.get(1, "Piloto"), None);
        assert_eq!(combined.get(1, "Driver"), Some("Verstappen"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with('\u{feff}'));
    }
}
