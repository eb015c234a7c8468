//! Results table extraction from encyclopedia pages
//!
//! A page holds many `table.wikitable` elements. The results table is the
//! first one whose header texts match the table kind. Its leading all-`th`
//! rows become column labels (tuple-shaped when there are several), and the
//! remaining rows become text cells.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::ScraperError;
use crate::data::schema::TableKind;
use crate::data::table::{clean_cell, Cell, Table};

const LAPS_HEADERS: [&str; 3] = ["Voltas", "Voltas'", "Laps"];
const POINTS_HEADERS: [&str; 3] = ["Pontos", "Pts.", "Points"];

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::ParseError(e.to_string()))
}

/// Text fragments of an element, skipping `<sup>` footnote markers
fn fragments<'a>(element: ElementRef<'a>) -> Vec<&'a str> {
    let mut out = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_footnote = node
            .ancestors()
            .take_while(|a| a.id() != element.id())
            .any(|a| a.value().as_element().is_some_and(|e| e.name() == "sup"));
        if !in_footnote {
            out.push(&**text);
        }
    }
    out
}

/// Header text as matched by the selection heuristics: trimmed pieces joined
fn header_text(element: ElementRef) -> String {
    fragments(element).iter().map(|f| f.trim()).collect()
}

/// Cell text with whitespace runs collapsed
fn cell_text(element: ElementRef) -> String {
    fragments(element)
        .concat()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn owning_table(row: ElementRef) -> Option<ElementRef> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

/// Rows that belong to `table` itself, not to tables nested inside it
fn own_rows<'a>(table: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, ScraperError> {
    let tr = selector("tr")?;
    Ok(table
        .select(&tr)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(table.id()))
        .collect())
}

fn own_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "th" | "td"))
        .collect()
}

/// Does this header list identify the table we want?
pub fn matches_kind(headers: &[String], kind: TableKind) -> bool {
    let has = |name: &str| headers.iter().any(|h| h == name);
    match kind {
        TableKind::Race => {
            LAPS_HEADERS.iter().any(|h| has(h))
                && POINTS_HEADERS.iter().any(|h| has(h))
                && headers
                    .iter()
                    .any(|h| h.starts_with("Tempo") || h.starts_with("Time"))
        }
        TableKind::Qualifying => has("Q1") && has("Q2") && (has("Piloto") || has("Driver")),
    }
}

#[derive(Debug, Clone)]
struct GridCell {
    text: String,
    is_header: bool,
}

fn span(element: ElementRef, attr: &str) -> usize {
    element
        .value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// Expand `colspan`/`rowspan` so every row has one entry per column
fn expand_grid(rows: &[ElementRef]) -> Vec<Vec<GridCell>> {
    // column -> (rows still covered, cell)
    let mut pending: Vec<Option<(usize, GridCell)>> = Vec::new();
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut out: Vec<GridCell> = Vec::new();
        let mut cells = own_cells(*row).into_iter();
        let mut col = 0;

        loop {
            if let Some(Some((remaining, cell))) = pending.get_mut(col) {
                out.push(cell.clone());
                *remaining -= 1;
                if *remaining == 0 {
                    pending[col] = None;
                }
                col += 1;
                continue;
            }

            let Some(element) = cells.next() else {
                // Short row: pad up to any rowspan still pending further right
                if pending.iter().skip(col).any(Option::is_some) {
                    out.push(GridCell {
                        text: String::new(),
                        is_header: true,
                    });
                    col += 1;
                    continue;
                }
                break;
            };
            let cell = GridCell {
                text: cell_text(element),
                is_header: element.value().name() == "th",
            };
            let rowspan = span(element, "rowspan");
            for _ in 0..span(element, "colspan") {
                if rowspan > 1 {
                    if pending.len() <= col {
                        pending.resize(col + 1, None);
                    }
                    pending[col] = Some((rowspan - 1, cell.clone()));
                }
                out.push(cell.clone());
                col += 1;
            }
        }

        grid.push(out);
    }

    grid
}

/// Python-style repr of a string: single quotes unless the text has one
fn python_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Label of one column from its per-header-row texts
fn column_label(parts: &[String]) -> String {
    match parts {
        [single] => single.clone(),
        _ => format!(
            "({})",
            parts.iter().map(|p| python_repr(p)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Suffix repeated labels with `.1`, `.2`, ...
fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let mut candidate = label.clone();
        let mut n = 0;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", label, n);
        }
        seen.push(candidate);
    }
    seen
}

/// Convert one HTML table to text rows
fn table_from_element(table: ElementRef) -> Result<Table, ScraperError> {
    let grid = expand_grid(&own_rows(table)?);

    let header_count = grid
        .iter()
        .take_while(|row| !row.is_empty() && row.iter().all(|c| c.is_header))
        .count();
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let labels: Vec<String> = if header_count == 0 {
        (0..width).map(|i| i.to_string()).collect()
    } else {
        (0..width)
            .map(|col| {
                let parts: Vec<String> = grid[..header_count]
                    .iter()
                    .map(|row| row.get(col).map(|c| c.text.clone()).unwrap_or_default())
                    .collect();
                column_label(&parts)
            })
            .collect()
    };

    let rows: Vec<Vec<Cell>> = grid[header_count..]
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            (0..width)
                .map(|col| row.get(col).and_then(|c| clean_cell(&c.text)))
                .collect()
        })
        .collect();

    Table::from_rows(dedupe_labels(labels), rows)
        .map_err(|e| ScraperError::ParseError(e.to_string()))
}

/// Find and extract the results table of `kind` from a page
///
/// Returns `Ok(None)` when no table on the page matches.
pub fn extract_results_table(html: &str, kind: TableKind) -> Result<Option<Table>, ScraperError> {
    let document = Html::parse_document(html);
    let wikitable = selector("table.wikitable")?;
    let th = selector("th")?;

    for table in document.select(&wikitable) {
        let headers: Vec<String> = table.select(&th).map(header_text).collect();
        if matches_kind(&headers, kind) {
            return table_from_element(table).map(Some);
        }
    }

    Ok(None)
}

/// One `table.wikitable` on a page, as seen by the explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOverview {
    /// Heading of the section holding the table, when one precedes it
    pub section: Option<String>,
    /// Text of every `th` in the table, in document order
    pub headers: Vec<String>,
}

fn heading_text(heading: ElementRef, span: &Selector) -> String {
    match heading.select(span).next() {
        Some(title) => header_text(title),
        None => header_text(heading),
    }
}

/// List every `table.wikitable` on a page with its section and headers
pub fn list_tables(html: &str) -> Result<Vec<TableOverview>, ScraperError> {
    let document = Html::parse_document(html);
    let items = selector("h2, h3, h4, table.wikitable")?;
    let span = selector("span")?;
    let th = selector("th")?;

    let mut section = None;
    let mut tables = Vec::new();
    for element in document.select(&items) {
        if element.value().name() == "table" {
            tables.push(TableOverview {
                section: section.clone(),
                headers: element.select(&th).map(header_text).collect(),
            });
        } else {
            section = Some(heading_text(element, &span)).filter(|t| !t.is_empty());
        }
    }

    Ok(tables)
}
