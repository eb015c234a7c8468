//! Grand Prix pages to scrape, per season

use serde::{Deserialize, Serialize};

/// Base URL of the Portuguese-language encyclopedia
pub const WIKI_BASE_URL: &str = "https://pt.wikipedia.org/wiki";

/// Events held in every season of the range
const EVERY_SEASON: &[i32] = &[2014, 2015, 2016, 2017, 2018, 2019, 2020, 2021, 2022, 2023, 2024];

/// Every event name with the seasons it was held, 2014 to 2024
pub const RACES_BY_YEAR: &[(&str, &[i32])] = &[
    ("Grande_Prêmio_da_Austrália", &[2014, 2015, 2016, 2017, 2018, 2019, 2022, 2023, 2024]),
    ("Grande_Prêmio_da_Malásia", &[2014, 2015, 2016, 2017]),
    ("Grande_Prêmio_do_Barém", EVERY_SEASON),
    ("Grande_Prêmio_da_China", &[2014, 2015, 2016, 2017, 2018, 2019, 2024]),
    ("Grande_Prêmio_da_Espanha", EVERY_SEASON),
    ("Grande_Prêmio_de_Mônaco", &[2014, 2015, 2016, 2017, 2018, 2019, 2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_do_Canadá", &[2014, 2015, 2016, 2017, 2018, 2019, 2022, 2023, 2024]),
    ("Grande_Prêmio_da_Áustria", EVERY_SEASON),
    ("Grande_Prêmio_da_Grã-Bretanha", EVERY_SEASON),
    ("Grande_Prêmio_da_Alemanha", &[2014, 2016, 2018, 2019]),
    ("Grande_Prêmio_da_Hungria", EVERY_SEASON),
    ("Grande_Prêmio_da_Bélgica", EVERY_SEASON),
    ("Grande_Prêmio_da_Itália", EVERY_SEASON),
    ("Grande_Prêmio_de_Singapura", &[2014, 2015, 2016, 2017, 2018, 2019, 2022, 2023, 2024]),
    ("Grande_Prêmio_do_Japão", &[2014, 2015, 2016, 2017, 2018, 2019, 2022, 2023, 2024]),
    ("Grande_Prêmio_da_Rússia", &[2014, 2015, 2016, 2017, 2018, 2019, 2020, 2021]),
    (
        "Grande_Prêmio_dos_Estados_Unidos",
        &[2014, 2015, 2016, 2017, 2018, 2019, 2021, 2022, 2023, 2024],
    ),
    ("Grande_Prêmio_do_Brasil", &[2014, 2015, 2016, 2017, 2018, 2019]),
    ("Grande_Prêmio_de_São_Paulo", &[2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_do_México", &[2015, 2016, 2017, 2018, 2019]),
    ("Grande_Prêmio_da_Cidade_do_México", &[2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_de_Abu_Dhabi", EVERY_SEASON),
    ("Grande_Prêmio_da_Europa", &[2016]),
    ("Grande_Prêmio_do_Azerbaijão", &[2017, 2018, 2019, 2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_da_França", &[2018, 2019, 2021, 2022]),
    ("Grande_Prêmio_da_Estíria", &[2020, 2021]),
    ("Grande_Prêmio_do_70.º_Aniversário", &[2020]),
    ("Grande_Prêmio_da_Toscana", &[2020]),
    ("Grande_Prêmio_de_Eifel", &[2020]),
    ("Grande_Prêmio_de_Portugal", &[2020, 2021]),
    ("Grande_Prêmio_da_Emília-Romanha", &[2020, 2021, 2022, 2024]),
    ("Grande_Prêmio_da_Turquia", &[2020, 2021]),
    ("Grande_Prêmio_de_Sakhir", &[2020]),
    ("Grande_Prêmio_dos_Países_Baixos", &[2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_do_Catar", &[2021, 2023, 2024]),
    ("Grande_Prêmio_da_Arábia_Saudita", &[2021, 2022, 2023, 2024]),
    ("Grande_Prêmio_de_Miami", &[2022, 2023, 2024]),
    ("Grande_Prêmio_de_Las_Vegas", &[2023, 2024]),
];

/// Opening event of each season
pub const FIRST_RACE_OF_YEAR: &[(i32, &str)] = &[
    (2014, "Grande_Prêmio_da_Austrália"),
    (2015, "Grande_Prêmio_da_Austrália"),
    (2016, "Grande_Prêmio_da_Austrália"),
    (2017, "Grande_Prêmio_da_Austrália"),
    (2018, "Grande_Prêmio_da_Austrália"),
    (2019, "Grande_Prêmio_da_Austrália"),
    (2020, "Grande_Prêmio_da_Áustria"),
    (2021, "Grande_Prêmio_do_Barém"),
    (2022, "Grande_Prêmio_do_Barém"),
    (2023, "Grande_Prêmio_do_Barém"),
    (2024, "Grande_Prêmio_do_Barém"),
];

/// One (event, season) page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub event: String,
    pub season: i32,
}

impl PageRequest {
    pub fn new(event: impl Into<String>, season: i32) -> Self {
        Self {
            event: event.into(),
            season,
        }
    }

    pub fn url(&self) -> String {
        page_url(&self.event, self.season)
    }
}

/// Article URL of an event in a season
pub fn page_url(event: &str, season: i32) -> String {
    format!("{}/{}_de_{}", WIKI_BASE_URL, event.replace(' ', "_"), season)
}

/// Every page of the catalog, event by event in catalog order
pub fn all_pages() -> Vec<PageRequest> {
    RACES_BY_YEAR
        .iter()
        .flat_map(|(event, seasons)| seasons.iter().map(move |&s| PageRequest::new(*event, s)))
        .collect()
}

/// The opening page of every season, in season order
pub fn first_race_pages() -> Vec<PageRequest> {
    FIRST_RACE_OF_YEAR
        .iter()
        .map(|&(season, event)| PageRequest::new(event, season))
        .collect()
}
