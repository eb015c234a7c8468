use serde::{Deserialize, Serialize};

/// One race weekend: (season, event name)
///
/// Orders by season first, then event name, which is the chronological key
/// used to number events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub season: i32,
    pub event: String,
}

impl EventKey {
    pub fn new(season: i32, event: impl Into<String>) -> Self {
        Self {
            season,
            event: event.into(),
        }
    }
}

/// Cleaned qualifying row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingRow {
    pub season: Option<i32>,
    pub event: Option<String>,
    pub position: Option<String>,
    pub car_number: Option<String>,
    pub driver: Option<String>,
    pub constructor: Option<String>,
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
    pub grid: Option<String>,
}

/// Cleaned race-result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRow {
    pub season: Option<i32>,
    pub event: Option<String>,
    pub position: Option<String>,
    pub car_number: Option<String>,
    pub driver: Option<String>,
    pub constructor: Option<String>,
    pub laps: Option<String>,
    pub time_or_status: Option<String>,
    pub points: Option<String>,
    pub grid: Option<String>,
}

/// Qualifying and race rows of one driver at one event
///
/// Position and points fields are renamed per source: `Pos_Quali` and
/// `Grid_Final` come from qualifying, `Pos_Corrida` and `Pontos_Ganhos` from
/// the race. The constructor is the qualifying-side value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub event: EventKey,
    pub driver: String,
    pub pos_quali: Option<String>,
    pub grid_final: Option<String>,
    pub car_number: Option<String>,
    pub constructor: Option<String>,
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
    pub pos_corrida: Option<String>,
    pub pontos_ganhos: Option<String>,
    pub laps: Option<String>,
    pub time_or_status: Option<String>,
    pub race_grid: Option<String>,
}

/// A joined record with its engineered features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub event: EventKey,
    pub driver: String,
    pub constructor: Option<String>,
    pub race_id: usize,

    // Coerced numerics
    pub pos_quali: Option<f64>,
    pub grid_final: f64,
    pub pos_corrida: f64,
    pub pontos_ganhos: Option<f64>,

    // Session times in seconds (missing sessions carry the penalty value)
    pub q1_s: f64,
    pub q2_s: f64,
    pub q3_s: f64,

    pub punicao_grid: Option<f64>,
    pub gap_q1_q2: f64,
    pub gap_q2_q3: f64,

    // Trailing averages over the driver's prior events
    pub momentum_pos_3r: Option<f64>,
    pub momentum_pts_3r: Option<f64>,
    pub momentum_quali_3r: Option<f64>,

    /// One flag per constructor of the owning feature set, same order
    pub constructor_flags: Vec<bool>,
}
