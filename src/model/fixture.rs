use serde::{Deserialize, Serialize};

/// One scheduled game on a given date, as extracted from a schedule page card.
///
/// Team names are canonicalized before a fixture is constructed, so `home` and
/// `away` hold canonical names wherever the raw text was recognizable. The
/// serialized field names match the on-disk schedule index layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub away: String,
    #[serde(rename = "g_id")]
    pub game_id: String,
    /// Game date in `YYYYMMDD` form.
    #[serde(rename = "g_dt")]
    pub game_date: String,
}

/// A game involving the requested team on the current date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayMatch {
    pub opponent: String,
    pub home: String,
    pub away: String,
    pub game_id: String,
    pub game_date: String,
}
