use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two top-level catalog partitions.
///
/// Ids are namespaced per collection: movie `1` and show `1` are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Movies,
    Shows,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Movies, Collection::Shows];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Movies => "movies",
            Collection::Shows => "shows",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movies" | "movie" | "films" | "film" => Ok(Collection::Movies),
            "shows" | "show" | "tv" | "tvshows" | "tv_shows" | "tv-shows" | "series" => Ok(Collection::Shows),
            other => Err(format!("Unknown collection: {}. Use 'movies' or 'shows'", other)),
        }
    }
}
