//! Album metadata shown by tiles and listings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Album {
    pub name: String,
    pub artist: String,
    pub release_date: String,
    /// Catalog id used to fetch the art
    pub asin: String,
}

impl Album {
    pub fn new(
        name: impl Into<String>,
        artist: impl Into<String>,
        release_date: impl Into<String>,
        asin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            release_date: release_date.into(),
            asin: asin.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Track {
    pub title: String,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}
