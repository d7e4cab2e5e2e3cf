use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(MangaId);
id_newtype!(ChapterId);

/// Read-only view of a library entry owned by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangaSnapshot {
    pub id: MangaId,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MangaSnapshot {
    /// Host of the site the manga was added from, when the url parses.
    pub fn domain(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSnapshot {
    pub id: ChapterId,
    pub manga_url: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub is_read: bool,
}

/// Search hit returned by a site; opening it adds the manga to the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
}
