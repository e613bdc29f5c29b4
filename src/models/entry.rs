use serde::{Deserialize, Serialize};

/// Which service an entry was recorded against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    #[default]
    Primary,
    Music,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Primary => "primary",
            Product::Music => "music",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel id (`UC...`) or handle (`@name`)
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: String,
}

/// One candidate entry pulled out of a chunk, before normalization.
///
/// `markup` borrows nothing from the source buffer; the extractor copies the
/// fragment so the chunk can be released as soon as extraction finishes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub video: Option<VideoRef>,
    pub channel: Option<ChannelRef>,
    pub raw_timestamp: Option<String>,
    pub product: Product,
    pub is_advertisement: bool,
    /// Sanitized plain text of the entry
    pub text: String,
    /// Original markup fragment, empty for pattern-only extraction
    pub markup: String,
}

impl RawEntry {
    /// Entries carrying neither a video nor a timestamp are never normalized
    pub fn has_payload(&self) -> bool {
        self.video.is_some() || self.raw_timestamp.is_some()
    }
}
