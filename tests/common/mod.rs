//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use watch_history_parser::ParseOptions;

const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>My Activity</title><style type="text/css">.mdl-grid{display:flex}</style></head><body><div class="mdl-grid">"#;
const DOCUMENT_TAIL: &str = "</div></body></html>";

/// Options pinned to a fixed reference year so results do not drift
pub fn test_options() -> ParseOptions {
    ParseOptions { reference_year: Some(2025), ..ParseOptions::default() }
}

/// Builder for activity export documents
pub struct ArchiveBuilder {
    entries: Vec<EntryBuilder>,
    raw: Vec<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self { entries: Vec::new(), raw: Vec::new() }
    }

    /// Add one entry
    pub fn with_entry(mut self, entry: EntryBuilder) -> Self {
        self.raw.push(entry.to_html());
        self.entries.push(entry);
        self
    }

    /// Add `count` ordinary watch entries with distinct ids and times
    pub fn with_watches(mut self, count: usize) -> Self {
        let start = self.entries.len();
        for n in start..start + count {
            self = self.with_entry(EntryBuilder::numbered(n));
        }
        self
    }

    /// Insert markup verbatim between entries
    pub fn with_raw(mut self, markup: &str) -> Self {
        self.raw.push(markup.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut document = String::from(DOCUMENT_HEAD);
        for part in &self.raw {
            document.push_str(part);
        }
        document.push_str(DOCUMENT_TAIL);
        document
    }

    /// Write the document into a fresh temp directory
    pub fn write(&self) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("watch-history.html");
        fs::write(&path, self.build()).expect("Failed to write watch-history.html");
        (dir, path)
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one entry in the export's card layout
#[derive(Clone)]
pub struct EntryBuilder {
    video_id: Option<String>,
    title: Option<String>,
    channel: Option<(String, String)>,
    timestamp: Option<String>,
    music: bool,
    advertisement: bool,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            video_id: Some("dQw4w9WgXcQ".to_string()),
            title: Some("Test video".to_string()),
            channel: Some(("UCtestchannel000000000".to_string(), "Test Channel".to_string())),
            timestamp: Some("Aug 11, 2025, 10:30:00 PM CDT".to_string()),
            music: false,
            advertisement: false,
        }
    }

    /// Entry `n` of a generated sequence: unique id, title, channel and minute
    pub fn numbered(n: usize) -> Self {
        let day = n % 28 + 1;
        let hour = n / 60 % 12 + 1;
        let minute = n % 60;
        let meridiem = if n % 2 == 0 { "AM" } else { "PM" };
        Self::new()
            .video_id(&format!("vid{:08}", n))
            .title(&format!("Video number {} clip", n))
            .channel(&format!("UCchannel{:04}", n % 50), &format!("Channel {} Uploads", n % 50))
            .timestamp(&format!("Mar {}, 2024, {}:{:02}:00 {} EST", day, hour, minute, meridiem))
    }

    pub fn video_id(mut self, id: &str) -> Self {
        self.video_id = Some(id.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Title is shown as the bare address, as exports do for removed videos
    pub fn url_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn channel(mut self, id: &str, name: &str) -> Self {
        self.channel = Some((id.to_string(), name.to_string()));
        self
    }

    pub fn no_channel(mut self) -> Self {
        self.channel = None;
        self
    }

    pub fn timestamp(mut self, text: &str) -> Self {
        self.timestamp = Some(text.to_string());
        self
    }

    pub fn no_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }

    pub fn no_video(mut self) -> Self {
        self.video_id = None;
        self
    }

    pub fn music(mut self) -> Self {
        self.music = true;
        self
    }

    pub fn advertisement(mut self) -> Self {
        self.advertisement = true;
        self
    }

    fn video_url(&self) -> Option<String> {
        let host = if self.music { "music.youtube.com" } else { "www.youtube.com" };
        self.video_id.as_ref().map(|id| format!("https://{}/watch?v={}", host, id))
    }

    pub fn to_html(&self) -> String {
        let product = if self.music { "YouTube Music" } else { "YouTube" };

        let mut body = String::from("Watched&nbsp;");
        match (self.video_url(), &self.title) {
            (Some(url), Some(title)) => {
                body.push_str(&format!(r#"<a href="{}">{}</a><br>"#, url, title));
            }
            (Some(url), None) => body.push_str(&format!(r#"<a href="{0}">{0}</a><br>"#, url)),
            (None, Some(title)) => body.push_str(&format!("{}<br>", title)),
            (None, None) => body.push_str("a video that has been removed<br>"),
        }
        if let Some((id, name)) = &self.channel {
            body.push_str(&format!(
                r#"<a href="https://www.youtube.com/channel/{}">{}</a><br>"#,
                id, name
            ));
        }
        if let Some(timestamp) = &self.timestamp {
            body.push_str(&format!("{}<br>", timestamp));
        }

        let mut caption = format!("<b>Products:</b><br>&emsp;{}<br>", product);
        if self.advertisement {
            caption.push_str("<b>Details:</b><br>&emsp;From Google Ads<br>");
        }
        caption.push_str(
            "<b>Why is this here?</b><br>&emsp;This activity was saved to your Google Account because the following settings were on&nbsp;YouTube watch history.<br>",
        );

        format!(
            concat!(
                r#"<div class="outer-cell mdl-cell mdl-cell--12-col mdl-shadow--2dp"><div class="mdl-grid">"#,
                r#"<div class="header-cell mdl-cell mdl-cell--12-col"><p class="mdl-typography--title">{product}<br></p></div>"#,
                r#"<div class="content-cell mdl-cell mdl-cell--6-col mdl-typography--body-1">{body}</div>"#,
                r#"<div class="content-cell mdl-cell mdl-cell--6-col mdl-typography--body-1 mdl-typography--text-right"></div>"#,
                r#"<div class="content-cell mdl-cell mdl-cell--12-col mdl-typography--caption">{caption}</div>"#,
                "</div></div>"
            ),
            product = product,
            body = body,
            caption = caption,
        )
    }
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Document with `count` ordinary entries
pub fn archive_with_watches(count: usize) -> String {
    ArchiveBuilder::new().with_watches(count).build()
}
