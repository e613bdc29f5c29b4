//! Recognising watch-item and channel references by their address

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ChannelRef, VideoRef};

static WATCH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|live/)|youtu\.be/)(?P<id>[A-Za-z0-9_-]{6,})",
    )
    .expect("watch url regex compiles")
});

static CHANNEL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.|music\.)?youtube\.com/(?:channel/(?P<channel>[A-Za-z0-9_-]+)|(?P<handle>@[\w.\-]+)|c/(?P<custom>[\w.\-]+)|user/(?P<user>[\w.\-]+))",
    )
    .expect("channel url regex compiles")
});

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://|www\.)\S+$").expect("url regex compiles"));

pub fn is_watch_url(href: &str) -> bool {
    WATCH_URL.is_match(href.trim())
}

pub fn is_channel_url(href: &str) -> bool {
    CHANNEL_URL.is_match(href.trim())
}

pub fn is_music_url(href: &str) -> bool {
    let href = href.trim().to_ascii_lowercase();
    href.starts_with("https://music.") || href.starts_with("http://music.") || href.starts_with("music.")
}

/// True when display text is just an address rather than a human title
pub fn looks_like_url(text: &str) -> bool {
    BARE_URL.is_match(text.trim())
}

/// Build a video reference from a link; the title is dropped if it is a bare URL
pub fn video_ref(href: &str, display: &str) -> Option<VideoRef> {
    let href = href.trim();
    let caps = WATCH_URL.captures(href)?;
    let display = display.trim();
    Some(VideoRef {
        id: Some(caps["id"].to_string()),
        title: (!display.is_empty() && !looks_like_url(display)).then(|| display.to_string()),
        url: href.to_string(),
    })
}

pub fn channel_ref(href: &str, display: &str) -> Option<ChannelRef> {
    let href = href.trim();
    let caps = CHANNEL_URL.captures(href)?;
    let id = ["channel", "handle", "custom", "user"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string());
    let display = display.trim();
    Some(ChannelRef {
        id,
        name: (!display.is_empty()).then(|| display.to_string()),
        url: href.to_string(),
    })
}
