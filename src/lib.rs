pub mod assets;
pub mod chunk;
pub mod config;
pub mod data_api;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod quiz;
pub mod retry;
pub mod summarize;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

pub use assets::AssetBundle;
pub use error::PipelineError;
pub use quiz::QuizItem;

pub const CANONICAL_WATCH_URL: &str = "https://www.youtube.com/watch";

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&#_])t=(\d+)").expect("valid regex"));
static PATH_TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)[_&]t=\d+s?$").expect("valid regex"));

/// A submitted video link, canonicalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    pub raw_url: String,
    pub canonical_url: String,
    pub video_id: String,
    pub timestamp_offset: Option<u64>,
}

/// Which provider produced the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TranscriptSource {
    PrimaryLoader,
    TranscriptApi,
    DataApiCaptions,
}

/// Plain transcript text for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptResult {
    pub text: String,
    pub source: TranscriptSource,
    pub language: String,
    /// Video title, when the provider saw one
    pub title: Option<String>,
}

impl TranscriptResult {
    /// Whether the trimmed text has at least `min_chars` characters
    pub fn is_usable(&self, min_chars: usize) -> bool {
        self.text.trim().chars().count() >= min_chars
    }
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::PrimaryLoader => write!(f, "primary-loader"),
            TranscriptSource::TranscriptApi => write!(f, "transcript-api"),
            TranscriptSource::DataApiCaptions => write!(f, "data-api-captions"),
        }
    }
}

/// Canonicalize a shared YouTube link into `https://www.youtube.com/watch?v=ID[&t=Ns]`
pub fn normalize_url(raw: &str) -> Result<VideoReference, PipelineError> {
    let input = raw.trim();
    let invalid = || PipelineError::InvalidUrl(input.to_string());

    if input.is_empty() {
        return Err(invalid());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let parsed = Url::parse(&with_scheme).map_err(|_| invalid())?;

    let video_id = match parsed.host_str() {
        Some("youtu.be") => {
            let path = parsed.path().trim_start_matches('/');
            let segment = path.split('/').next().unwrap_or_default();
            PATH_TIMESTAMP_RE
                .captures(segment)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| segment.to_string())
        }
        Some("youtube.com" | "www.youtube.com" | "m.youtube.com") => parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default(),
        _ => return Err(invalid()),
    };

    if !VIDEO_ID_RE.is_match(&video_id) {
        return Err(invalid());
    }

    let timestamp_offset = TIMESTAMP_RE
        .captures(input)
        .and_then(|caps| caps[1].parse::<u64>().ok());

    let mut canonical_url = format!("{CANONICAL_WATCH_URL}?v={video_id}");
    if let Some(t) = timestamp_offset {
        canonical_url.push_str(&format!("&t={t}s"));
    }

    Ok(VideoReference {
        raw_url: raw.to_string(),
        canonical_url,
        video_id,
        timestamp_offset,
    })
}
