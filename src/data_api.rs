use async_trait::async_trait;
use eyre::{Result, WrapErr, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptProvider;
use crate::youtube::pick_by_language;
use crate::{TranscriptResult, TranscriptSource, VideoReference};

const DATA_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound on channel videos examined for title style
pub const MAX_CHANNEL_VIDEOS: usize = 50;

/// Title and description of the submitted video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
}

/// A channel upload and its popularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelVideo {
    pub title: String,
    pub view_count: u64,
}

/// Where video details and channel context come from
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn video_details(&self, video_id: &str) -> Result<VideoDetails>;
    async fn channel_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<ChannelVideo>>;
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: String,
    #[serde(rename = "trackKind", default)]
    track_kind: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: Option<VideoSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// YouTube Data API v3 client keyed by a developer API key
#[derive(Clone)]
pub struct DataApiClient {
    client: reqwest::Client,
    api_key: String,
}

impl DataApiClient {
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = format!("{DATA_API_BASE}/{path}");
        debug!("Data API request: {path} {params:?}");
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("YouTube Data API {path} returned {status}: {body}");
        }
        Ok(resp)
    }

    async fn list_captions(&self, video_id: &str) -> Result<Vec<CaptionItem>> {
        let resp: ListResponse<CaptionItem> = self
            .get("captions", &[("part", "snippet"), ("videoId", video_id)])
            .await?
            .json()
            .await?;
        Ok(resp.items)
    }

    async fn download_caption(&self, caption_id: &str) -> Result<String> {
        let path = format!("captions/{caption_id}");
        let srt = self.get(&path, &[("tfmt", "srt")]).await?.text().await?;
        Ok(srt)
    }

    async fn view_counts(&self, ids: &[String]) -> Result<Vec<(String, u64)>> {
        let joined = ids.join(",");
        let resp: ListResponse<VideoItem> = self
            .get("videos", &[("part", "statistics"), ("id", joined.as_str())])
            .await?
            .json()
            .await?;
        Ok(resp
            .items
            .into_iter()
            .map(|v| {
                let views = v
                    .statistics
                    .and_then(|s| s.view_count)
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0);
                (v.id, views)
            })
            .collect())
    }
}

#[async_trait]
impl MetadataSource for DataApiClient {
    async fn video_details(&self, video_id: &str) -> Result<VideoDetails> {
        let resp: ListResponse<VideoItem> = self
            .get("videos", &[("part", "snippet"), ("id", video_id)])
            .await?
            .json()
            .await
            .wrap_err("decoding videos.list response")?;

        let Some(snippet) = resp.items.into_iter().next().and_then(|v| v.snippet) else {
            bail!("video {video_id} not found");
        };
        Ok(VideoDetails {
            title: snippet.title,
            description: snippet.description,
        })
    }

    async fn channel_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<ChannelVideo>> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let page_size = max_results.clamp(1, MAX_CHANNEL_VIDEOS).to_string();

        loop {
            let page: ListResponse<SearchItem> = {
                let mut params = vec![
                    ("part", "id,snippet"),
                    ("channelId", channel_id),
                    ("maxResults", page_size.as_str()),
                    ("order", "date"),
                    ("type", "video"),
                ];
                if let Some(token) = page_token.as_deref() {
                    params.push(("pageToken", token));
                }
                self.get("search", &params).await?.json().await?
            };

            let titled: Vec<(String, String)> = page
                .items
                .into_iter()
                .filter_map(|item| Some((item.id.video_id?, item.snippet.map(|s| s.title).unwrap_or_default())))
                .collect();
            let ids: Vec<String> = titled.iter().map(|(id, _)| id.clone()).collect();
            let counts = if ids.is_empty() { Vec::new() } else { self.view_counts(&ids).await? };

            for (id, title) in titled {
                let view_count = counts
                    .iter()
                    .find(|(cid, _)| *cid == id)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                videos.push(ChannelVideo { title, view_count });
            }

            page_token = page.next_page_token;
            if page_token.is_none() || videos.len() >= max_results {
                break;
            }
        }

        videos.truncate(max_results);
        info!("Loaded {} videos from channel {channel_id}", videos.len());
        Ok(videos)
    }
}

/// Captions through the Data API `captions` resource, downloaded as SRT
pub struct DataApiCaptions {
    api: DataApiClient,
}

impl DataApiCaptions {
    pub fn new(api: DataApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TranscriptProvider for DataApiCaptions {
    fn name(&self) -> &'static str {
        "data api captions"
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::DataApiCaptions
    }

    async fn fetch(&self, video: &VideoReference, languages: &[String]) -> Result<Option<TranscriptResult>> {
        let items = self.api.list_captions(&video.video_id).await?;
        debug!(
            "Data API caption tracks: {:?}",
            items
                .iter()
                .map(|i| format!("{} ({})", i.snippet.language, i.snippet.track_kind))
                .collect::<Vec<_>>()
        );

        if items.is_empty() {
            debug!("No caption items for {}", video.video_id);
            return Ok(None);
        }

        let Some(item) = pick_by_language(&items, languages, |i| i.snippet.language.as_str()) else {
            debug!("No caption item in {languages:?} for {}", video.video_id);
            return Ok(None);
        };

        let srt = self.api.download_caption(&item.id).await?;
        Ok(Some(TranscriptResult {
            text: extract_srt_text(&srt),
            source: TranscriptSource::DataApiCaptions,
            language: item.snippet.language.clone(),
            title: None,
        }))
    }
}

/// Dialogue text of an SRT document: every block loses its index and timing lines
pub fn extract_srt_text(srt: &str) -> String {
    let normalized = srt.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter_map(|block| {
            let lines: Vec<&str> = block.trim_matches('\n').split('\n').collect();
            if lines.len() > 2 {
                Some(lines[2..].join(" "))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_srt_text() {
        let srt = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n2\n00:00:02,000 --> 00:00:04,000\nsecond line\ncontinued\n";
        assert_eq!(extract_srt_text(srt), "Hello there second line continued");
    }

    #[test]
    fn test_extract_srt_text_crlf() {
        let srt = "1\r\n00:00:00,000 --> 00:00:01,000\r\n안녕하세요\r\n\r\n2\r\n00:00:01,000 --> 00:00:02,000\r\n반갑습니다\r\n";
        assert_eq!(extract_srt_text(srt), "안녕하세요 반갑습니다");
    }

    #[test]
    fn test_extract_srt_text_skips_short_blocks() {
        let srt = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n";
        assert_eq!(extract_srt_text(srt), "kept");
    }

    #[test]
    fn test_extract_srt_text_empty() {
        assert_eq!(extract_srt_text(""), "");
    }

    #[test]
    fn test_decode_caption_list() {
        let json = r#"{"items":[{"id":"cap1","snippet":{"language":"en","trackKind":"standard"}},{"id":"cap2","snippet":{"language":"ko","trackKind":"asr"}}]}"#;
        let resp: ListResponse<CaptionItem> = serde_json::from_str(json).unwrap();
        let prefs = vec!["ko".to_string(), "en".to_string()];
        let picked = pick_by_language(&resp.items, &prefs, |i| i.snippet.language.as_str()).unwrap();
        assert_eq!(picked.id, "cap2");
        assert!(resp.next_page_token.is_none());
    }

    #[test]
    fn test_decode_empty_list() {
        let resp: ListResponse<CaptionItem> = serde_json::from_str("{}").unwrap();
        assert!(resp.items.is_empty());
    }

    #[test]
    fn test_decode_video_statistics() {
        let json = r#"{"items":[{"id":"v1","statistics":{"viewCount":"12345"}}],"nextPageToken":"abc"}"#;
        let resp: ListResponse<VideoItem> = serde_json::from_str(json).unwrap();
        let views: u64 = resp.items[0]
            .statistics
            .as_ref()
            .and_then(|s| s.view_count.as_deref())
            .and_then(|c| c.parse().ok())
            .unwrap();
        assert_eq!(views, 12345);
        assert_eq!(resp.next_page_token.as_deref(), Some("abc"));
    }
}
