use async_trait::async_trait;
use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::transcript::TranscriptProvider;
use crate::{TranscriptResult, TranscriptSource, VideoReference};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// Scrapes the watch page and reads captions through the InnerTube player endpoint
pub struct WatchPageLoader {
    client: reqwest::Client,
}

impl WatchPageLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptProvider for WatchPageLoader {
    fn name(&self) -> &'static str {
        "watch page loader"
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::PrimaryLoader
    }

    async fn fetch(&self, video: &VideoReference, languages: &[String]) -> Result<Option<TranscriptResult>> {
        let client = &self.client;
        let video_id = &video.video_id;

        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");
        let hl = languages.first().map(String::as_str).unwrap_or("en");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": hl,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let title = resp
            .video_details
            .and_then(|vd| vd.title)
            .filter(|t| !t.trim().is_empty());
        debug!("Video title: {title:?}");

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            bail!("no captions available for video {video_id}");
        }

        let Some(track) = pick_by_language(&tracks, languages, |t| t.language_code.as_str()) else {
            debug!("No caption track in {languages:?} for {video_id}");
            return Ok(None);
        };

        let language = track.language_code.clone();
        debug!("Using caption track: lang={language}");

        // Step 3: Fetch the caption XML
        let caption_xml = client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = parse_caption_xml(&caption_xml)?.join(" ");

        Ok(Some(TranscriptResult {
            text,
            source: TranscriptSource::PrimaryLoader,
            language,
            title,
        }))
    }
}

/// Lists caption tracks through the public timedtext endpoint and downloads the preferred one
pub struct TimedTextApi {
    client: reqwest::Client,
}

impl TimedTextApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptProvider for TimedTextApi {
    fn name(&self) -> &'static str {
        "timedtext api"
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::TranscriptApi
    }

    async fn fetch(&self, video: &VideoReference, languages: &[String]) -> Result<Option<TranscriptResult>> {
        let video_id = &video.video_id;
        debug!("Listing timedtext tracks for {video_id}");

        let list_xml = self
            .client
            .get(TIMEDTEXT_URL)
            .query(&[("type", "list"), ("v", video_id.as_str())])
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let available = parse_track_list(&list_xml)?;
        debug!("Available timedtext tracks: {available:?}");

        for lang in languages {
            if !available.contains(lang) {
                debug!("No {lang} track for {video_id}");
                continue;
            }
            let caption_xml = self
                .client
                .get(TIMEDTEXT_URL)
                .query(&[("v", video_id.as_str()), ("lang", lang.as_str())])
                .header("User-Agent", USER_AGENT)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            let segments = parse_caption_xml(&caption_xml)?;
            if segments.is_empty() {
                debug!("Empty {lang} track for {video_id}");
                continue;
            }
            return Ok(Some(TranscriptResult {
                text: segments.join(" "),
                source: TranscriptSource::TranscriptApi,
                language: lang.clone(),
                title: None,
            }));
        }

        Ok(None)
    }
}

/// First item whose language matches the preference list, in preference order
pub(crate) fn pick_by_language<'a, T>(
    items: &'a [T],
    languages: &[String],
    language_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    languages
        .iter()
        .find_map(|lang| items.iter().find(|item| language_of(*item) == lang.as_str()))
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

/// Language codes from a timedtext `type=list` response
fn parse_track_list(xml: &str) -> Result<Vec<String>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut langs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"track" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"lang_code" {
                        langs.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing track list XML: {e}"),
            _ => {}
        }
    }

    Ok(langs)
}

/// Caption text segments in document order, entities decoded
fn parse_caption_xml(xml: &str) -> Result<Vec<String>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                in_text = true;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                in_text = false;
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> has no content
            }
            Ok(Event::Text(ref e)) if in_text => {
                let raw_text = e.unescape().unwrap_or_default().to_string();
                let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                if !text.is_empty() {
                    segments.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}
