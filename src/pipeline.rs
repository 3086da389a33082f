use std::sync::Arc;

use eyre::Result;
use log::{info, warn};

use crate::assets::{AssetBundle, AssetGenerator, VideoContext};
use crate::config::{Config, Credentials};
use crate::data_api::{DataApiCaptions, DataApiClient, MAX_CHANNEL_VIDEOS, MetadataSource, VideoDetails};
use crate::error::PipelineError;
use crate::generate::{LlmClient, ResilientGenerator};
use crate::retry::RetryPolicy;
use crate::summarize::Summarizer;
use crate::transcript::{TranscriptFetcher, TranscriptProvider};
use crate::youtube::{TimedTextApi, WatchPageLoader};
use crate::{TranscriptResult, VideoReference, normalize_url};

/// Result of one submission
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub video: VideoReference,
    pub transcript: TranscriptResult,
    pub context: VideoContext,
    pub summary: String,
    pub bundle: AssetBundle,
}

/// URL → transcript → summary → assets
pub struct Pipeline {
    fetcher: TranscriptFetcher,
    summarizer: Summarizer,
    assets: AssetGenerator,
    metadata: Option<Box<dyn MetadataSource>>,
    channel_id: Option<String>,
}

impl Pipeline {
    pub fn new(fetcher: TranscriptFetcher, generator: ResilientGenerator, config: &Config) -> Self {
        let language = config.output_language();
        Self {
            fetcher,
            summarizer: Summarizer::new(generator.clone(), &language).with_chunk_size(config.chunk_size()),
            assets: AssetGenerator::new(generator, &language, config.fixed_hashtags()),
            metadata: None,
            channel_id: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Box<dyn MetadataSource>, channel_id: Option<String>) -> Self {
        self.metadata = Some(metadata);
        self.channel_id = channel_id;
        self
    }

    /// Wire up the real providers and generation API from configuration
    pub fn from_config(config: &Config, credentials: &Credentials, http: reqwest::Client) -> Result<Self> {
        let llm = LlmClient::new(http.clone(), &config.model(), credentials)?;
        let generator = ResilientGenerator::new(Arc::new(llm), RetryPolicy::generation());

        let mut providers: Vec<Box<dyn TranscriptProvider>> = vec![
            Box::new(WatchPageLoader::new(http.clone())),
            Box::new(TimedTextApi::new(http.clone())),
        ];
        let data_api = credentials
            .youtube_api_key
            .as_deref()
            .map(|key| DataApiClient::new(http.clone(), key));
        match &data_api {
            Some(api) => providers.push(Box::new(DataApiCaptions::new(api.clone()))),
            None => warn!("YOUTUBE_API_KEY not set; Data API captions and video details disabled"),
        }

        let fetcher = TranscriptFetcher::new(providers).with_languages(config.languages());
        let pipeline = Pipeline::new(fetcher, generator, config);
        Ok(match data_api {
            Some(api) => pipeline.with_metadata(Box::new(api), config.channel_id.clone()),
            None => pipeline,
        })
    }

    pub async fn run(&self, url: &str) -> Result<PipelineOutput, PipelineError> {
        let video = normalize_url(url)?;
        info!("Processing {} ({})", video.canonical_url, video.video_id);

        let transcript = self.fetcher.fetch(&video).await?;

        let context = self.video_context(&video, &transcript).await;

        let summary = self
            .summarizer
            .summarize(&transcript.text)
            .await
            .ok_or(PipelineError::SummaryUnavailable)?;
        info!("Summary ready ({} chars)", summary.chars().count());

        let bundle = self.assets.generate(&summary, &context).await;

        Ok(PipelineOutput {
            video,
            transcript,
            context,
            summary,
            bundle,
        })
    }

    async fn video_context(&self, video: &VideoReference, transcript: &TranscriptResult) -> VideoContext {
        // the watch page title stands in when the Data API has none
        let page_details = || VideoDetails {
            title: transcript.title.clone().unwrap_or_default(),
            ..Default::default()
        };

        let Some(metadata) = &self.metadata else {
            return VideoContext {
                details: page_details(),
                channel_videos: Vec::new(),
            };
        };

        let details = match metadata.video_details(&video.video_id).await {
            Ok(details) if !details.title.trim().is_empty() => details,
            Ok(details) => VideoDetails {
                title: page_details().title,
                ..details
            },
            Err(e) => {
                warn!("Could not load video details for {}: {e}", video.video_id);
                page_details()
            }
        };

        let channel_videos = match &self.channel_id {
            Some(channel_id) => match metadata.channel_videos(channel_id, MAX_CHANNEL_VIDEOS).await {
                Ok(videos) => videos,
                Err(e) => {
                    warn!("Could not load channel videos for {channel_id}: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        VideoContext {
            details,
            channel_videos,
        }
    }
}
