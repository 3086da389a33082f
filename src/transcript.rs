use async_trait::async_trait;
use eyre::Result;
use log::{info, warn};

use crate::config::default_languages;
use crate::error::PipelineError;
use crate::retry::RetryPolicy;
use crate::{TranscriptResult, TranscriptSource, VideoReference};

/// Minimum trimmed transcript length considered usable
pub const MIN_TRANSCRIPT_CHARS: usize = 10;

/// One way of getting a transcript.
///
/// `Ok(None)` means the provider answered but had nothing in the requested
/// languages; that is not retried. `Err` is treated as transient.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn source(&self) -> TranscriptSource;
    async fn fetch(&self, video: &VideoReference, languages: &[String]) -> Result<Option<TranscriptResult>>;
}

/// Tries each provider in order until one yields a usable transcript
pub struct TranscriptFetcher {
    providers: Vec<Box<dyn TranscriptProvider>>,
    languages: Vec<String>,
    policy: RetryPolicy,
    min_chars: usize,
}

impl TranscriptFetcher {
    pub fn new(providers: Vec<Box<dyn TranscriptProvider>>) -> Self {
        Self {
            providers,
            languages: default_languages(),
            policy: RetryPolicy::transcript(),
            min_chars: MIN_TRANSCRIPT_CHARS,
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn fetch(&self, video: &VideoReference) -> Result<TranscriptResult, PipelineError> {
        for provider in &self.providers {
            let label = format!("{} ({})", provider.name(), video.video_id);
            let outcome = self
                .policy
                .run(&label, || provider.fetch(video, &self.languages))
                .await;

            match outcome {
                Ok(Some(result)) if result.is_usable(self.min_chars) => {
                    info!(
                        "Transcript from {} ({}, {} chars)",
                        provider.source(),
                        result.language,
                        result.text.chars().count()
                    );
                    return Ok(result);
                }
                Ok(Some(result)) => {
                    warn!("{label}: transcript too short: {:?}", result.text.trim());
                }
                Ok(None) => {
                    warn!("{label}: no transcript in {:?}", self.languages);
                }
                Err(e) => {
                    warn!("{label}: gave up after {} attempts: {e}", self.policy.attempts());
                }
            }
        }

        Err(PipelineError::TranscriptUnavailable {
            video_id: video.video_id.clone(),
        })
    }
}
