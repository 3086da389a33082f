use log::{debug, info, warn};

use crate::chunk::{chunk_transcript, truncate_chars};
use crate::config::DEFAULT_CHUNK_SIZE;
use crate::generate::ResilientGenerator;

/// Characters of each chunk sent to the model
pub const CHUNK_PROMPT_CHARS: usize = 1000;
/// Characters of the joined partial summaries sent to the reduction prompt
pub const REDUCE_PROMPT_CHARS: usize = 2000;

fn chunk_prompt(chunk: &str, language: &str) -> String {
    format!(
        "Summarize the following text in 1-2 sentences. Write in {language}.\n\n{}",
        truncate_chars(chunk, CHUNK_PROMPT_CHARS)
    )
}

fn reduce_prompt(partials: &str, language: &str) -> String {
    format!(
        "The following are partial summaries of a long video. Based on them, summarize the whole video in 3 lines. \
Write in {language}.\n\n{}",
        truncate_chars(partials, REDUCE_PROMPT_CHARS)
    )
}

/// Map-reduce summary of a long transcript
pub struct Summarizer {
    generator: ResilientGenerator,
    chunk_size: usize,
    language: String,
}

impl Summarizer {
    pub fn new(generator: ResilientGenerator, language: &str) -> Self {
        Self {
            generator,
            chunk_size: DEFAULT_CHUNK_SIZE,
            language: language.to_string(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// `None` when no chunk could be summarized or the final reduction failed
    pub async fn summarize(&self, transcript: &str) -> Option<String> {
        let chunks = chunk_transcript(transcript, self.chunk_size);
        info!("Summarizing {} chunks", chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            match self.generator.generate(&chunk_prompt(chunk, &self.language)).await {
                Some(summary) if !summary.trim().is_empty() => partials.push(summary.trim().to_string()),
                _ => warn!("Chunk {}/{} could not be summarized, skipping", i + 1, chunks.len()),
            }
        }

        if partials.is_empty() {
            warn!("No partial summaries; cannot reduce");
            return None;
        }
        debug!("{} of {} partial summaries succeeded", partials.len(), chunks.len());

        let summary = self
            .generator
            .generate(&reduce_prompt(&partials.join(" "), &self.language))
            .await?;
        let summary = summary.trim();
        if summary.is_empty() {
            warn!("Reduction returned no text");
            return None;
        }
        Some(summary.to_string())
    }
}
