use thiserror::Error;

/// Failures that end a submission. Everything else degrades to placeholders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("no usable transcript for video {video_id}")]
    TranscriptUnavailable { video_id: String },

    #[error("summary generation failed")]
    SummaryUnavailable,
}

impl PipelineError {
    /// Short, non-technical message for the person running the tool
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::InvalidUrl(_) => "Please enter a valid YouTube video URL.",
            PipelineError::TranscriptUnavailable { .. } => {
                "Could not get subtitles for this video, so it cannot be summarized."
            }
            PipelineError::SummaryUnavailable => "Could not generate a summary of this video.",
        }
    }
}
