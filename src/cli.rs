use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytpub",
    about = "YouTube publishing assistant: summary, titles, descriptions, hashtags and quizzes",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (reads from stdin if omitted)
    pub url: Option<String>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// LLM model for generation [default: config model or claude-3-5-sonnet-latest]
    #[arg(long)]
    pub model: Option<String>,

    /// Preferred caption language, in order (repeatable) [default: ko, en]
    #[arg(short, long = "lang")]
    pub langs: Vec<String>,

    /// Maximum characters per transcript chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Channel ID whose popular titles guide title style
    #[arg(long)]
    pub channel: Option<String>,

    /// Show extraction source and summary
    #[arg(short, long)]
    pub verbose: bool,
}
