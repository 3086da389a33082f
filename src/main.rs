use std::io::{self, BufRead};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, error, info};

mod cli;

use cli::{Cli, OutputFormat};
use ytpub::config::{Config, config_path};
use ytpub::pipeline::Pipeline;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytpub.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytpub")
        .join("logs")
}

fn key_line(name: &str, set: bool) -> String {
    if set {
        format!("  \x1b[32m✅\x1b[0m {name}")
    } else {
        format!("  \x1b[31m❌\x1b[0m {name} (not set)")
    }
}

fn build_after_help() -> String {
    let creds = Config::load().unwrap_or_default().credentials();
    let log_path = log_dir().join("ytpub.log");

    format!(
        "\nCREDENTIALS:\n{}\n{}\n{}\n\nConfig file: {}\nLogs are written to: {}",
        key_line("ANTHROPIC_API_KEY / CLAUDE_API_KEY", creds.anthropic_api_key.is_some()),
        key_line("OPENAI_API_KEY", creds.openai_api_key.is_some()),
        key_line("YOUTUBE_API_KEY", creds.youtube_api_key.is_some()),
        config_path().display(),
        log_path.display()
    )
}

/// CLI flags take priority over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref model) = cli.model {
        config.model = Some(model.clone());
    }
    if !cli.langs.is_empty() {
        config.languages = Some(cli.langs.clone());
    }
    if let Some(size) = cli.chunk_size {
        config.chunk_size = Some(size);
    }
    if let Some(ref channel) = cli.channel {
        config.channel_id = Some(channel.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let mut config = Config::load().unwrap_or_default();
    apply_overrides(&mut config, &cli);
    let credentials = config.credentials();

    if cli.verbose {
        let path = config_path();
        if path.exists() {
            eprintln!("Config: {}", path.display());
        }
        eprintln!("Model: {}\nLanguages: {:?}", config.model(), config.languages());
    }
    debug!("Credentials: {credentials:?}");

    let client = reqwest::Client::new();
    let pipeline = Pipeline::from_config(&config, &credentials, client)?;

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.iter().all(|u| u.trim().is_empty()) {
        bail!("no URL provided\n\nUsage: ytpub <URL>\n       echo <URL> | ytpub");
    }

    let mut failures = 0;
    let mut bundles = Vec::new();
    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }

        let output = match pipeline.run(url_input).await {
            Ok(output) => output,
            Err(e) => {
                error!("{url_input}: {e}");
                eprintln!("{url_input}: {}", e.user_message());
                failures += 1;
                continue;
            }
        };

        if cli.verbose {
            eprintln!(
                "Video: {} ({})\nSource: {}\nLanguage: {}\nTranscript: {} chars\nSummary:\n{}\n",
                output.video.canonical_url,
                output.video.video_id,
                output.transcript.source,
                output.transcript.language,
                output.transcript.text.chars().count(),
                output.summary,
            );
        }

        if cli.output.is_some() {
            bundles.push(output.bundle);
            continue;
        }

        let rendered = match cli.format {
            OutputFormat::Text => ytpub::output::render_text(&output.bundle),
            OutputFormat::Json => ytpub::output::render_json(&output.bundle),
        };
        println!("{rendered}");
    }

    // One write for the whole batch
    if let Some(ref path) = cli.output {
        if !bundles.is_empty() {
            let rendered = match cli.format {
                OutputFormat::Text => ytpub::output::render_text_batch(&bundles),
                OutputFormat::Json => ytpub::output::render_json_batch(&bundles),
            };
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {} ({} bundle(s))", path.display(), bundles.len());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} submission(s) failed; see {}", log_dir().join("ytpub.log").display());
    }

    Ok(())
}
