use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

use eyre::{Result, bail};
use log::info;

mod cli;

use cli::{Cli, OutputFormat};

use ytsum::SummaryMode;
use ytsum::acquire::TranscriptAcquirer;
use ytsum::cache::CacheStore;
use ytsum::model::model_for;
use ytsum::pipeline::PipelineOrchestrator;
use ytsum::strategies::default_strategies;
use ytsum::summarize::SummarizationEngine;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

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
        .join("ytsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version("yt-dlp") {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found — only needed as the last extraction fallback)".to_string(),
    };
    let chromium_line = match tool_version("chromium").or_else(|| tool_version("google-chrome")) {
        Some(v) => format!("  \x1b[32m✅\x1b[0m chromium   {v}"),
        None => "  \x1b[31m❌\x1b[0m chromium   (not found — only needed for the browser fallback)".to_string(),
    };

    let log_path = log_dir().join("ytsum.log");

    format!(
        "\nOPTIONAL TOOLS:\n{yt_dlp_line}\n{chromium_line}\n\nLogs are written to: {}",
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = ytsum::config::Config::load().unwrap_or_default();

    // CLI flags win over config file, config over built-in defaults
    let mode = match (cli.mode, config.default_mode.as_deref()) {
        (Some(mode), _) => mode,
        (None, Some(name)) => SummaryMode::from_str(name).map_err(|e| eyre::eyre!(e.user_message()))?,
        (None, None) => SummaryMode::Quick,
    };
    let format = cli.format.unwrap_or_else(|| {
        match config.default_format.as_deref() {
            Some("json") => OutputFormat::Json,
            Some("markdown") => OutputFormat::Markdown,
            _ => OutputFormat::Text,
        }
    });
    let model = cli
        .model
        .or(config.default_model)
        .unwrap_or_else(|| "claude-sonnet-4-6".to_string());
    let lang = cli.lang.or(config.default_lang).unwrap_or_else(|| "en".to_string());

    if cli.verbose {
        let config_path = ytsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Mode: {mode}\nModel: {model}\nLanguage: {lang}");
    }

    let cache = if cli.no_cache || config.no_cache.unwrap_or(false) {
        CacheStore::disabled()
    } else {
        CacheStore::new(config.cache_dir.unwrap_or_else(CacheStore::default_dir))
    };

    let client = reqwest::Client::new();
    let transcript_ttl = config
        .transcript_ttl_secs
        .map_or(ytsum::cache::TRANSCRIPT_TTL, std::time::Duration::from_secs);
    let summary_ttl = config
        .summary_ttl_secs
        .map_or(ytsum::cache::SUMMARY_TTL, std::time::Duration::from_secs);
    let orchestrator = PipelineOrchestrator::new(
        cache,
        TranscriptAcquirer::new(default_strategies(&lang)),
        SummarizationEngine::new(model_for(client.clone(), &model)),
        client,
    )
    .with_ttls(transcript_ttl, summary_ttl);

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytsum <URL>\n       echo <URL> | ytsum");
    }

    let mut failed = false;
    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }

        let report = match orchestrator.process(url_input, mode).await {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{}", e.user_message());
                failed = true;
                continue;
            }
        };

        if cli.verbose {
            eprintln!(
                "Video: {} ({mode} mode{})",
                report.video.video_id,
                if report.summary.fallback_source { ", extractive fallback" } else { "" },
            );
        }

        let rendered = match format {
            OutputFormat::Text => ytsum::output::render_text(&report),
            OutputFormat::Json => ytsum::output::render_json(&report),
            OutputFormat::Markdown => ytsum::output::render_markdown(&report),
        };

        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    if failed {
        bail!("one or more videos could not be summarized");
    }
    Ok(())
}
