use clap::Parser;
use std::path::PathBuf;

use ytsum::SummaryMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Parser)]
#[command(name = "ytsum", about = "YouTube video summarizer", version)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Summary depth: quick (default) or indepth
    #[arg(short, long, value_enum)]
    pub mode: Option<SummaryMode>,

    /// Output format: text (default), json, markdown
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// LLM model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Bypass the transcript and summary caches
    #[arg(long)]
    pub no_cache: bool,

    /// Show pipeline metadata on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
