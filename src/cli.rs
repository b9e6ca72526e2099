use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show invalid files
    Quiet,
    /// Show one line per file
    #[default]
    Normal,
    /// Show every diagnostic
    Verbose,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// One JSON object per file
    Json,
}

/// Which remote validator to use for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContentKind {
    Html,
    Css,
}

/// Validate HTML and CSS files through the W3C SOAP validators
#[derive(Parser, Debug, Clone)]
#[command(name = "markup-check")]
#[command(about = "Validate HTML and CSS files against the W3C markup and CSS validators")]
#[command(version)]
pub struct Cli {
    /// Files or directories to validate
    #[arg(required = true, help = "Files or directories to validate")]
    pub paths: Vec<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Force the validator instead of choosing by file extension
    #[arg(short = 'k', long = "kind", value_enum)]
    pub kind: Option<ContentKind>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Attempts before giving up on an unsettled validator response
    #[arg(long = "retry-attempts")]
    pub retry_attempts: Option<u32>,

    /// Pause between attempts in milliseconds
    #[arg(long = "retry-delay-ms")]
    pub retry_delay_ms: Option<u64>,

    /// Markup validator endpoint
    #[arg(long = "html-validator")]
    pub html_validator: Option<String>,

    /// CSS validator endpoint
    #[arg(long = "css-validator")]
    pub css_validator: Option<String>,

    /// Number of files validated concurrently
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (invalid files only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        for path in &self.paths {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err("Number of jobs must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn get_job_count(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
