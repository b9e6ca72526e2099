use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Url;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use markup_check::cli::{Cli, ContentKind, VerbosityLevel};
use markup_check::config::{Config, ConfigManager};
use markup_check::file_discovery::{DiscoveredFile, FileDiscovery};
use markup_check::{
    BaseValidator, CssValidator, Exchange, HtmlValidator, HttpClientConfig, HttpExchange, Output,
    ValidationResult, Validator,
};

fn init_logging(verbosity: VerbosityLevel) {
    let default = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "markup_check=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_validators(config: &Config) -> Result<(HtmlValidator, CssValidator)> {
    let exchange: Arc<dyn Exchange> = Arc::new(
        HttpExchange::new(HttpClientConfig {
            timeout_seconds: config.network.timeout_seconds,
            user_agent: config.network.user_agent.clone(),
        })
        .context("Failed to create HTTP client")?,
    );
    let base = || {
        BaseValidator::new(Arc::clone(&exchange))
            .with_user_agent(config.network.user_agent.clone())
            .with_retry(
                config.retry.attempts,
                ConfigManager::get_retry_delay_duration(config),
            )
    };

    let html_uri = Url::parse(&config.validators.html_uri)
        .with_context(|| format!("Invalid markup validator URI: {}", config.validators.html_uri))?;
    let css_uri = Url::parse(&config.validators.css_uri)
        .with_context(|| format!("Invalid CSS validator URI: {}", config.validators.css_uri))?;

    Ok((
        HtmlValidator::new(base(), html_uri),
        CssValidator::new(base(), css_uri),
    ))
}

async fn check_file(
    file: &DiscoveredFile,
    html: &HtmlValidator,
    css: &CssValidator,
) -> Result<ValidationResult> {
    let content = tokio::fs::read_to_string(&file.path)
        .await
        .with_context(|| format!("Failed to read {}", file.path.display()))?;
    debug!(path = %file.path.display(), kind = ?file.kind, "validating");
    Ok(match file.kind {
        ContentKind::Html => html.validate(&content).await,
        ContentKind::Css => css.validate(&content).await,
    })
}

async fn run(cli: Cli) -> Result<bool> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    let (html, css) = build_validators(&config)?;

    let verbosity = if config.output.quiet {
        VerbosityLevel::Quiet
    } else if config.output.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };
    let output = Output::new(verbosity, config.output.format.into());

    let files = FileDiscovery::new(&config.files)
        .with_kind(cli.kind)
        .discover(&cli.paths);
    debug!(count = files.len(), "files discovered");

    let results: Vec<_> = stream::iter(&files)
        .map(|file| {
            let (html, css) = (&html, &css);
            async move { (file, check_file(file, html, css).await) }
        })
        .buffered(cli.get_job_count())
        .collect()
        .await;

    let mut invalid = 0;
    for (file, result) in &results {
        match result {
            Ok(result) => {
                if !result.valid {
                    invalid += 1;
                }
                if let Some(line) = output.format_result(&file.path, result) {
                    println!("{}", line);
                }
            }
            Err(e) => {
                invalid += 1;
                error!(path = %file.path.display(), "{:#}", e);
            }
        }
    }
    if let Some(summary) = output.format_summary(results.len(), invalid) {
        println!("{}", summary);
    }

    Ok(invalid == 0)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}
