//! Stencil CLI - render placeholder templates from the command line

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use clap::Parser;
use stencil_lib::{
    Bindings, Delimiter, JsonSource, RenderConfig, RenderError, Renderer, parse_delimiter,
    parse_time_zone,
};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stencil", version)]
#[command(about = "Render placeholder templates from environment, time and JSON sources", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    log_verbosity: u8,

    /// Templates to render; each result is printed on its own line
    #[arg(value_name = "TEMPLATE", required_unless_present = "file")]
    templates: Vec<String>,

    /// Read an additional template from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Placeholder opener: `at` for @{...}, `dollar` for ${...}
    #[arg(long, value_parser = parse_delimiter, default_value = "at")]
    delimiter: Delimiter,

    /// Time zone for builtin values, e.g. UTC, UTC+2, -05:30 [default: $TIME_ZONE or UTC]
    #[arg(long, value_parser = parse_time_zone, allow_hyphen_values = true)]
    time_zone: Option<FixedOffset>,

    /// JSON source as `<url>` or `<url> | <path>` [default: $CONTENT_JSON]
    #[arg(long, value_name = "SOURCE")]
    json_source: Option<JsonSource>,

    /// Seed for reproducible random choices
    #[arg(long)]
    seed: Option<u64>,

    /// Skip list elements lacking the key in attr(name) instead of failing
    #[arg(long)]
    attr_tolerant: bool,

    /// Timeout for the JSON fetch, in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to read template file {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid environment: {0}")]
    Environment(String),
}

/// Initialize tracing subscriber based on verbosity
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,stencil_lib=info".to_string(),
            2 => "info,stencil_lib=debug".to_string(),
            _ => "debug,stencil_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

async fn run(cli: Cli) -> Result<Vec<String>, CliError> {
    let mut templates = cli.templates;
    if let Some(path) = cli.file {
        let template = std::fs::read_to_string(&path)
            .map_err(|source| CliError::ReadTemplate { path, source })?;
        templates.push(template.trim_end_matches(['\n', '\r']).to_string());
    }

    let mut bindings = match cli.json_source {
        Some(source) => Bindings::from_process_env_with_source(source),
        None => Bindings::from_process_env().map_err(CliError::Environment)?,
    };
    if let Some(time_zone) = cli.time_zone {
        bindings = bindings.time_zone(time_zone);
    }

    let mut config = RenderConfig::new()
        .delimiter(cli.delimiter)
        .attr_tolerant(cli.attr_tolerant)
        .fetch_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }
    debug!(?config, templates = templates.len(), "rendering");

    let renderer = Renderer::new(config);
    Ok(renderer.render_many(&templates, &bindings).await?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity);

    match run(cli).await {
        Ok(rendered) => {
            for text in rendered {
                println!("{text}");
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
