mod app;
mod config;
mod debounce;
mod decode;
mod error;
mod executor;
mod logging;
mod model;
mod open;
mod session;
mod source;

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::app::{TuiContext, ViewProfile};
use crate::config::Config;
use crate::executor::QueryExecutor;
use crate::logging::LogTarget;
use crate::model::ResultItem;
use crate::open::Opener;
use crate::session::SearchSession;
use crate::source::{SearchSource, SourceKind};

#[derive(Debug, Parser)]
#[command(
    name = "flow",
    version,
    about = "Search-as-you-type for YouTube suggestions and GitHub repositories"
)]
struct Cli {
    /// Override config path. If omitted, flow checks ./flow.toml, ./.flow.toml, and then ~/.config/flow/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Search YouTube with live suggestions
    Youtube(SearchArgs),
    /// Search GitHub repositories
    Github(SearchArgs),
    /// Write an example config to the global config path
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Run a single query, print the results and exit instead of opening the UI
    #[arg(short, long)]
    query: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let (kind, args) = match cli.command {
        CliCommand::Youtube(args) => (SourceKind::Youtube, args),
        CliCommand::Github(args) => (SourceKind::Github, args),
        CliCommand::Init { force } => {
            let path = config::global_config_path()?;
            config::write_example_config(&path, force)?;
            println!("Wrote example config: {}", path.display());
            return Ok(());
        }
    };

    let cwd = env::current_dir()?;
    let loaded = config::load(&cwd, cli.config.as_deref())?;
    let log_target = if args.query.is_some() {
        LogTarget::Stderr
    } else {
        LogTarget::Interactive
    };
    let _log_guard = logging::init(&loaded.config.logging, log_target)?;
    match &loaded.path {
        Some(path) => tracing::info!(path = %path.display(), "config loaded"),
        None => tracing::debug!("no config file found, using defaults"),
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(search(kind, args, &loaded.config))
}

async fn search(kind: SourceKind, args: SearchArgs, config: &Config) -> Result<()> {
    let client = source::build_client(&config.http)?;
    let http_source = Arc::new(kind.build(config, client));
    let shared: Arc<dyn SearchSource> = http_source.clone();

    if let Some(query) = args.query {
        let executor = QueryExecutor::new(shared);
        let state = executor.resolve(&query).await;
        if let Some(err) = state.error {
            return Err(err.into());
        }
        for item in &state.items {
            println!("{}", format_item_line(item));
        }
        return Ok(());
    }

    let session = SearchSession::start(shared, kind.debounce(config));
    let opener = Opener::new(&config.open);
    app::run_tui(TuiContext {
        session: &session,
        source: &http_source,
        opener: &opener,
        profile: ViewProfile::for_source(kind),
    })
    .await
}

fn format_item_line(item: &ResultItem) -> String {
    [
        Some(item.title.as_str()),
        item.subtitle.as_deref(),
        item.tag.as_deref(),
        item.accessory.as_deref(),
        Some(item.url.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_lines_skip_missing_fields() {
        let mut item = ResultItem::titled("a/b", "https://github.com/a/b");
        assert_eq!(format_item_line(&item), "a/b\thttps://github.com/a/b");

        item.tag = Some("Go".to_string());
        item.accessory = Some("★ 1,234".to_string());
        assert_eq!(
            format_item_line(&item),
            "a/b\tGo\t★ 1,234\thttps://github.com/a/b"
        );

        item.subtitle = Some("A tiny library".to_string());
        assert_eq!(
            format_item_line(&item),
            "a/b\tA tiny library\tGo\t★ 1,234\thttps://github.com/a/b"
        );
    }

    #[test]
    fn cli_parses_one_shot_query() {
        let cli = Cli::try_parse_from(["flow", "github", "--query", "tokio"]).unwrap();
        let CliCommand::Github(args) = cli.command else {
            panic!("expected github command");
        };
        assert_eq!(args.query.as_deref(), Some("tokio"));
    }

    #[test]
    fn cli_accepts_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["flow", "youtube", "--config", "flow.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("flow.toml")));
        assert!(matches!(cli.command, CliCommand::Youtube(_)));
    }
}
