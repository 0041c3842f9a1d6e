mod config;
mod controller;
mod render;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use client_core::{view::Filter, ArticleClient};
use shared::domain::ArticleId;
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, normalize_api_url},
    controller::orchestration::{
        run_browse, run_compare, run_create, run_delete, run_list, run_show, run_update, ViewEnd,
    },
};

#[derive(Parser, Debug)]
#[command(name = "content-browser", about = "Browse and compare articles from the content store")]
struct Cli {
    /// Base URL of the article store API, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles, nine per page.
    List {
        #[arg(long, default_value = "all")]
        filter: Filter,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single article.
    Show { id: String },
    /// Show original and optimized articles side by side.
    Compare,
    /// Page through the listing interactively.
    Browse,
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut settings = load_settings()?;
    if let Some(api_url) = &cli.api_url {
        settings.api_url = normalize_api_url(api_url)?;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = match settings.request_timeout() {
        Some(timeout) => ArticleClient::with_timeout(&settings.api_url, timeout),
        None => ArticleClient::new(&settings.api_url),
    }
    .with_context(|| format!("failed to set up client for {}", settings.api_url))?;
    let client = Arc::new(client);
    tracing::debug!(api_url = %settings.api_url, page_size = settings.page_size, "article store client ready");

    let mut out = stdout();
    let end = match cli.command {
        Command::List { filter, page } => {
            run_list(client, settings.page_size, filter, page, &mut out).await?
        }
        Command::Show { id } => run_show(client, ArticleId::new(id), &mut out).await?,
        Command::Compare => run_compare(client, &mut out).await?,
        Command::Browse => {
            run_browse(client, settings.page_size, BufReader::new(stdin()), &mut out).await?
        }
        Command::Create { file } => {
            run_create(&client, &file, &mut out).await?;
            ViewEnd::Ready
        }
        Command::Update { id, file } => {
            run_update(&client, &ArticleId::new(id), &file, &mut out).await?;
            ViewEnd::Ready
        }
        Command::Delete { id } => {
            run_delete(&client, &ArticleId::new(id), &mut out).await?;
            ViewEnd::Ready
        }
    };

    Ok(match end {
        ViewEnd::Ready => ExitCode::SUCCESS,
        ViewEnd::Failed => ExitCode::FAILURE,
    })
}
