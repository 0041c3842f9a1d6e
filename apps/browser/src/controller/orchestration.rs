//! Command orchestration: runs one view controller per command and writes its
//! rendering to the given output.

use std::path::Path;

use anyhow::Context;
use client_core::{
    view::{
        ComparisonController, ComparisonLoader, DetailController, DetailLoader, DispatchOutcome,
        Filter, ListingController, ListingLoader, ViewController, ViewLoader, ViewQuery,
        ViewState, ViewStatus,
    },
    ArticleRepository,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::ArticleId,
    protocol::{ArticleDraft, ArticlePatch},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::events::{BrowseInput, BROWSE_HELP};
use crate::render::{render_article, render_comparison, render_detail, render_listing};

/// How a view command ended; drives the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEnd {
    Ready,
    Failed,
}

impl ViewEnd {
    pub fn of<T>(state: &ViewState<T>) -> Self {
        if state.status() == ViewStatus::Error {
            Self::Failed
        } else {
            Self::Ready
        }
    }
}

async fn emit<O: AsyncWrite + Unpin>(out: &mut O, text: &str) -> anyhow::Result<()> {
    out.write_all(text.as_bytes())
        .await
        .context("failed to write output")?;
    out.flush().await.context("failed to flush output")
}

async fn finish<L, O>(
    controller: &ViewController<L>,
    render: impl Fn(&ViewState<L::Data>) -> String,
    out: &mut O,
) -> anyhow::Result<ViewEnd>
where
    L: ViewLoader,
    O: AsyncWrite + Unpin,
{
    let state = controller.snapshot().await;
    emit(out, &render(&state)).await?;
    Ok(ViewEnd::of(&state))
}

pub async fn run_list<R, O>(
    repo: R,
    page_size: u32,
    filter: Filter,
    page: u32,
    out: &mut O,
) -> anyhow::Result<ViewEnd>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let controller = ListingController::starting_at(
        ListingLoader::with_page_size(repo, page_size),
        ViewQuery { filter, page },
    );
    controller.load().await;

    // The store only reports how many pages exist once asked for one.
    let state = controller.snapshot().await;
    if state.status() == ViewStatus::Ready && state.current_page() > state.total_pages() {
        emit(
            out,
            &format!(
                "page {} is out of range; showing page {} of {}\n",
                state.current_page(),
                state.total_pages(),
                state.total_pages()
            ),
        )
        .await?;
        controller.set_page(state.total_pages()).await;
    }

    finish(&controller, render_listing, out).await
}

pub async fn run_show<R, O>(repo: R, id: ArticleId, out: &mut O) -> anyhow::Result<ViewEnd>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let controller = DetailController::new(DetailLoader::new(repo, id));
    controller.load().await;
    finish(&controller, render_detail, out).await
}

pub async fn run_compare<R, O>(repo: R, out: &mut O) -> anyhow::Result<ViewEnd>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let controller = ComparisonController::new(ComparisonLoader::new(repo));
    controller.load().await;
    finish(&controller, render_comparison, out).await
}

/// Interactive listing. Reads one command per line until `q` or end of input.
pub async fn run_browse<R, I, O>(
    repo: R,
    page_size: u32,
    input: I,
    out: &mut O,
) -> anyhow::Result<ViewEnd>
where
    R: ArticleRepository,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let controller = ListingController::new(ListingLoader::with_page_size(repo, page_size));
    controller.load().await;
    emit(out, &render_listing(&controller.snapshot().await)).await?;
    emit(out, &format!("{BROWSE_HELP}\n")).await?;

    let mut lines = input.lines();
    loop {
        emit(out, "> ").await?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let event = match BrowseInput::parse(&line) {
            Ok(event) => event,
            Err(message) => {
                emit(out, &format!("{message}\n")).await?;
                continue;
            }
        };

        let dispatched = match event {
            BrowseInput::NextPage => controller.next_page().await,
            BrowseInput::PreviousPage => controller.previous_page().await,
            BrowseInput::GoToPage(page) => controller.set_page(page).await,
            BrowseInput::SetFilter(filter) => controller.set_filter(filter).await,
            BrowseInput::Retry => controller.retry().await,
            BrowseInput::Refresh => controller.load().await,
            BrowseInput::Help => {
                emit(out, &format!("{BROWSE_HELP}\n")).await?;
                continue;
            }
            BrowseInput::Quit => break,
        };

        if dispatched == DispatchOutcome::Ignored {
            let state = controller.snapshot().await;
            let note = match event {
                BrowseInput::Retry => "nothing to retry\n".to_string(),
                _ => format!(
                    "no such page; there are {} page(s)\n",
                    state.total_pages()
                ),
            };
            emit(out, &note).await?;
            continue;
        }
        emit(out, &render_listing(&controller.snapshot().await)).await?;
    }

    Ok(ViewEnd::of(&controller.snapshot().await))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

pub async fn run_create<R, O>(repo: &R, file: &Path, out: &mut O) -> anyhow::Result<()>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let draft: ArticleDraft = read_json(file).await?;
    let created = repo
        .create_article(&draft)
        .await
        .context("failed to create article")?;
    tracing::info!(id = %created.id, "created article");
    emit(out, &format!("created {}\n\n{}", created.id, render_article(&created))).await
}

pub async fn run_update<R, O>(
    repo: &R,
    id: &ArticleId,
    file: &Path,
    out: &mut O,
) -> anyhow::Result<()>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let patch: ArticlePatch = read_json(file).await?;
    let updated = repo
        .update_article(id, &patch)
        .await
        .with_context(|| format!("failed to update article {id}"))?;
    tracing::info!(id = %updated.id, "updated article");
    emit(out, &format!("updated {}\n\n{}", updated.id, render_article(&updated))).await
}

pub async fn run_delete<R, O>(repo: &R, id: &ArticleId, out: &mut O) -> anyhow::Result<()>
where
    R: ArticleRepository,
    O: AsyncWrite + Unpin,
{
    let deleted = repo
        .delete_article(id)
        .await
        .with_context(|| format!("failed to delete article {id}"))?;
    tracing::info!(%id, "deleted article");
    let text = match deleted {
        Some(article) => format!("deleted {} ({})\n", article.id, article.title),
        None => format!("deleted {id}\n"),
    };
    emit(out, &text).await
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
