use tokio::sync::Mutex;
use tracing::debug;

use super::{
    loaders::{ComparisonLoader, DetailLoader, ListingLoader, ViewLoader},
    state::{Completion, Filter, ViewAction, ViewQuery, ViewState},
};

pub type ListingController<R> = ViewController<ListingLoader<R>>;
pub type ComparisonController<R> = ViewController<ComparisonLoader<R>>;
pub type DetailController<R> = ViewController<DetailLoader<R>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action was a no-op; no fetch was issued.
    Ignored,
    /// The fetch finished and its result is now the view's state.
    Applied,
    /// The fetch finished after a newer one started; its result was dropped.
    Superseded,
}

/// Drives one view: applies actions to its state, runs the resulting fetch
/// and lands the result if it is still the newest. Safe to call from several
/// tasks at once; the lock is never held across the fetch.
pub struct ViewController<L: ViewLoader> {
    loader: L,
    state: Mutex<ViewState<L::Data>>,
}

impl<L: ViewLoader> ViewController<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Controller whose first load requests `query`; see
    /// [`ViewState::starting_at`].
    pub fn starting_at(loader: L, query: ViewQuery) -> Self {
        Self {
            loader,
            state: Mutex::new(ViewState::starting_at(query)),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub async fn dispatch(&self, action: ViewAction) -> DispatchOutcome {
        let ticket = self.state.lock().await.apply(action);
        let Some(ticket) = ticket else {
            debug!(?action, "view action ignored");
            return DispatchOutcome::Ignored;
        };

        let outcome = self.loader.load(ticket.query).await;

        let mut state = self.state.lock().await;
        match state.complete(ticket.generation, outcome) {
            Completion::Applied => DispatchOutcome::Applied,
            Completion::Stale => {
                debug!(
                    generation = ticket.generation,
                    current = state.generation(),
                    "discarding stale fetch result"
                );
                DispatchOutcome::Superseded
            }
        }
    }

    pub async fn load(&self) -> DispatchOutcome {
        self.dispatch(ViewAction::Load).await
    }

    pub async fn set_filter(&self, filter: Filter) -> DispatchOutcome {
        self.dispatch(ViewAction::SetFilter(filter)).await
    }

    pub async fn set_page(&self, page: u32) -> DispatchOutcome {
        self.dispatch(ViewAction::SetPage(page)).await
    }

    pub async fn next_page(&self) -> DispatchOutcome {
        self.dispatch(ViewAction::NextPage).await
    }

    pub async fn previous_page(&self) -> DispatchOutcome {
        self.dispatch(ViewAction::PreviousPage).await
    }

    pub async fn retry(&self) -> DispatchOutcome {
        self.dispatch(ViewAction::Retry).await
    }

    pub async fn snapshot(&self) -> ViewState<L::Data> {
        self.state.lock().await.clone()
    }
}
