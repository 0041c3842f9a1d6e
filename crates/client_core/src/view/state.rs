use std::{fmt, str::FromStr};

use crate::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Original,
    Optimized,
}

impl Filter {
    /// The `isOriginal` query value this filter maps to.
    pub fn is_original(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Original => Some(true),
            Self::Optimized => Some(false),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Articles",
            Self::Original => "Original Only",
            Self::Optimized => "Optimized Only",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Original => "original",
            Self::Optimized => "optimized",
        })
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "original" | "originals" => Ok(Self::Original),
            "optimized" | "optimised" => Ok(Self::Optimized),
            other => Err(format!(
                "unknown filter '{other}' (expected all, original or optimized)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Parameters a fetch is issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: Filter,
    pub page: u32,
}

/// Handed out whenever a transition enters `Loading`. The generation is
/// compared on completion so that only the newest fetch may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: ViewQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    /// Initial mount or explicit refresh with the current parameters.
    Load,
    SetFilter(Filter),
    SetPage(u32),
    NextPage,
    PreviousPage,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub items: T,
    pub total_pages: u32,
}

impl<T> Loaded<T> {
    pub fn single(items: T) -> Self {
        Self {
            items,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    filter: Filter,
    current_page: u32,
    total_pages: u32,
    items: T,
    status: ViewStatus,
    error: Option<ViewError>,
    generation: u64,
    last_query: Option<ViewQuery>,
}

impl<T: Default> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            filter: Filter::All,
            current_page: 1,
            total_pages: 1,
            items: T::default(),
            status: ViewStatus::Idle,
            error: None,
            generation: 0,
            last_query: None,
        }
    }
}

impl<T: Default> ViewState<T> {
    /// Idle state whose first `Load` requests `query` instead of page 1 of
    /// everything. The page count is taken on trust until that load lands.
    pub fn starting_at(query: ViewQuery) -> Self {
        let page = query.page.max(1);
        Self {
            filter: query.filter,
            current_page: page,
            total_pages: page,
            ..Self::default()
        }
    }
}

impl<T> ViewState<T> {
    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn items(&self) -> &T {
        &self.items
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    /// Set only while `status` is `Error`.
    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_query(&self) -> Option<ViewQuery> {
        self.last_query
    }

    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            filter: self.filter,
            page: self.current_page,
        }
    }

    /// Applies a user action. Returns the fetch to issue, or `None` when the
    /// action was a no-op and nothing changed.
    pub fn apply(&mut self, action: ViewAction) -> Option<FetchTicket> {
        match action {
            ViewAction::Load => Some(self.begin_fetch(self.query())),
            ViewAction::SetFilter(filter) => {
                self.filter = filter;
                self.current_page = 1;
                // unknown until this filter's first response lands
                self.total_pages = 1;
                Some(self.begin_fetch(self.query()))
            }
            ViewAction::SetPage(page) => self.go_to(page),
            ViewAction::NextPage => self.go_to(self.current_page.saturating_add(1)),
            ViewAction::PreviousPage => self.go_to(self.current_page.saturating_sub(1)),
            ViewAction::Retry => {
                if self.status != ViewStatus::Error {
                    return None;
                }
                let query = self.last_query.unwrap_or_else(|| self.query());
                Some(self.begin_fetch(query))
            }
        }
    }

    fn go_to(&mut self, page: u32) -> Option<FetchTicket> {
        if page < 1 || page > self.total_pages {
            return None;
        }
        self.current_page = page;
        Some(self.begin_fetch(self.query()))
    }

    fn begin_fetch(&mut self, query: ViewQuery) -> FetchTicket {
        self.generation += 1;
        self.status = ViewStatus::Loading;
        self.error = None;
        self.last_query = Some(query);
        FetchTicket {
            generation: self.generation,
            query,
        }
    }

    /// Lands a fetch result. Results from any generation other than the most
    /// recent one are discarded without touching state.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<Loaded<T>, ViewError>,
    ) -> Completion {
        if generation != self.generation || self.status != ViewStatus::Loading {
            return Completion::Stale;
        }
        match outcome {
            Ok(loaded) => {
                self.items = loaded.items;
                self.total_pages = loaded.total_pages.max(1);
                self.status = ViewStatus::Ready;
                self.error = None;
            }
            Err(error) => {
                self.status = ViewStatus::Error;
                self.error = Some(error);
            }
        }
        Completion::Applied
    }
}
