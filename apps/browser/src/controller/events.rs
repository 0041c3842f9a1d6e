//! Interactive input events and user-facing error guidance.

use client_core::{view::Filter, ErrorAffordance, ViewError};

pub const BROWSE_HELP: &str =
    "commands: n next | p previous | g N go to page | f all|original|optimized | r retry | q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseInput {
    NextPage,
    PreviousPage,
    GoToPage(u32),
    SetFilter(Filter),
    Retry,
    Refresh,
    Help,
    Quit,
}

impl BrowseInput {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(Self::Refresh);
        };
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments in '{}'", line.trim()));
        }

        match (command.to_ascii_lowercase().as_str(), argument) {
            ("n" | "next", None) => Ok(Self::NextPage),
            ("p" | "prev" | "previous", None) => Ok(Self::PreviousPage),
            ("g" | "go", Some(page)) => page
                .parse::<u32>()
                .map(Self::GoToPage)
                .map_err(|_| format!("'{page}' is not a page number")),
            ("g" | "go", None) => Err("usage: g <page>".to_string()),
            ("f" | "filter", Some(filter)) => filter.parse().map(Self::SetFilter),
            ("f" | "filter", None) => Err("usage: f all|original|optimized".to_string()),
            ("r" | "retry", None) => Ok(Self::Retry),
            ("h" | "help" | "?", None) => Ok(Self::Help),
            ("q" | "quit" | "exit", None) => Ok(Self::Quit),
            _ => Err(format!("unknown command '{}'; {BROWSE_HELP}", line.trim())),
        }
    }
}

pub fn error_guidance(error: &ViewError) -> &'static str {
    match error.affordance() {
        ErrorAffordance::Retry => "Check that the article store is reachable and try again.",
        ErrorAffordance::BackToListing => "Back to articles: content-browser list",
        ErrorAffordance::None => "The article store sent a response this browser cannot read.",
    }
}
