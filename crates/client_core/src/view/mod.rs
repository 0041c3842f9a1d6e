//! View state: reducer-like transitions per view, the fetch each view issues,
//! and the async controller that discards stale results.

pub mod controller;
pub mod loaders;
pub mod state;

pub use controller::{
    ComparisonController, DetailController, DispatchOutcome, ListingController, ViewController,
};
pub use loaders::{ComparisonLoader, DetailLoader, ListingLoader, ViewLoader, LISTING_PAGE_SIZE};
pub use state::{
    Completion, FetchTicket, Filter, Loaded, ViewAction, ViewQuery, ViewState, ViewStatus,
};

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
