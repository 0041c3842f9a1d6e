//! Wire and domain types shared between the article store client and its
//! front ends.

pub mod domain;
pub mod error;
pub mod protocol;
