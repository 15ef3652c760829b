//! Find duplicate scenes in a Stash library.
//!
//! The catalog is fetched over GraphQL ([`stash::StashClient`]) and grouped
//! by one of four strategies ([`duplicates::Strategy`]).

pub mod config;
pub mod duplicates;
pub mod error;
pub mod export;
pub mod logging;
pub mod stash;

pub use duplicates::{find_duplicates, DuplicateGroup, DuplicateReport, Strategy};
pub use error::Error;
