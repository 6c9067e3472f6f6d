//! Data models
//!
//! Records fetched from the management API and the run metadata stamped on
//! every export row. Nothing here is persisted beyond the export itself.

mod application;
mod library_item;
mod run;

pub use application::*;
pub use library_item::*;
pub use run::*;
