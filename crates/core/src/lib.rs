//! Inflio domain logic.
//!
//! Pure types and rules shared by the database, pipeline and API crates:
//! task lifecycle transitions, clip merging, project status derivation and
//! input validation. Nothing in this crate performs I/O.

pub mod clip;
pub mod error;
pub mod persona;
pub mod project;
pub mod task;
pub mod types;
