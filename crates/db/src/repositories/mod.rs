//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a locked `&mut PgConnection`) as the first argument.

pub mod persona_repo;
pub mod project_repo;

pub use persona_repo::PersonaRepo;
pub use project_repo::ProjectRepo;
