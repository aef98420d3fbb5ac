//! Reconciliation engine: imports a parsed policy bundle into the management
//! server, reusing semantically-equivalent server objects where they exist,
//! renaming around name collisions, and rewriting every downstream reference
//! through the resulting translation tables.

pub mod error;
pub mod index;
pub mod payload;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod resolve;
pub mod rewrite;

pub use error::{EngineError, EngineResult};
pub use pipeline::{Migration, MigrationOptions};
pub use report::MigrationReport;
