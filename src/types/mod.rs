//! Core types shared by the query, aggregation and formatting stages.

pub mod context;
pub mod record;
pub mod usage;

pub use context::*;
pub use record::*;
pub use usage::*;
