//! The unified event schema (`NormalizedEvent`) that every parser produces
//! and every downstream stage (transform, enrichment, sink) carries unchanged
//! in shape. See `model.rs` for the type and its invariants.

mod model;

pub use model::{
    NormalizedEvent, ValidationError, FORMAT_ECS, FORMAT_EMPTY, FORMAT_JSON, FORMAT_METRIC,
    FORMAT_PLAIN, FORMAT_TEMPLATE,
};
