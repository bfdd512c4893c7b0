//! The transform stage.

pub mod remap;

pub use remap::{CaseMode, RemapTransform};
