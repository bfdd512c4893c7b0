// Collector pipeline: event model, parse engine, resolver stack, pipeline
// runtime, transform stage, and concrete source/sink adapters.
pub mod config;
pub mod event;
pub mod parse;
pub mod pipeline;
pub mod resolve;
pub mod sinks;
pub mod sources;
pub mod transform;
