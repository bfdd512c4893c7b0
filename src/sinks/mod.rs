//! Concrete `Sink` adapters.

pub mod stdout;

pub use stdout::StdoutSink;
