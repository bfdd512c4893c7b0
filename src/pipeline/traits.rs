//! Trait contracts for the three pluggable seams of the pipeline:
//! where events come from, how they're reshaped in flight, and where they
//! end up. `Source`/`Sink` return boxed futures for the same reason
//! `Resolver` does, rather than pulling in `async-trait` for a handful of
//! call sites.

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::NormalizedEvent;

use super::error::PipelineError;

/// One line of raw input plus the tag identifying which configured source
/// produced it, carried forward into `NormalizedEvent::source_name`.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    pub source_tag: String,
}

/// A producer of raw lines. `run` owns its input (stdin, a file, a Docker
/// log stream) until it's exhausted or `cancel` fires, forwarding each line
/// on `out`. Returning `Err` is fatal and cancels the whole pipeline;
/// the channel simply closing is not an error.
pub trait Source: Send + Sync {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        out: mpsc::Sender<RawLine>,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// A consumer of normalized events. `run` owns the channel until it closes
/// or `cancel` fires. A write failure is fatal.
pub trait Sink: Send + Sync {
    fn run<'a>(
        &'a self,
        cancel: CancellationToken,
        input: mpsc::Receiver<NormalizedEvent>,
    ) -> BoxFuture<'a, Result<(), PipelineError>>;
}

/// An in-place rewrite of a normalized event. Synchronous: remap
/// only ever touches fields already in memory, never I/O.
pub trait Transform: Send + Sync {
    fn apply(&self, event: &mut NormalizedEvent);
}
