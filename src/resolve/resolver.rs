//! The resolver capability contract: `resolve(host) -> (service_name,
//! found)`, possibly suspending, safe to call from many concurrent parse
//! consumers.
//!
//! Trait methods return a boxed future rather than using `#[async_trait]`:
//! nothing else in this crate depends on that macro, and the crate already
//! hand-rolls boxed futures/streams elsewhere (e.g. the Docker log stream),
//! so this keeps the dependency stack unchanged.

use futures_util::future::BoxFuture;

pub trait Resolver: Send + Sync {
    /// Resolves `host` to a logical service name. `found=false` means no
    /// resolver in the chain recognized `host` — not an error.
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, (String, bool)>;
}
