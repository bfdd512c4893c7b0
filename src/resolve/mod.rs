//! The resolver stack: a composable chain of resolvers fronted by a
//! TTL-and-size-bounded cache.

pub mod build;
pub mod cache;
pub mod chain;
pub mod docker;
pub mod resolver;
pub mod static_resolver;

pub use build::{from_config, ResolveBuildError};
pub use cache::CachingResolver;
pub use chain::ChainResolver;
pub use docker::{DockerResolver, DockerResolverError};
pub use resolver::Resolver;
pub use static_resolver::StaticResolver;
