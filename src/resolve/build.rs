//! Builds the single `Resolver` value the pipeline enriches with, from the
//! external `resolve` config section. Chain and cache are themselves
//! Resolvers, so configuration produces a single
//! Resolver value regardless of depth").

use std::time::Duration;

use thiserror::Error;

use crate::config::ResolveConfig;

use super::cache::CachingResolver;
use super::chain::ChainResolver;
use super::docker::{DockerResolver, DockerResolverError};
use super::resolver::Resolver;
use super::static_resolver::StaticResolver;

const DEFAULT_TTL_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ResolveBuildError {
    #[error("docker resolver: {0}")]
    Docker(#[from] DockerResolverError),
}

/// `None` means no resolver was configured at all — the enrichment step is
/// a no-op in that case. Otherwise the result is always wrapped in the
/// caching resolver, regardless of how many underlying resolvers combined.
pub fn from_config(cfg: &ResolveConfig) -> Result<Option<Box<dyn Resolver>>, ResolveBuildError> {
    let mut resolvers: Vec<Box<dyn Resolver>> = Vec::new();

    if !cfg.static_entries.is_empty() {
        resolvers.push(Box::new(StaticResolver::new(cfg.static_entries.clone())));
    }
    if cfg.docker {
        resolvers.push(Box::new(DockerResolver::connect()?));
    }

    if resolvers.is_empty() {
        return Ok(None);
    }

    let combined: Box<dyn Resolver> = if resolvers.len() > 1 {
        Box::new(ChainResolver::new(resolvers))
    } else {
        resolvers.into_iter().next().unwrap()
    };

    let ttl = Duration::from_secs(if cfg.cache.ttl_secs > 0 {
        cfg.cache.ttl_secs
    } else {
        DEFAULT_TTL_SECS
    });

    Ok(Some(Box::new(CachingResolver::new(
        combined,
        ttl,
        cfg.cache.max_size,
    ))))
}
