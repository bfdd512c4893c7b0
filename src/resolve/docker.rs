//! Container-platform resolver: looks a host up as a container name/ID via
//! the Docker API and returns its logical service name, preferring a
//! compose-assigned service label over the bare container name.

use std::sync::LazyLock;

use bollard::Docker;
use futures_util::future::BoxFuture;
use regex::Regex;
use thiserror::Error;

use super::resolver::Resolver;

const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

static REPLICA_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_]\d+$").unwrap());

#[derive(Error, Debug)]
pub enum DockerResolverError {
    #[error("docker client: {0}")]
    Client(#[from] bollard::errors::Error),
}

pub struct DockerResolver {
    client: Docker,
}

impl DockerResolver {
    pub fn connect() -> Result<Self, DockerResolverError> {
        Ok(Self {
            client: Docker::connect_with_local_defaults()?,
        })
    }
}

impl Resolver for DockerResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, (String, bool)> {
        Box::pin(async move {
            let Ok(info) = self.client.inspect_container(host, None).await else {
                // Inner-resolver failures surface as a miss, never fatal.
                return (String::new(), false);
            };

            if let Some(service) = info
                .config
                .as_ref()
                .and_then(|c| c.labels.as_ref())
                .and_then(|labels| labels.get(COMPOSE_SERVICE_LABEL))
            {
                return (service.clone(), true);
            }

            let name = info
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default();
            if name.is_empty() {
                return (String::new(), false);
            }

            let stripped = REPLICA_SUFFIX.replace(&name, "").into_owned();
            (stripped, true)
        })
    }
}
