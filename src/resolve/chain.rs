//! Ordered composition of resolvers: first `found=true` wins, earlier
//! resolvers shadow later ones.

use futures_util::future::BoxFuture;

use super::resolver::Resolver;

pub struct ChainResolver {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ChainResolver {
    pub fn new(resolvers: Vec<Box<dyn Resolver>>) -> Self {
        Self { resolvers }
    }
}

impl Resolver for ChainResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, (String, bool)> {
        Box::pin(async move {
            for resolver in &self.resolvers {
                let (service, found) = resolver.resolve(host).await;
                if found {
                    return (service, found);
                }
            }
            (String::new(), false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::static_resolver::StaticResolver;

    #[tokio::test]
    async fn first_match_wins() {
        let first = StaticResolver::new(vec![("svc".to_string(), "from-first".to_string())]);
        let second = StaticResolver::new(vec![("svc".to_string(), "from-second".to_string())]);
        let chain = ChainResolver::new(vec![Box::new(first), Box::new(second)]);
        assert_eq!(
            chain.resolve("svc").await,
            ("from-first".to_string(), true)
        );
    }

    #[tokio::test]
    async fn falls_through_to_later_resolver() {
        let first = StaticResolver::new(vec![("a".to_string(), "from-first".to_string())]);
        let second = StaticResolver::new(vec![("b".to_string(), "from-second".to_string())]);
        let chain = ChainResolver::new(vec![Box::new(first), Box::new(second)]);
        assert_eq!(
            chain.resolve("b").await,
            ("from-second".to_string(), true)
        );
    }

    #[tokio::test]
    async fn no_resolver_matches() {
        let first = StaticResolver::new(vec![("a".to_string(), "x".to_string())]);
        let chain = ChainResolver::new(vec![Box::new(first)]);
        assert_eq!(chain.resolve("z").await, (String::new(), false));
    }
}
