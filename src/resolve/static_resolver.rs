//! Static map resolver: an exact-match table plus an ordered list of
//! case-insensitive shell-glob wildcards. Exact and wildcard entries live in
//! separate containers so lookup order is fixed at the type level — exact
//! always beats wildcard, regardless of declaration order.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use regex::Regex;

use super::resolver::Resolver;

struct Wildcard {
    pattern: Regex,
    service: String,
}

pub struct StaticResolver {
    exact: HashMap<String, String>,
    wildcards: Vec<Wildcard>,
}

impl StaticResolver {
    /// Builds the resolver from an ordered `(pattern, service_name)` list.
    /// Patterns containing `*` become case-insensitive wildcards (scanned in
    /// the order given); everything else goes into the exact table, keyed
    /// on the lowercased pattern.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut exact = HashMap::new();
        let mut wildcards = Vec::new();

        for (pattern, service) in entries {
            let lower = pattern.to_lowercase();
            if lower.contains('*') {
                wildcards.push(Wildcard {
                    pattern: glob_to_regex(&lower),
                    service,
                });
            } else {
                exact.insert(lower, service);
            }
        }

        Self { exact, wildcards }
    }

    fn resolve_sync(&self, host: &str) -> (String, bool) {
        let lower = host.to_lowercase();
        if let Some(service) = self.exact.get(&lower) {
            return (service.clone(), true);
        }
        for wildcard in &self.wildcards {
            if wildcard.pattern.is_match(&lower) {
                return (wildcard.service.clone(), true);
            }
        }
        (String::new(), false)
    }
}

impl Resolver for StaticResolver {
    fn resolve<'a>(&'a self, host: &'a str) -> BoxFuture<'a, (String, bool)> {
        let result = self.resolve_sync(host);
        Box::pin(async move { result })
    }
}

/// Translates shell-glob `*` wildcards into an anchored, case-sensitive
/// regex (the caller already lowercases both pattern and host).
fn glob_to_regex(pattern: &str) -> Regex {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let body = escaped.join(".*");
    Regex::new(&format!("^{body}$")).expect("glob-derived regex is always valid")
}
