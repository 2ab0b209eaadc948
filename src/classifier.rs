use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Catch-all bucket for paths no registered matcher accepts.
pub const UNKNOWN_ENDPOINT: &str = "other";

/// Predicate deciding whether a URL path belongs to an endpoint.
pub type Matcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

struct Rule {
    name: String,
    matcher: Matcher,
}

// ─── Builder ─────────────────────────────────────────────────────

/// Collects `(name, matcher)` rules before serving starts.
///
/// Rules are evaluated in registration order and the first match wins, so
/// overlapping matchers should be registered most-specific first.
#[derive(Default)]
pub struct ClassifierBuilder {
    rules: Vec<Rule>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint. Names are unique; re-registering one is an error
    /// rather than an overwrite.
    pub fn register<F>(&mut self, name: impl Into<String>, matcher: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyEndpointName);
        }
        if name == UNKNOWN_ENDPOINT {
            return Err(ConfigError::ReservedEndpoint(name));
        }
        if self.rules.iter().any(|r| r.name == name) {
            return Err(ConfigError::DuplicateEndpoint(name));
        }

        self.rules.push(Rule {
            name,
            matcher: Arc::new(matcher),
        });
        Ok(self)
    }

    /// Endpoint matching every path that starts with `prefix`.
    pub fn prefix(&mut self, name: impl Into<String>, prefix: impl Into<String>) -> Result<&mut Self, ConfigError> {
        let prefix = prefix.into();
        self.register(name, move |path: &str| path.starts_with(prefix.as_str()))
    }

    /// Endpoint matching exactly one path.
    pub fn exact(&mut self, name: impl Into<String>, path: impl Into<String>) -> Result<&mut Self, ConfigError> {
        let path = path.into();
        self.register(name, move |p: &str| p == path)
    }

    /// Freeze the table. Fails when nothing was registered.
    pub fn build(self) -> Result<EndpointClassifier, ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        Ok(EndpointClassifier {
            rules: self.rules.into(),
        })
    }
}

// ─── Frozen classifier ──────────────────────────────────────────

/// Read-only path → endpoint mapping shared by the request path.
#[derive(Clone)]
pub struct EndpointClassifier {
    rules: Arc<[Rule]>,
}

impl EndpointClassifier {
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    /// Name of the first endpoint whose matcher accepts `path`, or `"other"`.
    pub fn classify(&self, path: &str) -> &str {
        self.rules
            .iter()
            .find(|r| (r.matcher)(path))
            .map(|r| r.name.as_str())
            .unwrap_or(UNKNOWN_ENDPOINT)
    }

    /// Registered names in order, followed by the sentinel.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules
            .iter()
            .map(|r| r.name.as_str())
            .chain(std::iter::once(UNKNOWN_ENDPOINT))
    }

    /// Number of registered endpoints, sentinel excluded.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for EndpointClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| &r.name)).finish()
    }
}
