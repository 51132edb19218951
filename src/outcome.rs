use serde::Serialize;

/// Result of a cached fetch. Recoverable failures are carried as values so callers
/// decide whether a stale answer is good enough.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Fetched from the network just now.
    Fresh(T),
    /// Served from cache within its TTL; no network call was made.
    Cached(T),
    /// The fetch failed and an expired (or otherwise old) cache entry was served instead.
    Stale { data: T, error: String },
    /// The fetch failed and nothing was cached.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Fresh(data) | Outcome::Cached(data) | Outcome::Stale { data, .. } => {
                Some(data)
            }
            Outcome::Failed(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Fresh(data) | Outcome::Cached(data) | Outcome::Stale { data, .. } => {
                Some(data)
            }
            Outcome::Failed(_) => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Outcome::Cached(_) | Outcome::Stale { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Stale { error, .. } | Outcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Fresh(data) => Outcome::Fresh(f(data)),
            Outcome::Cached(data) => Outcome::Cached(f(data)),
            Outcome::Stale { data, error } => Outcome::Stale {
                data: f(data),
                error,
            },
            Outcome::Failed(error) => Outcome::Failed(error),
        }
    }

    /// Flatten into the `{data, cached, error}` shape used on the wire.
    pub fn into_report(self) -> FetchReport<T> {
        let cached = self.is_cached();
        let error = self.error().map(String::from);
        FetchReport {
            data: self.into_data(),
            cached,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport<T> {
    pub data: Option<T>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
