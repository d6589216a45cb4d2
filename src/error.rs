use thiserror::Error;

/// Why a source could not be turned into a table or feature collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The bytes could not be read (missing file, refused connection, HTTP error status).
    Unreachable(String),
    /// The bytes were read but are not a usable CSV / GeoJSON document.
    Malformed(String),
}

/// A source failed to load. Always names the offending path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {path}: {kind}")]
pub struct LoadError {
    pub path: String,
    pub kind: LoadErrorKind,
}

impl std::fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadErrorKind::Unreachable(reason) => write!(f, "unreachable ({reason})"),
            LoadErrorKind::Malformed(reason) => write!(f, "malformed ({reason})"),
        }
    }
}

impl LoadError {
    pub fn unreachable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self { path: path.into(), kind: LoadErrorKind::Unreachable(reason.to_string()) }
    }

    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self { path: path.into(), kind: LoadErrorKind::Malformed(reason.to_string()) }
    }

    pub fn is_unreachable(&self) -> bool { matches!(self.kind, LoadErrorKind::Unreachable(_)) }
}

/// Problems with the metric/source configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration declares no tabular sources")]
    NoSources,
    #[error("metric {metric:?} is declared by both {first} and {second}")]
    DuplicateMetric { metric: String, first: String, second: String },
    #[error("unknown metric {0:?}")]
    UnknownMetric(String),
    #[error("failed to read config {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}
