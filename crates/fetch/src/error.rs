/// A fault during one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No factory registered for this module/metricset pair.
    UnknownMetricSet { module: String, metricset: String },
    /// Module config rejected, or a host could not be turned into a URL.
    Config(String),
    /// Connection, DNS, or timeout failure.
    Network { url: String, message: String },
    /// Non-success HTTP status.
    Http { url: String, status: u16 },
    /// Response body could not be read or was too large.
    Body { url: String, message: String },
    /// A line of the payload could not be parsed.
    Parse { line: usize, message: String },
    /// A parsed sample conflicts with another in the same cycle.
    Sample(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::UnknownMetricSet { module, metricset } => {
                write!(f, "unknown metricset '{}/{}'", module, metricset)
            }
            FetchError::Config(msg) => write!(f, "config error: {}", msg),
            FetchError::Network { url, message } => write!(f, "GET {} failed: {}", url, message),
            FetchError::Http { url, status } => write!(f, "GET {} returned HTTP {}", url, status),
            FetchError::Body { url, message } => {
                write!(f, "cannot read body from {}: {}", url, message)
            }
            FetchError::Parse { line, message } => write!(f, "line {}: {}", line, message),
            FetchError::Sample(msg) => write!(f, "invalid sample: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}
