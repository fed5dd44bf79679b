use std::fmt;

use crate::graph::NodeId;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalid,
    WeightsMissing,
    CapacityExceeded,
    DuplicateNode,
    UnknownNode,
    AlreadyComputed,
    AlgorithmReleased,
    ThreadPoolFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigInvalid => "E1001",
            Self::WeightsMissing => "E1002",
            Self::CapacityExceeded => "E2001",
            Self::DuplicateNode => "E2002",
            Self::UnknownNode => "E2003",
            Self::AlreadyComputed => "E3001",
            Self::AlgorithmReleased => "E3002",
            Self::ThreadPoolFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigInvalid => "Invalid configuration",
            Self::WeightsMissing => "Relationship weights not loaded",
            Self::CapacityExceeded => "Storage backend capacity exceeded",
            Self::DuplicateNode => "Duplicate original node id",
            Self::UnknownNode => "Node not found",
            Self::AlreadyComputed => "Algorithm already computed",
            Self::AlgorithmReleased => "Algorithm working state released",
            Self::ThreadPoolFailed => "Worker pool construction failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid => Some("Check the load and algorithm configuration values."),
            Self::WeightsMissing => {
                Some("Load the graph with `weights = \"property\"` or configure a `default_weight`.")
            }
            Self::CapacityExceeded => Some("Load with `backend = \"huge\"` (or `auto`)."),
            Self::DuplicateNode => Some("Each original id may appear only once in the node table."),
            Self::UnknownNode => None,
            Self::AlreadyComputed | Self::AlgorithmReleased => {
                Some("Algorithm instances are single-use; build a new one per computation.")
            }
            Self::ThreadPoolFailed => Some("Lower `concurrency` or check thread limits."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while loading a graph or driving an algorithm.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Load or algorithm configuration is inconsistent.
    #[error("{}: {reason}", ErrorCode::ConfigInvalid)]
    Config { reason: String },

    /// Weighted execution was requested on a graph loaded without weights.
    #[error("{}: {algorithm} requires relationship weights", ErrorCode::WeightsMissing)]
    MissingWeights { algorithm: &'static str },

    /// Declared node or relationship count does not fit the backend.
    #[error("{}: {what} count {requested} exceeds {backend} capacity {capacity}", ErrorCode::CapacityExceeded)]
    Capacity {
        backend: &'static str,
        what: &'static str,
        requested: u64,
        capacity: u64,
    },

    /// The node table contained the same original id twice.
    #[error("{}: original id {0} appears more than once", ErrorCode::DuplicateNode)]
    DuplicateNode(u64),

    /// An original id that was never loaded.
    #[error("{}: original id {0} is not part of the graph", ErrorCode::UnknownNode)]
    UnknownOriginalId(u64),

    /// A mapped id outside `[0, node_count)`.
    #[error("{}: mapped id {node} out of range for {node_count} nodes", ErrorCode::UnknownNode)]
    UnknownNode { node: NodeId, node_count: usize },

    /// `compute` was invoked a second time on a single-use instance.
    #[error("{}: {0} instances are single-use", ErrorCode::AlreadyComputed)]
    AlreadyComputed(&'static str),

    /// `compute` was invoked after `release`.
    #[error("{}: {0} working arrays were released", ErrorCode::AlgorithmReleased)]
    Released(&'static str),

    /// The rayon pool could not be built.
    #[error("{}: {0}", ErrorCode::ThreadPoolFailed)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl GraphError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config { .. } => ErrorCode::ConfigInvalid,
            Self::MissingWeights { .. } => ErrorCode::WeightsMissing,
            Self::Capacity { .. } => ErrorCode::CapacityExceeded,
            Self::DuplicateNode(_) => ErrorCode::DuplicateNode,
            Self::UnknownOriginalId(_) | Self::UnknownNode { .. } => ErrorCode::UnknownNode,
            Self::AlreadyComputed(_) => ErrorCode::AlreadyComputed,
            Self::Released(_) => ErrorCode::AlgorithmReleased,
            Self::ThreadPool(_) => ErrorCode::ThreadPoolFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, GraphError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigInvalid,
            ErrorCode::WeightsMissing,
            ErrorCode::CapacityExceeded,
            ErrorCode::DuplicateNode,
            ErrorCode::UnknownNode,
            ErrorCode::AlreadyComputed,
            ErrorCode::AlgorithmReleased,
            ErrorCode::ThreadPoolFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn display_is_prefixed_with_code() {
        let err = GraphError::MissingWeights {
            algorithm: "ShortestPathDijkstra",
        };
        assert_eq!(
            err.to_string(),
            "E1002: ShortestPathDijkstra requires relationship weights"
        );
        assert_eq!(err.code(), ErrorCode::WeightsMissing);
        assert!(err.hint().is_some());
    }

    #[test]
    fn capacity_error_names_backend() {
        let err = GraphError::Capacity {
            backend: "dense",
            what: "node",
            requested: 10,
            capacity: 5,
        };
        let text = err.to_string();
        assert!(text.starts_with("E2001"));
        assert!(text.contains("dense capacity 5"));
    }
}
