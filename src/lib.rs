//! # Featscope - Feature Discovery Engine
//!
//! Scored symbol discovery over a polyglot (Vue + Laravel) code graph.
//!
//! Featscope starts from one entry-point symbol and walks a pre-built
//! static-analysis graph — symbols, typed dependency edges, and HTTP
//! `api_calls` rows bridging frontend callers to backend endpoints — to
//! find every symbol that participates in a feature. The result is a map
//! `symbol id → relevance ∈ [0, 1]` suitable for rendering as a feature
//! manifest.
//!
//! Featscope provides:
//! - A narrow read-only [`GraphStore`] port over the graph database
//! - A symbol classifier (executor / container / entity / data roles)
//! - A cross-stack strategy bridging frontend and backend via `api_calls`
//! - A direction- and depth-aware dependency BFS with pollution prevention
//! - A [`DiscoveryEngine`] that runs strategies to convergence

pub mod symbol;
pub mod edge;
pub mod classify;
pub mod graph;
pub mod store;
pub mod discovery;
pub mod config;

// Re-exports for convenient access
pub use symbol::{EntityType, Symbol, SymbolType};
pub use edge::{ApiCall, DependencyType};
pub use classify::{Direction, Role};
pub use graph::MemoryGraph;
pub use store::{GraphStore, SqliteGraphStore};
pub use discovery::{DiscoveryEngine, DiscoveryOptions, DiscoveryRequest, DiscoveryResult};

/// Stable identity of a symbol row in the graph database.
pub type SymbolId = i64;
/// Identity of a source file containing symbols.
pub type FileId = i64;
/// Identity of an indexed repository.
pub type RepoId = i64;

/// Result type alias for Featscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Featscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Graph store error: {0}")]
    Store(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(SymbolId),

    #[error("Strategy '{strategy}' failed: {source}")]
    CriticalStrategy {
        strategy: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
