//! Feature discovery engine
//!
//! The engine runs registered strategies in priority order, iteration after
//! iteration, merging newly discovered symbols into one relevance map until
//! no strategy produces a new id (convergence) or the iteration cap is hit.
//!
//! Two strategies ship with the engine:
//! - [`CrossStackStrategy`]: bridges frontend callers and backend endpoints
//!   through the `api_calls` table (priority 5, every iteration)
//! - [`DependencyTraversalStrategy`]: the direction- and depth-aware BFS
//!   over dependency edges (priority 10, first iteration)

pub mod context;
pub mod cross_stack;
pub mod direction;
pub mod engine;
pub mod expand;
pub mod policy;
pub mod state;
pub mod strategy;
pub mod traversal;

pub use context::{DiscoveryContext, EntryLayer};
pub use cross_stack::CrossStackStrategy;
pub use direction::DirectionResolver;
pub use engine::{DiscoveryEngine, EngineConfig};
pub use expand::ContainerExpander;
pub use policy::{DepthFilterPolicy, FileValidationPolicy};
pub use state::{QueueItem, TraversalQueue, TraversalState, MAX_QUEUE_SIZE, MAX_VISITED_NODES};
pub use strategy::{DiscoveryStrategy, CRITICAL_STRATEGY_PRIORITY};
pub use traversal::DependencyTraversalStrategy;

use crate::{RepoId, Result, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied knobs for one discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Maximum BFS depth
    pub max_depth: u32,
    /// Cap on the number of discovered symbols
    pub max_symbols: usize,
    /// Keep component symbols in the result
    pub include_components: bool,
    /// Keep route symbols in the result (manifest-renderer concern)
    pub include_routes: bool,
    /// Keep model symbols in the result
    pub include_models: bool,
    /// Keep test symbols in the result (manifest-renderer concern)
    pub include_tests: bool,
    /// Drop symbols scored below this
    pub min_relevance_score: f64,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_symbols: 500,
            include_components: true,
            include_routes: true,
            include_models: true,
            include_tests: false,
            min_relevance_score: 0.0,
        }
    }
}

/// One discovery invocation.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    /// Symbol to start from
    pub entry_point: SymbolId,
    /// Repository the entry point belongs to
    pub repo_id: RepoId,
    /// Feature being assembled
    pub feature_name: String,
    /// Discovery knobs
    pub options: DiscoveryOptions,
}

impl DiscoveryRequest {
    /// Request with default options
    pub fn new(entry_point: SymbolId, repo_id: RepoId, feature_name: impl Into<String>) -> Self {
        Self {
            entry_point,
            repo_id,
            feature_name: feature_name.into(),
            options: DiscoveryOptions::default(),
        }
    }
}

/// Result of a discovery run: the scored symbol map plus run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    /// `symbol id → relevance ∈ [0, 1]`; callers sort by score
    pub symbols: HashMap<SymbolId, f64>,
    /// Run statistics
    pub stats: DiscoveryStats,
}

/// Per-run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryStats {
    /// Iterations executed
    pub iterations: u32,
    /// Master map size after each iteration
    pub symbols_per_iteration: Vec<usize>,
    /// Aggregates per strategy name
    pub strategy_stats: HashMap<String, StrategyStats>,
    /// Wall-clock duration of the run
    pub total_time_ms: u128,
    /// Whether the run reached a fixed point before the iteration cap
    pub converged: bool,
    /// Non-critical strategy failures
    pub failed_strategies: Vec<FailedStrategy>,
}

/// Aggregate statistics for one strategy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrategyStats {
    /// Times the strategy ran
    pub executions: u32,
    /// New symbols it contributed across all runs
    pub symbols_discovered: usize,
    /// Mean wall-clock time per run
    pub avg_execution_time_ms: f64,
}

/// A recorded non-critical strategy failure.
#[derive(Debug, Clone, Serialize)]
pub struct FailedStrategy {
    pub strategy: String,
    pub iteration: u32,
    pub error: String,
}

/// Optional post-processing port applied to the final symbol map.
///
/// The core is purely structural; consumers wanting semantic filtering
/// (embedding similarity, token matching) plug it in here.
pub trait PostFilter {
    /// Filter or re-rank the discovered symbols
    fn filter(
        &self,
        symbols: HashMap<SymbolId, f64>,
        feature_name: &str,
    ) -> Result<HashMap<SymbolId, f64>>;
}
