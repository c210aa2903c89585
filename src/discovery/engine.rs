//! Discovery engine - runs strategies to convergence
//!
//! Strategies execute in ascending priority order; the master relevance map
//! only ever grows, and an existing score is never overwritten (first write
//! wins). Iteration stops at a fixed point - no new ids for
//! `convergence_threshold` consecutive iterations - or at the iteration
//! cap. Failures in critical strategies abort the run; the rest are
//! recorded in the stats and skipped over.

use super::context::{DiscoveryContext, EntryLayer};
use super::cross_stack::CrossStackStrategy;
use super::strategy::DiscoveryStrategy;
use super::traversal::DependencyTraversalStrategy;
use super::{
    DiscoveryRequest, DiscoveryResult, DiscoveryStats, FailedStrategy, PostFilter, StrategyStats,
};
use crate::store::GraphStore;
use crate::symbol::{EntityType, SymbolType};
use crate::{Error, Result, SymbolId};
use std::collections::HashMap;
use std::time::Instant;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on strategy iterations
    pub max_iterations: u32,
    /// Consecutive unchanged iterations required to declare convergence
    pub convergence_threshold: u32,
    /// Emit per-strategy debug output
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            convergence_threshold: 1,
            debug: false,
        }
    }
}

/// Frontend frameworks recognized when deciding whether a service entry
/// point is a backend leaf or an API client.
const FRONTEND_FRAMEWORKS: &[&str] = &["vue", "nuxt", "react", "angular", "svelte"];

/// Runs registered discovery strategies over a graph store.
pub struct DiscoveryEngine {
    config: EngineConfig,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
    post_filter: Option<Box<dyn PostFilter>>,
}

impl DiscoveryEngine {
    /// Engine with the default configuration and strategies
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with the default strategies and a custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let mut engine = Self::empty(config);
        engine.register(Box::new(CrossStackStrategy::new()));
        engine.register(Box::new(DependencyTraversalStrategy::new()));
        engine
    }

    /// Engine with no strategies registered
    pub fn empty(config: EngineConfig) -> Self {
        Self {
            config,
            strategies: Vec::new(),
            post_filter: None,
        }
    }

    /// Register a strategy, keeping the list ordered by ascending priority.
    /// Registration order breaks priority ties.
    pub fn register(&mut self, strategy: Box<dyn DiscoveryStrategy>) {
        let priority = strategy.priority();
        let position = self
            .strategies
            .iter()
            .position(|s| s.priority() > priority)
            .unwrap_or(self.strategies.len());
        self.strategies.insert(position, strategy);
    }

    /// Attach an optional post filter applied to the final map
    pub fn with_post_filter(mut self, filter: Box<dyn PostFilter>) -> Self {
        self.post_filter = Some(filter);
        self
    }

    /// Classify which stack layer discovery starts from. Services only
    /// count as backend leaves in repositories without a frontend
    /// framework; a frontend "service" is an API client.
    fn classify_entry_layer(
        &self,
        store: &dyn GraphStore,
        request: &DiscoveryRequest,
        entry: Option<&crate::symbol::Symbol>,
    ) -> Result<EntryLayer> {
        let Some(entry) = entry else {
            return Ok(EntryLayer::MiddleLayer);
        };
        match entry.entity_type {
            Some(EntityType::Model) => Ok(EntryLayer::BackendLeaf),
            Some(EntityType::Service) => {
                let frameworks = store.repository_frameworks(request.repo_id)?;
                let frontend = frameworks
                    .iter()
                    .any(|f| FRONTEND_FRAMEWORKS.contains(&f.to_lowercase().as_str()));
                if frontend {
                    Ok(EntryLayer::MiddleLayer)
                } else {
                    Ok(EntryLayer::BackendLeaf)
                }
            }
            _ => Ok(EntryLayer::MiddleLayer),
        }
    }

    /// Run discovery from one entry point.
    pub fn discover(
        &mut self,
        store: &dyn GraphStore,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryResult> {
        let start = Instant::now();
        let entry_symbol = store.get_symbol(request.entry_point)?;
        let mut master: HashMap<SymbolId, f64> = HashMap::from([(request.entry_point, 1.0)]);

        // A controller-method entry seeds its controller class so the
        // manifest names the class even though it is never re-traversed
        if let Some(entry) = &entry_symbol {
            if entry.symbol_type == SymbolType::Method && entry.is_entity(EntityType::Controller) {
                if let Some(parent) = store.structural_parent(entry.id)? {
                    if parent.symbol_type == SymbolType::Class
                        && parent.is_entity(EntityType::Controller)
                        && parent.file_id == entry.file_id
                    {
                        master.insert(parent.id, 1.0);
                    }
                }
            }
        }

        let entry_layer = self.classify_entry_layer(store, request, entry_symbol.as_ref())?;
        tracing::info!(
            feature = request.feature_name,
            entry_point = request.entry_point,
            layer = ?entry_layer,
            "starting discovery"
        );

        for strategy in &mut self.strategies {
            strategy.reset();
        }

        let mut stats = DiscoveryStats::default();
        // name → (executions, symbols discovered, total wall-clock ms)
        let mut totals: HashMap<&'static str, (u32, usize, f64)> = HashMap::new();
        let mut unchanged_iterations = 0u32;
        let mut capped = false;

        for iteration in 0..self.config.max_iterations {
            let size_before = master.len();

            for index in 0..self.strategies.len() {
                let ctx = DiscoveryContext {
                    entry_point: request.entry_point,
                    entry_symbol: entry_symbol.as_ref(),
                    repo_id: request.repo_id,
                    feature_name: &request.feature_name,
                    entry_layer,
                    iteration,
                    symbol_relevance: &master,
                    options: &request.options,
                };
                let strategy = &mut self.strategies[index];
                if !strategy.should_run(&ctx) {
                    continue;
                }
                let name = strategy.name();
                let strategy_start = Instant::now();
                let outcome = strategy.discover(store, &ctx);
                let elapsed_ms = strategy_start.elapsed().as_secs_f64() * 1000.0;

                match outcome {
                    Ok(found) => {
                        let mut new_symbols = 0usize;
                        for (id, relevance) in found {
                            if !master.contains_key(&id) {
                                master.insert(id, relevance);
                                new_symbols += 1;
                            }
                        }
                        let entry = totals.entry(name).or_insert((0, 0, 0.0));
                        entry.0 += 1;
                        entry.1 += new_symbols;
                        entry.2 += elapsed_ms;
                        if self.config.debug {
                            tracing::debug!(
                                strategy = name,
                                iteration,
                                new_symbols,
                                elapsed_ms,
                                "strategy pass"
                            );
                        }
                    }
                    Err(err) => {
                        if self.strategies[index].is_critical() {
                            tracing::error!(strategy = name, error = %err, "critical strategy failed");
                            return Err(Error::CriticalStrategy {
                                strategy: name,
                                source: Box::new(err),
                            });
                        }
                        tracing::warn!(strategy = name, error = %err, "non-critical strategy failed");
                        stats.failed_strategies.push(FailedStrategy {
                            strategy: name.to_string(),
                            iteration,
                            error: err.to_string(),
                        });
                    }
                }

                if master.len() >= request.options.max_symbols {
                    tracing::warn!(
                        symbols = master.len(),
                        cap = request.options.max_symbols,
                        "symbol cap reached; stopping discovery"
                    );
                    capped = true;
                    break;
                }
            }

            stats.iterations = iteration + 1;
            stats.symbols_per_iteration.push(master.len());
            if capped {
                break;
            }

            if master.len() == size_before {
                unchanged_iterations += 1;
                if unchanged_iterations >= self.config.convergence_threshold {
                    stats.converged = true;
                    break;
                }
            } else {
                unchanged_iterations = 0;
            }
        }

        for (name, (executions, discovered, total_ms)) in totals {
            stats.strategy_stats.insert(
                name.to_string(),
                StrategyStats {
                    executions,
                    symbols_discovered: discovered,
                    avg_execution_time_ms: total_ms / executions as f64,
                },
            );
        }

        let symbols = self.finalize(store, request, master)?;
        stats.total_time_ms = start.elapsed().as_millis();
        tracing::info!(
            feature = request.feature_name,
            symbols = symbols.len(),
            iterations = stats.iterations,
            converged = stats.converged,
            "discovery finished"
        );

        Ok(DiscoveryResult { symbols, stats })
    }

    /// Post-processing: the optional filter port, the relevance floor, the
    /// entity include flags, and the symbol cap. The entry point always
    /// survives.
    fn finalize(
        &self,
        store: &dyn GraphStore,
        request: &DiscoveryRequest,
        mut symbols: HashMap<SymbolId, f64>,
    ) -> Result<HashMap<SymbolId, f64>> {
        let options = &request.options;
        let entry = request.entry_point;

        if let Some(filter) = &self.post_filter {
            symbols = filter.filter(symbols, &request.feature_name)?;
        }

        if options.min_relevance_score > 0.0 {
            symbols.retain(|id, relevance| *id == entry || *relevance >= options.min_relevance_score);
        }

        if !options.include_components || !options.include_models {
            let ids: Vec<SymbolId> = symbols.keys().copied().collect();
            let resolved = store.get_symbols_batch(&ids)?;
            symbols.retain(|id, _| {
                if *id == entry {
                    return true;
                }
                match resolved.get(id).and_then(|s| s.entity_type) {
                    Some(EntityType::Component) | Some(EntityType::UiComponent) => {
                        options.include_components
                    }
                    Some(EntityType::Model) => options.include_models,
                    _ => true,
                }
            });
        }

        if symbols.len() > options.max_symbols {
            let mut ranked: Vec<(SymbolId, f64)> = symbols.into_iter().collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            let entry_score = ranked.iter().find(|(id, _)| *id == entry).map(|(_, r)| *r);
            ranked.truncate(options.max_symbols);
            symbols = ranked.into_iter().collect();
            if let Some(score) = entry_score {
                symbols.entry(entry).or_insert(score);
            }
        }

        Ok(symbols)
    }
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveryOptions;
    use crate::edge::{ApiCall, DependencyType};
    use crate::graph::MemoryGraph;
    use crate::symbol::Symbol;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fixed-output strategy for engine behavior tests.
    struct FixedStrategy {
        name: &'static str,
        priority: u32,
        output: HashMap<SymbolId, f64>,
        fail: bool,
        runs: Rc<RefCell<Vec<&'static str>>>,
    }

    impl FixedStrategy {
        fn new(
            name: &'static str,
            priority: u32,
            output: HashMap<SymbolId, f64>,
            runs: Rc<RefCell<Vec<&'static str>>>,
        ) -> Self {
            Self {
                name,
                priority,
                output,
                fail: false,
                runs,
            }
        }

        fn failing(
            name: &'static str,
            priority: u32,
            runs: Rc<RefCell<Vec<&'static str>>>,
        ) -> Self {
            Self {
                name,
                priority,
                output: HashMap::new(),
                fail: true,
                runs,
            }
        }
    }

    impl DiscoveryStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }
        fn priority(&self) -> u32 {
            self.priority
        }
        fn should_run(&self, _ctx: &DiscoveryContext) -> bool {
            true
        }
        fn discover(
            &mut self,
            _store: &dyn GraphStore,
            _ctx: &DiscoveryContext,
        ) -> Result<HashMap<SymbolId, f64>> {
            self.runs.borrow_mut().push(self.name);
            if self.fail {
                return Err(Error::Store("backend unreachable".into()));
            }
            Ok(self.output.clone())
        }
    }

    fn seeded_graph() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(Symbol::new(1, 1, "entry", SymbolType::Method).with_file(10));
        graph
    }

    /// A graph holding only cross-stack edges converges in exactly two
    /// iterations: one that discovers, one unchanged.
    #[test]
    fn test_convergence_on_cross_stack_only_graph() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "fetchUsers", SymbolType::Function).with_entity(EntityType::Store),
        );
        graph.add_symbol(
            Symbol::new(2, 2, "index", SymbolType::Method).with_entity(EntityType::Controller),
        );
        graph.add_api_call(ApiCall::resolved(1, 2));

        let mut engine = DiscoveryEngine::new();
        let result = engine
            .discover(&graph, &DiscoveryRequest::new(1, 1, "users"))
            .unwrap();

        assert!(result.symbols.contains_key(&2), "endpoint bridged");
        assert_eq!(result.stats.iterations, 2);
        assert!(result.stats.converged);
        // Fixed point: the second iteration added nothing
        let sizes = &result.stats.symbols_per_iteration;
        assert_eq!(sizes[0], sizes[1]);
    }

    /// A store-method entry crosses the stack and keeps walking: the
    /// bridged endpoint feeds the dependency traversal within the same
    /// iteration, so the endpoint's request and models arrive too.
    #[test]
    fn test_cross_stack_feeds_traversal() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "useUserStore", SymbolType::Class)
                .with_entity(EntityType::Store)
                .with_file(1),
        );
        graph.add_symbol(
            Symbol::new(2, 1, "fetchUsers", SymbolType::Function)
                .with_entity(EntityType::Store)
                .with_file(1),
        );
        graph.add_symbol(
            Symbol::new(3, 2, "UsersController", SymbolType::Class)
                .with_entity(EntityType::Controller)
                .with_file(2),
        );
        graph.add_symbol(
            Symbol::new(4, 2, "index", SymbolType::Method)
                .with_entity(EntityType::Controller)
                .with_file(2),
        );
        graph.add_symbol(
            Symbol::new(5, 2, "IndexUsersRequest", SymbolType::Class)
                .with_entity(EntityType::Request)
                .with_file(3),
        );
        graph.add_symbol(
            Symbol::new(6, 2, "UserModel", SymbolType::Class)
                .with_entity(EntityType::Model)
                .with_file(4),
        );
        graph.add_edge(1, 2, DependencyType::Contains);
        graph.add_edge(3, 4, DependencyType::Contains);
        graph.add_edge(4, 5, DependencyType::References);
        graph.add_edge(4, 6, DependencyType::References);
        graph.add_api_call(ApiCall::resolved(2, 4).with_route("GET", "/api/users"));

        let mut engine = DiscoveryEngine::new();
        let result = engine
            .discover(&graph, &DiscoveryRequest::new(2, 1, "user-listing"))
            .unwrap();

        // First write wins: the bridge scored the endpoint before the
        // traversal re-saw it as a start symbol
        assert_eq!(result.symbols[&4], 0.9, "endpoint keeps the bridge score");
        assert_eq!(result.symbols[&1], 0.9, "owning store");
        for id in [3, 5, 6] {
            assert!(
                result.symbols[&id] >= 0.8,
                "symbol {} below 0.8: {}",
                id,
                result.symbols[&id]
            );
        }
        assert!(result.stats.converged);
    }

    /// Strategies run in ascending priority order regardless of
    /// registration order.
    #[test]
    fn test_priority_ordering() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 1,
            ..Default::default()
        });
        engine.register(Box::new(FixedStrategy::new(
            "late",
            50,
            HashMap::new(),
            runs.clone(),
        )));
        engine.register(Box::new(FixedStrategy::new(
            "early",
            20,
            HashMap::new(),
            runs.clone(),
        )));

        engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap();

        assert_eq!(*runs.borrow(), vec!["early", "late"]);
    }

    /// First write wins: a later strategy cannot overwrite an earlier
    /// strategy's relevance.
    #[test]
    fn test_first_write_wins_across_strategies() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 1,
            ..Default::default()
        });
        engine.register(Box::new(FixedStrategy::new(
            "first",
            20,
            HashMap::from([(7, 0.9)]),
            runs.clone(),
        )));
        engine.register(Box::new(FixedStrategy::new(
            "second",
            30,
            HashMap::from([(7, 0.1), (8, 0.4)]),
            runs.clone(),
        )));

        let result = engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap();

        assert_eq!(result.symbols[&7], 0.9);
        assert_eq!(result.symbols[&8], 0.4);
        assert_eq!(result.stats.strategy_stats["second"].symbols_discovered, 1);
    }

    /// A failing critical strategy aborts the run with the strategy name
    /// attached.
    #[test]
    fn test_critical_failure_aborts() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig::default());
        engine.register(Box::new(FixedStrategy::failing("broken", 10, runs)));

        let err = engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap_err();

        match err {
            Error::CriticalStrategy { strategy, .. } => assert_eq!(strategy, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// A failing non-critical strategy is recorded and the run continues.
    #[test]
    fn test_non_critical_failure_recorded() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 1,
            ..Default::default()
        });
        engine.register(Box::new(FixedStrategy::failing("flaky", 40, runs.clone())));
        engine.register(Box::new(FixedStrategy::new(
            "solid",
            50,
            HashMap::from([(9, 0.5)]),
            runs,
        )));

        let result = engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap();

        assert_eq!(result.symbols[&9], 0.5);
        assert_eq!(result.stats.failed_strategies.len(), 1);
        assert_eq!(result.stats.failed_strategies[0].strategy, "flaky");
        assert_eq!(result.stats.failed_strategies[0].iteration, 0);
    }

    /// A controller-method entry seeds its controller class at 1.0.
    #[test]
    fn test_controller_method_seeds_class() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "UsersController", SymbolType::Class)
                .with_entity(EntityType::Controller)
                .with_file(10),
        );
        graph.add_symbol(
            Symbol::new(2, 1, "index", SymbolType::Method)
                .with_entity(EntityType::Controller)
                .with_file(10),
        );
        graph.add_edge(1, 2, DependencyType::Contains);

        let mut engine = DiscoveryEngine::new();
        let result = engine
            .discover(&graph, &DiscoveryRequest::new(2, 1, "users"))
            .unwrap();

        assert_eq!(result.symbols[&1], 1.0);
        assert_eq!(result.symbols[&2], 1.0);
    }

    /// Relevance floor and model exclusion drop symbols, never the entry.
    #[test]
    fn test_option_post_filters() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "index", SymbolType::Method)
                .with_entity(EntityType::Controller)
                .with_file(10),
        );
        graph.add_symbol(
            Symbol::new(2, 1, "list", SymbolType::Method)
                .with_entity(EntityType::Service)
                .with_file(11),
        );
        graph.add_symbol(
            Symbol::new(3, 1, "UserModel", SymbolType::Class)
                .with_entity(EntityType::Model)
                .with_file(12),
        );
        graph.add_edge(1, 2, DependencyType::Calls);
        graph.add_edge(2, 3, DependencyType::Calls);

        let mut request = DiscoveryRequest::new(1, 1, "users");
        request.options = DiscoveryOptions {
            include_models: false,
            min_relevance_score: 0.5,
            ..Default::default()
        };

        let mut engine = DiscoveryEngine::new();
        let result = engine.discover(&graph, &request).unwrap();

        assert!(result.symbols.contains_key(&1));
        assert!(result.symbols.contains_key(&2));
        assert!(!result.symbols.contains_key(&3), "model excluded by option");
    }

    /// The symbol cap truncates by descending relevance, entry retained.
    #[test]
    fn test_max_symbols_truncation() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let output: HashMap<SymbolId, f64> =
            (2..20).map(|id| (id, 1.0 - id as f64 / 100.0)).collect();
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 1,
            ..Default::default()
        });
        engine.register(Box::new(FixedStrategy::new("bulk", 20, output, runs)));

        let mut request = DiscoveryRequest::new(1, 1, "f");
        request.options.max_symbols = 5;
        let result = engine.discover(&seeded_graph(), &request).unwrap();

        assert_eq!(result.symbols.len(), 5);
        assert!(result.symbols.contains_key(&1), "entry survives the cap");
        assert!(result.symbols.contains_key(&2), "highest-scored kept");
        assert!(!result.symbols.contains_key(&19));
    }

    /// The post-filter port runs over the final map.
    #[test]
    fn test_post_filter_port() {
        struct Floor(f64);
        impl PostFilter for Floor {
            fn filter(
                &self,
                mut symbols: HashMap<SymbolId, f64>,
                _feature_name: &str,
            ) -> Result<HashMap<SymbolId, f64>> {
                symbols.retain(|_, relevance| *relevance >= self.0);
                Ok(symbols)
            }
        }

        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 1,
            ..Default::default()
        });
        engine.register(Box::new(FixedStrategy::new(
            "bulk",
            20,
            HashMap::from([(2, 0.9), (3, 0.2)]),
            runs,
        )));
        let mut engine = engine.with_post_filter(Box::new(Floor(0.5)));

        let result = engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap();

        assert!(result.symbols.contains_key(&2));
        assert!(!result.symbols.contains_key(&3));
    }

    /// An idempotent strategy set reaches a fixed point: once an iteration
    /// adds nothing, the next adds nothing either.
    #[test]
    fn test_fixed_point_idempotence() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut engine = DiscoveryEngine::empty(EngineConfig {
            max_iterations: 5,
            convergence_threshold: 2,
            debug: false,
        });
        engine.register(Box::new(FixedStrategy::new(
            "fixed",
            20,
            HashMap::from([(2, 0.8)]),
            runs,
        )));

        let result = engine
            .discover(&seeded_graph(), &DiscoveryRequest::new(1, 1, "f"))
            .unwrap();

        assert!(result.stats.converged);
        // Iteration 1 discovers, 2 and 3 add nothing, threshold 2 stops it
        assert_eq!(result.stats.iterations, 3);
        let sizes = &result.stats.symbols_per_iteration;
        assert_eq!(sizes, &vec![2, 2, 2]);
    }
}
