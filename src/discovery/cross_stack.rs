//! Cross-stack strategy - frontend ↔ backend bridging
//!
//! The `api_calls` table links frontend callables to the backend endpoints
//! their HTTP requests resolve to. This strategy walks those bridges in
//! both directions, then lifts discovered frontend callers to the stores,
//! components and composables that own them. Vue components reference
//! their inline functions through `calls` rather than `contains`, so parent
//! lookups consult both edge kinds.
//!
//! Runs every iteration: other strategies keep surfacing new callers and
//! endpoints that unlock further bridges.

use super::context::DiscoveryContext;
use super::strategy::DiscoveryStrategy;
use crate::edge::DependencyType;
use crate::store::GraphStore;
use crate::symbol::{EntityType, SymbolType};
use crate::{Result, SymbolId};
use std::collections::HashMap;

/// Relevance for symbols reached directly over an `api_calls` bridge or as
/// the owning container of a bridged caller.
const BRIDGE_RELEVANCE: f64 = 0.9;

/// Relevance for components reached through the transitive inline-handler
/// lift.
const LIFT_RELEVANCE: f64 = 0.85;

/// Bridges frontend and backend symbol sets through `api_calls`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossStackStrategy;

impl CrossStackStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self
    }

    fn add(found: &mut HashMap<SymbolId, f64>, id: SymbolId, relevance: f64) {
        found.entry(id).or_insert(relevance);
    }

    /// Whether the entry point sits on the backend: a controller, service
    /// or model, or a callable contained in a controller or service.
    fn entry_is_backend(&self, store: &dyn GraphStore, ctx: &DiscoveryContext) -> Result<bool> {
        let Some(entry) = ctx.entry_symbol else {
            return Ok(false);
        };
        match entry.entity_type {
            Some(EntityType::Controller) | Some(EntityType::Service) | Some(EntityType::Model) => {
                return Ok(true)
            }
            _ => {}
        }
        if entry.symbol_type.is_callable() {
            if let Some(parent) = store.structural_parent(entry.id)? {
                return Ok(matches!(
                    parent.entity_type,
                    Some(EntityType::Controller) | Some(EntityType::Service)
                ));
            }
        }
        Ok(false)
    }

    /// Add the owning containers of a frontend caller: `contains` parents
    /// tagged store/component/composable, and `calls` parents tagged
    /// component (the Vue inline-function pattern).
    fn discover_parents(
        &self,
        store: &dyn GraphStore,
        caller: SymbolId,
        relevance: f64,
        found: &mut HashMap<SymbolId, f64>,
    ) -> Result<()> {
        for pid in store.edges_to(caller, &[DependencyType::Contains])? {
            if let Some(parent) = store.get_symbol(pid)? {
                if parent
                    .entity_type
                    .map(|e| e.is_frontend_container())
                    .unwrap_or(false)
                {
                    Self::add(found, pid, relevance);
                }
            }
        }
        for pid in store.edges_to(caller, &[DependencyType::Calls])? {
            if let Some(parent) = store.get_symbol(pid)? {
                if parent.is_entity(EntityType::Component) {
                    Self::add(found, pid, relevance);
                }
            }
        }
        Ok(())
    }
}

impl DiscoveryStrategy for CrossStackStrategy {
    fn name(&self) -> &'static str {
        "cross-stack"
    }

    fn priority(&self) -> u32 {
        5
    }

    fn should_run(&self, ctx: &DiscoveryContext) -> bool {
        !ctx.symbol_relevance.is_empty()
    }

    fn discover(
        &mut self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
    ) -> Result<HashMap<SymbolId, f64>> {
        let current = ctx.current_ids();
        if current.is_empty() {
            return Ok(HashMap::new());
        }

        let mut found = HashMap::new();
        let mut frontend_callers: Vec<SymbolId> = Vec::new();

        // Forward bridge: endpoints our callers hit
        for call in store.api_calls_from(&current)? {
            if let Some(endpoint) = call.endpoint_id {
                Self::add(&mut found, endpoint, BRIDGE_RELEVANCE);
            }
            if let Some(caller) = call.caller_id {
                frontend_callers.push(caller);
            }
        }

        // Backward bridge: callers hitting our endpoints
        for call in store.api_calls_to(&current)? {
            if let Some(caller) = call.caller_id {
                Self::add(&mut found, caller, BRIDGE_RELEVANCE);
                frontend_callers.push(caller);
            }
        }

        frontend_callers.sort_unstable();
        frontend_callers.dedup();

        tracing::debug!(
            feature = ctx.feature_name,
            callers = frontend_callers.len(),
            bridged = found.len(),
            "cross-stack bridges"
        );

        // Owning containers of the bridged callers
        for &caller in &frontend_callers {
            self.discover_parents(store, caller, BRIDGE_RELEVANCE, &mut found)?;
        }

        // Frontend expansion: the inner functions that invoked a caller,
        // and their owning containers
        for &caller in &frontend_callers {
            for inner in store.edges_to(caller, &[DependencyType::Calls])? {
                self.discover_parents(store, inner, LIFT_RELEVANCE, &mut found)?;
            }
        }

        // Backend entries additionally lift inline handlers two hops:
        // caller ←contains← intermediate(function|variable) ←calls← component
        if self.entry_is_backend(store, ctx)? {
            for &caller in &frontend_callers {
                for mid in store.edges_to(caller, &[DependencyType::Contains])? {
                    let Some(mid_symbol) = store.get_symbol(mid)? else {
                        continue;
                    };
                    if !matches!(
                        mid_symbol.symbol_type,
                        SymbolType::Function | SymbolType::Variable
                    ) {
                        continue;
                    }
                    for cid in store.edges_to(mid, &[DependencyType::Calls])? {
                        if let Some(component) = store.get_symbol(cid)? {
                            if component.is_entity(EntityType::Component) {
                                Self::add(&mut found, cid, LIFT_RELEVANCE);
                            }
                        }
                    }
                }
            }
        }

        // Composables link components through imports and references
        let found_ids: Vec<SymbolId> = found.keys().copied().collect();
        let found_symbols = store.get_symbols_batch(&found_ids)?;
        let composables: Vec<SymbolId> = found_symbols
            .values()
            .filter(|s| s.is_entity(EntityType::Composable))
            .map(|s| s.id)
            .collect();
        for composable in composables {
            for tid in store.edges_from(
                composable,
                &[DependencyType::References, DependencyType::Imports],
            )? {
                if let Some(target) = store.get_symbol(tid)? {
                    if target.is_entity(EntityType::Component) {
                        Self::add(&mut found, tid, LIFT_RELEVANCE);
                    }
                }
            }
            for fid in store.edges_to(
                composable,
                &[DependencyType::Calls, DependencyType::References],
            )? {
                if let Some(source) = store.get_symbol(fid)? {
                    if source.is_entity(EntityType::Component) {
                        Self::add(&mut found, fid, LIFT_RELEVANCE);
                    }
                }
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::context::EntryLayer;
    use crate::discovery::DiscoveryOptions;
    use crate::edge::ApiCall;
    use crate::graph::MemoryGraph;
    use crate::symbol::Symbol;

    fn run(
        graph: &MemoryGraph,
        entry: SymbolId,
        current: &HashMap<SymbolId, f64>,
    ) -> HashMap<SymbolId, f64> {
        let options = DiscoveryOptions::default();
        let entry_symbol = graph.get_symbol(entry).unwrap();
        let ctx = DiscoveryContext {
            entry_point: entry,
            entry_symbol: entry_symbol.as_ref(),
            repo_id: 1,
            feature_name: "test",
            entry_layer: EntryLayer::MiddleLayer,
            iteration: 0,
            symbol_relevance: current,
            options: &options,
        };
        CrossStackStrategy::new().discover(graph, &ctx).unwrap()
    }

    #[test]
    fn test_empty_current_symbols() {
        let graph = MemoryGraph::new();
        let found = run(&graph, 1, &HashMap::new());
        assert!(found.is_empty());
    }

    /// Vue store method entry: the endpoint and the owning store are both
    /// bridged at 0.9.
    #[test]
    fn test_forward_bridge_with_store_parent() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "useUserStore", SymbolType::Class).with_entity(EntityType::Store),
        );
        graph.add_symbol(
            Symbol::new(2, 1, "fetchUsers", SymbolType::Function).with_entity(EntityType::Store),
        );
        graph.add_symbol(
            Symbol::new(3, 2, "index", SymbolType::Method).with_entity(EntityType::Controller),
        );
        graph.add_edge(1, 2, DependencyType::Contains);
        graph.add_api_call(ApiCall::resolved(2, 3).with_route("GET", "/api/users"));

        let current = HashMap::from([(2, 1.0)]);
        let found = run(&graph, 2, &current);

        assert_eq!(found[&3], 0.9, "endpoint bridged");
        assert_eq!(found[&1], 0.9, "owning store lifted");
    }

    /// Backend endpoint entry: the caller and its component parent come
    /// back over the bridge.
    #[test]
    fn test_backward_bridge_symmetry() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "PostList", SymbolType::Class).with_entity(EntityType::Component),
        );
        graph.add_symbol(Symbol::new(2, 1, "loadPosts", SymbolType::Function));
        graph.add_symbol(
            Symbol::new(3, 2, "index", SymbolType::Method).with_entity(EntityType::Controller),
        );
        graph.add_edge(1, 2, DependencyType::Calls);
        graph.add_api_call(ApiCall::resolved(2, 3));

        // From the endpoint, the caller and its component arrive
        let found = run(&graph, 3, &HashMap::from([(3, 1.0)]));
        assert_eq!(found[&2], 0.9);
        assert_eq!(found[&1], 0.9, "component parent via calls edge");

        // And from the caller, the endpoint arrives (cross-stack symmetry)
        let found = run(&graph, 2, &HashMap::from([(2, 1.0)]));
        assert_eq!(found[&3], 0.9);
    }

    /// Backend entry with a Vue inline handler: the component is lifted
    /// through caller ←contains← handler ←calls← component.
    #[test]
    fn test_transitive_component_lift() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "PostListComponent", SymbolType::Class)
                .with_entity(EntityType::Component),
        );
        graph.add_symbol(Symbol::new(2, 1, "handleSubmit", SymbolType::Function));
        graph.add_symbol(Symbol::new(3, 1, "handleSubmit_inline", SymbolType::Function));
        graph.add_symbol(
            Symbol::new(4, 2, "PostController", SymbolType::Class).with_entity(EntityType::Controller),
        );
        graph.add_symbol(
            Symbol::new(5, 2, "store", SymbolType::Method).with_entity(EntityType::Controller),
        );
        graph.add_edge(4, 5, DependencyType::Contains);
        graph.add_edge(1, 2, DependencyType::Calls);
        graph.add_edge(2, 3, DependencyType::Contains);
        graph.add_api_call(ApiCall::resolved(3, 5).with_route("POST", "/api/posts"));

        let found = run(&graph, 5, &HashMap::from([(5, 1.0)]));

        assert_eq!(found[&3], 0.9, "inline caller bridged");
        assert_eq!(found[&1], LIFT_RELEVANCE, "component lifted two hops");
    }

    /// Composables pull in the components that use them.
    #[test]
    fn test_composable_component_references() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(
            Symbol::new(1, 1, "useSearch", SymbolType::Function).with_entity(EntityType::Composable),
        );
        graph.add_symbol(
            Symbol::new(2, 1, "SearchBox", SymbolType::Class).with_entity(EntityType::Component),
        );
        graph.add_symbol(
            Symbol::new(3, 2, "search", SymbolType::Method).with_entity(EntityType::Controller),
        );
        graph.add_symbol(Symbol::new(4, 1, "runSearch", SymbolType::Function));
        graph.add_edge(1, 4, DependencyType::Contains);
        graph.add_edge(2, 1, DependencyType::Calls);
        graph.add_api_call(ApiCall::resolved(4, 3));

        // Entry at the endpoint; the caller's composable parent arrives,
        // then the component using that composable
        let found = run(&graph, 3, &HashMap::from([(3, 1.0)]));
        assert_eq!(found[&4], 0.9);
        assert_eq!(found[&1], 0.9, "composable parent");
        assert_eq!(found[&2], LIFT_RELEVANCE, "component using the composable");
    }

    /// Rows with an unresolved endpoint side are skipped, not errors.
    #[test]
    fn test_unresolved_bridge_rows() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(Symbol::new(2, 1, "fetchUsers", SymbolType::Function));
        graph.add_api_call(ApiCall {
            caller_id: Some(2),
            endpoint_id: None,
            http_method: Some("GET".into()),
            path: Some("/api/unmapped".into()),
        });

        let found = run(&graph, 2, &HashMap::from([(2, 1.0)]));
        assert!(found.is_empty());
    }
}
