//! In-memory symbol graph
//!
//! A [`GraphStore`] backed by hash maps, built from programmatic
//! `add_symbol` / `add_edge` / `add_api_call` calls. The scenario tests run
//! on it, and embedders that already hold a parsed graph can query it
//! without a database.

use crate::edge::{ApiCall, DependencyType};
use crate::store::GraphStore;
use crate::symbol::{Symbol, SymbolType};
use crate::{RepoId, Result, SymbolId};
use std::collections::HashMap;

/// In-memory graph of symbols, dependency edges, and api_call bridges.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    /// All symbols indexed by id
    symbols: HashMap<SymbolId, Symbol>,
    /// Outgoing edges: from → [(to, type)]
    edges_from: HashMap<SymbolId, Vec<(SymbolId, DependencyType)>>,
    /// Incoming edges: to → [(from, type)]
    edges_to: HashMap<SymbolId, Vec<(SymbolId, DependencyType)>>,
    /// HTTP bridges
    api_calls: Vec<ApiCall>,
    /// Framework tags per repository
    frameworks: HashMap<RepoId, Vec<String>>,
}

impl MemoryGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol to the graph
    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.id, symbol);
    }

    /// Add a directed edge
    pub fn add_edge(&mut self, from: SymbolId, to: SymbolId, kind: DependencyType) {
        self.edges_from.entry(from).or_default().push((to, kind));
        self.edges_to.entry(to).or_default().push((from, kind));
    }

    /// Add an HTTP bridge row
    pub fn add_api_call(&mut self, call: ApiCall) {
        self.api_calls.push(call);
    }

    /// Record framework tags for a repository
    pub fn add_frameworks(&mut self, repo_id: RepoId, frameworks: &[&str]) {
        self.frameworks
            .entry(repo_id)
            .or_default()
            .extend(frameworks.iter().map(|s| s.to_string()));
    }

    /// Number of symbols in the graph
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

impl GraphStore for MemoryGraph {
    fn get_symbol(&self, id: SymbolId) -> Result<Option<Symbol>> {
        Ok(self.symbols.get(&id).cloned())
    }

    fn get_symbols_batch(&self, ids: &[SymbolId]) -> Result<HashMap<SymbolId, Symbol>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.symbols.get(id).map(|s| (*id, s.clone())))
            .collect())
    }

    fn edges_from(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>> {
        Ok(self
            .edges_from
            .get(&id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|(_, kind)| types.contains(kind))
                    .map(|(to, _)| *to)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn edges_to(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>> {
        Ok(self
            .edges_to
            .get(&id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|(_, kind)| types.contains(kind))
                    .map(|(from, _)| *from)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn api_calls_from(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>> {
        Ok(self
            .api_calls
            .iter()
            .filter(|c| c.caller_id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    fn api_calls_to(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>> {
        Ok(self
            .api_calls
            .iter()
            .filter(|c| c.endpoint_id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    fn children_of(&self, id: SymbolId, symbol_types: &[SymbolType]) -> Result<Vec<SymbolId>> {
        let children = self.edges_from(id, &[DependencyType::Contains])?;
        Ok(children
            .into_iter()
            .filter(|cid| {
                self.symbols
                    .get(cid)
                    .map(|s| symbol_types.contains(&s.symbol_type))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn find_methods_referencing(&self, container: SymbolId, source: SymbolId) -> Result<Vec<SymbolId>> {
        let members = self.children_of(container, &[SymbolType::Method, SymbolType::Function])?;
        let reach_types = [
            DependencyType::Calls,
            DependencyType::References,
            DependencyType::Imports,
        ];
        Ok(members
            .into_iter()
            .filter(|mid| {
                self.edges_from
                    .get(mid)
                    .map(|edges| {
                        edges
                            .iter()
                            .any(|(to, kind)| *to == source && reach_types.contains(kind))
                    })
                    .unwrap_or(false)
            })
            .collect())
    }

    fn repository_frameworks(&self, repo_id: RepoId) -> Result<Vec<String>> {
        Ok(self.frameworks.get(&repo_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::EntityType;

    fn callable(id: SymbolId, name: &str) -> Symbol {
        Symbol::new(id, 1, name, SymbolType::Method)
    }

    #[test]
    fn test_edges_filtered_by_type() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(callable(1, "a"));
        graph.add_symbol(callable(2, "b"));
        graph.add_edge(1, 2, DependencyType::Calls);
        graph.add_edge(1, 2, DependencyType::References);

        assert_eq!(graph.edges_from(1, &[DependencyType::Calls]).unwrap(), vec![2]);
        assert_eq!(
            graph.edges_from(1, &[DependencyType::Imports]).unwrap(),
            Vec::<SymbolId>::new()
        );
        assert_eq!(graph.edges_to(2, &[DependencyType::References]).unwrap(), vec![1]);
    }

    #[test]
    fn test_children_of_filters_kinds() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(Symbol::new(1, 1, "Svc", SymbolType::Class).with_entity(EntityType::Service));
        graph.add_symbol(callable(2, "run"));
        graph.add_symbol(Symbol::new(3, 1, "FLAG", SymbolType::Constant));
        graph.add_edge(1, 2, DependencyType::Contains);
        graph.add_edge(1, 3, DependencyType::Contains);

        assert_eq!(graph.children_of(1, &[SymbolType::Method]).unwrap(), vec![2]);
    }

    #[test]
    fn test_find_methods_referencing() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(Symbol::new(1, 1, "Svc", SymbolType::Class).with_entity(EntityType::Service));
        graph.add_symbol(callable(2, "uses"));
        graph.add_symbol(callable(3, "ignores"));
        graph.add_symbol(Symbol::new(4, 1, "Target", SymbolType::Class));
        graph.add_edge(1, 2, DependencyType::Contains);
        graph.add_edge(1, 3, DependencyType::Contains);
        graph.add_edge(2, 4, DependencyType::Calls);

        assert_eq!(graph.find_methods_referencing(1, 4).unwrap(), vec![2]);
    }

    #[test]
    fn test_structural_parent() {
        let mut graph = MemoryGraph::new();
        graph.add_symbol(Symbol::new(1, 1, "Ctl", SymbolType::Class).with_entity(EntityType::Controller));
        graph.add_symbol(callable(2, "index"));
        graph.add_edge(1, 2, DependencyType::Contains);

        let parent = graph.structural_parent(2).unwrap().unwrap();
        assert_eq!(parent.id, 1);
        assert!(graph.structural_parent(1).unwrap().is_none());
    }

    #[test]
    fn test_api_call_lookup() {
        let mut graph = MemoryGraph::new();
        graph.add_api_call(ApiCall::resolved(10, 20));
        graph.add_api_call(ApiCall {
            caller_id: Some(11),
            endpoint_id: None,
            http_method: None,
            path: Some("/api/orphan".into()),
        });

        assert_eq!(graph.api_calls_from(&[10]).unwrap().len(), 1);
        assert_eq!(graph.api_calls_from(&[11]).unwrap().len(), 1);
        assert_eq!(graph.api_calls_to(&[20]).unwrap().len(), 1);
        assert!(graph.api_calls_to(&[99]).unwrap().is_empty());
    }
}
