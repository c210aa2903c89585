//! Graph storage - the read-only port the discovery core consumes
//!
//! The discovery engine never touches SQL; it reads the graph through the
//! narrow [`GraphStore`] trait. [`SqliteGraphStore`] backs the trait with
//! the database the external parser writes; [`crate::MemoryGraph`] backs it
//! with an in-memory graph for tests and embedders.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteGraphStore;

use crate::edge::{ApiCall, DependencyType};
use crate::symbol::{Symbol, SymbolType};
use crate::{RepoId, Result, SymbolId};
use std::collections::HashMap;

/// Read-only access to the symbol graph.
///
/// Implementations must be safe for concurrent reads; the core never
/// writes. Lookups for ids that resolve nowhere return empty collections
/// or `None`, not errors.
pub trait GraphStore {
    /// Look up a single symbol.
    fn get_symbol(&self, id: SymbolId) -> Result<Option<Symbol>>;

    /// Batched symbol lookup; missing ids are absent from the map.
    fn get_symbols_batch(&self, ids: &[SymbolId]) -> Result<HashMap<SymbolId, Symbol>>;

    /// Target ids of outgoing edges of the given types. Duplicates allowed.
    fn edges_from(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>>;

    /// Source ids of incoming edges of the given types. Duplicates allowed.
    fn edges_to(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>>;

    /// `api_calls` rows whose caller is one of `ids`.
    fn api_calls_from(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>>;

    /// `api_calls` rows whose endpoint is one of `ids`.
    fn api_calls_to(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>>;

    /// Ids of `contains` children of the given structural kinds.
    fn children_of(&self, id: SymbolId, symbol_types: &[SymbolType]) -> Result<Vec<SymbolId>>;

    /// Methods/functions inside `container` that reach `source` via a
    /// calls, references, or imports edge.
    fn find_methods_referencing(&self, container: SymbolId, source: SymbolId) -> Result<Vec<SymbolId>>;

    /// Framework tags recorded for a repository (for cross-stack layer
    /// detection).
    fn repository_frameworks(&self, repo_id: RepoId) -> Result<Vec<String>>;

    /// Structural `contains` parent of a symbol, when one exists.
    ///
    /// At most one structural parent is recorded per child; implementations
    /// return the first when the data is inconsistent.
    fn structural_parent(&self, id: SymbolId) -> Result<Option<Symbol>> {
        let parents = self.edges_to(id, &[DependencyType::Contains])?;
        match parents.first() {
            Some(pid) => self.get_symbol(*pid),
            None => Ok(None),
        }
    }
}
