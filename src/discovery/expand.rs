//! Container expansion
//!
//! Traversal runs on executors. Start sets arriving as classes or stores
//! are expanded to the methods and functions they contain; a container
//! with no callable children (a composable function acting as its own
//! container) stands in for itself.

use crate::classify::{classify, Role};
use crate::store::GraphStore;
use crate::symbol::{Symbol, SymbolType};
use crate::{Result, SymbolId};
use std::collections::HashMap;

/// Expands containers to the executors they contain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerExpander;

impl ContainerExpander {
    /// Expand `ids` to executor ids, given a pre-fetched symbol table.
    ///
    /// Executors and non-class entities pass through unchanged. Containers
    /// and class-shaped entities emit their callable `contains` children,
    /// or themselves when they have none. Ids missing from the table are
    /// dropped.
    pub fn expand_to_executors(
        &self,
        store: &dyn GraphStore,
        ids: &[SymbolId],
        symbols: &HashMap<SymbolId, Symbol>,
    ) -> Result<Vec<SymbolId>> {
        let mut executors = Vec::new();
        for id in ids {
            let Some(symbol) = symbols.get(id) else { continue };
            match classify(symbol) {
                Role::Executor => executors.push(*id),
                Role::Entity if symbol.symbol_type != SymbolType::Class => executors.push(*id),
                Role::Entity | Role::Container => {
                    let children =
                        store.children_of(*id, &[SymbolType::Method, SymbolType::Function])?;
                    if children.is_empty() {
                        executors.push(*id);
                    } else {
                        executors.extend(children);
                    }
                }
                Role::Data => executors.push(*id),
            }
        }
        Ok(executors)
    }
}
