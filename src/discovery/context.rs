//! Discovery context - the read-only view strategies receive
//!
//! Rebuilt before every strategy run so a lower-priority strategy sees the
//! symbols higher-priority strategies merged earlier in the same iteration.

use super::DiscoveryOptions;
use crate::symbol::Symbol;
use crate::{RepoId, SymbolId};
use serde::Serialize;
use std::collections::HashMap;

/// Which layer of the stack the entry point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryLayer {
    /// Models and backend services: discovery chases callers
    BackendLeaf,
    /// Everything else: discovery spreads both ways
    MiddleLayer,
}

/// Read-only view of one strategy invocation.
pub struct DiscoveryContext<'a> {
    /// Symbol discovery started from
    pub entry_point: SymbolId,
    /// The resolved entry symbol, when it exists
    pub entry_symbol: Option<&'a Symbol>,
    /// Repository under discovery
    pub repo_id: RepoId,
    /// Feature being assembled (for logging and stats)
    pub feature_name: &'a str,
    /// Stack layer of the entry point
    pub entry_layer: EntryLayer,
    /// Zero-based engine iteration
    pub iteration: u32,
    /// Master relevance map as merged so far
    pub symbol_relevance: &'a HashMap<SymbolId, f64>,
    /// Caller-supplied discovery options
    pub options: &'a DiscoveryOptions,
}

impl<'a> DiscoveryContext<'a> {
    /// Ids of every symbol discovered so far
    pub fn current_ids(&self) -> Vec<SymbolId> {
        self.symbol_relevance.keys().copied().collect()
    }

    /// Whether a symbol is already in the master map
    pub fn contains(&self, id: SymbolId) -> bool {
        self.symbol_relevance.contains_key(&id)
    }
}
