//! Symbol classification - roles and natural traversal directions
//!
//! Every symbol reduces to one of four roles:
//! - `Executor`: runs code (method, function, composable)
//! - `Container`: holds executors (class, store file) without executing
//! - `Entity`: architecturally significant but not class-like (a Pinia
//!   store, a non-class controller definition)
//! - `Data`: inert definitions (interfaces, types, variables)
//!
//! The natural direction encodes which layer a symbol sits on: backend
//! leaves (models, service classes) are walked backward toward their
//! callers, frontend leaves (components) forward, bridges both ways.

use crate::symbol::{EntityType, Symbol, SymbolType};
use serde::{Deserialize, Serialize};

/// Traversal role of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Executor,
    Container,
    Entity,
    Data,
}

/// Direction of traversal at a node: outgoing edges (what does it use),
/// incoming edges (who uses it), or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Both,
}

impl Direction {
    /// Whether outgoing edges are followed
    pub fn goes_forward(&self) -> bool {
        matches!(self, Direction::Forward | Direction::Both)
    }

    /// Whether incoming edges are followed
    pub fn goes_backward(&self) -> bool {
        matches!(self, Direction::Backward | Direction::Both)
    }
}

/// Classify a symbol into its traversal role.
///
/// Stores classify as `Entity` even when they are classes: a store is an
/// execution boundary and must not be expanded the way a class is. A
/// composable that contains nested functions is still an `Executor`; the
/// expander surfaces its inner functions on demand.
pub fn classify(symbol: &Symbol) -> Role {
    if symbol.symbol_type.is_callable() || symbol.is_entity(EntityType::Composable) {
        return Role::Executor;
    }

    if let Some(entity) = symbol.entity_type {
        if entity.is_architectural() {
            if entity == EntityType::Store {
                return Role::Entity;
            }
            if symbol.symbol_type == SymbolType::Class {
                return Role::Container;
            }
            return Role::Entity;
        }
    }

    if symbol.symbol_type.is_definitional() {
        return Role::Data;
    }

    if matches!(symbol.symbol_type, SymbolType::Class | SymbolType::File) {
        return Role::Container;
    }

    Role::Data
}

/// Natural traversal direction of a symbol, given its role.
///
/// Controller methods and bare methods are forward-only so a controller
/// method discovered mid-traversal cannot explode backward into every
/// route. Models and service classes are backend leaves walked backward
/// toward the feature's callers; components are frontend leaves walked
/// forward into what they render and call.
pub fn natural_direction(symbol: &Symbol, role: Role) -> Direction {
    match (symbol.entity_type, symbol.symbol_type) {
        (Some(EntityType::Controller), SymbolType::Method) => Direction::Forward,
        (Some(EntityType::Method), _) => Direction::Forward,
        (Some(EntityType::Model), _) => Direction::Backward,
        (Some(EntityType::Service), SymbolType::Class) => Direction::Backward,
        (Some(EntityType::Component), st) if st != SymbolType::Method => Direction::Forward,
        _ => match role {
            Role::Executor | Role::Container | Role::Entity => Direction::Both,
            Role::Data => Direction::Forward,
        },
    }
}
