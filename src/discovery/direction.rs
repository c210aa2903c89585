//! Direction resolution
//!
//! Computes the traversal direction for start symbols and for transitively
//! discovered targets. These rules carry most of the pollution prevention:
//! only shallow symbols may look backward, and a transitive service method
//! never re-acquires backward from a forward walk (one shared base-service
//! call would otherwise pull in every service that uses the base).

use crate::classify::{natural_direction, Direction, Role};
use crate::store::GraphStore;
use crate::symbol::{EntityType, Symbol};
use crate::Result;

/// Resolves initial and transitive traversal directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionResolver;

impl DirectionResolver {
    /// Direction for a start symbol.
    ///
    /// The natural direction, except that an entry method sitting inside a
    /// service class is a bridge: its callers and its callees both belong
    /// to the feature.
    pub fn initial_direction(
        &self,
        store: &dyn GraphStore,
        symbol: &Symbol,
        role: Role,
    ) -> Result<Direction> {
        let base = natural_direction(symbol, role);
        if role == Role::Executor && symbol.symbol_type.is_callable() {
            if let Some(parent) = store.structural_parent(symbol.id)? {
                if parent.is_entity(EntityType::Service) {
                    return Ok(Direction::Both);
                }
            }
        }
        Ok(base)
    }

    /// Direction for a target discovered from a `(current_direction,
    /// current_depth)` step.
    pub fn next_direction(
        &self,
        store: &dyn GraphStore,
        current_direction: Direction,
        target: &Symbol,
        target_role: Role,
        current_depth: u32,
    ) -> Result<Direction> {
        match target_role {
            Role::Executor => {
                let parent_entity = store
                    .structural_parent(target.id)?
                    .and_then(|p| p.entity_type);
                Ok(match parent_entity {
                    // Controller and store methods keep a backward-looking
                    // direction only near the entry point.
                    Some(EntityType::Controller) | Some(EntityType::Store) => {
                        if current_depth <= 1 && current_direction.goes_backward() {
                            current_direction
                        } else {
                            Direction::Forward
                        }
                    }
                    // Service methods continue an existing caller chain but
                    // never re-acquire backward from a forward/both walk.
                    Some(EntityType::Service) => {
                        if current_direction == Direction::Backward {
                            Direction::Backward
                        } else {
                            Direction::Forward
                        }
                    }
                    _ => Direction::Forward,
                })
            }
            Role::Entity | Role::Container => {
                let natural = natural_direction(target, target_role);
                if current_depth == 0 {
                    Ok(natural)
                } else if natural.goes_backward() {
                    Ok(Direction::Forward)
                } else {
                    Ok(natural)
                }
            }
            // Data targets are filtered before direction resolution
            Role::Data => Ok(Direction::Forward),
        }
    }
}
