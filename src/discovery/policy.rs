//! Depth and file-level filtering policies
//!
//! Pure predicates extracted from the traversal so the pollution-prevention
//! rules stay table-testable. Backward traversal is allowed deeper than
//! forward: the caller chain (model → service → controller → store) is the
//! signal, while deep forward targets are almost always shared
//! infrastructure.

use super::state::TraversalState;
use crate::classify::Direction;
use crate::symbol::{EntityType, Symbol};

/// Forward depth threshold for deep entities (models get one extra level).
fn deep_entity_forward_threshold(entity: EntityType) -> u32 {
    if entity == EntityType::Model { 3 } else { 2 }
}

/// Backward depth threshold shared by all deep-entity and method rules.
const BACKWARD_THRESHOLD: u32 = 4;

/// Forward depth threshold for methods.
const METHOD_FORWARD_THRESHOLD: u32 = 2;

/// Depth-based discovery filters, parameterized by the entry point's
/// entity type.
#[derive(Debug, Clone, Copy)]
pub struct DepthFilterPolicy {
    entry_entity: Option<EntityType>,
}

impl DepthFilterPolicy {
    /// Build a policy for a discovery run starting at the given entity type
    pub fn new(entry_entity: Option<EntityType>) -> Self {
        Self { entry_entity }
    }

    /// Whether a deep entity (model/controller/service/request) at this
    /// depth is past its threshold and must be skipped.
    pub fn should_filter_entity(
        &self,
        entity: Option<EntityType>,
        depth: u32,
        direction: Direction,
    ) -> bool {
        let Some(entity) = entity else { return false };
        if !entity.is_deep_entity() {
            return false;
        }
        let threshold = match direction {
            Direction::Backward => BACKWARD_THRESHOLD,
            Direction::Forward | Direction::Both => deep_entity_forward_threshold(entity),
        };
        depth >= threshold
    }

    /// Whether a method at this depth is past the method threshold.
    /// Callers additionally require the method's parent to be a deep entity
    /// before acting on this.
    pub fn should_filter_method(&self, depth: u32, direction: Direction) -> bool {
        let threshold = match direction {
            Direction::Backward => BACKWARD_THRESHOLD,
            Direction::Forward | Direction::Both => METHOD_FORWARD_THRESHOLD,
        };
        depth >= threshold
    }

    /// Whether a shared architectural boundary reached beyond the entry
    /// point is too deep to discover.
    pub fn should_filter_shared_boundary(
        &self,
        entity: EntityType,
        depth: u32,
        direction: Direction,
    ) -> bool {
        if depth == 0 || !entity.is_shared_boundary() {
            return false;
        }
        let threshold = match direction {
            Direction::Backward => BACKWARD_THRESHOLD,
            Direction::Forward | Direction::Both => deep_entity_forward_threshold(entity),
        };
        depth >= threshold
    }

    /// Whether a model container at this depth may still be queued for
    /// backward traversal. Deep model queuing is only open near the entry,
    /// or slightly deeper when the entry point itself is a model.
    pub fn allows_deep_model_queue(&self, depth: u32) -> bool {
        depth < 1 || (self.entry_entity == Some(EntityType::Model) && depth <= 2)
    }
}

/// File-level context filtering for symbols found at depth > 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileValidationPolicy;

impl FileValidationPolicy {
    /// Whether a symbol passes file-level validation at the given depth.
    ///
    /// Shallow targets always pass, as do file-less symbols and
    /// self-validating entities. Deeper symbols only pass when their file
    /// already holds a validated entity discovered earlier.
    pub fn should_validate_by_file(&self, symbol: &Symbol, depth: u32, state: &TraversalState) -> bool {
        if depth <= 1 {
            return true;
        }
        let Some(file_id) = symbol.file_id else {
            return true;
        };
        if symbol.entity_type.map(|e| e.is_validated_entity()).unwrap_or(false) {
            return true;
        }
        state.is_file_validated(file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Symbol, SymbolType};

    #[test]
    fn test_entity_filter_thresholds() {
        let policy = DepthFilterPolicy::new(None);
        let cases = [
            // (entity, depth, direction, filtered)
            (EntityType::Service, 1, Direction::Forward, false),
            (EntityType::Service, 2, Direction::Forward, true),
            (EntityType::Model, 2, Direction::Forward, false),
            (EntityType::Model, 3, Direction::Forward, true),
            (EntityType::Controller, 3, Direction::Backward, false),
            (EntityType::Controller, 4, Direction::Backward, true),
            (EntityType::Request, 2, Direction::Both, true),
        ];
        for (entity, depth, direction, expected) in cases {
            assert_eq!(
                policy.should_filter_entity(Some(entity), depth, direction),
                expected,
                "{:?} depth {} {:?}",
                entity,
                depth,
                direction
            );
        }
        // Non-deep entities never hit the deep-entity rule
        assert!(!policy.should_filter_entity(Some(EntityType::Component), 9, Direction::Forward));
        assert!(!policy.should_filter_entity(None, 9, Direction::Forward));
    }

    #[test]
    fn test_method_filter_thresholds() {
        let policy = DepthFilterPolicy::new(None);
        assert!(!policy.should_filter_method(1, Direction::Forward));
        assert!(policy.should_filter_method(2, Direction::Forward));
        assert!(!policy.should_filter_method(3, Direction::Backward));
        assert!(policy.should_filter_method(4, Direction::Backward));
    }

    #[test]
    fn test_shared_boundary_open_at_entry() {
        let policy = DepthFilterPolicy::new(None);
        assert!(!policy.should_filter_shared_boundary(EntityType::Service, 0, Direction::Forward));
        assert!(!policy.should_filter_shared_boundary(EntityType::Service, 1, Direction::Forward));
        assert!(policy.should_filter_shared_boundary(EntityType::Service, 2, Direction::Forward));
        assert!(!policy.should_filter_shared_boundary(EntityType::Model, 2, Direction::Forward));
        assert!(policy.should_filter_shared_boundary(EntityType::Model, 4, Direction::Backward));
    }

    #[test]
    fn test_deep_model_queue_gate() {
        let from_controller = DepthFilterPolicy::new(Some(EntityType::Controller));
        assert!(from_controller.allows_deep_model_queue(0));
        assert!(!from_controller.allows_deep_model_queue(1));

        let from_model = DepthFilterPolicy::new(Some(EntityType::Model));
        assert!(from_model.allows_deep_model_queue(2));
        assert!(!from_model.allows_deep_model_queue(3));
    }

    #[test]
    fn test_file_validation() {
        let policy = FileValidationPolicy;
        let mut state = TraversalState::new();

        let plain = Symbol::new(1, 1, "helper", SymbolType::Method).with_file(10);
        // Shallow always passes
        assert!(policy.should_validate_by_file(&plain, 1, &state));
        // Deep fails until the file is validated
        assert!(!policy.should_validate_by_file(&plain, 2, &state));
        state.add_validated_file(10);
        assert!(policy.should_validate_by_file(&plain, 2, &state));

        // File-less symbols pass
        let no_file = Symbol::new(2, 1, "ghost", SymbolType::Method);
        assert!(policy.should_validate_by_file(&no_file, 5, &state));

        // Self-validating entities pass at any depth; models do not
        let svc = Symbol::new(3, 1, "Svc", SymbolType::Class)
            .with_entity(EntityType::Service)
            .with_file(11);
        assert!(policy.should_validate_by_file(&svc, 4, &state));
        let model = Symbol::new(4, 1, "M", SymbolType::Class)
            .with_entity(EntityType::Model)
            .with_file(12);
        assert!(!policy.should_validate_by_file(&model, 4, &state));
    }
}
