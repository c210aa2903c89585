//! Dependency traversal strategy - the direction- and depth-aware BFS
//!
//! Walks typed dependency edges out of (and into) the entry point's
//! executors, scoring targets by linear depth decay. The walk is kept from
//! collapsing into whole-codebase discovery by four cooperating rule sets:
//! depth filters on shared entities and methods, file-level context
//! validation, per-target direction resolution, and the container handler
//! that only follows a container's methods when they actually reference the
//! symbol the walk arrived from.

use super::context::DiscoveryContext;
use super::direction::DirectionResolver;
use super::expand::ContainerExpander;
use super::policy::{DepthFilterPolicy, FileValidationPolicy};
use super::state::{QueueItem, TraversalQueue, TraversalState, MAX_VISITED_NODES};
use super::strategy::DiscoveryStrategy;
use crate::classify::{classify, natural_direction, Direction, Role};
use crate::edge::DependencyType;
use crate::store::GraphStore;
use crate::symbol::{EntityType, Symbol, SymbolType};
use crate::{Result, SymbolId};
use std::collections::{HashMap, HashSet};

/// Relevance of a target discovered from an item at `depth`.
fn decayed_relevance(depth: u32, max_depth: u32) -> f64 {
    1.0 - (depth as f64 + 1.0) / (max_depth as f64 + 1.0)
}

/// Relevance of an owning class surfaced next to a target at `depth`.
fn parent_relevance(depth: u32, max_depth: u32) -> f64 {
    (1.0 - (depth as f64 + 2.0) / (max_depth as f64 + 1.0)).max(0.0)
}

/// BFS over dependency edges from the entry point's executors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyTraversalStrategy {
    resolver: DirectionResolver,
    expander: ContainerExpander,
    file_policy: FileValidationPolicy,
}

impl DependencyTraversalStrategy {
    /// Create the strategy
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_file(state: &mut TraversalState, symbol: &Symbol) {
        if let Some(file_id) = symbol.file_id {
            state.add_validated_file(file_id);
        }
    }

    /// Seed the state and queue from the current symbol set.
    ///
    /// Executors and expandable containers enter the queue at depth 0 with
    /// their initial direction. Containers that already have a seeded
    /// member are recorded without expansion so an entry controller class
    /// does not drag its sibling endpoints in. Backend-leaf containers
    /// (natural BACKWARD) are enqueued to chase their callers; a model
    /// entry additionally seeds its relationship methods forward as
    /// visited-only traversal steps.
    fn initialize(
        &self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
        state: &mut TraversalState,
        queue: &mut TraversalQueue,
    ) -> Result<()> {
        let current_ids = ctx.current_ids();
        let symbols = store.get_symbols_batch(&current_ids)?;

        let mut to_expand: Vec<SymbolId> = Vec::new();
        for id in &current_ids {
            let Some(symbol) = symbols.get(id) else { continue };
            let role = classify(symbol);
            let class_like = role == Role::Container
                || (role == Role::Entity && symbol.symbol_type == SymbolType::Class);
            if !class_like {
                to_expand.push(*id);
                continue;
            }

            if natural_direction(symbol, role) == Direction::Backward {
                state.add_discovered(*id, 1.0);
                Self::validate_file(state, symbol);
                queue.enqueue(*id, 0, Direction::Backward);
                if symbol.is_entity(EntityType::Model) {
                    // Relationship definitions are walked forward for the
                    // related models but stay out of the result themselves
                    for mid in
                        store.children_of(*id, &[SymbolType::Method, SymbolType::Function])?
                    {
                        if !state.is_visited(mid) {
                            state.mark_visited(mid);
                            queue.enqueue(mid, 1, Direction::Forward);
                        }
                    }
                }
                continue;
            }

            let children = store.children_of(*id, &[SymbolType::Method, SymbolType::Function])?;
            if children.iter().any(|c| ctx.contains(*c)) {
                state.add_discovered(*id, 1.0);
                Self::validate_file(state, symbol);
                continue;
            }
            to_expand.push(*id);
        }

        let executors = self.expander.expand_to_executors(store, &to_expand, &symbols)?;
        let executor_symbols = store.get_symbols_batch(&executors)?;
        for id in &executors {
            let Some(symbol) = executor_symbols.get(id) else { continue };
            if state.is_visited(*id) {
                continue;
            }
            let role = classify(symbol);
            let direction = self.resolver.initial_direction(store, symbol, role)?;
            state.add_discovered(*id, 1.0);
            Self::validate_file(state, symbol);
            queue.enqueue(*id, 0, direction);

            if role != Role::Executor {
                continue;
            }
            // Start executors carry their owning class into the result;
            // backend-leaf parents also join the walk
            if let Some(parent) = store.structural_parent(*id)? {
                if state.add_discovered(parent.id, 1.0) {
                    Self::validate_file(state, &parent);
                    let parent_role = classify(&parent);
                    if parent_role == Role::Container
                        && natural_direction(&parent, parent_role) == Direction::Backward
                    {
                        queue.enqueue(parent.id, 0, Direction::Backward);
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the backward half of this step runs. BACKWARD always does;
    /// BOTH only for models and composables, or while shallow.
    fn walks_backward(&self, symbol: &Symbol, item: &QueueItem) -> bool {
        match item.direction {
            Direction::Backward => true,
            Direction::Forward => false,
            Direction::Both => {
                matches!(
                    symbol.entity_type,
                    Some(EntityType::Model) | Some(EntityType::Composable)
                ) || item.depth < 2
            }
        }
    }

    /// Collect this step's deduplicated target ids.
    fn fetch_targets(
        &self,
        store: &dyn GraphStore,
        symbol: &Symbol,
        role: Role,
        item: &QueueItem,
    ) -> Result<Vec<SymbolId>> {
        let mut targets = Vec::new();

        if item.direction.goes_forward() {
            let types: Vec<DependencyType> = match role {
                Role::Executor => {
                    let mut t = vec![
                        DependencyType::Calls,
                        DependencyType::ApiCall,
                        DependencyType::Contains,
                    ];
                    if item.depth <= 3 && symbol.symbol_type == SymbolType::Method {
                        t.push(DependencyType::Imports);
                        t.push(DependencyType::References);
                    }
                    t
                }
                Role::Entity => {
                    let mut t = vec![DependencyType::Calls, DependencyType::ApiCall];
                    if !symbol.is_entity(EntityType::Component) && item.depth <= 2 {
                        t.push(DependencyType::References);
                    }
                    t
                }
                Role::Container => {
                    let mut t = vec![DependencyType::Contains];
                    if matches!(
                        symbol.entity_type,
                        Some(EntityType::Service)
                            | Some(EntityType::Controller)
                            | Some(EntityType::Store)
                    ) {
                        t.push(DependencyType::Imports);
                        t.push(DependencyType::References);
                    }
                    t
                }
                Role::Data => Vec::new(),
            };
            if !types.is_empty() {
                targets.extend(store.edges_from(item.id, &types)?);
            }
        }

        if self.walks_backward(symbol, item) {
            let mut types = vec![
                DependencyType::Calls,
                DependencyType::ApiCall,
                DependencyType::Contains,
            ];
            let references_backward = matches!(
                symbol.entity_type,
                Some(EntityType::Model) | Some(EntityType::Composable)
            ) || (role == Role::Executor
                && symbol.symbol_type == SymbolType::Function);
            if references_backward {
                types.push(DependencyType::References);
            }
            targets.extend(store.edges_to(item.id, &types)?);
        }

        let mut seen = HashSet::new();
        targets.retain(|id| seen.insert(*id));
        Ok(targets)
    }

    /// Process one executor/entity target: depth filters, file validation,
    /// discovery, parent surfacing, requeue.
    #[allow(clippy::too_many_arguments)]
    fn process_target(
        &self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
        policy: &DepthFilterPolicy,
        state: &mut TraversalState,
        queue: &mut TraversalQueue,
        item: &QueueItem,
        target: &Symbol,
        target_role: Role,
    ) -> Result<()> {
        if policy.should_filter_entity(target.entity_type, item.depth, item.direction) {
            return Ok(());
        }

        if target.symbol_type == SymbolType::Method
            && policy.should_filter_method(item.depth, item.direction)
        {
            let parent_entity = store
                .structural_parent(target.id)?
                .and_then(|p| p.entity_type);
            if parent_entity.map(|e| e.is_deep_entity()).unwrap_or(false) {
                return Ok(());
            }
        }

        // Architectural pre-validation: a method in an unvalidated file is
        // accepted when its owning class is a hard boundary, whose file
        // then opens up for its siblings
        let mut prevalidated = false;
        if target.symbol_type == SymbolType::Method && item.depth >= 1 {
            if let Some(file_id) = target.file_id {
                if !state.is_file_validated(file_id) {
                    let parent = store.structural_parent(target.id)?;
                    let is_boundary = parent
                        .as_ref()
                        .and_then(|p| p.entity_type)
                        .map(|e| e.is_architectural_boundary())
                        .unwrap_or(false);
                    if is_boundary {
                        if let Some(parent_file) = parent.and_then(|p| p.file_id) {
                            state.add_validated_file(parent_file);
                        }
                        prevalidated = true;
                    } else if item.depth > 1 {
                        return Ok(());
                    }
                }
            }
        }

        if !prevalidated && !self.file_policy.should_validate_by_file(target, item.depth, state) {
            return Ok(());
        }

        let relevance = decayed_relevance(item.depth, ctx.options.max_depth);
        state.add_discovered(target.id, relevance);

        if target
            .entity_type
            .map(|e| e.is_validated_entity())
            .unwrap_or(false)
        {
            Self::validate_file(state, target);
        }

        // Surface the owning class without re-traversing its siblings
        if target_role == Role::Executor && item.depth < ctx.options.max_depth {
            if let Some(parent) = store.structural_parent(target.id)? {
                if matches!(
                    parent.entity_type,
                    Some(EntityType::Controller)
                        | Some(EntityType::Store)
                        | Some(EntityType::Service)
                        | Some(EntityType::Component)
                ) && !state.is_discovered(parent.id)
                {
                    state.add_discovered(parent.id, parent_relevance(item.depth, ctx.options.max_depth));
                    Self::validate_file(state, &parent);
                }
            }
        }

        let next = self.resolver.next_direction(
            store,
            item.direction,
            target,
            target_role,
            item.depth,
        )?;
        queue.enqueue(target.id, item.depth + 1, next);
        Ok(())
    }

    /// Container targets get their own handling by depth and direction.
    #[allow(clippy::too_many_arguments)]
    fn handle_container(
        &self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
        policy: &DepthFilterPolicy,
        state: &mut TraversalState,
        queue: &mut TraversalQueue,
        item: &QueueItem,
        target: &Symbol,
    ) -> Result<()> {
        let depth = item.depth;
        let max_depth = ctx.options.max_depth;
        let relevance = decayed_relevance(depth, max_depth);

        // Entry-point BOTH with an architectural entity: a forward-style
        // discovery with the per-entity follow-up queueing
        if depth == 0
            && item.direction == Direction::Both
            && target
                .entity_type
                .map(|e| e.is_shared_boundary() || e == EntityType::Component)
                .unwrap_or(false)
        {
            self.discover_boundary(policy, state, queue, target, depth, relevance);
            return Ok(());
        }

        // Backward arm: only the container's methods that reference the
        // source symbol continue the walk
        if item.direction.goes_backward() {
            if let Some(entity) = target.entity_type {
                if policy.should_filter_shared_boundary(entity, depth, item.direction) {
                    return Ok(());
                }
            }
            let methods = store.find_methods_referencing(target.id, item.id)?;
            if methods.is_empty() {
                state.mark_visited(target.id);
                return Ok(());
            }
            state.add_discovered(target.id, relevance);
            if !target.is_entity(EntityType::Model) {
                Self::validate_file(state, target);
            }
            let method_direction = match target.entity_type {
                Some(EntityType::Model) => Direction::Forward,
                _ if depth == 0 => Direction::Both,
                _ => Direction::Forward,
            };
            for mid in methods {
                if state.is_visited(mid) {
                    continue;
                }
                state.add_discovered(mid, relevance);
                queue.enqueue(mid, depth + 1, method_direction);
            }
            return Ok(());
        }

        // Shared architectural boundary reached forward beyond the entry
        if depth > 0
            && target
                .entity_type
                .map(|e| e.is_shared_boundary())
                .unwrap_or(false)
        {
            let entity = target.entity_type.unwrap();
            if policy.should_filter_shared_boundary(entity, depth, item.direction) {
                return Ok(());
            }
            self.discover_boundary(policy, state, queue, target, depth, relevance);
            return Ok(());
        }

        // Plain forward container beyond the entry point: record, do not
        // expand
        state.add_discovered(target.id, relevance);
        Ok(())
    }

    /// Discover a boundary container and queue its per-entity follow-up:
    /// requests are leaves, models may continue backward while the gate is
    /// open, the remaining boundaries continue forward to their imports.
    fn discover_boundary(
        &self,
        policy: &DepthFilterPolicy,
        state: &mut TraversalState,
        queue: &mut TraversalQueue,
        target: &Symbol,
        depth: u32,
        relevance: f64,
    ) {
        state.add_discovered(target.id, relevance);
        if !target.is_entity(EntityType::Model) {
            Self::validate_file(state, target);
        }
        match target.entity_type {
            Some(EntityType::Request) => {}
            Some(EntityType::Model) => {
                if policy.allows_deep_model_queue(depth) {
                    queue.enqueue(target.id, depth + 1, Direction::Backward);
                }
            }
            _ => queue.enqueue(target.id, depth + 1, Direction::Forward),
        }
    }

    /// One dequeued step: fetch edges, process each unvisited target.
    fn process_item(
        &self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
        policy: &DepthFilterPolicy,
        state: &mut TraversalState,
        queue: &mut TraversalQueue,
        item: QueueItem,
    ) -> Result<()> {
        let Some(symbol) = store.get_symbol(item.id)? else {
            return Ok(());
        };
        let role = classify(&symbol);
        let targets = self.fetch_targets(store, &symbol, role, &item)?;
        if targets.is_empty() {
            return Ok(());
        }
        let target_symbols = store.get_symbols_batch(&targets)?;

        for tid in targets {
            if state.is_visited(tid) {
                continue;
            }
            let Some(target) = target_symbols.get(&tid) else {
                continue;
            };
            match classify(target) {
                Role::Data => continue,
                Role::Container => {
                    self.handle_container(store, ctx, policy, state, queue, &item, target)?;
                }
                target_role => {
                    self.process_target(
                        store, ctx, policy, state, queue, &item, target, target_role,
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl DiscoveryStrategy for DependencyTraversalStrategy {
    fn name(&self) -> &'static str {
        "dependency-traversal"
    }

    fn priority(&self) -> u32 {
        10
    }

    /// Component entry points are discovered through the cross-stack
    /// strategy only; re-runs add nothing the first pass missed.
    fn should_run(&self, ctx: &DiscoveryContext) -> bool {
        if ctx.iteration != 0 {
            return false;
        }
        ctx.entry_symbol
            .map(|s| !s.is_entity(EntityType::Component))
            .unwrap_or(false)
    }

    fn discover(
        &mut self,
        store: &dyn GraphStore,
        ctx: &DiscoveryContext,
    ) -> Result<HashMap<SymbolId, f64>> {
        let Some(entry) = ctx.entry_symbol else {
            return Ok(HashMap::new());
        };
        let policy = DepthFilterPolicy::new(entry.entity_type);
        let mut state = TraversalState::new();
        let mut queue = TraversalQueue::new();

        self.initialize(store, ctx, &mut state, &mut queue)?;

        while let Some(item) = queue.dequeue() {
            if state.has_exceeded(MAX_VISITED_NODES) {
                tracing::warn!(
                    feature = ctx.feature_name,
                    visited = state.visited_count(),
                    "traversal exceeded visited-node limit; returning partial result"
                );
                break;
            }
            if state.size() >= ctx.options.max_symbols {
                tracing::warn!(
                    feature = ctx.feature_name,
                    discovered = state.size(),
                    "traversal reached the symbol cap; returning partial result"
                );
                break;
            }
            if item.depth >= ctx.options.max_depth {
                continue;
            }
            self.process_item(store, ctx, &policy, &mut state, &mut queue, item)?;
        }

        Ok(state.into_discovered())
    }
}
