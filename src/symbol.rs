//! Symbol types - the unit of discovery
//!
//! A symbol is a row produced by the external parser: a class, method,
//! function, variable, or file, optionally tagged with a domain
//! `entity_type` (store, controller, service, model, ...). The discovery
//! engine never parses source; it only reads these rows.

use crate::{Error, FileId, RepoId, Result, SymbolId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Structural kind of a symbol, as recorded by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Class,
    Method,
    Function,
    Interface,
    Type,
    Variable,
    Property,
    Enum,
    Constant,
    File,
}

impl SymbolType {
    /// Get the string representation of the symbol type
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Class => "class",
            SymbolType::Method => "method",
            SymbolType::Function => "function",
            SymbolType::Interface => "interface",
            SymbolType::Type => "type",
            SymbolType::Variable => "variable",
            SymbolType::Property => "property",
            SymbolType::Enum => "enum",
            SymbolType::Constant => "constant",
            SymbolType::File => "file",
        }
    }

    /// Get all symbol types
    pub fn all() -> &'static [SymbolType] {
        &[
            SymbolType::Class,
            SymbolType::Method,
            SymbolType::Function,
            SymbolType::Interface,
            SymbolType::Type,
            SymbolType::Variable,
            SymbolType::Property,
            SymbolType::Enum,
            SymbolType::Constant,
            SymbolType::File,
        ]
    }

    /// Kinds that execute code.
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolType::Method | SymbolType::Function)
    }

    /// Inert definitional kinds (types, values) with no behavior of their own.
    pub fn is_definitional(&self) -> bool {
        matches!(
            self,
            SymbolType::Interface
                | SymbolType::Type
                | SymbolType::Variable
                | SymbolType::Property
                | SymbolType::Enum
                | SymbolType::Constant
        )
    }
}

impl FromStr for SymbolType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "class" => Ok(SymbolType::Class),
            "method" => Ok(SymbolType::Method),
            "function" => Ok(SymbolType::Function),
            "interface" => Ok(SymbolType::Interface),
            "type" => Ok(SymbolType::Type),
            "variable" => Ok(SymbolType::Variable),
            "property" => Ok(SymbolType::Property),
            "enum" => Ok(SymbolType::Enum),
            "constant" => Ok(SymbolType::Constant),
            "file" => Ok(SymbolType::File),
            _ => Err(Error::InvalidValue(format!("Unknown symbol type: {}", s))),
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain tag assigned by the parser's framework detection.
///
/// The tag set is open: rows carrying a tag this enum does not know parse to
/// `None` on [`Symbol::entity_type`] and are treated as unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Store,
    Component,
    Composable,
    Controller,
    Service,
    Model,
    Request,
    Repository,
    Job,
    Middleware,
    Notification,
    Command,
    Provider,
    Node,
    UiComponent,
    Resource,
    Manager,
    Handler,
    Coordinator,
    Engine,
    Pool,
    Factory,
    Builder,
    Validator,
    Adapter,
    Method,
    Function,
    Interface,
    Type,
    Variable,
    Property,
}

impl EntityType {
    /// Get the string representation of the entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Store => "store",
            EntityType::Component => "component",
            EntityType::Composable => "composable",
            EntityType::Controller => "controller",
            EntityType::Service => "service",
            EntityType::Model => "model",
            EntityType::Request => "request",
            EntityType::Repository => "repository",
            EntityType::Job => "job",
            EntityType::Middleware => "middleware",
            EntityType::Notification => "notification",
            EntityType::Command => "command",
            EntityType::Provider => "provider",
            EntityType::Node => "node",
            EntityType::UiComponent => "ui_component",
            EntityType::Resource => "resource",
            EntityType::Manager => "manager",
            EntityType::Handler => "handler",
            EntityType::Coordinator => "coordinator",
            EntityType::Engine => "engine",
            EntityType::Pool => "pool",
            EntityType::Factory => "factory",
            EntityType::Builder => "builder",
            EntityType::Validator => "validator",
            EntityType::Adapter => "adapter",
            EntityType::Method => "method",
            EntityType::Function => "function",
            EntityType::Interface => "interface",
            EntityType::Type => "type",
            EntityType::Variable => "variable",
            EntityType::Property => "property",
        }
    }

    /// Parse a wire tag, returning `None` for tags outside the known set.
    pub fn parse_tag(s: &str) -> Option<EntityType> {
        match s.to_lowercase().as_str() {
            "store" => Some(EntityType::Store),
            "component" => Some(EntityType::Component),
            "composable" => Some(EntityType::Composable),
            "controller" => Some(EntityType::Controller),
            "service" => Some(EntityType::Service),
            "model" => Some(EntityType::Model),
            "request" => Some(EntityType::Request),
            "repository" => Some(EntityType::Repository),
            "job" => Some(EntityType::Job),
            "middleware" => Some(EntityType::Middleware),
            "notification" => Some(EntityType::Notification),
            "command" => Some(EntityType::Command),
            "provider" => Some(EntityType::Provider),
            "node" => Some(EntityType::Node),
            "ui_component" => Some(EntityType::UiComponent),
            "resource" => Some(EntityType::Resource),
            "manager" => Some(EntityType::Manager),
            "handler" => Some(EntityType::Handler),
            "coordinator" => Some(EntityType::Coordinator),
            "engine" => Some(EntityType::Engine),
            "pool" => Some(EntityType::Pool),
            "factory" => Some(EntityType::Factory),
            "builder" => Some(EntityType::Builder),
            "validator" => Some(EntityType::Validator),
            "adapter" => Some(EntityType::Adapter),
            "method" => Some(EntityType::Method),
            "function" => Some(EntityType::Function),
            "interface" => Some(EntityType::Interface),
            "type" => Some(EntityType::Type),
            "variable" => Some(EntityType::Variable),
            "property" => Some(EntityType::Property),
            _ => None,
        }
    }

    /// Architecturally significant tags: domain roles, as opposed to tags
    /// that merely mirror a structural symbol type.
    pub fn is_architectural(&self) -> bool {
        !matches!(
            self,
            EntityType::Method
                | EntityType::Function
                | EntityType::Interface
                | EntityType::Type
                | EntityType::Variable
                | EntityType::Property
        )
    }

    /// Entity types reachable from many features; discovery through them
    /// is depth-limited to avoid pollution.
    pub fn is_shared_boundary(&self) -> bool {
        matches!(
            self,
            EntityType::Store
                | EntityType::Service
                | EntityType::Controller
                | EntityType::Repository
                | EntityType::Request
                | EntityType::Model
        )
    }

    /// Entity types that form hard architectural layer boundaries.
    pub fn is_architectural_boundary(&self) -> bool {
        matches!(
            self,
            EntityType::Store
                | EntityType::Service
                | EntityType::Controller
                | EntityType::Repository
        )
    }

    /// Entity types whose transitive chains run deep and saturate fast.
    pub fn is_deep_entity(&self) -> bool {
        matches!(
            self,
            EntityType::Model | EntityType::Controller | EntityType::Service | EntityType::Request
        )
    }

    /// Entity types whose containing file is self-validating for file-level
    /// context filtering. Models are deliberately excluded: validating a
    /// model file would admit every relationship method in it.
    pub fn is_validated_entity(&self) -> bool {
        matches!(
            self,
            EntityType::Store
                | EntityType::Service
                | EntityType::Controller
                | EntityType::Component
                | EntityType::Request
                | EntityType::Composable
        )
    }

    /// Frontend container tags that own callable members.
    pub fn is_frontend_container(&self) -> bool {
        matches!(
            self,
            EntityType::Store | EntityType::Component | EntityType::Composable
        )
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityType::parse_tag(s).ok_or_else(|| Error::InvalidValue(format!("Unknown entity type: {}", s)))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A symbol in the code graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable row identity
    pub id: SymbolId,
    /// Repository the symbol was parsed from
    pub repo_id: RepoId,
    /// Symbol name (just the identifier, not fully qualified)
    pub name: String,
    /// Structural kind
    pub symbol_type: SymbolType,
    /// Domain tag, if the parser classified one
    pub entity_type: Option<EntityType>,
    /// Source file containing the symbol, when known
    pub file_id: Option<FileId>,
}

impl Symbol {
    /// Create a new symbol with minimal required fields
    pub fn new(id: SymbolId, repo_id: RepoId, name: impl Into<String>, symbol_type: SymbolType) -> Self {
        Self {
            id,
            repo_id,
            name: name.into(),
            symbol_type,
            entity_type: None,
            file_id: None,
        }
    }

    /// Set the entity type tag
    pub fn with_entity(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    /// Set the containing file
    pub fn with_file(mut self, file_id: FileId) -> Self {
        self.file_id = Some(file_id);
        self
    }

    /// Whether the domain tag matches a specific entity type.
    pub fn is_entity(&self, entity: EntityType) -> bool {
        self.entity_type == Some(entity)
    }

    /// Get a short description for display
    pub fn short_description(&self) -> String {
        match self.entity_type {
            Some(e) => format!("{} {} ({})", self.symbol_type, self.name, e),
            None => format!("{} {}", self.symbol_type, self.name),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
