//! Edge types - typed relationships between symbols
//!
//! Rows in the `dependencies` table are directed `from_symbol → to_symbol`
//! edges of one of five kinds. Rows in the `api_calls` table bridge a
//! frontend caller symbol to the backend endpoint symbol its HTTP request
//! resolves to.

use crate::{Error, Result, SymbolId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of a directed dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Callable invokes another callable
    Calls,
    /// Frontend callable issues an HTTP request handled by the target
    ApiCall,
    /// Structural parent holds a child (class → method, file → class).
    /// At most one `contains` parent is recorded per child; Vue components
    /// additionally reference their inline functions via `calls`, which is
    /// treated as an auxiliary parent only when searching for parents.
    Contains,
    /// Module-level import of the target
    Imports,
    /// Any other usage of the target
    References,
}

impl DependencyType {
    /// Get the string representation of the dependency type
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Calls => "calls",
            DependencyType::ApiCall => "api_call",
            DependencyType::Contains => "contains",
            DependencyType::Imports => "imports",
            DependencyType::References => "references",
        }
    }

    /// Get all dependency types
    pub fn all() -> &'static [DependencyType] {
        &[
            DependencyType::Calls,
            DependencyType::ApiCall,
            DependencyType::Contains,
            DependencyType::Imports,
            DependencyType::References,
        ]
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "calls" | "call" => Ok(DependencyType::Calls),
            "api_call" => Ok(DependencyType::ApiCall),
            "contains" | "contain" => Ok(DependencyType::Contains),
            "imports" | "import" => Ok(DependencyType::Imports),
            "references" | "reference" | "ref" => Ok(DependencyType::References),
            _ => Err(Error::InvalidValue(format!("Unknown dependency type: {}", s))),
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An HTTP bridge between a frontend caller and a backend endpoint.
///
/// Either symbol side may be absent when the parser only resolved the HTTP
/// path on one end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    /// Frontend symbol issuing the request, when resolved
    pub caller_id: Option<SymbolId>,
    /// Backend endpoint symbol handling the request, when resolved
    pub endpoint_id: Option<SymbolId>,
    /// HTTP method, when known
    pub http_method: Option<String>,
    /// Request path, when known
    pub path: Option<String>,
}

impl ApiCall {
    /// Create a fully resolved bridge
    pub fn resolved(caller_id: SymbolId, endpoint_id: SymbolId) -> Self {
        Self {
            caller_id: Some(caller_id),
            endpoint_id: Some(endpoint_id),
            http_method: None,
            path: None,
        }
    }

    /// Set the HTTP method and path
    pub fn with_route(mut self, http_method: impl Into<String>, path: impl Into<String>) -> Self {
        self.http_method = Some(http_method.into());
        self.path = Some(path.into());
        self
    }

    /// Whether both symbol sides are resolved
    pub fn is_bridged(&self) -> bool {
        self.caller_id.is_some() && self.endpoint_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_roundtrip() {
        for kind in DependencyType::all() {
            let s = kind.as_str();
            let parsed: DependencyType = s.parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_dependency_type_aliases() {
        assert_eq!(DependencyType::from_str("call").unwrap(), DependencyType::Calls);
        assert_eq!(DependencyType::from_str("ref").unwrap(), DependencyType::References);
        assert!(DependencyType::from_str("extends").is_err());
    }

    #[test]
    fn test_api_call_bridge() {
        let call = ApiCall::resolved(10, 20).with_route("GET", "/api/users");
        assert!(call.is_bridged());

        let half = ApiCall {
            caller_id: Some(10),
            endpoint_id: None,
            http_method: Some("POST".into()),
            path: Some("/api/posts".into()),
        };
        assert!(!half.is_bridged());
    }
}
