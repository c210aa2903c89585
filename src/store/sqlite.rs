//! SQLite storage implementation

use super::schema;
use super::GraphStore;
use crate::edge::{ApiCall, DependencyType};
use crate::symbol::{EntityType, Symbol, SymbolType};
use crate::{Error, RepoId, Result, SymbolId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

const SYMBOL_COLUMNS: &str = "id, repo_id, name, symbol_type, entity_type, file_id";

/// SQLite-backed graph store.
///
/// The external parser writes through the `insert_*` operations; the
/// discovery core only reads through the [`GraphStore`] trait.
pub struct SqliteGraphStore {
    conn: Connection,
}

impl SqliteGraphStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Write operations (parser-facing; the core never calls these) ==========

    /// Insert a repository, returning its id
    pub fn insert_repository(&self, name: &str) -> Result<RepoId> {
        self.conn.execute(
            "INSERT OR IGNORE INTO repositories (name) VALUES (?1)",
            [name],
        )?;
        let id: RepoId = self.conn.query_row(
            "SELECT id FROM repositories WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Record a framework tag for a repository
    pub fn insert_framework(&self, repo_id: RepoId, framework: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO repository_frameworks (repo_id, framework) VALUES (?1, ?2)",
            params![repo_id, framework],
        )?;
        Ok(())
    }

    /// Insert or replace a symbol
    pub fn insert_symbol(&self, symbol: &Symbol) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO symbols (id, repo_id, name, symbol_type, entity_type, file_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                symbol.id,
                symbol.repo_id,
                symbol.name,
                symbol.symbol_type.as_str(),
                symbol.entity_type.map(|e| e.as_str()),
                symbol.file_id,
            ],
        )?;
        Ok(())
    }

    /// Insert a dependency edge
    pub fn insert_dependency(
        &self,
        from: SymbolId,
        to: SymbolId,
        kind: DependencyType,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO dependencies (from_symbol_id, to_symbol_id, dependency_type)
            VALUES (?1, ?2, ?3)
            "#,
            params![from, to, kind.as_str()],
        )?;
        Ok(())
    }

    /// Insert an api_calls bridge row
    pub fn insert_api_call(&self, repo_id: RepoId, call: &ApiCall) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO api_calls (repo_id, caller_symbol_id, endpoint_symbol_id, http_method, path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![repo_id, call.caller_id, call.endpoint_id, call.http_method, call.path],
        )?;
        Ok(())
    }

    // ========== Read operations ==========

    /// Database-level statistics
    pub fn stats(&self) -> Result<DbStats> {
        let symbols: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM symbols", [], |row| row.get(0))?;
        let dependencies: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dependencies", [], |row| row.get(0))?;
        let api_calls: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM api_calls", [], |row| row.get(0))?;
        let repositories: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM repositories", [], |row| row.get(0))?;
        Ok(DbStats {
            repositories: repositories as usize,
            symbols: symbols as usize,
            dependencies: dependencies as usize,
            api_calls: api_calls as usize,
        })
    }

    /// Find symbols by exact name (CLI entry-point resolution)
    pub fn find_symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM symbols WHERE name = ?1", SYMBOL_COLUMNS))?;
        let symbols = stmt
            .query_map([name], row_to_symbol)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(symbols)
    }

    /// Helper to convert a row to an ApiCall
    fn row_to_api_call(row: &rusqlite::Row) -> rusqlite::Result<ApiCall> {
        Ok(ApiCall {
            caller_id: row.get(0)?,
            endpoint_id: row.get(1)?,
            http_method: row.get(2)?,
            path: row.get(3)?,
        })
    }

    fn query_api_calls(&self, column: &str, ids: &[SymbolId]) -> Result<Vec<ApiCall>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT caller_symbol_id, endpoint_symbol_id, http_method, path FROM api_calls WHERE {} IN ({})",
            column,
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let calls = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_api_call)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(calls)
    }

    fn query_edge_ids(
        &self,
        select_column: &str,
        where_column: &str,
        id: SymbolId,
        types: &[DependencyType],
    ) -> Result<Vec<SymbolId>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM dependencies WHERE {} = ?1 AND dependency_type IN ({})",
            select_column,
            where_column,
            placeholders_from(2, types.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<Value> = vec![Value::Integer(id)];
        values.extend(types.iter().map(|t| Value::Text(t.as_str().to_string())));
        let ids = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, SymbolId>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }
}

/// Helper to convert a row to a Symbol
fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
    let symbol_type_str: String = row.get(3)?;
    let symbol_type: SymbolType = symbol_type_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    // Unknown entity tags load as unclassified
    let entity_type = row
        .get::<_, Option<String>>(4)?
        .as_deref()
        .and_then(EntityType::parse_tag);

    Ok(Symbol {
        id: row.get(0)?,
        repo_id: row.get(1)?,
        name: row.get(2)?,
        symbol_type,
        entity_type,
        file_id: row.get(5)?,
    })
}

/// `?1, ?2, ... ?n`
fn placeholders(n: usize) -> String {
    placeholders_from(1, n)
}

fn placeholders_from(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl GraphStore for SqliteGraphStore {
    fn get_symbol(&self, id: SymbolId) -> Result<Option<Symbol>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM symbols WHERE id = ?1", SYMBOL_COLUMNS),
                [id],
                row_to_symbol,
            )
            .optional()
            .map_err(Into::into)
    }

    fn get_symbols_batch(
        &self,
        ids: &[SymbolId],
    ) -> Result<std::collections::HashMap<SymbolId, Symbol>> {
        if ids.is_empty() {
            return Ok(Default::default());
        }
        let sql = format!(
            "SELECT {} FROM symbols WHERE id IN ({})",
            SYMBOL_COLUMNS,
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let symbols = stmt
            .query_map(params_from_iter(ids.iter()), row_to_symbol)?
            .filter_map(|r| r.ok())
            .map(|s| (s.id, s))
            .collect();
        Ok(symbols)
    }

    fn edges_from(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>> {
        self.query_edge_ids("to_symbol_id", "from_symbol_id", id, types)
    }

    fn edges_to(&self, id: SymbolId, types: &[DependencyType]) -> Result<Vec<SymbolId>> {
        self.query_edge_ids("from_symbol_id", "to_symbol_id", id, types)
    }

    fn api_calls_from(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>> {
        self.query_api_calls("caller_symbol_id", ids)
    }

    fn api_calls_to(&self, ids: &[SymbolId]) -> Result<Vec<ApiCall>> {
        self.query_api_calls("endpoint_symbol_id", ids)
    }

    fn children_of(&self, id: SymbolId, symbol_types: &[SymbolType]) -> Result<Vec<SymbolId>> {
        if symbol_types.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT s.id FROM symbols s
            JOIN dependencies d ON d.to_symbol_id = s.id
            WHERE d.from_symbol_id = ?1
              AND d.dependency_type = 'contains'
              AND s.symbol_type IN ({})
            "#,
            placeholders_from(2, symbol_types.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<Value> = vec![Value::Integer(id)];
        values.extend(symbol_types.iter().map(|t| Value::Text(t.as_str().to_string())));
        let ids = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, SymbolId>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    fn find_methods_referencing(&self, container: SymbolId, source: SymbolId) -> Result<Vec<SymbolId>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT s.id FROM symbols s
            JOIN dependencies c ON c.to_symbol_id = s.id
            JOIN dependencies d ON d.from_symbol_id = s.id
            WHERE c.from_symbol_id = ?1
              AND c.dependency_type = 'contains'
              AND s.symbol_type IN ('method', 'function')
              AND d.to_symbol_id = ?2
              AND d.dependency_type IN ('calls', 'references', 'imports')
            "#,
        )?;
        let ids = stmt
            .query_map(params![container, source], |row| row.get::<_, SymbolId>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    fn repository_frameworks(&self, repo_id: RepoId) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT framework FROM repository_frameworks WHERE repo_id = ?1")?;
        let frameworks = stmt
            .query_map([repo_id], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(frameworks)
    }
}

/// Statistics about a graph database
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub repositories: usize,
    pub symbols: usize,
    pub dependencies: usize,
    pub api_calls: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph Database Statistics:")?;
        writeln!(f, "  Repositories: {}", self.repositories)?;
        writeln!(f, "  Symbols:      {}", self.symbols)?;
        writeln!(f, "  Dependencies: {}", self.dependencies)?;
        write!(f, "  Api calls:    {}", self.api_calls)
    }
}
