//! Database schema definitions

/// SQL to create the repositories table
pub const CREATE_REPOSITORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the repository_frameworks table
pub const CREATE_REPOSITORY_FRAMEWORKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS repository_frameworks (
    repo_id INTEGER NOT NULL,
    framework TEXT NOT NULL,
    UNIQUE(repo_id, framework)
)
"#;

/// SQL to create the symbols table
pub const CREATE_SYMBOLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    symbol_type TEXT NOT NULL,
    entity_type TEXT,
    file_id INTEGER
)
"#;

/// SQL to create the dependencies table
pub const CREATE_DEPENDENCIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_symbol_id INTEGER NOT NULL,
    to_symbol_id INTEGER NOT NULL,
    dependency_type TEXT NOT NULL,
    UNIQUE(from_symbol_id, to_symbol_id, dependency_type)
)
"#;

/// SQL to create the api_calls table
pub const CREATE_API_CALLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS api_calls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER,
    caller_symbol_id INTEGER,
    endpoint_symbol_id INTEGER,
    http_method TEXT,
    path TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_symbols_repo ON symbols(repo_id)",
    "CREATE INDEX IF NOT EXISTS idx_deps_from ON dependencies(from_symbol_id)",
    "CREATE INDEX IF NOT EXISTS idx_deps_to ON dependencies(to_symbol_id)",
    "CREATE INDEX IF NOT EXISTS idx_api_calls_caller ON api_calls(caller_symbol_id)",
    "CREATE INDEX IF NOT EXISTS idx_api_calls_endpoint ON api_calls(endpoint_symbol_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_REPOSITORIES_TABLE,
        CREATE_REPOSITORY_FRAMEWORKS_TABLE,
        CREATE_SYMBOLS_TABLE,
        CREATE_DEPENDENCIES_TABLE,
        CREATE_API_CALLS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
