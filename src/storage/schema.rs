//! Database schema definitions
//!
//! Tables are created only when missing. Existing tables are never altered.

pub const LINES_TABLE: &str = "DialogueLines";
pub const GROUPS_TABLE: &str = "DialogueGroups";

/// SQL to create the dialogue lines table
pub const CREATE_LINES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS DialogueLines (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Text TEXT
)
"#;

/// SQL to create the dialogue groups table
/// Group IDs are caller-assigned and deliberately carry no UNIQUE constraint
pub const CREATE_GROUPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS DialogueGroups (
    ID TEXT,
    Elements TEXT
)
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_LINES_TABLE, CREATE_GROUPS_TABLE]
}

/// Create any missing tables
pub fn ensure_schema(conn: &rusqlite::Connection) -> crate::Result<()> {
    for stmt in all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}
