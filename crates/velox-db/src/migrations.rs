/// Schema migration applied when a store is opened.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const KV_SCHEMA_V1: Migration = Migration {
    version: 1,
    name: "kv_entries",
    sql: "CREATE TABLE IF NOT EXISTS kv_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
};

pub const MIGRATIONS: &[Migration] = &[KV_SCHEMA_V1];
