//! SQLite-backed graph store.
//!
//! Assets and relations live in two tables keyed by content hash. Sources
//! push differential bulks through [`SqliteStore::update_graph`]; reads
//! either rebuild a source's in-memory graph or run a pattern query through
//! the compiler and rematerialize the rows with the cursor layer.

mod cursor;
mod hash;

pub use cursor::{decode_row, QueryRow, QueryValue, ScalarValue};
pub use hash::ContentHasher;

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::{Graph, GraphUpdatesBulk};
use crate::model::{Asset, Relation, SourceRelation};
use crate::query::{PatternQuery, Projection, SqlTranslator};

/// Rows per write transaction during bulk updates.
const WRITE_CHUNK: usize = 1_000;

/// Counts reported by one bulk update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub assets_upserted: u64,
    pub relations_upserted: u64,
    pub relations_removed: u64,
    pub assets_removed: u64,
}

/// Executed query result: the projection schema plus reassembled rows.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub projections: Vec<Projection>,
    pub rows: Vec<QueryRow>,
}

/// Graph store over a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens a store at `path`, creating the schema when missing.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS assets (
                id TEXT NOT NULL,
                value TEXT,
                type TEXT NOT NULL,
                CONSTRAINT pk_asset PRIMARY KEY (id, type)
            );
            CREATE INDEX IF NOT EXISTS asset_value_idx ON assets (value);
            CREATE INDEX IF NOT EXISTS asset_type_idx ON assets (type);
            CREATE TABLE IF NOT EXISTS relations (
                id TEXT NOT NULL,
                from_id TEXT NOT NULL,
                to_id TEXT NOT NULL,
                type TEXT NOT NULL,
                source TEXT NOT NULL,
                CONSTRAINT pk_relation PRIMARY KEY (id, type)
            );
            CREATE INDEX IF NOT EXISTS relation_type_idx ON relations (type);
            CREATE INDEX IF NOT EXISTS relation_from_idx ON relations (from_id);
            CREATE INDEX IF NOT EXISTS relation_to_idx ON relations (to_id);
            CREATE INDEX IF NOT EXISTS left_relation_idx ON relations (from_id, type);
            CREATE INDEX IF NOT EXISTS right_relation_idx ON relations (to_id, type);
            CREATE INDEX IF NOT EXISTS full_relation_idx ON relations (type, from_id, to_id);",
        )?;
        Ok(())
    }

    /// Applies one bulk of differential updates scoped to `source`.
    ///
    /// Upserts skip rows whose content hash is already present; removals
    /// count the rows they actually deleted.
    pub fn update_graph(&mut self, source: &str, bulk: &GraphUpdatesBulk) -> Result<UpdateStats> {
        let hasher = ContentHasher::new();
        let stats = UpdateStats {
            assets_upserted: self.upsert_assets(&bulk.asset_upserts, &hasher)?,
            relations_upserted: self.upsert_relations(source, &bulk.relation_upserts, &hasher)?,
            relations_removed: self.remove_relations(source, &bulk.relation_removals, &hasher)?,
            assets_removed: self.remove_assets(&bulk.asset_removals, &hasher)?,
        };
        info!(
            source,
            assets_upserted = stats.assets_upserted,
            relations_upserted = stats.relations_upserted,
            relations_removed = stats.relations_removed,
            assets_removed = stats.assets_removed,
            "store.update.completed"
        );
        Ok(stats)
    }

    fn upsert_assets(&mut self, assets: &[Asset], hasher: &ContentHasher) -> Result<u64> {
        if assets.is_empty() {
            return Ok(0);
        }
        let mut inserted = 0u64;
        for chunk in assets.chunks(WRITE_CHUNK) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO assets (id, type, value) VALUES (?1, ?2, ?3)",
                )?;
                for asset in chunk {
                    let id = hasher.hash(asset)?;
                    inserted += stmt.execute(params![id, asset.type_name, asset.key])? as u64;
                }
            }
            tx.commit()?;
        }
        debug!(inserted, total = assets.len(), "store.update.assets_upserted");
        Ok(inserted)
    }

    fn upsert_relations(
        &mut self,
        source: &str,
        relations: &[Relation],
        hasher: &ContentHasher,
    ) -> Result<u64> {
        if relations.is_empty() {
            return Ok(0);
        }
        let mut inserted = 0u64;
        for chunk in relations.chunks(WRITE_CHUNK) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO relations (id, from_id, to_id, type, source)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for relation in chunk {
                    let id = hasher.hash(&SourceRelation {
                        relation: relation.clone(),
                        source: source.to_owned(),
                    })?;
                    let from_id = hasher.hash(&relation.from)?;
                    let to_id = hasher.hash(&relation.to)?;
                    inserted += stmt
                        .execute(params![id, from_id, to_id, relation.type_name, source])?
                        as u64;
                }
            }
            tx.commit()?;
        }
        debug!(
            inserted,
            total = relations.len(),
            "store.update.relations_upserted"
        );
        Ok(inserted)
    }

    fn remove_relations(
        &mut self,
        source: &str,
        relations: &[Relation],
        hasher: &ContentHasher,
    ) -> Result<u64> {
        if relations.is_empty() {
            return Ok(0);
        }
        let mut removed = 0u64;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM relations WHERE id = ?1")?;
            for relation in relations {
                let id = hasher.hash(&SourceRelation {
                    relation: relation.clone(),
                    source: source.to_owned(),
                })?;
                removed += stmt.execute(params![id])? as u64;
            }
        }
        tx.commit()?;
        debug!(
            removed,
            total = relations.len(),
            "store.update.relations_removed"
        );
        Ok(removed)
    }

    fn remove_assets(&mut self, assets: &[Asset], hasher: &ContentHasher) -> Result<u64> {
        if assets.is_empty() {
            return Ok(0);
        }
        let mut removed = 0u64;
        let tx = self.conn.transaction()?;
        {
            // An asset survives while any relation still references it.
            let mut stmt = tx.prepare(
                "DELETE FROM assets WHERE id = ?1
                 AND (SELECT COUNT(*) FROM relations
                      WHERE from_id = ?1 OR to_id = ?1) = 0",
            )?;
            for asset in assets {
                let id = hasher.hash(asset)?;
                removed += stmt.execute(params![id])? as u64;
            }
        }
        tx.commit()?;
        debug!(removed, total = assets.len(), "store.update.assets_removed");
        Ok(removed)
    }

    /// Rebuilds the in-memory graph observed by one source.
    pub fn read_graph(&self, source: &str) -> Result<Graph> {
        let mut stmt = self.conn.prepare(
            "SELECT from_assets.type, from_assets.value, to_assets.type, to_assets.value,
                    relations.type
             FROM relations
             JOIN assets from_assets ON from_assets.id = relations.from_id
             JOIN assets to_assets ON to_assets.id = relations.to_id
             WHERE relations.source = ?1",
        )?;
        let mut rows = stmt.query(params![source])?;

        let mut graph = Graph::new();
        while let Some(row) = rows.next()? {
            let from_type: String = row.get(0)?;
            let from_key: String = row.get(1)?;
            let to_type: String = row.get(2)?;
            let to_key: String = row.get(3)?;
            let relation_type: String = row.get(4)?;

            let from = graph.add_asset(from_type, from_key);
            let to = graph.add_asset(to_type, to_key);
            graph.add_relation(from, relation_type, to);
        }
        debug!(
            source,
            assets = graph.asset_count(),
            relations = graph.relation_count(),
            "store.read.completed"
        );
        Ok(graph)
    }

    pub fn count_assets(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn count_relations(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relations", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Drops and recreates both tables.
    pub fn flush_all(&self) -> Result<()> {
        self.conn
            .execute_batch("DROP TABLE IF EXISTS assets; DROP TABLE IF EXISTS relations;")?;
        self.initialize_schema()
    }

    /// Translates a pattern query, executes it, and rematerializes the rows.
    pub fn query(&self, query: &PatternQuery) -> Result<QueryResult> {
        let translation = SqlTranslator::new().translate(query)?;
        debug!(sql = %translation.query, "store.query.translated");

        let mut stmt = self.conn.prepare(&translation.query)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([])?;

        let mut decoded = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value: rusqlite::types::Value = row.get(index)?;
                columns.push(ScalarValue::from(value));
            }
            decoded.push(decode_row(&translation.projections, columns)?);
        }
        Ok(QueryResult {
            projections: translation.projections,
            rows: decoded,
        })
    }
}
