//! Where the runner reads its six sheet tables from.
//!
//! RULE: Only `SnapshotStore` talks to the database. The engine itself never
//! touches files or SQL; it is handed a `SourceTables` value.

use anyhow::{Context, Result};
use closing_core::types::{Row, Sheet, SourceTables, Table};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

pub trait TableSource {
    /// Human-readable origin, for the console header.
    fn describe(&self) -> String;

    fn load(&self) -> Result<SourceTables>;
}

// ── JSON directory ─────────────────────────────────────────────────

/// A directory holding one `<sheet>.json` file (array of arrays) per sheet.
/// A missing file reads as an empty table.
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, sheet: Sheet) -> PathBuf {
        self.dir.join(format!("{}.json", sheet.name()))
    }

    fn read_table(path: &Path) -> Result<Table> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let table: Table = serde_json::from_str(&content)
            .with_context(|| format!("{} is not an array of rows", path.display()))?;
        Ok(table)
    }
}

impl TableSource for JsonDirSource {
    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }

    fn load(&self) -> Result<SourceTables> {
        let mut tables = SourceTables::default();
        for sheet in Sheet::ALL {
            let path = self.path_for(sheet);
            if !path.exists() {
                log::warn!("{} not found; {} is empty", path.display(), sheet.name());
                continue;
            }
            let table = Self::read_table(&path)?;
            log::debug!("loaded {} rows from {}", table.len(), path.display());
            tables.set(sheet, table);
        }
        Ok(tables)
    }
}

// ── SQLite snapshot ────────────────────────────────────────────────

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the snapshot database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_snapshot.sql"))?;
        Ok(())
    }

    /// Replace every stored row of `sheet` with `table`.
    pub fn save_table(&self, sheet: Sheet, table: &Table, imported_at: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM sheet_row WHERE sheet = ?1", params![sheet.name()])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sheet_row (sheet, row_index, cells, imported_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (index, row) in table.iter().enumerate() {
                let cells = serde_json::to_string(row)?;
                stmt.execute(params![sheet.name(), index as i64, cells, imported_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn save_all(&self, tables: &SourceTables, imported_at: &str) -> Result<()> {
        for sheet in Sheet::ALL {
            self.save_table(sheet, tables.get(sheet), imported_at)?;
        }
        Ok(())
    }

    pub fn load_table(&self, sheet: Sheet) -> Result<Table> {
        let mut stmt = self.conn.prepare(
            "SELECT cells FROM sheet_row WHERE sheet = ?1 ORDER BY row_index ASC",
        )?;
        let raw = stmt
            .query_map(params![sheet.name()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        raw.iter()
            .enumerate()
            .map(|(i, cells)| {
                serde_json::from_str::<Row>(cells)
                    .with_context(|| format!("{} row {i} holds malformed cells", sheet.name()))
            })
            .collect()
    }

    pub fn row_count(&self, sheet: Sheet) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM sheet_row WHERE sheet = ?1",
            params![sheet.name()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl TableSource for SnapshotStore {
    fn describe(&self) -> String {
        match self.conn.path() {
            Some(path) if !path.is_empty() => format!("sqlite:{path}"),
            _ => "sqlite:memory".to_string(),
        }
    }

    fn load(&self) -> Result<SourceTables> {
        let mut tables = SourceTables::default();
        for sheet in Sheet::ALL {
            tables.set(sheet, self.load_table(sheet)?);
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use closing_core::types::Cell;

    fn store() -> SnapshotStore {
        let store = SnapshotStore::in_memory().expect("in-memory store");
        store.migrate().expect("migration");
        store
    }

    #[test]
    fn rows_come_back_in_order() {
        let store = store();
        let table: Table = vec![
            vec![Cell::from("header")],
            vec![Cell::from("Kim"), Cell::Number(120_000.0), Cell::Empty],
            vec![Cell::Bool(true)],
        ];
        store.save_table(Sheet::Activations, &table, "2024-05-10T09:00:00Z").unwrap();

        assert_eq!(store.load_table(Sheet::Activations).unwrap(), table);
        assert_eq!(store.row_count(Sheet::Activations).unwrap(), 3);
        assert!(store.load_table(Sheet::Inventory).unwrap().is_empty());
    }

    #[test]
    fn save_replaces_previous_import() {
        let store = store();
        let first: Table = vec![vec![Cell::from("a")], vec![Cell::from("b")]];
        let second: Table = vec![vec![Cell::from("c")]];
        store.save_table(Sheet::SalesTargets, &first, "t1").unwrap();
        store.save_table(Sheet::SalesTargets, &second, "t2").unwrap();

        assert_eq!(store.load_table(Sheet::SalesTargets).unwrap(), second);
    }

    #[test]
    fn missing_json_files_read_as_empty() {
        let dir = std::env::temp_dir().join(format!("report-runner-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tables = JsonDirSource::new(&dir).load().unwrap();
        assert!(tables.activations.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
