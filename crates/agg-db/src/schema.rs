use rusqlite::{Connection, Result};
use std::path::Path;

/// How hard SQLite works to get each admitted key onto disk.
///
/// Both levels survive a process crash under WAL; `Full` also survives
/// power loss at the cost of an fsync per commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Durability {
    Normal,
    #[default]
    Full,
}

impl Durability {
    fn pragma_value(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }
}

pub fn open(path: impl AsRef<Path>, durability: Durability) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "synchronous", durability.pragma_value())?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    let sql = include_str!("../migrations/0001_init.sql");
    conn.execute_batch(sql)?;
    Ok(())
}

pub fn open_and_migrate(path: impl AsRef<Path>, durability: Durability) -> Result<Connection> {
    let conn = open(path, durability)?;
    migrate(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn with_test_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synchronous(conn: &Connection) -> i64 {
        conn.pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn durability_sets_synchronous_pragma() {
        let dir = tempfile::tempdir().unwrap();
        let full = open_and_migrate(dir.path().join("full.db"), Durability::Full).unwrap();
        let normal = open_and_migrate(dir.path().join("normal.db"), Durability::Normal).unwrap();
        assert_eq!(synchronous(&full), 2);
        assert_eq!(synchronous(&normal), 1);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = with_test_db().unwrap();
        migrate(&conn).unwrap();
    }
}
