use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::model::ContentItem;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating database directory {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS datasources (
            id         INTEGER PRIMARY KEY,
            kind       TEXT NOT NULL CHECK(kind IN ('website','document')),
            target     TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS paragraphs (
            id            INTEGER PRIMARY KEY,
            datasource_id INTEGER NOT NULL REFERENCES datasources(id),
            title         TEXT NOT NULL,
            main_idea     TEXT,
            content       TEXT NOT NULL,
            fingerprint   TEXT NOT NULL,
            source_url    TEXT,
            heading_path  TEXT NOT NULL,
            content_type  TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(datasource_id, fingerprint)
        );
        CREATE INDEX IF NOT EXISTS idx_paragraphs_datasource ON paragraphs(datasource_id);
        ",
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceKind {
    Website,
    Document,
}

impl DatasourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasourceKind::Website => "website",
            DatasourceKind::Document => "document",
        }
    }
}

/// Parent record of one extraction run.
pub fn create_datasource(conn: &Connection, kind: DatasourceKind, target: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO datasources (kind, target) VALUES (?1, ?2)",
        rusqlite::params![kind.as_str(), target],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist items with at least `min_chars` characters of text. Returns the
/// number of rows written.
pub fn save_items(
    conn: &Connection,
    datasource_id: i64,
    items: &[ContentItem],
    min_chars: usize,
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO paragraphs
             (datasource_id, title, main_idea, content, fingerprint, source_url, heading_path, content_type)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for item in items.iter().filter(|i| i.text.chars().count() >= min_chars) {
            let path = serde_json::to_string(&item.heading_path)?;
            count += stmt.execute(rusqlite::params![
                datasource_id,
                item.heading,
                item.text,
                item.fingerprint.as_str(),
                item.source_location,
                path,
                item.content_type.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Stats ──

pub struct Stats {
    pub datasources: usize,
    pub websites: usize,
    pub documents: usize,
    pub paragraphs: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let datasources: usize = conn.query_row("SELECT COUNT(*) FROM datasources", [], |r| r.get(0))?;
    let websites: usize = conn.query_row(
        "SELECT COUNT(*) FROM datasources WHERE kind = 'website'",
        [],
        |r| r.get(0),
    )?;
    let paragraphs: usize = conn.query_row("SELECT COUNT(*) FROM paragraphs", [], |r| r.get(0))?;
    Ok(Stats {
        datasources,
        websites,
        documents: datasources - websites,
        paragraphs,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::model::ContentType;

    fn item(heading: &str, text: &str) -> ContentItem {
        ContentItem {
            source_location: Some("https://a.test/".into()),
            content_type: ContentType::Paragraph,
            heading: heading.into(),
            heading_path: vec!["Root".into(), heading.into()],
            heading_level: 2,
            text: text.into(),
            list_items: None,
            fingerprint: fingerprint(heading, text),
        }
    }

    struct StoredItem {
        title: String,
        content: String,
        source_url: Option<String>,
        heading_path: Vec<String>,
    }

    fn fetch_items(conn: &Connection, datasource_id: i64) -> Result<Vec<StoredItem>> {
        let mut stmt = conn.prepare(
            "SELECT title, content, source_url, heading_path
             FROM paragraphs WHERE datasource_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([datasource_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(title, content, source_url, path)| {
                Ok(StoredItem {
                    title,
                    content,
                    source_url,
                    heading_path: serde_json::from_str(&path)
                        .with_context(|| format!("bad heading_path {:?}", path))?,
                })
            })
            .collect()
    }

    fn open() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("nested/content.sqlite")).unwrap();
        init_schema(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn saves_long_enough_items() {
        let (_dir, conn) = open();
        let id = create_datasource(&conn, DatasourceKind::Website, "https://a.test/").unwrap();
        let long = "x".repeat(60);
        let items = vec![item("Intro", &long), item("Intro", "short")];

        assert_eq!(save_items(&conn, id, &items, 50).unwrap(), 1);
        // same fingerprint again is ignored
        assert_eq!(save_items(&conn, id, &items, 50).unwrap(), 0);

        let stored = fetch_items(&conn, id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Intro");
        assert_eq!(stored[0].content, long);
        assert_eq!(stored[0].heading_path, vec!["Root", "Intro"]);
        assert_eq!(stored[0].source_url.as_deref(), Some("https://a.test/"));

        let main_idea: Option<String> = conn
            .query_row("SELECT main_idea FROM paragraphs", [], |r| r.get(0))
            .unwrap();
        assert!(main_idea.is_none());
    }

    #[test]
    fn stats_count_kinds() {
        let (_dir, conn) = open();
        create_datasource(&conn, DatasourceKind::Website, "https://a.test/").unwrap();
        let doc = create_datasource(&conn, DatasourceKind::Document, "notes.docx").unwrap();
        save_items(&conn, doc, &[item("A", &"y".repeat(80))], 50).unwrap();

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.datasources, 2);
        assert_eq!(s.websites, 1);
        assert_eq!(s.documents, 1);
        assert_eq!(s.paragraphs, 1);
    }
}
