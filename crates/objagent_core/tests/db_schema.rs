use objagent_core::db::schema::table_exists;
use objagent_core::db::{open_db, open_db_in_memory};
use objagent_core::{
    ClassMetadata, Mapper, ObjectAgent, Query, Record, SqliteEntityManager, StorageAgent, Value,
};
use rusqlite::Connection;

fn mapper() -> Mapper {
    let mut mapper = Mapper::new();
    mapper
        .register(ClassMetadata::new("page", "pages", ["title"]))
        .unwrap();
    mapper
        .register(ClassMetadata::new("author", "authors", ["name"]))
        .unwrap();
    mapper
}

#[test]
fn open_db_in_memory_creates_mapped_tables() {
    let conn = open_db_in_memory(&mapper()).unwrap();

    assert!(table_exists(&conn, "pages").unwrap());
    assert!(table_exists(&conn, "authors").unwrap());
    assert!(!table_exists(&conn, "comments").unwrap());
    assert_eq!(foreign_keys(&conn), 1);
}

#[test]
fn opening_same_database_twice_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objagent.db");

    let conn_first = open_db(&path, &mapper()).unwrap();
    {
        let agent = StorageAgent::new(SqliteEntityManager::new(&conn_first, mapper()));
        agent
            .persist(&mut Record::new("page").with("title", "kept"))
            .unwrap();
    }
    drop(conn_first);

    let conn_second = open_db(&path, &mapper()).unwrap();
    let agent = StorageAgent::new(SqliteEntityManager::new(&conn_second, mapper()));
    let pages = agent.query(&Query::new("page")).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].get("title"), Some(&Value::from("kept")));
}

#[test]
fn reopening_with_extra_class_adds_its_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objagent.db");

    let mut pages_only = Mapper::new();
    pages_only
        .register(ClassMetadata::new("page", "pages", ["title"]))
        .unwrap();
    drop(open_db(&path, &pages_only).unwrap());

    let conn = open_db(&path, &mapper()).unwrap();
    assert!(table_exists(&conn, "pages").unwrap());
    assert!(table_exists(&conn, "authors").unwrap());
}

fn foreign_keys(conn: &Connection) -> i64 {
    conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap()
}
