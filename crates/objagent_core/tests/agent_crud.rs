use objagent_core::db::open_db_in_memory;
use objagent_core::{
    AgentError, ClassMetadata, Comparator, Mapper, ObjectAgent, Record, SqliteEntityManager,
    StorageAgent, StorageError, Value,
};
use rusqlite::Connection;

fn page_mapper() -> Mapper {
    let mut mapper = Mapper::new();
    mapper
        .register(ClassMetadata::new("page", "pages", ["title", "body"]))
        .unwrap();
    mapper
}

fn agent(conn: &Connection) -> StorageAgent<SqliteEntityManager<'_>> {
    StorageAgent::new(SqliteEntityManager::new(conn, page_mapper()))
}

fn create_page(agent: &StorageAgent<SqliteEntityManager<'_>>, title: &str) -> Record {
    let mut page = Record::new("page").with("title", title);
    agent.persist(&mut page).unwrap();
    page
}

#[test]
fn capabilities_declare_no_parent_support_and_all_comparators() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let capabilities = agent.capabilities();
    assert!(!capabilities.can_set_parent());
    assert!(capabilities.can_query_count());
    for comparator in Comparator::ALL {
        assert!(capabilities.supports_comparator(comparator));
    }
}

#[test]
fn persist_assigns_identifier_and_find_returns_record() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let page = create_page(&agent, "Hello World");
    let id = page.id().cloned().expect("persist assigns an id");

    let found = agent.find(&id, Some("page")).unwrap();
    assert_eq!(found.id(), Some(&id));
    assert_eq!(found.get("title"), Some(&Value::from("Hello World")));
    assert_eq!(found.get("body"), Some(&Value::Null));
    assert_eq!(found.class(), "page");
}

#[test]
fn find_unknown_identifier_returns_object_not_found() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    create_page(&agent, "Foobar");
    create_page(&agent, "Hello");

    let err = agent.find(&Value::from("asd"), Some("page")).unwrap_err();
    match &err {
        AgentError::ObjectNotFound { class, identifier } => {
            assert_eq!(class, "page");
            assert_eq!(identifier, &Value::from("asd"));
        }
        other => panic!("expected ObjectNotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("Could not find object"));
}

#[test]
fn find_without_class_fails_before_storage_access() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let err = agent.find(&Value::from(1), None).unwrap_err();
    assert!(matches!(err, AgentError::MissingClassArgument("find")));

    let err = agent.find_many(&[Value::from(1)], None).unwrap_err();
    assert!(matches!(err, AgentError::MissingClassArgument("find_many")));
}

#[test]
fn find_on_unmapped_class_surfaces_storage_error() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let err = agent.find(&Value::from(1), Some("author")).unwrap_err();
    assert!(matches!(
        err,
        AgentError::Storage(StorageError::UnmappedClass(class)) if class == "author"
    ));
}

#[test]
fn find_many_returns_requested_records_only() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    let first = create_page(&agent, "Foobar");
    let second = create_page(&agent, "Hello");
    create_page(&agent, "Hello");

    let ids = [first.id().cloned().unwrap(), second.id().cloned().unwrap()];
    let pages = agent.find_many(&ids, Some("page")).unwrap();

    assert_eq!(pages.len(), 2);
    let mut found = pages
        .iter()
        .filter_map(|page| page.id().and_then(Value::as_i64))
        .collect::<Vec<_>>();
    found.sort_unstable();
    let mut expected = ids.iter().filter_map(Value::as_i64).collect::<Vec<_>>();
    expected.sort_unstable();
    assert_eq!(found, expected);
}

#[test]
fn find_many_with_no_identifiers_returns_nothing() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    create_page(&agent, "Hello");

    assert!(agent.find_many(&[], Some("page")).unwrap().is_empty());
}

#[test]
fn persist_existing_record_updates_in_place() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    let mut page = create_page(&agent, "draft");
    let id = page.id().cloned().unwrap();

    page.set("title", "final");
    agent.persist(&mut page).unwrap();
    agent.flush().unwrap();

    let found = agent.find(&id, Some("page")).unwrap();
    assert_eq!(found.get("title"), Some(&Value::from("final")));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn persist_with_explicit_identifier_inserts_when_missing() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let mut page = Record::new("page").with("id", 42).with("title", "imported");
    agent.persist(&mut page).unwrap();

    let found = agent.find(&Value::from(42), Some("page")).unwrap();
    assert_eq!(found.get("title"), Some(&Value::from("imported")));
}

#[test]
fn persist_rejects_unmapped_fields() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let mut page = Record::new("page").with("title", "x").with("rating", 5);
    let err = agent.persist(&mut page).unwrap_err();
    assert!(matches!(
        err,
        AgentError::Storage(StorageError::UnknownField { ref field, .. }) if field == "rating"
    ));
    assert!(page.id().is_none());
}

#[test]
fn remove_deletes_record() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    let page = create_page(&agent, "Hello World");

    agent.remove(&page).unwrap();
    agent.flush().unwrap();

    let err = agent
        .find(page.id().unwrap(), Some("page"))
        .expect_err("object was not removed");
    assert!(matches!(err, AgentError::ObjectNotFound { .. }));
}

#[test]
fn remove_requires_persisted_record() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    let err = agent.remove(&Record::new("page")).unwrap_err();
    assert!(matches!(
        err,
        AgentError::Storage(StorageError::MissingIdentifier(_))
    ));
}

#[test]
fn identifier_is_always_id() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    let page = create_page(&agent, "Hello World");

    assert_eq!(agent.identifier(&page), "id");
    assert_eq!(agent.identifier(&Record::new("anything")), "id");
}

#[test]
fn supports_only_mapped_classes() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);

    assert!(agent.supports("page"));
    assert!(!agent.supports("std_class"));
}

#[test]
fn set_parent_is_always_unsupported() {
    let conn = open_db_in_memory(&page_mapper()).unwrap();
    let agent = agent(&conn);
    let parent = create_page(&agent, "parent");
    let mut page = Record::new("page");

    let err = agent.set_parent(&mut page, &parent).unwrap_err();
    assert!(matches!(err, AgentError::UnsupportedOperation(_)));
}
