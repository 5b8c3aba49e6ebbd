use catalogue_core::db::open_db_in_memory;
use catalogue_core::{
    CatalogueConfig, CatalogueEngine, CatalogueError, OwnerRef, SqliteCatalogueRepository,
};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn persisted_engine(
    conn: &Connection,
    config: CatalogueConfig,
) -> CatalogueEngine<SqliteCatalogueRepository<'_>> {
    let repo = SqliteCatalogueRepository::try_new(conn, &config).unwrap();
    CatalogueEngine::for_owner(
        repo,
        config,
        OwnerRef::new("test_models", 1),
        vec!["title".to_string(), "field_two".to_string()],
    )
}

#[test]
fn set_then_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine.set_item("title", "en", "This is a test").unwrap();

    assert_eq!(
        engine.translate("title", "en").unwrap().as_deref(),
        Some("This is a test")
    );
    assert_eq!(engine.attribute_value("title").unwrap(), "This is a test");
}

#[test]
fn locales_are_isolated_and_listed_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine
        .set_item("title", "en", "This is an english text.")
        .unwrap()
        .set_item("title", "it", "This is an italian text.")
        .unwrap();

    assert_eq!(
        engine.translate("title", "en").unwrap().as_deref(),
        Some("This is an english text.")
    );
    assert_eq!(
        engine.translate("title", "it").unwrap().as_deref(),
        Some("This is an italian text.")
    );
    assert_eq!(engine.locales_for("title").unwrap(), ["en", "it"]);
}

#[test]
fn items_for_and_all_translations_group_values() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine
        .set_item("title", "en", "English title")
        .unwrap()
        .set_item("title", "it", "Italian title")
        .unwrap()
        .set_item("field_two", "en", "English field two")
        .unwrap();

    let title_items = engine.items_for("title").unwrap();
    assert_eq!(
        title_items,
        BTreeMap::from([
            ("en".to_string(), "English title".to_string()),
            ("it".to_string(), "Italian title".to_string()),
        ])
    );

    let all = engine.all_translations().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["title"]["it"], "Italian title");
    assert_eq!(all["field_two"]["en"], "English field two");
}

#[test]
fn forget_item_removes_only_the_exact_pair() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine
        .set_item("title", "en", "English title")
        .unwrap()
        .set_item("title", "it", "Italian title")
        .unwrap();

    engine.forget_item("title", "en").unwrap();

    let remaining = engine.items_for("title").unwrap();
    assert_eq!(
        remaining,
        BTreeMap::from([("it".to_string(), "Italian title".to_string())])
    );

    // Storage agrees with the cache.
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM catalogue_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn forget_item_for_missing_pair_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine.set_item("title", "en", "English title").unwrap();
    engine.forget_item("title", "de").unwrap();

    assert_eq!(
        engine.translate("title", "en").unwrap().as_deref(),
        Some("English title")
    );
}

#[test]
fn forget_locale_removes_every_key_for_that_locale() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine
        .set_item("title", "en", "English title")
        .unwrap()
        .set_item("title", "it", "Italian title")
        .unwrap()
        .set_item("field_two", "en", "English field two")
        .unwrap()
        .set_item("field_two", "it", "Italian field two")
        .unwrap();

    engine.forget_locale("it").unwrap();

    let all = engine.all_translations().unwrap();
    assert_eq!(
        all["title"],
        BTreeMap::from([("en".to_string(), "English title".to_string())])
    );
    assert_eq!(
        all["field_two"],
        BTreeMap::from([("en".to_string(), "English field two".to_string())])
    );
}

#[test]
fn fallback_locale_redirects_unknown_locale_reads() {
    let conn = open_db_in_memory().unwrap();
    let config = CatalogueConfig::default().with_fallback_locale("en");
    let mut engine = persisted_engine(&conn, config);

    engine.set_item("title", "en", "This is test").unwrap();

    assert_eq!(
        engine.translate("title", "it").unwrap().as_deref(),
        Some("This is test")
    );
    assert_eq!(engine.item("title", "it", false).unwrap(), None);
}

#[test]
fn missing_locale_without_fallback_resolves_to_absent() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    engine.set_item("title", "it", "Italian only").unwrap();

    assert_eq!(engine.translate("title", "en").unwrap(), None);
    assert_eq!(engine.attribute_value("title").unwrap(), "");
}

#[test]
fn undeclared_attribute_is_rejected_with_valid_key_set() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());

    let err = engine.translate("fake_title", "en").unwrap_err();
    assert!(matches!(err, CatalogueError::NonCatalogable { .. }));
    let message = err.to_string();
    assert!(message.contains("fake_title"));
    assert!(message.contains("title, field_two"));

    assert!(engine.is_catalogue_attribute("title"));
    assert!(!engine.is_catalogue_attribute("fake_title"));
}

#[test]
fn set_mutator_transforms_value_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());
    engine
        .mutators_mut()
        .register_set("title", |value, _locale| format!("Mutated {value}"));

    engine.set_item("title", "en", "hi!").unwrap();

    assert_eq!(
        engine.translate("title", "en").unwrap().as_deref(),
        Some("Mutated hi!")
    );
}

#[test]
fn get_mutator_transforms_resolved_value_on_read() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = persisted_engine(&conn, CatalogueConfig::default());
    engine
        .mutators_mut()
        .register_get("title", |value| value.map(|v| v.to_uppercase()));

    engine.set_item("title", "en", "quiet").unwrap();

    assert_eq!(
        engine.translate("title", "en").unwrap().as_deref(),
        Some("QUIET")
    );
}

#[test]
fn second_engine_instance_reloads_persisted_state() {
    let conn = open_db_in_memory().unwrap();

    let mut writer = persisted_engine(&conn, CatalogueConfig::default());
    writer.set_item("title", "en", "Shared value").unwrap();

    let mut reader = persisted_engine(&conn, CatalogueConfig::default());
    assert_eq!(
        reader.translate("title", "en").unwrap().as_deref(),
        Some("Shared value")
    );
}

#[test]
fn has_item_defaults_to_current_locale() {
    let conn = open_db_in_memory().unwrap();
    let config = CatalogueConfig::default().with_current_locale("it");
    let mut engine = persisted_engine(&conn, config);

    engine.set_item("title", "it", "Titolo").unwrap();

    assert!(engine.has_item("title", None).unwrap());
    assert!(!engine.has_item("title", Some("en")).unwrap());
}
