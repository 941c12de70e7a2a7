use std::io::Cursor;

use litereader::{
    planner::columns::ColumnLayout,
    storage::{pager::Pager, schema::SchemaCatalog},
    types::{page::PageType, value::ColumnValue},
    utils::mock::{FixtureBuilder, FixtureTable},
};

fn open(builder: FixtureBuilder) -> Pager<Cursor<Vec<u8>>> {
    Pager::new(Cursor::new(builder.to_bytes().unwrap())).unwrap()
}

fn shop() -> FixtureBuilder {
    FixtureBuilder::widgets()
        .index(
            "widgets_by_name",
            "widgets",
            "CREATE INDEX widgets_by_name ON widgets (name)",
        )
        .table(
            FixtureTable::new("orders", "CREATE TABLE orders (widget_id, quantity)")
                .row([ColumnValue::Integer(1), ColumnValue::Integer(3)]),
        )
        .view("heavy", "CREATE VIEW heavy AS SELECT * FROM widgets WHERE weight > 1")
}

#[test]
fn test_entries_in_traversal_order() {
    let mut pager = open(shop());
    let entries = SchemaCatalog::entries(&mut pager);

    let kinds: Vec<String> = entries.iter().map(|e| e.entry_type.to_string()).collect();
    assert_eq!(kinds, vec!["table", "index", "table", "view"]);
    let tables: Vec<Option<String>> = entries.iter().map(|e| e.table_name()).collect();
    assert_eq!(
        tables,
        vec![
            Some("widgets".to_string()),
            Some("widgets".to_string()),
            Some("orders".to_string()),
            Some("heavy".to_string()),
        ]
    );
    assert!(entries[0].is_table());
    assert!(!entries[1].is_table());
    assert_eq!(entries[0].root_page(), Some(2));
    assert_eq!(entries[1].root_page(), Some(3));
    assert_eq!(entries[2].root_page(), Some(4));
    assert_eq!(entries[3].root_page(), Some(0));
}

#[test]
fn test_entry_count_includes_every_kind() {
    let mut pager = open(shop());
    assert_eq!(SchemaCatalog::entry_count(&mut pager), 4);
}

#[test]
fn test_empty_schema() {
    let mut pager = open(FixtureBuilder::new());
    assert_eq!(SchemaCatalog::entry_count(&mut pager), 0);
    assert!(SchemaCatalog::entries(&mut pager).is_empty());
    assert!(SchemaCatalog::resolve(&mut pager, "widgets").is_none());
}

#[test]
fn test_resolve_table() {
    let mut pager = open(shop());
    let schema = SchemaCatalog::resolve(&mut pager, "orders").expect("orders");

    assert_eq!(schema.name, "orders");
    assert_eq!(schema.root_page, 4);
    assert_eq!(schema.sql, "CREATE TABLE orders (widget_id, quantity)");
    assert_eq!(
        schema.layout,
        ColumnLayout::new(vec!["widget_id".into(), "quantity".into()], None)
    );
    assert_eq!(schema.btree().root(), 4);
}

#[test]
fn test_resolve_is_case_insensitive() {
    let mut pager = open(shop());
    let schema = SchemaCatalog::resolve(&mut pager, "WIDGETS").expect("widgets");
    assert_eq!(schema.name, "widgets");
    assert_eq!(schema.root_page, 2);
    assert_eq!(schema.layout.row_id_alias(), Some(0));
}

#[test]
fn test_resolve_ignores_views_and_indexes() {
    let mut pager = open(shop());
    assert!(SchemaCatalog::resolve(&mut pager, "heavy").is_none());
    assert!(SchemaCatalog::resolve(&mut pager, "widgets_by_name").is_none());
}

#[test]
fn test_resolve_takes_first_match() {
    let builder = FixtureBuilder::new()
        .table(FixtureTable::new("dup", "CREATE TABLE dup (first)"))
        .table(FixtureTable::new("dup", "CREATE TABLE dup (second)"));
    let mut pager = open(builder);

    let schema = SchemaCatalog::resolve(&mut pager, "dup").expect("dup");
    assert_eq!(schema.root_page, 2);
    assert_eq!(schema.layout.columns(), ["first".to_string()]);
}

#[test]
fn test_resolve_among_many_tables() {
    let mut builder = FixtureBuilder::new();
    for i in 0..20 {
        builder = builder.table(FixtureTable::new(
            format!("t{i}"),
            format!("CREATE TABLE t{i} (a, b)"),
        ));
    }
    let mut pager = open(builder);
    assert_eq!(SchemaCatalog::entry_count(&mut pager), 20);
    let schema = SchemaCatalog::resolve(&mut pager, "t19").expect("t19");
    assert_eq!(schema.root_page, 21);
}

#[test]
fn test_schema_split_across_interior_page_one() {
    let builder = shop()
        .table(FixtureTable::new("extra", "CREATE TABLE extra (id integer primary key, note)"))
        .max_rows_per_leaf(2);
    let mut pager = open(builder);

    // Tables take pages 2 to 5, then the schema leaves 6, 7 and 8 hang off page 1.
    assert_eq!(pager.page_count(), 8);
    let root = pager.read_page(1).unwrap().unwrap();
    assert_eq!(root.page_type(), PageType::InteriorTable);
    assert_eq!(root.cell_count(), 2);
    assert_eq!(root.left_child(0), Some(6));
    assert_eq!(root.left_child(1), Some(7));
    assert_eq!(root.right_child(), Some(8));

    assert_eq!(SchemaCatalog::entry_count(&mut pager), 5);
    let names: Vec<String> = SchemaCatalog::entries(&mut pager)
        .iter()
        .map(|e| e.name.to_string())
        .collect();
    assert_eq!(names, vec!["widgets", "widgets_by_name", "orders", "heavy", "extra"]);

    let extra = SchemaCatalog::resolve(&mut pager, "extra").expect("extra");
    assert_eq!(extra.root_page, 5);
    assert_eq!(extra.layout.row_id_alias(), Some(0));
    assert_eq!(SchemaCatalog::resolve(&mut pager, "orders").expect("orders").root_page, 4);
    assert!(SchemaCatalog::resolve(&mut pager, "heavy").is_none());
}
