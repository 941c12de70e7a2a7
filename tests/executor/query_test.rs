use std::io::Cursor;

use litereader::{
    executor::{DbInfo, QueryExecutor, QueryOutput},
    planner::{CommandParser, Condition, Projection},
    storage::{header::TextEncoding, pager::Pager},
    types::{
        error::DatabaseError,
        value::{ColumnValue, InvalidKind},
    },
    utils::mock::{FixtureBuilder, FixtureTable, encode_record},
};

fn executor(builder: FixtureBuilder) -> QueryExecutor<Cursor<Vec<u8>>> {
    let pager = Pager::new(Cursor::new(builder.to_bytes().unwrap())).unwrap();
    QueryExecutor::new(pager)
}

fn columns(names: &[&str]) -> Projection {
    Projection::Columns(names.iter().map(|n| n.to_string()).collect())
}

fn run(executor: &mut QueryExecutor<Cursor<Vec<u8>>>, input: &str) -> Result<String, DatabaseError> {
    let command = CommandParser::new().parse(input)?;
    Ok(executor.execute(&command)?.to_string())
}

fn apples() -> FixtureBuilder {
    FixtureBuilder::new().table(
        FixtureTable::new(
            "apples",
            "CREATE TABLE apples\n(\n\tid integer primary key autoincrement,\n\tname text,\n\tcolor text\n)",
        )
        .row([ColumnValue::Null, "Granny Smith".into(), "Light Green".into()])
        .row([ColumnValue::Null, "Fuji".into(), "Red".into()])
        .row([ColumnValue::Null, "Honeycrisp".into(), "Blush Red".into()])
        .row([ColumnValue::Null, "Golden Delicious".into(), "Yellow".into()]),
    )
}

#[test]
fn test_widgets_walkthrough() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::widgets());

    assert_eq!(executor.list_tables(), vec!["widgets".to_string()]);
    assert_eq!(executor.count_rows("widgets"), 2);
    assert_eq!(
        executor.select_columns("widgets", &columns(&["name"]), None)?,
        vec!["apple", "banana"]
    );
    assert_eq!(
        executor.select_columns(
            "widgets",
            &columns(&["name"]),
            Some(&Condition::new("id", "2"))
        )?,
        vec!["banana"]
    );
    Ok(())
}

#[test]
fn test_db_info() {
    let mut executor = executor(apples().index("idx", "apples", "CREATE INDEX idx ON apples (name)"));
    let info = executor.db_info();
    assert_eq!(
        info,
        DbInfo {
            page_size: 4096,
            table_count: 2,
            page_count: 3,
            text_encoding: Some(TextEncoding::Utf8),
        }
    );
    assert_eq!(
        info.to_string(),
        "database page size: 4096\nnumber of tables: 2"
    );
}

#[test]
fn test_db_info_reports_encoding() {
    let mut executor = executor(FixtureBuilder::widgets().text_encoding(2));
    assert_eq!(executor.db_info().text_encoding, Some(TextEncoding::Utf16le));
}

#[test]
fn test_list_tables_includes_every_named_entry() {
    let builder = apples()
        .index("apples_name", "apples", "CREATE INDEX apples_name ON apples (name)")
        .table(FixtureTable::new("oranges", "CREATE TABLE oranges (id integer primary key, name text)"));
    let mut executor = executor(builder);
    assert_eq!(executor.list_tables(), vec!["apples", "apples", "oranges"]);
    assert_eq!(run(&mut executor, ".tables").unwrap(), "apples apples oranges");
}

#[test]
fn test_empty_database() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::new());
    assert!(executor.list_tables().is_empty());
    assert_eq!(executor.db_info().table_count, 0);
    assert_eq!(run(&mut executor, ".tables")?, "");
    Ok(())
}

#[test]
fn test_count_rows_of_missing_table_is_zero() {
    let mut executor = executor(apples());
    assert_eq!(executor.count_rows("pears"), 0);
}

#[test]
fn test_select_from_missing_table_is_empty() -> Result<(), DatabaseError> {
    let mut executor = executor(apples());
    assert!(executor.select_columns("pears", &columns(&["name"]), None)?.is_empty());
    Ok(())
}

#[test]
fn test_select_multiple_columns_with_separator() -> Result<(), DatabaseError> {
    let mut executor = executor(apples());
    assert_eq!(
        executor.select_columns("apples", &columns(&["name", "color"]), None)?,
        vec![
            "Granny Smith|Light Green",
            "Fuji|Red",
            "Honeycrisp|Blush Red",
            "Golden Delicious|Yellow",
        ]
    );

    let mut executor = executor.with_separator(", ");
    assert_eq!(
        executor.select_columns("apples", &columns(&["color", "id"]), None)?,
        vec!["Light Green, 1", "Red, 2", "Blush Red, 3", "Yellow, 4"]
    );
    Ok(())
}

#[test]
fn test_select_where_on_text_column() -> Result<(), DatabaseError> {
    let mut executor = executor(apples());
    assert_eq!(
        run(&mut executor, "SELECT name, color FROM apples WHERE color = 'Yellow'")?,
        "Golden Delicious|Yellow"
    );
    // Comparison is exact on the stored text.
    assert_eq!(
        run(&mut executor, "SELECT name FROM apples WHERE color = 'yellow'")?,
        ""
    );
    Ok(())
}

#[test]
fn test_where_column_need_not_be_projected() -> Result<(), DatabaseError> {
    let mut executor = executor(apples());
    assert_eq!(
        executor.select_columns(
            "apples",
            &columns(&["id"]),
            Some(&Condition::new("name", "Fuji"))
        )?,
        vec!["2"]
    );
    Ok(())
}

#[test]
fn test_row_id_alias_uses_row_id() -> Result<(), DatabaseError> {
    let table = FixtureTable::new("events", "CREATE TABLE events (name text, seq INTEGER PRIMARY KEY)")
        .row_with_id(10, ["start".into(), ColumnValue::Null])
        .row_with_id(42, ["stop".into(), ColumnValue::Null]);
    let mut executor = executor(FixtureBuilder::new().table(table));

    assert_eq!(
        executor.select_columns("events", &columns(&["seq", "name"]), None)?,
        vec!["10|start", "42|stop"]
    );
    assert_eq!(
        executor.select_columns("events", &columns(&["name"]), Some(&Condition::new("seq", "42")))?,
        vec!["stop"]
    );
    Ok(())
}

#[test]
fn test_without_alias_stored_values_are_used() -> Result<(), DatabaseError> {
    let table = FixtureTable::new("plain", "CREATE TABLE plain (id integer, name text)")
        .row_with_id(7, [ColumnValue::Integer(100), "x".into()]);
    let mut executor = executor(FixtureBuilder::new().table(table));
    assert_eq!(
        executor.select_columns("plain", &columns(&["id", "name"]), None)?,
        vec!["100|x"]
    );
    Ok(())
}

#[test]
fn test_select_star() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::widgets());
    assert_eq!(
        run(&mut executor, "SELECT * FROM widgets")?,
        "1|apple|1.5\n2|banana|2.0"
    );
    Ok(())
}

#[test]
fn test_select_values_keeps_decoded_types() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::widgets());
    let rows = executor.select_values("widgets", &columns(&["weight", "id"]), None)?;
    assert_eq!(
        rows,
        vec![
            vec![ColumnValue::Float(1.5), ColumnValue::Integer(1)],
            vec![ColumnValue::Float(2.0), ColumnValue::Integer(2)],
        ]
    );
    Ok(())
}

#[test]
fn test_unknown_column_is_an_error() {
    let mut executor = executor(FixtureBuilder::widgets());
    let result = executor.select_columns("widgets", &columns(&["price"]), None);
    assert!(matches!(
        result,
        Err(DatabaseError::ColumnNotFound { name, table }) if name == "price" && table == "widgets"
    ));

    let result = executor.select_columns(
        "widgets",
        &columns(&["name"]),
        Some(&Condition::new("price", "1")),
    );
    assert!(matches!(result, Err(DatabaseError::ColumnNotFound { .. })));
}

#[test]
fn test_table_and_column_names_are_case_insensitive() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::widgets());
    assert_eq!(run(&mut executor, "SELECT NAME FROM Widgets WHERE ID = 1")?, "apple");
    assert_eq!(run(&mut executor, "SELECT COUNT(*) FROM WIDGETS")?, "2");
    Ok(())
}

#[test]
fn test_short_rows_read_missing_columns_as_null() -> Result<(), DatabaseError> {
    // Rows written before `note` was added have no value for it.
    let table = FixtureTable::new("items", "CREATE TABLE items (name text, note text)")
        .row(["old".into()])
        .row(["new".into(), "fresh".into()]);
    let mut executor = executor(FixtureBuilder::new().table(table));
    assert_eq!(
        executor.select_columns("items", &columns(&["name", "note"]), None)?,
        vec!["old|", "new|fresh"]
    );
    Ok(())
}

#[test]
fn test_invalid_and_blob_values_render_as_sentinels() -> Result<(), DatabaseError> {
    let table = FixtureTable::new("odd", "CREATE TABLE odd (a, b)")
        .row([ColumnValue::Blob(vec![1, 2, 3]), ColumnValue::Invalid(InvalidKind::Text)])
        .raw_row(2, encode_record(&["ok".into(), ColumnValue::Invalid(InvalidKind::Blob)]));
    let mut executor = executor(FixtureBuilder::new().table(table));
    assert_eq!(
        executor.select_columns("odd", &Projection::All, None)?,
        vec!["BLOB(3 bytes)|Invalid String", "ok|Invalid BLOB"]
    );
    Ok(())
}

#[test]
fn test_multi_level_table() -> Result<(), DatabaseError> {
    let table = FixtureTable::new("series", "CREATE TABLE series (id integer primary key, square integer)")
        .rows((1..=200).map(|n: i64| [ColumnValue::Null, ColumnValue::Integer(n * n)]));
    let builder = FixtureBuilder::new()
        .max_rows_per_leaf(7)
        .max_interior_fanout(4)
        .table(table);
    let mut executor = executor(builder);

    assert_eq!(executor.count_rows("series"), 200);
    let squares = executor.select_columns("series", &columns(&["square"]), None)?;
    assert_eq!(squares.len(), 200);
    assert_eq!(squares.first().map(String::as_str), Some("1"));
    assert_eq!(squares.last().map(String::as_str), Some("40000"));
    assert_eq!(
        executor.select_columns("series", &columns(&["id"]), Some(&Condition::new("square", "1444")))?,
        vec!["38"]
    );
    Ok(())
}

#[test]
fn test_schema_spanning_several_pages() -> Result<(), DatabaseError> {
    let mut builder = apples().max_rows_per_leaf(3);
    for name in ["pears", "plums", "figs", "limes", "kiwis"] {
        builder = builder.table(
            FixtureTable::new(name, format!("CREATE TABLE {name} (id integer primary key, name text)"))
                .row([ColumnValue::Null, name.into()]),
        );
    }
    let mut executor = executor(builder);

    assert_eq!(
        executor.list_tables(),
        vec!["apples", "pears", "plums", "figs", "limes", "kiwis"]
    );
    assert_eq!(executor.db_info().table_count, 6);
    assert_eq!(executor.count_rows("apples"), 4);
    assert_eq!(run(&mut executor, "SELECT name FROM kiwis")?, "kiwis");
    assert_eq!(
        executor.select_columns("apples", &columns(&["name"]), Some(&Condition::new("color", "Red")))?,
        vec!["Fuji"]
    );
    Ok(())
}

#[test]
fn test_unrecognized_root_page_yields_no_rows() -> Result<(), DatabaseError> {
    let table = FixtureTable::new("broken", "CREATE TABLE broken (a)")
        .row(["never seen".into()])
        .unrecognized_root();
    let mut executor = executor(FixtureBuilder::widgets().table(table));

    assert_eq!(executor.count_rows("broken"), 0);
    assert!(executor.select_columns("broken", &Projection::All, None)?.is_empty());
    // Other tables are unaffected.
    assert_eq!(executor.count_rows("widgets"), 2);
    Ok(())
}

#[test]
fn test_execute_outputs() -> Result<(), DatabaseError> {
    let mut executor = executor(FixtureBuilder::widgets());
    let parser = CommandParser::new();

    let output = executor.execute(&parser.parse(".tables")?)?;
    assert_eq!(output, QueryOutput::Tables(vec!["widgets".to_string()]));

    let output = executor.execute(&parser.parse("SELECT COUNT(*) FROM widgets")?)?;
    assert_eq!(output, QueryOutput::Count(2));

    let output = executor.execute(&parser.parse("SELECT name, weight FROM widgets WHERE name = 'apple'")?)?;
    assert_eq!(output, QueryOutput::Rows(vec!["apple|1.5".to_string()]));

    let output = executor.execute(&parser.parse(".dbinfo")?)?;
    assert!(matches!(output, QueryOutput::DbInfo(DbInfo { table_count: 1, .. })));
    Ok(())
}

#[test]
fn test_open_file_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let file = FixtureBuilder::widgets().build()?;
    let mut executor = QueryExecutor::new(Pager::open(file.path())?);
    assert_eq!(executor.list_tables(), vec!["widgets"]);
    assert_eq!(executor.count_rows("widgets"), 2);
    Ok(())
}
