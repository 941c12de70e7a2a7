//! Builders for small SQLite-format database files.
//!
//! Tests and benchmarks use these to produce real on-disk databases: a header, the schema
//! table rooted at page 1 and one B-tree per table, each split across as many leaf and
//! interior pages as the configured limits require.

use std::{
    io::{self, Write},
    mem,
};

use tempfile::NamedTempFile;

use crate::{
    storage::SQLITE_MAGIC,
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, MAX_VARINT_LEN, PageNumber,
        RowId, SCHEMA_ROOT_PAGE, SerialTag,
        page::PageType,
        value::{ColumnValue, InvalidKind},
        varint,
    },
};

pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Type byte written for pages that should not parse as B-tree pages.
pub const UNRECOGNIZED_PAGE_TYPE: u8 = 0x07;

const SQLITE_VERSION_NUMBER: u32 = 3_045_000;
const SCHEMA_FORMAT: u32 = 4;
const UTF8_ENCODING: u32 = 1;

// Width declared for `ColumnValue::Invalid` columns, which carry no body.
const MISSING_BODY_LEN: i64 = 100;

/// Serial type tag and body bytes for `value`.
///
/// Integers use the narrowest signed width that holds them. `Invalid` values declare a body
/// they do not have, so they only decode as invalid when they are the last column.
pub fn encode_value(value: &ColumnValue) -> (SerialTag, Vec<u8>) {
    match value {
        ColumnValue::Null => (0, Vec::new()),
        ColumnValue::Integer(i) => {
            let (tag, width) = integer_width(*i);
            (tag, i.to_be_bytes()[8 - width..].to_vec())
        }
        ColumnValue::Float(f) => (7, f.to_be_bytes().to_vec()),
        ColumnValue::Zero => (8, Vec::new()),
        ColumnValue::One => (9, Vec::new()),
        ColumnValue::Reserved(tag) | ColumnValue::Unknown(tag) => (*tag, Vec::new()),
        ColumnValue::Blob(bytes) => (12 + 2 * bytes.len() as i64, bytes.clone()),
        ColumnValue::Text(bytes) => (13 + 2 * bytes.len() as i64, bytes.clone()),
        ColumnValue::Invalid(InvalidKind::Blob) => (12 + 2 * MISSING_BODY_LEN, Vec::new()),
        ColumnValue::Invalid(InvalidKind::Text) => (13 + 2 * MISSING_BODY_LEN, Vec::new()),
        ColumnValue::Invalid(InvalidKind::Number) => (6, Vec::new()),
    }
}

fn integer_width(value: i64) -> (SerialTag, usize) {
    match value {
        v if i8::try_from(v).is_ok() => (1, 1),
        v if i16::try_from(v).is_ok() => (2, 2),
        v if (-(1 << 23)..(1 << 23)).contains(&v) => (3, 3),
        v if i32::try_from(v).is_ok() => (4, 4),
        v if (-(1 << 47)..(1 << 47)).contains(&v) => (5, 6),
        _ => (6, 8),
    }
}

/// Record payload (header followed by column bodies) for `values`.
pub fn encode_record(values: &[ColumnValue]) -> Vec<u8> {
    let mut tags = Vec::new();
    let mut body = Vec::new();
    for value in values {
        let (tag, bytes) = encode_value(value);
        tags.extend(varint::encode(tag));
        body.extend(bytes);
    }

    // The header size counts its own varint.
    let mut header_len = tags.len() + 1;
    while varint::encoded_len(header_len as i64) + tags.len() != header_len {
        header_len = varint::encoded_len(header_len as i64) + tags.len();
    }

    let mut payload = varint::encode(header_len as i64);
    payload.extend(tags);
    payload.extend(body);
    payload
}

/// Table leaf cell: `[varint payload_size][varint row_id][payload]`.
pub fn encode_leaf_cell(row_id: RowId, payload: &[u8]) -> Vec<u8> {
    let mut cell = varint::encode(payload.len() as i64);
    cell.extend(varint::encode(row_id));
    cell.extend_from_slice(payload);
    cell
}

fn encode_interior_cell(left_child: PageNumber, key: RowId) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(varint::encode(key));
    cell
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootShape {
    Rows,
    Unrecognized,
    Cyclic,
}

/// A table to be written by [`FixtureBuilder`].
#[derive(Debug, Clone)]
pub struct FixtureTable {
    name: String,
    sql: String,
    rows: Vec<(RowId, Vec<u8>)>,
    next_row_id: RowId,
    shape: RootShape,
}

impl FixtureTable {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            rows: Vec::new(),
            next_row_id: 1,
            shape: RootShape::Rows,
        }
    }

    /// Append a row with the next row id.
    pub fn row(self, values: impl IntoIterator<Item = ColumnValue>) -> Self {
        let row_id = self.next_row_id;
        self.row_with_id(row_id, values)
    }

    pub fn row_with_id(self, row_id: RowId, values: impl IntoIterator<Item = ColumnValue>) -> Self {
        let values: Vec<ColumnValue> = values.into_iter().collect();
        self.raw_row(row_id, encode_record(&values))
    }

    /// Append a row whose payload is written as given.
    pub fn raw_row(mut self, row_id: RowId, payload: Vec<u8>) -> Self {
        self.rows.push((row_id, payload));
        self.next_row_id = self.next_row_id.max(row_id.saturating_add(1));
        self
    }

    pub fn rows<I>(self, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = ColumnValue>,
    {
        rows.into_iter().fold(self, |table, row| table.row(row))
    }

    /// Point the table at a page whose type byte is not a B-tree page type.
    pub fn unrecognized_root(mut self) -> Self {
        self.shape = RootShape::Unrecognized;
        self
    }

    /// Point the table at an interior page whose right child is itself.
    pub fn cyclic_root(mut self) -> Self {
        self.shape = RootShape::Cyclic;
        self
    }
}

#[derive(Debug, Clone)]
enum SchemaObject {
    Table(FixtureTable),
    Index { name: String, table: String, sql: String },
    View { name: String, sql: String },
}

/// Writes SQLite-format database files.
///
/// ```ignore
/// let file = FixtureBuilder::new()
///     .table(FixtureTable::new("t", "CREATE TABLE t (a)").row(["x".into()]))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    page_size: u32,
    text_encoding: u32,
    max_rows_per_leaf: usize,
    max_interior_fanout: usize,
    objects: Vec<SchemaObject>,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            text_encoding: UTF8_ENCODING,
            max_rows_per_leaf: usize::MAX,
            max_interior_fanout: usize::MAX,
            objects: Vec::new(),
        }
    }

    /// The two-row `widgets` database used throughout the tests.
    pub fn widgets() -> Self {
        Self::new().table(
            FixtureTable::new(
                "widgets",
                "CREATE TABLE widgets (id integer primary key, name text, weight real)",
            )
            .row([ColumnValue::Null, "apple".into(), 1.5.into()])
            .row([ColumnValue::Null, "banana".into(), 2.0.into()]),
        )
    }

    /// Page size written to the header. Values outside what readers accept are written as-is.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn text_encoding(mut self, text_encoding: u32) -> Self {
        self.text_encoding = text_encoding;
        self
    }

    /// Start a new leaf page after this many rows, even when more would fit. Applies to the
    /// schema table too, so enough schema entries turn page 1 into an interior page.
    pub fn max_rows_per_leaf(mut self, rows: usize) -> Self {
        self.max_rows_per_leaf = rows.max(1);
        self
    }

    /// Limit the number of children per interior page.
    pub fn max_interior_fanout(mut self, children: usize) -> Self {
        self.max_interior_fanout = children.max(2);
        self
    }

    pub fn table(mut self, table: FixtureTable) -> Self {
        self.objects.push(SchemaObject::Table(table));
        self
    }

    /// Add an index entry backed by an empty index leaf page.
    pub fn index(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        self.objects.push(SchemaObject::Index {
            name: name.into(),
            table: table.into(),
            sql: sql.into(),
        });
        self
    }

    /// Add a view entry; views have no B-tree and a root page of 0.
    pub fn view(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.objects.push(SchemaObject::View {
            name: name.into(),
            sql: sql.into(),
        });
        self
    }

    /// The complete database image.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut pages = vec![self.blank_page()];
        let mut schema_rows = Vec::with_capacity(self.objects.len());

        for object in &self.objects {
            let row = match object {
                SchemaObject::Table(table) => {
                    let root = self.write_table(&mut pages, table)?;
                    schema_row("table", &table.name, &table.name, root, &table.sql)
                }
                SchemaObject::Index { name, table, sql } => {
                    let root = self.allocate(&mut pages);
                    let page = page_mut(&mut pages, root);
                    write_btree_page(page, 0, PageType::LeafIndex, &[], None)?;
                    schema_row("index", name, table, root, sql)
                }
                SchemaObject::View { name, sql } => schema_row("view", name, name, 0, sql),
            };
            schema_rows.push(row);
        }

        let schema_cells = schema_rows
            .iter()
            .zip(1..)
            .map(|(payload, row_id)| (row_id, encode_leaf_cell(row_id, payload)))
            .collect();
        self.write_tree(&mut pages, schema_cells, Some(SCHEMA_ROOT_PAGE))?;
        let page_count = pages.len();
        self.write_header(&mut pages[0], page_count);

        Ok(pages.concat())
    }

    /// Write the database to a new temporary file, removed when the handle drops.
    pub fn build(&self) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("litereader_")
            .suffix(".db")
            .tempfile()?;
        file.write_all(&self.to_bytes()?)?;
        file.flush()?;
        Ok(file)
    }

    fn blank_page(&self) -> Vec<u8> {
        vec![0u8; self.page_size as usize]
    }

    fn allocate(&self, pages: &mut Vec<Vec<u8>>) -> PageNumber {
        pages.push(self.blank_page());
        pages.len() as PageNumber
    }

    fn write_table(&self, pages: &mut Vec<Vec<u8>>, table: &FixtureTable) -> io::Result<PageNumber> {
        match table.shape {
            RootShape::Unrecognized => {
                let root = self.allocate(pages);
                page_mut(pages, root)[0] = UNRECOGNIZED_PAGE_TYPE;
                return Ok(root);
            }
            RootShape::Cyclic => {
                let root = self.allocate(pages);
                let page = page_mut(pages, root);
                write_btree_page(page, 0, PageType::InteriorTable, &[], Some(root))?;
                return Ok(root);
            }
            RootShape::Rows => {}
        }

        let mut rows = table.rows.clone();
        rows.sort_by_key(|(row_id, _)| *row_id);
        let cells = rows
            .iter()
            .map(|(row_id, payload)| (*row_id, encode_leaf_cell(*row_id, payload)))
            .collect();
        self.write_tree(pages, cells, None)
    }

    /// Write a table B-tree holding `cells` and return its root page.
    ///
    /// With `fixed_root`, the root is written to that page instead of a new one. Page 1 keeps
    /// its first 100 bytes for the database header.
    fn write_tree(
        &self,
        pages: &mut Vec<Vec<u8>>,
        cells: Vec<(RowId, Vec<u8>)>,
        fixed_root: Option<PageNumber>,
    ) -> io::Result<PageNumber> {
        let root_body_start = match fixed_root {
            Some(SCHEMA_ROOT_PAGE) => HEADER_SIZE,
            _ => 0,
        };
        let leaf_header = PageType::LeafTable.header_size() + root_body_start;
        let groups = self.pack(cells, leaf_header, self.max_rows_per_leaf)?;

        if let (Some(root), [group]) = (fixed_root, groups.as_slice()) {
            let cells: Vec<Vec<u8>> = group.iter().map(|(_, cell)| cell.clone()).collect();
            let page = page_mut(pages, root);
            write_btree_page(page, root_body_start, PageType::LeafTable, &cells, None)?;
            return Ok(root);
        }

        // (page, largest row id in its subtree)
        let mut level = Vec::new();
        for group in groups {
            let page_number = self.allocate(pages);
            let max_key = group.last().map_or(0, |(row_id, _)| *row_id);
            let cells: Vec<Vec<u8>> = group.into_iter().map(|(_, cell)| cell).collect();
            write_btree_page(page_mut(pages, page_number), 0, PageType::LeafTable, &cells, None)?;
            level.push((page_number, max_key));
        }

        let capacity = (self.page_size as usize - INTERIOR_PAGE_HEADER_SIZE - root_body_start)
            / (CELL_POINTER_SIZE + 4 + MAX_VARINT_LEN)
            + 1;
        let fanout = self.max_interior_fanout.min(capacity).max(2);

        loop {
            let top_level = match fixed_root {
                Some(_) => level.len() <= fanout,
                None => level.len() <= 1,
            };
            if top_level {
                break;
            }

            let mut parents = Vec::with_capacity(level.len().div_ceil(fanout));
            for children in level.chunks(fanout) {
                let page_number = self.allocate(pages);
                let max_key = write_interior(page_mut(pages, page_number), 0, children)?;
                parents.push((page_number, max_key));
            }
            level = parents;
        }

        match fixed_root {
            Some(root) => {
                write_interior(page_mut(pages, root), root_body_start, &level)?;
                Ok(root)
            }
            None => Ok(level.first().map_or(0, |&(root, _)| root)),
        }
    }

    /// Split cells into page-sized groups; always returns at least one (possibly empty) group.
    fn pack(
        &self,
        cells: Vec<(RowId, Vec<u8>)>,
        header_size: usize,
        max_per_page: usize,
    ) -> io::Result<Vec<Vec<(RowId, Vec<u8>)>>> {
        let page_size = self.page_size as usize;
        let mut groups = Vec::new();
        let mut current = Vec::new();
        let mut used = header_size;

        for (key, cell) in cells {
            let needed = cell.len() + CELL_POINTER_SIZE;
            if header_size + needed > page_size {
                return Err(cell_too_large(needed, page_size));
            }
            if current.len() == max_per_page || used + needed > page_size {
                groups.push(mem::take(&mut current));
                used = header_size;
            }
            used += needed;
            current.push((key, cell));
        }
        if !current.is_empty() || groups.is_empty() {
            groups.push(current);
        }
        Ok(groups)
    }

    fn write_header(&self, page: &mut [u8], page_count: usize) {
        page[..16].copy_from_slice(SQLITE_MAGIC);
        let raw_page_size = if self.page_size == 65536 {
            1
        } else {
            self.page_size as u16
        };
        page[16..18].copy_from_slice(&raw_page_size.to_be_bytes());
        page[18] = 1;
        page[19] = 1;
        page[20] = 0;
        page[21] = 64;
        page[22] = 32;
        page[23] = 32;
        put_u32(page, 24, 1);
        put_u32(page, 28, page_count as u32);
        put_u32(page, 40, 1);
        put_u32(page, 44, SCHEMA_FORMAT);
        put_u32(page, 56, self.text_encoding);
        put_u32(page, 92, 1);
        put_u32(page, 96, SQLITE_VERSION_NUMBER);
    }
}

fn schema_row(kind: &str, name: &str, table: &str, root: PageNumber, sql: &str) -> Vec<u8> {
    encode_record(&[
        kind.into(),
        name.into(),
        table.into(),
        ColumnValue::Integer(root as i64),
        sql.into(),
    ])
}

fn page_mut(pages: &mut [Vec<u8>], page: PageNumber) -> &mut [u8] {
    &mut pages[page as usize - 1]
}

/// Interior page over `children`: every child but the last gets a cell keyed by the largest
/// row id beneath it, the last becomes the right-most child. Returns the largest key.
fn write_interior(
    page: &mut [u8],
    body_start: usize,
    children: &[(PageNumber, RowId)],
) -> io::Result<RowId> {
    let Some((&(right_child, max_key), rest)) = children.split_last() else {
        return Ok(0);
    };
    let cells: Vec<Vec<u8>> = rest
        .iter()
        .map(|&(child, key)| encode_interior_cell(child, key))
        .collect();
    write_btree_page(page, body_start, PageType::InteriorTable, &cells, Some(right_child))?;
    Ok(max_key)
}

/// Lay out a B-tree page whose header starts at `body_start`. Cells are packed from the
/// end of the page backwards; their pointers are page-relative.
fn write_btree_page(
    page: &mut [u8],
    body_start: usize,
    page_type: PageType,
    cells: &[Vec<u8>],
    right_child: Option<PageNumber>,
) -> io::Result<()> {
    let header_size = page_type.header_size();
    let pointers_end = body_start + header_size + CELL_POINTER_SIZE * cells.len();
    let mut content_start = page.len();

    for (index, cell) in cells.iter().enumerate() {
        if content_start < pointers_end + cell.len() {
            return Err(cell_too_large(cell.len(), page.len()));
        }
        content_start -= cell.len();
        page[content_start..content_start + cell.len()].copy_from_slice(cell);
        let pointer = body_start + header_size + CELL_POINTER_SIZE * index;
        page[pointer..pointer + CELL_POINTER_SIZE]
            .copy_from_slice(&(content_start as u16).to_be_bytes());
    }

    page[body_start] = page_type.as_u8();
    page[body_start + 1..body_start + 3].copy_from_slice(&0u16.to_be_bytes());
    page[body_start + 3..body_start + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    // 65536 wraps to 0, which is how the format spells it.
    page[body_start + 5..body_start + 7].copy_from_slice(&(content_start as u16).to_be_bytes());
    page[body_start + 7] = 0;
    if let Some(right_child) = right_child {
        put_u32(page, body_start + 8, right_child);
    }
    Ok(())
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn cell_too_large(needed: usize, page_size: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} bytes of cell data do not fit in a {} byte page", needed, page_size),
    )
}
