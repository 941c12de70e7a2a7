use crate::types::{
    CELL_POINTER_SIZE, HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE, PageNumber,
    SCHEMA_ROOT_PAGE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(PageType::InteriorIndex),
            5 => Some(PageType::InteriorTable),
            10 => Some(PageType::LeafIndex),
            13 => Some(PageType::LeafTable),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }

    pub fn header_size(&self) -> usize {
        if self.is_leaf() {
            LEAF_PAGE_HEADER_SIZE
        } else {
            INTERIOR_PAGE_HEADER_SIZE
        }
    }
}

/*
 * B-tree page layout (table pages)
 * ┌──────────────────────────────────────────────────────────────┐
 * │ [page 1 only] DATABASE HEADER (100 bytes)                    │
 * ├──────────────────────────────────────────────────────────────┤
 * │ PAGE HEADER (8 bytes leaf / 12 bytes interior)               │
 * │  type(1) | first_freeblock(2) | cell_count(2) |              │
 * │  content_start(2) | fragmented(1) | [right_child(4)]         │
 * ├──────────────────────────────────────────────────────────────┤
 * │ CELL POINTER ARRAY: cell_count x u16, offsets from page start│
 * ├──────────────────────────────────────────────────────────────┤
 * │ UNALLOCATED SPACE                                            │
 * ├──────────────────────────────────────────────────────────────┤
 * │ CELL CONTENT AREA                                            │
 * └──────────────────────────────────────────────────────────────┘
 */

/// The fixed header at the start of a B-tree page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    pub cell_content_start: u16,
    pub fragmented_free_bytes: u8,
    pub right_child: Option<PageNumber>,
}

impl PageHeader {
    /// Parse a page header. Returns `None` when the type tag is not a B-tree page type.
    ///
    /// `bytes` must hold at least 8 bytes, 12 for interior pages.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let page_type = PageType::from_u8(*bytes.first()?)?;
        if bytes.len() < page_type.header_size() {
            return None;
        }

        let right_child = if page_type.is_leaf() {
            None
        } else {
            Some(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]))
        };

        Some(Self {
            page_type,
            first_freeblock: u16::from_be_bytes([bytes[1], bytes[2]]),
            cell_count: u16::from_be_bytes([bytes[3], bytes[4]]),
            cell_content_start: u16::from_be_bytes([bytes[5], bytes[6]]),
            fragmented_free_bytes: bytes[7],
            right_child,
        })
    }

    /// Bytes taken by this header: 8 on leaf pages, 12 on interior pages.
    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }

    /// Offset of the `index`-th cell pointer, relative to the page body start.
    pub fn cell_pointer_offset(&self, index: usize) -> usize {
        self.size() + CELL_POINTER_SIZE * index
    }
}

/// A B-tree page loaded into memory.
///
/// Offsets handed out by this type are relative to the start of the page. On page 1
/// the page body (and with it the page header) begins after the database header, but
/// cell pointers are still relative to the page start.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: PageNumber,
    pub header: PageHeader,
    pub data: Vec<u8>,
    body_start: usize,
}

impl Page {
    /// Returns `None` for pages whose type tag is not a B-tree page type.
    pub fn from_bytes(number: PageNumber, data: Vec<u8>) -> Option<Self> {
        let body_start = if number == SCHEMA_ROOT_PAGE { HEADER_SIZE } else { 0 };
        let header = PageHeader::from_bytes(data.get(body_start..)?)?;
        Some(Self {
            number,
            header,
            data,
            body_start,
        })
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn cell_count(&self) -> usize {
        self.header.cell_count as usize
    }

    /// Page-relative offset of the `index`-th cell, read from the cell pointer array.
    pub fn cell_offset(&self, index: usize) -> Option<usize> {
        let at = self.body_start + self.header.cell_pointer_offset(index);
        let pointer = self.data.get(at..at + CELL_POINTER_SIZE)?;
        Some(u16::from_be_bytes([pointer[0], pointer[1]]) as usize)
    }

    /// Left child page number stored at the start of the `index`-th interior cell.
    pub fn left_child(&self, index: usize) -> Option<PageNumber> {
        let at = self.cell_offset(index)?;
        let child = self.data.get(at..at + 4)?;
        Some(u32::from_be_bytes([child[0], child[1], child[2], child[3]]))
    }

    pub fn right_child(&self) -> Option<PageNumber> {
        self.header.right_child
    }
}
