use std::{
    collections::HashSet,
    io::{Read, Seek},
    ops::ControlFlow,
};

use tracing::{debug, warn};

use crate::{
    storage::{pager::Pager, record::Record},
    types::{
        PageNumber,
        page::{Page, PageType},
    },
};

/// Read-only view of a table B-tree rooted at `root`.
///
/// Traversal is in-order: the children of an interior page are visited left to right and
/// the right-most child last, so leaves (and the rows in them) come out in row-id order.
/// Pages that cannot be read or that are not table pages contribute nothing; the walk
/// carries on with their siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBTree {
    root: PageNumber,
}

impl TableBTree {
    pub fn new(root: PageNumber) -> Self {
        Self { root }
    }

    pub fn root(&self) -> PageNumber {
        self.root
    }

    /// Visit every table leaf page reachable from the root.
    pub fn walk_leaves<R, F>(&self, pager: &mut Pager<R>, mut visit: F)
    where
        R: Read + Seek,
        F: FnMut(&Page) -> ControlFlow<()>,
    {
        let mut stack = vec![self.root];
        let mut visited = HashSet::new();

        while let Some(page_number) = stack.pop() {
            if !visited.insert(page_number) {
                warn!(page = page_number, "Page reached twice, skipping cycle");
                continue;
            }

            let page = match pager.read_page(page_number) {
                Ok(Some(page)) => page,
                Ok(None) => {
                    debug!(page = page_number, "Skipping page with unrecognized type");
                    continue;
                }
                Err(e) => {
                    warn!(page = page_number, "Failed to read page: {}", e);
                    continue;
                }
            };

            match page.page_type() {
                PageType::LeafTable => {
                    if visit(&page).is_break() {
                        return;
                    }
                }
                PageType::InteriorTable => {
                    let children = Self::children(&page);
                    // Reversed so the left-most child is popped first.
                    stack.extend(children.into_iter().rev());
                }
                PageType::LeafIndex | PageType::InteriorIndex => {
                    debug!(page = page_number, "Skipping index page");
                }
            }
        }
    }

    /// Visit every row of the table in traversal order.
    pub fn walk<R, F>(&self, pager: &mut Pager<R>, mut visit: F)
    where
        R: Read + Seek,
        F: FnMut(Record) -> ControlFlow<()>,
    {
        self.walk_leaves(pager, |page| {
            for index in 0..page.cell_count() {
                let Some(offset) = page.cell_offset(index) else {
                    warn!(page = page.number, index, "Cell pointer outside page");
                    continue;
                };
                match Record::from_leaf_cell(page, offset) {
                    Ok(record) => visit(record)?,
                    Err(e) => warn!(page = page.number, index, "Skipping cell: {}", e),
                }
            }
            ControlFlow::Continue(())
        });
    }

    /// Number of rows in the table: the sum of the cell counts of all leaf pages.
    pub fn count_rows<R: Read + Seek>(&self, pager: &mut Pager<R>) -> usize {
        let mut count = 0;
        self.walk_leaves(pager, |page| {
            count += page.cell_count();
            ControlFlow::Continue(())
        });
        count
    }

    fn children(page: &Page) -> Vec<PageNumber> {
        let mut children = Vec::with_capacity(page.cell_count() + 1);
        for index in 0..page.cell_count() {
            match page.left_child(index) {
                Some(child) => children.push(child),
                None => warn!(page = page.number, index, "Interior cell outside page"),
            }
        }
        if let Some(right) = page.right_child() {
            children.push(right);
        }
        children
    }
}
