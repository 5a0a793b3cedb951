//! The table: the single collaborator the REPL talks to for everything
//! that touches disk.
//!
//! A table owns the pager and the page number of its current root, and
//! exposes the handful of operations the statement executor needs:
//! insert, select, open, close, and the two introspection commands
//! (`.btree`, `.constants`).

use tracing::info;

use crate::errors::Error;
use crate::storage::btree;
use crate::storage::cursor::Cursor;
use crate::storage::node::{
    NodeType, INTERNAL_MAX_CELLS, LEAF_LEFT_SPLIT_COUNT, LEAF_MAX_CELLS, LEAF_RIGHT_SPLIT_COUNT,
    PAGE_SIZE, TABLE_MAX_PAGES,
};
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// Page 0 is always the root page number. A root split relocates the
/// old root's *data* to a fresh page and rewrites page 0 as the new
/// internal root; the page number itself never moves.
const ROOT_PAGE_NUM: u32 = 0;

#[derive(Debug)]
pub struct Table {
    pager: Pager,
    root_page_num: u32,
}

impl Table {
    /// Opens the database file at `path`, initializing a fresh empty leaf
    /// root if the file is new.
    pub fn open(path: &str) -> Result<Table, Error> {
        let mut pager = Pager::open(path)?;
        if pager.num_pages() == 0 {
            let mut root = pager.get_page(ROOT_PAGE_NUM)?.borrow_mut();
            root.initialize_leaf();
            root.set_is_root(true);
        }
        Ok(Table {
            pager,
            root_page_num: ROOT_PAGE_NUM,
        })
    }

    /// Flushes every page to disk. Matches the close protocol's
    /// requirement that no writes may be reordered past this point.
    pub fn close(&mut self) -> Result<(), Error> {
        self.pager.flush_all()?;
        info!(num_pages = self.pager.num_pages(), "closed table");
        Ok(())
    }

    /// Refuses the insert up front if it could possibly need more pages
    /// than the table has room for, rather than letting a split started
    /// partway through the tree fail with a fatal `PageOutOfBounds`.
    pub fn insert(&mut self, row: &Row) -> Result<(), Error> {
        if self.pager.num_pages() + btree::INSERT_WORST_CASE_NEW_PAGES > TABLE_MAX_PAGES as u32 {
            return Err(Error::TableFull);
        }
        btree::insert(&mut self.pager, self.root_page_num, row.id, row)
    }

    /// Returns every row in ascending key order, regardless of the order
    /// rows were inserted in.
    pub fn select(&mut self) -> Result<Vec<Row>, Error> {
        let mut rows = Vec::new();
        let mut cursor = Cursor::start(&mut self.pager, self.root_page_num)?;
        while !cursor.is_end() {
            rows.push(cursor.value(&mut self.pager)?);
            cursor.advance(&mut self.pager)?;
        }
        Ok(rows)
    }

    /// Renders the tree structure for the `.btree` meta-command: one
    /// line per node, indented by depth, leaves listing their keys.
    pub fn print_tree(&mut self) -> Result<String, Error> {
        let mut out = String::new();
        self.print_node(self.root_page_num, 0, &mut out)?;
        Ok(out)
    }

    fn print_node(&mut self, page_num: u32, indent: usize, out: &mut String) -> Result<(), Error> {
        let pad = "  ".repeat(indent);
        let node_type = self.pager.get_page(page_num)?.borrow().node_type()?;
        match node_type {
            NodeType::Leaf => {
                let page = self.pager.get_page(page_num)?.borrow();
                let num_cells = page.leaf_num_cells();
                out.push_str(&format!("{pad}- leaf (size {num_cells})\n"));
                for i in 0..num_cells as usize {
                    out.push_str(&format!("{pad}  - {}\n", page.leaf_key(i)));
                }
            }
            NodeType::Internal => {
                let (num_keys, children): (u32, Vec<u32>) = {
                    let page = self.pager.get_page(page_num)?.borrow();
                    let num_keys = page.internal_num_keys();
                    let children = (0..num_keys)
                        .map(|i| page.internal_child(i as usize))
                        .chain(std::iter::once(page.internal_right_child()))
                        .collect();
                    (num_keys, children)
                };
                out.push_str(&format!("{pad}- internal (size {num_keys})\n"));
                for (i, child) in children.iter().enumerate() {
                    self.print_node(*child, indent + 1, out)?;
                    if i < num_keys as usize {
                        let key = self.pager.get_page(page_num)?.borrow().internal_key(i);
                        out.push_str(&format!("{pad}  - key {key}\n"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders the layout constants for the `.constants` meta-command.
    pub fn print_constants() -> String {
        format!(
            "ROW_SIZE: {}\n\
             COMMON_NODE_HEADER_SIZE: 6\n\
             LEAF_NODE_HEADER_SIZE: 14\n\
             LEAF_NODE_CELL_SIZE: {}\n\
             LEAF_NODE_SPACE_FOR_CELLS: {}\n\
             LEAF_NODE_MAX_CELLS: {}\n\
             LEAF_NODE_LEFT_SPLIT_COUNT: {}\n\
             LEAF_NODE_RIGHT_SPLIT_COUNT: {}\n\
             INTERNAL_NODE_MAX_CELLS: {}\n\
             PAGE_SIZE: {}",
            crate::storage::row::ROW_SIZE,
            4 + crate::storage::row::ROW_SIZE,
            PAGE_SIZE - 14,
            LEAF_MAX_CELLS,
            LEAF_LEFT_SPLIT_COUNT,
            LEAF_RIGHT_SPLIT_COUNT,
            INTERNAL_MAX_CELLS,
            PAGE_SIZE,
        )
    }
}
