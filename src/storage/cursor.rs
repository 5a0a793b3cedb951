//! # Database Cursor Module
//!
//! A cursor tracks one position within the table's ordered key space and
//! knows how to step forward across leaf boundaries via each leaf's
//! `next_leaf` sibling pointer. Callers never address pages directly.

use crate::errors::Error;
use crate::storage::btree;
use crate::storage::pager::Pager;
use crate::storage::row::Row;

pub struct Cursor {
    page_num: u32,
    cell_num: usize,
    end_of_table: bool,
}

impl Cursor {
    /// Positions the cursor at the smallest key in the table: the
    /// leftmost leaf's first cell.
    pub fn start(pager: &mut Pager, root_page_num: u32) -> Result<Cursor, Error> {
        let page_num = leftmost_leaf(pager, root_page_num)?;
        let num_cells = pager.get_page(page_num)?.borrow().leaf_num_cells();
        Ok(Cursor {
            page_num,
            cell_num: 0,
            end_of_table: num_cells == 0,
        })
    }

    /// Positions the cursor exactly where `key` is, or where it would be
    /// inserted if absent.
    pub fn find(pager: &mut Pager, root_page_num: u32, key: u32) -> Result<Cursor, Error> {
        let pos = btree::find(pager, root_page_num, key)?;
        let num_cells = pager.get_page(pos.page_num)?.borrow().leaf_num_cells() as usize;
        Ok(Cursor {
            page_num: pos.page_num,
            cell_num: pos.cell_num,
            end_of_table: pos.cell_num >= num_cells,
        })
    }

    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    pub fn value(&self, pager: &mut Pager) -> Result<Row, Error> {
        let page = pager.get_page(self.page_num)?.borrow();
        Row::deserialize(page.leaf_value(self.cell_num))
    }

    /// Advances to the next cell, following `next_leaf` once the current
    /// leaf is exhausted. A sibling pointer of 0 means there is none.
    pub fn advance(&mut self, pager: &mut Pager) -> Result<(), Error> {
        let page = pager.get_page(self.page_num)?.borrow();
        let num_cells = page.leaf_num_cells() as usize;
        let next_leaf = page.leaf_next_leaf();
        drop(page);

        self.cell_num += 1;
        if self.cell_num >= num_cells {
            if next_leaf == 0 {
                self.end_of_table = true;
            } else {
                self.page_num = next_leaf;
                self.cell_num = 0;
            }
        }
        Ok(())
    }
}

fn leftmost_leaf(pager: &mut Pager, mut page_num: u32) -> Result<u32, Error> {
    loop {
        let node_type = pager.get_page(page_num)?.borrow().node_type()?;
        match node_type {
            crate::storage::node::NodeType::Leaf => return Ok(page_num),
            crate::storage::node::NodeType::Internal => {
                page_num = pager.get_page(page_num)?.borrow().internal_child_or_right(0);
            }
        }
    }
}
