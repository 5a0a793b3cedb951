//! B+ tree insertion, splitting, and point lookup.
//!
//! These are free functions over a `Pager` rather than methods on `Table`
//! because a split can need to touch three pages at once (the node being
//! split, its new sibling, and its parent) and `RefCell` only lets one of
//! those be borrowed mutably at a time. Each function borrows exactly one
//! page for the span of its own body, copies out whatever it needs from
//! neighbours, and drops the borrow before moving on.

use tracing::{debug, trace};

use crate::errors::Error;
use crate::storage::node::{
    NodeType, Page, INVALID_PAGE_NUM, LEAF_LEFT_SPLIT_COUNT, LEAF_MAX_CELLS,
    LEAF_RIGHT_SPLIT_COUNT,
};
use crate::storage::pager::Pager;
use crate::storage::row::Row;

/// The result of descending the tree looking for a key: the leaf page
/// that should contain it, and the cell index it occupies (if present)
/// or where it should be inserted (if absent).
pub struct TreePosition {
    pub page_num: u32,
    pub cell_num: usize,
}

/// The most new pages a single `insert` can allocate: one for the leaf it
/// splits into (`leaf_split_and_insert`), plus one more if that leaf was
/// also the root and has to be relocated out of page 0
/// (`create_new_root`). `internal_node_insert` never allocates — an
/// internal split would need a third page, but that path is unreachable
/// (see its `debug_assert`), so it isn't counted here. A caller should
/// refuse an insert that would need `num_pages() + INSERT_WORST_CASE_NEW_PAGES`
/// to exceed `TABLE_MAX_PAGES`, rather than let `Pager::allocate_page` fail
/// with a fatal `PageOutOfBounds` partway through.
pub const INSERT_WORST_CASE_NEW_PAGES: u32 = 2;

/// Descends from `root_page_num` to the leaf that would hold `key`,
/// routing through internal nodes with `internal_find_child_index` and
/// finishing with a binary search of the leaf's cells.
pub fn find(pager: &mut Pager, root_page_num: u32, key: u32) -> Result<TreePosition, Error> {
    let mut page_num = root_page_num;
    loop {
        let node_type = pager.get_page(page_num)?.borrow().node_type()?;
        match node_type {
            NodeType::Leaf => return leaf_find(pager, page_num, key),
            NodeType::Internal => {
                let child_index = pager.get_page(page_num)?.borrow().internal_find_child_index(key);
                page_num = pager.get_page(page_num)?.borrow().internal_child_or_right(child_index);
            }
        }
    }
}

fn leaf_find(pager: &mut Pager, page_num: u32, key: u32) -> Result<TreePosition, Error> {
    let page = pager.get_page(page_num)?.borrow();
    let num_cells = page.leaf_num_cells() as usize;
    let mut min = 0usize;
    let mut max = num_cells;
    while min != max {
        let mid = (min + max) / 2;
        let mid_key = page.leaf_key(mid);
        if mid_key == key {
            return Ok(TreePosition { page_num, cell_num: mid });
        }
        if key < mid_key {
            max = mid;
        } else {
            min = mid + 1;
        }
    }
    Ok(TreePosition { page_num, cell_num: min })
}

/// Inserts `row` under `key`, descending from the root and splitting
/// leaves (and, transitively, internal nodes) as needed.
pub fn insert(pager: &mut Pager, root_page_num: u32, key: u32, row: &Row) -> Result<(), Error> {
    let pos = find(pager, root_page_num, key)?;
    let page = pager.get_page(pos.page_num)?;
    let num_cells = page.borrow().leaf_num_cells() as usize;
    if pos.cell_num < num_cells && page.borrow().leaf_key(pos.cell_num) == key {
        return Err(Error::DuplicateKey);
    }

    if num_cells >= LEAF_MAX_CELLS {
        leaf_split_and_insert(pager, pos.page_num, pos.cell_num, key, row)
    } else {
        let mut page = pager.get_page(pos.page_num)?.borrow_mut();
        leaf_insert_at(&mut page, pos.cell_num, num_cells, key, row);
        Ok(())
    }
}

fn leaf_insert_at(page: &mut Page, cell_num: usize, num_cells: usize, key: u32, row: &Row) {
    for i in (cell_num..num_cells).rev() {
        page.copy_leaf_cell_within(i, i + 1);
    }
    page.set_leaf_cell(cell_num, key, &row.serialize());
    page.set_leaf_num_cells(num_cells as u32 + 1);
}

/// Splits a full leaf into two, inserting the new cell into whichever
/// half it belongs in, then links the new leaf into its parent — creating
/// a fresh root if the leaf being split had none.
fn leaf_split_and_insert(
    pager: &mut Pager,
    old_page_num: u32,
    insert_at: usize,
    key: u32,
    row: &Row,
) -> Result<(), Error> {
    let new_page_num = pager.allocate_page()?;
    trace!(old_page_num, new_page_num, "splitting leaf");

    let (old_is_root, old_parent, old_next_leaf) = {
        let old = pager.get_page(old_page_num)?.borrow();
        (old.is_root(), old.parent(), old.leaf_next_leaf())
    };

    // Gather the LEAF_MAX_CELLS + 1 cells (old contents plus the new one)
    // in key order, then redistribute them across old/new.
    let mut cells: Vec<(u32, [u8; crate::storage::row::ROW_SIZE])> =
        Vec::with_capacity(LEAF_MAX_CELLS + 1);
    {
        let old = pager.get_page(old_page_num)?.borrow();
        for i in 0..LEAF_MAX_CELLS {
            if i == insert_at {
                cells.push((key, row.serialize()));
            }
            if i < old.leaf_num_cells() as usize {
                let mut value = [0u8; crate::storage::row::ROW_SIZE];
                value.copy_from_slice(old.leaf_value(i));
                cells.push((old.leaf_key(i), value));
            }
        }
        if insert_at == LEAF_MAX_CELLS {
            cells.push((key, row.serialize()));
        }
    }

    {
        let mut new_page = pager.get_page(new_page_num)?.borrow_mut();
        new_page.initialize_leaf();
        new_page.set_parent(old_parent);
        new_page.set_leaf_next_leaf(old_next_leaf);
        for (i, (k, v)) in cells[LEAF_LEFT_SPLIT_COUNT..].iter().enumerate() {
            new_page.set_leaf_cell(i, *k, v);
        }
        new_page.set_leaf_num_cells(LEAF_RIGHT_SPLIT_COUNT as u32);
    }

    {
        let mut old_page = pager.get_page(old_page_num)?.borrow_mut();
        old_page.initialize_leaf();
        old_page.set_is_root(false);
        old_page.set_parent(old_parent);
        old_page.set_leaf_next_leaf(new_page_num);
        for (i, (k, v)) in cells[..LEAF_LEFT_SPLIT_COUNT].iter().enumerate() {
            old_page.set_leaf_cell(i, *k, v);
        }
        old_page.set_leaf_num_cells(LEAF_LEFT_SPLIT_COUNT as u32);
    }

    if old_is_root {
        create_new_root(pager, old_page_num, new_page_num)
    } else {
        let new_max_key = pager.get_page(old_page_num)?.borrow().own_max_key()?;
        internal_node_insert(pager, old_parent, old_page_num, new_max_key, new_page_num)
    }
}

/// Replaces the root's contents with a fresh internal node pointing at
/// `left_child` (a copy of the old root's data, relocated) and
/// `right_child`, keyed on the left subtree's max key.
fn create_new_root(pager: &mut Pager, root_page_num: u32, right_child_page_num: u32) -> Result<(), Error> {
    let left_child_page_num = pager.allocate_page()?;
    let root_copy = *pager.get_page(root_page_num)?.borrow();

    {
        let mut left_child = pager.get_page(left_child_page_num)?.borrow_mut();
        *left_child = root_copy;
        left_child.set_is_root(false);
        left_child.set_parent(root_page_num);
    }

    if root_copy.node_type()? == NodeType::Internal {
        // Re-parent every grandchild that just moved from the root page
        // into `left_child_page_num`.
        reparent_children(pager, left_child_page_num, left_child_page_num)?;
    }

    let left_max_key = pager.get_page(left_child_page_num)?.borrow().own_max_key()?;

    let mut root = pager.get_page(root_page_num)?.borrow_mut();
    root.initialize_internal();
    root.set_is_root(true);
    root.set_internal_num_keys(1);
    root.set_internal_cell(0, left_child_page_num, left_max_key);
    root.set_internal_right_child(right_child_page_num);
    drop(root);

    pager.get_page(right_child_page_num)?.borrow_mut().set_parent(root_page_num);
    debug!(root_page_num, left_child_page_num, right_child_page_num, "created new root");
    Ok(())
}

fn reparent_children(pager: &mut Pager, page_num: u32, new_parent: u32) -> Result<(), Error> {
    let (num_keys, right_child) = {
        let page = pager.get_page(page_num)?.borrow();
        (page.internal_num_keys() as usize, page.internal_right_child())
    };
    for i in 0..num_keys {
        let child = pager.get_page(page_num)?.borrow().internal_child(i);
        pager.get_page(child)?.borrow_mut().set_parent(new_parent);
    }
    if right_child != INVALID_PAGE_NUM {
        pager.get_page(right_child)?.borrow_mut().set_parent(new_parent);
    }
    Ok(())
}

/// Inserts a new child/key pair into an internal node after one of its
/// existing children (`old_child_page_num`) split off `new_child_page_num`.
///
/// An internal node can hold `INTERNAL_MAX_CELLS` (510) children before it
/// would need to split itself, which would require a tree of over 511
/// pages; `TABLE_MAX_PAGES` caps a table at 100 pages, so that split can
/// never actually happen here. The assert documents that invariant instead
/// of silently relying on it.
fn internal_node_insert(
    pager: &mut Pager,
    parent_page_num: u32,
    old_child_page_num: u32,
    new_key: u32,
    new_child_page_num: u32,
) -> Result<(), Error> {
    use crate::storage::node::INTERNAL_MAX_CELLS;

    let num_keys = pager.get_page(parent_page_num)?.borrow().internal_num_keys() as usize;
    debug_assert!(
        num_keys < INTERNAL_MAX_CELLS,
        "internal node full at {num_keys} cells; unreachable with TABLE_MAX_PAGES capping the tree size"
    );

    let old_child_index = find_child_pointer_index(pager, parent_page_num, old_child_page_num)?;
    let old_child_max_key = pager.get_page(old_child_page_num)?.borrow().own_max_key()?;

    let mut parent = pager.get_page(parent_page_num)?.borrow_mut();
    let right_child = parent.internal_right_child();

    if old_child_index == num_keys {
        // The split child was the rightmost subtree: the old right-child
        // pointer becomes a normal cell keyed on its (now fixed) max, and
        // the new sibling becomes the right child.
        parent.set_internal_cell(num_keys, right_child, old_child_max_key);
        parent.set_internal_right_child(new_child_page_num);
    } else {
        for i in (old_child_index..num_keys).rev() {
            parent.copy_internal_cell_within(i, i + 1);
        }
        parent.set_internal_cell(old_child_index, old_child_page_num, old_child_max_key);
        parent.set_internal_cell(old_child_index + 1, new_child_page_num, new_key);
    }
    parent.set_internal_num_keys(num_keys as u32 + 1);
    drop(parent);

    pager.get_page(new_child_page_num)?.borrow_mut().set_parent(parent_page_num);
    Ok(())
}

fn find_child_pointer_index(pager: &mut Pager, parent_page_num: u32, child_page_num: u32) -> Result<usize, Error> {
    let parent = pager.get_page(parent_page_num)?.borrow();
    let num_keys = parent.internal_num_keys() as usize;
    for i in 0..num_keys {
        if parent.internal_child(i) == child_page_num {
            return Ok(i);
        }
    }
    Ok(num_keys)
}

