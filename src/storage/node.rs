//! Typed accessors over a raw 4096-byte page buffer.
//!
//! Every page holds exactly one B+ tree node. The first six bytes are a
//! header shared by both node kinds; the rest of the layout branches on
//! `node_type`. These functions never allocate — they index into the
//! buffer that the pager already owns.

use crate::errors::Error;
use crate::storage::row::ROW_SIZE;

pub const PAGE_SIZE: usize = 4096;
pub const TABLE_MAX_PAGES: usize = 100;
pub const INVALID_PAGE_NUM: u32 = u32::MAX;

// --- Common header ---------------------------------------------------

const NODE_TYPE_OFFSET: usize = 0;
const IS_ROOT_OFFSET: usize = 1;
const PARENT_POINTER_OFFSET: usize = 2;
const COMMON_NODE_HEADER_SIZE: usize = 6;

// --- Leaf node ---------------------------------------------------------

const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + 4;
const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NEXT_LEAF_OFFSET + 4;

const LEAF_NODE_KEY_SIZE: usize = 4;
const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// Maximum number of (key, row) cells a leaf page can hold.
pub const LEAF_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;
pub const LEAF_RIGHT_SPLIT_COUNT: usize = (LEAF_MAX_CELLS + 1) / 2;
pub const LEAF_LEFT_SPLIT_COUNT: usize = (LEAF_MAX_CELLS + 1) - LEAF_RIGHT_SPLIT_COUNT;

// --- Internal node -------------------------------------------------------

const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize = INTERNAL_NODE_NUM_KEYS_OFFSET + 4;
const INTERNAL_NODE_HEADER_SIZE: usize = INTERNAL_NODE_RIGHT_CHILD_OFFSET + 4;

const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;
const INTERNAL_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE;

/// Maximum number of keys (and non-rightmost children) an internal page
/// can hold.
pub const INTERNAL_MAX_CELLS: usize = INTERNAL_NODE_SPACE_FOR_CELLS / INTERNAL_NODE_CELL_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

/// A page buffer: exactly 4096 bytes, treated as a B+ tree node. `Copy`
/// so callers can snapshot a page's bytes while mutating a different one
/// without fighting the borrow checker (see `Pager`).
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub(crate) data: [u8; PAGE_SIZE],
}

impl Page {
    pub fn zeroed() -> Page {
        Page {
            data: [0u8; PAGE_SIZE],
        }
    }

    pub fn from_bytes(data: [u8; PAGE_SIZE]) -> Page {
        Page { data }
    }

    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    // --- common header ---

    pub fn node_type(&self) -> Result<NodeType, Error> {
        match self.data[NODE_TYPE_OFFSET] {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            other => Err(Error::CorruptFile(format!("invalid node type byte {other}"))),
        }
    }

    pub fn set_node_type(&mut self, t: NodeType) {
        self.data[NODE_TYPE_OFFSET] = match t {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        };
    }

    pub fn is_root(&self) -> bool {
        self.data[IS_ROOT_OFFSET] != 0
    }

    pub fn set_is_root(&mut self, is_root: bool) {
        self.data[IS_ROOT_OFFSET] = is_root as u8;
    }

    pub fn parent(&self) -> u32 {
        read_u32(&self.data, PARENT_POINTER_OFFSET)
    }

    pub fn set_parent(&mut self, parent: u32) {
        write_u32(&mut self.data, PARENT_POINTER_OFFSET, parent);
    }

    // --- leaf body ---

    pub fn leaf_num_cells(&self) -> u32 {
        read_u32(&self.data, LEAF_NODE_NUM_CELLS_OFFSET)
    }

    pub fn set_leaf_num_cells(&mut self, n: u32) {
        write_u32(&mut self.data, LEAF_NODE_NUM_CELLS_OFFSET, n);
    }

    /// 0 means "no right sibling".
    pub fn leaf_next_leaf(&self) -> u32 {
        read_u32(&self.data, LEAF_NODE_NEXT_LEAF_OFFSET)
    }

    pub fn set_leaf_next_leaf(&mut self, page_num: u32) {
        write_u32(&mut self.data, LEAF_NODE_NEXT_LEAF_OFFSET, page_num);
    }

    fn leaf_cell_offset(cell_num: usize) -> usize {
        LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
    }

    pub fn leaf_key(&self, cell_num: usize) -> u32 {
        read_u32(&self.data, Self::leaf_cell_offset(cell_num))
    }

    pub fn leaf_value(&self, cell_num: usize) -> &[u8] {
        let start = Self::leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        &self.data[start..start + LEAF_NODE_VALUE_SIZE]
    }

    pub fn leaf_cell(&self, cell_num: usize) -> &[u8] {
        let start = Self::leaf_cell_offset(cell_num);
        &self.data[start..start + LEAF_NODE_CELL_SIZE]
    }

    pub fn set_leaf_cell(&mut self, cell_num: usize, key: u32, value: &[u8; ROW_SIZE]) {
        let start = Self::leaf_cell_offset(cell_num);
        write_u32(&mut self.data, start, key);
        self.data[start + LEAF_NODE_KEY_SIZE..start + LEAF_NODE_CELL_SIZE].copy_from_slice(value);
    }

    pub fn copy_leaf_cell_within(&mut self, from: usize, to: usize) {
        let mut cell = [0u8; LEAF_NODE_CELL_SIZE];
        cell.copy_from_slice(self.leaf_cell(from));
        let start = Self::leaf_cell_offset(to);
        self.data[start..start + LEAF_NODE_CELL_SIZE].copy_from_slice(&cell);
    }

    pub fn initialize_leaf(&mut self) {
        *self = Page::zeroed();
        self.set_node_type(NodeType::Leaf);
        self.set_is_root(false);
        self.set_leaf_num_cells(0);
        self.set_leaf_next_leaf(0);
    }

    // --- internal body ---

    pub fn internal_num_keys(&self) -> u32 {
        read_u32(&self.data, INTERNAL_NODE_NUM_KEYS_OFFSET)
    }

    pub fn set_internal_num_keys(&mut self, n: u32) {
        write_u32(&mut self.data, INTERNAL_NODE_NUM_KEYS_OFFSET, n);
    }

    pub fn internal_right_child(&self) -> u32 {
        read_u32(&self.data, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
    }

    pub fn set_internal_right_child(&mut self, page_num: u32) {
        write_u32(&mut self.data, INTERNAL_NODE_RIGHT_CHILD_OFFSET, page_num);
    }

    fn internal_cell_offset(cell_num: usize) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
    }

    pub fn internal_child(&self, cell_num: usize) -> u32 {
        read_u32(&self.data, Self::internal_cell_offset(cell_num))
    }

    pub fn internal_key(&self, cell_num: usize) -> u32 {
        read_u32(
            &self.data,
            Self::internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE,
        )
    }

    pub fn set_internal_cell(&mut self, cell_num: usize, child: u32, key: u32) {
        let start = Self::internal_cell_offset(cell_num);
        write_u32(&mut self.data, start, child);
        write_u32(&mut self.data, start + INTERNAL_NODE_CHILD_SIZE, key);
    }

    pub fn set_internal_key(&mut self, cell_num: usize, key: u32) {
        write_u32(
            &mut self.data,
            Self::internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE,
            key,
        );
    }

    pub fn copy_internal_cell_within(&mut self, from: usize, to: usize) {
        let child = self.internal_child(from);
        let key = self.internal_key(from);
        self.set_internal_cell(to, child, key);
    }

    /// Child pointer for routing `child_num` in `0..=num_keys`: the body
    /// cells for `0..num_keys`, the dedicated right-child pointer for
    /// `num_keys`.
    pub fn internal_child_or_right(&self, child_num: usize) -> u32 {
        if child_num == self.internal_num_keys() as usize {
            self.internal_right_child()
        } else {
            self.internal_child(child_num)
        }
    }

    pub fn initialize_internal(&mut self) {
        *self = Page::zeroed();
        self.set_node_type(NodeType::Internal);
        self.set_is_root(false);
        self.set_internal_num_keys(0);
        // An internal node's right child defaults to page 0, which would
        // make an empty internal node look like a parent of the root.
        // INVALID_PAGE_NUM marks "no right child yet".
        self.set_internal_right_child(INVALID_PAGE_NUM);
    }

    /// The largest key reachable from this node: the last cell's key for a
    /// leaf, or the max key of the rightmost subtree for an internal node
    /// (the caller supplies that subtree's max since crossing pages needs
    /// the pager).
    pub fn own_max_key(&self) -> Result<u32, Error> {
        match self.node_type()? {
            NodeType::Leaf => {
                let n = self.leaf_num_cells();
                if n == 0 {
                    return Err(Error::Unsupported("max key of an empty leaf".into()));
                }
                Ok(self.leaf_key(n as usize - 1))
            }
            NodeType::Internal => {
                let n = self.internal_num_keys();
                if n == 0 {
                    return Err(Error::Unsupported("max key of an empty internal node".into()));
                }
                Ok(self.internal_key(n as usize - 1))
            }
        }
    }

    /// Binary search for the index of the child whose subtree may contain
    /// `key`: the first key strictly greater than `key`, or `num_keys` (the
    /// right child) if none exists.
    pub fn internal_find_child_index(&self, key: u32) -> usize {
        let mut min = 0usize;
        let mut max = self.internal_num_keys() as usize;
        while min != max {
            let mid = (min + max) / 2;
            if self.internal_key(mid) >= key {
                max = mid;
            } else {
                min = mid + 1;
            }
        }
        min
    }
}

fn read_u32(buf: &[u8; PAGE_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn write_u32(buf: &mut [u8; PAGE_SIZE], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
