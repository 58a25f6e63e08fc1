//! Management of the inode bitmap and the block bitmap.
//! Both are kept in memory between mount and unmount, one block each on disk.
//! Every allocation and release keeps the matching superblock counter in step.

use log::{debug, warn};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::SuperBlock;

/// Fixed-length bit vector, one bit per inode or block slot.
/// Bit `i` lives in byte `i / 8` at position `i % 8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Bitmap {
            bits: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Rebuilds a bitmap of `len` bits from its persisted bytes.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Result<Self> {
        let num_bytes = len.div_ceil(8);
        if bytes.len() < num_bytes {
            return Err(FsError::InvalidSuperBlock);
        }
        Ok(Bitmap {
            bits: bytes[..num_bytes].to_vec(),
            len,
        })
    }

    /// Serializes into a zero-padded block.
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        block[..self.bits.len()].copy_from_slice(&self.bits);
        block
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    /// Forces bit `index` to `value`. Setting a bit to the value it already holds changes nothing.
    /// Returns previously set value of the bit.
    pub fn set(&mut self, index: usize, value: bool) -> Result<bool> {
        if index >= self.len {
            return Err(FsError::OutOfBounds(index));
        }
        let pre_value = self.get(index);
        if value {
            self.bits[index / 8] |= 1 << (index % 8);
        } else {
            self.bits[index / 8] &= !(1 << (index % 8));
        }
        Ok(pre_value)
    }

    /// Index of the first clear bit, scanning from 0.
    pub fn first_clear(&self) -> Option<usize> {
        self.bits
            .iter()
            .enumerate()
            .find(|(_, byte)| **byte != u8::MAX)
            .map(|(i, byte)| i * 8 + byte.trailing_ones() as usize)
            .filter(|&index| index < self.len)
    }

    pub fn count_set(&self) -> usize {
        (0..self.len).filter(|&i| self.get(i)).count()
    }
}

/// Sets the first clear bit. None when every bit below the capacity is taken.
fn set_first_fit_bit(bitmap: &mut Bitmap) -> Option<usize> {
    let index = bitmap.first_clear()?;
    bitmap.set(index, true).ok()?;
    Some(index)
}

fn clear_bit_at(bitmap: &mut Bitmap, index: usize, what: &str) -> Result<()> {
    if !bitmap.set(index, false)? {
        warn!("releasing {} {} which was not allocated", what, index);
    }
    Ok(())
}

// Public API for managing inode bitmap and block bitmap.

/// Allocates a new inode id, setting its bit in the inode bitmap.
pub fn alloc_inode_id(bitmap: &mut Bitmap, superblock: &mut SuperBlock) -> Option<u32> {
    let inode_id = set_first_fit_bit(bitmap)?;
    superblock.free_inodes -= 1;
    debug!("allocated inode {}, {} left", inode_id, superblock.free_inodes);
    Some(inode_id as u32)
}

/// Frees an inode id. Releasing an id twice is the caller's bug and is only logged.
pub fn free_inode_id(bitmap: &mut Bitmap, superblock: &mut SuperBlock, inode_id: u32) -> Result<()> {
    clear_bit_at(bitmap, inode_id as usize, "inode")?;
    superblock.free_inodes += 1;
    debug!("freed inode {}, {} left", inode_id, superblock.free_inodes);
    Ok(())
}

/// Allocates a new data block, setting its bit in the block bitmap.
/// Returns the absolute block id; metadata blocks are pre-marked so they are never returned.
pub fn alloc_data_block(bitmap: &mut Bitmap, superblock: &mut SuperBlock) -> Option<u32> {
    let block_id = set_first_fit_bit(bitmap)?;
    superblock.free_blocks -= 1;
    debug!("allocated block {}, {} left", block_id, superblock.free_blocks);
    Some(block_id as u32)
}

/// Frees a data block, clearing its bit in the block bitmap.
pub fn free_data_block(bitmap: &mut Bitmap, superblock: &mut SuperBlock, block_id: u32) -> Result<()> {
    if (block_id as usize) < DATA_START {
        return Err(FsError::OutOfBounds(block_id as usize));
    }
    clear_bit_at(bitmap, block_id as usize, "block")?;
    superblock.free_blocks += 1;
    debug!("freed block {}, {} left", block_id, superblock.free_blocks);
    Ok(())
}
