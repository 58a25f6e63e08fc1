//! The inode table: every inode slot held in memory, loaded from and stored to
//! the `INODE_TABLE_BLOCKS` blocks after the bitmaps.
//! A slot's allocation state lives only in the inode bitmap; released slots keep their stale content.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, Inode};

#[derive(Debug, Clone)]
pub struct InodeTable {
    inodes: Vec<Inode>,
}

impl InodeTable {
    pub fn new() -> Self {
        InodeTable {
            inodes: vec![Inode::default(); MAX_INODES],
        }
    }

    pub fn load(device: &impl BlockDevice) -> Result<Self> {
        let mut inodes = Vec::with_capacity(MAX_INODES);
        let mut buf = [0u8; BLOCK_SIZE];
        for i in 0..INODE_TABLE_BLOCKS {
            device.read_block(INODE_TABLE_START + i, &mut buf)?;
            for slot in buf.chunks_exact(INODE_SIZE) {
                if inodes.len() == MAX_INODES {
                    break;
                }
                inodes.push(Inode::decode(slot)?);
            }
        }
        Ok(InodeTable { inodes })
    }

    pub fn store(&self, device: &mut impl BlockDevice) -> Result<()> {
        for (i, chunk) in self.inodes.chunks(INODES_PER_BLOCK).enumerate() {
            let mut buf = [0u8; BLOCK_SIZE];
            for (j, inode) in chunk.iter().enumerate() {
                inode.encode(&mut buf[j * INODE_SIZE..(j + 1) * INODE_SIZE]);
            }
            device.write_block(INODE_TABLE_START + i, &buf)?;
        }
        Ok(())
    }

    pub fn get(&self, inode_id: u32) -> Result<&Inode> {
        self.inodes
            .get(inode_id as usize)
            .ok_or(FsError::OutOfBounds(inode_id as usize))
    }

    pub fn get_mut(&mut self, inode_id: u32) -> Result<&mut Inode> {
        self.inodes
            .get_mut(inode_id as usize)
            .ok_or(FsError::OutOfBounds(inode_id as usize))
    }

    pub fn set(&mut self, inode_id: u32, inode: Inode) -> Result<()> {
        *self.get_mut(inode_id)? = inode;
        Ok(())
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of data blocks needed to hold `size` bytes.
pub fn blocks_for(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}
