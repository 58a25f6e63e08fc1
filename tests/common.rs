//! Common utilities for tests

#![allow(unused)]

use std::collections::HashSet;

use lepton::BlockDevice;
use lepton::Error;
use lepton::Result;
use lepton::BLOCK_SIZE;

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder {}", x) -> println!("[test] placeholder ...");
#[macro_export]
macro_rules! log {
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

/// In-memory block device. "Images" are names it has been unmounted under;
/// mounting one of those again reports an existing file system.
pub struct RamDisk {
    inner: Vec<u8>,
    num_blocks: usize,
    images: HashSet<String>,
}

impl RamDisk {
    /// Creates a new RamDisk with the specified number of blocks.
    /// Each block is BLOCK_SIZE bytes.
    pub fn new(num_blocks: usize) -> Self {
        RamDisk {
            inner: vec![0u8; num_blocks * BLOCK_SIZE],
            num_blocks,
            images: HashSet::new(),
        }
    }

    /// Pretends an image called `name` exists, whatever the blocks hold.
    pub fn with_image(mut self, name: &str) -> Self {
        self.images.insert(name.to_string());
        self
    }

    pub fn raw_block(&self, block_id: usize) -> &[u8] {
        &self.inner[block_id * BLOCK_SIZE..(block_id + 1) * BLOCK_SIZE]
    }
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(Error::InvalidBlockId(block_id));
        }
        if buf.len() != BLOCK_SIZE {
            return Err(Error::InvalidArgument("bad buffer length"));
        }
        buf.copy_from_slice(self.raw_block(block_id));
        Ok(())
    }

    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(Error::InvalidBlockId(block_id));
        }
        if buf.len() != BLOCK_SIZE {
            return Err(Error::InvalidArgument("bad buffer length"));
        }
        let start = block_id * BLOCK_SIZE;
        self.inner[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn mount(&mut self, name: &str) -> Result<bool> {
        Ok(self.images.contains(name))
    }

    fn unmount(&mut self, name: &str) -> Result<()> {
        self.images.insert(name.to_string());
        Ok(())
    }
}
