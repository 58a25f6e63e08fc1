//! Image-file backed block device.
//! All blocks live in memory while mounted; the image file is only touched on mount and unmount.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::BlockDevice;

pub struct ImageDisk {
    blocks: Vec<u8>,
    num_blocks: usize,
}

impl ImageDisk {
    pub fn new() -> Self {
        Self::with_blocks(MAX_BLOCKS)
    }

    pub fn with_blocks(num_blocks: usize) -> Self {
        ImageDisk {
            blocks: vec![0u8; num_blocks * BLOCK_SIZE],
            num_blocks,
        }
    }

    fn range(&self, block_id: usize, len: usize) -> Result<core::ops::Range<usize>> {
        if block_id >= self.num_blocks {
            return Err(FsError::InvalidBlockId(block_id));
        }
        if len != BLOCK_SIZE {
            return Err(FsError::InvalidArgument("buffer length must equal the block size"));
        }
        let start = block_id * BLOCK_SIZE;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl Default for ImageDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for ImageDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        let range = self.range(block_id, buf.len())?;
        buf.copy_from_slice(&self.blocks[range]);
        Ok(())
    }

    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()> {
        let range = self.range(block_id, buf.len())?;
        self.blocks[range].copy_from_slice(buf);
        Ok(())
    }

    fn mount(&mut self, name: &str) -> Result<bool> {
        let image = match fs::read(Path::new(name)) {
            Ok(image) => image,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no image at {}, starting blank", name);
                self.blocks.fill(0);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        if image.len() != self.blocks.len() {
            debug!("image {} is {} bytes, expected {}", name, image.len(), self.blocks.len());
            return Err(FsError::InvalidSuperBlock);
        }
        self.blocks.copy_from_slice(&image);
        info!("loaded image {}", name);
        Ok(true)
    }

    fn unmount(&mut self, name: &str) -> Result<()> {
        fs::write(Path::new(name), &self.blocks)?;
        info!("saved image {}", name);
        Ok(())
    }
}
