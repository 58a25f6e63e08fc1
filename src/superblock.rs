use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::read_u32;
use crate::{BlockDevice, SuperBlock};

impl SuperBlock {
    /// Counters of a freshly formatted device, before the root directory takes its inode and block.
    pub fn format() -> Self {
        SuperBlock {
            magic: MAGIC,
            num_blocks: MAX_BLOCKS as u32,
            num_inodes: MAX_INODES as u32,
            free_blocks: (MAX_BLOCKS - DATA_START) as u32,
            free_inodes: MAX_INODES as u32,
        }
    }
}

pub fn read_superblock<D: BlockDevice>(device: &D) -> Result<SuperBlock> {
    let mut buf = [0u8; BLOCK_SIZE];
    device.read_block(SUPERBLOCK_ID, &mut buf)?;
    let superblock = SuperBlock {
        magic: read_u32(&buf, 0),
        num_blocks: read_u32(&buf, 4),
        num_inodes: read_u32(&buf, 8),
        free_blocks: read_u32(&buf, 12),
        free_inodes: read_u32(&buf, 16),
    };

    // Geometry is compiled in, an image made with other constants cannot be used.
    if superblock.magic != MAGIC
        || superblock.num_blocks != MAX_BLOCKS as u32
        || superblock.num_inodes != MAX_INODES as u32
    {
        return Err(FsError::InvalidSuperBlock);
    }
    if superblock.free_blocks as usize > MAX_BLOCKS - DATA_START
        || superblock.free_inodes as usize > MAX_INODES
    {
        return Err(FsError::InvalidSuperBlock);
    }

    Ok(superblock)
}

pub fn write_superblock<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<()> {
    let mut buf = [0u8; BLOCK_SIZE];
    let fields = [
        superblock.magic,
        superblock.num_blocks,
        superblock.num_inodes,
        superblock.free_blocks,
        superblock.free_inodes,
    ];
    for (i, field) in fields.iter().enumerate() {
        buf[i * 4..i * 4 + 4].copy_from_slice(&field.to_le_bytes());
    }
    device.write_block(SUPERBLOCK_ID, &buf)
}
