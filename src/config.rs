pub const MAGIC: u32 = 0x4C45_5054; // "LEPT" in ASCII

pub const BLOCK_SIZE: usize = 512;
pub const MAX_BLOCKS: usize = 4096; // Blocks on the device, metadata included
pub const MAX_INODES: usize = 4096;
pub const INODE_SIZE: usize = 128;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

// Fixed layout
pub const SUPERBLOCK_ID: usize = 0;
pub const INODE_BITMAP_ID: usize = 1;
pub const BLOCK_BITMAP_ID: usize = 2;
pub const INODE_TABLE_START: usize = 3;
pub const INODE_TABLE_BLOCKS: usize = (MAX_INODES * INODE_SIZE).div_ceil(BLOCK_SIZE);
pub const DATA_START: usize = INODE_TABLE_START + INODE_TABLE_BLOCKS; // First block handed out by the allocator

pub const ROOT_INODE_ID: u32 = 0;

pub const NUM_DIRECT_PTRS: usize = 10;
pub const MAX_FILE_SIZE: usize = NUM_DIRECT_PTRS * BLOCK_SIZE;

pub const MAX_FILE_NAME_LEN: usize = 20;
pub const DIR_ENTRY_SIZE: usize = MAX_FILE_NAME_LEN + 4; // name + inode id
pub const DIR_HEADER_SIZE: usize = 4; // live entry count
pub const MAX_DIR_ENTRIES: usize = (BLOCK_SIZE - DIR_HEADER_SIZE) / DIR_ENTRY_SIZE;
pub const DOT_NAME: &[u8; 1] = b".";
pub const DOTDOT_NAME: &[u8; 2] = b"..";

/// Owner and group tags stamped on every inode created during a session.
/// Nothing is enforced with them, they are only stored and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub owner: u32,
    pub group: u32,
}

impl Credentials {
    pub const ROOT: Self = Self { owner: 0, group: 0 };

    pub fn new(owner: u32, group: u32) -> Self {
        Self { owner, group }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self { owner: 1, group: 2 }
    }
}
