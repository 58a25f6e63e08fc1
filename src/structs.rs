use crate::config::*;
use crate::error::{FsError, Result};
use crate::timestamp::Timestamp;

/// Aggregate free-space counters, persisted in block `SUPERBLOCK_ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,       // Magic number to identify the filesystem
    pub num_blocks: u32,  // Total number of blocks, metadata included
    pub num_inodes: u32,  // Total number of inode slots
    pub free_blocks: u32, // Number of free data blocks
    pub free_inodes: u32, // Number of free inodes
}

#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    #[default]
    Regular = 1,
    Directory = 2,
}

impl FileType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FileType::Regular),
            2 => Some(FileType::Directory),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileType::Regular => "file",
            FileType::Directory => "directory",
        }
    }
}

/// On-disk inode, `INODE_SIZE` bytes:
/// type(1) pad(3) owner(4) group(4) created(12) last_access(12) size(4) blocks(4) direct(4 * N) reserved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub ftype: FileType,
    pub owner: u32,
    pub group: u32,
    pub created: Timestamp,
    pub last_access: Timestamp,
    pub size: u32,   // Bytes of content
    pub blocks: u32, // Data blocks in use, always a prefix of direct_ptrs
    pub direct_ptrs: [Option<u32>; NUM_DIRECT_PTRS],
}

const INODE_DIRECT_OFFSET: usize = 44;
const _: () = assert!(INODE_DIRECT_OFFSET + 4 * NUM_DIRECT_PTRS <= INODE_SIZE);

impl Inode {
    pub fn new(ftype: FileType, credentials: Credentials) -> Self {
        let now = Timestamp::now();
        Inode {
            ftype,
            owner: credentials.owner,
            group: credentials.group,
            created: now,
            last_access: now,
            ..Default::default()
        }
    }

    pub fn touch(&mut self) {
        self.last_access = Timestamp::now();
    }

    pub fn is_dir(&self) -> bool {
        self.ftype == FileType::Directory
    }

    /// Data blocks in use, in file order.
    pub fn data_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct_ptrs[..self.blocks as usize].iter().flatten().copied()
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..INODE_SIZE].fill(0);
        buf[0] = self.ftype as u8;
        buf[4..8].copy_from_slice(&self.owner.to_le_bytes());
        buf[8..12].copy_from_slice(&self.group.to_le_bytes());
        self.created.encode(&mut buf[12..24]);
        self.last_access.encode(&mut buf[24..36]);
        buf[36..40].copy_from_slice(&self.size.to_le_bytes());
        buf[40..44].copy_from_slice(&self.blocks.to_le_bytes());
        for (i, ptr) in self.direct_ptrs.iter().enumerate() {
            // Block 0 is the superblock, so 0 never names a data block.
            let off = INODE_DIRECT_OFFSET + i * 4;
            buf[off..off + 4].copy_from_slice(&ptr.unwrap_or(0).to_le_bytes());
        }
    }

    /// Decodes an inode slot. A never-written slot (type tag 0) decodes to the default inode.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf[0] == 0 {
            return Ok(Inode::default());
        }
        let ftype = FileType::from_tag(buf[0]).ok_or(FsError::InvalidInode)?;
        let mut inode = Inode {
            ftype,
            owner: read_u32(buf, 4),
            group: read_u32(buf, 8),
            created: Timestamp::decode(&buf[12..24]),
            last_access: Timestamp::decode(&buf[24..36]),
            size: read_u32(buf, 36),
            blocks: read_u32(buf, 40),
            direct_ptrs: [None; NUM_DIRECT_PTRS],
        };
        if inode.blocks as usize > NUM_DIRECT_PTRS {
            return Err(FsError::InvalidInode);
        }
        for (i, ptr) in inode.direct_ptrs.iter_mut().enumerate() {
            let block_id = read_u32(buf, INODE_DIRECT_OFFSET + i * 4);
            *ptr = (block_id != 0).then_some(block_id);
        }
        Ok(inode)
    }
}

/// One name -> inode slot of a directory block, `DIR_ENTRY_SIZE` bytes on disk.
/// A vacant slot has an empty name and no inode; inode 0 is the root, not a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; MAX_FILE_NAME_LEN],
    pub inode_id: Option<u32>,
}

const NO_INODE: u32 = u32::MAX;

impl DirEntry {
    pub const NULL: Self = Self {
        name: [0; MAX_FILE_NAME_LEN],
        inode_id: None,
    };

    pub fn new(inode_id: u32, name: &[u8]) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_FILE_NAME_LEN || name.contains(&0) {
            return Err(FsError::InvalidFileName);
        }
        let mut arr = [0; MAX_FILE_NAME_LEN];
        arr[..name.len()].copy_from_slice(name);
        Ok(Self {
            name: arr,
            inode_id: Some(inode_id),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..MAX_FILE_NAME_LEN].copy_from_slice(&self.name);
        let id = self.inode_id.unwrap_or(NO_INODE);
        buf[MAX_FILE_NAME_LEN..DIR_ENTRY_SIZE].copy_from_slice(&id.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0; MAX_FILE_NAME_LEN];
        name.copy_from_slice(&buf[..MAX_FILE_NAME_LEN]);
        let id = read_u32(buf, MAX_FILE_NAME_LEN);
        DirEntry {
            name,
            inode_id: (id != NO_INODE).then_some(id),
        }
    }
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}
