//! Directory blocks and the current directory.
//! Every directory owns exactly one block holding a fixed array of entries and a live count.
//! The directory the caller is in is kept in memory; its block is written back whenever
//! navigation leaves it and read fresh whenever navigation enters a directory.

use core::fmt;

use log::{debug, info, warn};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::inode::InodeTable;
use crate::structs::*;
use crate::{BlockDevice, FileSystem};

fn trim_zero(name: &[u8]) -> &[u8] {
    let end = name.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
    &name[..end]
}

impl DirEntry {
    pub fn is_vacant(&self) -> bool {
        self.inode_id.is_none() && trim_zero(&self.name).is_empty()
    }

    pub fn name_bytes(&self) -> &[u8] {
        trim_zero(&self.name)
    }

    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        !name.is_empty() && self.name_bytes() == name
    }
}

/// In-memory image of one directory block.
/// Layout: live entry count (u32) followed by `MAX_DIR_ENTRIES` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirBlock {
    entries: [DirEntry; MAX_DIR_ENTRIES],
    num_entries: u32,
}

impl DirBlock {
    pub fn new() -> Self {
        DirBlock {
            entries: [DirEntry::NULL; MAX_DIR_ENTRIES],
            num_entries: 0,
        }
    }

    /// Block of a new subdirectory: "." and "..".
    pub fn with_parent(self_id: u32, parent_id: u32) -> Result<Self> {
        let mut block = Self::new();
        block.insert(DirEntry::new(self_id, DOT_NAME)?)?;
        block.insert(DirEntry::new(parent_id, DOTDOT_NAME)?)?;
        Ok(block)
    }

    pub fn load(device: &impl BlockDevice, block_id: u32) -> Result<Self> {
        let mut buf = [0u8; BLOCK_SIZE];
        device.read_block(block_id as usize, &mut buf)?;
        Self::decode(&buf).ok_or(FsError::CorruptDirectory(block_id))
    }

    pub fn store(&self, device: &mut impl BlockDevice, block_id: u32) -> Result<()> {
        device.write_block(block_id as usize, &self.encode())
    }

    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..DIR_HEADER_SIZE].copy_from_slice(&self.num_entries.to_le_bytes());
        for (i, entry) in self.entries.iter().enumerate() {
            let off = DIR_HEADER_SIZE + i * DIR_ENTRY_SIZE;
            entry.encode(&mut buf[off..off + DIR_ENTRY_SIZE]);
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        let num_entries = read_u32(buf, 0);
        if num_entries as usize > MAX_DIR_ENTRIES {
            return None;
        }
        let mut block = Self::new();
        block.num_entries = num_entries;
        for (i, entry) in block.entries.iter_mut().enumerate() {
            let off = DIR_HEADER_SIZE + i * DIR_ENTRY_SIZE;
            *entry = DirEntry::decode(&buf[off..off + DIR_ENTRY_SIZE]);
        }
        // The live count may never undercount the occupied slots.
        let occupied = block.entries.iter().filter(|e| !e.is_vacant()).count();
        if (num_entries as usize) < occupied {
            return None;
        }
        Some(block)
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        self.num_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= MAX_DIR_ENTRIES
    }

    pub fn slots(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Slot index of the live entry called `name`.
    pub fn position(&self, name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.inode_id.is_some() && e.name_eq(name))
    }

    /// Inode id of the live entry called `name`.
    pub fn lookup(&self, name: &[u8]) -> Option<u32> {
        self.position(name).and_then(|i| self.entries[i].inode_id)
    }

    /// Puts `entry` in the first vacant slot: a slot vacated by an earlier removal if there is
    /// one, the next never-used slot otherwise. Returns the slot index.
    pub fn insert(&mut self, entry: DirEntry) -> Result<usize> {
        if self.position(entry.name_bytes()).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if self.is_full() {
            return Err(FsError::DirectoryFull);
        }
        let slot = self
            .entries
            .iter()
            .position(DirEntry::is_vacant)
            .ok_or(FsError::DirectoryFull)?;
        self.entries[slot] = entry;
        self.num_entries += 1;
        Ok(slot)
    }

    /// Blanks `slot` and returns what it held.
    pub fn vacate(&mut self, slot: usize) -> Option<DirEntry> {
        let entry = self.entries.get(slot).copied().filter(|e| !e.is_vacant())?;
        self.entries[slot] = DirEntry::NULL;
        self.num_entries = self.num_entries.saturating_sub(1);
        Some(entry)
    }
}

impl Default for DirBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the caller is: the in-memory directory block, the block it came from and its inode.
#[derive(Debug, Clone)]
pub struct CurrentDir {
    pub entries: DirBlock,
    pub block_id: u32,
    pub inode_id: u32,
}

/// One line of `ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsEntry {
    pub ftype: FileType,
    pub name: String,
    pub inode_id: u32,
    pub size: u32,
}

impl fmt::Display for LsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.ftype {
            FileType::Regular => "file",
            FileType::Directory => "dir",
        };
        write!(
            f,
            "type: {}, name \"{}\", inode {}, size {} byte",
            kind, self.name, self.inode_id, self.size
        )
    }
}

/// Lazy walk over the occupied slots of the current directory.
/// Clone it, or call `ls` again, to start over.
#[derive(Clone)]
pub struct Listing<'a> {
    slots: core::slice::Iter<'a, DirEntry>,
    inodes: &'a InodeTable,
}

impl Iterator for Listing<'_> {
    type Item = LsEntry;

    fn next(&mut self) -> Option<LsEntry> {
        for entry in self.slots.by_ref() {
            if entry.is_vacant() {
                continue;
            }
            let Some(inode_id) = entry.inode_id else {
                warn!("entry {} has a name but no inode", entry.name_str());
                continue;
            };
            let Ok(inode) = self.inodes.get(inode_id) else {
                warn!("entry {} points past the inode table", entry.name_str());
                continue;
            };
            return Some(LsEntry {
                ftype: inode.ftype,
                name: entry.name_str(),
                inode_id,
                size: inode.size,
            });
        }
        None
    }
}

/// Checks a name that is about to get a new entry.
pub(crate) fn validate_new_name(name: &str) -> Result<&[u8]> {
    let bytes = name.as_bytes();
    if bytes.is_empty()
        || bytes.len() > MAX_FILE_NAME_LEN
        || bytes == DOT_NAME
        || bytes == DOTDOT_NAME
        || bytes.iter().any(|&c| c == 0 || c == b'/')
    {
        return Err(FsError::InvalidFileName);
    }
    Ok(bytes)
}

impl<D: BlockDevice> FileSystem<D> {
    /// Changes the current directory to `name`, `.` or `..`.
    pub fn cd(&mut self, name: &str) -> Result<()> {
        match name.as_bytes() {
            b"." => Ok(()),
            b".." => {
                let self_id = self.self_inode_id();
                if self_id == ROOT_INODE_ID {
                    return Err(FsError::InvalidOperation("already at the root directory"));
                }
                let parent_id = self
                    .cwd
                    .entries
                    .lookup(DOTDOT_NAME)
                    .ok_or(FsError::NotFound)?;
                self.enter(parent_id)
            }
            target => {
                let inode_id = self.cwd.entries.lookup(target).ok_or(FsError::NotFound)?;
                if !self.inodes.get(inode_id)?.is_dir() {
                    return Err(FsError::NotADirectory);
                }
                self.enter(inode_id)
            }
        }
    }

    /// Inode of the current directory according to its own "." entry.
    fn self_inode_id(&self) -> u32 {
        self.cwd.entries.lookup(DOT_NAME).unwrap_or_else(|| {
            warn!("directory {} has no self entry", self.cwd.inode_id);
            self.cwd.inode_id
        })
    }

    /// Persists the outgoing directory to its own block, then loads `inode_id`'s block.
    fn enter(&mut self, inode_id: u32) -> Result<()> {
        let target_block = self.inodes.get(inode_id)?.direct_ptrs[0]
            .ok_or(FsError::CorruptDirectory(inode_id))?;

        let own_block = self
            .inodes
            .get(self.self_inode_id())?
            .direct_ptrs[0]
            .unwrap_or(self.cwd.block_id);
        self.cwd.entries.store(&mut self.device, own_block)?;

        let entries = DirBlock::load(&self.device, target_block)?;
        self.cwd = CurrentDir {
            entries,
            block_id: target_block,
            inode_id,
        };
        self.inodes.get_mut(inode_id)?.touch();
        debug!("entered directory inode {} block {}", inode_id, target_block);
        Ok(())
    }

    /// Creates directory `name` inside the current directory without moving into it.
    /// Returns the new directory's inode id.
    pub fn mkdir(&mut self, name: &str) -> Result<u32> {
        let name_bytes = validate_new_name(name)?;
        if self.cwd.entries.lookup(name_bytes).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if self.cwd.entries.is_full() {
            return Err(FsError::DirectoryFull);
        }
        if self.superblock.free_inodes < 1 {
            return Err(FsError::InsufficientSpace("inodes"));
        }
        let entry_template = DirEntry::new(0, name_bytes)?;

        let dir_inode_id = self.alloc_inode()?;
        let dir_block = match self.alloc_blocks(1) {
            Ok(blocks) => blocks[0],
            Err(e) => {
                crate::bitmap::free_inode_id(&mut self.inode_bitmap, &mut self.superblock, dir_inode_id)?;
                return Err(e);
            }
        };
        let parent_id = self.cwd.inode_id;

        let new_entries = DirBlock::with_parent(dir_inode_id, parent_id)?;
        let mut dir_inode = Inode::new(FileType::Directory, self.credentials);
        dir_inode.blocks = 1;
        dir_inode.direct_ptrs[0] = Some(dir_block);
        dir_inode.size = (new_entries.len() * DIR_ENTRY_SIZE) as u32;
        self.inodes.set(dir_inode_id, dir_inode)?;

        self.cwd.entries.insert(DirEntry {
            inode_id: Some(dir_inode_id),
            ..entry_template
        })?;
        self.update_cwd_size()?;
        self.cwd.entries.store(&mut self.device, self.cwd.block_id)?;
        new_entries.store(&mut self.device, dir_block)?;

        info!(
            "Directory created: {}, inode {}, size {}",
            name, dir_inode_id, dir_inode.size
        );
        Ok(dir_inode_id)
    }

    /// Removes the empty directory `name` from the current directory.
    pub fn rmdir(&mut self, name: &str) -> Result<()> {
        match name.as_bytes() {
            b"." => return Err(FsError::InvalidOperation("cannot remove the current directory")),
            b".." => {
                return Err(FsError::InvalidOperation(
                    "cannot remove the parent directory because it contains files",
                ));
            }
            _ => {}
        }
        let dir_inode_id = self
            .cwd
            .entries
            .lookup(name.as_bytes())
            .ok_or(FsError::NotFound)?;
        if !self.inodes.get(dir_inode_id)?.is_dir() {
            return Err(FsError::NotADirectory);
        }

        self.cd(name)?;
        let live = self.cwd.entries.len();
        self.cd("..")?;
        if live > 2 {
            return Err(FsError::NotEmpty);
        }

        let slot = self
            .cwd
            .entries
            .position(name.as_bytes())
            .ok_or(FsError::NotFound)?;
        self.cwd.entries.vacate(slot);
        self.release_inode(dir_inode_id)?;
        self.update_cwd_size()?;
        info!("Directory removed: {}, inode {}", name, dir_inode_id);
        Ok(())
    }

    /// Lists the occupied slots of the current directory.
    pub fn ls(&self) -> Listing<'_> {
        Listing {
            slots: self.cwd.entries.slots().iter(),
            inodes: &self.inodes,
        }
    }
}
