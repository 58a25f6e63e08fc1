//! Operations on regular files in the current directory.

use core::fmt;

use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::*;
use crate::directory::validate_new_name;
use crate::error::{FsError, Result};
use crate::inode::blocks_for;
use crate::structs::*;
use crate::timestamp::Timestamp;
use crate::{BlockDevice, FileSystem};

/// What `stat` reports about an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub inode_id: u32,
    pub ftype: FileType,
    pub owner: u32,
    pub group: u32,
    pub size: u32,
    pub blocks: u32,
    pub created: Timestamp,
    pub last_access: Timestamp,
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inode = {}", self.inode_id)?;
        writeln!(f, "type = {}", self.ftype.name())?;
        writeln!(f, "owner = {}", self.owner)?;
        writeln!(f, "group = {}", self.group)?;
        writeln!(f, "size = {}", self.size)?;
        writeln!(f, "num of block = {}", self.blocks)?;
        writeln!(f, "Created time = {}", self.created)?;
        write!(f, "Last accessed time = {}", self.last_access)
    }
}

/// `size` random alphanumeric bytes, the initial content of a created file.
fn random_content(size: usize) -> Vec<u8> {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .collect()
}

impl<D: BlockDevice> FileSystem<D> {
    /// Inode id of the regular file `name` in the current directory.
    fn lookup_file(&self, name: &str) -> Result<u32> {
        let inode_id = self
            .cwd
            .entries
            .lookup(name.as_bytes())
            .ok_or(FsError::NotFound)?;
        if self.inodes.get(inode_id)?.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Ok(inode_id)
    }

    /// Creates file `name` holding `size` random bytes. Returns its inode id.
    pub fn create(&mut self, name: &str, size: usize) -> Result<u32> {
        let name_bytes = validate_new_name(name)?;
        if size > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }
        if self.cwd.entries.lookup(name_bytes).is_some() {
            return Err(FsError::AlreadyExists);
        }
        if self.cwd.entries.is_full() {
            return Err(FsError::DirectoryFull);
        }
        let num_blocks = blocks_for(size);
        if num_blocks > self.superblock.free_blocks as usize {
            return Err(FsError::InsufficientSpace("blocks"));
        }
        if self.superblock.free_inodes < 1 {
            return Err(FsError::InsufficientSpace("inodes"));
        }

        let content = random_content(size);
        let inode_id = self.alloc_inode()?;
        let blocks = match self.alloc_blocks(num_blocks) {
            Ok(blocks) => blocks,
            Err(e) => {
                crate::bitmap::free_inode_id(&mut self.inode_bitmap, &mut self.superblock, inode_id)?;
                return Err(e);
            }
        };

        let mut inode = Inode::new(FileType::Regular, self.credentials);
        inode.size = size as u32;
        inode.blocks = num_blocks as u32;
        for (ptr, block_id) in inode.direct_ptrs.iter_mut().zip(&blocks) {
            *ptr = Some(*block_id);
        }
        self.write_content(&blocks, &content)?;
        self.inodes.set(inode_id, inode)?;
        self.cwd.entries.insert(DirEntry::new(inode_id, name_bytes)?)?;
        self.update_cwd_size()?;

        info!("File created: {}, inode {}, size {}", name, inode_id, size);
        Ok(inode_id)
    }

    /// Whole content of file `name`.
    pub fn cat(&mut self, name: &str) -> Result<Vec<u8>> {
        let inode_id = self.lookup_file(name)?;
        let content = self.read_content(self.inodes.get(inode_id)?)?;
        self.inodes.get_mut(inode_id)?.touch();
        Ok(content)
    }

    /// Up to `size` bytes of file `name` starting at `offset`; shorter when the file ends first.
    pub fn read(&mut self, name: &str, offset: usize, size: usize) -> Result<Vec<u8>> {
        let inode_id = self.lookup_file(name)?;
        let content = self.read_content(self.inodes.get(inode_id)?)?;
        if offset > content.len() {
            return Err(FsError::OffsetOutOfRange);
        }
        let end = offset.saturating_add(size).min(content.len());
        self.inodes.get_mut(inode_id)?.touch();
        Ok(content[offset..end].to_vec())
    }

    /// Overwrites `size` bytes of file `name` at `offset` with `data`, growing the file when the
    /// write runs past its end. Returns the new file size.
    ///
    /// New blocks are all allocated before anything is written; if that fails the file and the
    /// free pools are left as they were.
    pub fn write(&mut self, name: &str, offset: usize, size: usize, data: &[u8]) -> Result<usize> {
        if data.len() != size {
            return Err(FsError::InvalidArgument("size does not match the length of the data"));
        }
        let inode_id = self.lookup_file(name)?;
        let inode = *self.inodes.get(inode_id)?;
        let old = self.read_content(&inode)?;
        if offset > old.len() {
            return Err(FsError::OffsetOutOfRange);
        }

        let mut content = Vec::with_capacity(old.len().max(offset + size));
        content.extend_from_slice(&old[..offset]);
        content.extend_from_slice(data);
        if let Some(suffix) = old.get(offset + size..) {
            content.extend_from_slice(suffix);
        }
        if content.len() > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        let mut blocks: Vec<u32> = inode.data_blocks().collect();
        let new_blocks = blocks_for(content.len());
        if new_blocks > blocks.len() {
            let extra = new_blocks - blocks.len();
            if extra > self.superblock.free_blocks as usize {
                return Err(FsError::InsufficientSpace("blocks"));
            }
            blocks.extend(self.alloc_blocks(extra)?);
            debug!("file {} grows to {} blocks", name, new_blocks);
        }
        self.write_content(&blocks, &content)?;

        let inode = self.inodes.get_mut(inode_id)?;
        for (ptr, block_id) in inode.direct_ptrs.iter_mut().zip(&blocks) {
            *ptr = Some(*block_id);
        }
        inode.size = content.len() as u32;
        inode.blocks = blocks.len() as u32;
        inode.touch();
        Ok(content.len())
    }

    /// Removes file `name`, returning its inode and blocks to the free pools.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let inode_id = self.lookup_file(name)?;
        let slot = self
            .cwd
            .entries
            .position(name.as_bytes())
            .ok_or(FsError::NotFound)?;
        self.cwd.entries.vacate(slot);
        self.release_inode(inode_id)?;
        self.update_cwd_size()?;
        info!("File removed: {}, inode {}", name, inode_id);
        Ok(())
    }

    /// Metadata of the entry `name`, file or directory.
    pub fn stat(&self, name: &str) -> Result<FileStat> {
        let inode_id = self
            .cwd
            .entries
            .lookup(name.as_bytes())
            .ok_or(FsError::NotFound)?;
        let inode = self.inodes.get(inode_id)?;
        Ok(FileStat {
            inode_id,
            ftype: inode.ftype,
            owner: inode.owner,
            group: inode.group,
            size: inode.size,
            blocks: inode.blocks,
            created: inode.created,
            last_access: inode.last_access,
        })
    }
}
