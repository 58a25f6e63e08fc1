use core::fmt;

use log::{debug, info};

use crate::bitmap::*;
use crate::config::*;
use crate::directory::{CurrentDir, DirBlock};
use crate::error::{FsError, Result};
use crate::inode::InodeTable;
use crate::structs::*;
use crate::superblock::{read_superblock, write_superblock};
use crate::BlockDevice;

/// The mounted file system. Owns the device and every in-memory image of the
/// on-disk metadata from mount to unmount; nothing is shared between instances.
pub struct FileSystem<D: BlockDevice> {
    pub(crate) device: D,
    pub(crate) name: String,
    pub(crate) credentials: Credentials,
    pub(crate) superblock: SuperBlock,
    pub(crate) inode_bitmap: Bitmap,
    pub(crate) block_bitmap: Bitmap,
    pub(crate) inodes: InodeTable,
    pub(crate) cwd: CurrentDir,
}

/// Free space report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    pub free_blocks: u32,
    pub free_inodes: u32,
}

impl FsStat {
    pub fn free_bytes(&self) -> usize {
        self.free_blocks as usize * BLOCK_SIZE
    }
}

impl fmt::Display for FsStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File System Status: ")?;
        write!(
            f,
            "# of free blocks: {} ({} bytes), # of free inodes: {}",
            self.free_blocks,
            self.free_bytes(),
            self.free_inodes
        )
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// Mounts the image `name`, formatting a fresh file system if the device has none.
    pub fn mount(device: D, name: &str) -> Result<Self> {
        Self::mount_as(device, name, Credentials::default())
    }

    /// Like `mount`, stamping `credentials` on every inode created in this session.
    pub fn mount_as(mut device: D, name: &str, credentials: Credentials) -> Result<Self> {
        if device.num_blocks() < MAX_BLOCKS {
            return Err(FsError::DeviceTooSmall(device.num_blocks()));
        }
        if device.block_size() != BLOCK_SIZE {
            return Err(FsError::InvalidArgument("device block size must be 512"));
        }

        if device.mount(name)? {
            Self::load(device, name, credentials)
        } else {
            Self::format(device, name, credentials)
        }
    }

    fn format(device: D, name: &str, credentials: Credentials) -> Result<Self> {
        let mut superblock = SuperBlock::format();
        let mut inode_bitmap = Bitmap::new(MAX_INODES);
        let mut block_bitmap = Bitmap::new(MAX_BLOCKS);
        for block_id in 0..DATA_START {
            block_bitmap.set(block_id, true)?;
        }

        let root_id = alloc_inode_id(&mut inode_bitmap, &mut superblock)
            .ok_or(FsError::InsufficientSpace("inodes"))?;
        let root_block = alloc_data_block(&mut block_bitmap, &mut superblock)
            .ok_or(FsError::InsufficientSpace("blocks"))?;
        debug_assert_eq!(root_id, ROOT_INODE_ID);

        let mut root = Inode::new(FileType::Directory, Credentials::ROOT);
        root.blocks = 1;
        root.direct_ptrs[0] = Some(root_block);
        let mut inodes = InodeTable::new();

        // Root starts with its self entry only; it never gets a parent entry.
        let mut entries = DirBlock::new();
        entries.insert(DirEntry::new(root_id, DOT_NAME)?)?;
        root.size = (entries.len() * DIR_ENTRY_SIZE) as u32;
        inodes.set(root_id, root)?;

        let mut fs_inst = Self {
            device,
            name: name.to_string(),
            credentials,
            superblock,
            inode_bitmap,
            block_bitmap,
            inodes,
            cwd: CurrentDir {
                entries,
                block_id: root_block,
                inode_id: root_id,
            },
        };
        fs_inst.sync()?;
        info!(
            "formatted {}: {} free blocks, {} free inodes",
            name, fs_inst.superblock.free_blocks, fs_inst.superblock.free_inodes
        );
        Ok(fs_inst)
    }

    fn load(device: D, name: &str, credentials: Credentials) -> Result<Self> {
        let superblock = read_superblock(&device)?;
        let mut buf = [0u8; BLOCK_SIZE];
        device.read_block(INODE_BITMAP_ID, &mut buf)?;
        let inode_bitmap = Bitmap::from_bytes(&buf, MAX_INODES)?;
        device.read_block(BLOCK_BITMAP_ID, &mut buf)?;
        let block_bitmap = Bitmap::from_bytes(&buf, MAX_BLOCKS)?;
        // Free counters must agree with the bitmaps, metadata bits included.
        if superblock.free_blocks as usize != MAX_BLOCKS - block_bitmap.count_set()
            || superblock.free_inodes as usize != MAX_INODES - inode_bitmap.count_set()
        {
            return Err(FsError::InvalidSuperBlock);
        }
        let inodes = InodeTable::load(&device)?;

        let root = inodes.get(ROOT_INODE_ID)?;
        if !root.is_dir() || !inode_bitmap.get(ROOT_INODE_ID as usize) {
            return Err(FsError::InvalidSuperBlock);
        }
        let root_block = root.direct_ptrs[0].ok_or(FsError::InvalidSuperBlock)?;
        let entries = DirBlock::load(&device, root_block)?;

        info!(
            "mounted {}: {} free blocks, {} free inodes",
            name, superblock.free_blocks, superblock.free_inodes
        );
        Ok(Self {
            device,
            name: name.to_string(),
            credentials,
            superblock,
            inode_bitmap,
            block_bitmap,
            inodes,
            cwd: CurrentDir {
                entries,
                block_id: root_block,
                inode_id: ROOT_INODE_ID,
            },
        })
    }

    /// Writes superblock, bitmaps, inode table and the current directory block to the device.
    pub fn sync(&mut self) -> Result<()> {
        write_superblock(&mut self.device, &self.superblock)?;
        self.device.write_block(INODE_BITMAP_ID, &self.inode_bitmap.to_block())?;
        self.device.write_block(BLOCK_BITMAP_ID, &self.block_bitmap.to_block())?;
        self.inodes.store(&mut self.device)?;
        self.cwd.entries.store(&mut self.device, self.cwd.block_id)?;
        debug!("synced metadata, current directory block {}", self.cwd.block_id);
        Ok(())
    }

    /// Flushes everything and detaches the device from its image. Hands the device back.
    pub fn unmount(mut self) -> Result<D> {
        self.sync()?;
        self.device.unmount(&self.name)?;
        info!("unmounted {}", self.name);
        Ok(self.device)
    }

    pub fn df(&self) -> FsStat {
        FsStat {
            free_blocks: self.superblock.free_blocks,
            free_inodes: self.superblock.free_inodes,
        }
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn get_inode(&self, inode_id: u32) -> Result<Inode> {
        self.inodes.get(inode_id).copied()
    }

    pub fn inode_bitmap(&self) -> &Bitmap {
        &self.inode_bitmap
    }

    pub fn block_bitmap(&self) -> &Bitmap {
        &self.block_bitmap
    }

    /// Inode of the directory the caller is in.
    pub fn cwd_inode_id(&self) -> u32 {
        self.cwd.inode_id
    }

    /// Block the current directory was loaded from.
    pub fn cwd_block_id(&self) -> u32 {
        self.cwd.block_id
    }

    pub fn cwd_entries(&self) -> &DirBlock {
        &self.cwd.entries
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    // Helpers shared by file and directory operations.

    pub(crate) fn alloc_inode(&mut self) -> Result<u32> {
        alloc_inode_id(&mut self.inode_bitmap, &mut self.superblock)
            .ok_or(FsError::InsufficientSpace("inodes"))
    }

    /// Allocates `count` data blocks or none: blocks taken before a failure are released again.
    pub(crate) fn alloc_blocks(&mut self, count: usize) -> Result<Vec<u32>> {
        let mut staged = Vec::with_capacity(count);
        for _ in 0..count {
            match alloc_data_block(&mut self.block_bitmap, &mut self.superblock) {
                Some(block_id) => staged.push(block_id),
                None => {
                    debug!("block allocation failed, rolling back {} blocks", staged.len());
                    for block_id in staged {
                        free_data_block(&mut self.block_bitmap, &mut self.superblock, block_id)?;
                    }
                    return Err(FsError::InsufficientSpace("blocks"));
                }
            }
        }
        Ok(staged)
    }

    /// Returns an inode and all of its data blocks to the free pools.
    pub(crate) fn release_inode(&mut self, inode_id: u32) -> Result<()> {
        let inode = *self.inodes.get(inode_id)?;
        for block_id in inode.data_blocks() {
            free_data_block(&mut self.block_bitmap, &mut self.superblock, block_id)?;
        }
        free_inode_id(&mut self.inode_bitmap, &mut self.superblock, inode_id)
    }

    /// Concatenates the data blocks of `inode`, trimmed to its size.
    pub(crate) fn read_content(&self, inode: &Inode) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(inode.blocks as usize * BLOCK_SIZE);
        let mut buf = [0u8; BLOCK_SIZE];
        for block_id in inode.data_blocks() {
            self.device.read_block(block_id as usize, &mut buf)?;
            content.extend_from_slice(&buf);
        }
        content.truncate(inode.size as usize);
        Ok(content)
    }

    /// Writes `content` across `blocks`, one block-sized chunk each, zero-padding the last.
    pub(crate) fn write_content(&mut self, blocks: &[u32], content: &[u8]) -> Result<()> {
        for (block_id, chunk) in blocks.iter().zip(content.chunks(BLOCK_SIZE)) {
            let mut buf = [0u8; BLOCK_SIZE];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.device.write_block(*block_id as usize, &buf)?;
        }
        Ok(())
    }

    /// Keeps the current directory's inode size equal to its live entries.
    pub(crate) fn update_cwd_size(&mut self) -> Result<()> {
        let size = self.cwd.entries.len() * DIR_ENTRY_SIZE;
        self.inodes.get_mut(self.cwd.inode_id)?.size = size as u32;
        Ok(())
    }
}
