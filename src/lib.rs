//! Lepton is a small single-user file system living on a fixed-size block device.
//! It keeps all metadata in memory while mounted and writes it back on unmount.
//!
//! Lepton's linear layout:
//! - Superblock        (block 0)
//! - Inode Bitmap      (block 1)
//! - Block Bitmap      (block 2)
//! - Inode Table       (blocks 3..3+INODE_TABLE_BLOCKS)
//! - Data Blocks       (the first one allocated is the root directory's block)
//!
//! Lepton's layers (from bottom to top):
//! 1. Block Device: fixed array of blocks, attached to a named image.     | User implemented or `ImageDisk`
//! 2. Bitmap: first-fit allocation of inodes and data blocks.             | Fs implemented
//! 3. Inode: the inode table and on-disk records.                         | Fs implemented
//! 4. Directory: directory blocks, the current directory and navigation.  | Fs implemented
//! 5. File: create, read, write and remove within the current directory. | Fs implemented
//! 6. Command: parsed shell commands dispatched onto the file system.     | Fs implemented

mod config;
mod block_dev;
mod disk;
mod structs;
mod timestamp;
mod bitmap;
mod superblock;
mod inode;
mod directory;
mod file;
mod fs;
mod command;
mod error;
pub mod logging;

pub use block_dev::BlockDevice;
pub use disk::ImageDisk;
pub use config::*;
pub use structs::*;
pub use timestamp::Timestamp;
pub use bitmap::Bitmap;
pub use superblock::{read_superblock, write_superblock};
pub use inode::{blocks_for, InodeTable};
pub use directory::{DirBlock, LsEntry, Listing};
pub use file::FileStat;
pub use fs::{FileSystem, FsStat};
pub use command::{Command, Output};
pub use error::FsError as Error;
pub use error::Result;
