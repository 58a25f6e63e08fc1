use crate::error::Result;

/// Storage the file system runs on: a fixed number of fixed-size blocks,
/// attached to a named backing image between `mount` and `unmount`.
pub trait BlockDevice {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads a block of data from the block device.
    /// buf.len() must be equal to block_size().
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()>;

    /// Writes a block of data to the block device.
    /// buf.len() must be equal to block_size().
    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()>;

    /// Attaches the device to the image called `name`.
    /// Returns true if an existing image was loaded, false if the device starts blank
    /// and the file system has to be formatted.
    fn mount(&mut self, name: &str) -> Result<bool>;

    /// Persists every block to the image called `name` and detaches.
    fn unmount(&mut self, name: &str) -> Result<()>;

    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize {
        crate::config::BLOCK_SIZE
    }
}
