use std::io;

pub mod file_drive;
pub mod memory_drive;

/// A fixed-size byte region with positional access.
pub trait DeviceDriver {
    fn get_size(&self) -> u64;
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()>;
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;
}
