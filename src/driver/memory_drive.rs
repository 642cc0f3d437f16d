use std::io;

use crate::driver::DeviceDriver;

/// Keeps the whole store in a heap buffer. Nothing survives the value.
pub struct MemoryDrive {
    data: Vec<u8>,
}

impl MemoryDrive {
    pub fn new(bytes: u64) -> MemoryDrive {
        MemoryDrive { data: vec![0; bytes as usize] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, offset: u64, len: usize) -> io::Result<std::ops::Range<usize>> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("access {}..{} beyond {} bytes", offset, offset.saturating_add(len as u64), self.data.len()),
            )),
        }
    }
}

impl DeviceDriver for MemoryDrive {
    fn get_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        let range = self.range(offset, buffer.len())?;
        buffer.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        let range = self.range(offset, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }
}
