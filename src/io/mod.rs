use log::trace;

use crate::consts::{BlockPointer, BLOCK_COUNT, BLOCK_SIZE, STORE_SIZE};
use crate::driver::DeviceDriver;
use crate::util::error::{Error, Result};

pub struct IO<A: DeviceDriver> {
    device: A,
    pub block_size: usize,
    pub block_count: u64,
}

impl<A: DeviceDriver> IO<A> {
    pub fn new(device: A) -> Result<IO<A>> {
        let size = device.get_size();
        if size < STORE_SIZE {
            return Err(Error::DeviceTooSmall { size, required: STORE_SIZE });
        }
        Ok(IO { device, block_size: BLOCK_SIZE, block_count: BLOCK_COUNT as u64 })
    }

    pub fn into_device(self) -> A {
        self.device
    }

    #[cfg(test)]
    pub fn device(&self) -> &A {
        &self.device
    }

    pub(crate) fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.check_range(offset, len)?;
        trace!("read {} bytes at {}", len, offset);
        let mut buffer = vec![0; len];
        self.device.read_at(offset, &mut buffer)?;
        Ok(buffer)
    }

    pub(crate) fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.check_range(offset, data.len())?;
        trace!("write {} bytes at {}", data.len(), offset);
        self.device.write_at(offset, data)?;
        Ok(())
    }

    pub(crate) fn write_block(&mut self, index: BlockPointer, block: &[u8]) -> Result<()> {
        if block.len() != self.block_size {
            return Err(Error::Corrupted(format!(
                "block write of {} bytes, expected {}",
                block.len(),
                self.block_size
            )));
        }
        let offset = self.block_offset(index)?;
        self.write_at(offset, block)
    }

    pub(crate) fn read_block(&self, index: BlockPointer) -> Result<Vec<u8>> {
        let offset = self.block_offset(index)?;
        self.read_at(offset, self.block_size)
    }

    pub(crate) fn zero_block(&mut self, index: BlockPointer) -> Result<()> {
        let zeros = vec![0; self.block_size];
        self.write_block(index, &zeros)
    }

    pub(crate) fn block_offset(&self, index: BlockPointer) -> Result<u64> {
        if index as u64 >= self.block_count {
            return Err(Error::Corrupted(format!("block index {} out of range", index)));
        }
        Ok(index as u64 * self.block_size as u64)
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<()> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= STORE_SIZE => Ok(()),
            _ => Err(Error::Corrupted(format!("access of {} bytes at {} is outside the store", len, offset))),
        }
    }
}
