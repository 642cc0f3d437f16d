use crate::consts::{IDENTIFIER, IDENTIFIER_OFFSET};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::Result;

/// The superblock region is a single identifier byte. It shares its offset
/// with the bitmap slot of block 0, which is reserved and never allocated.
#[derive(Debug, PartialEq)]
pub struct SuperBlock {
    pub identifier: u8,
}

impl Default for SuperBlock {
    fn default() -> Self {
        SuperBlock::new()
    }
}

impl SuperBlock {
    pub fn new() -> SuperBlock {
        SuperBlock { identifier: IDENTIFIER }
    }

    pub fn read<A: DeviceDriver>(io: &IO<A>) -> Result<Option<SuperBlock>> {
        let buffer = io.read_at(IDENTIFIER_OFFSET, 1)?;
        if buffer[0] != IDENTIFIER {
            return Ok(None);
        }
        Ok(Some(SuperBlock { identifier: buffer[0] }))
    }

    pub fn write<A: DeviceDriver>(&self, io: &mut IO<A>) -> Result<()> {
        io.write_at(IDENTIFIER_OFFSET, &[self.identifier])
    }
}
