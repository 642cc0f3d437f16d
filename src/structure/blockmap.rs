use log::debug;

use crate::consts::{BlockPointer, BLOCK_COUNT, BLOCK_MAP_OFFSET};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::util::error::{Error, Result};

const FREE: u8 = 0;
const USED: u8 = 1;

// block 0 is reserved, its slot holds the identifier byte
const FIRST_DATA_BLOCK: usize = 1;

/// One byte per block. Nothing is cached: every call reads the map from the
/// store, so it always reflects the last committed write.
pub struct BlockMap;

impl BlockMap {
    fn read<A: DeviceDriver>(io: &IO<A>) -> Result<Vec<u8>> {
        io.read_at(BLOCK_MAP_OFFSET, BLOCK_COUNT)
    }

    /// Finds the first `count` free blocks in ascending order without
    /// claiming them.
    pub fn allocate<A: DeviceDriver>(io: &IO<A>, count: usize) -> Result<Vec<BlockPointer>> {
        let map = BlockMap::read(io)?;
        let blocks: Vec<BlockPointer> = (FIRST_DATA_BLOCK..BLOCK_COUNT)
            .filter(|&i| map[i] != USED)
            .take(count)
            .map(|i| i as BlockPointer)
            .collect();

        if blocks.len() < count {
            debug!("wanted {} blocks, only {} free", count, blocks.len());
            return Err(Error::BlockPoolExhausted);
        }
        Ok(blocks)
    }

    pub fn is_used<A: DeviceDriver>(io: &IO<A>, index: BlockPointer) -> Result<bool> {
        let offset = BlockMap::slot(index)?;
        Ok(io.read_at(offset, 1)?[0] == USED)
    }

    pub fn is_free<A: DeviceDriver>(io: &IO<A>, index: BlockPointer) -> Result<bool> {
        Ok(!BlockMap::is_used(io, index)?)
    }

    pub fn mark_used<A: DeviceDriver>(io: &mut IO<A>, index: BlockPointer) -> Result<()> {
        let offset = BlockMap::slot(index)?;
        io.write_at(offset, &[USED])
    }

    pub fn mark_free<A: DeviceDriver>(io: &mut IO<A>, index: BlockPointer) -> Result<()> {
        let offset = BlockMap::slot(index)?;
        io.write_at(offset, &[FREE])
    }

    pub fn used_blocks<A: DeviceDriver>(io: &IO<A>) -> Result<Vec<BlockPointer>> {
        let map = BlockMap::read(io)?;
        Ok((FIRST_DATA_BLOCK..BLOCK_COUNT).filter(|&i| map[i] == USED).map(|i| i as BlockPointer).collect())
    }

    pub fn free_count<A: DeviceDriver>(io: &IO<A>) -> Result<usize> {
        Ok(BLOCK_COUNT - FIRST_DATA_BLOCK - BlockMap::used_blocks(io)?.len())
    }

    fn slot(index: BlockPointer) -> Result<u64> {
        let index = index as usize;
        if !(FIRST_DATA_BLOCK..BLOCK_COUNT).contains(&index) {
            return Err(Error::Corrupted(format!("block {} has no bitmap slot", index)));
        }
        Ok(BLOCK_MAP_OFFSET + index as u64)
    }
}
