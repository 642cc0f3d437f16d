use log::debug;

use crate::consts::{InodePointer, INODE_COUNT, INODE_TABLE_OFFSET};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::inode::Inode;
use crate::util::error::{Error, Result};
use crate::util::serializable::{ByteSerializable, KnownSize};

/// Fixed array of inode records, read and written in place.
pub struct InodeTable;

impl InodeTable {
    pub fn read_inode<A: DeviceDriver>(io: &IO<A>, index: InodePointer) -> Result<Inode> {
        let offset = InodeTable::inode_offset(index)?;
        let buffer = io.read_at(offset, Inode::size_on_disk())?;
        Inode::from_bytes(&buffer)
    }

    pub fn write_inode<A: DeviceDriver>(io: &mut IO<A>, index: InodePointer, inode: &Inode) -> Result<()> {
        let offset = InodeTable::inode_offset(index)?;
        io.write_at(offset, &inode.to_bytes())
    }

    /// First slot not in use. The slot stays free until an inode is written to it.
    pub fn allocate<A: DeviceDriver>(io: &IO<A>) -> Result<InodePointer> {
        for index in 0..INODE_COUNT as InodePointer {
            if !InodeTable::read_inode(io, index)?.used {
                return Ok(index);
            }
        }
        debug!("all {} inodes are in use", INODE_COUNT);
        Err(Error::InodeTableExhausted)
    }

    pub fn release<A: DeviceDriver>(io: &mut IO<A>, index: InodePointer) -> Result<Inode> {
        let mut inode = InodeTable::read_inode(io, index)?;
        inode.used = false;
        InodeTable::write_inode(io, index, &inode)?;
        Ok(inode)
    }

    /// Every slot in table order, used or not.
    pub fn read_all<A: DeviceDriver>(io: &IO<A>) -> Result<Vec<Inode>> {
        let buffer = io.read_at(INODE_TABLE_OFFSET, INODE_COUNT * Inode::size_on_disk())?;
        buffer.chunks(Inode::size_on_disk()).map(Inode::from_bytes).collect()
    }

    pub fn free_count<A: DeviceDriver>(io: &IO<A>) -> Result<usize> {
        Ok(InodeTable::read_all(io)?.iter().filter(|inode| !inode.used).count())
    }

    #[inline]
    fn inode_offset(index: InodePointer) -> Result<u64> {
        if index as usize >= INODE_COUNT {
            return Err(Error::Corrupted(format!("inode index {} out of range", index)));
        }
        Ok(INODE_TABLE_OFFSET + index as u64 * Inode::size_on_disk() as u64)
    }
}
