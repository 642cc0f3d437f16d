use log::info;

use crate::consts::{
    BlockPointer, InodePointer, DIRECT_POINTERS, ROOT_BLOCK, ROOT_INODE, ROOT_NAME, SELF_ENTRY, STORE_SIZE,
};
use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::structure::blockmap::BlockMap;
use crate::structure::entry::Entry;
use crate::structure::inode::{pointers_from, Inode, InodeKind};
use crate::structure::inode_table::InodeTable;
use crate::structure::superblock::SuperBlock;
use crate::util::error::{Error, Result};
use crate::util::format::pretty_size_from_bytes;
use crate::util::serializable::{ByteSerializable, KnownSize};

pub mod blockmap;
pub mod entry;
pub mod inode;
pub mod inode_table;
pub mod superblock;

/// The store and the on-disk structures laid over it.
pub struct Structure<A: DeviceDriver> {
    pub(crate) io: IO<A>,
}

impl<A: DeviceDriver> Structure<A> {
    pub fn is_initialized(io: &IO<A>) -> Result<bool> {
        Ok(SuperBlock::read(io)?.is_some())
    }

    /// Wipes the store and lays out an empty filesystem holding only the root.
    pub fn new(mut io: IO<A>) -> Result<Structure<A>> {
        for i in 0..io.block_count {
            io.zero_block(i as BlockPointer)?;
        }

        SuperBlock::new().write(&mut io)?;

        let root_entry = Entry::new(SELF_ENTRY, ROOT_INODE)?;
        let mut block = root_entry.to_bytes();
        block.resize(io.block_size, 0);
        io.write_block(ROOT_BLOCK, &block)?;
        BlockMap::mark_used(&mut io, ROOT_BLOCK)?;

        let root = Inode::new(InodeKind::Directory, ROOT_NAME, Entry::size_on_disk() as u32, pointers_from(&[ROOT_BLOCK]))?;
        InodeTable::write_inode(&mut io, ROOT_INODE, &root)?;

        info!("formatted {} store", pretty_size_from_bytes(STORE_SIZE));
        Ok(Structure { io })
    }

    pub fn mount(io: IO<A>) -> Result<Structure<A>> {
        match SuperBlock::read(&io)? {
            Some(_) => {
                let root = InodeTable::read_inode(&io, ROOT_INODE)?;
                if !root.used || root.kind != InodeKind::Directory {
                    return Err(Error::Corrupted("root inode is not an allocated directory".to_string()));
                }
                info!("mounted store, {} free blocks", BlockMap::free_count(&io)?);
                Ok(Structure { io })
            }
            None => Err(Error::NotFormatted),
        }
    }

    pub fn into_device(self) -> A {
        self.io.into_device()
    }

    pub fn read_inode(&self, index: InodePointer) -> Result<Inode> {
        InodeTable::read_inode(&self.io, index)
    }

    pub fn write_inode(&mut self, index: InodePointer, inode: &Inode) -> Result<()> {
        InodeTable::write_inode(&mut self.io, index, inode)
    }

    /// Claims `blocks` in the bitmap and writes the inode that owns them.
    pub fn create_inode(&mut self, index: InodePointer, inode: &Inode, blocks: &[BlockPointer]) -> Result<()> {
        debug_assert!(blocks.len() <= DIRECT_POINTERS);
        for &block in blocks {
            BlockMap::mark_used(&mut self.io, block)?;
        }
        self.write_inode(index, inode)
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::STORE_SIZE;
    use crate::driver::memory_drive::MemoryDrive;
    use crate::io::IO;
    use crate::util::error::Error;

    use super::*;

    #[test]
    fn format_layout() {
        let structure = Structure::new(IO::new(MemoryDrive::new(STORE_SIZE)).unwrap()).unwrap();
        let bytes = structure.io.device().as_bytes();

        assert_eq!(bytes[0], b'A');
        assert_eq!(bytes[1], 1);
        assert!(bytes[2..128].iter().all(|&b| b == 0));

        let root = structure.read_inode(0).unwrap();
        assert_eq!(root.kind, InodeKind::Directory);
        assert_eq!(root.name(), "/");
        assert_eq!(root.size, 16);
        assert_eq!(root.pointers[0], 1);
        assert!(root.used);

        assert_eq!(&bytes[1024..1026], b".\0");
        assert_eq!(&bytes[1032..1040], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert!(bytes[2048..].iter().all(|&b| b == 0));
    }

    #[test]
    fn format_then_mount() {
        let structure = Structure::new(IO::new(MemoryDrive::new(STORE_SIZE)).unwrap()).unwrap();
        let io = IO::new(structure.into_device()).unwrap();
        assert!(Structure::is_initialized(&io).unwrap());
        let mounted = Structure::mount(io).unwrap();
        assert_eq!(mounted.read_inode(0).unwrap().name(), "/");
    }

    #[test]
    fn mount_blank_store() {
        let io = IO::new(MemoryDrive::new(STORE_SIZE)).unwrap();
        assert!(!Structure::is_initialized(&io).unwrap());
        assert!(matches!(Structure::mount(io), Err(Error::NotFormatted)));
    }
}
