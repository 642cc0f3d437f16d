use log::debug;

use crate::consts::{BlockPointer, DIRECT_POINTERS, MAX_FILE_SIZE};
use crate::driver::DeviceDriver;
use crate::ops::directory::{recursive_destroy, Directory, Lookup};
use crate::ops::path::resolve_parent;
use crate::ops::FileSystem;
use crate::structure::blockmap::BlockMap;
use crate::structure::inode::{blocks_for, pointers_from, Inode, InodeKind};
use crate::structure::inode_table::InodeTable;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

/// Lowercase filler standing in for real file content.
fn placeholder(len: usize, start: usize) -> Vec<u8> {
    (start..start + len).map(|i| b'a' + (i % 26) as u8).collect()
}

fn fill_placeholder<A: DeviceDriver>(structure: &mut Structure<A>, blocks: &[BlockPointer], size: u64) -> Result<()> {
    let block_size = structure.io.block_size;
    for (i, &block) in blocks.iter().enumerate() {
        let start = i * block_size;
        let len = (size as usize - start).min(block_size);
        let mut data = placeholder(len, start);
        data.resize(block_size, 0);
        structure.io.write_block(block, &data)?;
    }
    Ok(())
}

fn copy_blocks<A: DeviceDriver>(structure: &mut Structure<A>, source: &[BlockPointer], target: &[BlockPointer]) -> Result<()> {
    for (&from, &to) in source.iter().zip(target) {
        let data = structure.io.read_block(from)?;
        structure.io.write_block(to, &data)?;
    }
    Ok(())
}

impl<A: DeviceDriver> FileSystem<A> {
    /// `CR`: creates a file of `size` bytes filled with placeholder content.
    pub fn create(&mut self, path: &str, size: u64) -> Result<()> {
        let (parent, name) = resolve_parent(&self.structure, path)?;

        let block_count = blocks_for(size);
        if block_count > DIRECT_POINTERS {
            return Err(Error::SizeLimitExceeded { size, limit: MAX_FILE_SIZE });
        }

        let mut directory = Directory::read(&self.structure, parent)?;
        directory.check_insert(&self.structure, &name)?;
        let blocks = BlockMap::allocate(&self.structure.io, block_count)?;
        let index = InodeTable::allocate(&self.structure.io)?;

        let inode = Inode::new(InodeKind::File, &name, size as u32, pointers_from(&blocks))?;
        self.structure.create_inode(index, &inode, &blocks)?;
        directory.insert(&mut self.structure, &name, index)?;
        fill_placeholder(&mut self.structure, &blocks, size)?;

        debug!("created {} ({} bytes, inode {}, blocks {:?})", path, size, index, blocks);
        Ok(())
    }

    /// `DL`: removes a file.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let (parent, name) = resolve_parent(&self.structure, path)?;
        let mut directory = Directory::read(&self.structure, parent)?;
        match directory.find(&self.structure, &name, InodeKind::File)? {
            Lookup::Found { offset, inode } => {
                directory.remove(&mut self.structure, offset)?;
                recursive_destroy(&mut self.structure, inode)?;
                debug!("deleted {} (inode {})", path, inode);
                Ok(())
            }
            Lookup::WrongKind { .. } => Err(Error::WrongKind { name: path.to_string(), expected: InodeKind::File }),
            Lookup::Missing => Err(Error::NotFound(path.to_string())),
        }
    }

    /// `CP`: duplicates a file, replacing a file already at `destination`.
    pub fn copy(&mut self, source: &str, destination: &str) -> Result<()> {
        let (source_parent, source_name) = resolve_parent(&self.structure, source)?;
        let (target_parent, target_name) = resolve_parent(&self.structure, destination)?;

        let source_index = match Directory::read(&self.structure, source_parent)?.find(&self.structure, &source_name, InodeKind::File)? {
            Lookup::Found { inode, .. } => inode,
            Lookup::WrongKind { .. } => {
                return Err(Error::WrongKind { name: source.to_string(), expected: InodeKind::File })
            }
            Lookup::Missing => return Err(Error::NotFound(source.to_string())),
        };
        let source_inode = self.structure.read_inode(source_index)?;
        let source_blocks = source_inode.blocks(self.structure.io.block_count)?;

        let directory = Directory::read(&self.structure, target_parent)?;
        let replaced = match directory.find(&self.structure, &target_name, InodeKind::File)? {
            Lookup::Found { inode, .. } if inode == source_index => {
                return Err(Error::SameFile(source.to_string(), destination.to_string()))
            }
            Lookup::Found { offset, inode } => Some((offset, inode)),
            Lookup::WrongKind { .. } => {
                return Err(Error::WrongKind { name: destination.to_string(), expected: InodeKind::File })
            }
            Lookup::Missing => {
                directory.check_insert(&self.structure, &target_name)?;
                None
            }
        };

        // everything that can fail for lack of space is decided before the first write
        let (reclaimed_inodes, reclaimed_blocks) = match replaced {
            Some((_, inode)) => (1, self.structure.read_inode(inode)?.block_count()),
            None => (0, 0),
        };
        if InodeTable::free_count(&self.structure.io)? + reclaimed_inodes == 0 {
            return Err(Error::InodeTableExhausted);
        }
        if BlockMap::free_count(&self.structure.io)? + reclaimed_blocks < source_blocks.len() {
            return Err(Error::BlockPoolExhausted);
        }

        if let Some((offset, inode)) = replaced {
            Directory::read(&self.structure, target_parent)?.remove(&mut self.structure, offset)?;
            recursive_destroy(&mut self.structure, inode)?;
            debug!("replacing {} (inode {})", destination, inode);
        }

        let blocks = BlockMap::allocate(&self.structure.io, source_blocks.len())?;
        let index = InodeTable::allocate(&self.structure.io)?;
        copy_blocks(&mut self.structure, &source_blocks, &blocks)?;

        let inode = Inode::new(InodeKind::File, &target_name, source_inode.size, pointers_from(&blocks))?;
        self.structure.create_inode(index, &inode, &blocks)?;
        Directory::read(&self.structure, target_parent)?.insert(&mut self.structure, &target_name, index)?;

        debug!("copied {} to {} (inode {}, blocks {:?})", source, destination, index, blocks);
        Ok(())
    }

    /// `MV`: a copy followed by a delete of the source. The pair is not
    /// atomic; a failed copy leaves the source untouched.
    pub fn move_file(&mut self, source: &str, destination: &str) -> Result<()> {
        self.copy(source, destination)?;
        self.delete(source)
    }

    /// The content of a file, `size` bytes long.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let (parent, name) = resolve_parent(&self.structure, path)?;
        let index = match Directory::read(&self.structure, parent)?.find(&self.structure, &name, InodeKind::File)? {
            Lookup::Found { inode, .. } => inode,
            Lookup::WrongKind { .. } => {
                return Err(Error::WrongKind { name: path.to_string(), expected: InodeKind::File })
            }
            Lookup::Missing => return Err(Error::NotFound(path.to_string())),
        };

        let inode = self.structure.read_inode(index)?;
        let mut data = Vec::with_capacity(inode.size as usize);
        for block in inode.blocks(self.structure.io.block_count)? {
            data.append(&mut self.structure.io.read_block(block)?);
        }
        data.truncate(inode.size as usize);
        Ok(data)
    }
}
