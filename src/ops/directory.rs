use log::{debug, warn};

use crate::consts::{BlockPointer, InodePointer, BLOCK_SIZE, PARENT_ENTRY, ROOT_INODE, SELF_ENTRY};
use crate::driver::DeviceDriver;
use crate::ops::path::resolve_parent;
use crate::ops::FileSystem;
use crate::structure::blockmap::BlockMap;
use crate::structure::entry::{Entry, ENTRIES_PER_BLOCK, ENTRY_SIZE};
use crate::structure::inode::{encode_name, pointers_from, Inode, InodeKind};
use crate::structure::inode_table::InodeTable;
use crate::structure::Structure;
use crate::util::error::{Error, Result};
use crate::util::serializable::{ByteSerializable, KnownSize};

/// Outcome of looking a name up in one directory. Offsets are byte offsets
/// into the directory's data block.
#[derive(Debug, PartialEq)]
pub enum Lookup {
    Found { offset: u32, inode: InodePointer },
    WrongKind { offset: u32, inode: InodePointer },
    Missing,
}

pub struct Directory {
    pub(crate) index: InodePointer,
    pub(crate) inode: Inode,
}

impl Directory {
    pub fn read<A: DeviceDriver>(structure: &Structure<A>, index: InodePointer) -> Result<Directory> {
        let inode = structure.read_inode(index)?;
        if !inode.used || !inode.kind.is_directory() {
            return Err(Error::Corrupted(format!("inode {} is not an allocated directory", index)));
        }
        Ok(Directory { index, inode })
    }

    fn block<A: DeviceDriver>(&self, structure: &Structure<A>) -> Result<BlockPointer> {
        Ok(self.inode.blocks(structure.io.block_count)?[0])
    }

    fn entry_count(&self) -> Result<usize> {
        let size = self.inode.size as usize;
        if size % Entry::size_on_disk() != 0 || size > BLOCK_SIZE {
            return Err(Error::Corrupted(format!("directory '{}' has size {}", self.inode.name(), size)));
        }
        Ok(size / Entry::size_on_disk())
    }

    /// All stored entries, read in one go.
    pub fn entries<A: DeviceDriver>(&self, structure: &Structure<A>) -> Result<Vec<Entry>> {
        let count = self.entry_count()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let offset = structure.io.block_offset(self.block(structure)?)?;
        let data = structure.io.read_at(offset, count * Entry::size_on_disk())?;
        data.chunks(Entry::size_on_disk()).map(Entry::from_bytes).collect()
    }

    /// An entry of the wanted kind wins over an earlier one of the other kind
    /// carrying the same name.
    pub fn find<A: DeviceDriver>(&self, structure: &Structure<A>, name: &str, want: InodeKind) -> Result<Lookup> {
        let mut result = Lookup::Missing;
        for (i, entry) in self.entries(structure)?.iter().enumerate() {
            if !entry.has_name(name) {
                continue;
            }
            let offset = (i * Entry::size_on_disk()) as u32;
            if structure.read_inode(entry.inode)?.kind == want {
                return Ok(Lookup::Found { offset, inode: entry.inode });
            }
            if result == Lookup::Missing {
                result = Lookup::WrongKind { offset, inode: entry.inode };
            }
        }
        Ok(result)
    }

    /// Fails unless `name` could be inserted right now. Names are unique
    /// within a directory whatever the kind of the entries, and the relative
    /// names `.` and `..` are never stored.
    pub fn check_insert<A: DeviceDriver>(&self, structure: &Structure<A>, name: &str) -> Result<()> {
        if name == SELF_ENTRY || name == PARENT_ENTRY {
            return Err(Error::InvalidPath(name.to_string()));
        }
        encode_name(name)?;
        let entries = self.entries(structure)?;
        if entries.iter().any(|entry| entry.has_name(name)) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        if entries.len() >= ENTRIES_PER_BLOCK {
            return Err(Error::DirectoryFull(self.inode.name()));
        }
        Ok(())
    }

    pub fn insert<A: DeviceDriver>(&mut self, structure: &mut Structure<A>, name: &str, child: InodePointer) -> Result<()> {
        self.check_insert(structure, name)?;
        let entry = Entry::new(name, child)?;
        let offset = structure.io.block_offset(self.block(structure)?)? + self.inode.size as u64;
        structure.io.write_at(offset, &entry.to_bytes())?;

        self.inode.size += Entry::size_on_disk() as u32;
        structure.write_inode(self.index, &self.inode)
    }

    /// Swap-remove: the last entry takes the place of the removed one.
    pub fn remove<A: DeviceDriver>(&mut self, structure: &mut Structure<A>, offset: u32) -> Result<()> {
        let entry_size = Entry::size_on_disk() as u32;
        let count = self.entry_count()? as u32;
        if offset % entry_size != 0 || offset >= count * entry_size {
            return Err(Error::Corrupted(format!("no entry at offset {} of '{}'", offset, self.inode.name())));
        }

        let base = structure.io.block_offset(self.block(structure)?)?;
        let last = (count - 1) * entry_size;
        if offset != last {
            let moved = structure.io.read_at(base + last as u64, entry_size as usize)?;
            structure.io.write_at(base + offset as u64, &moved)?;
        }
        structure.io.write_at(base + last as u64, &[0u8; ENTRY_SIZE])?;

        self.inode.size -= entry_size;
        structure.write_inode(self.index, &self.inode)
    }
}

/// Frees `index` and everything below it. A directory's entries are read
/// once before descending, so the walk never observes its own removals.
pub fn recursive_destroy<A: DeviceDriver>(structure: &mut Structure<A>, index: InodePointer) -> Result<()> {
    let inode = structure.read_inode(index)?;
    if !inode.used {
        warn!("inode {} referenced twice, already freed", index);
        return Ok(());
    }
    InodeTable::release(&mut structure.io, index)?;

    if inode.kind.is_directory() {
        let directory = Directory { index, inode: inode.clone() };
        let snapshot = directory.entries(structure)?;
        for entry in snapshot {
            if entry.inode == index {
                debug!("skipping self entry '{}' of inode {}", entry.name(), index);
                continue;
            }
            recursive_destroy(structure, entry.inode)?;
        }
    }

    for block in inode.blocks(structure.io.block_count)? {
        structure.io.zero_block(block)?;
        BlockMap::mark_free(&mut structure.io, block)?;
    }
    debug!("destroyed {} '{}' (inode {})", inode.kind, inode.name(), index);
    Ok(())
}

impl<A: DeviceDriver> FileSystem<A> {
    /// `CD`: creates an empty directory.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = resolve_parent(&self.structure, path)?;
        let mut directory = Directory::read(&self.structure, parent)?;
        directory.check_insert(&self.structure, &name)?;

        let blocks = BlockMap::allocate(&self.structure.io, 1)?;
        let index = InodeTable::allocate(&self.structure.io)?;

        let inode = Inode::new(InodeKind::Directory, &name, 0, pointers_from(&blocks))?;
        self.structure.io.zero_block(blocks[0])?;
        self.structure.create_inode(index, &inode, &blocks)?;
        directory.insert(&mut self.structure, &name, index)?;

        debug!("created directory {} (inode {}, block {})", path, index, blocks[0]);
        Ok(())
    }

    /// `DD`: removes a directory and everything below it.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        let (parent, name) = resolve_parent(&self.structure, path)?;
        let mut directory = Directory::read(&self.structure, parent)?;
        match directory.find(&self.structure, &name, InodeKind::Directory)? {
            Lookup::Found { inode, .. } if inode == ROOT_INODE || inode == parent => {
                Err(Error::InvalidPath(path.to_string()))
            }
            Lookup::Found { offset, inode } => {
                directory.remove(&mut self.structure, offset)?;
                recursive_destroy(&mut self.structure, inode)?;
                debug!("removed directory {} (inode {})", path, inode);
                Ok(())
            }
            Lookup::WrongKind { .. } => Err(Error::WrongKind { name: path.to_string(), expected: InodeKind::Directory }),
            Lookup::Missing => Err(Error::NotFound(path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::STORE_SIZE;
    use crate::driver::memory_drive::MemoryDrive;
    use crate::ops::FileSystem;
    use crate::structure::inode::InodeKind;
    use crate::util::error::Error;

    use super::*;

    fn filesystem() -> FileSystem<MemoryDrive> {
        FileSystem::format(MemoryDrive::new(STORE_SIZE)).unwrap()
    }

    fn names(fs: &FileSystem<MemoryDrive>, index: InodePointer) -> Vec<String> {
        let directory = Directory::read(&fs.structure, index).unwrap();
        directory.entries(&fs.structure).unwrap().iter().map(|entry| entry.name()).collect()
    }

    #[test]
    fn test_root_entries() {
        let fs = filesystem();
        assert_eq!(names(&fs, 0), vec!["."]);
    }

    #[test]
    fn test_insert_and_find() {
        let mut fs = filesystem();
        fs.mkdir("/d").unwrap();
        fs.create("/f", 10).unwrap();

        let root = Directory::read(&fs.structure, 0).unwrap();
        assert_eq!(root.inode.size, 48);
        assert_eq!(root.find(&fs.structure, "d", InodeKind::Directory).unwrap(), Lookup::Found { offset: 16, inode: 1 });
        assert_eq!(root.find(&fs.structure, "d", InodeKind::File).unwrap(), Lookup::WrongKind { offset: 16, inode: 1 });
        assert_eq!(root.find(&fs.structure, "f", InodeKind::File).unwrap(), Lookup::Found { offset: 32, inode: 2 });
        assert_eq!(root.find(&fs.structure, "g", InodeKind::File).unwrap(), Lookup::Missing);
    }

    #[test]
    fn test_insert_rejects_duplicates_of_any_kind() {
        let mut fs = filesystem();
        fs.mkdir("/d").unwrap();
        let mut root = Directory::read(&fs.structure, 0).unwrap();
        assert!(matches!(root.insert(&mut fs.structure, "d", 5), Err(Error::AlreadyExists(_))));
        assert!(matches!(root.insert(&mut fs.structure, "toolong1", 5), Err(Error::NameTooLong(_))));
        assert_eq!(Directory::read(&fs.structure, 0).unwrap().inode.size, 32);
    }

    #[test]
    fn test_insert_full_block() {
        let mut fs = filesystem();
        let mut root = Directory::read(&fs.structure, 0).unwrap();
        for i in 1..64 {
            root.insert(&mut fs.structure, &format!("e{}", i), 1).unwrap();
        }
        assert_eq!(root.inode.size, 1024);
        assert!(matches!(root.insert(&mut fs.structure, "last", 1), Err(Error::DirectoryFull(_))));
    }

    #[test]
    fn test_swap_remove() {
        let mut fs = filesystem();
        for name in ["/a", "/b", "/c"] {
            fs.mkdir(name).unwrap();
        }
        assert_eq!(names(&fs, 0), vec![".", "a", "b", "c"]);

        let mut root = Directory::read(&fs.structure, 0).unwrap();
        root.remove(&mut fs.structure, 16).unwrap();
        assert_eq!(names(&fs, 0), vec![".", "c", "b"]);

        root.remove(&mut fs.structure, 32).unwrap();
        assert_eq!(names(&fs, 0), vec![".", "c"]);
        assert!(fs.structure.io.device().as_bytes()[1024 + 32..2048].iter().all(|&b| b == 0));
        assert!(matches!(root.remove(&mut fs.structure, 32), Err(Error::Corrupted(_))));
        assert!(matches!(root.remove(&mut fs.structure, 8), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_recursive_destroy_frees_subtree() {
        let mut fs = filesystem();
        fs.mkdir("/a").unwrap();
        fs.mkdir("/a/b").unwrap();
        fs.mkdir("/a/b/c").unwrap();
        fs.create("/a/f", 3000).unwrap();
        fs.create("/a/b/g", 100).unwrap();
        fs.create("/a/b/c/h", 1025).unwrap();
        fs.create("/keep", 10).unwrap();

        fs.rmdir("/a").unwrap();

        let listed: Vec<String> = fs.list().unwrap().iter().map(|listing| listing.name.clone()).collect();
        assert_eq!(listed, vec!["/", "keep"]);
        let usage = fs.usage().unwrap();
        assert_eq!(usage.used_blocks, 2);
        assert_eq!(usage.used_inodes, 2);
        assert!(fs.check().unwrap().is_empty());
    }

    #[test]
    fn test_destroyed_blocks_are_zeroed() {
        let mut fs = filesystem();
        fs.create("/f", 1500).unwrap();
        fs.delete("/f").unwrap();
        let bytes = fs.structure.io.device().as_bytes();
        assert!(bytes[2048..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mkdir() {
        let mut fs = filesystem();
        fs.mkdir("/d").unwrap();
        let directory = Directory::read(&fs.structure, 1).unwrap();
        assert_eq!(directory.inode.name(), "d");
        assert_eq!(directory.inode.size, 0);
        assert!(names(&fs, 1).is_empty());

        assert!(matches!(fs.mkdir("/d"), Err(Error::AlreadyExists(_))));
        fs.create("/f", 1).unwrap();
        assert!(matches!(fs.mkdir("/f"), Err(Error::AlreadyExists(_))));
        assert!(matches!(fs.mkdir("/x/y"), Err(Error::PathSegmentNotFound(_))));
    }

    #[test]
    fn test_relative_names_rejected() {
        let mut fs = filesystem();
        fs.mkdir("/d").unwrap();
        fs.create("/f", 10).unwrap();

        assert!(matches!(fs.create("/d/.", 10), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.mkdir("/d/.."), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.copy("/f", "/d/.."), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.create("/.", 10), Err(Error::InvalidPath(_))));
        assert!(names(&fs, 1).is_empty());
        assert_eq!(names(&fs, 0), vec![".", "d", "f"]);
    }

    #[test]
    fn test_mkdir_inode_exhaustion_leaves_no_trace() {
        let mut fs = filesystem();
        for i in 0..15 {
            fs.create(&format!("/f{}", i), 1).unwrap();
        }
        let before = fs.usage().unwrap();
        assert!(matches!(fs.mkdir("/d"), Err(Error::InodeTableExhausted)));
        assert_eq!(fs.usage().unwrap(), before);
        assert_eq!(names(&fs, 0).len(), 16);
        assert!(fs.check().unwrap().is_empty());
    }

    #[test]
    fn test_mkdir_block_exhaustion_leaves_no_trace() {
        let mut fs = filesystem();
        // a free inode always leaves blocks to spare, so occupy the pool directly
        let free = BlockMap::free_count(&fs.structure.io).unwrap();
        for block in BlockMap::allocate(&fs.structure.io, free).unwrap() {
            BlockMap::mark_used(&mut fs.structure.io, block).unwrap();
        }

        let before = fs.usage().unwrap();
        assert_eq!(before.free_blocks, 0);
        assert!(matches!(fs.mkdir("/d"), Err(Error::BlockPoolExhausted)));
        assert_eq!(fs.usage().unwrap(), before);
        assert_eq!(names(&fs, 0), vec!["."]);
    }

    #[test]
    fn test_rmdir_errors() {
        let mut fs = filesystem();
        fs.create("/f", 1).unwrap();
        assert!(matches!(fs.rmdir("/f"), Err(Error::WrongKind { expected: InodeKind::Directory, .. })));
        assert!(matches!(fs.rmdir("/nope"), Err(Error::NotFound(_))));
        assert!(matches!(fs.rmdir("/"), Err(Error::InvalidPath(_))));
        assert!(matches!(fs.rmdir("/."), Err(Error::InvalidPath(_))));
        assert_eq!(names(&fs, 0), vec![".", "f"]);
    }
}
