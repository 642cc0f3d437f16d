use log::info;

use crate::driver::DeviceDriver;
use crate::io::IO;
use crate::ops::meta::{Listing, Usage};
use crate::structure::blockmap::BlockMap;
use crate::structure::inode_table::InodeTable;
use crate::structure::Structure;
use crate::util::error::Result;

pub mod check;
pub(crate) mod directory;
mod file;
pub mod meta;
pub(crate) mod path;

/// A filesystem living on one device. Every operation runs to completion
/// against the store before returning; nothing is cached between calls.
pub struct FileSystem<A: DeviceDriver> {
    pub(crate) structure: Structure<A>,
}

impl<A: DeviceDriver> FileSystem<A> {
    /// Mounts the filesystem on `device`, formatting it first if it carries
    /// no identifier.
    pub fn open(device: A) -> Result<FileSystem<A>> {
        let io = IO::new(device)?;
        let structure = if Structure::is_initialized(&io)? {
            Structure::mount(io)?
        } else {
            info!("no filesystem found, formatting");
            Structure::new(io)?
        };
        Ok(FileSystem { structure })
    }

    pub fn format(device: A) -> Result<FileSystem<A>> {
        Ok(FileSystem { structure: Structure::new(IO::new(device)?)? })
    }

    pub fn mount(device: A) -> Result<FileSystem<A>> {
        Ok(FileSystem { structure: Structure::mount(IO::new(device)?)? })
    }

    pub fn into_device(self) -> A {
        self.structure.into_device()
    }

    /// `LL`: every in-use inode in table order.
    pub fn list(&self) -> Result<Vec<Listing>> {
        Ok(InodeTable::read_all(&self.structure.io)?
            .into_iter()
            .enumerate()
            .filter(|(_, inode)| inode.used)
            .map(|(index, inode)| Listing { index: index as u32, kind: inode.kind, name: inode.name(), size: inode.size })
            .collect())
    }

    pub fn usage(&self) -> Result<Usage> {
        let io = &self.structure.io;
        let used_blocks = BlockMap::used_blocks(io)?.len();
        let free_inodes = InodeTable::free_count(io)?;
        Ok(Usage {
            used_blocks,
            free_blocks: BlockMap::free_count(io)?,
            used_inodes: crate::consts::INODE_COUNT - free_inodes,
            free_inodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::STORE_SIZE;
    use crate::driver::file_drive::FileDrive;
    use crate::driver::memory_drive::MemoryDrive;
    use crate::structure::inode::InodeKind;
    use crate::util::error::Error;

    use super::*;

    fn filesystem() -> FileSystem<MemoryDrive> {
        FileSystem::format(MemoryDrive::new(STORE_SIZE)).unwrap()
    }

    fn names<D: DeviceDriver>(fs: &FileSystem<D>) -> Vec<String> {
        fs.list().unwrap().into_iter().map(|listing| listing.name).collect()
    }

    /// Occupied blocks must equal the blocks owned by files plus one per directory.
    fn assert_conserved(fs: &FileSystem<MemoryDrive>) {
        let owned: usize = fs
            .list()
            .unwrap()
            .iter()
            .map(|listing| match listing.kind {
                InodeKind::Directory => 1,
                InodeKind::File => (listing.size as usize).div_ceil(1024),
            })
            .sum();
        assert_eq!(fs.usage().unwrap().used_blocks, owned);
        assert!(fs.check().unwrap().is_empty());
    }

    #[test]
    fn fresh_store() {
        let fs = filesystem();
        let listing = fs.list().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].to_string(), "Directory: / 16");
        assert_eq!(
            fs.usage().unwrap(),
            Usage { used_blocks: 1, free_blocks: 126, used_inodes: 1, free_inodes: 15 }
        );
    }

    #[test]
    fn create_delete_create() {
        let mut fs = filesystem();
        fs.create("/foo", 2000).unwrap();
        assert_eq!(fs.list().unwrap()[1].to_string(), "File: foo 2000");

        fs.delete("/foo").unwrap();
        assert_eq!(names(&fs), vec!["/"]);

        fs.create("/foo", 2000).unwrap();
        assert_eq!(names(&fs), vec!["/", "foo"]);
        assert_conserved(&fs);
    }

    #[test]
    fn capacity_recovery() {
        let mut fs = filesystem();
        for round in 0..2 {
            for i in 0..15 {
                fs.create(&format!("/f{}", i), 1000).unwrap_or_else(|err| panic!("round {}: {}", round, err));
            }
            assert!(matches!(fs.create("/more", 1), Err(Error::InodeTableExhausted)));
            for i in 0..15 {
                fs.delete(&format!("/f{}", i)).unwrap();
            }
            assert_eq!(names(&fs), vec!["/"]);
        }
    }

    #[test]
    fn nested_resolution() {
        let mut fs = filesystem();
        fs.mkdir("/a").unwrap();
        fs.mkdir("/a/b").unwrap();
        fs.create("/a/b/f", 10).unwrap();
        assert_eq!(names(&fs), vec!["/", "a", "b", "f"]);
        assert!(matches!(fs.create("/a/x/f", 10), Err(Error::PathSegmentNotFound(_))));
    }

    #[test]
    fn list_follows_table_order() {
        let mut fs = filesystem();
        fs.create("/zz", 1).unwrap();
        fs.create("/aa", 1).unwrap();
        fs.create("/mm", 1).unwrap();
        fs.delete("/zz").unwrap();
        fs.create("/bb", 1).unwrap();
        assert_eq!(names(&fs), vec!["/", "bb", "aa", "mm"]);
    }

    #[test]
    fn conservation_through_mixed_operations() {
        let mut fs = filesystem();
        fs.mkdir("/d").unwrap();
        assert_conserved(&fs);
        fs.create("/d/a", 4097).unwrap();
        assert_conserved(&fs);
        fs.copy("/d/a", "/b").unwrap();
        assert_conserved(&fs);
        fs.move_file("/b", "/d/c").unwrap();
        assert_conserved(&fs);
        fs.create("/e", 0).unwrap();
        assert_conserved(&fs);
        fs.copy("/e", "/d/a").unwrap();
        assert_conserved(&fs);
        fs.rmdir("/d").unwrap();
        assert_conserved(&fs);
        assert_eq!(names(&fs), vec!["/", "e"]);
    }

    #[test]
    fn open_formats_once() {
        let fs = FileSystem::open(MemoryDrive::new(STORE_SIZE)).unwrap();
        let mut fs = FileSystem::open(fs.into_device()).unwrap();
        fs.create("/kept", 10).unwrap();

        let fs = FileSystem::open(fs.into_device()).unwrap();
        assert_eq!(names(&fs), vec!["/", "kept"]);
    }

    #[test]
    fn mount_requires_format() {
        assert!(matches!(FileSystem::mount(MemoryDrive::new(STORE_SIZE)), Err(Error::NotFormatted)));
        assert!(matches!(FileSystem::open(MemoryDrive::new(1024)), Err(Error::DeviceTooSmall { .. })));
    }

    #[test]
    fn independent_instances() {
        let mut first = filesystem();
        let second = filesystem();
        first.create("/only", 10).unwrap();
        assert_eq!(names(&second), vec!["/"]);
    }

    #[test]
    fn persists_to_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("myfs");
        {
            let mut fs = FileSystem::open(FileDrive::new(&path, STORE_SIZE).unwrap()).unwrap();
            fs.mkdir("/d").unwrap();
            fs.create("/d/f", 1500).unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), STORE_SIZE);

        let fs = FileSystem::mount(FileDrive::new(&path, STORE_SIZE).unwrap()).unwrap();
        assert_eq!(fs.read_file("/d/f").unwrap().len(), 1500);
        assert_eq!(names(&fs), vec!["/", "d", "f"]);
    }
}
