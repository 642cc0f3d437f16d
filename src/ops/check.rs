use std::collections::BTreeMap;
use std::fmt;

use crate::consts::{BlockPointer, InodePointer};
use crate::driver::DeviceDriver;
use crate::ops::FileSystem;
use crate::structure::blockmap::BlockMap;
use crate::structure::inode_table::InodeTable;
use crate::util::error::{Error, Result};

#[derive(Debug, PartialEq)]
pub enum Problem {
    /// Two in-use inodes claim the same block.
    SharedBlock { block: BlockPointer, first: InodePointer, second: InodePointer },
    /// An in-use inode owns a block the bitmap records as free.
    UnmarkedBlock { block: BlockPointer, inode: InodePointer },
    /// The bitmap records a block as occupied but no in-use inode owns it.
    LeakedBlock { block: BlockPointer },
    /// An in-use inode holds a pointer outside the data area.
    BadInode { inode: InodePointer, reason: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::SharedBlock { block, first, second } => {
                write!(f, "block {} is owned by inodes {} and {}", block, first, second)
            }
            Problem::UnmarkedBlock { block, inode } => write!(f, "block {} of inode {} is marked free", block, inode),
            Problem::LeakedBlock { block } => write!(f, "block {} is marked used but has no owner", block),
            Problem::BadInode { inode, reason } => write!(f, "inode {}: {}", inode, reason),
        }
    }
}

impl<A: DeviceDriver> FileSystem<A> {
    /// Compares block ownership recorded in the inode table with the bitmap.
    /// An empty report means every occupied block has exactly one owner.
    pub fn check(&self) -> Result<Vec<Problem>> {
        let io = &self.structure.io;
        let mut problems = Vec::new();
        let mut owners = BTreeMap::<BlockPointer, InodePointer>::new();

        for (index, inode) in InodeTable::read_all(io)?.iter().enumerate() {
            let index = index as InodePointer;
            if !inode.used {
                continue;
            }
            let blocks = match inode.blocks(io.block_count) {
                Ok(blocks) => blocks,
                Err(Error::Corrupted(reason)) => {
                    problems.push(Problem::BadInode { inode: index, reason });
                    continue;
                }
                Err(err) => return Err(err),
            };
            for block in blocks {
                if let Some(&first) = owners.get(&block) {
                    problems.push(Problem::SharedBlock { block, first, second: index });
                    continue;
                }
                owners.insert(block, index);
                if BlockMap::is_free(io, block)? {
                    problems.push(Problem::UnmarkedBlock { block, inode: index });
                }
            }
        }

        for block in BlockMap::used_blocks(io)? {
            if !owners.contains_key(&block) {
                problems.push(Problem::LeakedBlock { block });
            }
        }
        Ok(problems)
    }
}
