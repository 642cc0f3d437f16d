use std::fmt;

use crate::consts::InodePointer;
use crate::structure::inode::InodeKind;

/// One in-use inode as reported by `LL`.
#[derive(Debug, PartialEq, Clone)]
pub struct Listing {
    pub index: InodePointer,
    pub kind: InodeKind,
    pub name: String,
    pub size: u32,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InodeKind::File => write!(f, "File: {} {}", self.name, self.size),
            InodeKind::Directory => write!(f, "Directory: {} {}", self.name, self.size),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Usage {
    pub used_blocks: usize,
    pub free_blocks: usize,
    pub used_inodes: usize,
    pub free_inodes: usize,
}
