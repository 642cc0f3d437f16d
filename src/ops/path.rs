use crate::consts::{InodePointer, ROOT_INODE, ROOT_NAME};
use crate::driver::DeviceDriver;
use crate::ops::directory::{Directory, Lookup};
use crate::structure::inode::InodeKind;
use crate::structure::Structure;
use crate::util::error::{Error, Result};

/// Walks every segment but the last from the root and returns the directory
/// holding the leaf together with the leaf's name.
pub fn resolve_parent<A: DeviceDriver>(structure: &Structure<A>, path: &str) -> Result<(InodePointer, String)> {
    if path == ROOT_NAME {
        return Err(Error::InvalidPath(path.to_string()));
    }
    let relative = path.strip_prefix('/').ok_or_else(|| Error::InvalidPath(path.to_string()))?;
    let segments: Vec<&str> = relative.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(Error::InvalidPath(path.to_string()));
    }

    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(Error::InvalidPath(path.to_string())),
    };

    let mut current = ROOT_INODE;
    for segment in parents {
        let directory = Directory::read(structure, current)?;
        current = match directory.find(structure, segment, InodeKind::Directory)? {
            Lookup::Found { inode, .. } => inode,
            _ => return Err(Error::PathSegmentNotFound(segment.to_string())),
        };
    }
    Ok((current, leaf.to_string()))
}
