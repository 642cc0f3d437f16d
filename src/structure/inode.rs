use std::fmt;

use crate::consts::{BlockPointer, DirectPointers, FileName, BLOCK_SIZE, DIRECT_POINTERS, FILE_NAME_LENGTH, NAME_FIELD_SIZE};
use crate::util::error::{Error, Result};
use crate::util::serializable::{read_u32, ByteSerializable, KnownSize};

const NULL_POINTER: BlockPointer = 0;

const KIND_OFFSET: usize = 0;
const NAME_OFFSET: usize = 4;
const SIZE_OFFSET: usize = NAME_OFFSET + NAME_FIELD_SIZE;
const POINTERS_OFFSET: usize = SIZE_OFFSET + 4;
const USED_OFFSET: usize = POINTERS_OFFSET + DIRECT_POINTERS * 4;
const RESERVED_OFFSET: usize = USED_OFFSET + 4;
const INODE_SIZE: usize = RESERVED_OFFSET + 4;

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum InodeKind {
    File,
    Directory,
}

impl InodeKind {
    pub fn is_directory(self) -> bool {
        self == InodeKind::Directory
    }
}

impl fmt::Display for InodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InodeKind::File => write!(f, "file"),
            InodeKind::Directory => write!(f, "directory"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Inode {
    pub kind: InodeKind,
    pub(crate) name: FileName,
    pub size: u32,
    pub(crate) pointers: DirectPointers,
    pub used: bool,
}

impl Inode {
    pub fn new(kind: InodeKind, name: &str, size: u32, pointers: DirectPointers) -> Result<Inode> {
        Ok(Inode { kind, name: encode_name(name)?, size, pointers, used: true })
    }

    pub fn name(&self) -> String {
        decode_name(&self.name)
    }

    /// Number of data blocks the inode owns.
    pub fn block_count(&self) -> usize {
        match self.kind {
            InodeKind::Directory => 1,
            InodeKind::File => blocks_for(self.size as u64),
        }
    }

    /// The owned block pointers, each checked to address a data block.
    pub fn blocks(&self, block_count: u64) -> Result<Vec<BlockPointer>> {
        let count = self.block_count();
        if count > DIRECT_POINTERS {
            return Err(Error::Corrupted(format!("inode '{}' claims {} blocks", self.name(), count)));
        }
        self.pointers[..count]
            .iter()
            .map(|&pointer| {
                if pointer == NULL_POINTER || pointer as u64 >= block_count {
                    Err(Error::Corrupted(format!("inode '{}' points at block {}", self.name(), pointer)))
                } else {
                    Ok(pointer)
                }
            })
            .collect()
    }
}

pub(crate) fn blocks_for(size: u64) -> usize {
    size.div_ceil(BLOCK_SIZE as u64) as usize
}

pub(crate) fn pointers_from(blocks: &[BlockPointer]) -> DirectPointers {
    let mut pointers = [NULL_POINTER; DIRECT_POINTERS];
    pointers[..blocks.len()].copy_from_slice(blocks);
    pointers
}

pub(crate) fn encode_name(name: &str) -> Result<FileName> {
    if name.len() > FILE_NAME_LENGTH {
        return Err(Error::NameTooLong(name.to_string()));
    }
    if name.is_empty() || (name != "/" && name.bytes().any(|b| b == 0 || b == b'/')) {
        return Err(Error::InvalidPath(name.to_string()));
    }
    let mut field = [0u8; NAME_FIELD_SIZE];
    field[..name.len()].copy_from_slice(name.as_bytes());
    Ok(field)
}

pub(crate) fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

impl ByteSerializable for Inode {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::with_capacity(INODE_SIZE);
        bytes.extend_from_slice(&(self.kind.is_directory() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.size.to_le_bytes());
        for pointer in self.pointers {
            bytes.extend_from_slice(&pointer.to_le_bytes());
        }
        bytes.extend_from_slice(&(self.used as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INODE_SIZE {
            return Err(Error::Corrupted(format!("inode record of {} bytes", bytes.len())));
        }
        let kind = match read_u32(bytes, KIND_OFFSET) {
            0 => InodeKind::File,
            _ => InodeKind::Directory,
        };
        let mut name = [0u8; NAME_FIELD_SIZE];
        name.copy_from_slice(&bytes[NAME_OFFSET..NAME_OFFSET + NAME_FIELD_SIZE]);
        let mut pointers = [NULL_POINTER; DIRECT_POINTERS];
        for (i, pointer) in pointers.iter_mut().enumerate() {
            *pointer = read_u32(bytes, POINTERS_OFFSET + i * 4);
        }

        Ok(Inode {
            kind,
            name,
            size: read_u32(bytes, SIZE_OFFSET),
            pointers,
            used: read_u32(bytes, USED_OFFSET) != 0,
        })
    }
}

impl KnownSize for Inode {
    #[inline]
    fn size_on_disk() -> usize {
        INODE_SIZE
    }
}
