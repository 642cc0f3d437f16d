use crate::consts::{FileName, InodePointer, BLOCK_SIZE, NAME_FIELD_SIZE};
use crate::structure::inode::{decode_name, encode_name};
use crate::util::error::{Error, Result};
use crate::util::serializable::{read_u32, ByteSerializable, KnownSize};

pub(crate) const ENTRY_SIZE: usize = NAME_FIELD_SIZE + 4 + 4;

pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / ENTRY_SIZE;

/// A (name, inode) record inside a directory's data block.
#[derive(Debug, PartialEq, Clone)]
pub struct Entry {
    name: FileName,
    name_length: u32,
    pub inode: InodePointer,
}

impl Entry {
    pub fn new(name: &str, inode: InodePointer) -> Result<Entry> {
        Ok(Entry { name: encode_name(name)?, name_length: name.len() as u32, inode })
    }

    pub fn name(&self) -> String {
        decode_name(&self.name)
    }

    pub fn has_name(&self, name: &str) -> bool {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_SIZE);
        &self.name[..end] == name.as_bytes()
    }
}

impl ByteSerializable for Entry {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::with_capacity(ENTRY_SIZE);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.name_length.to_le_bytes());
        bytes.extend_from_slice(&self.inode.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_SIZE {
            return Err(Error::Corrupted(format!("directory entry of {} bytes", bytes.len())));
        }
        let mut name = [0u8; NAME_FIELD_SIZE];
        name.copy_from_slice(&bytes[..NAME_FIELD_SIZE]);
        Ok(Entry {
            name,
            name_length: read_u32(bytes, NAME_FIELD_SIZE),
            inode: read_u32(bytes, NAME_FIELD_SIZE + 4),
        })
    }
}

impl KnownSize for Entry {
    fn size_on_disk() -> usize {
        ENTRY_SIZE
    }
}
