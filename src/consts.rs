pub const BLOCK_SIZE: usize = 1024;
pub const BLOCK_COUNT: usize = 128;
pub const INODE_COUNT: usize = 16;
pub const DIRECT_POINTERS: usize = 8;
pub const STORE_SIZE: u64 = (BLOCK_SIZE * BLOCK_COUNT) as u64;

// visible characters, the stored field keeps one more for the terminating NUL
pub const FILE_NAME_LENGTH: usize = 7;
pub const NAME_FIELD_SIZE: usize = FILE_NAME_LENGTH + 1;

pub const MAX_FILE_SIZE: u64 = (BLOCK_SIZE * DIRECT_POINTERS) as u64;

pub(crate) const IDENTIFIER: u8 = b'A';
pub(crate) const IDENTIFIER_OFFSET: u64 = 0;
pub(crate) const BLOCK_MAP_OFFSET: u64 = 0;
pub(crate) const INODE_TABLE_OFFSET: u64 = BLOCK_COUNT as u64;

pub(crate) const ROOT_INODE: InodePointer = 0;
pub(crate) const ROOT_BLOCK: BlockPointer = 1;
pub(crate) const ROOT_NAME: &str = "/";
pub(crate) const SELF_ENTRY: &str = ".";
pub(crate) const PARENT_ENTRY: &str = "..";

pub type BlockPointer = u32;
pub type InodePointer = u32;
pub type DirectPointers = [BlockPointer; DIRECT_POINTERS];
pub type FileName = [u8; NAME_FIELD_SIZE];
