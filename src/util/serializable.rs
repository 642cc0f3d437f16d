use crate::util::error::Result;

pub trait ByteSerializable: Sized {
    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

pub trait KnownSize: ByteSerializable {
    fn size_on_disk() -> usize;
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buffer = [0u8; 4];
    buffer.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buffer)
}
