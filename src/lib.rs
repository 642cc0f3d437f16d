//! A small Unix-like filesystem emulated on a 128 KiB byte store: an
//! identifier byte, a one-byte-per-block occupancy map, sixteen inodes with
//! eight direct pointers each, and directories held in a single block.

pub mod consts;
pub mod driver;
mod io;
pub mod ops;
pub mod script;
mod structure;
pub mod util;

pub use driver::file_drive::FileDrive;
pub use driver::memory_drive::MemoryDrive;
pub use driver::DeviceDriver;
pub use ops::meta::{Listing, Usage};
pub use ops::FileSystem;
pub use structure::inode::InodeKind;
pub use util::error::{Error, Result};
