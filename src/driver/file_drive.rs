use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

use log::debug;

use crate::driver::DeviceDriver;

pub struct FileDrive {
    file: File,
    bytes: u64,
}

impl FileDrive {
    /// Opens the image at `path`, creating it if missing. A file shorter than
    /// `bytes` is extended with zeros; existing content is kept.
    pub fn new<P: AsRef<Path>>(path: P, bytes: u64) -> io::Result<FileDrive> {
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path.as_ref())?;
        let current = file.metadata()?.len();
        if current < bytes {
            debug!("extending {} from {} to {} bytes", path.as_ref().display(), current, bytes);
            file.set_len(bytes)?;
        }
        Ok(FileDrive { file, bytes: current.max(bytes) })
    }
}

impl DeviceDriver for FileDrive {
    fn get_size(&self) -> u64 {
        self.bytes
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(buffer, offset)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.write_all_at(data, offset)
    }
}
