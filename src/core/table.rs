use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::record::{Record, RECORD_SIZE};
use crate::core::{Error, Result};

pub fn slot_offset(index: usize) -> u64 {
    (index as u64) * RECORD_SIZE as u64
}

pub fn table_len(workers: usize) -> u64 {
    slot_offset(workers)
}

/// The coordination file: `workers` records back to back, no header.
#[derive(Debug)]
pub struct SlotFile {
    path: PathBuf,
    file: File,
    workers: usize,
    scratch: Vec<u8>,
}

impl SlotFile {
    pub fn open(path: &Path, workers: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| open_error(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            workers,
            scratch: vec![0u8; table_len(workers) as usize],
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Reads the whole table from offset 0 into `records`.
    pub fn read_into(&mut self, records: &mut [Record]) -> Result<()> {
        debug_assert_eq!(records.len(), self.workers);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut self.scratch).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                Error::Corrupt("coordination file shorter than slot table")
            } else {
                Error::Io(err)
            }
        })?;
        for (record, chunk) in records.iter_mut().zip(self.scratch.chunks_exact(RECORD_SIZE)) {
            let bytes: &[u8; RECORD_SIZE] = chunk
                .try_into()
                .map_err(|_| Error::Corrupt("slot chunk length"))?;
            *record = Record::from_bytes(bytes)?;
        }
        Ok(())
    }

    /// Persists one slot and flushes it to storage before returning.
    pub fn write_slot(&mut self, index: usize, record: &Record) -> Result<()> {
        if index >= self.workers {
            return Err(Error::InvalidWorker {
                index,
                workers: self.workers,
            });
        }
        self.file.seek(SeekFrom::Start(slot_offset(index)))?;
        self.file
            .write_all(&record.to_bytes())
            .map_err(|err| Error::read_only(&self.path, err))?;
        self.file
            .sync_data()
            .map_err(|err| Error::read_only(&self.path, err))?;
        Ok(())
    }
}

/// Whether `path` already opens for read+write.
pub fn exists_writable(path: &Path) -> bool {
    OpenOptions::new().read(true).write(true).open(path).is_ok()
}

fn open_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem | ErrorKind::StorageFull => {
            Error::read_only(path, err)
        }
        _ => Error::Io(err),
    }
}
