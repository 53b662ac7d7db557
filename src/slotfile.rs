//! Fixed-stride slot file.
//!
//! A slot file is a flat file of equally sized slots addressed by a
//! zero-based slot number. Each slot holds `record_width` payload bytes
//! followed by a single newline terminator, so the byte offset of slot `n`
//! is `n * (record_width + 1)`. Slots are overwritten in place and only
//! ever removed from the tail; compaction above this layer moves payloads
//! between slots, never the terminators.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Width of the slot terminator: a single newline byte.
pub const TERMINATOR_WIDTH: usize = 1;

const TERMINATOR: u8 = b'\n';

/// A flat file of fixed-stride slots addressed by slot number.
pub struct SlotFile {
    /// Path to the slot file.
    path: PathBuf,
    /// Underlying file handle, held for the life of the slot file.
    file: File,
    /// Payload width of one slot, excluding the terminator.
    record_width: usize,
    /// Current file length, tracked in memory across writes.
    len: u64,
}

impl SlotFile {
    /// Open or create a slot file with the given record width.
    ///
    /// Fails with [`Error::CorruptStore`] if the existing file's length is
    /// not a whole number of strides.
    pub fn open<P: AsRef<Path>>(path: P, record_width: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let len = file.metadata()?.len();

        let slot_file = Self {
            path,
            file,
            record_width,
            len,
        };
        slot_file.check_alignment()?;

        Ok(slot_file)
    }

    /// Payload width of one slot.
    pub fn record_width(&self) -> usize {
        self.record_width
    }

    /// Byte distance between consecutive slots.
    pub fn stride(&self) -> usize {
        self.record_width + TERMINATOR_WIDTH
    }

    /// Number of slots currently stored.
    pub fn slot_count(&self) -> usize {
        (self.len / self.stride() as u64) as usize
    }

    /// Read the payload of slot `n`.
    ///
    /// Returns `Ok(None)` if `n` is beyond the current end of the file.
    pub fn read_slot(&mut self, n: usize) -> Result<Option<Bytes>> {
        if n >= self.slot_count() {
            return Ok(None);
        }

        self.file
            .seek(SeekFrom::Start((n * self.stride()) as u64))?;

        let mut payload = vec![0u8; self.record_width];
        self.file.read_exact(&mut payload)?;

        Ok(Some(Bytes::from(payload)))
    }

    /// Overwrite the payload of slot `n` in place.
    ///
    /// The terminator byte is not touched. The payload must be exactly
    /// `record_width` bytes and the slot must already exist.
    pub fn write_slot(&mut self, n: usize, payload: &[u8]) -> Result<()> {
        self.check_payload(payload)?;

        if n >= self.slot_count() {
            return Err(Error::invalid_argument(format!(
                "{}: slot {} is beyond the {} stored slots",
                self.path.display(),
                n,
                self.slot_count()
            )));
        }

        self.file
            .seek(SeekFrom::Start((n * self.stride()) as u64))?;
        self.file.write_all(payload)?;

        Ok(())
    }

    /// Append a new slot at the end of the file, returning its slot number.
    pub fn append_slot(&mut self, payload: &[u8]) -> Result<usize> {
        self.check_payload(payload)?;

        let slot = self.slot_count();

        self.file.seek(SeekFrom::Start(self.len))?;
        self.file.write_all(payload)?;
        self.file.write_all(&[TERMINATOR])?;

        self.len += self.stride() as u64;

        Ok(slot)
    }

    /// Discard every slot at index `n` and beyond.
    pub fn truncate_from_slot(&mut self, n: usize) -> Result<()> {
        if n >= self.slot_count() {
            return Ok(());
        }

        let new_len = (n * self.stride()) as u64;
        self.file.set_len(new_len)?;
        self.len = new_len;

        Ok(())
    }

    /// Fsync the file to persistent storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path to the slot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_alignment(&self) -> Result<()> {
        if self.len % self.stride() as u64 != 0 {
            return Err(Error::corruption(format!(
                "{}: length {} is not a multiple of stride {}",
                self.path.display(),
                self.len,
                self.stride()
            )));
        }
        Ok(())
    }

    fn check_payload(&self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.record_width {
            return Err(Error::invalid_argument(format!(
                "slot payload must be exactly {} bytes, got {}",
                self.record_width,
                payload.len()
            )));
        }
        Ok(())
    }
}
