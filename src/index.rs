//! Sorted key→slot index.
//!
//! Each table keeps an index file next to its data file: one fixed-width
//! line per entry of the form `key;slot`, padded with spaces and sorted
//! ascending by key. The in-memory ordered map is the authority for every
//! lookup; the file is a mirror, rewritten in full on every mutation.
//! Index entries are tiny relative to data records, so the full rewrite is
//! a deliberate simplicity/throughput trade-off.

use crate::error::{Error, Result};
use crate::record::FIELD_SEPARATOR;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Ordered mapping from logical key to data-file slot number, mirrored to
/// an index file on every mutation.
pub struct IndexStore {
    path: PathBuf,
    file: File,
    /// Width of one entry, excluding the newline terminator.
    entry_width: usize,
    map: BTreeMap<String, usize>,
}

impl IndexStore {
    /// Open or create an index file, loading every entry into memory.
    ///
    /// Fails with [`Error::CorruptStore`] if the file length is not a whole
    /// number of entries, an entry is malformed, or a key appears twice.
    pub fn open<P: AsRef<Path>>(path: P, entry_width: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let stride = entry_width + 1;
        if raw.len() % stride != 0 {
            return Err(Error::corruption(format!(
                "{}: length {} is not a multiple of entry stride {}",
                path.display(),
                raw.len(),
                stride
            )));
        }

        let mut map = BTreeMap::new();
        for chunk in raw.chunks_exact(stride) {
            let (key, slot) = decode_entry(&path, &chunk[..entry_width])?;
            if chunk[entry_width] != b'\n' {
                return Err(Error::corruption(format!(
                    "{}: entry for key {:?} is missing its terminator",
                    path.display(),
                    key
                )));
            }
            if map.insert(key.clone(), slot).is_some() {
                return Err(Error::corruption(format!(
                    "{}: key {:?} appears more than once",
                    path.display(),
                    key
                )));
            }
        }

        Ok(Self {
            path,
            file,
            entry_width,
            map,
        })
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up the slot number for `key`, if present.
    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Iterate over `(key, slot)` entries in ascending key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.map.iter().map(|(key, slot)| (key.as_str(), *slot))
    }

    /// Check that `key` mapped to `slot` could be inserted: the key is
    /// representable, the encoded entry fits the entry width, and the key
    /// is not already present. Performs no mutation.
    pub fn check_entry(&self, key: &str, slot: usize) -> Result<()> {
        if key.is_empty() {
            return Err(Error::encoding("index key must not be empty"));
        }
        if key.contains(FIELD_SEPARATOR) || key.contains('\n') || key.contains('\r') {
            return Err(Error::encoding(format!(
                "index key {:?} contains a reserved character",
                key
            )));
        }

        let encoded_len = key.len() + 1 + decimal_digits(slot);
        if encoded_len > self.entry_width {
            return Err(Error::encoding(format!(
                "index entry for key {:?} is {} bytes, exceeding entry width {}",
                key, encoded_len, self.entry_width
            )));
        }

        if self.map.contains_key(key) {
            return Err(Error::duplicate_key(key.to_string()));
        }

        Ok(())
    }

    /// Insert a new entry, maintaining sort order, and persist the index.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is already present.
    pub fn insert(&mut self, key: &str, slot: usize) -> Result<()> {
        self.check_entry(key, slot)?;
        self.map.insert(key.to_string(), slot);
        self.persist()
    }

    /// Rename a key, preserving its slot number, and persist the index.
    ///
    /// Fails with [`Error::NotFound`] if `old_key` is absent and
    /// [`Error::DuplicateKey`] if `new_key` is already present.
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> Result<usize> {
        let slot = self
            .lookup(old_key)
            .ok_or_else(|| Error::not_found(old_key.to_string()))?;
        self.check_entry(new_key, slot)?;

        self.map.remove(old_key);
        self.map.insert(new_key.to_string(), slot);
        self.persist()?;

        Ok(slot)
    }

    /// Remove a key and renumber the survivors, returning the removed
    /// entry's slot number.
    ///
    /// Every remaining entry whose slot number is greater than the removed
    /// one is decremented by one, matching the physical compaction the
    /// caller performs on the data file. Both sides must derive from the
    /// returned slot value, never recompute it.
    pub fn delete_and_renumber(&mut self, key: &str) -> Result<usize> {
        let removed = self
            .map
            .remove(key)
            .ok_or_else(|| Error::not_found(key.to_string()))?;

        for slot in self.map.values_mut() {
            if *slot > removed {
                *slot -= 1;
            }
        }
        self.persist()?;

        Ok(removed)
    }

    /// Fsync the index file to persistent storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path to the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the whole index file from the in-memory map.
    fn persist(&mut self) -> Result<()> {
        let mut buf = Vec::with_capacity(self.map.len() * (self.entry_width + 1));

        for (key, slot) in &self.map {
            let entry = format!("{}{}{}", key, FIELD_SEPARATOR, slot);
            if entry.len() > self.entry_width {
                return Err(Error::encoding(format!(
                    "index entry for key {:?} is {} bytes, exceeding entry width {}",
                    key,
                    entry.len(),
                    self.entry_width
                )));
            }
            buf.extend_from_slice(entry.as_bytes());
            buf.resize(buf.len() + self.entry_width - entry.len(), b' ');
            buf.push(b'\n');
        }

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf)?;
        self.file.set_len(buf.len() as u64)?;

        Ok(())
    }
}

fn decode_entry(path: &Path, raw: &[u8]) -> Result<(String, usize)> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        Error::corruption(format!("{}: entry is not valid UTF-8: {}", path.display(), e))
    })?;
    let trimmed = text.trim_end_matches(' ');

    let (key, slot) = trimmed.split_once(FIELD_SEPARATOR).ok_or_else(|| {
        Error::corruption(format!(
            "{}: entry {:?} has no separator",
            path.display(),
            trimmed
        ))
    })?;
    let slot = slot.parse().map_err(|_| {
        Error::corruption(format!(
            "{}: entry {:?} has a malformed slot number",
            path.display(),
            trimmed
        ))
    })?;

    Ok((key.to_string(), slot))
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
