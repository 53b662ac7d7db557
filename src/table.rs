//! Typed table: one data slot file plus one key index.
//!
//! A table composes a [`SlotFile`] holding the records and an
//! [`IndexStore`] resolving logical keys to slot numbers. The index is the
//! sole authority for key→slot resolution; nothing above this module sees
//! slot numbers or byte offsets.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::record::{decode_record, encode_record, Record};
use crate::slotfile::SlotFile;
use std::marker::PhantomData;
use std::path::Path;

/// A typed table of fixed-width records with a sorted key index.
pub struct Table<R: Record> {
    /// Table name, used for file names and diagnostics.
    name: &'static str,
    data: SlotFile,
    index: IndexStore,
    /// Fsync both files after every mutating operation.
    sync_writes: bool,
    _record: PhantomData<R>,
}

impl<R: Record> Table<R> {
    /// Open or create the table's data and index files inside `dir`.
    ///
    /// The files are named `<name>.txt` and `<name>_index.txt`. Fails with
    /// [`Error::CorruptStore`] if the two files disagree: an index entry
    /// pointing beyond the data file, or a slot count that doesn't match
    /// the entry count.
    pub fn open(dir: &Path, name: &'static str, options: &Options) -> Result<Self> {
        let data = SlotFile::open(dir.join(format!("{}.txt", name)), options.record_width)?;
        let index = IndexStore::open(
            dir.join(format!("{}_index.txt", name)),
            options.index_record_width,
        )?;

        let table = Self {
            name,
            data,
            index,
            sync_writes: options.sync_writes,
            _record: PhantomData,
        };
        table.check_consistency()?;

        Ok(table)
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert a new record, returning its slot number.
    ///
    /// The key is checked against the index before anything is written, so
    /// a rejected insert leaves both files untouched.
    pub fn insert(&mut self, record: &R) -> Result<usize> {
        let key = record.key();

        // Validate the index entry and encode the record up front; the
        // first write happens only once both can no longer fail.
        let next_slot = self.data.slot_count();
        self.index
            .check_entry(&key, next_slot)
            .map_err(|e| self.tag(e))?;
        let payload = encode_record(record, self.data.record_width())?;

        let slot = self.data.append_slot(&payload)?;
        self.index.insert(&key, slot).map_err(|e| self.tag(e))?;
        self.maybe_sync()?;

        log::debug!("{}: inserted {:?} at slot {}", self.name, key, slot);
        Ok(slot)
    }

    /// Look up a record by key, returning it with its slot number, or
    /// `Ok(None)` if the key is absent.
    pub fn get(&mut self, key: &str) -> Result<Option<(R, usize)>> {
        let Some(slot) = self.index.lookup(key) else {
            return Ok(None);
        };

        let payload = self.data.read_slot(slot)?.ok_or_else(|| {
            Error::corruption(format!(
                "{}: index maps {:?} to slot {}, beyond the data file",
                self.name, key, slot
            ))
        })?;
        let record = decode_record(&payload)?;

        Ok(Some((record, slot)))
    }

    /// Re-encode a record into the slot it already occupies.
    ///
    /// Used when only non-key fields changed; the index is not touched.
    pub fn update_in_place(&mut self, slot: usize, record: &R) -> Result<()> {
        let payload = encode_record(record, self.data.record_width())?;
        self.data.write_slot(slot, &payload)?;
        self.maybe_sync()?;

        log::debug!("{}: rewrote slot {}", self.name, slot);
        Ok(())
    }

    /// Change a record's key, rewriting the record at its unchanged slot.
    ///
    /// `record` must already carry the new key. Slot identity is
    /// independent of key identity, so only the index entry moves.
    pub fn rename_key(&mut self, old_key: &str, record: &R) -> Result<usize> {
        let new_key = record.key();
        let payload = encode_record(record, self.data.record_width())?;

        let slot = self
            .index
            .rename(old_key, &new_key)
            .map_err(|e| self.tag(e))?;
        self.data.write_slot(slot, &payload)?;
        self.maybe_sync()?;

        log::debug!(
            "{}: renamed {:?} to {:?} at slot {}",
            self.name,
            old_key,
            new_key,
            slot
        );
        Ok(slot)
    }

    /// Delete a record by key, compacting the data file, and return the
    /// removed record.
    ///
    /// The index renumbering and the physical compaction are both derived
    /// from the one slot number the index reports; every slot above it
    /// shifts down one position and the file shrinks by one stride.
    pub fn delete(&mut self, key: &str) -> Result<R> {
        let (record, _) = self
            .get(key)?
            .ok_or_else(|| self.tag(Error::not_found(key.to_string())))?;

        let removed = self
            .index
            .delete_and_renumber(key)
            .map_err(|e| self.tag(e))?;

        let count = self.data.slot_count();
        for slot in removed + 1..count {
            let payload = self.data.read_slot(slot)?.ok_or_else(|| {
                Error::corruption(format!(
                    "{}: slot {} vanished during compaction",
                    self.name, slot
                ))
            })?;
            self.data.write_slot(slot - 1, &payload)?;
        }
        self.data.truncate_from_slot(count - 1)?;
        self.maybe_sync()?;

        log::debug!(
            "{}: deleted {:?} from slot {}, {} slots remain",
            self.name,
            key,
            removed,
            self.data.slot_count()
        );
        Ok(record)
    }

    /// Lazily scan every record in slot order.
    ///
    /// The scan restarts from slot 0 each call and reflects a consistent
    /// snapshot only while the table is not mutated.
    pub fn scan(&mut self) -> Scan<'_, R> {
        Scan {
            data: &mut self.data,
            next_slot: 0,
            _record: PhantomData,
        }
    }

    /// Fsync the data and index files.
    pub fn sync(&mut self) -> Result<()> {
        self.data.sync()?;
        self.index.sync()
    }

    fn maybe_sync(&mut self) -> Result<()> {
        if self.sync_writes {
            self.sync()?;
        }
        Ok(())
    }

    /// Cross-check index entries against the data file on open.
    fn check_consistency(&self) -> Result<()> {
        let count = self.data.slot_count();

        for (key, slot) in self.index.entries() {
            if slot >= count {
                return Err(Error::corruption(format!(
                    "{}: index maps {:?} to slot {}, but only {} slots exist",
                    self.name, key, slot, count
                )));
            }
        }
        if self.index.len() != count {
            return Err(Error::corruption(format!(
                "{}: {} index entries for {} data slots",
                self.name,
                self.index.len(),
                count
            )));
        }

        Ok(())
    }

    /// Prefix an error message with the table name.
    fn tag(&self, error: Error) -> Error {
        match error {
            Error::NotFound(msg) => Error::NotFound(format!("{}: {}", self.name, msg)),
            Error::DuplicateKey(msg) => Error::DuplicateKey(format!("{}: {}", self.name, msg)),
            other => other,
        }
    }
}

/// Lazy iterator over every record of a table, in slot order.
pub struct Scan<'a, R: Record> {
    data: &'a mut SlotFile,
    next_slot: usize,
    _record: PhantomData<R>,
}

impl<R: Record> Iterator for Scan<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next_slot;
        self.next_slot += 1;

        match self.data.read_slot(slot) {
            Ok(Some(payload)) => Some(decode_record(&payload)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
