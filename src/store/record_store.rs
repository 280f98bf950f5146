//! Record store implementation.
//!
//! The record store owns the open project file. It knows where each record
//! lives (offsets depend on the current plottable and series counts), reads
//! and overwrites fixed-width records, and applies batched scattered byte
//! inserts and deletes in place with a single pass over the file.
//!
//! I/O failures are logged and returned; nothing here rolls back the
//! in-memory model, which stays authoritative.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, instrument, warn};

use crate::error::{Result, StoreError};
use crate::store::{Backlog, GraphMetadata};
use crate::types::{RecordKind, METADATA_SIZE};

/// Largest block moved per read/write while shifting
const COPY_CHUNK: usize = 4096;

/// Single-file store for one project
#[derive(Debug)]
pub struct RecordStore {
    /// The open project file, if any
    file: Option<File>,
    /// Path of the open project file
    path: Option<PathBuf>,
    /// Plottable records currently in the file
    pub(crate) plottable_count: u32,
    /// Series records currently in the file
    pub(crate) series_count: u32,
    /// Staged inserts and deletes
    backlog: Backlog,
    /// Whether to sync after each write
    sync_on_write: bool,
}

impl RecordStore {
    /// Create a closed store
    pub fn new(sync_on_write: bool) -> Self {
        Self {
            file: None,
            path: None,
            plottable_count: 0,
            series_count: 0,
            backlog: Backlog::new(),
            sync_on_write,
        }
    }

    /// Open a project file, closing any file already open.
    ///
    /// On failure the store is left closed.
    pub fn open(&mut self, path: &Path, create: bool) -> Result<()> {
        if self.file.is_some() {
            self.close()?;
        }

        let opened = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .truncate(false)
            .open(path);

        match opened {
            Ok(file) => {
                debug!(path = %path.display(), "opened project file");
                self.file = Some(file);
                self.path = Some(path.to_path_buf());
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open project file");
                Err(StoreError::Io(e))
            }
        }
    }

    /// Sync and release the open file. Staged edits that were never flushed are dropped.
    pub fn close(&mut self) -> Result<()> {
        if !self.backlog.is_empty() {
            warn!(
                inserts = self.backlog.pending_inserts(),
                deletes = self.backlog.pending_deletes(),
                "closing project file with unflushed edits"
            );
            self.backlog.clear();
        }

        let result = match self.file.take() {
            Some(file) => self.report("sync on close", file.sync_all()),
            None => Ok(()),
        };
        self.path = None;
        self.plottable_count = 0;
        self.series_count = 0;
        result
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the open file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| {
            warn!("project file operation with no file open");
            StoreError::NotOpen
        })
    }

    /// Log an I/O failure and convert it
    fn report<T>(&self, op: &'static str, result: io::Result<T>) -> Result<T> {
        result.map_err(|e| {
            error!(op, path = ?self.path, error = %e, "project file I/O failed");
            StoreError::Io(e)
        })
    }

    fn sync_if_needed(&self, file: &File) -> Result<()> {
        if self.sync_on_write {
            self.report("sync", file.sync_data())?;
        }
        Ok(())
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        let file = self.file()?;
        self.report("stat", file.metadata().map(|m| m.len()))
    }

    /// Check if the open file is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Plottable and series record counts used for offsets
    pub fn counts(&self) -> (u32, u32) {
        (self.plottable_count, self.series_count)
    }

    /// Update the record counts. Every later offset moves accordingly.
    pub fn set_counts(&mut self, plottables: u32, series: u32) {
        self.plottable_count = plottables;
        self.series_count = series;
    }

    /// Byte offset of record `index` of `kind`, from the current counts
    pub fn offset(&self, kind: RecordKind, index: usize) -> u64 {
        let index = index as u64;
        let mut offset = METADATA_SIZE as u64;

        if kind == RecordKind::Plottable {
            return offset + RecordKind::Plottable.size() as u64 * index;
        }
        offset += RecordKind::Plottable.size() as u64 * self.plottable_count as u64;

        if kind == RecordKind::Series {
            return offset + RecordKind::Series.size() as u64 * index;
        }
        offset += RecordKind::Series.size() as u64 * self.series_count as u64;

        offset + RecordKind::Cell.size() as u64 * index
    }

    /// Read up to `len` bytes at `pos`. Stops early at end of file.
    pub fn read_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = self.file()?;
        let mut buf = Vec::with_capacity(len);
        self.report("seek", file.seek(SeekFrom::Start(pos)))?;
        self.report("read", (&mut file).take(len as u64).read_to_end(&mut buf))?;

        if buf.len() < len {
            debug!(pos, wanted = len, got = buf.len(), "end of file reached");
        }
        Ok(buf)
    }

    /// Overwrite bytes at `pos`
    pub fn write_bytes(&self, pos: u64, bytes: &[u8]) -> Result<()> {
        let mut file = self.file()?;
        self.report("seek", file.seek(SeekFrom::Start(pos)))?;
        self.report("write", file.write_all(bytes))?;
        self.sync_if_needed(file)
    }

    /// Read one whole record
    pub fn read_record(&self, kind: RecordKind, index: usize) -> Result<Vec<u8>> {
        let bytes = self.read_bytes(self.offset(kind, index), kind.size())?;
        if bytes.len() != kind.size() {
            return Err(StoreError::invalid_file(format!(
                "{:?} record {} is truncated ({} of {} bytes)",
                kind,
                index,
                bytes.len(),
                kind.size()
            )));
        }
        Ok(bytes)
    }

    /// Overwrite one whole record in its slot. Never changes the file length.
    pub fn write_record(&self, kind: RecordKind, index: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() != kind.size() {
            return Err(StoreError::invalid_operation(format!(
                "{:?} record must be {} bytes, got {}",
                kind,
                kind.size(),
                bytes.len()
            )));
        }
        self.write_bytes(self.offset(kind, index), bytes)
    }

    /// Read and decode the header. `None` for an empty file.
    pub fn read_metadata(&self) -> Result<Option<GraphMetadata>> {
        if self.is_empty()? {
            return Ok(None);
        }
        let bytes = self.read_bytes(0, METADATA_SIZE)?;
        GraphMetadata::read(&bytes).map(Some)
    }

    /// Write the header
    pub fn write_metadata(&self, metadata: &GraphMetadata) -> Result<()> {
        self.write_bytes(0, &metadata.to_bytes())
    }

    /// Cut or extend the file to `len` bytes
    pub fn set_len(&self, len: u64) -> Result<()> {
        let file = self.file()?;
        self.report("set length", file.set_len(len))?;
        self.sync_if_needed(file)
    }

    /// Insert bytes at scattered positions in one backward pass.
    ///
    /// Keys are positions in the file *after* insertion. The file grows by
    /// `inserts.len()` bytes.
    #[instrument(skip(self, inserts), fields(count = inserts.len()))]
    pub fn insert_bytes(&self, inserts: &BTreeMap<u64, u8>) -> Result<()> {
        let file = self.file()?;
        if inserts.is_empty() {
            return Ok(());
        }

        let old_len = self.report("stat", file.metadata().map(|m| m.len()))?;
        let new_len = old_len + inserts.len() as u64;
        if let Some((&last, _)) = inserts.last_key_value() {
            if last >= new_len {
                return Err(StoreError::invalid_operation(format!(
                    "insert position {} past end of resulting file ({} bytes)",
                    last, new_len
                )));
            }
        }

        self.report("insert bytes", shift_insert(file, old_len, inserts))?;
        debug!(old_len, new_len, "inserted bytes");
        self.sync_if_needed(file)
    }

    /// Delete bytes at scattered positions in one forward pass.
    ///
    /// Positions refer to the file as it currently is. The file shrinks by
    /// `deletes.len()` bytes.
    #[instrument(skip(self, deletes), fields(count = deletes.len()))]
    pub fn delete_bytes(&self, deletes: &BTreeSet<u64>) -> Result<()> {
        let file = self.file()?;
        if deletes.is_empty() {
            return Ok(());
        }

        let old_len = self.report("stat", file.metadata().map(|m| m.len()))?;
        if let Some(&last) = deletes.last() {
            if last >= old_len {
                return Err(StoreError::invalid_operation(format!(
                    "delete position {} past end of file ({} bytes)",
                    last, old_len
                )));
            }
        }

        self.report("delete bytes", shift_delete(file, old_len, deletes))?;
        debug!(old_len, new_len = old_len - deletes.len() as u64, "deleted bytes");
        self.sync_if_needed(file)
    }

    /// Stage `bytes` for insertion at final position `pos`
    pub fn stage_insert_bytes(&mut self, pos: u64, bytes: &[u8]) {
        self.backlog.stage_insert(pos, bytes);
    }

    /// Stage `len` bytes at current position `pos` for deletion
    pub fn stage_delete_range(&mut self, pos: u64, len: u64) {
        self.backlog.stage_delete(pos, len);
    }

    /// Staged edits
    pub fn backlog(&self) -> &Backlog {
        &self.backlog
    }

    /// Apply every staged insert. Returns the number of bytes inserted.
    ///
    /// On failure the staged inserts are dropped; the file may be left
    /// partially shifted.
    pub fn flush_inserts(&mut self) -> Result<usize> {
        let inserts = self.backlog.take_inserts();
        self.insert_bytes(&inserts)?;
        Ok(inserts.len())
    }

    /// Apply every staged delete. Returns the number of bytes deleted.
    pub fn flush_deletes(&mut self) -> Result<usize> {
        let deletes = self.backlog.take_deletes();
        self.delete_bytes(&deletes)?;
        Ok(deletes.len())
    }

    /// Sync all data to disk
    pub fn sync(&self) -> Result<()> {
        let file = self.file()?;
        self.report("sync", file.sync_all())
    }
}

/// Backward pass: position `p` either receives a staged byte or the old byte
/// at `p - shift`, where `shift` counts staged positions `<= p` not yet placed.
/// Everything above the scan point is already final.
fn shift_insert(file: &File, old_len: u64, inserts: &BTreeMap<u64, u8>) -> io::Result<()> {
    let new_len = old_len + inserts.len() as u64;
    file.set_len(new_len)?;

    let mut buf = vec![0u8; COPY_CHUNK];
    let mut shift = inserts.len() as u64;
    let mut upper = new_len;

    for (&pos, &byte) in inserts.iter().rev() {
        // Positions pos+1..upper hold no staged bytes
        move_up(file, pos + 1 - shift, pos + 1, upper - pos - 1, &mut buf)?;
        write_at(file, pos, &[byte])?;
        shift -= 1;
        upper = pos;
    }

    // Below the lowest staged position nothing moves
    Ok(())
}

/// Forward pass: survivors move down by the number of deleted positions seen.
fn shift_delete(file: &File, old_len: u64, deletes: &BTreeSet<u64>) -> io::Result<()> {
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut shift = 0u64;
    let mut cursor = 0u64;

    for &pos in deletes {
        move_down(file, cursor, cursor - shift, pos - cursor, &mut buf)?;
        shift += 1;
        cursor = pos + 1;
    }
    move_down(file, cursor, cursor - shift, old_len - cursor, &mut buf)?;

    file.set_len(old_len - shift)
}

/// Copy `len` bytes from `src` to a higher `dst`, last chunk first
fn move_up(mut file: &File, src: u64, dst: u64, len: u64, buf: &mut [u8]) -> io::Result<()> {
    if len == 0 || src == dst {
        return Ok(());
    }
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64);
        remaining -= n;
        let chunk = &mut buf[..n as usize];
        file.seek(SeekFrom::Start(src + remaining))?;
        file.read_exact(chunk)?;
        file.seek(SeekFrom::Start(dst + remaining))?;
        file.write_all(chunk)?;
    }
    Ok(())
}

/// Copy `len` bytes from `src` to a lower `dst`, first chunk first
fn move_down(mut file: &File, src: u64, dst: u64, len: u64, buf: &mut [u8]) -> io::Result<()> {
    if len == 0 || src == dst {
        return Ok(());
    }
    let mut done = 0;
    while done < len {
        let n = (len - done).min(buf.len() as u64);
        let chunk = &mut buf[..n as usize];
        file.seek(SeekFrom::Start(src + done))?;
        file.read_exact(chunk)?;
        file.seek(SeekFrom::Start(dst + done))?;
        file.write_all(chunk)?;
        done += n;
    }
    Ok(())
}

fn write_at(mut file: &File, pos: u64, bytes: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(pos))?;
    file.write_all(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    const A_TO_L: [u8; 12] = [65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76];

    fn open_store(dir: &tempfile::TempDir) -> Result<RecordStore> {
        let mut store = RecordStore::new(false);
        store.open(&dir.path().join("test.graph"), true)?;
        Ok(store)
    }

    fn file_contents(store: &RecordStore) -> Result<Vec<u8>> {
        store.read_bytes(0, store.len()? as usize)
    }

    #[test]
    fn test_scattered_insert() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, &A_TO_L)?;

        let inserts: BTreeMap<u64, u8> =
            [(5, 77), (6, 78), (9, 79), (11, 80)].into_iter().collect();
        store.insert_bytes(&inserts)?;

        assert_eq!(
            file_contents(&store)?,
            vec![65, 66, 67, 68, 69, 77, 78, 70, 71, 79, 72, 80, 73, 74, 75, 76]
        );
        Ok(())
    }

    #[test]
    fn test_insert_then_delete_end_to_end() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir)?;
        store.write_bytes(0, &A_TO_L)?;

        for (pos, byte) in [(5u64, 77u8), (6, 78), (9, 79), (11, 80)] {
            store.stage_insert_bytes(pos, &[byte]);
        }
        assert_eq!(store.flush_inserts()?, 4);

        for pos in (0..16).step_by(2) {
            store.stage_delete_range(pos, 1);
        }
        assert_eq!(store.flush_deletes()?, 8);

        // B D M F O P J L
        assert_eq!(file_contents(&store)?, vec![66, 68, 77, 70, 79, 80, 74, 76]);
        assert!(store.backlog().is_empty());
        Ok(())
    }

    #[test]
    fn test_insert_at_both_ends() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, b"bcd")?;

        let inserts: BTreeMap<u64, u8> = [(0, b'a'), (4, b'e')].into_iter().collect();
        store.insert_bytes(&inserts)?;
        assert_eq!(file_contents(&store)?, b"abcde".to_vec());
        Ok(())
    }

    #[test]
    fn test_insert_into_empty_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;

        let inserts: BTreeMap<u64, u8> = [(0, 1), (1, 2)].into_iter().collect();
        store.insert_bytes(&inserts)?;
        assert_eq!(file_contents(&store)?, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_insert_past_end_is_rejected() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, b"abc")?;

        let inserts: BTreeMap<u64, u8> = [(4, b'x')].into_iter().collect();
        assert!(matches!(
            store.insert_bytes(&inserts),
            Err(StoreError::InvalidOperation(_))
        ));
        assert_eq!(file_contents(&store)?, b"abc".to_vec());
        Ok(())
    }

    #[test]
    fn test_delete_past_end_is_rejected() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, b"abc")?;

        let deletes: BTreeSet<u64> = [1, 3].into_iter().collect();
        assert!(store.delete_bytes(&deletes).is_err());
        assert_eq!(file_contents(&store)?, b"abc".to_vec());
        Ok(())
    }

    #[test]
    fn test_delete_everything() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, b"abc")?;

        let deletes: BTreeSet<u64> = (0..3).collect();
        store.delete_bytes(&deletes)?;
        assert_eq!(store.len()?, 0);
        Ok(())
    }

    #[test]
    fn test_random_shifts_match_vec_model() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        let mut rng = StdRng::seed_from_u64(42);

        // Larger than one copy chunk so block moves span several chunks
        let mut model: Vec<u8> = (0..10_000).map(|_| rng.gen()).collect();
        store.write_bytes(0, &model)?;

        for _ in 0..10 {
            let count = rng.gen_range(1..200);
            let final_len = model.len() + count;
            let mut inserts = BTreeMap::new();
            while inserts.len() < count {
                inserts.insert(rng.gen_range(0..final_len as u64), rng.gen::<u8>());
            }
            for (&pos, &byte) in &inserts {
                model.insert(pos as usize, byte);
            }
            store.insert_bytes(&inserts)?;
            assert_eq!(file_contents(&store)?, model);

            let count = rng.gen_range(1..200);
            let mut deletes = BTreeSet::new();
            while deletes.len() < count {
                deletes.insert(rng.gen_range(0..model.len() as u64));
            }
            for &pos in deletes.iter().rev() {
                model.remove(pos as usize);
            }
            store.delete_bytes(&deletes)?;
            assert_eq!(file_contents(&store)?, model);
        }
        Ok(())
    }

    #[test]
    fn test_offsets() {
        let mut store = RecordStore::new(false);
        store.set_counts(2, 3);

        assert_eq!(store.offset(RecordKind::Plottable, 0), 937);
        assert_eq!(store.offset(RecordKind::Plottable, 1), 937 + 321);
        assert_eq!(store.offset(RecordKind::Series, 0), 937 + 2 * 321);
        assert_eq!(store.offset(RecordKind::Series, 2), 937 + 2 * 321 + 2 * 64);
        assert_eq!(store.offset(RecordKind::Cell, 0), 937 + 2 * 321 + 3 * 64);
        assert_eq!(store.offset(RecordKind::Cell, 5), 937 + 2 * 321 + 3 * 64 + 5 * 128);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let mut store = RecordStore::new(false);
        for plottables in 0..4 {
            for series in 0..4 {
                store.set_counts(plottables, series);
                let cells: Vec<u64> = (0..20).map(|i| store.offset(RecordKind::Cell, i)).collect();
                assert!(cells.windows(2).all(|w| w[0] < w[1]));

                let here = store.offset(RecordKind::Cell, 7);
                store.set_counts(plottables + 1, series);
                assert!(store.offset(RecordKind::Cell, 7) > here);
                store.set_counts(plottables, series + 1);
                assert!(store.offset(RecordKind::Cell, 7) > here);
            }
        }
    }

    #[test]
    fn test_closed_store() {
        let store = RecordStore::new(false);
        assert!(!store.is_open());
        assert!(matches!(store.read_bytes(0, 4), Err(StoreError::NotOpen)));
        assert!(matches!(store.write_bytes(0, b"x"), Err(StoreError::NotOpen)));
    }

    #[test]
    fn test_failed_open_leaves_store_closed() {
        let dir = tempdir().unwrap();
        let mut store = RecordStore::new(false);
        let missing = dir.path().join("missing").join("nope.graph");

        assert!(matches!(store.open(&missing, true), Err(StoreError::Io(_))));
        assert!(!store.is_open());
        assert!(store.path().is_none());
    }

    #[test]
    fn test_short_read_at_end_of_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let store = open_store(&dir)?;
        store.write_bytes(0, b"abc")?;

        assert_eq!(store.read_bytes(1, 10)?, b"bc".to_vec());
        assert!(store.read_bytes(5, 2)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_record_round_trip() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut store = open_store(&dir)?;
        store.set_counts(0, 1);
        store.set_len(store.offset(RecordKind::Cell, 2))?;

        let record = vec![7u8; RecordKind::Cell.size()];
        store.write_record(RecordKind::Cell, 1, &record)?;
        assert_eq!(store.read_record(RecordKind::Cell, 1)?, record);
        assert!(store.write_record(RecordKind::Cell, 0, &[1, 2, 3]).is_err());
        assert!(store.read_record(RecordKind::Cell, 2).is_err());
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_contents() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.graph");
        {
            let mut store = RecordStore::new(true);
            store.open(&path, true)?;
            store.write_bytes(0, b"persist")?;
            store.close()?;
            assert!(!store.is_open());
        }

        let mut store = RecordStore::new(false);
        store.open(&path, false)?;
        assert_eq!(store.read_bytes(0, 7)?, b"persist".to_vec());
        Ok(())
    }
}
