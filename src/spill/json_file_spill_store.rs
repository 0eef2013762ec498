use std::{fs::{self, File}, io::{BufReader, BufWriter, Write}, path::{Path, PathBuf}};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{aggregation::AggregationError, spill::{SpillHandle, SpillStore}};

/// Writes each spilled partition as a JSON array to `<dir>/<handle>.json`.
#[derive(Debug)]
pub struct JsonFileSpillStore {
    dir: PathBuf,
    files: IndexMap<SpillHandle, (PathBuf, usize)>,
}

impl JsonFileSpillStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, files: IndexMap::new() }
    }

    pub fn dir(&self) -> &PathBuf { &self.dir }

    fn path_of(&self, handle: &SpillHandle) -> PathBuf {
        self.dir.join(format!("{handle}.json"))
    }
}

impl SpillStore for JsonFileSpillStore {
    fn write(&mut self, values: Vec<Value>) -> Result<SpillHandle, AggregationError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AggregationError::Spill(format!("could not create {}: {e}", self.dir.display())))?;

        let handle = SpillHandle::generate();
        let path = self.path_of(&handle);
        write_or_discard(&path, |w| {
            serde_json::to_writer(w, &values)
                .map_err(|e| AggregationError::Spill(format!("could not write {}: {e}", path.display())))
        })?;

        let bytes = fs::metadata(&path).map(|m| m.len() as usize).unwrap_or(0);
        debug!(path = %path.display(), bytes, rows = values.len(), "spilled partition");
        self.files.insert(handle.clone(), (path, bytes));
        Ok(handle)
    }

    fn read(&mut self, handle: &SpillHandle) -> Result<Vec<Value>, AggregationError> {
        let (path, _) = self.files.get(handle)
            .ok_or_else(|| AggregationError::Spill(format!("unknown spill partition {handle}")))?;
        let file = File::open(path)
            .map_err(|e| AggregationError::Spill(format!("could not open {}: {e}", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AggregationError::Spill(format!("{} is not a valid spill file: {e}", path.display())))
    }

    fn delete(&mut self, handle: &SpillHandle) -> Result<(), AggregationError> {
        if let Some((path, _)) = self.files.shift_remove(handle) {
            fs::remove_file(&path)
                .map_err(|e| AggregationError::Spill(format!("could not remove {}: {e}", path.display())))?;
        }
        Ok(())
    }

    fn spilled_bytes(&self) -> usize {
        self.files.values().map(|(_, bytes)| bytes).sum()
    }
}

/// Create `path` and fill it; on any failure the partial file is removed.
fn write_or_discard<F>(path: &Path, fill: F) -> Result<(), AggregationError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), AggregationError>,
{
    let file = File::create(path)
        .map_err(|e| AggregationError::Spill(format!("could not create {}: {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    let result = fill(&mut w).and_then(|_| {
        w.flush().map_err(|e| AggregationError::Spill(format!("could not flush {}: {e}", path.display())))
    });
    if result.is_err() {
        drop(w);
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "leaked partial spill file");
        }
    }
    result
}

impl Drop for JsonFileSpillStore {
    fn drop(&mut self) {
        for (_, (path, _)) in self.files.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "leaked spill file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partitions_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileSpillStore::new(dir.path().join("spill"));
        let h = store.write(vec![json!({"sum": 3}), Value::Null]).unwrap();
        assert!(store.path_of(&h).exists());
        assert!(store.spilled_bytes() > 0);
        assert_eq!(store.read(&h).unwrap(), vec![json!({"sum": 3}), Value::Null]);

        store.delete(&h).unwrap();
        assert!(!store.path_of(&h).exists());
        assert_eq!(store.spilled_bytes(), 0);
    }

    #[test]
    fn drop_removes_remaining_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut store = JsonFileSpillStore::new(dir.path().to_path_buf());
            let h = store.write(vec![json!(1)]).unwrap();
            store.path_of(&h)
        };
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_an_operational_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileSpillStore::new(dir.path().to_path_buf());
        let h = store.write(vec![json!(1)]).unwrap();
        fs::write(store.path_of(&h), "not json").unwrap();
        let err = store.read(&h).unwrap_err();
        assert_eq!(err.category(), crate::aggregation::ErrorCategory::Operational);
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        let err = write_or_discard(&path, |w| {
            w.write_all(b"[1, 2").unwrap();
            AggregationError::Spill("disk full".into()).err()
        })
        .unwrap_err();
        assert_eq!(err, AggregationError::Spill("disk full".into()));
        assert!(!path.exists());

        write_or_discard(&path, |w| w.write_all(b"[]").map_err(|e| AggregationError::Spill(e.to_string()))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
