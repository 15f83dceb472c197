use crate::board::{GameState, NUM_STATES};
use crate::error::LearnError;
use chrono::offset::Local;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Dense value estimate for every one of the 3^9 configurations, indexed by
/// [`GameState::index`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    values: Array1<f64>,
}

impl Deref for ValueTable {
    type Target = Array1<f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.values
    }
}

impl Default for ValueTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable {
            values: Array1::zeros(NUM_STATES),
        }
    }
    pub fn get(&self, state: &GameState) -> f64 {
        self.values[state.index()]
    }
    pub fn set(&mut self, state: &GameState, value: f64) {
        self.values[state.index()] = value;
    }
    /// Number of entries that moved away from the initial 0.0.
    pub fn visited(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }

    fn checked(self) -> Result<Self, LearnError> {
        if self.values.len() != NUM_STATES {
            return Err(LearnError::TableSize {
                expected: NUM_STATES,
                found: self.values.len(),
            });
        }
        Ok(self)
    }
}

/// Writes `values-<name>-<date>.pickle` and `.json` into `dir`, returning the pickle path.
pub fn value_table_to_disk(
    dir: &Path,
    name: &str,
    table: &ValueTable,
) -> Result<PathBuf, LearnError> {
    let today = Local::now().date_naive();
    let stem = format!("values-{}-{}", name, today);
    let table_pickle: PathBuf = dir.join(format!("{}.pickle", stem));
    let table_json: PathBuf = dir.join(format!("{}.json", stem));
    std::fs::create_dir_all(dir)?;
    let mut file = BufWriter::new(File::create(&table_pickle)?);
    serde_pickle::to_writer(&mut file, table, serde_pickle::SerOptions::new())?;
    file.flush()?;
    let mut file_json = BufWriter::new(File::create(&table_json)?);
    serde_json::to_writer(&mut file_json, table)?;
    file_json.flush()?;
    log::info!("{:<32}{:<32}", "saving value table", table_pickle.display());
    Ok(table_pickle)
}

pub fn value_table_from_disk_pickle(file: &Path) -> Result<ValueTable, LearnError> {
    log::info!("{:<32}{:<32}", "loading value table", file.display());
    let mut reader = BufReader::new(File::open(file)?);
    let mut buf: Vec<u8> = vec![];
    reader.read_to_end(&mut buf)?;
    let decoded: ValueTable = serde_pickle::from_slice(&buf, serde_pickle::DeOptions::new())?;
    decoded.checked()
}

pub fn value_table_from_disk_json(file: &Path) -> Result<ValueTable, LearnError> {
    log::info!("{:<32}{:<32}", "loading value table", file.display());
    let reader = BufReader::new(File::open(file)?);
    let decoded: ValueTable = serde_json::from_reader(reader)?;
    decoded.checked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::Marks;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("learn_ooxx-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn new_table_is_dense_and_zeroed() {
        let table = ValueTable::new();
        assert_eq!(table.len(), NUM_STATES);
        assert!(table.iter().all(|&v| v == 0.0));
        assert_eq!(table.get(&GameState::from([2; 9])), 0.0);
        assert_eq!(table.visited(), 0);
    }

    #[test]
    fn set_then_get() {
        let mut table = ValueTable::new();
        let state = GameState::new().with_move(4, Marks::CROSS);
        table.set(&state, 0.25);
        table.set(&state, 1.0);
        assert_eq!(table.get(&state), 1.0);
        assert_eq!(table.get(&GameState::new()), 0.0);
        assert_eq!(table.visited(), 1);
    }

    #[test]
    fn is_value_table_to_disk_working() {
        let dir = scratch_dir("disk");
        let mut table = ValueTable::new();
        table.set(&GameState::from([1, 1, 1, 2, 2, 0, 0, 0, 0]), 1.0);
        table.set(&GameState::from([1, 1, 0, 2, 2, 0, 0, 0, 0]), -0.5);
        let pickle = value_table_to_disk(&dir, "agent-a", &table).unwrap();
        let from_pickle = value_table_from_disk_pickle(&pickle).unwrap();
        let from_json = value_table_from_disk_json(&pickle.with_extension("json")).unwrap();
        assert_eq!(from_pickle, table);
        assert_eq!(from_json, table);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn truncated_table_is_rejected() {
        let dir = scratch_dir("size");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.json");
        let short = ValueTable {
            values: Array1::zeros(10),
        };
        std::fs::write(&path, serde_json::to_string(&short).unwrap()).unwrap();
        let err = value_table_from_disk_json(&path).unwrap_err();
        assert!(matches!(err, LearnError::TableSize { found: 10, .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
