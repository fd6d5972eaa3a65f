//! Checkpoint stores shared by cooperating runs.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::format::{CheckpointError, CompressionType, read_checkpoint, write_checkpoint};
use crate::compute::evolution::Population;
use crate::schema::Score;

/// A durable snapshot of a population shared between runs.
///
/// Merging is last-writer-wins per score key: loaded entries overwrite local
/// candidates with the same score.
pub trait Checkpoint<C> {
    /// Load the stored entries. A store that was never written yields no entries.
    fn load(&self) -> Result<Vec<(Score, C)>, CheckpointError>;

    /// Replace the stored snapshot with `population`.
    fn store(&self, population: &Population<C>) -> Result<(), CheckpointError>;
}

/// Insert every stored entry into `population`. Returns the number merged.
///
/// On error the population is left untouched.
pub fn merge<C>(
    checkpoint: &dyn Checkpoint<C>,
    population: &mut Population<C>,
) -> Result<usize, CheckpointError> {
    let entries = checkpoint.load()?;
    let count = entries.len();
    for (score, candidate) in entries {
        population.insert_scored(score, candidate);
    }
    Ok(count)
}

/// Checkpoint kept in a single file at a well-known path.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new snapshot. There
/// is no locking: concurrent writers race and the last rename wins.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
    compression: CompressionType,
}

impl FileCheckpoint {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            compression: CompressionType::None,
        }
    }

    /// Set payload compression (LZ4 needs the `lz4` feature).
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<C> Checkpoint<C> for FileCheckpoint
where
    C: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<(Score, C)>, CheckpointError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        read_checkpoint(&mut BufReader::new(file))
    }

    fn store(&self, population: &Population<C>) -> Result<(), CheckpointError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let entries: Vec<(&Score, &C)> = population.iter().collect();
            write_checkpoint(&mut writer, &entries, self.compression)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        log::debug!(
            "Wrote checkpoint with {} entries to {}",
            population.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-process checkpoint. Clones share the same snapshot.
#[derive(Debug)]
pub struct MemoryCheckpoint<C> {
    entries: Arc<Mutex<Vec<(Score, C)>>>,
}

impl<C> Clone for MemoryCheckpoint<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<C> Default for MemoryCheckpoint<C> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<C> MemoryCheckpoint<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clone> Checkpoint<C> for MemoryCheckpoint<C> {
    fn load(&self) -> Result<Vec<(Score, C)>, CheckpointError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, population: &Population<C>) -> Result<(), CheckpointError> {
        let snapshot = population
            .iter()
            .map(|(s, c)| (s.clone(), c.clone()))
            .collect();
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn score(a: f64, b: f64) -> Score {
        Score::from_pairs([("a", a), ("b", b)])
    }

    fn sample_population() -> Population<Vec<u32>> {
        let mut pop = Population::new();
        pop.insert_scored(score(1.0, 4.0), vec![1, 2]);
        pop.insert_scored(score(3.0, 2.0), vec![3]);
        pop
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileCheckpoint::new(dir.path().join("solutions.dat"));
        let mut pop: Population<Vec<u32>> = Population::new();

        assert_eq!(merge(&store, &mut pop).unwrap(), 0);
        assert!(pop.is_empty());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileCheckpoint::new(dir.path().join("solutions.dat"));
        let original = sample_population();
        store.store(&original).unwrap();

        let mut restored = Population::new();
        assert_eq!(merge(&store, &mut restored).unwrap(), 2);
        assert_eq!(restored.len(), original.len());
        for (s, c) in &original {
            assert_eq!(restored.get(s), Some(c));
        }
    }

    #[test]
    fn test_merge_overwrites_matching_scores() {
        let store = MemoryCheckpoint::new();
        store.store(&sample_population()).unwrap();

        let mut local = Population::new();
        local.insert_scored(score(1.0, 4.0), vec![9, 9]);
        local.insert_scored(score(0.0, 9.0), vec![0]);

        merge(&store, &mut local).unwrap();
        assert_eq!(local.len(), 3);
        assert_eq!(local.get(&score(1.0, 4.0)), Some(&vec![1, 2]));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("solutions.dat");
        fs::write(&path, b"not a checkpoint").unwrap();

        let store = FileCheckpoint::new(&path);
        let mut pop: Population<Vec<u32>> = Population::new();
        assert!(merge(&store, &mut pop).is_err());
        assert!(pop.is_empty());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileCheckpoint::new(dir.path().join("solutions.dat"));
        store.store(&sample_population()).unwrap();
        store.store(&Population::<Vec<u32>>::new()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let loaded: Vec<(Score, Vec<u32>)> = store.load().unwrap();
        assert!(loaded.is_empty());
    }
}
