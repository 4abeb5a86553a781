use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use floe_common::{Error, Result, Settings, SplitPolicy};
use tracing::{debug, warn};

use crate::model::TableDefinition;
use crate::split::{LineRange, Split};

/// Turns a table's storage directory into splits. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct SplitPlanner {
    data_root: PathBuf,
    policy: SplitPolicy,
}

impl SplitPlanner {
    /// `data_root` anchors relative table paths; normally `file.location`.
    pub fn new(data_root: impl Into<PathBuf>, policy: SplitPolicy) -> Self {
        Self {
            data_root: data_root.into(),
            policy,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.location(), settings.split_policy()?))
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    pub fn resolve_storage_path(&self, table: &TableDefinition) -> PathBuf {
        let path = Path::new(&table.storage_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_root.join(path)
        }
    }

    /// Lists the table directory (non-recursively) and emits splits for every
    /// regular file, in listing order.
    pub fn plan(&self, table: &TableDefinition) -> Result<Vec<Split>> {
        let dir = self.resolve_storage_path(table);
        let files = list_table_files(&dir)?;

        let splits = match self.policy {
            SplitPolicy::PerFile => files.into_iter().map(Split::whole_file).collect::<Vec<_>>(),
            SplitPolicy::PerLineRange { lines_per_split } => {
                let mut splits = Vec::new();
                for file in files {
                    let total = count_lines(Path::new(&file))?;
                    splits.extend(
                        line_ranges(total, lines_per_split)
                            .into_iter()
                            .map(|range| Split::line_range(file.clone(), range)),
                    );
                }
                splits
            }
        };

        debug!(
            table = %table.name,
            dir = %dir.display(),
            splits = splits.len(),
            "planned splits"
        );
        Ok(splits)
    }
}

/// Absolute paths of the regular files directly inside `dir`.
fn list_table_files(dir: &Path) -> Result<Vec<String>> {
    let dir = match fs::canonicalize(dir) {
        Ok(dir) => dir,
        // A file standing in for a parent directory also means the path does not exist.
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(Error::NotFound(format!(
                "storage directory {} does not exist",
                dir.display()
            )));
        }
        Err(e) => return Err(Error::io(dir, e)),
    };
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "storage path {} is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
        let path = entry.map_err(|e| Error::io(&dir, e))?.path();
        // Follows symlinks, so a link to a regular file counts as one.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(path_to_string(path)?),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "skipping dangling directory entry");
            }
            Err(e) => return Err(Error::io(&path, e)),
        }
    }
    Ok(files)
}

fn path_to_string(path: PathBuf) -> Result<String> {
    path.into_os_string()
        .into_string()
        .map_err(|raw| Error::Io(format!("path {} is not valid UTF-8", Path::new(&raw).display())))
}

/// Number of lines in a file; a final line without a trailing newline counts.
fn count_lines(path: &Path) -> Result<u64> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut lines = 0u64;
    let mut last_byte = None;

    loop {
        let buf = reader.fill_buf().map_err(|e| Error::io(path, e))?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = buf.last().copied();
        let consumed = buf.len();
        reader.consume(consumed);
    }

    if matches!(last_byte, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines)
}

fn line_ranges(total_lines: u64, lines_per_split: NonZeroU64) -> Vec<LineRange> {
    let step = lines_per_split.get();
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < total_lines {
        let end = start.saturating_add(step).min(total_lines);
        ranges.push(LineRange::clamped(start, end));
        start = end;
    }
    ranges
}
