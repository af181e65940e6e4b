use std::path::{Path, PathBuf};

pub const SEGMENT_PREFIX: &str = "part_";
pub const SEGMENT_EXTENSION: &str = "mp3";

/// `part_001.mp3` for unit index 0. Existing output directories depend on this
/// exact shape, including the 3-digit padding.
pub fn segment_file_name(index: usize) -> String {
    format!("{}{:03}.{}", SEGMENT_PREFIX, index + 1, SEGMENT_EXTENSION)
}

/// Recovers the unit index from a segment file name.
///
/// Returns `None` for anything that is not `part_<digits>.mp3` with a part
/// number of at least 1.
pub fn parse_segment_index(file_name: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(SEGMENT_PREFIX)?;
    let (number, extension) = rest.split_once('.')?;
    if extension != SEGMENT_EXTENSION || number.is_empty() {
        return None;
    }
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let part: usize = number.parse().ok()?;
    part.checked_sub(1)
}

/// Synthesized audio for exactly one dialogue unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub index: usize,
    pub path: PathBuf,
}

impl SegmentFile {
    pub fn for_unit(dir: &Path, index: usize) -> Self {
        Self {
            index,
            path: dir.join(segment_file_name(index)),
        }
    }

    /// Builds a segment from an existing path, reading the index from its name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let index = parse_segment_index(name)?;
        Some(Self {
            index,
            path: path.to_path_buf(),
        })
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Writes through a sibling temp file so an interrupted write never leaves
    /// a file under the final name.
    pub async fn write(&self, audio: &[u8]) -> std::io::Result<()> {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".part");
        let staging = PathBuf::from(staging);

        tokio::fs::write(&staging, audio).await?;
        if let Err(err) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err);
        }
        Ok(())
    }
}

/// Lists the segment files of a directory in ascending index order
pub async fn scan_segments(dir: &Path) -> std::io::Result<Vec<SegmentFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut segments = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(segment) = SegmentFile::from_path(&entry.path()) {
            segments.push(segment);
        }
    }

    segments.sort_by_key(|segment| segment.index);
    Ok(segments)
}

/// Indices in `expected` that have no segment
pub fn missing_indices(
    expected: impl IntoIterator<Item = usize>,
    segments: &[SegmentFile],
) -> Vec<usize> {
    let present: std::collections::HashSet<usize> = segments.iter().map(|s| s.index).collect();
    let mut missing: Vec<usize> = expected
        .into_iter()
        .filter(|index| !present.contains(index))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}
