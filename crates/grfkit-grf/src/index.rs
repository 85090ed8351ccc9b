//! Case-insensitive path index over decoded entries.

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use tracing::debug;

use crate::entry::GrfEntry;

type FxHashMap<K, V> = FastHashMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Normalize a stored name or a query into a lookup key.
///
/// Backslashes become forward slashes and ASCII letters are lowercased.
/// Every other byte, including anything >= 0x80, is copied verbatim; no
/// text encoding is assumed.
pub fn normalize_path(path: &[u8]) -> Vec<u8> {
    path.iter()
        .map(|&b| match b {
            b'\\' => b'/',
            _ => b.to_ascii_lowercase(),
        })
        .collect()
}

/// Lookup structure built once from a decoded entry table.
///
/// Holds every decoded record (directories included) and maps the
/// normalized path of each file record to it. When two records normalize
/// to the same key the later one in table order wins, the way patch
/// archives override earlier content.
#[derive(Debug, Default)]
pub struct PathIndex {
    records: Vec<GrfEntry>,
    /// Positions of file records in `records`, in table order
    files: Vec<usize>,
    by_path: FxHashMap<Box<[u8]>, usize>,
}

impl PathIndex {
    /// Build the index from records in table order.
    pub fn build(records: Vec<GrfEntry>) -> Self {
        let files: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_file())
            .map(|(i, _)| i)
            .collect();

        let mut by_path = FxHashMap::with_capacity_and_hasher(files.len(), Default::default());
        let mut replaced = 0usize;

        for &i in &files {
            let key = records[i].normalized_path().into_boxed_slice();
            if by_path.insert(key, i).is_some() {
                replaced += 1;
            }
        }

        debug!(
            "Indexed {} files from {} records ({} duplicate paths replaced)",
            files.len(),
            records.len(),
            replaced
        );

        Self {
            records,
            files,
            by_path,
        }
    }

    /// Find the file record for a path, ignoring separator style and ASCII case.
    pub fn lookup(&self, path: impl AsRef<[u8]>) -> Option<&GrfEntry> {
        let key = normalize_path(path.as_ref());
        self.by_path.get(key.as_slice()).map(|&i| &self.records[i])
    }

    #[inline]
    pub fn contains(&self, path: impl AsRef<[u8]>) -> bool {
        self.lookup(path).is_some()
    }

    /// Original names of all file records, in table order.
    ///
    /// Duplicated paths appear once per record.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.files.iter().map(|&i| self.records[i].name_bytes())
    }

    /// File records in table order.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &GrfEntry> + '_ {
        self.files.iter().map(|&i| &self.records[i])
    }

    /// Every decoded record, including directory and reserved placeholders.
    #[inline]
    pub fn records(&self) -> &[GrfEntry] {
        &self.records
    }

    /// Number of file records.
    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
