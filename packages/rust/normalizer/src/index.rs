//! Lecture index loading and placeholder identity resolution.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use qbank_shared::{IndexEntry, QbankError, Result};

/// Identifier-safe form of a label: lowercase, non-alphanumeric runs
/// collapsed to `_`, no leading or trailing `_`.
pub fn slugify(value: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid regex"));

    NON_ALNUM_RE
        .replace_all(value.trim(), "_")
        .trim_matches('_')
        .to_lowercase()
}

/// How a placeholder stem was matched against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The stem is itself a `video_id`.
    Exact,
    /// The slug of the stem is a `video_id`.
    Slug,
    /// Nothing matched; metadata was fabricated.
    Synthetic,
}

/// Read-only `video_id` → [`IndexEntry`] lookup for one normalization run.
#[derive(Debug, Clone, Default)]
pub struct VideoIndex {
    entries: HashMap<String, IndexEntry>,
}

/// Raw CSV row; every column is optional so partial rows still load.
#[derive(Debug, Deserialize)]
struct IndexRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    module: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    video_id: Option<String>,
}

impl From<IndexRow> for IndexEntry {
    fn from(row: IndexRow) -> Self {
        let video_id = row
            .video_id
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| slugify(&row.title));
        Self {
            module: row.module.parse().unwrap_or(0),
            topic: row.topic,
            title: row.title,
            url: row.url,
            video_id,
        }
    }
}

impl VideoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from entries; later duplicates replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Load an index from CSV with a `title,module,url,topic,video_id` header.
    ///
    /// Rows that fail to decode are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        // an unreadable header makes every row unreadable
        rdr.headers()
            .map_err(|e| QbankError::parse(format!("index header: {e}")))?;

        let mut index = Self::new();
        let mut skipped = 0usize;

        for (i, row) in rdr.deserialize::<IndexRow>().enumerate() {
            match row {
                Ok(row) => index.insert(row.into()),
                Err(e) => {
                    skipped += 1;
                    debug!(record = i + 1, error = %e, "skipping malformed index row");
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, kept = index.len(), "skipped malformed index rows");
        }

        Ok(index)
    }

    /// Load an index from a CSV file. A missing file is fatal.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| QbankError::io(path, e))?;
        let index = Self::from_csv_reader(file)?;
        info!(path = %path.display(), entries = index.len(), "loaded lecture index");
        Ok(index)
    }

    pub fn insert(&mut self, entry: IndexEntry) {
        if let Some(prev) = self.entries.insert(entry.video_id.clone(), entry) {
            debug!(video_id = %prev.video_id, "index entry replaced by later row");
        }
    }

    pub fn get(&self, video_id: &str) -> Option<&IndexEntry> {
        self.entries.get(video_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a placeholder file stem to index metadata.
    ///
    /// Tries the stem, then its slug, then fabricates a module-0 entry titled
    /// with the stem. Never fails.
    pub fn resolve(&self, stem: &str) -> (IndexEntry, Resolution) {
        if let Some(entry) = self.get(stem) {
            return (entry.clone(), Resolution::Exact);
        }

        let slug = slugify(stem);
        if let Some(entry) = self.get(&slug) {
            return (entry.clone(), Resolution::Slug);
        }

        let video_id = if slug.is_empty() { stem.to_string() } else { slug };
        (IndexEntry::synthetic(stem, video_id), Resolution::Synthetic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
title,module,url,topic,video_id
Intro to Induction,6,https://example.com/v/1,Induction,lec01
Counting Basics, 7 ,https://example.com/v/2,Counting,
Bayes Rule,eight,https://example.com/v/3,Probability,lec03
";

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("  Intro to Induction! "), "intro_to_induction");
        assert_eq!(slugify("Lec-02 -- Counting"), "lec_02_counting");
        assert_eq!(slugify("__x__"), "x");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn csv_defaults_video_id_and_module() {
        let index = VideoIndex::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(index.len(), 3);

        let lec01 = index.get("lec01").unwrap();
        assert_eq!(lec01.module, 6);
        assert_eq!(lec01.topic, "Induction");

        let counting = index.get("counting_basics").expect("slug of title");
        assert_eq!(counting.module, 7);

        assert_eq!(index.get("lec03").unwrap().module, 0);
    }

    #[test]
    fn csv_tolerates_missing_columns() {
        let csv = "title,module\nGraphs,10\n";
        let index = VideoIndex::from_csv_reader(csv.as_bytes()).unwrap();
        let entry = index.get("graphs").unwrap();
        assert_eq!(entry.module, 10);
        assert!(entry.url.is_empty());
    }

    #[test]
    fn resolve_exact_then_slug_then_synthetic() {
        let index = VideoIndex::from_csv_reader(CSV.as_bytes()).unwrap();

        let (entry, how) = index.resolve("lec01");
        assert_eq!(how, Resolution::Exact);
        assert_eq!(entry.module, 6);

        let (entry, how) = index.resolve("Counting Basics");
        assert_eq!(how, Resolution::Slug);
        assert_eq!(entry.video_id, "counting_basics");

        let (entry, how) = index.resolve("Mystery Lecture");
        assert_eq!(how, Resolution::Synthetic);
        assert_eq!(entry.module, 0);
        assert_eq!(entry.title, "Mystery Lecture");
        assert_eq!(entry.video_id, "mystery_lecture");
        assert!(entry.topic.is_empty() && entry.url.is_empty());
    }

    #[test]
    fn resolve_keeps_stem_when_slug_is_empty() {
        let (entry, how) = VideoIndex::new().resolve("???");
        assert_eq!(how, Resolution::Synthetic);
        assert_eq!(entry.video_id, "???");
    }

    #[test]
    fn missing_index_file_is_fatal() {
        let path = std::env::temp_dir().join(format!("qbank-index-{}.csv", uuid::Uuid::now_v7()));
        let err = VideoIndex::from_csv_path(&path).unwrap_err();
        assert!(matches!(err, QbankError::MissingInput { .. }));
    }

    #[test]
    fn unreadable_header_is_parse_error() {
        let bytes: &[u8] = b"title,\xffmodule\nGraphs,10\n";
        let err = VideoIndex::from_csv_reader(bytes).unwrap_err();
        assert!(matches!(err, QbankError::Parse { .. }));
    }
}
