//! Raw transcript placeholders → annotated documents.
//!
//! An annotated document is a JSON front-matter block between `---` lines,
//! a blank line, then the normalized body. The format round-trips:
//! parsing a rendered document and rendering it again yields the same bytes.

mod index;
mod text;

use tracing::{debug, instrument};

use qbank_shared::{FrontMatter, IndexEntry, QbankError, Result};

pub use index::{Resolution, VideoIndex, slugify};
pub use text::{decode_lossy, normalize_text};

/// Front-matter delimiter line.
const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A normalized transcript body with its index metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedDocument {
    pub front_matter: FrontMatter,
    /// Normalized body; always ends with exactly one `\n`.
    pub body: String,
}

/// A document read back from disk. Front matter is absent when the header
/// is missing or its JSON does not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

impl AnnotatedDocument {
    /// Normalize `raw` and attach the metadata of `entry`.
    #[instrument(skip(raw), fields(video_id = %entry.video_id, raw_len = raw.len()))]
    pub fn new(entry: &IndexEntry, raw: &str) -> Self {
        let body = normalize_text(raw);
        debug!(body_len = body.len(), "normalized body");
        Self {
            front_matter: FrontMatter::from(entry),
            body,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.front_matter.video_id
    }

    /// Serialize to the on-disk format.
    pub fn render(&self) -> Result<String> {
        let header = serde_json::to_string_pretty(&self.front_matter).map_err(|e| {
            QbankError::Serialization(format!("front matter encode failed: {e}"))
        })?;
        Ok(format!("{DELIMITER}\n{header}\n{DELIMITER}\n\n{}", self.body))
    }

    /// Parse the on-disk format. Never fails; see [`ParsedDocument`].
    pub fn parse(content: &str) -> ParsedDocument {
        let lines: Vec<&str> = content.lines().collect();

        let opens = lines.first().is_some_and(|l| is_delimiter(l));
        let close = opens
            .then(|| lines.iter().skip(1).position(|l| is_delimiter(l)))
            .flatten()
            .map(|i| i + 1);

        let Some(close) = close else {
            debug!("no front matter block found");
            return ParsedDocument {
                front_matter: None,
                body: normalize_text(content),
            };
        };

        let header = lines[1..close].join("\n");
        let front_matter = match serde_json::from_str::<FrontMatter>(&header) {
            Ok(fm) => Some(fm),
            Err(e) => {
                debug!(error = %e, "front matter is not valid JSON");
                None
            }
        };

        // the header block never reaches the body, even when it does not decode
        ParsedDocument {
            front_matter,
            body: normalize_text(&lines[close + 1..].join("\n")),
        }
    }
}

impl ParsedDocument {
    /// Complete missing identity fields from the file stem.
    ///
    /// A document without front matter becomes module 0, titled and keyed by `stem`.
    pub fn into_document(self, stem: &str) -> AnnotatedDocument {
        let mut front_matter = self.front_matter.unwrap_or_else(|| FrontMatter {
            title: stem.to_string(),
            module: 0,
            url: String::new(),
            video_id: String::new(),
        });
        if front_matter.video_id.is_empty() {
            front_matter.video_id = stem.to_string();
        }
        AnnotatedDocument {
            front_matter,
            body: self.body,
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
