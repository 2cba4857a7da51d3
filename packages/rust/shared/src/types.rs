//! Core data model shared by every pipeline stage.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QbankError, Result};

/// Choices used by every true/false item.
pub const TRUE_FALSE_CHOICES: [&str; 2] = ["True", "False"];

// ---------------------------------------------------------------------------
// IndexEntry / FrontMatter
// ---------------------------------------------------------------------------

/// One source video as listed in the lecture index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Topic module number (0 when unknown).
    pub module: u32,
    /// Topic label, e.g. "Induction".
    pub topic: String,
    pub title: String,
    pub url: String,
    /// Unique key; also the stem of every per-video output file.
    pub video_id: String,
}

impl IndexEntry {
    /// Metadata for a placeholder that matched nothing in the index.
    pub fn synthetic(title: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            module: 0,
            topic: String::new(),
            title: title.into(),
            url: String::new(),
            video_id: video_id.into(),
        }
    }
}

/// The metadata block at the top of an annotated document.
///
/// Field order is the serialized key order and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub module: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub video_id: String,
}

impl From<&IndexEntry> for FrontMatter {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            title: entry.title.clone(),
            module: entry.module,
            url: entry.url.clone(),
            video_id: entry.video_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// One contiguous span of a transcript body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub video_id: String,
    #[serde(default)]
    pub module: u32,
    /// Start offset in seconds, when the transcript carries timestamps.
    pub start: Option<u32>,
    /// Start of the following boundary, if any.
    pub end: Option<u32>,
    pub text: String,
}

// ---------------------------------------------------------------------------
// QuizItem
// ---------------------------------------------------------------------------

/// Rendering kind of a quiz item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "tf")]
    TrueFalse,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "mcq",
            Self::TrueFalse => "tf",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reserved attachments for an item. Always empty for generated drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default)]
    pub diagram: Option<String>,
}

/// A single question in a bank or packed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: String,
    pub module: u32,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: String,
    /// Serialized as a sorted array.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub assets: Assets,
}

impl QuizItem {
    /// Check the shape invariants for the item's kind.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(QbankError::validation("item id must not be empty"));
        }

        match self.kind {
            ItemKind::TrueFalse => {
                if self.choices != TRUE_FALSE_CHOICES {
                    return Err(QbankError::validation(format!(
                        "item '{}': tf choices must be [\"True\", \"False\"], got {:?}",
                        self.id, self.choices
                    )));
                }
                if self.answer_index > 1 {
                    return Err(QbankError::validation(format!(
                        "item '{}': tf answer_index {} out of range",
                        self.id, self.answer_index
                    )));
                }
            }
            ItemKind::MultipleChoice => {
                if self.choices.len() < 2 {
                    return Err(QbankError::validation(format!(
                        "item '{}': mcq needs at least 2 choices, got {}",
                        self.id,
                        self.choices.len()
                    )));
                }
                if self.answer_index >= self.choices.len() {
                    return Err(QbankError::validation(format!(
                        "item '{}': answer_index {} out of range for {} choices",
                        self.id,
                        self.answer_index,
                        self.choices.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// The text of the correct choice.
    pub fn answer(&self) -> Option<&str> {
        self.choices.get(self.answer_index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Rule definitions
// ---------------------------------------------------------------------------

/// The correct answer of a rule template, which also fixes the item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Answer {
    /// Rendered with [`TRUE_FALSE_CHOICES`]; `true` selects index 0.
    Tf { answer: bool },
    /// Rendered with the given choices in order.
    Mcq { choices: Vec<String>, correct: usize },
}

/// A keyword-triggered item template bound to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    pub module: u32,
    /// Id prefix for every item the rule emits, e.g. `M6-IND-BC-`.
    pub tag: String,
    /// Lowercase substrings; any one of them fires the rule.
    pub keywords: Vec<String>,
    pub question: String,
    pub answer: Answer,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RuleDef {
    /// Reject definitions that could never produce a valid item.
    pub fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(QbankError::validation("rule tag must not be empty"));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(QbankError::validation(format!(
                "rule '{}' has no keywords",
                self.tag
            )));
        }
        if let Answer::Mcq { choices, correct } = &self.answer {
            if choices.len() < 2 || *correct >= choices.len() {
                return Err(QbankError::validation(format!(
                    "rule '{}': mcq needs >= 2 choices and correct < len (got {} choices, correct {})",
                    self.tag,
                    choices.len(),
                    correct
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SetMode
// ---------------------------------------------------------------------------

/// Presentation variant of a packed set. Both carry identical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetMode {
    /// Answer hidden until the student responds.
    Practice,
    /// Answer revealed on demand.
    Memorize,
}

impl SetMode {
    pub const ALL: [SetMode; 2] = [SetMode::Practice, SetMode::Memorize];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Memorize => "memorize",
        }
    }

    /// File name of this mode's set for `module`, e.g. `practice_m6.jsonl`.
    pub fn file_name(&self, module: u32) -> String {
        format!("{}_m{module}.jsonl", self.as_str())
    }
}

impl fmt::Display for SetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SetMode {
    type Err = QbankError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "practice" => Ok(Self::Practice),
            "memorize" => Ok(Self::Memorize),
            other => Err(QbankError::validation(format!(
                "unknown set mode '{other}': expected 'practice' or 'memorize'"
            ))),
        }
    }
}
