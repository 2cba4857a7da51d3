//! Annotated document bodies → ordered transcript segments.
//!
//! A document is segmented one of two ways, chosen once per document:
//! - **timestamped**: any body line carries a `[h:]mm:ss` stamp, so each
//!   stamp opens a boundary and the lines after it become its text;
//! - **fixed window**: no stamps at all, so the body is cut into chunks of
//!   at most `max_len` characters, preferring a newline break.

mod window;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, warn};

use qbank_normalizer::AnnotatedDocument;
use qbank_shared::{Result, Segment, SegmenterConfig};

pub use window::chunk_by_chars;

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(\d{1,2}):)?(\d{1,2}):(\d{2})").expect("valid regex")
});

/// Seconds of the first `[h:]mm:ss` stamp found anywhere in `line`.
pub fn parse_timestamp(line: &str) -> Option<u32> {
    let caps = TIMESTAMP_RE.captures(line)?;
    let num = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(num(1) * 3600 + num(2) * 60 + num(3))
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How a whole document is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Timestamped,
    FixedWindow,
}

impl Strategy {
    /// Timestamped if any line of `body` carries a stamp.
    pub fn detect(body: &str) -> Self {
        if body.lines().any(|l| TIMESTAMP_RE.is_match(l)) {
            Self::Timestamped
        } else {
            Self::FixedWindow
        }
    }
}

/// Text of one segment before document identity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split a document into segments in body order. Every segment has
    /// non-empty text.
    #[instrument(skip_all, fields(video_id = %doc.video_id()))]
    pub fn segment(&self, doc: &AnnotatedDocument) -> Vec<Segment> {
        let strategy = Strategy::detect(&doc.body);
        let spans = self.spans(&doc.body, strategy);

        debug!(?strategy, segments = spans.len(), "document segmented");

        spans
            .into_iter()
            .map(|span| Segment {
                video_id: doc.front_matter.video_id.clone(),
                module: doc.front_matter.module,
                start: span.start,
                end: span.end,
                text: span.text,
            })
            .collect()
    }

    /// Split `body` with an explicit strategy.
    pub fn spans(&self, body: &str, strategy: Strategy) -> Vec<Span> {
        match strategy {
            Strategy::Timestamped => timestamp_spans(body),
            Strategy::FixedWindow => {
                chunk_by_chars(body, self.config.max_len, self.config.min_len)
                    .into_iter()
                    .map(|text| Span {
                        start: None,
                        end: None,
                        text,
                    })
                    .collect()
            }
        }
    }
}

/// One boundary under construction: its stamp and the lines gathered so far.
struct Boundary<'a> {
    start: Option<u32>,
    lines: Vec<&'a str>,
}

fn timestamp_spans(body: &str) -> Vec<Span> {
    let mut boundaries: Vec<Boundary<'_>> = Vec::new();

    for line in body.lines() {
        if let Some(ts) = parse_timestamp(line) {
            boundaries.push(Boundary {
                start: Some(ts),
                lines: Vec::new(),
            });
            continue;
        }
        match boundaries.last_mut() {
            Some(b) => b.lines.push(line),
            // text before the first stamp
            None => boundaries.push(Boundary {
                start: None,
                lines: vec![line],
            }),
        }
    }

    let mut spans = Vec::with_capacity(boundaries.len());
    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).and_then(|next| next.start);
        let text = boundary.lines.join("\n").trim().to_string();
        if text.is_empty() {
            continue;
        }
        if let (Some(s), Some(e)) = (boundary.start, end) {
            if s >= e {
                warn!(start = s, end = e, "timestamp boundaries out of order");
            }
        }
        spans.push(Span {
            start: boundary.start,
            end,
            text,
        });
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
