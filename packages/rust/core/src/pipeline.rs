//! Stage runners: placeholders → documents → segments → draft bank → packed sets.
//!
//! Every stage reads its whole input directory and writes its whole output
//! before returning. Outputs are keyed by `video_id` or module, so re-running
//! a stage overwrites earlier results for the same key.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use qbank_normalizer::{AnnotatedDocument, Resolution, VideoIndex, decode_lossy};
use qbank_packer::PackResult;
use qbank_rules::RuleSet;
use qbank_segmenter::Segmenter;
use qbank_shared::{AppConfig, QbankError, Result, Segment, read_jsonl, write_jsonl};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called after each input file of a stage is processed.
    fn file_done(&self, name: &str, current: usize, total: usize);
    /// Called when the whole run completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_done(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Documents written, in placeholder file order.
    pub documents: Vec<PathBuf>,
    /// Placeholders that matched nothing in the index.
    pub synthetic: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentReport {
    /// Segment streams written, one per document.
    pub streams: Vec<PathBuf>,
    pub segments: usize,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub bank_path: PathBuf,
    pub segments: usize,
    pub items: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub ingest: IngestReport,
    pub segment: SegmentReport,
    pub generate: GenerateReport,
    pub pack: PackResult,
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Normalize every `*.txt` placeholder into `<out>/<video_id>.md`.
#[instrument(skip_all, fields(placeholders = %placeholders.display(), out = %out.display()))]
pub fn ingest(
    index: &VideoIndex,
    placeholders: &Path,
    out: &Path,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let files = list_files(placeholders, "txt")?;
    if files.is_empty() {
        warn!("no .txt placeholders found");
    }
    create_dir(out)?;

    let mut report = IngestReport::default();
    for (i, path) in files.iter().enumerate() {
        let stem = file_stem(path);
        let (entry, resolution) = index.resolve(&stem);
        if resolution == Resolution::Synthetic {
            debug!(%stem, "placeholder not in index, using fallback metadata");
            report.synthetic += 1;
        }

        let bytes = std::fs::read(path).map_err(|e| QbankError::io(path, e))?;
        let doc = AnnotatedDocument::new(&entry, &decode_lossy(&bytes));

        let target = out.join(format!("{}.md", doc.video_id()));
        std::fs::write(&target, doc.render()?).map_err(|e| QbankError::io(&target, e))?;

        debug!(path = %target.display(), module = entry.module, "wrote document");
        progress.file_done(&stem, i + 1, files.len());
        report.documents.push(target);
    }

    info!(
        documents = report.documents.len(),
        synthetic = report.synthetic,
        "ingest complete"
    );
    Ok(report)
}

/// Segment every `*.md` document into `<out>/<video_id>.jsonl`.
#[instrument(skip_all, fields(transcripts = %transcripts.display(), out = %out.display()))]
pub fn segment(
    segmenter: &Segmenter,
    transcripts: &Path,
    out: &Path,
    progress: &dyn ProgressReporter,
) -> Result<SegmentReport> {
    let files = list_files(transcripts, "md")?;
    create_dir(out)?;

    let mut report = SegmentReport::default();
    for (i, path) in files.iter().enumerate() {
        let stem = file_stem(path);
        let content = std::fs::read_to_string(path).map_err(|e| QbankError::io(path, e))?;
        let doc = AnnotatedDocument::parse(&content).into_document(&stem);

        let segments = segmenter.segment(&doc);
        let target = out.join(format!("{}.jsonl", doc.video_id()));
        write_jsonl(&target, &segments)?;

        progress.file_done(&stem, i + 1, files.len());
        report.segments += segments.len();
        report.streams.push(target);
    }

    info!(
        streams = report.streams.len(),
        segments = report.segments,
        "segmentation complete"
    );
    Ok(report)
}

/// Apply `rules` to every segment stream and write the draft bank.
#[instrument(skip_all, fields(segments = %segments_dir.display(), out = %bank_path.display()))]
pub fn generate(
    rules: &RuleSet,
    segments_dir: &Path,
    bank_path: &Path,
    progress: &dyn ProgressReporter,
) -> Result<GenerateReport> {
    let files = list_files(segments_dir, "jsonl")?;

    let mut segments: Vec<Segment> = Vec::new();
    for (i, path) in files.iter().enumerate() {
        segments.extend(read_jsonl::<Segment>(path)?);
        progress.file_done(&file_stem(path), i + 1, files.len());
    }

    let bank = qbank_rules::generate_bank(rules, &segments);
    write_jsonl(bank_path, &bank)?;

    info!(items = bank.len(), path = %bank_path.display(), "draft bank written");
    Ok(GenerateReport {
        bank_path: bank_path.to_path_buf(),
        segments: segments.len(),
        items: bank.len(),
    })
}

/// Pack one or more curated bank files into per-module sets.
#[instrument(skip_all, fields(banks = banks.len(), out = %out.display(), ?module))]
pub fn pack(banks: &[PathBuf], out: &Path, module: Option<u32>) -> Result<PackResult> {
    let items = qbank_packer::read_bank(banks)?;
    qbank_packer::pack(&items, out, module)
}

/// Rule table from the built-ins plus any rules in config.
pub fn rules_from_config(config: &AppConfig) -> Result<RuleSet> {
    let mut rules = RuleSet::builtin();
    rules.extend(config.rules.iter().cloned())?;
    Ok(rules)
}

/// Run all four stages with the locations from `config`.
///
/// Packs from `paths.final_bank` when set, otherwise from the fresh draft.
#[instrument(skip_all)]
pub fn run_all(config: &AppConfig, progress: &dyn ProgressReporter) -> Result<RunReport> {
    let start = Instant::now();
    let paths = &config.paths;

    progress.phase("Loading index");
    let index = VideoIndex::from_csv_path(&paths.index)?;
    let segmenter = Segmenter::new(config.segmenter)?;
    let rules = rules_from_config(config)?;

    progress.phase("Normalizing placeholders");
    let ingest_report = ingest(&index, &paths.placeholders, &paths.transcripts, progress)?;

    progress.phase("Segmenting transcripts");
    let segment_report = segment(&segmenter, &paths.transcripts, &paths.segments, progress)?;

    progress.phase("Generating draft items");
    let generate_report = generate(&rules, &paths.segments, &paths.draft_bank, progress)?;

    progress.phase("Packing quiz sets");
    let bank = paths
        .final_bank
        .clone()
        .unwrap_or_else(|| paths.draft_bank.clone());
    let pack_result = pack(&[bank], &paths.qbank, None)?;

    progress.done();

    Ok(RunReport {
        ingest: ingest_report,
        segment: segment_report,
        generate: generate_report,
        pack: pack_result,
        elapsed: start.elapsed(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Files in `dir` with extension `ext`, sorted by name. A missing directory is fatal.
fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(QbankError::missing(dir));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| QbankError::io(dir, e))? {
        let path = entry.map_err(|e| QbankError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| QbankError::io(dir, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
