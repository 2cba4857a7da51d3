//! Curated bank → per-module practice and memorize sets.
//!
//! Creates the following layout:
//! ```text
//! <out>/
//! ├── practice_m6.jsonl
//! ├── memorize_m6.jsonl
//! ├── practice_m8.jsonl
//! ├── memorize_m8.jsonl
//! └── manifest.json
//! ```
//! Both variants of a module hold byte-identical content; only the consumer's
//! display differs. Modules with no items produce no files at all. The
//! manifest describes every set file currently in the directory, across runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use qbank_shared::{QbankError, QuizItem, Result, SetMode, read_jsonl, to_jsonl};

/// Name of the pack manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Metadata for a single written set file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMeta {
    pub mode: SetMode,
    pub module: u32,
    pub filename: String,
    pub items: usize,
    pub sha256: String,
}

/// The `manifest.json` listing every set written by one pack run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackManifest {
    pub sets: Vec<SetMeta>,
}

/// Output from a successful pack run.
#[derive(Debug, Clone)]
pub struct PackResult {
    pub out_dir: PathBuf,
    /// Modules written, in first-seen order.
    pub modules: Vec<u32>,
    pub manifest: PackManifest,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Partition items by module, keeping first-seen module order and
/// first-seen item order within each module.
pub fn group_by_module(items: impl IntoIterator<Item = QuizItem>) -> Vec<(u32, Vec<QuizItem>)> {
    let mut groups: Vec<(u32, Vec<QuizItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(m, _)| *m == item.module) {
            Some((_, group)) => group.push(item),
            None => groups.push((item.module, vec![item])),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Bank reading
// ---------------------------------------------------------------------------

/// Read and concatenate curated bank files, skipping malformed lines and
/// items that violate their kind's shape.
pub fn read_bank(paths: &[PathBuf]) -> Result<Vec<QuizItem>> {
    let mut bank = Vec::new();
    for path in paths {
        let items: Vec<QuizItem> = read_jsonl(path)?;
        let total = items.len();
        bank.extend(items.into_iter().filter(|item| match item.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping invalid item");
                false
            }
        }));
        debug!(path = %path.display(), total, "read bank file");
    }
    Ok(bank)
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

/// Write practice and memorize sets for every module present in `items`,
/// or only for `module` when given.
///
/// `manifest.json` is merged with the one already in `out_dir`: entries for
/// rewritten modules are replaced, entries for other modules are kept while
/// their set file still exists. When nothing is selected, nothing is written.
#[instrument(skip_all, fields(out = %out_dir.display(), items = items.len(), ?module))]
pub fn pack(items: &[QuizItem], out_dir: &Path, module: Option<u32>) -> Result<PackResult> {
    let selected = items
        .iter()
        .filter(|item| module.is_none_or(|m| item.module == m))
        .cloned();
    let groups = group_by_module(selected);

    if groups.is_empty() {
        warn!("no items selected, nothing packed");
        return Ok(PackResult {
            out_dir: out_dir.to_path_buf(),
            modules: Vec::new(),
            manifest: PackManifest::default(),
        });
    }

    std::fs::create_dir_all(out_dir).map_err(|e| QbankError::io(out_dir, e))?;

    let mut written = Vec::new();
    let mut modules = Vec::with_capacity(groups.len());

    for (m, group) in &groups {
        let content = to_jsonl(group)?;
        let sha256 = format!("{:x}", Sha256::digest(content.as_bytes()));

        for mode in SetMode::ALL {
            let filename = mode.file_name(*m);
            write_atomic(out_dir, &filename, &content)?;
            written.push(SetMeta {
                mode,
                module: *m,
                filename,
                items: group.len(),
                sha256: sha256.clone(),
            });
        }

        info!(module = m, items = group.len(), "packed module");
        modules.push(*m);
    }

    let mut manifest = read_manifest(out_dir);
    manifest
        .sets
        .retain(|set| !modules.contains(&set.module) && out_dir.join(&set.filename).exists());
    manifest.sets.extend(written);
    manifest.sets.sort_by_key(|set| (set.module, set.mode));

    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| QbankError::Serialization(format!("manifest encode failed: {e}")))?;
    write_atomic(out_dir, MANIFEST_FILE, &manifest_json)?;

    Ok(PackResult {
        out_dir: out_dir.to_path_buf(),
        modules,
        manifest,
    })
}

/// The manifest already in `dir`, or an empty one when absent or unreadable.
fn read_manifest(dir: &Path) -> PackManifest {
    let path = dir.join(MANIFEST_FILE);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return PackManifest::default();
    };
    match serde_json::from_str(&content) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable manifest");
            PackManifest::default()
        }
    }
}

/// Load one packed set for a consumer.
///
/// Malformed lines and invalid items are skipped. A missing set is
/// [`QbankError::MissingInput`]; a set with no usable items is
/// [`QbankError::EmptyResult`].
pub fn load_set(dir: &Path, module: u32, mode: SetMode) -> Result<Vec<QuizItem>> {
    let path = dir.join(mode.file_name(module));
    if !path.exists() {
        return Err(QbankError::missing(path));
    }

    let items: Vec<QuizItem> = read_jsonl::<QuizItem>(&path)?
        .into_iter()
        .filter(|item| item.validate().is_ok())
        .collect();
    if items.is_empty() {
        return Err(QbankError::empty(format!(
            "no items in set {}",
            path.display()
        )));
    }
    Ok(items)
}

/// Write to a temp file in `dir`, then rename over the target.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<()> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| QbankError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| QbankError::io(&target, e))?;

    debug!(path = %target.display(), bytes = content.len(), "wrote set file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_shared::{Assets, ItemKind};
    use std::collections::BTreeSet;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qbank-packer-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn item(id: &str, module: u32) -> QuizItem {
        QuizItem {
            id: id.into(),
            module,
            kind: ItemKind::TrueFalse,
            question: format!("question {id}"),
            choices: vec!["True".into(), "False".into()],
            answer_index: 0,
            explanation: String::new(),
            tags: BTreeSet::new(),
            assets: Assets::default(),
        }
    }

    fn bank() -> Vec<QuizItem> {
        vec![
            item("a", 8),
            item("b", 6),
            item("c", 8),
            item("d", 6),
            item("e", 8),
        ]
    }

    #[test]
    fn grouping_is_a_stable_partition() {
        let groups = group_by_module(bank());
        let shape: Vec<(u32, Vec<&str>)> = groups
            .iter()
            .map(|(m, g)| (*m, g.iter().map(|i| i.id.as_str()).collect()))
            .collect();
        assert_eq!(shape, vec![(8, vec!["a", "c", "e"]), (6, vec!["b", "d"])]);

        let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
        assert_eq!(total, bank().len());
    }

    #[test]
    fn pack_writes_only_present_modules() {
        let tmp = temp_dir();
        let result = pack(&bank(), &tmp, None).unwrap();
        assert_eq!(result.modules, vec![8, 6]);

        for name in [
            "practice_m6.jsonl",
            "memorize_m6.jsonl",
            "practice_m8.jsonl",
            "memorize_m8.jsonl",
            MANIFEST_FILE,
        ] {
            assert!(tmp.join(name).exists(), "missing {name}");
        }
        for m in [7, 9, 10] {
            assert!(!tmp.join(SetMode::Practice.file_name(m)).exists());
            assert!(!tmp.join(SetMode::Memorize.file_name(m)).exists());
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn practice_and_memorize_are_identical() {
        let tmp = temp_dir();
        pack(&bank(), &tmp, None).unwrap();

        let practice = std::fs::read(tmp.join("practice_m8.jsonl")).unwrap();
        let memorize = std::fs::read(tmp.join("memorize_m8.jsonl")).unwrap();
        assert_eq!(practice, memorize);
        assert_eq!(String::from_utf8(practice).unwrap().lines().count(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn packing_is_deterministic() {
        let tmp = temp_dir();
        pack(&bank(), &tmp, None).unwrap();
        let first = std::fs::read(tmp.join("practice_m6.jsonl")).unwrap();
        let first_manifest = std::fs::read(tmp.join(MANIFEST_FILE)).unwrap();

        pack(&bank(), &tmp, None).unwrap();
        assert_eq!(std::fs::read(tmp.join("practice_m6.jsonl")).unwrap(), first);
        assert_eq!(std::fs::read(tmp.join(MANIFEST_FILE)).unwrap(), first_manifest);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn module_filter_limits_output() {
        let tmp = temp_dir();
        let result = pack(&bank(), &tmp, Some(6)).unwrap();
        assert_eq!(result.modules, vec![6]);
        assert_eq!(result.manifest.sets.len(), 2);
        assert!(!tmp.join("practice_m8.jsonl").exists());

        let result = pack(&bank(), &tmp, Some(9)).unwrap();
        assert!(result.modules.is_empty());
        assert!(!tmp.join("practice_m9.jsonl").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn filtered_pack_keeps_other_modules_in_manifest() {
        let tmp = temp_dir();
        pack(&bank(), &tmp, None).unwrap();

        let mut updated = bank();
        updated.push(item("f", 6));
        let result = pack(&updated, &tmp, Some(6)).unwrap();

        let on_disk: PackManifest =
            serde_json::from_str(&std::fs::read_to_string(tmp.join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(on_disk, result.manifest);

        let shape: Vec<(u32, SetMode, usize)> = on_disk
            .sets
            .iter()
            .map(|s| (s.module, s.mode, s.items))
            .collect();
        assert_eq!(
            shape,
            vec![
                (6, SetMode::Practice, 3),
                (6, SetMode::Memorize, 3),
                (8, SetMode::Practice, 3),
                (8, SetMode::Memorize, 3),
            ]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_selection_writes_nothing() {
        let root = temp_dir();
        let tmp = root.join("fresh");
        let result = pack(&bank(), &tmp, Some(9)).unwrap();
        assert!(result.modules.is_empty());
        assert!(result.manifest.sets.is_empty());
        assert!(!tmp.exists());

        pack(&[], &root, None).unwrap();
        assert!(!root.join(MANIFEST_FILE).exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = temp_dir();
        pack(&bank(), &tmp, None).unwrap();
        for entry in std::fs::read_dir(&tmp).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_set_missing_and_empty() {
        let tmp = temp_dir();

        let err = load_set(&tmp, 7, SetMode::Practice).unwrap_err();
        assert!(matches!(err, QbankError::MissingInput { .. }));

        let mut bad = item("bad", 7);
        bad.choices.pop();
        let content = format!("\n{{broken\n{}", to_jsonl(&[bad]).unwrap());
        std::fs::write(tmp.join("practice_m7.jsonl"), content).unwrap();
        let err = load_set(&tmp, 7, SetMode::Practice).unwrap_err();
        assert!(matches!(err, QbankError::EmptyResult { .. }));

        pack(&bank(), &tmp, None).unwrap();
        let items = load_set(&tmp, 6, SetMode::Memorize).unwrap();
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["b", "d"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_bank_skips_invalid_items() {
        let tmp = temp_dir();
        let path = tmp.join("final.jsonl");
        let mut bad = item("bad", 6);
        bad.answer_index = 5;
        let lines = to_jsonl(&[item("ok", 6), bad]).unwrap();
        std::fs::write(&path, format!("{lines}not json\n")).unwrap();

        let second = tmp.join("extra.jsonl");
        std::fs::write(&second, to_jsonl(&[item("more", 9)]).unwrap()).unwrap();

        let bank = read_bank(&[path, second]).unwrap();
        let ids: Vec<_> = bank.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["ok", "more"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
