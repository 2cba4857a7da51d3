//! Keyword-triggered generation of draft quiz items from segments.
//!
//! Rules are data ([`RuleDef`]): a module, a keyword set, and an item
//! template. A rule fires when a segment of the same module contains any of
//! its keywords as a case-insensitive substring.

mod builtin;

use std::collections::{BTreeSet, HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use qbank_shared::{
    Answer, Assets, ItemKind, QuizItem, Result, RuleDef, Segment, TRUE_FALSE_CHOICES,
};

/// Item id suffixes are reduced into `0..ID_SUFFIX_RANGE`.
pub const ID_SUFFIX_RANGE: u64 = 10_000;

/// Item id for a rule tag and the text that triggered it.
///
/// The suffix is the first eight bytes of the SHA-256 of `text`, reduced
/// modulo [`ID_SUFFIX_RANGE`]. Stable across runs; distinct texts can collide.
pub fn item_id(tag: &str, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let suffix = u64::from_be_bytes(prefix) % ID_SUFFIX_RANGE;
    format!("{tag}{suffix}")
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// An ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RuleDef>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// The five course rules for modules 6–10.
    pub fn builtin() -> Self {
        Self {
            rules: builtin::builtin_rules(),
        }
    }

    /// An empty table, for callers that supply every rule themselves.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append validated rules after the existing ones.
    pub fn extend(&mut self, rules: impl IntoIterator<Item = RuleDef>) -> Result<()> {
        for rule in rules {
            rule.validate()?;
            self.rules.push(rule);
        }
        Ok(())
    }

    pub fn rules(&self) -> &[RuleDef] {
        &self.rules
    }

    /// Draft items for one segment, in rule-table order.
    pub fn apply(&self, segment: &Segment) -> Vec<QuizItem> {
        if segment.text.trim().is_empty() {
            return Vec::new();
        }
        let lowered = segment.text.to_lowercase();

        self.rules
            .iter()
            .filter(|rule| rule.module == segment.module && fires(rule, &lowered))
            .map(|rule| render(rule, &segment.text))
            .collect()
    }
}

/// Whether any keyword of `rule` occurs in already-lowercased text.
pub fn fires(rule: &RuleDef, lowered: &str) -> bool {
    rule.keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && lowered.contains(&k))
}

fn render(rule: &RuleDef, text: &str) -> QuizItem {
    let (kind, choices, answer_index) = match &rule.answer {
        Answer::Tf { answer } => (
            ItemKind::TrueFalse,
            TRUE_FALSE_CHOICES.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            if *answer { 0 } else { 1 },
        ),
        Answer::Mcq { choices, correct } => {
            (ItemKind::MultipleChoice, choices.clone(), *correct)
        }
    };

    QuizItem {
        id: item_id(&rule.tag, text),
        module: rule.module,
        kind,
        question: rule.question.clone(),
        choices,
        answer_index,
        explanation: rule.explanation.clone(),
        tags: rule.tags.iter().cloned().collect::<BTreeSet<_>>(),
        assets: Assets::default(),
    }
}

// ---------------------------------------------------------------------------
// Bank generation
// ---------------------------------------------------------------------------

/// Build a draft bank from segments given in document order.
///
/// Segments are stably ordered by module first. An item is dropped only when
/// the same id was already emitted for the same segment text. Distinct texts
/// whose ids collide are all kept, so ids are not guaranteed unique.
#[instrument(skip_all, fields(rules = rules.rules().len()))]
pub fn generate_bank<'a>(
    rules: &RuleSet,
    segments: impl IntoIterator<Item = &'a Segment>,
) -> Vec<QuizItem> {
    let mut ordered: Vec<&Segment> = segments.into_iter().collect();
    ordered.sort_by_key(|s| s.module);

    // id -> texts that produced it
    let mut seen: HashMap<String, HashSet<&str>> = HashMap::new();
    let mut bank = Vec::new();
    let mut duplicates = 0usize;
    let mut collisions = 0usize;

    for segment in &ordered {
        for item in rules.apply(segment) {
            let texts = seen.entry(item.id.clone()).or_default();
            if texts.contains(segment.text.as_str()) {
                duplicates += 1;
                debug!(id = %item.id, video_id = %segment.video_id, "duplicate item dropped");
                continue;
            }
            if !texts.is_empty() {
                collisions += 1;
                warn!(
                    id = %item.id,
                    video_id = %segment.video_id,
                    "item id collides with a different segment"
                );
            }
            texts.insert(segment.text.as_str());
            bank.push(item);
        }
    }

    info!(
        segments = ordered.len(),
        items = bank.len(),
        duplicates,
        collisions,
        "draft bank generated"
    );
    bank
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(module: u32, video_id: &str, text: &str) -> Segment {
        Segment {
            video_id: video_id.into(),
            module,
            start: None,
            end: None,
            text: text.into(),
        }
    }

    #[test]
    fn induction_scenario_yields_one_true_item() {
        let text = "We use induction. Base case: n=1. Inductive step: assume true for n=k.";
        let items = RuleSet::builtin().apply(&seg(6, "lec01", text));
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert_eq!(item.kind, ItemKind::TrueFalse);
        assert_eq!(item.answer_index, 0);
        assert_eq!(item.choices, TRUE_FALSE_CHOICES);
        assert!(item.id.starts_with("M6-IND-BC-"));
        assert!(item.tags.contains("base-case"));
        assert!(item.assets.diagram.is_none());
    }

    #[test]
    fn module_must_match_exactly() {
        let text = "induction and probability and graphs";
        let rules = RuleSet::builtin();
        assert!(rules.apply(&seg(0, "x", text)).is_empty());
        assert_eq!(rules.apply(&seg(8, "x", text))[0].module, 8);
    }

    #[test]
    fn keywords_match_case_insensitive_substrings() {
        let rules = RuleSet::builtin();
        // "Subgraphs" contains "graph"; no word boundaries
        let items = rules.apply(&seg(10, "x", "Subgraphs of a TREE"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::MultipleChoice);
        assert_eq!(items[0].answer(), Some("V−1"));

        assert!(rules.apply(&seg(9, "x", "nothing relevant")).is_empty());
    }

    #[test]
    fn blank_keywords_rejected_and_blank_segments_never_fire() {
        let mut rules = RuleSet::empty();
        rules
            .extend([RuleDef {
                module: 6,
                tag: "T-".into(),
                keywords: vec![" ".into()],
                question: "q".into(),
                answer: Answer::Tf { answer: false },
                explanation: String::new(),
                tags: vec![],
            }])
            .unwrap_err();
        assert!(RuleSet::builtin().apply(&seg(6, "x", "   \n ")).is_empty());
    }

    #[test]
    fn every_builtin_item_is_valid() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.rules().len(), 5);
        for rule in rules.rules() {
            assert!(rule.validate().is_ok());
            let text = rule.keywords[0].to_uppercase();
            let items = rules.apply(&seg(rule.module, "x", &text));
            assert_eq!(items.len(), 1, "rule {}", rule.tag);
            items[0].validate().unwrap();
        }
    }

    #[test]
    fn false_answer_selects_index_one() {
        let mut rules = RuleSet::empty();
        rules
            .extend([RuleDef {
                module: 9,
                tag: "M9-SYM-".into(),
                keywords: vec!["Symmetric".into()],
                question: "Every symmetric relation is reflexive.".into(),
                answer: Answer::Tf { answer: false },
                explanation: String::new(),
                tags: vec!["relations".into()],
            }])
            .unwrap();
        let items = rules.apply(&seg(9, "x", "a symmetric relation"));
        assert_eq!(items[0].answer_index, 1);
        assert_eq!(items[0].answer(), Some("False"));
    }

    #[test]
    fn item_id_is_stable_and_bounded() {
        let a = item_id("M7-CNT-PR-", "counting with the product rule");
        let b = item_id("M7-CNT-PR-", "counting with the product rule");
        assert_eq!(a, b);

        let suffix: u64 = a.trim_start_matches("M7-CNT-PR-").parse().unwrap();
        assert!(suffix < ID_SUFFIX_RANGE);
    }

    #[test]
    fn bank_orders_by_module_and_drops_repeated_texts() {
        let segments = vec![
            seg(10, "lec10", "a tree"),
            seg(6, "lec06", "base case first"),
            seg(6, "lec06", "then the inductive step"),
            seg(6, "lec06b", "base case first"),
            seg(8, "lec08", "no keywords"),
        ];
        let bank = generate_bank(&RuleSet::builtin(), &segments);

        let modules: Vec<u32> = bank.iter().map(|i| i.module).collect();
        assert_eq!(modules, vec![6, 6, 10]);
        assert_eq!(bank[0].id, item_id("M6-IND-BC-", "base case first"));
        assert_eq!(bank[1].id, item_id("M6-IND-BC-", "then the inductive step"));

        let ids: HashSet<_> = bank.iter().map(|i| &i.id).collect();
        assert_eq!(ids.len(), bank.len());
    }

    #[test]
    fn colliding_ids_from_distinct_texts_are_kept() {
        let a = "induction lecture part 12";
        let b = "induction lecture part 98";
        assert_eq!(item_id("M6-IND-BC-", a), item_id("M6-IND-BC-", b));

        let segments = vec![seg(6, "lec06", a), seg(6, "lec06", b), seg(6, "lec06b", a)];
        let bank = generate_bank(&RuleSet::builtin(), &segments);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].id, bank[1].id);
    }

    #[test]
    fn every_distinct_matching_segment_yields_an_item() {
        let segments: Vec<Segment> = (0..150)
            .map(|i| seg(6, "lec06", &format!("induction lecture part {i}")))
            .collect();
        let bank = generate_bank(&RuleSet::builtin(), &segments);
        assert_eq!(bank.len(), 150);
    }
}
