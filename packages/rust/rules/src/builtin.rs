//! The built-in rule table: one rule per course module 6 through 10.

use qbank_shared::{Answer, RuleDef};

fn rule(
    module: u32,
    tag: &str,
    keywords: &[&str],
    question: &str,
    answer: Answer,
    explanation: &str,
    tags: &[&str],
) -> RuleDef {
    RuleDef {
        module,
        tag: tag.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        question: question.to_string(),
        answer,
        explanation: explanation.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn mcq(choices: &[&str], correct: usize) -> Answer {
    Answer::Mcq {
        choices: choices.iter().map(|c| c.to_string()).collect(),
        correct,
    }
}

pub(crate) fn builtin_rules() -> Vec<RuleDef> {
    vec![
        rule(
            6,
            "M6-IND-BC-",
            &["induction", "base case", "inductive step", "assume"],
            "In mathematical induction, the base case verifies the statement for the first value in the domain.",
            Answer::Tf { answer: true },
            "Base case anchors the proof at the initial value.",
            &["induction", "base-case"],
        ),
        rule(
            7,
            "M7-CNT-PR-",
            &["product rule", "sum rule", "permutation", "combination", "counting"],
            "Which rule applies when counting outcomes from independent sequential choices?",
            mcq(
                &["Product rule", "Sum rule", "Inclusion–exclusion", "Pigeonhole principle"],
                0,
            ),
            "Independent stages multiply the counts → product rule.",
            &["counting", "product-rule"],
        ),
        rule(
            8,
            "M8-PROB-IND-",
            &["conditional", "independent", "bayes", "probability"],
            "Events A and B are independent iff:",
            mcq(
                &[
                    "P(A∩B) = P(A)P(B)",
                    "P(A|B) = P(B)",
                    "P(A∪B) = P(A)+P(B)",
                    "P(A|B) = 1",
                ],
                0,
            ),
            "Independence is defined by P(A∩B) = P(A)P(B).",
            &["probability", "independence"],
        ),
        rule(
            9,
            "M9-REL-TF-",
            &["reflexive", "symmetric", "transitive", "relation"],
            "A relation R on a set S is reflexive if ∀x∈S, (x,x)∈R.",
            Answer::Tf { answer: true },
            "Reflexivity requires every element to relate to itself.",
            &["relations", "reflexive"],
        ),
        rule(
            10,
            "M10-GRAPH-TREE-",
            &["graph", "euler", "hamilton", "tree", "degree"],
            "In any tree with V vertices, the number of edges E equals:",
            mcq(&["V−1", "V", "V+1", "2V−1"], 0),
            "Trees are connected and acyclic ⇒ E = V − 1.",
            &["graphs", "trees"],
        ),
    ]
}
