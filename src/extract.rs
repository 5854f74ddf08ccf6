//! Best-effort extraction of exam-query fields from free text
//!
//! Students type things like "review my paper roll 21CMR001 subject DSA mid 2".
//! Each field is resolved by an ordered list of strategies; the first strategy
//! that yields a value wins and the rest are not consulted. Extraction is pure and
//! total: any input, including the empty string, produces an [`ExtractedQuery`]
//! whose fields are either well-formed or `None`.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Subject short codes recognized as bare tokens when no labelled subject is present
pub const SUBJECT_CODES: &[&str] = &[
    "DSA", "DBMS", "OS", "CN", "COA", "DAA", "OOPS", "OOP", "TOC", "CD", "SE", "AI", "ML",
    "DL", "NLP", "IOT", "WT", "DM", "DLD", "DE", "BEE", "EDC", "M1", "M2", "M3", "PPS",
    "JAVA", "PYTHON",
];

/// Label used for end-semester exams
pub const END_SEM_LABEL: &str = "End-Sem";

type Strategy = fn(&str) -> Option<String>;

/// Roll number strategies, in priority order
const ROLL_NO_STRATEGIES: &[Strategy] = &[roll_no_pattern];

/// Subject strategies, in priority order
const SUBJECT_STRATEGIES: &[Strategy] = &[labelled_subject, labelled_exam_subject, subject_code];

/// Exam name strategies, in priority order
const EXAM_NAME_STRATEGIES: &[Strategy] = &[mid_exam, internal_exam, end_sem_exam];

static ROLL_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}[A-Za-z]{2,6}\d{3,4}").expect("roll pattern is valid"));

static SUBJECT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsubject\b\s*[:\-]?\s*([A-Za-z&][A-Za-z& ]{1,24})")
        .expect("subject pattern is valid")
});

static EXAM_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bexam\b\s*[:\-]?\s*([A-Za-z&][A-Za-z& ]{1,24})").expect("exam pattern is valid")
});

static MID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmid\s*[\-]?\s*(\d)").expect("mid pattern is valid"));

static INTERNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\binternal\s*[\-]?\s*(\d)").expect("internal pattern is valid")
});

static END_SEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bend\s*[\-]?\s*sem(?:ester)?\b|\bend\b").expect("end-sem pattern is valid")
});

/// Exam keywords that end a labelled subject ("subject DSA mid 2")
static EXAM_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mid|internal|end|endsem)\b").expect("exam keyword pattern is valid")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("word pattern is valid"));

/// Fields pulled out of a free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedQuery {
    pub roll_no: Option<String>,
    pub subject_name: Option<String>,
    pub exam_name: Option<String>,
}

impl ExtractedQuery {
    /// Run every strategy list against `text`
    pub fn from_text(text: &str) -> Self {
        Self {
            roll_no: first_match(ROLL_NO_STRATEGIES, text),
            subject_name: first_match(SUBJECT_STRATEGIES, text),
            exam_name: first_match(EXAM_NAME_STRATEGIES, text),
        }
    }
}

fn first_match(strategies: &[Strategy], text: &str) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(text))
}

fn roll_no_pattern(text: &str) -> Option<String> {
    ROLL_NO
        .find(text)
        .map(|m| m.as_str().to_ascii_uppercase())
}

fn labelled(pattern: &Regex, text: &str) -> Option<String> {
    let captured = pattern.captures(text)?.get(1)?.as_str();
    let cut = EXAM_KEYWORD
        .find_iter(captured)
        .find(|m| m.start() > 0)
        .map_or(captured.len(), |m| m.start());
    let value = captured[..cut].trim();
    (value.len() >= 2).then(|| value.to_string())
}

fn labelled_subject(text: &str) -> Option<String> {
    labelled(&SUBJECT_LABEL, text)
}

fn labelled_exam_subject(text: &str) -> Option<String> {
    labelled(&EXAM_LABEL, text)
}

fn subject_code(text: &str) -> Option<String> {
    WORD.find_iter(text)
        .map(|w| w.as_str().to_ascii_uppercase())
        .find(|token| SUBJECT_CODES.contains(&token.as_str()))
}

fn mid_exam(text: &str) -> Option<String> {
    MID.captures(text)
        .and_then(|c| c.get(1))
        .map(|n| format!("Mid-{}", n.as_str()))
}

fn internal_exam(text: &str) -> Option<String> {
    INTERNAL
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|n| format!("Internal-{}", n.as_str()))
}

fn end_sem_exam(text: &str) -> Option<String> {
    END_SEM.is_match(text).then(|| END_SEM_LABEL.to_string())
}
