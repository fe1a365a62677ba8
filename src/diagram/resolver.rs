//! Diagram resolver
//!
//! Pure text-scanning functions: paper-code extraction, diagram-question
//! detection, and diagram-key normalization. No state beyond compiled
//! patterns; the template table lives in [`super::templates`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Paper code pattern, e.g. `RE-109P'1`
static PAPER_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RE-\d{3}[A-Z]'?\d?").expect("valid regex"));

/// Numbered sub-question pattern, e.g. `3. (a)`
static SUB_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s*\([a-z]\)").expect("valid regex"));

/// Normalized diagram key grammar, e.g. `3a`
pub static DIAGRAM_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[a-z]$").expect("valid regex"));

/// Phrases that mark a question as referencing a figure
const TRIGGER_PHRASES: [&str; 3] = ["चित्रमा", "In the figure", "given below"];

/// Extract the paper code from recognized text.
///
/// Returns the first match; exam papers print the code once in the header.
pub fn extract_paper_code(text: &str) -> Option<String> {
    PAPER_CODE.find(text).map(|m| m.as_str().to_string())
}

/// Find the labels of questions that reference a diagram.
///
/// A line qualifies iff it contains one of the trigger phrases and matches
/// the numbered-sub-question pattern. Labels come back in first-seen order,
/// with the dot and internal whitespace stripped (`3. (a)` → `3(a)`);
/// duplicates are kept when they recur on distinct lines.
pub fn find_diagram_questions(text: &str) -> Vec<String> {
    let mut labels = Vec::new();

    for line in text.lines() {
        if !TRIGGER_PHRASES.iter().any(|phrase| line.contains(phrase)) {
            continue;
        }
        if let Some(m) = SUB_QUESTION.find(line) {
            let label: String = m
                .as_str()
                .chars()
                .filter(|c| *c != '.' && !c.is_whitespace())
                .collect();
            labels.push(label);
        }
    }

    labels
}

/// Normalize a question label into a diagram key: `3(a)` → `3a`.
///
/// Labels that do not reduce to the key grammar (`\d+[a-z]`) - multi-letter
/// sub-labels, stray characters - are unsupported and yield `None`, which
/// the lookup treats as a miss.
pub fn normalize_key(label: &str) -> Option<String> {
    let key: String = label.chars().filter(|c| *c != '(' && *c != ')').collect();

    if DIAGRAM_KEY.is_match(&key) {
        Some(key)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "SEE 2080\nRE-109P'1\nCompulsory Mathematics\n\
3. (a) In the figure given below, ABCD is a parallelogram.\n\
3. (b) चित्रमा O केन्द्र भएको वृत्त छ ।\n\
4. (a) Solve the equation without any figure.\n";

    #[test]
    fn test_extract_paper_code() {
        assert_eq!(extract_paper_code(SAMPLE), Some("RE-109P'1".to_string()));
        assert_eq!(
            extract_paper_code("header RE-207B text"),
            Some("RE-207B".to_string())
        );
        assert_eq!(extract_paper_code("no code here"), None);
    }

    #[test]
    fn test_extract_paper_code_first_match_wins() {
        let text = "RE-109P'2 then later RE-109P'1";
        assert_eq!(extract_paper_code(text), Some("RE-109P'2".to_string()));
    }

    #[test]
    fn test_find_diagram_questions() {
        let labels = find_diagram_questions(SAMPLE);
        // 4.(a) has no trigger phrase and must not appear
        assert_eq!(labels, vec!["3(a)", "3(b)"]);
    }

    #[test]
    fn test_find_diagram_questions_requires_both_signals() {
        // Trigger phrase without the sub-question pattern
        let labels = find_diagram_questions("In the figure shown, compute the area.");
        assert!(labels.is_empty());

        // Sub-question pattern without a trigger phrase
        let labels = find_diagram_questions("5. (c) Simplify the expression.");
        assert!(labels.is_empty());
    }

    #[test]
    fn test_find_diagram_questions_keeps_duplicates() {
        let text = "3. (a) In the figure given below, part one.\n\
3. (a) In the figure given below, continued.\n";
        assert_eq!(find_diagram_questions(text), vec!["3(a)", "3(a)"]);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("3(a)"), Some("3a".to_string()));
        assert_eq!(normalize_key("12(b)"), Some("12b".to_string()));
        assert_eq!(normalize_key("3a"), Some("3a".to_string()));
    }

    #[test]
    fn test_normalize_key_rejects_unsupported_labels() {
        assert_eq!(normalize_key("12(ab)"), None);
        assert_eq!(normalize_key("(a)"), None);
        assert_eq!(normalize_key("3(A)"), None);
        assert_eq!(normalize_key(""), None);
    }
}
