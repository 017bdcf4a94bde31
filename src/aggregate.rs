//! Turns one sentence's checker results into a report row.
//!
//! A sentence becomes a row when at least one checker flagged it. The row
//! keeps each flagging checker's payload, picks a single representative
//! correction for the inline diff (the spell checker first, then the
//! spacing model) and lifts rule hit labels into `error_types`.

use crate::diff::render_diff;
use crate::dispatch::DispatchOutcome;
use crate::models::{FlaggedRow, Sentence, HANSPELL, RULE, SPACING};

/// Suffix appended to truncated snippets.
pub const ELLIPSIS: char = '…';

/// Build the row for a sentence, or `None` when nothing flagged it.
pub fn aggregate(
    sentence: &Sentence,
    outcome: &DispatchOutcome,
    snippet_length: usize,
) -> Option<FlaggedRow> {
    if !outcome.is_flagged() {
        return None;
    }

    let representative = [HANSPELL, SPACING]
        .iter()
        .filter_map(|name| outcome.suggestions.get(*name))
        .find_map(|payload| payload.as_text())
        .map(str::to_string);

    let error_types = outcome
        .suggestions
        .get(RULE)
        .and_then(|payload| payload.as_hits())
        .map(|hits| hits.iter().map(|h| h.label.clone()).collect())
        .unwrap_or_default();

    Some(FlaggedRow {
        page: sentence.page,
        sentence: sentence.text.clone(),
        snippet: snippet(&sentence.text, snippet_length),
        sources: outcome.flagged.clone(),
        error_types,
        suggestion_by_source: outcome.suggestions.clone(),
        metadata_by_source: outcome.metadata.clone(),
        diff: render_diff(&sentence.text, representative.as_deref()),
        representative_suggestion: representative,
        is_ocr: sentence.is_ocr,
    })
}

/// The first `max_chars` chars of `text`, with an ellipsis when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Hit, SuggestionPayload};

    fn outcome(entries: Vec<(&str, SuggestionPayload)>) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for (name, payload) in entries {
            outcome.flagged.push(name.to_string());
            outcome.suggestions.insert(name.to_string(), payload);
        }
        outcome
    }

    #[test]
    fn unflagged_sentence_has_no_row() {
        let sentence = Sentence::new(1, "괜찮은 문장");
        assert_eq!(aggregate(&sentence, &DispatchOutcome::default(), 60), None);
    }

    #[test]
    fn spell_suggestion_wins_over_spacing() {
        let sentence = Sentence::new(2, "안됬어요");
        let out = outcome(vec![
            (HANSPELL, SuggestionPayload::Text("안 됐어요".to_string())),
            (SPACING, SuggestionPayload::Text("안 됬어요".to_string())),
        ]);
        let row = aggregate(&sentence, &out, 60).unwrap();
        assert_eq!(row.representative_suggestion.as_deref(), Some("안 됐어요"));
        assert_eq!(row.sources, vec![HANSPELL, SPACING]);
        assert!(!row.diff.is_empty());
    }

    #[test]
    fn spacing_suggestion_used_without_spell() {
        let sentence = Sentence::new(1, "아버지가방에");
        let out = outcome(vec![(
            SPACING,
            SuggestionPayload::Text("아버지가 방에".to_string()),
        )]);
        let row = aggregate(&sentence, &out, 60).unwrap();
        assert_eq!(row.representative_suggestion.as_deref(), Some("아버지가 방에"));
        assert_eq!(row.diff, "아버지가[+ +]방에");
    }

    #[test]
    fn rule_only_row_has_labels_and_no_diff() {
        let sentence = Sentence::new(3, "올것같다");
        let out = outcome(vec![(
            RULE,
            SuggestionPayload::Hits(vec![Hit {
                label: "'것 같다' 띄어쓰기".to_string(),
                hint: "'것 같다'로 띄어쓰기".to_string(),
            }]),
        )]);
        let row = aggregate(&sentence, &out, 60).unwrap();
        assert_eq!(row.error_types, vec!["'것 같다' 띄어쓰기"]);
        assert_eq!(row.representative_suggestion, None);
        assert_eq!(row.diff, "");
        assert_eq!(row.page, 3);
    }

    #[test]
    fn ocr_flag_carries_into_the_row() {
        let sentence = Sentence {
            page: 4,
            text: "스캔된 문장이예요".to_string(),
            is_ocr: true,
        };
        let out = outcome(vec![(
            HANSPELL,
            SuggestionPayload::Text("스캔된 문장이에요".to_string()),
        )]);
        let row = aggregate(&sentence, &out, 60).unwrap();
        assert!(row.is_ocr);
        assert_eq!(row.page, 4);
    }

    #[test]
    fn snippet_truncates_by_chars() {
        assert_eq!(snippet("가나다라마", 3), "가나다…");
        assert_eq!(snippet("가나다", 3), "가나다");
        assert_eq!(snippet("", 3), "");
    }
}
