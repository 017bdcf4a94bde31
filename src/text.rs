//! Text normalization and sentence segmentation.
//!
//! Extracted page text is normalized (NFKC, invisible characters removed,
//! whitespace collapsed), filtered by Hangul density and split into
//! [`Sentence`]s for review.

use unicode_normalization::UnicodeNormalization;

use crate::extract::ExtractedPage;
use crate::models::Sentence;

const SOFT_HYPHEN: char = '\u{00AD}';

fn is_removed(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{0008}' | '\u{000B}' | '\u{000C}' | '\u{000E}'..='\u{001F}' | '\u{007F}')
        || c == SOFT_HYPHEN
        || matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// NFKC-normalize `text`, drop control, soft-hyphen and zero-width
/// characters, collapse runs of spaces/tabs/NBSP to one space and runs of
/// newlines to one newline, then trim.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkc() {
        if is_removed(c) {
            continue;
        }
        match c {
            // NFKC maps NBSP to a plain space already.
            ' ' | '\t' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            '\r' | '\n' => {
                if out.ends_with(' ') {
                    out.pop();
                }
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

/// Share of Hangul syllables among non-whitespace characters.
pub fn visible_korean_ratio(text: &str) -> f64 {
    let mut visible = 0usize;
    let mut korean = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if is_hangul_syllable(c) {
            korean += 1;
        }
    }
    if visible == 0 {
        0.0
    } else {
        korean as f64 / visible as f64
    }
}

/// Split text into sentences.
///
/// Boundaries: after `.!?。！？` (kept with the sentence), at newlines, and
/// after a Hangul `다` or `요` ending that is followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            push_trimmed(&mut sentences, &mut current);
            continue;
        }
        current.push(c);

        let next = chars.get(i + 1).copied();
        let boundary = match c {
            '.' | '!' | '?' | '。' | '！' | '？' => {
                !matches!(next, Some('.' | '!' | '?' | '。' | '！' | '？'))
            }
            '다' | '요' => {
                let after_hangul = i > 0 && is_hangul_syllable(chars[i - 1]);
                after_hangul && next.is_some_and(char::is_whitespace)
            }
            _ => false,
        };
        if boundary {
            push_trimmed(&mut sentences, &mut current);
        }
    }
    push_trimmed(&mut sentences, &mut current);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Filters applied while turning pages into review sentences.
#[derive(Debug, Clone, Copy)]
pub struct SegmentOptions {
    /// Pages whose Hangul ratio is below this are skipped.
    pub korean_ratio: f64,
    /// Sentences shorter than this many chars are dropped.
    pub min_length: usize,
}

/// Normalize, filter and segment extracted pages. Each sentence keeps its
/// page number and OCR flag.
pub fn sentences_from_pages(pages: &[ExtractedPage], options: SegmentOptions) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    for extracted in pages {
        let page = extracted.page;
        let normalized = normalize_text(&extracted.text);
        if normalized.is_empty() {
            continue;
        }
        let ratio = visible_korean_ratio(&normalized);
        if ratio < options.korean_ratio {
            tracing::debug!(page, ratio, "skipping page below Korean ratio");
            continue;
        }
        sentences.extend(
            split_sentences(&normalized)
                .into_iter()
                .filter(|s| s.chars().count() >= options.min_length)
                .map(|text| Sentence {
                    page,
                    text,
                    is_ocr: extracted.used_ocr,
                }),
        );
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_strips() {
        let raw = "  가\u{200B}나\u{00AD}다 \t 라\r\n\n\n마\u{0007}  ";
        assert_eq!(normalize_text(raw), "가나다 라\n마");
    }

    #[test]
    fn normalize_applies_nfkc() {
        // Fullwidth digits and the NBSP fold to ASCII.
        assert_eq!(normalize_text("１２３\u{00A0}개"), "123 개");
    }

    #[test]
    fn korean_ratio_ignores_whitespace() {
        assert_eq!(visible_korean_ratio(""), 0.0);
        assert_eq!(visible_korean_ratio("한글 ab"), 0.5);
        assert_eq!(visible_korean_ratio("   "), 0.0);
    }

    #[test]
    fn splits_on_punctuation_and_endings() {
        let text = "오늘은 맑습니다. 내일은 비가 온다 그래서 우산을 챙겨요 정말요?\n새 줄";
        assert_eq!(
            split_sentences(text),
            vec![
                "오늘은 맑습니다.",
                "내일은 비가 온다",
                "그래서 우산을 챙겨요",
                "정말요?",
                "새 줄",
            ]
        );
    }

    #[test]
    fn repeated_punctuation_stays_together() {
        assert_eq!(split_sentences("진짜?! 네."), vec!["진짜?!", "네."]);
    }

    #[test]
    fn pages_are_filtered_and_numbered() {
        let pages = vec![
            ExtractedPage::new(1, "This page is entirely English text."),
            ExtractedPage::new(2, "짧다. 이 문장은 충분히 긴 한국어 문장입니다."),
        ];
        let sentences = sentences_from_pages(
            &pages,
            SegmentOptions {
                korean_ratio: 0.3,
                min_length: 10,
            },
        );
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].page, 2);
        assert_eq!(sentences[0].text, "이 문장은 충분히 긴 한국어 문장입니다.");
        assert!(!sentences[0].is_ocr);
    }

    #[test]
    fn ocr_pages_mark_their_sentences() {
        let pages = vec![
            ExtractedPage::new(1, "본문에서 나온 문장입니다."),
            ExtractedPage {
                page: 2,
                text: "스캔에서 읽은 문장입니다. 두 번째 문장입니다.".to_string(),
                used_ocr: true,
            },
        ];
        let sentences = sentences_from_pages(
            &pages,
            SegmentOptions {
                korean_ratio: 0.3,
                min_length: 5,
            },
        );
        let flags: Vec<(u32, bool)> = sentences.iter().map(|s| (s.page, s.is_ocr)).collect();
        assert_eq!(flags, vec![(1, false), (2, true), (2, true)]);
    }
}
