//! Ingredient text normalizer.
//!
//! Splits a free-form ingredient list into tokens and resolves each token
//! against the knowledge base synonym index. Matching runs as a ladder:
//! exact key, then plural/descriptor-stripped variants, then bounded edit
//! distance. Tokens inside a "may contain" style statement are marked
//! precautionary; the statement ends at the next sentence break, at the
//! bracket closing the group it opened in, or at a new `Label:` prefix.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ScanConfig;
use crate::knowledge::{normalize_key, KnowledgeBase};
use crate::models::{EntryRef, MatchMethod};

use super::helpers::{edit_distance, suffix_variants};
use super::types::{IngredientMatch, NormalizedIngredient};

/// Words whose trailing period does not end a sentence ("St. John's wort").
const ABBREVIATIONS: &[&str] = &[
    "st", "ste", "mt", "dr", "vit", "sp", "spp", "ssp", "subsp", "var", "approx", "incl", "conc",
];

/// Start of a precautionary statement anywhere in the text.
static RE_PRECAUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:may\s+(?:also\s+)?contain|(?:produced|manufactured|made|processed|packed)\s+(?:in\s+a\s+(?:facility|factory)|on\s+(?:shared\s+)?(?:equipment|lines?))|traces\s+of)\b",
    )
    .unwrap()
});

/// The precautionary statement itself, at the start of a segment.
static RE_MARKER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:may\s+(?:also\s+)?contain(?:s)?|(?:produced|manufactured|made|processed|packed)\s+(?:in\s+a\s+(?:facility|factory)|on\s+(?:shared\s+)?(?:equipment|lines?))(?:\s+(?:that|which))?(?:\s+also)?(?:\s+(?:handles|processes|uses|packages|produces))?)\s*",
    )
    .unwrap()
});

/// Connective words in front of an ingredient.
static RE_LEAD_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:and|or|contains?|including|with|also|traces\s+of|products\s+containing)\s+")
        .unwrap()
});

/// "2% or less of", "less than 1% of".
static RE_QUANTITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:less\s+than\s+)?\d+(?:[.,]\d+)?\s*%\s*(?:or\s+less\s+)?(?:of\s+)?").unwrap()
});

/// "1.", "2)", bullets.
static RE_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]\s*|[-*•·]\s*)").unwrap());

/// "milk and peanuts", "wheat or barley".
static RE_CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:and/or|and|or|&)\s+").unwrap());

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?\s*%").unwrap());

/// Tokenizes ingredient text and maps tokens to knowledge base entries.
pub struct Normalizer<'a> {
    knowledge: &'a KnowledgeBase,
    config: &'a ScanConfig,
}

struct Resolution {
    canonical_token: String,
    matches: Vec<IngredientMatch>,
    confidence: f64,
}

impl<'a> Normalizer<'a> {
    pub fn new(knowledge: &'a KnowledgeBase, config: &'a ScanConfig) -> Self {
        Self { knowledge, config }
    }

    /// Tokens in label order. Empty or whitespace-only text gives no tokens.
    pub fn normalize(&self, text: &str) -> Vec<NormalizedIngredient> {
        let marks: Vec<usize> = RE_PRECAUTION.find_iter(text).map(|m| m.start()).collect();

        let mut tokens = Vec::new();
        let mut scope = PrecautionScope::default();
        for segment in split_segments(text, &marks) {
            let precautionary = scope.enter(text, &segment, &marks);
            if let Some(span) = clean_span(text, segment.range.clone()) {
                self.push_tokens(&mut tokens, text, span, precautionary);
            }
            scope.leave(segment.end);
        }
        tokens
    }

    fn push_tokens(
        &self,
        tokens: &mut Vec<NormalizedIngredient>,
        text: &str,
        span: Range<usize>,
        precautionary: bool,
    ) {
        match self.token(text, span.clone(), precautionary) {
            Some(token) if !token.is_resolved() => {
                let parts = self.split_conjunction(text, span, precautionary);
                if parts.iter().any(NormalizedIngredient::is_resolved) {
                    tokens.extend(parts);
                } else {
                    tokens.push(token);
                }
            }
            Some(token) => tokens.push(token),
            None => {}
        }
    }

    /// Retry an unresolved span as "x and y". Empty when there is no
    /// conjunction to split on.
    fn split_conjunction(
        &self,
        text: &str,
        span: Range<usize>,
        precautionary: bool,
    ) -> Vec<NormalizedIngredient> {
        let mut parts = Vec::new();
        let mut start = span.start;
        for m in RE_CONJUNCTION.find_iter(&text[span.clone()]) {
            parts.push(start..span.start + m.start());
            start = span.start + m.end();
        }
        if parts.is_empty() {
            return Vec::new();
        }
        parts.push(start..span.end);

        parts
            .into_iter()
            .filter_map(|part| clean_span(text, part))
            .filter_map(|part| self.token(text, part, precautionary))
            .collect()
    }

    fn token(
        &self,
        text: &str,
        span: Range<usize>,
        precautionary: bool,
    ) -> Option<NormalizedIngredient> {
        let raw = &text[span.clone()];
        let key = normalize_key(&RE_PERCENT.replace_all(raw, " "));

        if key.chars().count() < self.config.min_token_len
            || !key.chars().any(char::is_alphabetic)
        {
            return None;
        }

        let resolution = self.resolve(&key);
        Some(NormalizedIngredient {
            raw_text: raw.to_string(),
            span,
            canonical_token: resolution.canonical_token,
            matches: resolution.matches,
            confidence: resolution.confidence,
            precautionary,
        })
    }

    fn resolve(&self, key: &str) -> Resolution {
        let exact = self.knowledge.lookup_key(key);
        if !exact.is_empty() {
            return self.resolution(key.to_string(), exact, self.config.exact_confidence, MatchMethod::Exact);
        }

        for variant in suffix_variants(key) {
            let refs = self.knowledge.lookup_key(&variant);
            if !refs.is_empty() {
                return self.resolution(variant, refs, self.config.suffix_confidence, MatchMethod::Suffix);
            }
        }

        if let Some((keys, distance)) = self.closest_keys(key) {
            let len = key.chars().count() as f64;
            let confidence = (1.0 - distance as f64 / len).max(self.config.fuzzy_floor);
            let mut refs: Vec<EntryRef> = keys
                .iter()
                .flat_map(|k| self.knowledge.lookup_key(k).iter().cloned())
                .collect();
            refs.sort();
            refs.dedup();
            return self.resolution(keys[0].to_string(), &refs, confidence, MatchMethod::Fuzzy);
        }

        Resolution {
            canonical_token: key.to_string(),
            matches: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Index keys at the smallest edit distance within the length-dependent
    /// bound. Several keys tie when they are equally close.
    fn closest_keys(&self, key: &str) -> Option<(Vec<&'a str>, usize)> {
        let len = key.chars().count();
        let max_distance = self.config.max_distance(len);
        if max_distance == 0 {
            return None;
        }

        let mut best_distance = max_distance + 1;
        let mut best_keys = Vec::new();
        for candidate in self.knowledge.index_keys() {
            // Quick length filter: keys differing by more than the bound can't match
            if candidate.chars().count().abs_diff(len) > max_distance {
                continue;
            }
            let distance = edit_distance(key, candidate);
            if distance < best_distance {
                best_distance = distance;
                best_keys.clear();
                best_keys.push(candidate);
            } else if distance == best_distance {
                best_keys.push(candidate);
            }
        }

        (!best_keys.is_empty()).then_some((best_keys, best_distance))
    }

    /// Score candidates. Several candidates of the same namespace (ingredient
    /// or medication) make the match ambiguous and every one of them is
    /// penalized.
    fn resolution(
        &self,
        canonical_token: String,
        refs: &[EntryRef],
        confidence: f64,
        method: MatchMethod,
    ) -> Resolution {
        let ingredients = refs.iter().filter(|r| r.kind.is_ingredient()).count();
        let medications = refs.len() - ingredients;

        let mut matches: Vec<IngredientMatch> = refs
            .iter()
            .map(|entry| {
                let ambiguous = if entry.kind.is_ingredient() {
                    ingredients > 1
                } else {
                    medications > 1
                };
                IngredientMatch {
                    entry: entry.clone(),
                    confidence: if ambiguous {
                        confidence * self.config.ambiguity_penalty
                    } else {
                        confidence
                    },
                    method,
                    ambiguous,
                }
            })
            .collect();
        matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Resolution {
            canonical_token,
            matches,
            confidence,
        }
    }
}

/// What ended a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// `,` `;` `|` or a line break.
    Separator,
    Open,
    Close,
    Sentence,
    /// A precautionary statement starts right after.
    Marker,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    range: Range<usize>,
    end: Boundary,
}

/// Which segments belong to a "may contain" statement.
#[derive(Debug, Default)]
struct PrecautionScope {
    /// Bracket nesting at the current segment.
    depth: usize,
    /// Nesting the open statement started at.
    opened_at: Option<usize>,
}

impl PrecautionScope {
    /// Whether `segment` is part of a precautionary statement. A `Label:`
    /// prefix closes any open statement; a marker opens one.
    fn enter(&mut self, text: &str, segment: &Segment, marks: &[usize]) -> bool {
        if text[segment.range.clone()].contains(':') {
            self.opened_at = None;
        }
        if marks.iter().any(|m| segment.range.contains(m)) {
            self.opened_at = Some(self.depth);
        }
        self.opened_at.is_some()
    }

    fn leave(&mut self, end: Boundary) {
        match end {
            Boundary::Open => self.depth += 1,
            Boundary::Close => {
                self.depth = self.depth.saturating_sub(1);
                if self.opened_at.is_some_and(|d| d > self.depth) {
                    self.opened_at = None;
                }
            }
            Boundary::Sentence => self.opened_at = None,
            Boundary::Separator | Boundary::Marker | Boundary::End => {}
        }
    }
}

/// Segments between delimiters, each tagged with what ended it. Every
/// offset in `marks` starts a new segment.
fn split_segments(text: &str, marks: &[usize]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if idx > start && marks.contains(&idx) {
            segments.push(Segment {
                range: start..idx,
                end: Boundary::Marker,
            });
            start = idx;
        }
        let end = match ch {
            '(' | '[' | '{' => Boundary::Open,
            ')' | ']' | '}' => Boundary::Close,
            ',' | ';' | '|' | '\n' | '\r' => Boundary::Separator,
            '.' if is_sentence_break(text, idx, chars.peek().map(|&(_, next)| next)) => {
                Boundary::Sentence
            }
            _ => continue,
        };
        segments.push(Segment {
            range: start..idx,
            end,
        });
        start = idx + ch.len_utf8();
    }
    segments.push(Segment {
        range: start..text.len(),
        end: Boundary::End,
    });
    segments
}

/// A period at `idx` followed by whitespace or the end of text, unless it
/// follows a digit or closes a known abbreviation.
fn is_sentence_break(text: &str, idx: usize, next: Option<char>) -> bool {
    if next.is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    let before = &text[..idx];
    if before.ends_with(|c: char| c.is_ascii_digit()) {
        return false;
    }
    let word = before.rsplit(|c: char| !c.is_alphabetic()).next().unwrap_or_default();
    !ABBREVIATIONS.iter().any(|abbr| word.eq_ignore_ascii_case(abbr))
}

/// Narrow a segment to the ingredient itself: drop any label before a colon,
/// precautionary wording, connectives, quantity prefixes, numbering and
/// surrounding punctuation. None when nothing is left.
fn clean_span(text: &str, segment: Range<usize>) -> Option<Range<usize>> {
    let mut lo = segment.start;
    let mut hi = segment.end;

    if let Some(pos) = text[lo..hi].rfind(':') {
        lo += pos + 1;
    }

    loop {
        let s = &text[lo..hi];
        let trimmed = s.trim_start_matches(|c: char| c.is_whitespace() || c == '"');
        lo += s.len() - trimmed.len();

        let stripped = [&RE_MARKER_PREFIX, &RE_LEAD_WORDS, &RE_QUANTITY_PREFIX, &RE_NUMBERING]
            .iter()
            .find_map(|re| re.find(&text[lo..hi]).filter(|m| m.end() > 0));
        match stripped {
            Some(m) => lo += m.end(),
            None => break,
        }
    }

    let s = &text[lo..hi];
    let trimmed = s.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | '*' | '!' | '?' | ':' | '-' | '"' | '†')
    });
    hi = lo + trimmed.len();

    (lo < hi).then_some(lo..hi)
}
