//! Keyword matching over corpus text.
//!
//! Matching is case-insensitive and word-boundary based: `coup` matches
//! "Coup rumors" but not "coupon". A boundary is only required at a term edge
//! that is itself a word character, so punctuated terms like `u.n.` still
//! match. Whitespace inside a multi-word term matches any run of whitespace.
//! Overlapping occurrences are counted individually.

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::{PamError, PamResult};

/// A single compiled search term.
#[derive(Debug, Clone)]
pub struct Term {
    text: String,
    pattern: Regex,
}

impl Term {
    /// Compile a term. Returns `Ok(None)` for blank input.
    pub fn new(raw: &str) -> Result<Option<Self>, regex::Error> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return Ok(None);
        }
        let pattern = Regex::new(&pattern_for(&text))?;
        Ok(Some(Self { text, pattern }))
    }

    /// The normalized (trimmed, lowercased) term.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Count occurrences of this term in `corpus`, overlaps included.
    pub fn count_in(&self, corpus: &str) -> usize {
        let mut count = 0;
        let mut pos = 0;
        while let Some(found) = self.pattern.find_at(corpus, pos) {
            count += 1;
            // Resume one character past the match start.
            let step = corpus[found.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            pos = found.start() + step;
            if pos > corpus.len() {
                break;
            }
        }
        count
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn pattern_for(term: &str) -> String {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if term.chars().next().is_some_and(is_word_char) { r"\b" } else { "" };
    let trail = if term.chars().last().is_some_and(is_word_char) { r"\b" } else { "" };
    format!("(?i){}{}{}", lead, body, trail)
}

/// A named, immutable set of search terms.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    name: String,
    terms: Vec<Term>,
}

impl KeywordSet {
    /// Build a keyword set. Terms are trimmed, lowercased and deduplicated;
    /// blank terms are dropped.
    pub fn new<I, S>(name: &str, raw_terms: I) -> PamResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = raw_terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut terms = Vec::with_capacity(unique.len());
        for raw in unique {
            let compiled = Term::new(&raw).map_err(|e| PamError::InvalidTerm {
                keyword_set: name.to_string(),
                term: raw.clone(),
                reason: e.to_string(),
            })?;
            terms.extend(compiled);
        }

        Ok(Self {
            name: name.to_string(),
            terms,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        self.terms.iter().any(|t| t.text == needle)
    }
}

/// Count every occurrence of every term of `keyword_set` in `corpus`.
pub fn count_matches(corpus: &str, keyword_set: &KeywordSet) -> usize {
    if corpus.is_empty() {
        return 0;
    }
    keyword_set.terms.iter().map(|t| t.count_in(corpus)).sum()
}
