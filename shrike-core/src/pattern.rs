// Pattern table for the detection core
//
// Normalizes the raw word list handed over by a dictionary loader and
// assigns each surviving pattern a dense, stable id.

use ahash::AHashSet;

use crate::{DetectError, DetectResult, DetectorConfig};

/// A single normalized dictionary pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Dense id assigned in first-seen order, starting at 0
    pub id: u32,

    /// The pattern text, trimmed of surrounding whitespace
    pub text: String,
}

impl Pattern {
    /// Pattern length in characters (matching runs over Unicode scalar
    /// values, not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Normalized, deduplicated pattern list with stable ids
///
/// Later duplicate occurrences are discarded; the first occurrence keeps
/// its id. Whether an empty table is acceptable is the caller's policy,
/// so normalization itself never fails on an empty result.
#[derive(Debug, Default, Clone)]
pub struct PatternTable {
    patterns: Vec<Pattern>,
}

impl PatternTable {
    /// Normalize a raw word list into a pattern table
    pub fn normalize<I, S>(words: I, config: &DetectorConfig) -> DetectResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        let mut seen: AHashSet<String> = AHashSet::new();

        for word in words {
            let trimmed = word.as_ref().trim();
            if trimmed.is_empty() || seen.contains(trimmed) {
                continue;
            }

            let length = trimmed.chars().count();
            if config.max_pattern_length > 0 && length > config.max_pattern_length {
                return Err(DetectError::PatternTooLong {
                    length,
                    max: config.max_pattern_length,
                });
            }

            if config.max_patterns > 0 && patterns.len() >= config.max_patterns {
                return Err(DetectError::TooManyPatterns {
                    count: patterns.len() + 1,
                    max: config.max_patterns,
                });
            }

            let id = patterns.len() as u32;
            seen.insert(trimmed.to_string());
            patterns.push(Pattern {
                id,
                text: trimmed.to_string(),
            });
        }

        Ok(Self { patterns })
    }

    /// The surviving patterns, in id order
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Number of surviving patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when normalization left nothing to match
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
