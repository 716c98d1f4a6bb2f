//! Shrike Core - Noise-Tolerant Multi-Pattern Word Detection
//!
//! This crate provides single-pass detection of a large, dynamically
//! replaceable dictionary of banned/sensitive substrings inside arbitrary
//! text, using an Aho-Corasick automaton.
//!
//! ## Overview
//!
//! A [`Detector`] owns the currently installed automaton and serves
//! queries at high rate while rebuilds run off to the side. Input text may
//! contain deliberately inserted filler characters (dots, punctuation)
//! meant to break naive substring search; the scanner bridges them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           PatternTable                          │
//! │  (trim, dedup, dense ids in first-seen order)   │
//! └──────────────┬──────────────────────────────────┘
//!                │
//!                v
//! ┌─────────────────────────────────────────────────┐
//! │           TrieBuilder                           │
//! │  (goto trie + BFS failure-link compilation)     │
//! └──────────────┬──────────────────────────────────┘
//!                │
//!                v
//! ┌─────────────────────────────────────────────────┐
//! │           Automaton (immutable)                 │
//! │  (total transition fn + per-state output sets)  │
//! └──────────────┬──────────────────────────────────┘
//!                │
//!                v
//! ┌─────────────────────────────────────────────────┐
//! │           Detector                              │
//! │  - build/rebuild: compile aside, atomic install │
//! │  - process: lock-free snapshot + Scanner        │
//! │  - clear/is_active                              │
//! └─────────────────────────────────────────────────┘
//! ```

mod automaton;
mod builder;
mod detector;
mod pattern;
mod scanner;

#[cfg(test)]
mod perf;

pub use automaton::{Automaton, StateId, ROOT_STATE};
pub use builder::TrieBuilder;
pub use detector::{Detector, DetectorState};
pub use pattern::{Pattern, PatternTable};
pub use scanner::{Match, NoiseConfig, Scanner};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or querying a detector.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("No patterns remain after normalization")]
    EmptyDictionary,

    #[error("Pattern too long: {length} chars (max: {max})")]
    PatternTooLong { length: usize, max: usize },

    #[error("Too many patterns: {count} (max: {max})")]
    TooManyPatterns { count: usize, max: usize },

    #[error("Input is not valid UTF-8: {0}")]
    InvalidCharacterData(#[from] std::str::Utf8Error),
}

/// Result type for detector operations
pub type DetectResult<T> = Result<T, DetectError>;

/// Configuration for a [`Detector`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Maximum number of patterns after normalization (0 = unlimited)
    pub max_patterns: usize,

    /// Maximum pattern length in characters (0 = unlimited)
    pub max_pattern_length: usize,

    /// Treat an empty normalized dictionary as a build error.
    ///
    /// When false (the default), building from an empty word list installs
    /// a trivial automaton that matches nothing, mirroring `clear` except
    /// that the detector reports itself active.
    pub require_patterns: bool,

    /// Filler-skip policy applied by the scanner
    pub noise: NoiseConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_patterns: 100_000,
            max_pattern_length: 256,
            require_patterns: false,
            noise: NoiseConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Replace the noise policy
    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    /// Require at least one pattern at build time
    pub fn with_required_patterns(mut self) -> Self {
        self.require_patterns = true;
        self
    }
}
