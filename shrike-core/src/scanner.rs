// Noise-tolerant scanning
//
// Drives one automaton over one text, left to right, bridging configured
// filler characters so that "法.轮.功" still matches a dictionary entry
// "法轮功" and the reported span covers the dots.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::automaton::{Automaton, ROOT_STATE};

/// One reported occurrence
///
/// `head` and `tail` are inclusive character offsets into the scanned
/// text, with `head <= tail`. The span includes any filler characters
/// interleaved between the matched characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Offset of the first character of the match
    pub head: usize,

    /// Offset of the last character of the match
    pub tail: usize,

    /// Id of the dictionary pattern that completed here
    pub pattern_id: u32,
}

/// Filler-skip policy applied during scanning
///
/// Characters in the filler set never reach the automaton: the scan state
/// is preserved across them, and a match completed on the far side of a
/// filler run stretches its span over the run. `max_run` bounds how many
/// consecutive fillers may be bridged; 0 means unlimited. A run exceeding
/// the bound is treated as a hard break and resets the scan state.
///
/// The exact filler set is deliberately configuration, not a constant:
/// which characters evaders use varies by deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Characters skipped without feeding the automaton
    pub filler_chars: AHashSet<char>,

    /// Longest bridgeable run of consecutive fillers (0 = unlimited)
    pub max_run: usize,
}

impl NoiseConfig {
    /// Punctuation conventionally inserted to break up banned words, in
    /// both ASCII and full-width forms.
    pub const DEFAULT_FILLERS: &'static [char] = &[
        '.', '。', '．', '·', '・', '-', '－', '_', '＿', '*', '＊', '|', '｜', '~', '～', '　',
    ];

    /// A policy that skips nothing
    pub fn none() -> Self {
        Self {
            filler_chars: AHashSet::new(),
            max_run: 0,
        }
    }

    /// A policy skipping exactly the given characters, unlimited runs
    pub fn with_fillers<I: IntoIterator<Item = char>>(chars: I) -> Self {
        Self {
            filler_chars: chars.into_iter().collect(),
            max_run: 0,
        }
    }

    /// Bound the bridgeable filler-run length
    pub fn with_max_run(mut self, max_run: usize) -> Self {
        self.max_run = max_run;
        self
    }

    /// Whether `chr` is skipped during scanning
    pub fn is_filler(&self, chr: char) -> bool {
        self.filler_chars.contains(&chr)
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self::with_fillers(Self::DEFAULT_FILLERS.iter().copied())
    }
}

/// Drives an [`Automaton`] over input text
///
/// Holds only the noise policy; all scan scratch is per call, so one
/// scanner may be shared by any number of threads, and many scanners may
/// run concurrently over the same automaton.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    noise: NoiseConfig,
}

impl Scanner {
    pub fn new(noise: NoiseConfig) -> Self {
        Self { noise }
    }

    /// Scan `text` and report every match in increasing tail order.
    ///
    /// Matches sharing a tail (suffix patterns) are emitted together, in
    /// the automaton's merged-output order, which is stable for identical
    /// input and automaton.
    pub fn scan(&self, automaton: &Automaton, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut state = ROOT_STATE;

        // Positions of every character fed to the automaton. The current
        // state's goto path always spells the last `depth(state)` entries,
        // so a pattern of char length L completing at position i starts at
        // fed[fed.len() - L] -- which lands before any filler interleaved
        // inside the match, giving the inclusive span the caller expects.
        let mut fed: Vec<usize> = Vec::new();
        let mut filler_run = 0usize;

        for (pos, chr) in text.chars().enumerate() {
            if self.noise.is_filler(chr) {
                filler_run += 1;
                if self.noise.max_run > 0 && filler_run > self.noise.max_run {
                    state = ROOT_STATE;
                    fed.clear();
                }
                continue;
            }
            filler_run = 0;

            state = automaton.transition(state, chr);
            if state == ROOT_STATE {
                // Fell all the way back: no suffix of the fed sequence is
                // a live prefix, so earlier positions can never head a
                // future match.
                fed.clear();
                continue;
            }
            fed.push(pos);

            for &id in automaton.output(state) {
                let len = automaton.pattern_char_len(id) as usize;
                matches.push(Match {
                    head: fed[fed.len() - len],
                    tail: pos,
                    pattern_id: id,
                });
            }
        }

        matches
    }
}
