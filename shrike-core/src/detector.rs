// Detector lifecycle and query surface
//
// Owns the currently installed automaton behind a lock-free swap slot.
// Builds compile a replacement off to the side and install it with a
// single atomic store; readers snapshot the slot once per query and never
// block on a build in progress.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::automaton::Automaton;
use crate::builder::TrieBuilder;
use crate::pattern::PatternTable;
use crate::scanner::{Match, Scanner};
use crate::{DetectError, DetectResult, DetectorConfig};

/// Lifecycle state of a [`Detector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Nothing matches: never built, or explicitly cleared
    Empty,

    /// A built automaton is installed (possibly one with zero patterns,
    /// when the configuration allows an empty dictionary)
    Active,
}

/// The installed unit: state flag and automaton swap together, so readers
/// can never observe one without the other.
#[derive(Debug)]
struct Installed {
    state: DetectorState,
    automaton: Automaton,
}

impl Installed {
    fn empty() -> Self {
        Self {
            state: DetectorState::Empty,
            automaton: Automaton::empty(),
        }
    }
}

/// Thread-safe detector over a replaceable dictionary
///
/// Any number of threads may call [`process`](Self::process) concurrently
/// with each other and with builds. A query snapshots the installed
/// automaton once and runs entirely against that snapshot: a build
/// completing mid-scan affects only queries that start afterwards, and a
/// superseded automaton is dropped when its last in-flight reader
/// finishes with it.
pub struct Detector {
    current: ArcSwap<Installed>,
    /// Serializes writers (build/clear). Readers never touch it.
    build_lock: Mutex<()>,
    scanner: Scanner,
    config: DetectorConfig,
}

impl Detector {
    /// Create an empty detector with the default configuration
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    /// Create an empty detector with a custom configuration
    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(Installed::empty()),
            build_lock: Mutex::new(()),
            scanner: Scanner::new(config.noise.clone()),
            config,
        }
    }

    /// Build an automaton from `words` and install it, replacing whatever
    /// was installed before.
    ///
    /// All expensive work (normalization, trie construction, failure-link
    /// compilation) happens before the single atomic store, and a failed
    /// build leaves the previous install authoritative. With
    /// `require_patterns` unset, an empty word list installs a trivial
    /// automaton that matches nothing but still reports the detector
    /// active.
    pub fn build<I, S>(&self, words: I) -> DetectResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.build_lock.lock();

        let table = PatternTable::normalize(words, &self.config)?;
        if table.is_empty() && self.config.require_patterns {
            return Err(DetectError::EmptyDictionary);
        }

        let automaton = TrieBuilder::from_table(&table).compile();
        info!(
            patterns = automaton.pattern_count(),
            states = automaton.state_count(),
            "installing automaton"
        );
        self.current.store(Arc::new(Installed {
            state: DetectorState::Active,
            automaton,
        }));
        Ok(())
    }

    /// Alias for [`build`](Self::build): the new dictionary always
    /// replaces the old wholesale, never merges into it.
    pub fn rebuild<I, S>(&self, words: I) -> DetectResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.build(words)
    }

    /// Drop the dictionary. Queries return nothing until the next build.
    /// Always succeeds; clearing an empty detector is a no-op.
    pub fn clear(&self) {
        let _guard = self.build_lock.lock();
        self.current.store(Arc::new(Installed::empty()));
        debug!("detector cleared");
    }

    /// Current lifecycle state, reflecting the most recently completed
    /// install (never a build still in progress)
    pub fn state(&self) -> DetectorState {
        self.current.load().state
    }

    /// Whether an automaton is installed
    pub fn is_active(&self) -> bool {
        self.state() == DetectorState::Active
    }

    /// Number of patterns in the installed automaton
    pub fn pattern_count(&self) -> usize {
        self.current.load().automaton.pattern_count()
    }

    /// Scan `text` against a snapshot of the installed automaton and
    /// return every match in increasing tail order. An empty detector
    /// yields an empty sequence.
    pub fn process(&self, text: &str) -> Vec<Match> {
        let snapshot = self.current.load_full();
        self.scanner.scan(&snapshot.automaton, text)
    }

    /// Like [`process`](Self::process), for callers holding undecoded
    /// bytes. Validation failure aborts this call only; detector state is
    /// unaffected and no partial results are returned.
    pub fn process_bytes(&self, bytes: &[u8]) -> DetectResult<Vec<Match>> {
        let text = std::str::from_utf8(bytes)?;
        Ok(self.process(text))
    }

    /// The configuration this detector was created with
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_detector_is_empty() {
        let detector = Detector::new();
        assert_eq!(detector.state(), DetectorState::Empty);
        assert!(!detector.is_active());
        assert!(detector.process("anything").is_empty());
    }

    #[test]
    fn test_build_activates() {
        let detector = Detector::new();
        detector.build(["bad"]).unwrap();
        assert!(detector.is_active());
        assert_eq!(detector.pattern_count(), 1);

        let matches = detector.process("so bad");
        assert_eq!(matches, vec![Match { head: 3, tail: 5, pattern_id: 0 }]);
    }

    #[test]
    fn test_clear_empties() {
        let detector = Detector::new();
        detector.build(["bad"]).unwrap();
        detector.clear();
        assert_eq!(detector.state(), DetectorState::Empty);
        assert!(detector.process("bad").is_empty());

        // Clearing again is a no-op.
        detector.clear();
        assert_eq!(detector.state(), DetectorState::Empty);
    }

    #[test]
    fn test_rebuild_replaces_never_merges() {
        let detector = Detector::new();
        detector.build(["alpha"]).unwrap();
        detector.rebuild(["beta"]).unwrap();

        assert!(detector.process("alpha").is_empty());
        assert_eq!(detector.process("beta").len(), 1);
    }

    #[test]
    fn test_rebuild_idempotent() {
        let detector = Detector::new();
        let words = ["she", "he", "hers"];
        detector.build(words).unwrap();
        let before = detector.process("ushers say");
        detector.rebuild(words).unwrap();
        let after = detector.process("ushers say");
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_dictionary_allowed_by_default() {
        let detector = Detector::new();
        detector.build(Vec::<String>::new()).unwrap();
        assert!(detector.is_active());
        assert_eq!(detector.pattern_count(), 0);
        assert!(detector.process("anything").is_empty());
    }

    #[test]
    fn test_empty_dictionary_rejected_by_policy() {
        let detector =
            Detector::with_config(DetectorConfig::default().with_required_patterns());
        let result = detector.build(["  ", ""]);
        assert!(matches!(result, Err(DetectError::EmptyDictionary)));
        // Failed build must not disturb the previous state.
        assert!(!detector.is_active());
    }

    #[test]
    fn test_failed_build_keeps_previous_automaton() {
        let config = DetectorConfig {
            max_pattern_length: 8,
            ..Default::default()
        };
        let detector = Detector::with_config(config);
        detector.build(["bad"]).unwrap();

        let result = detector.build(["waytoolongpattern"]);
        assert!(matches!(result, Err(DetectError::PatternTooLong { .. })));
        assert!(detector.is_active());
        assert_eq!(detector.process("bad").len(), 1);
    }

    #[test]
    fn test_process_bytes_validates_utf8() {
        let detector = Detector::new();
        detector.build(["bad"]).unwrap();

        assert_eq!(detector.process_bytes(b"so bad").unwrap().len(), 1);

        let result = detector.process_bytes(&[0xff, 0xfe, b'b']);
        assert!(matches!(result, Err(DetectError::InvalidCharacterData(_))));
        // The failed call left the detector untouched.
        assert!(detector.is_active());
    }

    #[test]
    fn test_noise_tolerant_process() {
        let detector = Detector::new();
        detector.build(["法轮功"]).unwrap();

        let text = "法.轮.功";
        let matches = detector.process(text);
        assert_eq!(matches, vec![Match { head: 0, tail: 4, pattern_id: 0 }]);
    }

    #[test]
    fn test_concurrent_process_during_rebuild() {
        // Each generation's dictionary yields a distinct result set; every
        // reader must see exactly one generation, never a mixture.
        let detector = Arc::new(Detector::new());
        detector.build(["alpha"]).unwrap();

        let text = "alpha then beta";
        let expect_alpha = {
            let d = Detector::new();
            d.build(["alpha"]).unwrap();
            d.process(text)
        };
        let expect_beta = {
            let d = Detector::new();
            d.build(["beta"]).unwrap();
            d.process(text)
        };

        let writer = {
            let detector = Arc::clone(&detector);
            thread::spawn(move || {
                for round in 0..200 {
                    if round % 2 == 0 {
                        detector.rebuild(["beta"]).unwrap();
                    } else {
                        detector.rebuild(["alpha"]).unwrap();
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let detector = Arc::clone(&detector);
                let expect_alpha = expect_alpha.clone();
                let expect_beta = expect_beta.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let result = detector.process(text);
                        assert!(
                            result == expect_alpha || result == expect_beta,
                            "mixed-generation result: {result:?}"
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert!(detector.is_active());
    }

    #[test]
    fn test_concurrent_process_during_clear() {
        let detector = Arc::new(Detector::new());
        detector.build(["bad"]).unwrap();

        let writer = {
            let detector = Arc::clone(&detector);
            thread::spawn(move || {
                for _ in 0..100 {
                    detector.clear();
                    detector.build(["bad"]).unwrap();
                }
            })
        };

        let reader = {
            let detector = Arc::clone(&detector);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let result = detector.process("bad");
                    // Either generation is fine; a torn result is not.
                    assert!(result.is_empty() || result.len() == 1);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
