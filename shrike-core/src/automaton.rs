// Immutable automaton read model
//
// Produced by the failure-link compiler in `builder`. States live in a
// flat arena indexed by `StateId`; nothing here mutates after compilation,
// so an `Arc<Automaton>` can be shared by unlimited concurrent readers
// without synchronization.

use ahash::AHashMap;
use smallvec::SmallVec;

/// Handle into the automaton's state table
pub type StateId = u32;

/// The root (initial) state. Always present, always id 0.
pub const ROOT_STATE: StateId = 0;

/// One compiled automaton state
#[derive(Debug, Clone)]
pub(crate) struct State {
    /// Goto edges from the trie (own outgoing edges only)
    pub(crate) edges: AHashMap<char, StateId>,

    /// Fallback target used to make the transition function total.
    /// Always references a shallower state; the goto edges themselves
    /// form no cycles.
    pub(crate) fail: StateId,

    /// Characters consumed along the goto path from the root
    pub(crate) depth: u32,

    /// Pattern ids completing at this state: the state's own terminal id
    /// first, then ids inherited from the fail chain (suffix patterns)
    pub(crate) output: SmallVec<[u32; 1]>,
}

impl State {
    pub(crate) fn new(depth: u32) -> Self {
        Self {
            edges: AHashMap::new(),
            fail: ROOT_STATE,
            depth,
            output: SmallVec::new(),
        }
    }
}

/// Compiled, immutable Aho-Corasick automaton
#[derive(Debug)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) pattern_texts: Vec<String>,
    /// Char length per pattern id, cached for span recovery during scans
    pub(crate) pattern_lens: Vec<u32>,
}

impl Automaton {
    /// The trivial one-state automaton: transition always returns the
    /// root and no state has output. This is what an empty dictionary
    /// compiles to, and what `clear` installs.
    pub(crate) fn empty() -> Self {
        Self {
            states: vec![State::new(0)],
            pattern_texts: Vec::new(),
            pattern_lens: Vec::new(),
        }
    }

    /// Total transition function.
    ///
    /// Follows the private fail chain until a goto edge for `chr` is
    /// found, defaulting to the root. The chain only ever references
    /// shallower states, so the walk is bounded by the current depth.
    pub fn transition(&self, mut state: StateId, chr: char) -> StateId {
        loop {
            if let Some(&next) = self.states[state as usize].edges.get(&chr) {
                return next;
            }
            if state == ROOT_STATE {
                return ROOT_STATE;
            }
            state = self.states[state as usize].fail;
        }
    }

    /// Pattern ids completing at `state`
    pub fn output(&self, state: StateId) -> &[u32] {
        &self.states[state as usize].output
    }

    /// Characters consumed along `state`'s goto path
    pub fn depth(&self, state: StateId) -> u32 {
        self.states[state as usize].depth
    }

    /// Text of the pattern with the given id
    pub fn pattern_text(&self, id: u32) -> &str {
        &self.pattern_texts[id as usize]
    }

    /// Char length of the pattern with the given id
    pub fn pattern_char_len(&self, id: u32) -> u32 {
        self.pattern_lens[id as usize]
    }

    /// Number of patterns compiled into this automaton
    pub fn pattern_count(&self) -> usize {
        self.pattern_texts.len()
    }

    /// Number of states, root included
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}
