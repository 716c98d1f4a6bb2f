// Trie construction and failure-link compilation
//
// Builds the goto trie from a normalized pattern table, then runs the
// classic breadth-first Aho-Corasick compilation: depth-1 states fail to
// the root, deeper states fail to the first fail-chain ancestor of their
// parent with a matching edge, and each state's output set absorbs its
// fail target's so suffix patterns are reported alongside longer ones.

use std::collections::VecDeque;

use tracing::debug;

use crate::automaton::{Automaton, State, StateId, ROOT_STATE};
use crate::pattern::{Pattern, PatternTable};

/// Builds an [`Automaton`] from a pattern table
///
/// Insertion order does not affect the resulting state/output sets, only
/// internal state numbering; callers must not depend on specific ids.
#[derive(Debug)]
pub struct TrieBuilder {
    states: Vec<State>,
    pattern_texts: Vec<String>,
    pattern_lens: Vec<u32>,
}

impl TrieBuilder {
    /// Create a builder holding only the root state
    pub fn new() -> Self {
        Self {
            states: vec![State::new(0)],
            pattern_texts: Vec::new(),
            pattern_lens: Vec::new(),
        }
    }

    /// Create a builder with every pattern of `table` inserted
    pub fn from_table(table: &PatternTable) -> Self {
        let mut builder = Self::new();
        for pattern in table.patterns() {
            builder.insert(pattern);
        }
        builder
    }

    /// Insert one pattern's character path, creating states on demand and
    /// marking the terminal state with the pattern id.
    ///
    /// Patterns must arrive in id order (the table iterates them that way).
    pub fn insert(&mut self, pattern: &Pattern) {
        debug_assert_eq!(pattern.id as usize, self.pattern_texts.len());

        let mut node = ROOT_STATE;
        let mut depth = 0u32;
        for chr in pattern.text.chars() {
            depth += 1;
            node = match self.states[node as usize].edges.get(&chr).copied() {
                Some(child) => child,
                None => {
                    let child = self.states.len() as StateId;
                    self.states.push(State::new(depth));
                    self.states[node as usize].edges.insert(chr, child);
                    child
                }
            };
        }
        self.states[node as usize].output.push(pattern.id);

        self.pattern_texts.push(pattern.text.clone());
        self.pattern_lens.push(pattern.text.chars().count() as u32);
    }

    /// Compile failure links and merged output sets, consuming the
    /// builder. An empty builder compiles to the trivial root-only
    /// automaton.
    pub fn compile(mut self) -> Automaton {
        let mut queue: VecDeque<StateId> = VecDeque::new();

        // Depth-1 states fail to the root.
        let roots: Vec<StateId> = self.states[ROOT_STATE as usize]
            .edges
            .values()
            .copied()
            .collect();
        for child in roots {
            self.states[child as usize].fail = ROOT_STATE;
            queue.push_back(child);
        }

        // BFS order guarantees a state's fail target is fully resolved
        // (link and merged outputs) before the state itself is processed.
        while let Some(node) = queue.pop_front() {
            let edges: Vec<(char, StateId)> = self.states[node as usize]
                .edges
                .iter()
                .map(|(&chr, &child)| (chr, child))
                .collect();

            for (chr, child) in edges {
                let mut probe = self.states[node as usize].fail;
                let fail = loop {
                    if let Some(&target) = self.states[probe as usize].edges.get(&chr) {
                        break target;
                    }
                    if probe == ROOT_STATE {
                        break ROOT_STATE;
                    }
                    probe = self.states[probe as usize].fail;
                };

                let inherited = self.states[fail as usize].output.clone();
                let child_state = &mut self.states[child as usize];
                child_state.fail = fail;
                child_state.output.extend(inherited);

                queue.push_back(child);
            }
        }

        debug!(
            states = self.states.len(),
            patterns = self.pattern_texts.len(),
            "compiled automaton"
        );

        Automaton {
            states: self.states,
            pattern_texts: self.pattern_texts,
            pattern_lens: self.pattern_lens,
        }
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DetectorConfig;
    use crate::ROOT_STATE;

    fn compile(words: &[&str]) -> Automaton {
        let table = PatternTable::normalize(words, &DetectorConfig::default()).unwrap();
        TrieBuilder::from_table(&table).compile()
    }

    fn walk(automaton: &Automaton, text: &str) -> StateId {
        text.chars()
            .fold(ROOT_STATE, |state, chr| automaton.transition(state, chr))
    }

    #[test]
    fn test_empty_table_compiles_to_root_only() {
        let automaton = compile(&[]);
        assert_eq!(automaton.state_count(), 1);
        assert_eq!(walk(&automaton, "anything"), ROOT_STATE);
    }

    #[test]
    fn test_shared_prefix_states() {
        // "she" and "shell" share the s-h-e path.
        let automaton = compile(&["she", "shell"]);
        assert_eq!(automaton.state_count(), 1 + 5);
    }

    #[test]
    fn test_terminal_output() {
        let automaton = compile(&["abc"]);
        let state = walk(&automaton, "abc");
        assert_eq!(automaton.output(state), &[0]);
        assert_eq!(automaton.depth(state), 3);
    }

    #[test]
    fn test_failure_transition_recovers() {
        // After "ab" fails on 'b', the 'b' restarts a "bc" match.
        let automaton = compile(&["abd", "bc"]);
        let state = walk(&automaton, "abc");
        assert_eq!(automaton.output(state), &[1]);
    }

    #[test]
    fn test_suffix_outputs_merged() {
        // "he" is a suffix of "she": both complete at the same state.
        let automaton = compile(&["she", "he"]);
        let state = walk(&automaton, "she");
        let mut ids = automaton.output(state).to_vec();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_insertion_order_irrelevant_for_outputs() {
        let forward = compile(&["she", "he", "hers"]);
        let reversed = compile(&["hers", "he", "she"]);
        for text in ["she", "he", "hers", "ushers"] {
            let a = {
                let mut out: Vec<&str> = forward
                    .output(walk(&forward, text))
                    .iter()
                    .map(|&id| forward.pattern_text(id))
                    .collect();
                out.sort_unstable();
                out
            };
            let b = {
                let mut out: Vec<&str> = reversed
                    .output(walk(&reversed, text))
                    .iter()
                    .map(|&id| reversed.pattern_text(id))
                    .collect();
                out.sort_unstable();
                out
            };
            assert_eq!(a, b, "outputs differ for {text}");
        }
    }

    #[test]
    fn test_fail_links_reference_shallower_states() {
        let automaton = compile(&["she", "he", "hers", "his"]);
        for (id, state) in automaton.states.iter().enumerate() {
            if id as StateId != ROOT_STATE {
                let fail = &automaton.states[state.fail as usize];
                assert!(fail.depth < state.depth);
            }
        }
    }

    #[test]
    fn test_unicode_patterns() {
        let automaton = compile(&["法轮功"]);
        let state = walk(&automaton, "法轮功");
        assert_eq!(automaton.output(state), &[0]);
        assert_eq!(automaton.pattern_char_len(0), 3);
    }
}
