//! Linear wildcard automaton and the two scanners driving it
//!
//! A compiled wildcard pattern is a sequence of tokens. State `i` means "the
//! first `i` tokens are consumed"; state `tokens.len()` accepts. `AnyMany`
//! states loop on every character and carry an epsilon edge to the next state,
//! so the automaton is simulated as a set of live states.

/// One compiled pattern element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Char(char),
    AnyOne,
    AnyMany,
}

/// Live state set with O(1) membership
struct StateSet {
    members: Vec<usize>,
    marks: Vec<bool>,
}

impl StateSet {
    fn new(size: usize) -> Self {
        Self {
            members: Vec::with_capacity(size),
            marks: vec![false; size],
        }
    }

    fn clear(&mut self) {
        for state in self.members.drain(..) {
            self.marks[state] = false;
        }
    }

    /// Insert `state` together with its epsilon closure
    fn insert(&mut self, mut state: usize, tokens: &[Token]) {
        loop {
            if self.marks[state] {
                return;
            }
            self.marks[state] = true;
            self.members.push(state);
            match tokens.get(state) {
                Some(Token::AnyMany) => state += 1,
                _ => return,
            }
        }
    }

    fn contains(&self, state: usize) -> bool {
        self.marks[state]
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Nondeterministic automaton over a token sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Automaton {
    tokens: Vec<Token>,
}

impl Automaton {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Automaton accepting the reversed language
    pub(crate) fn reversed(&self) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.reverse();
        Self { tokens }
    }

    fn accept_state(&self) -> usize {
        self.tokens.len()
    }

    /// Feed `input` from the initial state and report every accepting prefix
    /// length to `on_accept`; scanning stops when the state set dies or the
    /// callback returns `false`.
    pub(crate) fn scan<I>(&self, input: I, mut on_accept: impl FnMut(usize) -> bool)
    where
        I: IntoIterator<Item = char>,
    {
        let size = self.tokens.len() + 1;
        let accept = self.accept_state();
        let mut current = StateSet::new(size);
        let mut next = StateSet::new(size);
        current.insert(0, &self.tokens);

        if current.contains(accept) && !on_accept(0) {
            return;
        }

        for (consumed, ch) in input.into_iter().enumerate() {
            next.clear();
            for &state in &current.members {
                match self.tokens.get(state) {
                    Some(Token::Char(expected)) if *expected == ch => {
                        next.insert(state + 1, &self.tokens)
                    }
                    Some(Token::AnyOne) => next.insert(state + 1, &self.tokens),
                    Some(Token::AnyMany) => next.insert(state, &self.tokens),
                    _ => {}
                }
            }
            if next.is_empty() {
                return;
            }
            if next.contains(accept) && !on_accept(consumed + 1) {
                return;
            }
            std::mem::swap(&mut current, &mut next);
        }
    }

    /// Whether the whole of `text` is accepted
    pub(crate) fn accepts(&self, text: &[char]) -> bool {
        let mut accepted = false;
        self.scan(text.iter().copied(), |consumed| {
            accepted = consumed == text.len();
            true
        });
        accepted
    }

    /// End of the shortest match starting at `begin`
    pub(crate) fn shortest_from(&self, text: &[char], begin: usize) -> Option<usize> {
        let mut end = None;
        self.scan(text[begin..].iter().copied(), |consumed| {
            end = Some(begin + consumed);
            false
        });
        end
    }

    /// End of the longest match starting at `begin`
    pub(crate) fn longest_from(&self, text: &[char], begin: usize) -> Option<usize> {
        let mut end = None;
        self.scan(text[begin..].iter().copied(), |consumed| {
            end = Some(begin + consumed);
            true
        });
        end
    }
}

/// Forward scanner yielding, for every start position in ascending order,
/// the shortest match beginning there
pub struct ShortestMatcher<'a> {
    automaton: &'a Automaton,
    text: &'a [char],
    next_begin: usize,
    current: Option<(usize, usize)>,
}

impl<'a> ShortestMatcher<'a> {
    pub(crate) fn new(automaton: &'a Automaton, text: &'a [char], from: usize) -> Self {
        Self {
            automaton,
            text,
            next_begin: from,
            current: None,
        }
    }

    /// Advance to the next match; `false` once the text is exhausted
    pub fn find(&mut self) -> bool {
        while self.next_begin <= self.text.len() {
            let begin = self.next_begin;
            self.next_begin += 1;
            if let Some(end) = self.automaton.shortest_from(self.text, begin) {
                self.current = Some((begin, end));
                return true;
            }
        }
        self.current = None;
        false
    }

    pub fn start(&self) -> Option<usize> {
        self.current.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<usize> {
        self.current.map(|(_, end)| end)
    }

    pub fn group(&self) -> Option<String> {
        self.current
            .map(|(start, end)| self.text[start..end].iter().collect())
    }
}

/// Backward scanner yielding start positions from the end of the text
/// towards its beginning, each with the longest match beginning there
pub struct FromEndMatcher<'a> {
    automaton: &'a Automaton,
    text: &'a [char],
    next_begin: Option<usize>,
    current: Option<(usize, usize)>,
}

impl<'a> FromEndMatcher<'a> {
    pub(crate) fn new(automaton: &'a Automaton, text: &'a [char]) -> Self {
        Self {
            automaton,
            text,
            next_begin: Some(text.len()),
            current: None,
        }
    }

    pub fn find(&mut self) -> bool {
        while let Some(begin) = self.next_begin {
            self.next_begin = begin.checked_sub(1);
            if let Some(end) = self.automaton.longest_from(self.text, begin) {
                self.current = Some((begin, end));
                return true;
            }
        }
        self.current = None;
        false
    }

    pub fn start(&self) -> Option<usize> {
        self.current.map(|(start, _)| start)
    }

    pub fn end(&self) -> Option<usize> {
        self.current.map(|(_, end)| end)
    }

    pub fn group(&self) -> Option<String> {
        self.current
            .map(|(start, end)| self.text[start..end].iter().collect())
    }
}
