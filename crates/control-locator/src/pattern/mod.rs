//! Wildcard search patterns with position-aware queries
//!
//! Syntax: `*` matches any run of characters, `?` exactly one character and
//! `\` escapes `*`, `?` and `\`. A backslash in front of any other character
//! is kept literally. Matching is case-sensitive and every offset reported
//! by this module counts characters, not bytes.

mod automaton;

pub use automaton::{FromEndMatcher, ShortestMatcher};

use crate::errors::LocatorError;
use crate::types::{saturating_offset, FindSpot};
use automaton::{Automaton, Token};
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Upper bound for the token count of one pattern
pub const MAX_PATTERN_TOKENS: usize = 4096;

const DEFAULT_CACHE_CAPACITY: usize = 256;

static PATTERN_CACHE: Lazy<Mutex<LruCache<String, SearchPattern>>> = Lazy::new(|| {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
    ))
});

/// Resize the shared compiled-pattern cache
pub fn set_pattern_cache_capacity(capacity: usize) -> Result<(), LocatorError> {
    let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
        LocatorError::Config("pattern_cache_capacity must be greater than zero".to_string())
    })?;
    PATTERN_CACHE.lock().resize(capacity);
    Ok(())
}

/// Grow the shared cache to at least `capacity`; never shrinks it
pub fn grow_pattern_cache_capacity(capacity: usize) -> Result<usize, LocatorError> {
    let requested = NonZeroUsize::new(capacity).ok_or_else(|| {
        LocatorError::Config("pattern_cache_capacity must be greater than zero".to_string())
    })?;
    let mut cache = PATTERN_CACHE.lock();
    if requested > cache.cap() {
        debug!("Growing pattern cache to {} entries", requested);
        cache.resize(requested);
    }
    Ok(cache.cap().get())
}

pub fn pattern_cache_capacity() -> usize {
    PATTERN_CACHE.lock().cap().get()
}

/// Kind of a compiled pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Empty or only `*`
    MatchAll,
    /// No unescaped wildcard
    Literal,
    /// Contains `*` and/or `?`
    Wildcard,
}

#[derive(Debug)]
enum Program {
    MatchAll,
    Literal(Vec<char>),
    Wildcard {
        full: Automaton,
        /// Pattern without its leading and trailing `*`
        core: Automaton,
        reversed: Automaton,
    },
}

#[derive(Debug)]
struct Compiled {
    source: String,
    program: Program,
    min_length: usize,
    left_truncated: bool,
    right_truncated: bool,
}

/// Compiled, immutable search pattern; clones share the compiled program
#[derive(Clone)]
pub struct SearchPattern {
    inner: Arc<Compiled>,
}

impl SearchPattern {
    /// Compile `source`, consulting the shared cache first
    pub fn compile(source: &str) -> Result<SearchPattern, LocatorError> {
        let key = source.to_string();
        if let Some(pattern) = PATTERN_CACHE.lock().get(&key) {
            return Ok(pattern.clone());
        }

        let pattern = Self::compile_uncached(source)?;
        PATTERN_CACHE.lock().put(key, pattern.clone());
        Ok(pattern)
    }

    /// Pattern matching the given fragments in order, anything in between
    pub fn from_fragments<S: AsRef<str>>(fragments: &[S]) -> Result<SearchPattern, LocatorError> {
        let joined = fragments
            .iter()
            .map(|fragment| fragment.as_ref())
            .collect::<Vec<_>>()
            .join("*");
        Self::compile(&joined)
    }

    /// Pattern matching everything
    pub fn match_all() -> SearchPattern {
        SearchPattern {
            inner: Arc::new(Compiled {
                source: String::new(),
                program: Program::MatchAll,
                min_length: 0,
                left_truncated: false,
                right_truncated: false,
            }),
        }
    }

    fn compile_uncached(source: &str) -> Result<SearchPattern, LocatorError> {
        let tokens = tokenize(source);
        if tokens.len() > MAX_PATTERN_TOKENS {
            return Err(LocatorError::PatternCompilation {
                pattern: source.to_string(),
                reason: format!(
                    "{} tokens exceed the limit of {}",
                    tokens.len(),
                    MAX_PATTERN_TOKENS
                ),
            });
        }

        let min_length = tokens.iter().filter(|t| **t != Token::AnyMany).count();
        let has_wildcard = tokens
            .iter()
            .any(|t| matches!(t, Token::AnyMany | Token::AnyOne));

        let (program, left_truncated, right_truncated) = if min_length == 0 {
            (Program::MatchAll, false, false)
        } else if !has_wildcard {
            let literal = tokens
                .iter()
                .filter_map(|t| match t {
                    Token::Char(c) => Some(*c),
                    _ => None,
                })
                .collect();
            (Program::Literal(literal), false, false)
        } else {
            let left = tokens.first() == Some(&Token::AnyMany);
            let right = tokens.last() == Some(&Token::AnyMany);
            let core_start = if left { 1 } else { 0 };
            let core_end = if right { tokens.len() - 1 } else { tokens.len() };
            let full = Automaton::new(tokens.clone());
            let reversed = full.reversed();
            let core = Automaton::new(tokens[core_start..core_end].to_vec());
            (
                Program::Wildcard {
                    full,
                    core,
                    reversed,
                },
                left,
                right,
            )
        };

        debug!(
            "Compiled pattern '{}' ({:?}, min length {})",
            source,
            kind_of(&program),
            min_length
        );

        Ok(SearchPattern {
            inner: Arc::new(Compiled {
                source: source.to_string(),
                program,
                min_length,
                left_truncated,
                right_truncated,
            }),
        })
    }

    /// Source text the pattern was compiled from
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn kind(&self) -> PatternKind {
        kind_of(&self.inner.program)
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self.inner.program, Program::MatchAll)
    }

    /// Number of characters any match covers
    pub fn min_length(&self) -> usize {
        self.inner.min_length
    }

    /// Pattern starts with `*`
    pub fn is_left_truncated(&self) -> bool {
        self.inner.left_truncated
    }

    /// Pattern ends with `*`
    pub fn is_right_truncated(&self) -> bool {
        self.inner.right_truncated
    }

    /// Whether the whole of `text` matches
    pub fn matches(&self, text: &str) -> bool {
        match &self.inner.program {
            Program::MatchAll => true,
            Program::Literal(literal) => text.chars().eq(literal.iter().copied()),
            Program::Wildcard { full, .. } => full.accepts(&to_chars(text)),
        }
    }

    /// Whether `text` ends with an occurrence of the pattern
    pub fn matches_at_end(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match &self.inner.program {
            Program::MatchAll => false,
            Program::Literal(literal) => {
                let chars = to_chars(text);
                chars.ends_with(literal)
            }
            Program::Wildcard { reversed, .. } => {
                let mut found = false;
                reversed.scan(text.chars().rev(), |_| {
                    found = true;
                    false
                });
                found
            }
        }
    }

    /// First occurrence at or after character `from`
    ///
    /// Takes the leftmost start admitting a match and the shortest match from
    /// there.
    pub fn first_occurrence_in(&self, text: &str, from: usize) -> Option<FindSpot> {
        if text.is_empty() {
            return None;
        }
        let chars = to_chars(text);
        if chars.len() < self.min_length() || from > chars.len() {
            return None;
        }
        match &self.inner.program {
            Program::MatchAll => None,
            Program::Literal(literal) => find_literal(&chars, literal, from)
                .map(|pos| spot(pos, pos + literal.len())),
            Program::Wildcard { full, .. } => {
                let mut matcher = ShortestMatcher::new(full, &chars, from);
                if matcher.find() {
                    Some(spot(matcher.start()?, matcher.end()?))
                } else {
                    None
                }
            }
        }
    }

    /// Last occurrence: rightmost start admitting a match, longest match from
    /// there
    pub fn last_occurrence_in(&self, text: &str) -> Option<FindSpot> {
        if text.is_empty() {
            return None;
        }
        let chars = to_chars(text);
        if chars.len() < self.min_length() {
            return None;
        }
        match &self.inner.program {
            Program::MatchAll => None,
            Program::Literal(literal) => {
                rfind_literal(&chars, literal).map(|pos| spot(pos, pos + literal.len()))
            }
            Program::Wildcard { full, .. } => {
                let mut matcher = FromEndMatcher::new(full, &chars);
                if matcher.find() {
                    Some(spot(matcher.start()?, matcher.end()?))
                } else {
                    None
                }
            }
        }
    }

    /// Smallest number of characters of `text` outside an occurrence
    ///
    /// A leading `*` absorbs the characters in front of the occurrence and a
    /// trailing `*` those behind it. `-1` if there is no occurrence.
    pub fn no_of_surrounding_chars_in(&self, text: &str) -> i32 {
        if self.is_match_all() {
            return 0;
        }
        if text.is_empty() {
            return -1;
        }
        let chars = to_chars(text);
        if chars.len() < self.min_length() {
            return -1;
        }
        let total = chars.len();
        match &self.inner.program {
            Program::MatchAll => 0,
            Program::Literal(literal) => match find_literal(&chars, literal, 0) {
                Some(_) => saturating_offset(total - literal.len()),
                None => -1,
            },
            Program::Wildcard { core, .. } => {
                let left = self.is_left_truncated();
                let right = self.is_right_truncated();
                let mut best: Option<usize> = None;
                let mut matcher = ShortestMatcher::new(core, &chars, 0);
                while matcher.find() {
                    let (Some(start), Some(end)) = (matcher.start(), matcher.end()) else {
                        break;
                    };
                    let before = if left { 0 } else { start };
                    let after = if right { 0 } else { total - end };
                    let outside = before + after;
                    best = Some(best.map_or(outside, |current| current.min(outside)));
                    if outside == 0 {
                        break;
                    }
                }
                best.map_or(-1, saturating_offset)
            }
        }
    }

    /// Characters behind the last occurrence; `-1` if there is none
    ///
    /// A match-all pattern consumes nothing, so the whole text remains.
    pub fn no_of_chars_after_last_occurrence_in(&self, text: &str) -> i32 {
        if self.is_match_all() {
            return saturating_offset(text.chars().count());
        }
        match self.last_occurrence_in(text) {
            Some(last) => saturating_offset(text.chars().count()) - last.end,
            None => -1,
        }
    }

    /// Characters in front of the last occurrence; `-1` if there is none
    pub fn no_of_chars_before_last_occurrence_in(&self, text: &str) -> i32 {
        if text.is_empty() {
            return -1;
        }
        let chars = to_chars(text);
        if chars.len() < self.min_length() {
            return -1;
        }
        match &self.inner.program {
            Program::MatchAll => 0,
            Program::Literal(literal) => rfind_literal(&chars, literal).map_or(-1, saturating_offset),
            Program::Wildcard { core, .. } => {
                let mut last = None;
                let mut matcher = ShortestMatcher::new(core, &chars, 0);
                while matcher.find() {
                    last = matcher.start();
                }
                last.map_or(-1, saturating_offset)
            }
        }
    }
}

impl PartialEq for SearchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.inner.source == other.inner.source
    }
}

impl Eq for SearchPattern {}

impl fmt::Debug for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchPattern")
            .field("source", &self.inner.source)
            .field("kind", &self.kind())
            .field("min_length", &self.inner.min_length)
            .finish()
    }
}

impl fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PatternKind::MatchAll => write!(f, "SearchPattern '{}' [matchAll]", self.inner.source),
            _ => write!(f, "SearchPattern '{}'", self.inner.source),
        }
    }
}

fn kind_of(program: &Program) -> PatternKind {
    match program {
        Program::MatchAll => PatternKind::MatchAll,
        Program::Literal(_) => PatternKind::Literal,
        Program::Wildcard { .. } => PatternKind::Wildcard,
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some(escaped @ ('*' | '?' | '\\')) => {
                    chars.next();
                    tokens.push(Token::Char(escaped));
                }
                _ => tokens.push(Token::Char('\\')),
            },
            '*' => {
                if tokens.last() != Some(&Token::AnyMany) {
                    tokens.push(Token::AnyMany);
                }
            }
            '?' => tokens.push(Token::AnyOne),
            other => tokens.push(Token::Char(other)),
        }
    }
    tokens
}

fn to_chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

fn spot(start: usize, end: usize) -> FindSpot {
    FindSpot::new(saturating_offset(start), saturating_offset(end))
}

fn find_literal(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&pos| haystack[pos..].starts_with(needle))
}

fn rfind_literal(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&pos| haystack[pos..].starts_with(needle))
}
