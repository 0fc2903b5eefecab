//! This module is responsible for lexing (tokenizing) source text into tokens.
//!
//! The lexer is driven by an ordered table of [`Rule`]s. At every position the
//! first rule whose pattern matches there wins, no matter how long a later
//! rule's match would have been. Rules without a tag throw their match away,
//! which is how whitespace and comments are skipped.

use crate::position::Position;
use crate::token::Token;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// One row of the rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule<K> {
    /// A regular expression, matched only at the current scan position.
    pub pattern: String,
    /// `None` means "discard".
    pub tag: Option<K>,
}

impl<K> Rule<K> {
    pub fn new(pattern: impl Into<String>, tag: K) -> Self {
        Self {
            pattern: pattern.into(),
            tag: Some(tag),
        }
    }

    /// A rule whose matches produce no token.
    pub fn skip(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            tag: None,
        }
    }
}

impl<K, S: Into<String>> From<(S, Option<K>)> for Rule<K> {
    fn from((pattern, tag): (S, Option<K>)) -> Self {
        Self {
            pattern: pattern.into(),
            tag,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{position} illegal character: {character:?}")]
    IllegalCharacter { character: char, position: Position },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug)]
struct CompiledRule<K> {
    regex: Regex,
    tag: Option<K>,
}

/// A rule table with every pattern compiled up front.
#[derive(Clone, Debug)]
pub struct Lexer<K> {
    rules: Vec<CompiledRule<K>>,
}

impl<K> Lexer<K> {
    pub fn new<R>(rules: impl IntoIterator<Item = R>) -> Result<Self>
    where
        R: Into<Rule<K>>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let Rule { pattern, tag } = rule.into();
                match Regex::new(&pattern) {
                    Ok(regex) => Ok(CompiledRule { regex, tag }),
                    Err(source) => Err(Error::InvalidPattern { pattern, source }),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Find the first rule with a non-empty match starting exactly at `pos`,
    /// and the length of that match. Empty matches never win, so every step
    /// makes progress.
    ///
    /// The whole text stays the haystack, so `\b`, `\B` and `^` still see
    /// the characters before `pos`.
    fn first_match(&self, text: &str, pos: usize) -> Option<(&CompiledRule<K>, usize)> {
        self.rules.iter().find_map(|rule| {
            // Leftmost-first: a match at `pos`, if any, is the one found.
            let m = rule.regex.find_at(text, pos).filter(|m| m.start() == pos)?;
            (!m.is_empty()).then_some((rule, m.len()))
        })
    }
}

impl<K: Clone> Lexer<K> {
    /// Split the whole of `text` into tokens. Either every character is
    /// accounted for, or an error names the first one that is not.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token<K>>> {
        let mut tokens = vec![];
        let mut pos = 0;
        while let Some(character) = text[pos..].chars().next() {
            let Some((rule, len)) = self.first_match(text, pos) else {
                let position = Position::locate(text, pos);
                warn!(%position, ?character, "no rule matches");
                return Err(Error::IllegalCharacter {
                    character,
                    position,
                });
            };
            let lexeme = &text[pos..pos + len];
            match &rule.tag {
                Some(tag) => {
                    trace!(offset = pos, lexeme, "token");
                    tokens.push(Token::new(lexeme, tag.clone()));
                }
                None => trace!(offset = pos, len, "discarded"),
            }
            pos += len;
        }
        debug!(count = tokens.len(), "tokenized");
        Ok(tokens)
    }
}

/// Compile `rules` and tokenize `text` with them in one go.
pub fn tokenize<K, R>(text: &str, rules: impl IntoIterator<Item = R>) -> Result<Vec<Token<K>>>
where
    K: Clone,
    R: Into<Rule<K>>,
{
    Lexer::new(rules)?.tokenize(text)
}
