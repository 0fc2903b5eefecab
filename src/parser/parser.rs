use super::combinators::{Alternate, Concat, Exp, Lazy, Opt, Phrase, Process, Rep};
use crate::token::Token;
use std::rc::Rc;

/// A successful parse: the value that was built, and the position of the first
/// token that was not consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub pos: usize,
}

impl<T> Parsed<T> {
    pub const fn new(value: T, pos: usize) -> Self {
        Parsed { value, pos }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            pos: self.pos,
        }
    }
}

/// `None` is a plain syntactic failure. It carries no message; alternatives
/// and repetitions recover from it.
pub type ParseResult<T> = Option<Parsed<T>>;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Something that runs over a token stream from a position.
///
/// The set of implementations is closed: the primitives and combinators of
/// this crate. Grammars are built out of them through [`Parser`].
pub trait Parse<K>: sealed::Sealed {
    type Output;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<Self::Output>;

    /// A description of the parser, for debugging.
    fn name(&self) -> String;
}

/// A shared handle to a parser producing `T` from tokens tagged with `K`.
///
/// Cloning is cheap, and clones share the same node. Grammars are built once,
/// before parsing, by calling the combinator methods below; nothing is mutated
/// afterwards except the cache inside [`Parser::lazy`] nodes.
pub struct Parser<'a, K, T> {
    inner: Rc<dyn Parse<K, Output = T> + 'a>,
}

impl<K, T> Clone for Parser<'_, K, T> {
    fn clone(&self) -> Self {
        Parser {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, T> std::fmt::Debug for Parser<'_, K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Parser").field("name", &self.name()).finish()
    }
}

// How a parser is used

impl<'a, K, T> Parser<'a, K, T> {
    pub(crate) fn new(parse: impl Parse<K, Output = T> + 'a) -> Self {
        Parser {
            inner: Rc::new(parse),
        }
    }

    pub fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        self.inner.parse(tokens, pos)
    }

    pub fn name(&self) -> String {
        self.inner.name()
    }

    /// Parse the whole token stream from the start, returning the value only
    /// if every token was consumed.
    pub fn parse_all(&self, tokens: &[Token<K>]) -> Option<T> {
        let Parsed { value, pos } = self.parse(tokens, 0)?;
        (pos == tokens.len()).then_some(value)
    }
}

// Combinators

/// `'a` is the lifetime of the parser. Objects that the parser references need
/// to live at least as long as `'a`.
impl<'a, K: 'a, T: 'a> Parser<'a, K, T> {
    /// Sequence: `self`, then `other` from where `self` stopped.
    pub fn then<U: 'a>(self, other: Parser<'a, K, U>) -> Parser<'a, K, (T, U)> {
        Parser::concat(self, other)
    }

    pub fn concat<U: 'a>(left: Self, right: Parser<'a, K, U>) -> Parser<'a, K, (T, U)> {
        Parser::new(Concat { left, right })
    }

    /// Sequence, keeping only the value of `self`.
    pub fn then_left<U: 'a>(self, other: Parser<'a, K, U>) -> Self {
        self.then(other).map(|(value, _)| value)
    }

    /// Sequence, keeping only the value of `other`.
    pub fn then_right<U: 'a>(self, other: Parser<'a, K, U>) -> Parser<'a, K, U> {
        self.then(other).map(|(_, value)| value)
    }

    /// Ordered choice: `other` is only tried if `self` fails.
    pub fn or_else(self, other: Self) -> Self {
        Parser::alternate(self, other)
    }

    pub fn alternate(left: Self, right: Self) -> Self {
        Parser::new(Alternate { left, right })
    }

    /// Never fails. Yields `None` and consumes nothing if `self` fails.
    pub fn opt(self) -> Parser<'a, K, Option<T>> {
        Parser::new(Opt { parser: self })
    }

    /// Zero or more. Never fails.
    pub fn rep(self) -> Parser<'a, K, Vec<T>> {
        Parser::new(Rep { parser: self })
    }

    /// One or more `self`, separated by `separator`. Each separator parses to
    /// a function that folds the operands from the left, so `1 + 2 + 3`
    /// becomes `add(add(1, 2), 3)`.
    pub fn separated_by<F>(self, separator: Parser<'a, K, F>) -> Self
    where
        F: Fn(T, T) -> T + 'a,
    {
        Parser::new(Exp {
            parser: self,
            separator,
        })
    }

    pub fn map<U: 'a, F>(self, f: F) -> Parser<'a, K, U>
    where
        F: Fn(T) -> U + 'a,
    {
        Parser::new(Process { parser: self, f })
    }

    /// Succeeds only if `self` consumes every remaining token.
    pub fn phrase(self) -> Self {
        Parser::new(Phrase { parser: self })
    }

    /// Defer building a parser until it is first used. This is how a rule
    /// refers to itself:
    ///
    /// ```ignore
    /// fn expr<'a>() -> Parser<'a, Tag, i64> {
    ///     let parens = reserved("(", Tag::Op)
    ///         .then_right(Parser::lazy(expr))
    ///         .then_left(reserved(")", Tag::Op));
    ///     one_of![parens, number()]
    /// }
    /// ```
    pub fn lazy(build: impl Fn() -> Self + 'a) -> Self {
        Parser::new(Lazy::new(build))
    }
}

/// Ordered choice over any number of parsers with the same output type.
#[macro_export]
macro_rules! one_of {
    ($first:expr $(, $rest:expr)* $(,)?) => {
        $first $( .or_else($rest) )*
    };
}
