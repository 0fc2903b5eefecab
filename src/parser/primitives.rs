use super::parser::{Parse, ParseResult, Parsed, Parser, sealed::Sealed};
use crate::token::Token;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;

/// Matches one token with the given tag, and yields its text.
pub struct Tag<K> {
    tag: K,
}

impl<K> Sealed for Tag<K> {}

impl<K: PartialEq + Debug> Parse<K> for Tag<K> {
    type Output = Rc<str>;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<Rc<str>> {
        let token = tokens.get(pos).filter(|token| token.is(&self.tag))?;
        Some(Parsed::new(Rc::clone(&token.text), pos + 1))
    }

    fn name(&self) -> String {
        format!("Tag({:?})", self.tag)
    }
}

/// Matches one token with the given text *and* the given tag. Requiring both
/// keeps, say, a keyword apart from an identically spelled token of another
/// class.
pub struct Reserved<K> {
    value: Rc<str>,
    tag: K,
}

impl<K> Sealed for Reserved<K> {}

impl<K: PartialEq + Debug> Parse<K> for Reserved<K> {
    type Output = Rc<str>;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<Rc<str>> {
        match tokens.get(pos) {
            Some(token) if token.is_exactly(&self.value, &self.tag) => {
                Some(Parsed::new(Rc::clone(&self.value), pos + 1))
            }
            _ => None,
        }
    }

    fn name(&self) -> String {
        format!("Reserved({:?}, {:?})", self.value, self.tag)
    }
}

/// Always succeeds with a copy of its value, consuming nothing.
pub struct Ret<T> {
    value: T,
}

impl<T> Sealed for Ret<T> {}

impl<K, T: Clone> Parse<K> for Ret<T> {
    type Output = T;

    fn parse(&self, _tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        Some(Parsed::new(self.value.clone(), pos))
    }

    fn name(&self) -> String {
        "Ret".to_string()
    }
}

/// Always fails.
pub struct Fail<T> {
    output: PhantomData<T>,
}

impl<T> Sealed for Fail<T> {}

impl<K, T> Parse<K> for Fail<T> {
    type Output = T;

    fn parse(&self, _tokens: &[Token<K>], _pos: usize) -> ParseResult<T> {
        None
    }

    fn name(&self) -> String {
        "Fail".to_string()
    }
}

impl<'a, K: PartialEq + Debug + 'a> Parser<'a, K, Rc<str>> {
    pub fn tag(tag: K) -> Self {
        Parser::new(Tag { tag })
    }

    pub fn reserved(value: impl Into<Rc<str>>, tag: K) -> Self {
        Parser::new(Reserved {
            value: value.into(),
            tag,
        })
    }
}

impl<'a, K: 'a, T: 'a> Parser<'a, K, T> {
    pub fn ret(value: T) -> Self
    where
        T: Clone,
    {
        Parser::new(Ret { value })
    }

    pub fn fail() -> Self {
        Parser::new(Fail {
            output: PhantomData,
        })
    }
}

pub fn tag<'a, K: PartialEq + Debug + 'a>(tag: K) -> Parser<'a, K, Rc<str>> {
    Parser::tag(tag)
}

pub fn reserved<'a, K: PartialEq + Debug + 'a>(
    value: impl Into<Rc<str>>,
    tag: K,
) -> Parser<'a, K, Rc<str>> {
    Parser::reserved(value, tag)
}
