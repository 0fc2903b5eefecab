use std::fmt;
use std::rc::Rc;

/// A lexeme cut out of the source text, together with the lexical class (the
/// tag) of the rule that produced it.
///
/// The tag type is chosen by the caller. It is usually a small enum such as
/// `enum Tag { Num, Id, Reserved }`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token<K> {
    pub text: Rc<str>,
    pub tag: K,
}

impl<K> Token<K> {
    pub fn new(text: impl Into<Rc<str>>, tag: K) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<K: PartialEq> Token<K> {
    /// Whether this token has the given tag.
    pub fn is(&self, tag: &K) -> bool {
        &self.tag == tag
    }

    /// Whether this token has the given text and the given tag.
    pub fn is_exactly(&self, text: &str, tag: &K) -> bool {
        self.is(tag) && &*self.text == text
    }
}

impl<K: fmt::Debug> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.text, self.tag)
    }
}

impl<K, S: Into<Rc<str>>> From<(S, K)> for Token<K> {
    fn from((text, tag): (S, K)) -> Self {
        Token::new(text, tag)
    }
}

impl<K: PartialEq> PartialEq<(&str, K)> for Token<K> {
    fn eq(&self, (text, tag): &(&str, K)) -> bool {
        self.is_exactly(text, tag)
    }
}
