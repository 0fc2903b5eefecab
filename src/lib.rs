//! A small parsing toolkit: a regex-driven lexer that turns text into tagged
//! tokens, and parser combinators that turn those tokens into a syntax tree.
//!
//! ```
//! use lexcomb::prelude::*;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq)]
//! enum Tag {
//!     Num,
//!     Op,
//! }
//!
//! # fn main() -> Result<(), lexcomb::lex::Error> {
//! let rules = [
//!     Rule::skip(r"\s+"),
//!     Rule::new(r"\d+", Tag::Num),
//!     Rule::new(r"\+", Tag::Op),
//! ];
//! let tokens = tokenize("1 + 2", rules)?;
//! let number = tag(Tag::Num).map(|text| text.parse::<i64>().unwrap());
//! let plus = reserved("+", Tag::Op).map(|_| |l: i64, r: i64| l + r);
//! assert_eq!(number.separated_by(plus).parse_all(&tokens), Some(3));
//! # Ok(())
//! # }
//! ```

/// Turning source text into tokens.
pub mod lex;
/// Building parsers over tokens.
pub mod parser;
pub mod position;
pub mod token;

// Re-export
pub mod prelude {
    use super::*;
    pub use super::one_of;
    pub use lex::{Lexer, Rule, tokenize};
    pub use parser::{ParseResult, Parsed, Parser, reserved, tag};
    pub use position::Position;
    pub use token::Token;
}
