//! This module is responsible for declaring the parser type, and ways to create
//! parsers. It does not include any grammar. This is just a library for
//! creating parsers over a token stream.
//!
//! Parsers never raise errors: a failure to match is `None`, which
//! alternatives and repetitions recover from.

mod combinators;
#[allow(clippy::module_inception)]
mod parser;
mod primitives;

pub use parser::{Parse, ParseResult, Parsed, Parser};
pub use primitives::{reserved, tag};
