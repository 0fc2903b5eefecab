use super::parser::{Parse, ParseResult, Parsed, Parser, sealed::Sealed};
use crate::token::Token;
use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

/// `left` then `right`, yielding both values as a pair. If `right` fails the
/// whole sequence fails; `left` is not retried.
pub struct Concat<'a, K, A, B> {
    pub(super) left: Parser<'a, K, A>,
    pub(super) right: Parser<'a, K, B>,
}

impl<K, A, B> Sealed for Concat<'_, K, A, B> {}

impl<K, A, B> Parse<K> for Concat<'_, K, A, B> {
    type Output = (A, B);

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<(A, B)> {
        let Parsed { value: a, pos } = self.left.parse(tokens, pos)?;
        let Parsed { value: b, pos } = self.right.parse(tokens, pos)?;
        Some(Parsed::new((a, b), pos))
    }

    fn name(&self) -> String {
        format!("Concat({}, {})", self.left.name(), self.right.name())
    }
}

/// Ordered choice. The first alternative to succeed wins, even if the other
/// would have consumed more.
pub struct Alternate<'a, K, T> {
    pub(super) left: Parser<'a, K, T>,
    pub(super) right: Parser<'a, K, T>,
}

impl<K, T> Sealed for Alternate<'_, K, T> {}

impl<K, T> Parse<K> for Alternate<'_, K, T> {
    type Output = T;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        // Notice that both sides start from the same position.
        self.left
            .parse(tokens, pos)
            .or_else(|| self.right.parse(tokens, pos))
    }

    fn name(&self) -> String {
        format!("Alternate({} | {})", self.left.name(), self.right.name())
    }
}

pub struct Opt<'a, K, T> {
    pub(super) parser: Parser<'a, K, T>,
}

impl<K, T> Sealed for Opt<'_, K, T> {}

impl<K, T> Parse<K> for Opt<'_, K, T> {
    type Output = Option<T>;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<Option<T>> {
        Some(match self.parser.parse(tokens, pos) {
            Some(parsed) => parsed.map(Some),
            None => Parsed::new(None, pos),
        })
    }

    fn name(&self) -> String {
        format!("Opt({})", self.parser.name())
    }
}

/// Zero or more. Stops at the first failure, or at the first success that
/// did not consume anything (which would otherwise repeat forever).
pub struct Rep<'a, K, T> {
    pub(super) parser: Parser<'a, K, T>,
}

impl<K, T> Sealed for Rep<'_, K, T> {}

impl<K, T> Parse<K> for Rep<'_, K, T> {
    type Output = Vec<T>;

    fn parse(&self, tokens: &[Token<K>], mut pos: usize) -> ParseResult<Vec<T>> {
        let mut values = vec![];
        while let Some(Parsed { value, pos: next }) = self.parser.parse(tokens, pos) {
            if next == pos {
                debug!(pos, "repetition consumed nothing, stopping");
                break;
            }
            values.push(value);
            pos = next;
        }
        Some(Parsed::new(values, pos))
    }

    fn name(&self) -> String {
        format!("Rep({})", self.parser.name())
    }
}

/// `parser (separator parser)*`, folded from the left with the functions the
/// separators parse to. This is how left-associative operators are parsed
/// without left recursion.
pub struct Exp<'a, K, T, F> {
    pub(super) parser: Parser<'a, K, T>,
    pub(super) separator: Parser<'a, K, F>,
}

impl<K, T, F> Sealed for Exp<'_, K, T, F> {}

impl<K, T, F> Parse<K> for Exp<'_, K, T, F>
where
    F: Fn(T, T) -> T,
{
    type Output = T;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        let Parsed { mut value, mut pos } = self.parser.parse(tokens, pos)?;
        // A separator without an operand after it is not part of the list.
        while let Some(Parsed {
            value: combine,
            pos: after_separator,
        }) = self.separator.parse(tokens, pos)
        {
            let Some(Parsed { value: right, pos: next }) =
                self.parser.parse(tokens, after_separator)
            else {
                break;
            };
            if next == pos {
                debug!(pos, "separated list consumed nothing, stopping");
                break;
            }
            value = combine(value, right);
            pos = next;
        }
        Some(Parsed::new(value, pos))
    }

    fn name(&self) -> String {
        format!("Exp({}, {})", self.parser.name(), self.separator.name())
    }
}

/// Runs a function over the value of a successful parse.
pub struct Process<'a, K, T, F> {
    pub(super) parser: Parser<'a, K, T>,
    pub(super) f: F,
}

impl<K, T, F> Sealed for Process<'_, K, T, F> {}

impl<K, T, U, F> Parse<K> for Process<'_, K, T, F>
where
    F: Fn(T) -> U,
{
    type Output = U;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<U> {
        self.parser
            .parse(tokens, pos)
            .map(|parsed| parsed.map(&self.f))
    }

    fn name(&self) -> String {
        format!("Process({})", self.parser.name())
    }
}

/// A parser that is built on first use, then kept.
pub struct Lazy<'a, K, T> {
    build: Box<dyn Fn() -> Parser<'a, K, T> + 'a>,
    parser: OnceCell<Parser<'a, K, T>>,
}

impl<'a, K, T> Lazy<'a, K, T> {
    pub(super) fn new(build: impl Fn() -> Parser<'a, K, T> + 'a) -> Self {
        Lazy {
            build: Box::new(build),
            parser: OnceCell::new(),
        }
    }

    fn get(&self) -> &Parser<'a, K, T> {
        self.parser.get_or_init(|| {
            trace!("building lazy parser");
            (self.build)()
        })
    }
}

impl<K, T> Sealed for Lazy<'_, K, T> {}

impl<K, T> Parse<K> for Lazy<'_, K, T> {
    type Output = T;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        self.get().parse(tokens, pos)
    }

    fn name(&self) -> String {
        // Looking inside could recurse without end.
        "Lazy".to_string()
    }
}

/// Succeeds only if `parser` stops exactly at the end of the token stream.
pub struct Phrase<'a, K, T> {
    pub(super) parser: Parser<'a, K, T>,
}

impl<K, T> Sealed for Phrase<'_, K, T> {}

impl<K, T> Parse<K> for Phrase<'_, K, T> {
    type Output = T;

    fn parse(&self, tokens: &[Token<K>], pos: usize) -> ParseResult<T> {
        self.parser
            .parse(tokens, pos)
            .filter(|parsed| parsed.pos == tokens.len())
    }

    fn name(&self) -> String {
        format!("Phrase({})", self.parser.name())
    }
}

#[cfg(test)]
mod tests {
    use crate::one_of;
    use crate::parser::{Parsed, Parser, reserved, tag};
    use crate::token::Token;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Kind {
        Num,
        Op,
        Id,
    }

    fn toks(source: &[(&str, Kind)]) -> Vec<Token<Kind>> {
        source.iter().map(|&(text, kind)| Token::new(text, kind)).collect()
    }

    fn number<'a>() -> Parser<'a, Kind, i64> {
        tag(Kind::Num).map(|text| text.parse::<i64>().unwrap())
    }

    fn arith(op: Rc<str>) -> fn(i64, i64) -> i64 {
        match &*op {
            "+" => |l: i64, r: i64| l + r,
            "-" => |l: i64, r: i64| l - r,
            "*" => |l: i64, r: i64| l * r,
            _ => unreachable!("not an operator: {op}"),
        }
    }

    fn op<'a>(symbol: &str) -> Parser<'a, Kind, fn(i64, i64) -> i64> {
        reserved(symbol, Kind::Op).map(arith)
    }

    #[test]
    fn concat_pairs_values() {
        let tokens = toks(&[("x", Kind::Id), ("1", Kind::Num)]);
        let p = tag(Kind::Id).then(number());
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(("x".into(), 1), 2)));
    }

    #[test]
    fn concat_fails_if_either_side_fails() {
        let tokens = toks(&[("x", Kind::Id), ("y", Kind::Id)]);
        assert_eq!(tag(Kind::Id).then(number()).parse(&tokens, 0), None);
        assert_eq!(number().then(tag(Kind::Id)).parse(&tokens, 0), None);
        assert_eq!(tag(Kind::Id).then(tag(Kind::Id)).parse(&tokens, 1), None);
    }

    #[test]
    fn concat_does_not_backtrack_into_left() {
        // The left side takes "1" through its first alternative, after which
        // the right side fails. The second alternative is never revisited.
        let tokens = toks(&[("1", Kind::Num), ("2", Kind::Num)]);
        let left = one_of![
            number().map(|n| vec![n]),
            number().then(number()).map(|(a, b)| vec![a, b]),
        ];
        let p = left.then(number());
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new((vec![1], 2), 2)));
        let tokens = toks(&[("1", Kind::Num), ("2", Kind::Num), ("+", Kind::Op)]);
        let left = one_of![
            number().map(|n| vec![n]),
            number().then(number()).map(|(a, b)| vec![a, b]),
        ];
        assert_eq!(left.then(op("+")).parse(&tokens, 0), None);
    }

    #[test]
    fn alternate_prefers_left() {
        let tokens = toks(&[("1", Kind::Num)]);
        let p = Parser::<Kind, _>::ret("left").or_else(Parser::ret("right"));
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new("left", 0)));
        // Even when the right side would consume more.
        let p = Parser::ret(0).or_else(number());
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(0, 0)));
    }

    #[test]
    fn alternate_falls_back_from_the_same_position() {
        let tokens = toks(&[("a", Kind::Id), ("1", Kind::Num)]);
        let p = number().or_else(tag(Kind::Id).map(|_| -1));
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(-1, 1)));
        assert_eq!(p.parse(&tokens, 1), Some(Parsed::new(1, 2)));
        assert_eq!(p.parse(&tokens, 2), None);
    }

    #[test]
    fn one_of_tries_in_order() {
        let tokens = toks(&[("+", Kind::Op)]);
        let p = one_of![
            reserved("-", Kind::Op).map(|_| 1),
            reserved("+", Kind::Op).map(|_| 2),
            tag(Kind::Op).map(|_| 3),
        ];
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(2, 1)));
    }

    #[test]
    fn opt_never_fails() {
        let tokens = toks(&[("1", Kind::Num)]);
        assert_eq!(
            number().opt().parse(&tokens, 0),
            Some(Parsed::new(Some(1), 1))
        );
        assert_eq!(number().opt().parse(&tokens, 1), Some(Parsed::new(None, 1)));
        assert_eq!(
            tag(Kind::Id).opt().parse(&tokens, 0),
            Some(Parsed::new(None, 0))
        );
    }

    #[test]
    fn rep_collects_until_failure() {
        let tokens = toks(&[("1", Kind::Num), ("2", Kind::Num), ("x", Kind::Id)]);
        assert_eq!(
            number().rep().parse(&tokens, 0),
            Some(Parsed::new(vec![1, 2], 2))
        );
        assert_eq!(
            number().rep().parse(&tokens, 1),
            Some(Parsed::new(vec![2], 2))
        );
    }

    #[test]
    fn rep_zero_matches() {
        let tokens = toks(&[("x", Kind::Id)]);
        assert_eq!(number().rep().parse(&tokens, 0), Some(Parsed::new(vec![], 0)));
        assert_eq!(number().rep().parse(&[], 0), Some(Parsed::new(vec![], 0)));
    }

    #[test]
    fn rep_stops_on_empty_success() {
        let tokens = toks(&[("1", Kind::Num), ("x", Kind::Id)]);
        assert_eq!(
            Parser::<Kind, _>::ret(5).rep().parse(&tokens, 0),
            Some(Parsed::new(vec![], 0))
        );
        assert_eq!(
            number().opt().rep().parse(&tokens, 0),
            Some(Parsed::new(vec![Some(1)], 1))
        );
    }

    #[test]
    fn exp_folds_from_the_left() {
        let tokens = toks(&[
            ("10", Kind::Num),
            ("-", Kind::Op),
            ("3", Kind::Num),
            ("-", Kind::Op),
            ("2", Kind::Num),
        ]);
        let p = number().separated_by(op("-"));
        // (10 - 3) - 2, not 10 - (3 - 2).
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(5, 5)));
    }

    #[test]
    fn exp_combines_in_order() {
        let tokens = toks(&[
            ("1", Kind::Num),
            ("+", Kind::Op),
            ("2", Kind::Num),
            ("+", Kind::Op),
            ("3", Kind::Num),
        ]);
        let separator = reserved("+", Kind::Op)
            .map(|_| |l: String, r: String| format!("add({l}, {r})"));
        let p = tag(Kind::Num).map(|t| t.to_string()).separated_by(separator);
        assert_eq!(
            p.parse(&tokens, 0),
            Some(Parsed::new("add(add(1, 2), 3)".to_string(), 5))
        );
        let sum = number().separated_by(op("+"));
        assert_eq!(sum.parse(&tokens, 0), Some(Parsed::new(6, 5)));
    }

    #[test]
    fn exp_single_operand_and_failure() {
        let tokens = toks(&[("4", Kind::Num), ("x", Kind::Id)]);
        let p = number().separated_by(op("+"));
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(4, 1)));
        assert_eq!(p.parse(&tokens, 1), None);
    }

    #[test]
    fn exp_leaves_dangling_separator() {
        let tokens = toks(&[
            ("1", Kind::Num),
            ("+", Kind::Op),
            ("2", Kind::Num),
            ("+", Kind::Op),
        ]);
        let p = number().separated_by(op("+"));
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(3, 3)));
        assert_eq!(p.phrase().parse(&tokens, 0), None);
    }

    #[test]
    fn exp_stops_on_empty_step() {
        let tokens = toks(&[("1", Kind::Num), ("2", Kind::Num)]);
        let operand = number().opt().map(|n| n.unwrap_or(0));
        let separator = Parser::ret(arith("+".into()));
        let p = operand.separated_by(separator);
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(3, 2)));
    }

    #[test]
    fn process_maps_value_and_keeps_position() {
        let tokens = toks(&[("21", Kind::Num)]);
        let p = number().map(|n| n * 2);
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(42, 1)));
        assert_eq!(p.parse(&tokens, 1), None);
    }

    #[test]
    fn then_left_and_right() {
        let tokens = toks(&[("(", Kind::Op), ("7", Kind::Num), (")", Kind::Op)]);
        let p = reserved("(", Kind::Op)
            .then_right(number())
            .then_left(reserved(")", Kind::Op));
        assert_eq!(p.parse(&tokens, 0), Some(Parsed::new(7, 3)));
    }

    #[test]
    fn lazy_builds_once() {
        let built = Rc::new(Cell::new(0));
        let p = {
            let built = Rc::clone(&built);
            Parser::lazy(move || {
                built.set(built.get() + 1);
                number()
            })
        };
        assert_eq!(built.get(), 0);
        let tokens = toks(&[("1", Kind::Num)]);
        let first = p.parse(&tokens, 0);
        let second = p.parse(&tokens, 0);
        assert_eq!(first, Some(Parsed::new(1, 1)));
        assert_eq!(first, second);
        assert_eq!(p.parse(&tokens, 1), None);
        assert_eq!(built.get(), 1);
    }

    /// `nested := "(" nested ")" | Num`, counting the parentheses.
    fn nested<'a>() -> Parser<'a, Kind, usize> {
        let parens = reserved("(", Kind::Op)
            .then_right(Parser::lazy(nested))
            .then_left(reserved(")", Kind::Op))
            .map(|depth| depth + 1);
        one_of![parens, number().map(|_| 0)]
    }

    #[test]
    fn lazy_allows_recursion() {
        let tokens = toks(&[
            ("(", Kind::Op),
            ("(", Kind::Op),
            ("0", Kind::Num),
            (")", Kind::Op),
            (")", Kind::Op),
        ]);
        assert_eq!(nested().parse_all(&tokens), Some(2));
        assert_eq!(nested().parse_all(&tokens[..4]), None);
    }

    #[test]
    fn phrase_requires_all_tokens() {
        let tokens = toks(&[("a", Kind::Id), ("b", Kind::Id)]);
        let a = reserved("a", Kind::Id);
        assert_eq!(a.parse(&tokens, 0), Some(Parsed::new("a".into(), 1)));
        assert_eq!(a.clone().phrase().parse(&tokens, 0), None);
        assert_eq!(a.parse_all(&tokens), None);
        let ab = a.then(reserved("b", Kind::Id));
        assert_eq!(
            ab.clone().phrase().parse(&tokens, 0),
            Some(Parsed::new(("a".into(), "b".into()), 2))
        );
        assert_eq!(ab.parse_all(&tokens), Some(("a".into(), "b".into())));
    }

    #[test]
    fn phrase_from_a_later_start() {
        let tokens = toks(&[("a", Kind::Id), ("1", Kind::Num)]);
        let p = number().phrase();
        assert_eq!(p.parse(&tokens, 1), Some(Parsed::new(1, 2)));
        assert_eq!(p.parse(&tokens, 0), None);
    }

    #[test]
    fn names_describe_structure() {
        let p = tag(Kind::Num)
            .then(reserved("+", Kind::Op))
            .rep()
            .opt()
            .phrase();
        assert_eq!(
            p.name(),
            r#"Phrase(Opt(Rep(Concat(Tag(Num), Reserved("+", Op)))))"#
        );
        assert_eq!(
            format!("{:?}", nested()),
            format!("Parser {{ name: {:?} }}", nested().name())
        );
        assert_eq!(
            nested().name(),
            concat!(
                r#"Alternate(Process(Process(Concat(Process(Concat(Reserved("(", Op), Lazy)), "#,
                r#"Reserved(")", Op)))) | Process(Process(Tag(Num))))"#,
            )
        );
    }
}
