// std imports
use std::collections::VecDeque;
use std::io::{Read, Write, stdin, stdout};
use std::process::exit;
use std::rc::Rc;
// library imports
use indoc::indoc;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
// our imports
use lexcomb::prelude::*;

const USAGE: &str = indoc! {r"
    USAGE:
        lexcomb [--tokens] <expression>
        lexcomb [--tokens] -
        lexcomb [--tokens] repl

    Calling `lexcomb <expression>` evaluates an integer expression such as
    `2 * (3 + 4) - 1`. Calling `lexcomb -` reads the expression from stdin
    instead. Calling `lexcomb repl` starts a Read-Eval-Print loop.

    With `--tokens`, the token stream is printed instead of being evaluated.
    Set `RUST_LOG` (for example `RUST_LOG=lexcomb=trace`) to see what the
    lexer and the parsers are doing.

    Parentheses and negations may nest at most 100 levels deep.
"};

/// Parsing recurses once per level of nesting, so deeper input is refused
/// before it can exhaust the stack.
const MAX_DEPTH: usize = 100;

#[derive(Debug, Error)]
enum Error {
    #[error("{0}")]
    Lex(#[from] lexcomb::lex::Error),
    #[error("could not understand this expression")]
    Syntax,
    #[error("the number {0} is too large")]
    NumberTooLarge(Rc<str>),
    #[error("division by zero")]
    DivisionByZero,
    #[error("the result overflows")]
    Overflow,
    #[error("expressions may nest at most {0} levels deep")]
    TooDeep(usize),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq)]
struct MainConfig {
    command: Command,
    help_flag: bool,
    tokens_flag: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Stdin,
    Expression(String),
    Repl,
    Error(Vec<String>),
}

impl MainConfig {
    pub fn new(mut args: VecDeque<String>) -> Self {
        // The executable name
        args.pop_front();
        let mut help_flag = false;
        let mut tokens_flag = false;
        args.retain(|arg| match arg.as_str() {
            "--help" | "-h" => {
                help_flag = true;
                false
            }
            "--tokens" => {
                tokens_flag = true;
                false
            }
            _ => true,
        });
        let command = match &args.iter().map(|x| x.as_str()).collect::<Vec<_>>()[..] {
            ["-"] => Command::Stdin,
            ["repl"] => Command::Repl,
            [] => Command::Error(vec![]),
            words => Command::Expression(words.join(" ")),
        };
        Self {
            command,
            help_flag,
            tokens_flag,
        }
    }
}

// The calculator

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Op,
    Num,
}

fn rules() -> Vec<Rule<Tag>> {
    vec![
        Rule::skip(r"\s+"),
        Rule::skip(r"//[^\n]*"),
        Rule::new(r"[-+*/%()]", Tag::Op),
        Rule::new(r"[0-9]+", Tag::Num),
    ]
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Num(Rc<str>),
    Neg(Box<Expr>),
    Bin(char, Box<Expr>, Box<Expr>),
}

fn op<'a>(symbol: &str) -> Parser<'a, Tag, Rc<str>> {
    reserved(symbol, Tag::Op)
}

fn binary<'a>(symbols: &[&str]) -> Parser<'a, Tag, impl Fn(Expr, Expr) -> Expr + use<'a>> {
    symbols
        .iter()
        .map(|symbol| op(symbol))
        .reduce(Parser::or_else)
        .unwrap_or_else(Parser::fail)
        .map(|symbol: Rc<str>| {
            let symbol = symbol.chars().next().unwrap_or_default();
            move |l: Expr, r: Expr| Expr::Bin(symbol, Box::new(l), Box::new(r))
        })
}

fn atom<'a>() -> Parser<'a, Tag, Expr> {
    let number = tag(Tag::Num).map(Expr::Num);
    let group = op("(")
        .then_right(Parser::lazy(expr))
        .then_left(op(")"));
    let negation = op("-")
        .then_right(Parser::lazy(atom))
        .map(|e| Expr::Neg(Box::new(e)));
    one_of![number, group, negation]
}

fn expr<'a>() -> Parser<'a, Tag, Expr> {
    atom()
        .separated_by(binary(&["*", "/", "%"]))
        .separated_by(binary(&["+", "-"]))
}

fn eval(e: &Expr) -> Result<i64> {
    Ok(match e {
        Expr::Num(text) => text
            .parse::<i64>()
            .map_err(|_| Error::NumberTooLarge(Rc::clone(text)))?,
        Expr::Neg(e) => eval(e)?.checked_neg().ok_or(Error::Overflow)?,
        Expr::Bin(op, l, r) => {
            let (l, r) = (eval(l)?, eval(r)?);
            let result = match op {
                '+' => l.checked_add(r),
                '-' => l.checked_sub(r),
                '*' => l.checked_mul(r),
                '/' | '%' if r == 0 => return Err(Error::DivisionByZero),
                '/' => l.checked_div(r),
                '%' => l.checked_rem(r),
                _ => unreachable!("the lexer only produces known operators"),
            };
            result.ok_or(Error::Overflow)?
        }
    })
}

/// How deeply groups and negations nest in `tokens`.
fn nesting_depth(tokens: &[Token<Tag>]) -> usize {
    // Negations still waiting for their operand, one entry per open group.
    let mut pending = vec![0usize];
    let mut depth = 0;
    let mut deepest = 0;
    let mut prev: Option<&Token<Tag>> = None;
    for token in tokens {
        let unary = prev.is_none_or(|p| p.is(&Tag::Op) && p.text() != ")");
        match token.text() {
            "(" => {
                pending.push(0);
                depth += 1;
            }
            "-" if unary => {
                if let Some(run) = pending.last_mut() {
                    *run += 1;
                }
                depth += 1;
            }
            ")" if pending.len() > 1 => {
                let inner = pending.pop().unwrap_or_default();
                depth -= 1 + inner;
                depth -= pending.last_mut().map(std::mem::take).unwrap_or_default();
            }
            _ if token.is(&Tag::Num) => {
                depth -= pending.last_mut().map(std::mem::take).unwrap_or_default();
            }
            _ => {}
        }
        deepest = deepest.max(depth);
        prev = Some(token);
    }
    deepest
}

fn calculate(lexer: &Lexer<Tag>, text: &str) -> Result<i64> {
    let tokens = lexer.tokenize(text)?;
    if nesting_depth(&tokens) > MAX_DEPTH {
        return Err(Error::TooDeep(MAX_DEPTH));
    }
    let ast = expr().parse_all(&tokens).ok_or(Error::Syntax)?;
    debug!(?ast, "parsed");
    eval(&ast)
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn show_tokens(lexer: &Lexer<Tag>, text: &str) -> Result<String> {
    let tokens = lexer.tokenize(text)?;
    Ok(tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" "))
}

fn run_text(config: &MainConfig, lexer: &Lexer<Tag>, text: &str) -> Result<String> {
    if config.tokens_flag {
        show_tokens(lexer, text)
    } else {
        calculate(lexer, text).map(|n| n.to_string())
    }
}

fn log_error<T, E: std::fmt::Display>(res: Result<T, E>) -> Option<T> {
    match res {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Error: {err}");
            None
        }
    }
}

fn handle_error<T, E: std::fmt::Display>(res: Result<T, E>) -> T {
    match res {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Error: {err}");
            exit(1);
        }
    }
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexcomb=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let config = MainConfig::new(std::env::args().collect());

    if config.help_flag {
        println!("{USAGE}");
        exit(0);
    }

    let lexer = handle_error(Lexer::new(rules()));

    match &config.command {
        Command::Stdin => {
            let text = handle_error(read_stdin());
            println!("{}", handle_error(run_text(&config, &lexer, &text)));
        }
        Command::Expression(text) => {
            println!("{}", handle_error(run_text(&config, &lexer, text)));
        }
        Command::Repl => {
            let mut line = String::new();
            loop {
                print!(">   ");
                handle_error(stdout().flush());
                line.clear();
                if handle_error(stdin().read_line(&mut line)) == 0 || line.trim() == "q" {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(out) = log_error(run_text(&config, &lexer, &line)) {
                    println!("{out}");
                }
            }
        }
        Command::Error(items) => {
            let items = items.join("\n");
            eprintln!("Error: could not understand the command");
            eprintln!("Alien arguments: {items}");
            eprintln!("{USAGE}");
            exit(1);
        }
    }
}
