use std::collections::VecDeque;

use crate::{
    lexer::{Token, tokenize},
    value::Object,
};

/// Parses every top-level expression in `source`.
pub fn parse(source: &str) -> Vec<Object> {
    Parser::new(tokenize(source)).parse_all()
}

/// Recursive-descent reader over a token queue.
///
/// Input that ends early is closed implicitly, so parsing never fails.
pub struct Parser {
    tokens: VecDeque<Token>,
}

impl Parser {
    pub fn new(tokens: VecDeque<Token>) -> Self {
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn parse_all(&mut self) -> Vec<Object> {
        let mut exprs = Vec::new();
        while let Some(expr) = self.parse_core() {
            exprs.push(expr);
        }
        exprs
    }

    /// Reads one expression, or `None` once the queue is drained.
    pub fn parse_core(&mut self) -> Option<Object> {
        let token = self.tokens.pop_front()?;
        Some(match token {
            Token::Open => self.list(),
            Token::Close => Object::Nil,
            Token::Quote => {
                let quoted = self.parse_core().unwrap_or_default();
                Object::list(vec![Object::symbol("quote"), quoted])
            }
            Token::Str(text) => Object::String(text),
            Token::Atom(text) => atom(text),
        })
    }

    fn list(&mut self) -> Object {
        let mut items = Vec::new();
        let mut tail = Object::Nil;
        loop {
            match self.tokens.front() {
                None => break,
                Some(Token::Close) => {
                    self.tokens.pop_front();
                    break;
                }
                Some(Token::Atom(dot)) if dot == "." => {
                    self.tokens.pop_front();
                    tail = self.parse_core().unwrap_or_default();
                    self.skip_to_close();
                    break;
                }
                Some(_) => {
                    if let Some(item) = self.parse_core() {
                        items.push(item);
                    }
                }
            }
        }
        Object::list_with_tail(items, tail)
    }

    // Expressions after a dotted tail have nowhere to go.
    fn skip_to_close(&mut self) {
        while let Some(token) = self.tokens.front() {
            if *token == Token::Close {
                self.tokens.pop_front();
                return;
            }
            self.parse_core();
        }
    }
}

fn atom(text: String) -> Object {
    match text.as_str() {
        "#t" | "#T" => return Object::Boolean(true),
        "#f" | "#F" => return Object::Boolean(false),
        "." => return Object::Nil,
        _ => {}
    }
    match number(&text) {
        Some(value) => Object::Number(value),
        None => Object::Symbol(text),
    }
}

/// Only tokens starting with a digit, after an optional sign, are numbers;
/// `inf`, `nan` and `+` stay symbols.
fn number(text: &str) -> Option<f64> {
    let digits = match text.strip_prefix(['+', '-']) {
        Some(rest) if !rest.is_empty() => rest,
        _ => text,
    };
    if !digits.starts_with(|ch: char| ch.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
