use std::{collections::VecDeque, iter::Peekable, str::Chars};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    Quote,
    /// Decoded contents of a string literal.
    Str(String),
    /// Any other run of characters: symbols, numbers, `.`, `#t`.
    Atom(String),
}

pub fn tokenize(source: &str) -> VecDeque<Token> {
    Lexer::new(source).tokenize()
}

/// Splits source text into tokens. Never fails: an unterminated string
/// runs to the end of input.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
        }
    }

    pub fn tokenize(mut self) -> VecDeque<Token> {
        let mut tokens = VecDeque::new();
        while let Some(ch) = self.chars.next() {
            match ch {
                c if is_blank(c) => {}
                '(' | '[' | '{' => tokens.push_back(Token::Open),
                ')' | ']' | '}' => tokens.push_back(Token::Close),
                '\'' => tokens.push_back(Token::Quote),
                ';' => self.skip_comment(),
                '"' => tokens.push_back(self.string()),
                other => tokens.push_back(self.atom(other)),
            }
        }
        tokens
    }

    fn skip_comment(&mut self) {
        for ch in self.chars.by_ref() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn string(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.chars.next() {
            match ch {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        text.push(unescape(escaped));
                    }
                }
                other => text.push(other),
            }
        }
        Token::Str(text)
    }

    fn atom(&mut self, first: char) -> Token {
        let mut text = String::from(first);
        while let Some(&ch) = self.chars.peek() {
            if is_delimiter(ch) {
                break;
            }
            text.push(ch);
            self.chars.next();
        }
        Token::Atom(text)
    }
}

/// Tracks parenthesis depth across chunks of input, ignoring anything
/// inside comments and string literals.
#[derive(Debug, Default, Clone)]
pub struct ParenBalance {
    depth: i64,
    state: ScanState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    #[default]
    Code,
    Comment,
    Str,
    Escape,
}

impl ParenBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns the running depth: zero when balanced,
    /// positive while input is missing, negative when malformed.
    pub fn feed(&mut self, chunk: &str) -> i64 {
        for ch in chunk.chars() {
            self.state = match (self.state, ch) {
                (ScanState::Code, '(' | '[' | '{') => {
                    self.depth += 1;
                    ScanState::Code
                }
                (ScanState::Code, ')' | ']' | '}') => {
                    self.depth -= 1;
                    ScanState::Code
                }
                (ScanState::Code, ';') => ScanState::Comment,
                (ScanState::Code, '"') => ScanState::Str,
                (ScanState::Comment, '\n') => ScanState::Code,
                (ScanState::Str, '\\') => ScanState::Escape,
                (ScanState::Str, '"') => ScanState::Code,
                (ScanState::Escape, _) => ScanState::Str,
                (state, _) => state,
            };
        }
        self.depth
    }

    pub fn depth(&self) -> i64 {
        self.depth
    }

    pub fn in_string(&self) -> bool {
        matches!(self.state, ScanState::Str | ScanState::Escape)
    }

    /// Balanced and outside any string literal.
    pub fn is_complete(&self) -> bool {
        self.depth == 0 && !self.in_string()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn is_blank(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\n' | '\r' | '\t' | '\u{7}' | '\u{8}' | '\u{c}' | '\0'
    )
}

fn is_delimiter(ch: char) -> bool {
    is_blank(ch) || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\'' | ';')
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'b' => '\u{8}',
        'a' => '\u{7}',
        'f' => '\u{c}',
        '0' => '\0',
        other => other,
    }
}
