use std::fmt;

use thiserror::Error;

use crate::value::Object;

/// What an argument check wanted to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Pair,
    Nil,
    Symbol,
    Number,
    Boolean,
    String,
    List,
    Procedure,
    Function,
    NativeFunction,
    /// Compound expectations such as "List or String".
    Other(&'static str),
}

impl Expected {
    pub fn label(self) -> &'static str {
        match self {
            Expected::Pair => "Pair",
            Expected::Nil => "Nil",
            Expected::Symbol => "Symbol",
            Expected::Number => "Number",
            Expected::Boolean => "Boolean",
            Expected::String => "String",
            Expected::List => "List",
            Expected::Procedure => "Procedure",
            Expected::Function => "Function",
            Expected::NativeFunction => "Native Function",
            Expected::Other(label) => label,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Expected::Pair => "@not-pair",
            Expected::Nil => "@not-nil",
            Expected::Symbol => "@not-symbol",
            Expected::Number => "@not-number",
            Expected::Boolean => "@not-boolean",
            Expected::String => "@not-string",
            Expected::List => "@not-list",
            Expected::Procedure => "@not-procedure",
            Expected::Function => "@not-function",
            Expected::NativeFunction => "@not-native-function",
            Expected::Other(_) => "@type-error",
        }
    }
}

/// A raised Lisp object.
///
/// Anything can be thrown; errors produced by the engine itself are always
/// `(tag "message")` lists.
#[derive(Clone, Error)]
#[error("{}", describe(.0))]
pub struct Exception(pub Object);

impl Exception {
    pub fn new(tag: &str, message: impl Into<String>) -> Self {
        Self(Object::list(vec![
            Object::symbol(tag),
            Object::string(message),
        ]))
    }

    pub fn object(&self) -> &Object {
        &self.0
    }

    pub fn into_object(self) -> Object {
        self.0
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.head().and_then(Object::as_symbol)
    }

    pub fn message(&self) -> Option<&str> {
        self.0
            .tail()
            .and_then(Object::head)
            .and_then(Object::as_str)
    }

    pub fn insufficient_arguments(func: &str, required: usize, and_more: bool, given: usize) -> Self {
        let more = if and_more { " and more." } else { "." };
        Self::new(
            "@insufficient-arguments",
            format!(
                "({func}) needs {required} {}{more} Given {given} {}.",
                plural(required),
                plural(given)
            ),
        )
    }

    /// `path` lists the argument position first, then element positions
    /// inside it, all counted from 1.
    pub fn wrong_type(func: &str, expected: Expected, path: &[usize], evaluated: bool) -> Self {
        let position = path
            .iter()
            .enumerate()
            .rev()
            .map(|(depth, index)| {
                let noun = if depth == 0 { "argument" } else { "element" };
                format!("{} {noun}", ordinal(*index))
            })
            .collect::<Vec<_>>()
            .join(" of the ");
        let verdict = if evaluated { "didn't return" } else { "is not" };
        Self::new(
            expected.tag(),
            format!(
                "The {position} of ({func}) {verdict} {}.",
                expected.label()
            ),
        )
    }

    pub fn unbound(name: &str) -> Self {
        Self::new("@unbound", format!("'{name}' is not bound."))
    }

    pub fn not_procedure(name: &str, found: &Object) -> Self {
        Self::new(
            "@not-procedure",
            format!(
                "'{name}' is not bound with Procedure. This is {}.",
                found.type_name()
            ),
        )
    }

    pub fn out_of_range(func: &str) -> Self {
        Self::new(
            "@out-of-range",
            format!("The index number of ({func}) is out of range."),
        )
    }

    pub fn not_open_stream(message: impl Into<String>) -> Self {
        Self::new("@not-open-stream", message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("@runtime-error", message)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exception({})", self.0)
    }
}

fn describe(object: &Object) -> String {
    let mut items = object.iter();
    match (items.next(), items.next(), items.next()) {
        (Some(Object::Symbol(tag)), Some(Object::String(message)), None)
            if items.terminal().is_nil() =>
        {
            format!("{tag}: {message}")
        }
        _ => object.to_string(),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "argument" } else { "arguments" }
}

fn ordinal(index: usize) -> String {
    let suffix = match (index % 10, index % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{index}{suffix}")
}

/// Errors surfaced to the host program.
#[derive(Debug, Error)]
pub enum SayulispError {
    #[error("{0}")]
    Exception(#[from] Exception),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

pub type Result<T, E = Exception> = std::result::Result<T, E>;
