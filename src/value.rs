use std::{fmt, rc::Rc};

use crate::{diagnostics::Result, environment::ScopeChain};

/// Host callback behind every native procedure.
///
/// Arguments are the procedure object itself, the caller's scope chain and
/// the whole unevaluated call list, head included.
pub type NativeCallback = dyn Fn(&Object, &ScopeChain, &Object) -> Result<Object>;

/// Every datum the engine manipulates.
///
/// `Clone` copies pair structure deeply while closures and native
/// procedures keep sharing their captured scope chains.
#[derive(Default)]
pub enum Object {
    #[default]
    Nil,
    Pair(Box<Pair>),
    Symbol(String),
    Number(f64),
    Boolean(bool),
    String(String),
    Closure(Rc<Closure>),
    Native(Rc<NativeProcedure>),
}

pub struct Pair {
    pub head: Object,
    pub tail: Object,
}

/// User-defined procedure created by `lambda` or `define`.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Object>,
    pub scope: ScopeChain,
}

pub struct NativeProcedure {
    pub name: String,
    pub scope: ScopeChain,
    callback: Box<NativeCallback>,
}

impl NativeProcedure {
    pub fn call(&self, this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
        (self.callback)(this, caller, list)
    }
}

impl Object {
    pub fn nil() -> Self {
        Object::Nil
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Object::Symbol(name.into())
    }

    pub fn number(value: f64) -> Self {
        Object::Number(value)
    }

    pub fn boolean(value: bool) -> Self {
        Object::Boolean(value)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Object::String(text.into())
    }

    pub fn cons(head: Object, tail: Object) -> Self {
        Object::Pair(Box::new(Pair { head, tail }))
    }

    pub fn closure(params: Vec<String>, body: Vec<Object>, scope: ScopeChain) -> Self {
        Object::Closure(Rc::new(Closure {
            params,
            body,
            scope,
        }))
    }

    pub fn native<F>(name: impl Into<String>, scope: ScopeChain, callback: F) -> Self
    where
        F: Fn(&Object, &ScopeChain, &Object) -> Result<Object> + 'static,
    {
        Object::Native(Rc::new(NativeProcedure {
            name: name.into(),
            scope,
            callback: Box::new(callback),
        }))
    }

    /// Builds a proper list.
    pub fn list(items: Vec<Object>) -> Self {
        Self::list_with_tail(items, Object::Nil)
    }

    /// Builds a pair chain ending in `tail`, which makes it dotted unless
    /// `tail` is Nil.
    pub fn list_with_tail(items: Vec<Object>, tail: Object) -> Self {
        items
            .into_iter()
            .rev()
            .fold(tail, |tail, head| Object::cons(head, tail))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Object::Nil)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Object::Pair(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Object::Symbol(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Object::Number(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Object::Boolean(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Object::String(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Object::Closure(_))
    }

    pub fn is_native_function(&self) -> bool {
        matches!(self, Object::Native(_))
    }

    pub fn is_procedure(&self) -> bool {
        self.is_function() || self.is_native_function()
    }

    /// True for Nil and for pair chains whose last tail is Nil.
    pub fn is_list(&self) -> bool {
        let mut items = self.iter();
        while items.next().is_some() {}
        items.terminal().is_nil()
    }

    /// Number of pair links before the first non-pair tail.
    pub fn length(&self) -> usize {
        self.iter().count()
    }

    /// Takes a pair chain apart into its heads and terminal.
    pub fn into_parts(self) -> (Vec<Object>, Object) {
        let mut items = Vec::new();
        let mut current = self;
        while let Object::Pair(mut pair) = current {
            items.push(std::mem::take(&mut pair.head));
            current = std::mem::take(&mut pair.tail);
        }
        (items, current)
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    pub fn head(&self) -> Option<&Object> {
        match self {
            Object::Pair(pair) => Some(&pair.head),
            _ => None,
        }
    }

    pub fn tail(&self) -> Option<&Object> {
        match self {
            Object::Pair(pair) => Some(&pair.tail),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Object::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Object::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Nil => "Nil",
            Object::Pair(_) => "Pair",
            Object::Symbol(_) => "Symbol",
            Object::Number(_) => "Number",
            Object::Boolean(_) => "Boolean",
            Object::String(_) => "String",
            Object::Closure(_) => "Function",
            Object::Native(_) => "Native Function",
        }
    }
}

/// Walks the heads of a pair chain. Once exhausted, [`ListIter::terminal`]
/// yields whatever ended the chain.
#[derive(Clone)]
pub struct ListIter<'a> {
    current: &'a Object,
}

impl<'a> ListIter<'a> {
    pub fn terminal(&self) -> &'a Object {
        self.current
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Object;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Object::Pair(pair) => {
                self.current = &pair.tail;
                Some(&pair.head)
            }
            _ => None,
        }
    }
}

// Long lists are walked along their tails so cloning, dropping and
// comparing never recurse once per element.

impl Clone for Object {
    fn clone(&self) -> Self {
        match self {
            Object::Nil => Object::Nil,
            Object::Pair(_) => {
                let mut items = self.iter();
                let heads: Vec<Object> = items.by_ref().cloned().collect();
                Object::list_with_tail(heads, items.terminal().clone())
            }
            Object::Symbol(name) => Object::Symbol(name.clone()),
            Object::Number(value) => Object::Number(*value),
            Object::Boolean(value) => Object::Boolean(*value),
            Object::String(text) => Object::String(text.clone()),
            Object::Closure(closure) => Object::Closure(Rc::clone(closure)),
            Object::Native(native) => Object::Native(Rc::clone(native)),
        }
    }
}

impl Drop for Pair {
    fn drop(&mut self) {
        let mut tail = std::mem::take(&mut self.tail);
        while let Object::Pair(mut pair) = tail {
            tail = std::mem::take(&mut pair.tail);
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Pair(_), Object::Pair(_)) => {
                let mut left = self.iter();
                let mut right = other.iter();
                loop {
                    match (left.next(), right.next()) {
                        (Some(a), Some(b)) if a == b => continue,
                        (None, None) => return left.terminal() == right.terminal(),
                        _ => return false,
                    }
                }
            }
            (Object::Nil, Object::Nil) => true,
            (Object::Symbol(a), Object::Symbol(b)) => a == b,
            (Object::Number(a), Object::Number(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Closure(a), Object::Closure(b)) => {
                Rc::ptr_eq(a, b) || (a.params == b.params && a.body == b.body)
            }
            (Object::Native(a), Object::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Nil => write!(f, "()"),
            Object::Pair(_) => {
                write!(f, "(")?;
                let mut items = self.iter();
                for (idx, item) in items.by_ref().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                let terminal = items.terminal();
                if !terminal.is_nil() {
                    write!(f, " . {terminal}")?;
                }
                write!(f, ")")
            }
            Object::Symbol(name) => write!(f, "{name}"),
            Object::Number(value) => write!(f, "{value}"),
            Object::Boolean(true) => write!(f, "#t"),
            Object::Boolean(false) => write!(f, "#f"),
            Object::String(text) => write_quoted(f, text),
            Object::Closure(closure) => {
                write!(f, "(lambda ({})", closure.params.join(" "))?;
                for expr in &closure.body {
                    write!(f, " {expr}")?;
                }
                write!(f, ")")
            }
            Object::Native(_) => write!(f, ";; Native Function"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in text.chars() {
        match ch {
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\u{8}' => write!(f, "\\b")?,
            '\u{7}' => write!(f, "\\a")?,
            '\u{c}' => write!(f, "\\f")?,
            '\0' => write!(f, "\\0")?,
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            other => write!(f, "{other}")?,
        }
    }
    write!(f, "\"")
}
