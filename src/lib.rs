//! Sayulisp: an embeddable Lisp engine.
//!
//! Provides the object model, reader, scope chains, evaluator and the
//! native procedure library, plus a REPL front-end.

pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{Exception, Expected, SayulispError};
pub use environment::ScopeChain;
pub use parser::parse;
pub use repl::Repl;
pub use runtime::Interpreter;
pub use value::Object;
