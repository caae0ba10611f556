//! Native procedures and special forms installed into every global scope.

mod forms;
mod io;
mod lists;
mod math;
mod predicates;
mod reflect;

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    runtime::Output,
    value::{ListIter, Object},
};

/// Registers the whole library into `scope`.
pub fn install(scope: &ScopeChain, help: &HelpDict, output: &Output) {
    let registry = Registry::new(scope, help);
    forms::install(&registry);
    reflect::install(&registry);
    io::install(&registry, output);
    lists::install(&registry);
    predicates::install(&registry);
    math::install(&registry);
    debug!(entries = help.len(), "native library installed");
}

/// Markdown help entries keyed by procedure name.
#[derive(Clone, Default, Debug)]
pub struct HelpDict {
    entries: Rc<RefCell<IndexMap<String, String>>>,
}

const RULER: &str = "\n\n- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -\n\n";

impl HelpDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.borrow_mut().insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Every entry, sorted by name and separated by a ruler line.
    pub fn catalog(&self) -> String {
        let mut entries = self.entries.borrow().clone();
        entries.sort_keys();
        entries.into_values().collect::<Vec<_>>().join(RULER)
    }
}

/// Help text for one procedure, rendered as markdown.
pub struct Doc {
    pub usage: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

impl Doc {
    pub fn render(&self, names: &[&str]) -> String {
        let mut text = format!("### {} ###\n\n<h6> Usage </h6>\n\n", names.join(", "));
        for line in self.usage.lines() {
            text.push_str(&format!("* `{line}`\n"));
        }
        text.push_str("\n<h6> Description </h6>\n\n");
        for line in self.description.lines() {
            text.push_str(&format!("* {line}\n"));
        }
        if !self.example.is_empty() {
            text.push_str("\n<h6> Example </h6>\n\n");
            for line in self.example.lines() {
                text.push_str(&format!("    {line}\n"));
            }
        }
        text.trim_end().to_string()
    }
}

/// Binds natives into a scope and files their help text.
pub struct Registry<'a> {
    scope: &'a ScopeChain,
    help: &'a HelpDict,
}

impl<'a> Registry<'a> {
    pub fn new(scope: &'a ScopeChain, help: &'a HelpDict) -> Self {
        Self { scope, help }
    }

    pub fn help(&self) -> &HelpDict {
        self.help
    }

    /// Binds one native procedure under every name in `names`; aliases
    /// share the procedure and its help entry.
    pub fn function<F>(&self, names: &[&str], doc: &Doc, callback: F)
    where
        F: Fn(&Object, &ScopeChain, &Object) -> Result<Object> + 'static,
    {
        let text = doc.render(names);
        self.function_with_help(names, &text, callback);
    }

    pub fn function_with_help<F>(&self, names: &[&str], text: &str, callback: F)
    where
        F: Fn(&Object, &ScopeChain, &Object) -> Result<Object> + 'static,
    {
        let Some(primary) = names.first() else {
            return;
        };
        let procedure = Object::native(*primary, self.scope.clone(), callback);
        for name in names {
            self.scope.bind(*name, procedure.clone());
            self.help.insert(*name, text);
        }
    }

    pub fn constant(&self, name: &str, value: Object, doc: &Doc) {
        self.scope.bind(name, value);
        self.help.insert(name, doc.render(&[name]));
    }
}

/// Cursor over the operands of a native call.
///
/// Construction validates the argument count; each accessor then takes the
/// next operand and reports type errors against its position.
pub struct CallArgs<'a> {
    func: String,
    rest: ListIter<'a>,
    position: usize,
    given: usize,
    required: usize,
    and_more: bool,
}

impl<'a> CallArgs<'a> {
    pub fn new(list: &'a Object, required: usize, and_more: bool) -> Result<Self> {
        let args = Self::deferred(list, required, and_more);
        if args.given < required {
            return Err(Exception::insufficient_arguments(
                &args.func, required, and_more, args.given,
            ));
        }
        Ok(args)
    }

    /// Like [`CallArgs::new`], but a missing operand is only reported when
    /// it is taken.
    pub fn deferred(list: &'a Object, required: usize, and_more: bool) -> Self {
        let mut rest = list.iter();
        let func = rest.next().map(ToString::to_string).unwrap_or_default();
        let given = rest.clone().count();
        Self {
            func,
            rest,
            position: 0,
            given,
            required,
            and_more,
        }
    }

    pub fn func(&self) -> &str {
        &self.func
    }

    pub fn given(&self) -> usize {
        self.given
    }

    /// 1-based position of the operand taken last.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_next(&self) -> bool {
        self.position < self.given
    }

    pub fn next_raw(&mut self) -> Result<&'a Object> {
        match self.rest.next() {
            Some(operand) => {
                self.position += 1;
                Ok(operand)
            }
            None => Err(Exception::insufficient_arguments(
                &self.func,
                self.required.max(self.position + 1),
                self.and_more,
                self.given,
            )),
        }
    }

    pub fn next_eval(&mut self, caller: &ScopeChain) -> Result<Object> {
        let operand = self.next_raw()?;
        caller.evaluate(operand)
    }

    /// The operands not taken yet, unevaluated.
    pub fn rest_raw(&mut self) -> ListIter<'a> {
        let rest = self.rest.clone();
        while self.rest.next().is_some() {
            self.position += 1;
        }
        rest
    }

    pub fn rest_eval(&mut self, caller: &ScopeChain) -> Result<Vec<Object>> {
        self.rest_raw().map(|operand| caller.evaluate(operand)).collect()
    }

    pub fn number(&mut self, caller: &ScopeChain) -> Result<f64> {
        let value = self.next_eval(caller)?;
        value
            .as_number()
            .ok_or_else(|| self.wrong_type(Expected::Number))
    }

    pub fn integer(&mut self, caller: &ScopeChain) -> Result<i64> {
        self.number(caller).map(|value| value as i64)
    }

    pub fn boolean(&mut self, caller: &ScopeChain) -> Result<bool> {
        let value = self.next_eval(caller)?;
        value
            .as_boolean()
            .ok_or_else(|| self.wrong_type(Expected::Boolean))
    }

    pub fn string(&mut self, caller: &ScopeChain) -> Result<String> {
        match self.next_eval(caller)? {
            Object::String(text) => Ok(text),
            _ => Err(self.wrong_type(Expected::String)),
        }
    }

    pub fn pair(&mut self, caller: &ScopeChain) -> Result<Object> {
        let value = self.next_eval(caller)?;
        if value.is_pair() {
            Ok(value)
        } else {
            Err(self.wrong_type(Expected::Pair))
        }
    }

    pub fn list(&mut self, caller: &ScopeChain) -> Result<Object> {
        let value = self.next_eval(caller)?;
        if value.is_list() {
            Ok(value)
        } else {
            Err(self.wrong_type(Expected::List))
        }
    }

    pub fn symbol(&mut self, caller: &ScopeChain) -> Result<String> {
        match self.next_eval(caller)? {
            Object::Symbol(name) => Ok(name),
            _ => Err(self.wrong_type(Expected::Symbol)),
        }
    }

    /// Next operand as written, which must be a symbol.
    pub fn symbol_raw(&mut self) -> Result<&'a str> {
        let operand = self.next_raw()?;
        operand
            .as_symbol()
            .ok_or_else(|| self.wrong_type_raw(Expected::Symbol))
    }

    /// Next operand as written, which must be a proper list.
    pub fn list_raw(&mut self) -> Result<&'a Object> {
        let operand = self.next_raw()?;
        if operand.is_list() {
            Ok(operand)
        } else {
            Err(self.wrong_type_raw(Expected::List))
        }
    }

    pub fn wrong_type(&self, expected: Expected) -> Exception {
        Exception::wrong_type(&self.func, expected, &[self.position], true)
    }

    pub fn wrong_type_raw(&self, expected: Expected) -> Exception {
        Exception::wrong_type(&self.func, expected, &[self.position], false)
    }

    /// Type error for element `element` (1-based) of the current operand.
    pub fn wrong_element(&self, expected: Expected, element: usize, evaluated: bool) -> Exception {
        Exception::wrong_type(&self.func, expected, &[self.position, element], evaluated)
    }

    pub fn out_of_range(&self) -> Exception {
        Exception::out_of_range(&self.func)
    }
}

/// Resolves a possibly negative index against `len`.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}
