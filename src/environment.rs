use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Exception, Result},
    runtime::DEFAULT_MAX_DEPTH,
    value::Object,
};

pub type ScopeRef = Rc<RefCell<Scope>>;

/// One symbol table in a chain.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: IndexMap<String, Object>,
}

impl Scope {
    pub fn new() -> ScopeRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.bindings.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

/// Lexical environment: global table first, innermost last.
///
/// Cloning a chain shares its tables, which is how closures capture the
/// scope they were created in. Every chain grown from one global table also
/// shares that table's evaluation depth limit.
#[derive(Clone, Debug)]
pub struct ScopeChain {
    tables: Vec<ScopeRef>,
    max_depth: Rc<Cell<usize>>,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    /// A chain holding a single, empty global table.
    pub fn new() -> Self {
        Self {
            tables: vec![Scope::new()],
            max_depth: Rc::new(Cell::new(DEFAULT_MAX_DEPTH)),
        }
    }

    /// How deeply evaluation in this chain's family may nest.
    pub fn max_depth(&self) -> usize {
        self.max_depth.get()
    }

    pub fn set_max_depth(&self, depth: usize) {
        self.max_depth.set(depth);
    }

    pub fn push_local_scope(&mut self) {
        self.tables.push(Scope::new());
    }

    /// A copy of this chain with a fresh innermost table.
    pub fn with_local_scope(&self) -> Self {
        let mut chain = self.clone();
        chain.push_local_scope();
        chain
    }

    pub fn depth(&self) -> usize {
        self.tables.len()
    }

    pub fn global(&self) -> Option<&ScopeRef> {
        self.tables.first()
    }

    pub fn innermost(&self) -> Option<&ScopeRef> {
        self.tables.last()
    }

    /// Binds `name` in the innermost table, shadowing outer bindings.
    pub fn bind(&self, name: impl Into<String>, value: Object) {
        if let Some(table) = self.tables.last() {
            table.borrow_mut().bindings.insert(name.into(), value);
        }
    }

    /// Overwrites the nearest existing binding of `name` and hands back the
    /// value it held.
    pub fn rewrite(&self, name: &str, value: Object) -> Result<Object> {
        for table in self.tables.iter().rev() {
            let mut table = table.borrow_mut();
            if let Some(slot) = table.bindings.get_mut(name) {
                return Ok(std::mem::replace(slot, value));
            }
        }
        Err(Exception::unbound(name))
    }

    pub fn refer(&self, name: &str) -> Result<Object> {
        self.tables
            .iter()
            .rev()
            .find_map(|table| table.borrow().get(name).cloned())
            .ok_or_else(|| Exception::unbound(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|table| table.borrow().bindings.contains_key(name))
    }
}
