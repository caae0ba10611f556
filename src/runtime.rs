use std::{
    cell::{Cell, RefCell},
    io::{self, Write},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    diagnostics::{Exception, Result},
    environment::ScopeChain,
    parser::parse,
    stdlib::{self, Doc, HelpDict},
    value::{Closure, Object},
};

/// Shared sink for `display` and `stdout`.
pub type Output = Rc<RefCell<Box<dyn Write>>>;

/// Nesting limit for a fresh interpreter, sized for an 8 MiB main-thread
/// stack.
pub const DEFAULT_MAX_DEPTH: usize = 2_500;

thread_local! {
    // Host stack in use, shared by every interpreter on the thread.
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> Result<Self> {
        let depth = DEPTH.with(|current| {
            current.set(current.get() + 1);
            current.get()
        });
        let guard = DepthGuard;
        if depth > limit {
            debug!(limit, "evaluation depth limit reached");
            return Err(Exception::runtime(format!(
                "Evaluation nested deeper than {limit} levels."
            )));
        }
        Ok(guard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|current| current.set(current.get().saturating_sub(1)));
    }
}

impl ScopeChain {
    /// Evaluates `target` with this chain as the current scope. The result
    /// never shares pair structure with bindings or with `target`.
    pub fn evaluate(&self, target: &Object) -> Result<Object> {
        let _guard = DepthGuard::enter(self.max_depth())?;
        match target {
            Object::Symbol(name) => self.refer(name),
            Object::Pair(pair) if target.is_list() => self.apply(&pair.head, target),
            other => Ok(other.clone()),
        }
    }

    /// Evaluates each expression in turn and returns the last value, or Nil
    /// when there is none.
    pub fn evaluate_all<'a, I>(&self, exprs: I) -> Result<Object>
    where
        I: IntoIterator<Item = &'a Object>,
    {
        let mut last = Object::Nil;
        for expr in exprs {
            last = self.evaluate(expr)?;
        }
        Ok(last)
    }

    fn apply(&self, head: &Object, list: &Object) -> Result<Object> {
        let procedure = self.evaluate(head)?;
        match &procedure {
            Object::Closure(closure) => self.call_closure(closure, head, list),
            Object::Native(native) => {
                trace!(procedure = %native.name, "calling native procedure");
                native.call(&procedure, self, list)
            }
            other => Err(Exception::not_procedure(&head.to_string(), other)),
        }
    }

    fn call_closure(&self, closure: &Closure, head: &Object, list: &Object) -> Result<Object> {
        let mut operands = list.iter();
        operands.next();
        let given = operands.clone().count();
        let required = closure.params.len();
        if given < required {
            return Err(Exception::insufficient_arguments(
                &head.to_string(),
                required,
                false,
                given,
            ));
        }
        trace!(procedure = %head, given, "calling closure");

        let values = operands
            .map(|operand| self.evaluate(operand))
            .collect::<Result<Vec<_>>>()?;
        let local = closure.scope.with_local_scope();
        for (param, value) in closure.params.iter().zip(&values) {
            local.bind(param.as_str(), value.clone());
        }
        local.bind("$@", Object::list(values));
        local.evaluate_all(&closure.body)
    }
}

impl Object {
    /// Evaluates `target` in the scope captured by this procedure.
    pub fn evaluate(&self, target: &Object) -> Result<Object> {
        match self {
            Object::Closure(closure) => closure.scope.evaluate(target),
            Object::Native(native) => native.scope.evaluate(target),
            other => Err(Exception::runtime(format!(
                "{} has no scope to evaluate in.",
                other.type_name()
            ))),
        }
    }
}

/// An engine instance: a global scope loaded with the native library, the
/// help dictionary, and the output sink.
pub struct Interpreter {
    global: ScopeChain,
    help: HelpDict,
    output: Output,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Builds an interpreter whose `display` and `stdout` write to `writer`.
    pub fn with_output(writer: impl Write + 'static) -> Self {
        let global = ScopeChain::new();
        let help = HelpDict::new();
        let sink: Box<dyn Write> = Box::new(writer);
        let output: Output = Rc::new(RefCell::new(sink));
        stdlib::install(&global, &help, &output);
        Self {
            global,
            help,
            output,
        }
    }

    /// Parses `source` and evaluates every expression in the global scope,
    /// returning the last value.
    pub fn eval_source(&mut self, source: &str) -> Result<Object> {
        let exprs = parse(source);
        let result = self.global.evaluate_all(&exprs);
        if let Err(err) = self.output.borrow_mut().flush() {
            debug!(%err, "failed to flush output");
        }
        result
    }

    pub fn evaluate(&self, expr: &Object) -> Result<Object> {
        self.global.evaluate(expr)
    }

    pub fn global(&self) -> &ScopeChain {
        &self.global
    }

    pub fn help_dict(&self) -> &HelpDict {
        &self.help
    }

    pub fn help(&self, name: &str) -> Option<String> {
        self.help.get(name)
    }

    pub fn add_help(&mut self, name: &str, text: &str) {
        self.help.insert(name, text);
    }

    /// Registers a host procedure in the global scope.
    pub fn add_native_function<F>(&mut self, name: &str, help: &str, callback: F)
    where
        F: Fn(&Object, &ScopeChain, &Object) -> Result<Object> + 'static,
    {
        debug!(name, "registering host native");
        stdlib::Registry::new(&self.global, &self.help).function_with_help(&[name], help, callback);
    }

    /// Registers a host procedure with structured help text.
    pub fn add_documented_function<F>(&mut self, name: &str, doc: &Doc, callback: F)
    where
        F: Fn(&Object, &ScopeChain, &Object) -> Result<Object> + 'static,
    {
        debug!(name, "registering host native");
        stdlib::Registry::new(&self.global, &self.help).function(&[name], doc, callback);
    }

    /// Sets how deeply evaluation may nest in this interpreter.
    pub fn set_max_depth(&mut self, depth: usize) {
        debug!(depth, "evaluation depth limit changed");
        self.global.set_max_depth(depth);
    }

    pub fn max_depth(&self) -> usize {
        self.global.max_depth()
    }
}
