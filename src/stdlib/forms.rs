//! Special forms: natives that decide for themselves which operands to
//! evaluate.

use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    value::Object,
};

use super::{CallArgs, Doc, Registry};

pub(super) fn install(registry: &Registry<'_>) {
    registry.function(&["quote"], &QUOTE, quote);
    registry.function(&["define"], &DEFINE, define);
    registry.function(&["set!"], &SET, set);
    registry.function(&["lambda"], &LAMBDA, lambda);
    registry.function(&["let"], &LET, let_form);
    registry.function(&["if"], &IF, if_form);
    registry.function(&["cond"], &COND, cond);
    registry.function(&["begin"], &BEGIN, begin);
    registry.function(&["while"], &WHILE, while_form);
    registry.function(&["for"], &FOR, for_form);
    registry.function(&["try"], &TRY, try_form);
    registry.function(&["throw"], &THROW, throw);
    registry.function(&["eval"], &EVAL, eval);
    registry.function(&["conval"], &CONVAL, conval);
    registry.function(&["not"], &NOT, not);
    registry.function(&["and"], &AND, and);
    registry.function(&["or"], &OR, or);
}

const QUOTE: Doc = Doc {
    usage: "(quote <Object>)",
    description: "Returns <Object> without evaluating it.\n'<Object> is shorthand for the same form.",
    example: "(quote (111 222 333))\n;; > (111 222 333)\n\n'(111 222 333)\n;; > (111 222 333)",
};

fn quote(_this: &Object, _caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    Ok(args.next_raw()?.clone())
}

const DEFINE: Doc = Doc {
    usage: "(define <Symbol> <Object>)\n(define (<Name> <Args>...) <S-Expression>...)",
    description: "Binds a value to <Symbol> in the current scope.\nThe second form binds a new function to <Name>.\nReturns the bound symbol.",
    example: "(define x 123)\n;; > x\n\n(define (inc n) (+ n 1))\n(inc 10)\n;; > 11",
};

fn define(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let target = args.next_raw()?;
    match target {
        Object::Symbol(name) => {
            let value = args.next_eval(caller)?;
            caller.bind(name.as_str(), value);
            Ok(target.clone())
        }
        Object::Pair(_) => {
            let mut signature = target.iter();
            let name = match signature.next() {
                Some(Object::Symbol(name)) => name.clone(),
                _ => return Err(args.wrong_element(Expected::Symbol, 1, false)),
            };
            let params = parameter_names(&args, signature, 2)?;
            let body = args.rest_raw().cloned().collect();
            caller.bind(name.as_str(), Object::closure(params, body, caller.clone()));
            Ok(Object::Symbol(name))
        }
        _ => Err(args.wrong_type_raw(Expected::Other("Symbol or Pair"))),
    }
}

fn parameter_names<'a>(
    args: &CallArgs<'_>,
    params: impl Iterator<Item = &'a Object>,
    first_index: usize,
) -> Result<Vec<String>> {
    params
        .enumerate()
        .map(|(offset, param)| match param {
            Object::Symbol(name) => Ok(name.clone()),
            _ => Err(args.wrong_element(Expected::Symbol, first_index + offset, false)),
        })
        .collect()
}

const SET: Doc = Doc {
    usage: "(set! <Symbol> <Object>)",
    description: "Rewrites the nearest existing binding of <Symbol>.\nReturns the value it held before.\nRaises @unbound when <Symbol> is not bound anywhere.",
    example: "(define x 123)\n(set! x 456)\n;; > 123\nx\n;; > 456",
};

fn set(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let name = args.symbol_raw()?;
    caller.refer(name)?;
    let value = args.next_eval(caller)?;
    caller.rewrite(name, value)
}

const LAMBDA: Doc = Doc {
    usage: "(lambda (<Args>...) <S-Expression>...)",
    description: "Creates a function closed over the current scope.\nExtra arguments are ignored; missing ones raise @insufficient-arguments.\nInside the body, $@ holds the list of every evaluated argument.",
    example: "(define add (lambda (a b) (+ a b)))\n(add 1 2)\n;; > 3",
};

fn lambda(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, true)?;
    let params = args.list_raw()?;
    let params = parameter_names(&args, params.iter(), 1)?;
    let body = args.rest_raw().cloned().collect();
    Ok(Object::closure(params, body, caller.clone()))
}

const LET: Doc = Doc {
    usage: "(let ((<Name> <Object>)...) <S-Expression>...)",
    description: "Evaluates the body in a new local scope holding the given bindings.\nBinding values are evaluated in the enclosing scope.\nReturns the value of the last body expression.",
    example: "(define a 100)\n(let ((a 1) (b 2)) (+ a b))\n;; > 3\na\n;; > 100",
};

fn let_form(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    let bindings = args.list_raw()?;
    let local = caller.with_local_scope();
    for (offset, binding) in bindings.iter().enumerate() {
        if binding.is_nil() {
            continue;
        }
        let mut parts = binding.iter();
        let name = match parts.next() {
            Some(Object::Symbol(name)) if binding.is_list() => name,
            _ => return Err(args.wrong_element(Expected::Other("(Symbol Object)"), offset + 1, false)),
        };
        let value = match parts.next() {
            Some(expr) => caller.evaluate(expr)?,
            None => Object::Nil,
        };
        local.bind(name.as_str(), value);
    }
    local.evaluate_all(args.rest_raw())
}

const IF: Doc = Doc {
    usage: "(if <Condition> <Then> <Else>)",
    description: "Evaluates <Then> when <Condition> returns #t, otherwise <Else>.\n<Condition> must return Boolean.\n<Else> may be left out when <Condition> returns #t.",
    example: "(if (< 1 2) \"Yes\" \"No\")\n;; > \"Yes\"",
};

fn if_form(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::deferred(list, 3, false);
    let condition = args.boolean(caller)?;
    let then_branch = args.next_raw()?;
    if condition {
        return caller.evaluate(then_branch);
    }
    caller.evaluate(args.next_raw()?)
}

const COND: Doc = Doc {
    usage: "(cond (<Condition> <S-Expression>...)... (else <S-Expression>...))",
    description: "Evaluates the clause whose <Condition> first returns #t.\nelse matches unconditionally.\nReturns Nil when no clause matches.",
    example: "(define n 5)\n(cond ((< n 3) \"small\") ((< n 10) \"medium\") (else \"large\"))\n;; > \"medium\"",
};

fn cond(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    while args.has_next() {
        let clause = args.next_raw()?;
        if !clause.is_pair() || !clause.is_list() {
            return Err(args.wrong_type_raw(Expected::List));
        }
        let mut parts = clause.iter();
        let Some(test) = parts.next() else {
            continue;
        };
        let matched = match test {
            Object::Symbol(name) if name == "else" => true,
            _ => caller
                .evaluate(test)?
                .as_boolean()
                .ok_or_else(|| args.wrong_element(Expected::Boolean, 1, true))?,
        };
        if matched {
            return caller.evaluate_all(parts);
        }
    }
    Ok(Object::Nil)
}

const BEGIN: Doc = Doc {
    usage: "(begin <S-Expression>...)",
    description: "Evaluates each expression in order and returns the last value.",
    example: "(begin (display \"Hello\") (display \"World\") 123)\n;; Output: Hello\n;; Output: World\n;; > 123",
};

fn begin(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 0, true)?;
    caller.evaluate_all(args.rest_raw())
}

const WHILE: Doc = Doc {
    usage: "(while <Condition> <S-Expression>...)",
    description: "Repeats the body while <Condition> returns #t.\nThe loop runs in its own local scope.\nReturns the last body value, or Nil if the body never ran.",
    example: "(define i 0)\n(while (< i 3) (display i) (set! i (+ i 1)))\n;; Output: 0\n;; Output: 1\n;; Output: 2",
};

fn while_form(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, true)?;
    let condition = args.next_raw()?;
    let body: Vec<&Object> = args.rest_raw().collect();
    let local = caller.with_local_scope();
    let mut result = Object::Nil;
    loop {
        let proceed = local
            .evaluate(condition)?
            .as_boolean()
            .ok_or_else(|| Exception::wrong_type(args.func(), Expected::Boolean, &[1], true))?;
        if !proceed {
            return Ok(result);
        }
        result = local.evaluate_all(body.iter().copied())?;
    }
}

const FOR: Doc = Doc {
    usage: "(for (<Variable> <List | String>) <S-Expression>...)",
    description: "Binds each element of the list, or each character of the string, to <Variable> and evaluates the body.\nReturns the last body value.",
    example: "(for (x '(1 2 3)) (display x))\n;; Output: 1\n;; Output: 2\n;; Output: 3",
};

fn for_form(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, true)?;
    let header = args.list_raw()?;
    let mut parts = header.iter();
    let variable = match parts.next() {
        Some(Object::Symbol(name)) => name.as_str(),
        _ => return Err(args.wrong_element(Expected::Symbol, 1, false)),
    };
    let sequence = match parts.next() {
        Some(expr) => caller.evaluate(expr)?,
        None => return Err(args.wrong_element(Expected::Other("List or String"), 2, false)),
    };
    let items: Vec<Object> = match sequence {
        Object::String(text) => text.chars().map(|ch| Object::String(ch.to_string())).collect(),
        other if other.is_list() => other.iter().cloned().collect(),
        _ => return Err(args.wrong_element(Expected::Other("List or String"), 2, true)),
    };
    let body: Vec<&Object> = args.rest_raw().collect();
    let local = caller.with_local_scope();
    let mut result = Object::Nil;
    for item in items {
        local.bind(variable, item);
        result = local.evaluate_all(body.iter().copied())?;
    }
    Ok(result)
}

const TRY: Doc = Doc {
    usage: "(try (<Trial>...) <Handler>...)",
    description: "Evaluates the trial expressions.\nIf one raises, the raised object is bound to `exception` in a new local scope and the handlers run.\nReturns the last value of whichever side ran last.",
    example: "(try ((+ 1 \"Hello\")) (display \"Error\") exception)\n;; Output: Error\n;; > (@not-number \"The 2nd argument of (+) didn't return Number.\")",
};

fn try_form(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    let trials = args.list_raw()?;
    match caller.evaluate_all(trials.iter()) {
        Ok(value) => Ok(value),
        Err(exception) => {
            if !args.has_next() {
                return Err(Exception::insufficient_arguments(args.func(), 2, true, args.given()));
            }
            let local = caller.with_local_scope();
            local.bind("exception", exception.into_object());
            local.evaluate_all(args.rest_raw())
        }
    }
}

const THROW: Doc = Doc {
    usage: "(throw <Object>)",
    description: "Raises the evaluated <Object> as an exception.\nBy convention exceptions are (<@tag> \"message\").",
    example: "(try ((throw '(@my-error \"oops\"))) (car exception))\n;; > @my-error",
};

fn throw(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    Err(Exception(args.next_eval(caller)?))
}

const EVAL: Doc = Doc {
    usage: "(eval <Object>)",
    description: "Evaluates <Object>, then evaluates the result once more.",
    example: "(define x '(+ 1 2 3))\n(eval x)\n;; > 6",
};

fn eval(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let expr = args.next_eval(caller)?;
    caller.evaluate(&expr)
}

const CONVAL: Doc = Doc {
    usage: "(conval <Object 1> <Object 2>)",
    description: "Evaluates both objects, joins them into a Pair and evaluates the Pair.\n<Object 1> becomes the head, <Object 2> the tail.\nSame as (eval (cons <Object 1> <Object 2>)).",
    example: "(define a '(1 2 3))\n(conval + a)\n;; > 6",
};

fn conval(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let head = args.next_eval(caller)?;
    let tail = args.next_eval(caller)?;
    caller.evaluate(&Object::cons(head, tail))
}

const NOT: Doc = Doc {
    usage: "(not <Boolean>)",
    description: "Inverts <Boolean>.",
    example: "(not (= 111 111))\n;; > #f",
};

fn not(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    Ok(Object::Boolean(!args.boolean(caller)?))
}

const AND: Doc = Doc {
    usage: "(and <Boolean>...)",
    description: "Returns #t if every argument returns #t.\nStops at the first #f.",
    example: "(and (= 1 1) (= 2 2))\n;; > #t",
};

fn and(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    while args.has_next() {
        if !args.boolean(caller)? {
            return Ok(Object::Boolean(false));
        }
    }
    Ok(Object::Boolean(true))
}

const OR: Doc = Doc {
    usage: "(or <Boolean>...)",
    description: "Returns #t if any argument returns #t.\nStops at the first #t.",
    example: "(or (= 1 2) (= 2 2))\n;; > #t",
};

fn or(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    while args.has_next() {
        if args.boolean(caller)? {
            return Ok(Object::Boolean(true));
        }
    }
    Ok(Object::Boolean(false))
}
