use crate::{diagnostics::Result, environment::ScopeChain, value::Object};

use super::{CallArgs, Doc, Registry};

pub(super) fn install(registry: &Registry<'_>) {
    type_predicate(registry, &["pair?"], "Pair", Object::is_pair);
    type_predicate(registry, &["list?"], "List", Object::is_list);
    type_predicate(registry, &["nil?", "null?"], "Nil", Object::is_nil);
    type_predicate(registry, &["symbol?"], "Symbol", Object::is_symbol);
    type_predicate(registry, &["number?"], "Number", Object::is_number);
    type_predicate(registry, &["boolean?"], "Boolean", Object::is_boolean);
    type_predicate(registry, &["string?"], "String", Object::is_string);
    type_predicate(registry, &["function?"], "Function", Object::is_function);
    type_predicate(
        registry,
        &["native-function?"],
        "Native Function",
        Object::is_native_function,
    );
    type_predicate(
        registry,
        &["procedure?"],
        "Function or Native Function",
        Object::is_procedure,
    );

    registry.function(&["equal?", "="], &EQUAL, equal);
    registry.function(&["!="], &NOT_EQUAL, not_equal);
}

/// Variadic predicate that holds only when every argument passes `test`.
fn type_predicate(registry: &Registry<'_>, names: &[&str], label: &str, test: fn(&Object) -> bool) {
    let help = format!(
        "### {} ###\n\n<h6> Usage </h6>\n\n* `({} <Object>...)`\n\n<h6> Description </h6>\n\n* Returns #t if every <Object> is {label}.\n\n<h6> Example </h6>\n\n    ({} {})\n    ;; > #t",
        names.join(", "),
        names[0],
        names[0],
        sample(label),
    );
    registry.function_with_help(names, &help, move |_this, caller, list| {
        let mut args = CallArgs::new(list, 1, true)?;
        let verdict = args.rest_eval(caller)?.iter().all(test);
        Ok(Object::Boolean(verdict))
    });
}

fn sample(label: &str) -> &'static str {
    match label {
        "Pair" => "'(1 . 2)",
        "List" => "'(1 2 3)",
        "Nil" => "'()",
        "Symbol" => "'hello",
        "Number" => "123",
        "Boolean" => "#f",
        "String" => "\"Hello\"",
        "Function" => "(lambda (x) x)",
        _ => "car",
    }
}

const EQUAL: Doc = Doc {
    usage: "(equal? <Object> <Object>...)\n(= <Object> <Object>...)",
    description: "Returns #t if every argument is structurally equal to the first one.",
    example: "(equal? '(1 2 \"x\") '(1 2 \"x\"))\n;; > #t\n\n(= 1 1 2)\n;; > #f",
};

fn equal(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    let first = args.next_eval(caller)?;
    let verdict = args.rest_eval(caller)?.iter().all(|value| *value == first);
    Ok(Object::Boolean(verdict))
}

const NOT_EQUAL: Doc = Doc {
    usage: "(!= <Object> <Object>...)",
    description: "Returns #t if any argument differs from the first one.",
    example: "(!= 1 1 2)\n;; > #t",
};

fn not_equal(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    let first = args.next_eval(caller)?;
    let verdict = args.rest_eval(caller)?.iter().any(|value| *value != first);
    Ok(Object::Boolean(verdict))
}
