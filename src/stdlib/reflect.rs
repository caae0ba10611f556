use std::fs;

use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    parser::parse,
    value::Object,
};

use super::{CallArgs, Doc, Registry};

pub(super) fn install(registry: &Registry<'_>) {
    registry.function(
        &[
            "parse",
            "string->symbol",
            "string->number",
            "string->boolean",
            "string->list",
        ],
        &PARSE,
        parse_string,
    );
    registry.function(&["parval"], &PARVAL, parval);
    registry.function(
        &[
            "to-string",
            "symbol->string",
            "number->string",
            "boolean->string",
            "list->string",
        ],
        &TO_STRING,
        to_string,
    );
    registry.function(&["import"], &IMPORT, import);

    let help = registry.help().clone();
    registry.function(&["help"], &HELP, move |_this, caller, list| {
        let mut args = CallArgs::new(list, 0, true)?;
        if !args.has_next() {
            return Ok(Object::String(help.catalog()));
        }
        let name = match args.next_eval(caller)? {
            Object::String(name) | Object::Symbol(name) => name,
            _ => return Err(args.wrong_type(Expected::Other("String or Symbol"))),
        };
        Ok(Object::String(
            help.get(&name)
                .unwrap_or_else(|| format!("Not found help of {name}.")),
        ))
    });
}

const PARSE: Doc = Doc {
    usage: "(parse <S-Expression : String>)\n(string->symbol <String>)\n(string->number <String>)\n(string->boolean <String>)\n(string->list <String>)",
    description: "Reads the first S-Expression in <String> and returns it unevaluated.\nReturns Nil when <String> holds no expression.",
    example: "(parse \"(1 2 3)\")\n;; > (1 2 3)\n\n(string->number \"123\")\n;; > 123",
};

fn parse_string(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let source = args.string(caller)?;
    Ok(parse(&source).into_iter().next().unwrap_or_default())
}

const PARVAL: Doc = Doc {
    usage: "(parval <S-Expression : String>)",
    description: "Reads every S-Expression in <String> and evaluates them in order.\nReturns the last value.",
    example: "(parval \"(define x 10) (* x 2)\")\n;; > 20",
};

fn parval(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let source = args.string(caller)?;
    caller.evaluate_all(&parse(&source))
}

const TO_STRING: Doc = Doc {
    usage: "(to-string <Object>)\n(symbol->string <Symbol>)\n(number->string <Number>)\n(boolean->string <Boolean>)\n(list->string <List>)",
    description: "Renders the evaluated <Object> as source text.",
    example: "(to-string '(1 2 3))\n;; > \"(1 2 3)\"\n\n(number->string 1.5)\n;; > \"1.5\"",
};

fn to_string(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    Ok(Object::String(args.next_eval(caller)?.to_string()))
}

const IMPORT: Doc = Doc {
    usage: "(import <File name : String>)",
    description: "Reads a file and evaluates every expression in it in the current scope.\nReturns the last value.",
    example: "(import \"library.scm\")",
};

fn import(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let path = args.string(caller)?;
    let source = fs::read_to_string(&path)
        .map_err(|err| Exception::runtime(format!("Couldn't open '{path}': {err}")))?;
    caller.evaluate_all(&parse(&source))
}

const HELP: Doc = Doc {
    usage: "(help)\n(help <Name : String | Symbol>)",
    description: "Returns the help text for <Name>.\nWithout arguments, returns every help entry.",
    example: "(display (help \"car\"))",
};
