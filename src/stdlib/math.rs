use std::f64::consts;

use rand::Rng;

use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    value::Object,
};

use super::{CallArgs, Doc, Registry};

pub(super) fn install(registry: &Registry<'_>) {
    registry.constant("PI", Object::Number(consts::PI), &PI);
    registry.constant("E", Object::Number(consts::E), &E);

    comparison(registry, "<", &LESS, |a, b| a < b);
    comparison(registry, "<=", &LESS_EQUAL, |a, b| a <= b);
    comparison(registry, ">", &GREATER, |a, b| a > b);
    comparison(registry, ">=", &GREATER_EQUAL, |a, b| a >= b);

    fold(registry, &["+"], &ADD, |acc, value| acc + value, Start::Seed(0.0));
    fold(registry, &["-"], &SUBTRACT, |acc, value| acc - value, Start::FirstOr(0.0));
    fold(registry, &["*"], &MULTIPLY, |acc, value| acc * value, Start::Seed(1.0));
    fold(registry, &["/"], &DIVIDE, |acc, value| acc / value, Start::FirstOr(0.0));
    fold(registry, &["max"], &MAX, f64::max, Start::First);
    fold(registry, &["min"], &MIN, f64::min, Start::First);

    unary(registry, &["++"], &INCREMENT, |value| value + 1.0);
    unary(registry, &["--"], &DECREMENT, |value| value - 1.0);
    unary(registry, &["sin"], &SIN, f64::sin);
    unary(registry, &["cos"], &COS, f64::cos);
    unary(registry, &["tan"], &TAN, f64::tan);
    unary(registry, &["asin"], &ASIN, f64::asin);
    unary(registry, &["acos"], &ACOS, f64::acos);
    unary(registry, &["atan"], &ATAN, f64::atan);
    unary(registry, &["sqrt"], &SQRT, f64::sqrt);
    unary(registry, &["abs"], &ABS, f64::abs);
    unary(registry, &["ceil"], &CEIL, f64::ceil);
    unary(registry, &["floor"], &FLOOR, f64::floor);
    unary(registry, &["round"], &ROUND, f64::round);
    unary(registry, &["trunc"], &TRUNC, f64::trunc);
    unary(registry, &["exp"], &EXP, f64::exp);
    unary(registry, &["log", "ln"], &LOG, f64::ln);
    unary(registry, &["log2"], &LOG2, f64::log2);
    unary(registry, &["log10"], &LOG10, f64::log10);

    registry.function(&["expt", "^"], &EXPT, expt);
    registry.function(&["random"], &RANDOM, random);
    registry.function(&["inc!"], &INC, |_this, caller, list| step(caller, list, 1.0));
    registry.function(&["dec!"], &DEC, |_this, caller, list| step(caller, list, -1.0));
}

/// Chained comparison: `(< a b c)` holds when `a < b` and `b < c`. Operands
/// after the first failing pair are left unevaluated.
fn comparison(registry: &Registry<'_>, name: &str, doc: &Doc, holds: fn(f64, f64) -> bool) {
    registry.function(&[name], doc, move |_this, caller, list| {
        let mut args = CallArgs::new(list, 1, true)?;
        let mut previous = args.number(caller)?;
        while args.has_next() {
            let current = args.number(caller)?;
            if !holds(previous, current) {
                return Ok(Object::Boolean(false));
            }
            previous = current;
        }
        Ok(Object::Boolean(true))
    });
}

/// Where a fold begins.
#[derive(Clone, Copy)]
enum Start {
    /// Folds every operand into the seed; no operands are required.
    Seed(f64),
    /// Folds the rest into the first operand, or yields the value when empty.
    FirstOr(f64),
    /// Folds the rest into the first operand, which is required.
    First,
}

fn fold(registry: &Registry<'_>, names: &[&str], doc: &Doc, op: fn(f64, f64) -> f64, start: Start) {
    registry.function(names, doc, move |_this, caller, list| {
        let required = match start {
            Start::First => 1,
            Start::Seed(_) | Start::FirstOr(_) => 0,
        };
        let mut args = CallArgs::new(list, required, true)?;
        let mut acc = match start {
            Start::Seed(seed) => seed,
            Start::FirstOr(empty) if !args.has_next() => empty,
            Start::FirstOr(_) | Start::First => args.number(caller)?,
        };
        while args.has_next() {
            acc = op(acc, args.number(caller)?);
        }
        Ok(Object::Number(acc))
    });
}

fn unary(registry: &Registry<'_>, names: &[&str], doc: &Doc, op: fn(f64) -> f64) {
    registry.function(names, doc, move |_this, caller, list| {
        let mut args = CallArgs::new(list, 1, false)?;
        Ok(Object::Number(op(args.number(caller)?)))
    });
}

fn expt(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let base = args.number(caller)?;
    let exponent = args.number(caller)?;
    Ok(Object::Number(base.powf(exponent)))
}

fn random(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let limit = args.number(caller)?;
    let unit: f64 = rand::thread_rng().r#gen();
    Ok(Object::Number(unit * limit))
}

fn step(caller: &ScopeChain, list: &Object, delta: f64) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let name = args.symbol_raw()?;
    let current = caller.refer(name)?.as_number().ok_or_else(|| {
        Exception::wrong_type(args.func(), Expected::Number, &[1], false)
    })?;
    let updated = Object::Number(current + delta);
    caller.rewrite(name, updated.clone())?;
    Ok(updated)
}

const PI: Doc = Doc {
    usage: "PI",
    description: "The circle constant.",
    example: "PI\n;; > 3.141592653589793",
};

const E: Doc = Doc {
    usage: "E",
    description: "Euler's number.",
    example: "E\n;; > 2.718281828459045",
};

const LESS: Doc = Doc {
    usage: "(< <Number> <Number>...)",
    description: "Returns #t if every number is less than the one after it.",
    example: "(< 111 222 333)\n;; > #t",
};

const LESS_EQUAL: Doc = Doc {
    usage: "(<= <Number> <Number>...)",
    description: "Returns #t if every number is less than or equal to the one after it.",
    example: "(<= 111 111 222)\n;; > #t",
};

const GREATER: Doc = Doc {
    usage: "(> <Number> <Number>...)",
    description: "Returns #t if every number is greater than the one after it.",
    example: "(> 333 222 111)\n;; > #t",
};

const GREATER_EQUAL: Doc = Doc {
    usage: "(>= <Number> <Number>...)",
    description: "Returns #t if every number is greater than or equal to the one after it.",
    example: "(>= 333 333 111)\n;; > #t",
};

const ADD: Doc = Doc {
    usage: "(+ <Number>...)",
    description: "Returns the sum of the numbers.\n(+) is 0.",
    example: "(+ 1 2 3)\n;; > 6",
};

const SUBTRACT: Doc = Doc {
    usage: "(- <Number>...)",
    description: "Subtracts the remaining numbers from the first.\nWith one argument, returns it unchanged. (-) is 0.",
    example: "(- 10 3 2)\n;; > 5",
};

const MULTIPLY: Doc = Doc {
    usage: "(* <Number>...)",
    description: "Returns the product of the numbers.\n(*) is 1.",
    example: "(* 2 3 4)\n;; > 24",
};

const DIVIDE: Doc = Doc {
    usage: "(/ <Number>...)",
    description: "Divides the first number by each of the remaining ones.\n(/) is 0.",
    example: "(/ 12 3 2)\n;; > 2",
};

const MAX: Doc = Doc {
    usage: "(max <Number>...)",
    description: "Returns the largest number.",
    example: "(max 2 7 3)\n;; > 7",
};

const MIN: Doc = Doc {
    usage: "(min <Number>...)",
    description: "Returns the smallest number.",
    example: "(min 2 7 3)\n;; > 2",
};

const INCREMENT: Doc = Doc {
    usage: "(++ <Number>)",
    description: "Returns <Number> plus 1.",
    example: "(++ 111)\n;; > 112",
};

const DECREMENT: Doc = Doc {
    usage: "(-- <Number>)",
    description: "Returns <Number> minus 1.",
    example: "(-- 111)\n;; > 110",
};

const INC: Doc = Doc {
    usage: "(inc! <Symbol>)",
    description: "Adds 1 to the number bound to <Symbol> and returns the new value.",
    example: "(define i 111)\n(inc! i)\n;; > 112\ni\n;; > 112",
};

const DEC: Doc = Doc {
    usage: "(dec! <Symbol>)",
    description: "Subtracts 1 from the number bound to <Symbol> and returns the new value.",
    example: "(define i 111)\n(dec! i)\n;; > 110\ni\n;; > 110",
};

const SIN: Doc = Doc {
    usage: "(sin <Number>)",
    description: "Sine of <Number> radians.",
    example: "(sin (/ PI 2))\n;; > 1",
};

const COS: Doc = Doc {
    usage: "(cos <Number>)",
    description: "Cosine of <Number> radians.",
    example: "(cos PI)\n;; > -1",
};

const TAN: Doc = Doc {
    usage: "(tan <Number>)",
    description: "Tangent of <Number> radians.",
    example: "(tan 0)\n;; > 0",
};

const ASIN: Doc = Doc {
    usage: "(asin <Number>)",
    description: "Arc sine of <Number>, in radians.",
    example: "(asin 0)\n;; > 0",
};

const ACOS: Doc = Doc {
    usage: "(acos <Number>)",
    description: "Arc cosine of <Number>, in radians.",
    example: "(acos 1)\n;; > 0",
};

const ATAN: Doc = Doc {
    usage: "(atan <Number>)",
    description: "Arc tangent of <Number>, in radians.",
    example: "(atan 0)\n;; > 0",
};

const SQRT: Doc = Doc {
    usage: "(sqrt <Number>)",
    description: "Square root of <Number>.",
    example: "(sqrt 16)\n;; > 4",
};

const ABS: Doc = Doc {
    usage: "(abs <Number>)",
    description: "Absolute value of <Number>.",
    example: "(abs -5.5)\n;; > 5.5",
};

const CEIL: Doc = Doc {
    usage: "(ceil <Number>)",
    description: "Rounds <Number> up to an integer.",
    example: "(ceil 1.3)\n;; > 2",
};

const FLOOR: Doc = Doc {
    usage: "(floor <Number>)",
    description: "Rounds <Number> down to an integer.",
    example: "(floor 1.3)\n;; > 1",
};

const ROUND: Doc = Doc {
    usage: "(round <Number>)",
    description: "Rounds <Number> to the nearest integer, halves away from zero.",
    example: "(round 1.5)\n;; > 2",
};

const TRUNC: Doc = Doc {
    usage: "(trunc <Number>)",
    description: "Drops the fractional part of <Number>.",
    example: "(trunc -1.234)\n;; > -1",
};

const EXP: Doc = Doc {
    usage: "(exp <Number>)",
    description: "E raised to the power of <Number>.",
    example: "(exp 0)\n;; > 1",
};

const LOG: Doc = Doc {
    usage: "(log <Number>)\n(ln <Number>)",
    description: "Natural logarithm of <Number>.",
    example: "(log E)\n;; > 1",
};

const LOG2: Doc = Doc {
    usage: "(log2 <Number>)",
    description: "Base 2 logarithm of <Number>.",
    example: "(log2 8)\n;; > 3",
};

const LOG10: Doc = Doc {
    usage: "(log10 <Number>)",
    description: "Base 10 logarithm of <Number>.",
    example: "(log10 1000)\n;; > 3",
};

const EXPT: Doc = Doc {
    usage: "(expt <Base : Number> <Exponent : Number>)\n(^ <Base : Number> <Exponent : Number>)",
    description: "Raises <Base> to the power of <Exponent>.",
    example: "(expt 2 10)\n;; > 1024",
};

const RANDOM: Doc = Doc {
    usage: "(random <Number>)",
    description: "Returns a uniformly distributed number from 0 up to, not including, <Number>.",
    example: "(random 10)\n;; > 4.216...",
};
