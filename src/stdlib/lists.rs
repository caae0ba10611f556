use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    value::Object,
};

use super::{CallArgs, Doc, Registry, resolve_index};

pub(super) fn install(registry: &Registry<'_>) {
    registry.function(&["car"], &CAR, car);
    registry.function(&["cdr"], &CDR, cdr);
    registry.function(&["cons"], &CONS, cons);
    registry.function(&["list"], &LIST, list);
    registry.function(&["append", "string-append"], &APPEND, append);
    registry.function(&["length"], &LENGTH, length);
    registry.function(&["list-ref", "ref", "string-ref"], &LIST_REF, list_ref);
    registry.function(&["list-replace"], &LIST_REPLACE, list_replace);
    registry.function(&["list-remove"], &LIST_REMOVE, list_remove);
    registry.function(&["search"], &SEARCH, search);
    registry.function(&["range"], &RANGE, range);
    registry.function(&["front"], &FRONT, front);
    registry.function(&["back"], &BACK, back);
    registry.function(&["push-front"], &PUSH_FRONT, push_front);
    registry.function(&["pop-front"], &POP_FRONT, pop_front);
    registry.function(&["push-back"], &PUSH_BACK, push_back);
    registry.function(&["pop-back"], &POP_BACK, pop_back);
    registry.function(&["string-split"], &STRING_SPLIT, string_split);
}

const CAR: Doc = Doc {
    usage: "(car <Pair>)",
    description: "Returns the head of <Pair>.",
    example: "(car '(111 222 333))\n;; > 111",
};

fn car(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let (mut items, _) = args.pair(caller)?.into_parts();
    Ok(items.swap_remove(0))
}

const CDR: Doc = Doc {
    usage: "(cdr <Pair>)",
    description: "Returns the tail of <Pair>.",
    example: "(cdr '(111 222 333))\n;; > (222 333)",
};

fn cdr(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let pair = args.pair(caller)?;
    Ok(pair.tail().cloned().unwrap_or_default())
}

const CONS: Doc = Doc {
    usage: "(cons <Object 1> <Object 2>)",
    description: "Returns a new pair whose head is <Object 1> and tail is <Object 2>.",
    example: "(cons 111 222)\n;; > (111 . 222)\n\n(cons 111 '(222 333))\n;; > (111 222 333)",
};

fn cons(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let head = args.next_eval(caller)?;
    let tail = args.next_eval(caller)?;
    Ok(Object::cons(head, tail))
}

const LIST: Doc = Doc {
    usage: "(list <Object>...)",
    description: "Returns a list of the evaluated arguments.",
    example: "(list 111 222 333)\n;; > (111 222 333)",
};

fn list(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 0, true)?;
    Ok(Object::list(args.rest_eval(caller)?))
}

const APPEND: Doc = Doc {
    usage: "(append <List> <Object>...)\n(append <String> <Object>...)\n(string-append <String> <Object>...)",
    description: "Given a list, replaces its final Nil with each following object in turn.\nGiven a string, concatenates the following objects as text.",
    example: "(append '(111 222) '(333 444) '(555))\n;; > (111 222 333 444 555)\n\n(append \"Hello \" \"World \" 123)\n;; > \"Hello World 123\"",
};

fn append(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, true)?;
    match args.next_eval(caller)? {
        Object::String(mut text) => {
            for value in args.rest_eval(caller)? {
                match value {
                    Object::String(more) => text.push_str(&more),
                    Object::Closure(_) | Object::Native(_) => {}
                    other => text.push_str(&other.to_string()),
                }
            }
            Ok(Object::String(text))
        }
        first if first.is_list() => {
            let mut result = first;
            for value in args.rest_eval(caller)? {
                let mut slot = &mut result;
                while let Object::Pair(pair) = slot {
                    slot = &mut pair.tail;
                }
                if !slot.is_nil() {
                    break;
                }
                *slot = value;
            }
            Ok(result)
        }
        _ => Err(args.wrong_type(Expected::Other("List or String"))),
    }
}

const LENGTH: Doc = Doc {
    usage: "(length <Object>)",
    description: "Counts the elements of a list; a dotted tail counts as one more.\nNil has length 0 and any other atom length 1.",
    example: "(length '(111 222 333))\n;; > 3\n\n(length '(111 222 . 333))\n;; > 3",
};

fn length(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let value = args.next_eval(caller)?;
    let count = match &value {
        Object::Nil => 0,
        Object::Pair(_) => {
            let mut items = value.iter();
            let count = items.by_ref().count();
            count + usize::from(!items.terminal().is_nil())
        }
        _ => 1,
    };
    Ok(Object::Number(count as f64))
}

const LIST_REF: Doc = Doc {
    usage: "(list-ref <List> <Index : Number>)\n(string-ref <String> <Index : Number>)\n(ref <List | String> <Index : Number>)",
    description: "Returns the element at <Index>, or the character as a String.\nA negative <Index> counts from the end.\nRaises @out-of-range when <Index> is outside the sequence.",
    example: "(list-ref '(111 222 333) 1)\n;; > 222\n\n(string-ref \"Hello\" -1)\n;; > \"o\"",
};

fn list_ref(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let sequence = args.next_eval(caller)?;
    if !sequence.is_string() && !sequence.is_list() {
        return Err(args.wrong_type(Expected::Other("List or String")));
    }
    let index = args.integer(caller)?;
    match sequence {
        Object::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            resolve_index(index, chars.len())
                .map(|idx| Object::String(chars[idx].to_string()))
                .ok_or_else(|| args.out_of_range())
        }
        sequence => {
            let (mut items, _) = sequence.into_parts();
            let idx = resolve_index(index, items.len()).ok_or_else(|| args.out_of_range())?;
            Ok(items.swap_remove(idx))
        }
    }
}

const LIST_REPLACE: Doc = Doc {
    usage: "(list-replace <List> <Index : Number> <Object>)",
    description: "Returns a copy of <List> with the element at <Index> replaced by <Object>.\nA negative <Index> counts from the end.",
    example: "(list-replace '(111 222 333) 1 \"Hello\")\n;; > (111 \"Hello\" 333)",
};

fn list_replace(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 3, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    let index = args.integer(caller)?;
    let idx = resolve_index(index, items.len()).ok_or_else(|| args.out_of_range())?;
    items[idx] = args.next_eval(caller)?;
    Ok(Object::list(items))
}

const LIST_REMOVE: Doc = Doc {
    usage: "(list-remove <List> <Index : Number>)",
    description: "Returns a copy of <List> without the element at <Index>.\nA negative <Index> counts from the end.",
    example: "(list-remove '(111 222 333) 1)\n;; > (111 333)",
};

fn list_remove(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    let index = args.integer(caller)?;
    let idx = resolve_index(index, items.len()).ok_or_else(|| args.out_of_range())?;
    items.remove(idx);
    Ok(Object::list(items))
}

const SEARCH: Doc = Doc {
    usage: "(search <Object> <List>)",
    description: "Returns the index of the first element equal to <Object>, or Nil.",
    example: "(search 222 '(111 222 333))\n;; > 1",
};

fn search(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let key = args.next_eval(caller)?;
    let haystack = args.list(caller)?;
    Ok(haystack
        .iter()
        .position(|item| *item == key)
        .map_or(Object::Nil, |idx| Object::Number(idx as f64)))
}

const RANGE: Doc = Doc {
    usage: "(range <Size : Number>)",
    description: "Returns the list of numbers from 0 up to, not including, <Size>.",
    example: "(range 5)\n;; > (0 1 2 3 4)",
};

fn range(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let size = args.integer(caller)?.max(0);
    Ok(Object::list(
        (0..size).map(|value| Object::Number(value as f64)).collect(),
    ))
}

const FRONT: Doc = Doc {
    usage: "(front <List>)",
    description: "Returns the first element of <List>.",
    example: "(front '(111 222 333))\n;; > 111",
};

fn front(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    if items.is_empty() {
        return Err(args.out_of_range());
    }
    Ok(items.swap_remove(0))
}

const BACK: Doc = Doc {
    usage: "(back <List>)",
    description: "Returns the last element of <List>.",
    example: "(back '(111 222 333))\n;; > 333",
};

fn back(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    items.pop().ok_or_else(|| args.out_of_range())
}

const PUSH_FRONT: Doc = Doc {
    usage: "(push-front <List> <Object>)",
    description: "Returns a copy of <List> with <Object> added at the front.",
    example: "(push-front '(111 222) 333)\n;; > (333 111 222)",
};

fn push_front(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let target = args.list(caller)?;
    let value = args.next_eval(caller)?;
    Ok(Object::cons(value, target))
}

const POP_FRONT: Doc = Doc {
    usage: "(pop-front <List>)",
    description: "Returns a copy of <List> without its first element.",
    example: "(pop-front '(111 222 333))\n;; > (222 333)",
};

fn pop_front(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    if items.is_empty() {
        return Err(args.out_of_range());
    }
    items.remove(0);
    Ok(Object::list(items))
}

const PUSH_BACK: Doc = Doc {
    usage: "(push-back <List> <Object>)",
    description: "Returns a copy of <List> with <Object> added at the back.",
    example: "(push-back '(111 222) 333)\n;; > (111 222 333)",
};

fn push_back(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    items.push(args.next_eval(caller)?);
    Ok(Object::list(items))
}

const POP_BACK: Doc = Doc {
    usage: "(pop-back <List>)",
    description: "Returns a copy of <List> without its last element.",
    example: "(pop-back '(111 222 333))\n;; > (111 222)",
};

fn pop_back(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let (mut items, _) = args.list(caller)?.into_parts();
    if items.pop().is_none() {
        return Err(args.out_of_range());
    }
    Ok(Object::list(items))
}

const STRING_SPLIT: Doc = Doc {
    usage: "(string-split <String> <Delimiter : String>)",
    description: "Splits <String> at every <Delimiter> and returns the pieces as a list.",
    example: "(string-split \"aaa,bbb,ccc\" \",\")\n;; > (\"aaa\" \"bbb\" \"ccc\")",
};

fn string_split(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 2, false)?;
    let text = args.string(caller)?;
    let delimiter = args.string(caller)?;
    if delimiter.is_empty() {
        return Err(Exception::runtime("(string-split) needs a non-empty delimiter."));
    }
    Ok(Object::list(
        text.split(delimiter.as_str())
            .map(|piece| Object::String(piece.to_string()))
            .collect(),
    ))
}
