use std::{
    cell::RefCell,
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind, Write},
    rc::Rc,
};

use tracing::debug;

use crate::{
    diagnostics::{Exception, Expected, Result},
    environment::ScopeChain,
    runtime::Output,
    value::Object,
};

use super::{CallArgs, Doc, Registry};

pub(super) fn install(registry: &Registry<'_>, output: &Output) {
    let sink = Rc::clone(output);
    registry.function(&["display"], &DISPLAY, move |_this, caller, list| {
        let mut args = CallArgs::new(list, 1, true)?;
        let text: String = args
            .rest_eval(caller)?
            .iter()
            .map(display_text)
            .collect();
        writeln!(sink.borrow_mut(), "{text}").map_err(write_error)?;
        Ok(Object::String(text))
    });

    let sink = Rc::clone(output);
    registry.function(&["stdout"], &STDOUT, move |this, caller, list| {
        let mut args = CallArgs::new(list, 1, false)?;
        let text = args.string(caller)?;
        let mut sink = sink.borrow_mut();
        sink.write_all(text.as_bytes())
            .and_then(|()| sink.flush())
            .map_err(write_error)?;
        Ok(this.clone())
    });

    registry.function(&["stderr"], &STDERR, stderr);
    registry.function(&["stdin"], &STDIN, stdin);
    registry.function(&["output-stream"], &OUTPUT_STREAM, output_stream);
    registry.function(&["input-stream"], &INPUT_STREAM, input_stream);
}

const DISPLAY: Doc = Doc {
    usage: "(display <Object>...)",
    description: "Prints the objects side by side followed by a newline.\nStrings print without quotes.\nReturns the printed text as a String.",
    example: "(display \"Hello \" 123 \" \" '(1 2))\n;; Output: Hello 123 (1 2)",
};

fn display_text(object: &Object) -> String {
    match object {
        Object::String(text) => text.clone(),
        Object::Symbol(name) => format!("Symbol:{name}"),
        Object::Closure(_) => format!("Function: {object}"),
        Object::Native(_) => "NativeFunction".to_string(),
        other => other.to_string(),
    }
}

const STDOUT: Doc = Doc {
    usage: "(stdout <String>)",
    description: "Writes <String> to standard output without a newline.\nReturns itself, so writes can be chained.",
    example: "((stdout \"Hello\") \" World\\n\")\n;; Output: Hello World",
};

const STDERR: Doc = Doc {
    usage: "(stderr <String>)",
    description: "Writes <String> to standard error without a newline.\nReturns itself, so writes can be chained.",
    example: "(stderr \"Something went wrong\\n\")",
};

fn stderr(this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let text = args.string(caller)?;
    let mut err = io::stderr().lock();
    err.write_all(text.as_bytes()).map_err(write_error)?;
    Ok(this.clone())
}

const STDIN: Doc = Doc {
    usage: "(stdin <Message : Symbol>)",
    description: "Reads from standard input.\n@read reads everything, @read-line one line, @get one character.\nReturns Nil once input is exhausted.",
    example: "(define line (stdin '@read-line))",
};

fn stdin(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let message = args.symbol(caller)?;
    read_message(&mut io::stdin().lock(), &message)
}

const OUTPUT_STREAM: Doc = Doc {
    usage: "(output-stream <File name : String>)",
    description: "Opens a file for writing and returns a stream procedure.\n(<Stream> <String>) writes and returns the stream.\n(<Stream> ()) closes it.",
    example: "(define out (output-stream \"hello.txt\"))\n((out \"Hello \") \"World\\n\")\n(out ())",
};

fn output_stream(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let path = args.string(caller)?;
    let file = File::create(&path).map_err(|err| {
        Exception::not_open_stream(format!("Couldn't open output stream '{path}': {err}"))
    })?;
    debug!(%path, "opened output stream");
    let file = RefCell::new(Some(file));
    Ok(Object::native(
        "output-stream",
        caller.clone(),
        move |this, caller, list| {
            let mut args = CallArgs::new(list, 1, false)?;
            match args.next_eval(caller)? {
                Object::Nil => {
                    file.borrow_mut().take();
                    Ok(this.clone())
                }
                Object::String(text) => {
                    let mut slot = file.borrow_mut();
                    let Some(file) = slot.as_mut() else {
                        return Err(Exception::not_open_stream("The stream is already closed."));
                    };
                    file.write_all(text.as_bytes()).map_err(write_error)?;
                    Ok(this.clone())
                }
                _ => Err(args.wrong_type(Expected::Other("String or Nil"))),
            }
        },
    ))
}

const INPUT_STREAM: Doc = Doc {
    usage: "(input-stream <File name : String>)",
    description: "Opens a file for reading and returns a stream procedure.\n(<Stream> '@read) reads the rest, (<Stream> '@read-line) one line, (<Stream> '@get) one character.\n(<Stream> ()) closes it. Reading a closed or exhausted stream returns Nil.",
    example: "(define in (input-stream \"hello.txt\"))\n(in '@read-line)\n;; > \"Hello World\"\n(in ())",
};

fn input_stream(_this: &Object, caller: &ScopeChain, list: &Object) -> Result<Object> {
    let mut args = CallArgs::new(list, 1, false)?;
    let path = args.string(caller)?;
    let file = File::open(&path).map_err(|err| {
        Exception::not_open_stream(format!("Couldn't open input stream '{path}': {err}"))
    })?;
    debug!(%path, "opened input stream");
    let reader = RefCell::new(Some(BufReader::new(file)));
    Ok(Object::native(
        "input-stream",
        caller.clone(),
        move |_this, caller, list| {
            let mut args = CallArgs::new(list, 1, false)?;
            match args.next_eval(caller)? {
                Object::Nil => {
                    reader.borrow_mut().take();
                    Ok(Object::Nil)
                }
                Object::Symbol(message) => match reader.borrow_mut().as_mut() {
                    Some(reader) => read_message(reader, &message),
                    None => Ok(Object::Nil),
                },
                _ => Err(args.wrong_type(Expected::Other("Symbol or Nil"))),
            }
        },
    ))
}

fn read_message(reader: &mut impl BufRead, message: &str) -> Result<Object> {
    let text = match message {
        "@read" => {
            let mut text = String::new();
            reader.read_to_string(&mut text).map_err(read_error)?;
            text
        }
        "@read-line" => {
            let mut line = String::new();
            if reader.read_line(&mut line).map_err(read_error)? == 0 {
                return Ok(Object::Nil);
            }
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            return Ok(Object::String(line));
        }
        "@get" => read_char(reader)?,
        other => {
            return Err(Exception::runtime(format!(
                "'{other}' is not a stream message. Use @read, @read-line or @get."
            )));
        }
    };
    Ok(if text.is_empty() {
        Object::Nil
    } else {
        Object::String(text)
    })
}

fn read_char(reader: &mut impl BufRead) -> Result<String> {
    let mut first = [0u8; 1];
    if reader.read(&mut first).map_err(read_error)? == 0 {
        return Ok(String::new());
    }
    let width = match first[0] {
        0xf0..=0xff => 4,
        0xe0..=0xef => 3,
        0xc0..=0xdf => 2,
        _ => 1,
    };
    let mut bytes = vec![0u8; width];
    bytes[0] = first[0];
    match reader.read_exact(&mut bytes[1..]) {
        Ok(()) => {}
        // A truncated sequence at the end of input.
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => bytes.truncate(1),
        Err(err) => return Err(read_error(err)),
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_error(err: io::Error) -> Exception {
    Exception::runtime(format!("Failed to write: {err}"))
}

fn read_error(err: io::Error) -> Exception {
    Exception::runtime(format!("Failed to read: {err}"))
}
