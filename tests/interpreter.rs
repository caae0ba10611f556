use sayulisp::{Exception, Interpreter, Object, stdlib::Doc};
use std::{cell::RefCell, fs, io, io::Write, path::Path, rc::Rc, thread};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn eval(source: &str) -> Object {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_text(source: &str) -> String {
    eval(source).to_string()
}

fn eval_error(source: &str) -> Exception {
    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

fn eval_output(source: &str) -> (Object, String) {
    let captured = Captured::default();
    let mut interpreter = Interpreter::with_output(captured.clone());
    let value = interpreter
        .eval_source(source)
        .expect("evaluation should succeed");
    (value, captured.text())
}

fn expect_number(value: &Object) -> f64 {
    match value {
        Object::Number(n) => *n,
        other => panic!("expected Number, found {}", other.type_name()),
    }
}

fn expect_bool(value: &Object) -> bool {
    match value {
        Object::Boolean(b) => *b,
        other => panic!("expected Boolean, found {}", other.type_name()),
    }
}

fn expect_string(value: &Object) -> &str {
    match value {
        Object::String(text) => text,
        other => panic!("expected String, found {}", other.type_name()),
    }
}

fn path_literal(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn closures_keep_their_defining_scope() {
    let value = eval(
        r#"
        (define (gen x) (lambda () x))
        (define f (gen 42))
        (f)
        "#,
    );
    assert_eq!(expect_number(&value), 42.0);
}

#[test]
fn counter_mutation_stays_in_captured_scope() {
    let text = eval_text(
        r#"
        (define counter (let ((n 1)) (lambda () (set! n (+ n 1)) n)))
        (list (counter) (counter) (counter))
        "#,
    );
    assert_eq!(text, "(2 3 4)");
}

#[test]
fn closure_rejects_missing_arguments() {
    let err = eval_error("(define (f a b) a) (f 1)");
    assert_eq!(err.tag(), Some("@insufficient-arguments"));
    assert_eq!(
        err.message(),
        Some("(f) needs 2 arguments. Given 1 argument.")
    );
}

#[test]
fn closure_ignores_extra_arguments() {
    let value = eval("(define (f a) a) (f 1 2 3)");
    assert_eq!(expect_number(&value), 1.0);
}

#[test]
fn closure_binds_all_arguments_to_dollar_at() {
    assert_eq!(eval_text("(define (f a) $@) (f 1 2 3)"), "(1 2 3)");
}

#[test]
fn arguments_evaluate_in_caller_scope() {
    let value = eval(
        r#"
        (define x 10)
        (define (add-x y) (+ x y))
        (let ((x 1)) (add-x x))
        "#,
    );
    assert_eq!(expect_number(&value), 11.0);
}

#[test]
fn cons_renders_dotted_pairs_and_lists() {
    assert_eq!(eval_text("(cons 1 2)"), "(1 . 2)");
    assert!(!expect_bool(&eval("(list? (cons 1 2))")));
    assert_eq!(eval_text("(cons 1 (cons 2 '()))"), "(1 2)");
    assert!(expect_bool(&eval("(list? (cons 1 (cons 2 '())))")));
}

#[test]
fn try_binds_thrown_object() {
    let (value, output) = eval_output("(try ((throw 123)) (display exception))");
    assert_eq!(output, "123\n");
    assert_eq!(expect_string(&value), "123");
}

#[test]
fn try_catches_type_errors() {
    let text = eval_text(r#"(try ((+ 1 "a")) exception)"#);
    assert_eq!(
        text,
        r#"(@not-number "The 2nd argument of (+) didn't return Number.")"#
    );
}

#[test]
fn try_returns_trial_value_without_exception() {
    let value = eval("(try ((+ 1 2) (+ 3 4)) 0)");
    assert_eq!(expect_number(&value), 7.0);
}

#[test]
fn uncaught_throw_reaches_host() {
    let err = eval_error(r#"(throw '(@custom "went wrong"))"#);
    assert_eq!(err.tag(), Some("@custom"));
    assert_eq!(err.to_string(), "@custom: went wrong");
}

#[test]
fn negative_indices_count_from_end() {
    assert_eq!(expect_number(&eval("(list-ref '(1 2 3) -1)")), 3.0);
    assert_eq!(expect_number(&eval("(ref '(1 2 3) 0)")), 1.0);
    assert_eq!(expect_string(&eval(r#"(string-ref "Hello" -1)"#)), "o");
    assert_eq!(expect_string(&eval(r#"(string-ref "Hello" 1)"#)), "e");
}

#[test]
fn index_out_of_range_is_reported() {
    for source in [
        "(list-ref '(1 2 3) 3)",
        "(list-ref '(1 2 3) -4)",
        r#"(string-ref "abc" 5)"#,
        "(list-replace '(1 2) 2 0)",
        "(front '())",
    ] {
        let err = eval_error(source);
        assert_eq!(err.tag(), Some("@out-of-range"), "source: {source}");
    }
}

#[test]
fn rounding_functions() {
    assert_eq!(expect_number(&eval("(floor 1.3)")), 1.0);
    assert_eq!(expect_number(&eval("(ceil 1.3)")), 2.0);
    assert_eq!(expect_number(&eval("(round 1.5)")), 2.0);
    assert_eq!(expect_number(&eval("(trunc -1.234)")), -1.0);
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(expect_number(&eval("(+ 1 2 3)")), 6.0);
    assert_eq!(expect_number(&eval("(- 10 3 2)")), 5.0);
    assert_eq!(expect_number(&eval("(- 5)")), 5.0);
    assert_eq!(expect_number(&eval("(* 2 3 4)")), 24.0);
    assert_eq!(expect_number(&eval("(/ 12 3 2)")), 2.0);
    assert_eq!(expect_number(&eval("(max 2 7 3)")), 7.0);
    assert_eq!(expect_number(&eval("(min 2 7 3)")), 2.0);
    assert_eq!(expect_number(&eval("(expt 2 10)")), 1024.0);
    assert_eq!(expect_number(&eval("(^ 3 2)")), 9.0);
    assert_eq!(expect_number(&eval("(sqrt 16)")), 4.0);
    assert_eq!(expect_number(&eval("(++ 1)")), 2.0);
    assert!(expect_bool(&eval("(< 1 2 3)")));
    assert!(!expect_bool(&eval("(< 1 3 2)")));
    assert!(expect_bool(&eval("(>= 3 3 1)")));
    assert!((expect_number(&eval("(cos PI)")) + 1.0).abs() < 1e-12);
}

#[test]
fn arithmetic_without_operands() {
    assert_eq!(expect_number(&eval("(+)")), 0.0);
    assert_eq!(expect_number(&eval("(*)")), 1.0);
    assert_eq!(expect_number(&eval("(-)")), 0.0);
    assert_eq!(expect_number(&eval("(/)")), 0.0);
}

#[test]
fn comparison_stops_at_first_failing_pair() {
    assert!(!expect_bool(&eval(r#"(< 2 1 "x")"#)));
    assert!(!expect_bool(&eval("(> 1 2 undefined)")));
    let err = eval_error(r#"(< 1 2 "x")"#);
    assert_eq!(err.tag(), Some("@not-number"));
    assert_eq!(
        err.message(),
        Some("The 3rd argument of (<) didn't return Number.")
    );
}

#[test]
fn random_stays_below_limit() {
    for _ in 0..20 {
        let value = expect_number(&eval("(random 10)"));
        assert!((0.0..10.0).contains(&value));
    }
}

#[test]
fn inc_and_dec_update_bindings() {
    let text = eval_text("(define i 10) (inc! i) (inc! i) (dec! i) (list i (inc! i))");
    assert_eq!(text, "(11 12)");
    let err = eval_error(r#"(define s "x") (inc! s)"#);
    assert_eq!(err.tag(), Some("@not-number"));
}

#[test]
fn unbound_symbols_raise() {
    let err = eval_error("undefined-symbol");
    assert_eq!(err.tag(), Some("@unbound"));
    let err = eval_error("(set! nowhere 1)");
    assert_eq!(err.tag(), Some("@unbound"));
}

#[test]
fn non_procedure_head_raises() {
    let err = eval_error("(1 2)");
    assert_eq!(err.tag(), Some("@not-procedure"));
    assert_eq!(
        err.message(),
        Some("'1' is not bound with Procedure. This is Number.")
    );
}

#[test]
fn nested_type_errors_name_the_element() {
    let err = eval_error("(lambda (a 1) a)");
    assert_eq!(err.tag(), Some("@not-symbol"));
    assert_eq!(
        err.message(),
        Some("The 2nd element of the 1st argument of (lambda) is not Symbol.")
    );
}

#[test]
fn native_arity_is_checked() {
    let err = eval_error("(car)");
    assert_eq!(
        err.message(),
        Some("(car) needs 1 argument. Given 0 arguments.")
    );
    let err = eval_error("(max)");
    assert_eq!(
        err.message(),
        Some("(max) needs 1 argument and more. Given 0 arguments.")
    );
}

#[test]
fn define_and_set_return_values() {
    assert_eq!(eval_text("(define x 1)"), "x");
    assert_eq!(eval_text("(define (f) 1)"), "f");
    assert_eq!(expect_number(&eval("(define x 1) (set! x 2)")), 1.0);
    assert_eq!(expect_number(&eval("(define x 1) (set! x 2) x")), 2.0);
}

#[test]
fn let_shadows_without_leaking() {
    let text = eval_text("(define a 100) (list (let ((a 1) (b 2)) (+ a b)) a)");
    assert_eq!(text, "(3 100)");
    assert!(eval("(let ((a)) a)").is_nil());
}

#[test]
fn conditionals() {
    assert_eq!(expect_string(&eval(r#"(if (< 1 2) "yes" "no")"#)), "yes");
    let value = eval(
        r#"
        (define n 5)
        (cond ((< n 3) "small") ((< n 10) "medium") (else "large"))
        "#,
    );
    assert_eq!(expect_string(&value), "medium");
    assert!(eval("(cond ((= 1 2) 1))").is_nil());
    let err = eval_error("(if 1 2 3)");
    assert_eq!(err.tag(), Some("@not-boolean"));
}

#[test]
fn if_needs_else_only_when_false() {
    assert_eq!(expect_string(&eval(r#"(if (= 1 1) "yes")"#)), "yes");
    let err = eval_error(r#"(if (= 1 2) "yes")"#);
    assert_eq!(err.tag(), Some("@insufficient-arguments"));
    assert_eq!(
        err.message(),
        Some("(if) needs 3 arguments. Given 2 arguments.")
    );
    let err = eval_error("(if)");
    assert_eq!(err.tag(), Some("@insufficient-arguments"));
}

#[test]
fn boolean_operators() {
    assert!(expect_bool(&eval("(and (= 1 1) (= 2 2))")));
    assert!(!expect_bool(&eval("(and (= 1 2) undefined)")));
    assert!(expect_bool(&eval("(or (= 1 2) (= 2 2))")));
    assert!(expect_bool(&eval("(or (= 1 1) undefined)")));
    assert!(!expect_bool(&eval("(not #t)")));
}

#[test]
fn loops_iterate() {
    let value = eval("(define total 0) (for (x '(1 2 3)) (set! total (+ total x))) total");
    assert_eq!(expect_number(&value), 6.0);
    let value = eval(r#"(define s "") (for (c "abc") (set! s (string-append c s))) s"#);
    assert_eq!(expect_string(&value), "cba");
    let value = eval("(define i 0) (while (< i 5) (inc! i)) i");
    assert_eq!(expect_number(&value), 5.0);
}

#[test]
fn begin_returns_last_value() {
    let (value, output) = eval_output(r#"(begin (display "a") (display "b") 3)"#);
    assert_eq!(output, "a\nb\n");
    assert_eq!(expect_number(&value), 3.0);
    assert!(eval("(begin)").is_nil());
}

#[test]
fn list_operations() {
    assert_eq!(expect_number(&eval("(car '(1 2 3))")), 1.0);
    assert_eq!(eval_text("(cdr '(1 2 3))"), "(2 3)");
    assert_eq!(eval_text("(append '(1 2) '(3 4) '(5))"), "(1 2 3 4 5)");
    assert_eq!(eval_text("(append '(1) 2)"), "(1 . 2)");
    assert_eq!(expect_number(&eval("(length '(1 2 3))")), 3.0);
    assert_eq!(expect_number(&eval("(length '(1 2 . 3))")), 3.0);
    assert_eq!(expect_number(&eval("(length '())")), 0.0);
    assert_eq!(expect_number(&eval("(length 5)")), 1.0);
    assert_eq!(eval_text(r#"(list-replace '(1 2 3) 1 "x")"#), r#"(1 "x" 3)"#);
    assert_eq!(eval_text("(list-remove '(1 2 3) -1)"), "(1 2)");
    assert_eq!(expect_number(&eval("(search 2 '(1 2 3))")), 1.0);
    assert!(eval("(search 9 '(1 2 3))").is_nil());
    assert_eq!(eval_text("(range 4)"), "(0 1 2 3)");
    assert_eq!(expect_number(&eval("(back '(1 2 3))")), 3.0);
    assert_eq!(eval_text("(push-front '(1 2) 0)"), "(0 1 2)");
    assert_eq!(eval_text("(push-back '(1 2) 3)"), "(1 2 3)");
    assert_eq!(eval_text("(pop-front '(1 2 3))"), "(2 3)");
    assert_eq!(eval_text("(pop-back '(1 2 3))"), "(1 2)");
    let err = eval_error("(car '())");
    assert_eq!(err.tag(), Some("@not-pair"));
}

#[test]
fn returned_lists_are_independent_copies() {
    let text = eval_text(
        r#"
        (define xs '(1 2 3))
        (define ys (list-replace xs 0 9))
        (list xs ys)
        "#,
    );
    assert_eq!(text, "((1 2 3) (9 2 3))");
}

#[test]
fn long_lists_do_not_exhaust_the_stack() {
    let value = eval("(define big (range 100000)) (length big)");
    assert_eq!(expect_number(&value), 100000.0);
}

#[test]
fn string_operations() {
    assert_eq!(
        expect_string(&eval(r#"(string-append "Hello " "World " 123)"#)),
        "Hello World 123"
    );
    assert_eq!(
        eval_text(r#"(string-split "aaa,bbb,ccc" ",")"#),
        r#"("aaa" "bbb" "ccc")"#
    );
    let err = eval_error(r#"(string-split "abc" "")"#);
    assert_eq!(err.tag(), Some("@runtime-error"));
}

#[test]
fn type_predicates_are_variadic() {
    assert!(expect_bool(&eval("(number? 1 2 3)")));
    assert!(!expect_bool(&eval(r#"(number? 1 "a")"#)));
    assert!(expect_bool(&eval("(procedure? car (lambda () 1))")));
    assert!(expect_bool(&eval("(function? (lambda () 1))")));
    assert!(!expect_bool(&eval("(function? car)")));
    assert!(expect_bool(&eval("(native-function? car)")));
    assert!(expect_bool(&eval("(null? '())")));
    assert!(expect_bool(&eval("(pair? '(1 . 2))")));
    assert!(expect_bool(&eval("(symbol? 'a)")));
}

#[test]
fn equality() {
    assert!(expect_bool(&eval(r#"(equal? '(1 2 "x") '(1 2 "x"))"#)));
    assert!(!expect_bool(&eval("(= 1 1 2)")));
    assert!(expect_bool(&eval("(!= 1 1 2)")));
    assert!(expect_bool(&eval("(equal? car car)")));
}

#[test]
fn reflective_helpers() {
    assert_eq!(expect_number(&eval("(eval '(+ 1 2))")), 3.0);
    assert_eq!(eval_text(r#"(parse "(1 2 3)")"#), "(1 2 3)");
    assert!(eval(r#"(parse "")"#).is_nil());
    assert_eq!(expect_number(&eval(r#"(string->number "12.5")"#)), 12.5);
    assert_eq!(eval_text(r#"(string->symbol "abc")"#), "abc");
    assert_eq!(
        expect_number(&eval(r#"(parval "(define y 10) (* y 2)")"#)),
        20.0
    );
    assert_eq!(
        expect_string(&eval(r#"(to-string '(1 "a"))"#)),
        r#"(1 "a")"#
    );
    assert_eq!(expect_string(&eval("(number->string 1.5)")), "1.5");
}

#[test]
fn display_renders_each_kind() {
    let (_, output) = eval_output(r#"(display "Hello " 123 " " '(1 2) " " 'x)"#);
    assert_eq!(output, "Hello 123 (1 2) Symbol:x\n");
    let (value, output) = eval_output("(display car)");
    assert_eq!(output, "NativeFunction\n");
    assert_eq!(expect_string(&value), "NativeFunction");
}

#[test]
fn stdout_chains_writes() {
    let (_, output) = eval_output(r#"((stdout "Hello") " World")"#);
    assert_eq!(output, "Hello World");
}

#[test]
fn help_entries_are_available() {
    let interpreter = Interpreter::new();
    let car = interpreter.help("car").expect("car help");
    assert!(car.contains("### car ###"));
    assert_eq!(interpreter.help("ref"), interpreter.help("list-ref"));

    let text = expect_string(&eval("(help 'car)")).to_string();
    assert_eq!(text, car);
    assert_eq!(
        expect_string(&eval(r#"(help "nope")"#)),
        "Not found help of nope."
    );
    let catalog = eval("(help)");
    let catalog = expect_string(&catalog);
    assert!(catalog.contains("### car ###"));
    assert!(catalog.contains("### cdr ###"));
    assert!(catalog.find("### car ###") < catalog.find("### cdr ###"));
}

#[test]
fn file_streams_round_trip() {
    let dir = tempdir().expect("create temp dir");
    let path = path_literal(&dir.path().join("stream.txt"));
    let text = eval_text(&format!(
        r#"
        (define out (output-stream "{path}"))
        ((out "Hello ") "World\nSecond line\n")
        (out ())
        (define in (input-stream "{path}"))
        (list (in '@read-line) (in '@get) (in '@read) (in '@read))
        "#
    ));
    assert_eq!(text, r#"("Hello World" "S" "econd line\n" ())"#);
}

#[test]
fn get_reads_characters_across_buffer_refills() {
    let dir = tempdir().expect("create temp dir");
    let file = dir.path().join("wide.txt");
    let mut content = "a".repeat(8190);
    content.push_str("€x");
    fs::write(&file, content).expect("write file");
    let text = eval_text(&format!(
        r#"
        (define in (input-stream "{}"))
        (define i 0)
        (while (< i 8190) (in '@get) (inc! i))
        (list (in '@get) (in '@get) (in '@get))
        "#,
        path_literal(&file)
    ));
    assert_eq!(text, r#"("€" "x" ())"#);
}

#[test]
fn closed_streams() {
    let dir = tempdir().expect("create temp dir");
    let path = path_literal(&dir.path().join("closed.txt"));
    let err = eval_error(&format!(
        r#"
        (define out (output-stream "{path}"))
        (out ())
        (out "late")
        "#
    ));
    assert_eq!(err.tag(), Some("@not-open-stream"));

    let value = eval(&format!(
        r#"
        (define in (input-stream "{path}"))
        (in ())
        (in '@read-line)
        "#
    ));
    assert!(value.is_nil());

    let missing = path_literal(&dir.path().join("missing.txt"));
    let err = eval_error(&format!(r#"(input-stream "{missing}")"#));
    assert_eq!(err.tag(), Some("@not-open-stream"));
}

#[test]
fn import_evaluates_file_in_caller_scope() {
    let dir = tempdir().expect("create temp dir");
    let library = dir.path().join("library.scm");
    fs::write(&library, "(define (square x) (* x x))\n(define imported 42)\n")
        .expect("write library");
    let value = eval(&format!(
        r#"(import "{}") (+ imported (square 3))"#,
        path_literal(&library)
    ));
    assert_eq!(expect_number(&value), 51.0);
}

#[test]
fn host_natives_join_the_global_scope() {
    let mut interpreter = Interpreter::new();
    interpreter.add_native_function(
        "twice",
        "### twice ###\n\nDoubles a number.",
        |_this, caller, list| {
            let operand = list.iter().nth(1).cloned().unwrap_or_default();
            let value = caller.evaluate(&operand)?;
            let number = value
                .as_number()
                .ok_or_else(|| Exception::new("@not-number", "twice needs a number"))?;
            Ok(Object::Number(number * 2.0))
        },
    );
    let value = interpreter
        .eval_source("(twice (+ 20 1))")
        .expect("host native should run");
    assert_eq!(expect_number(&value), 42.0);
    assert!(interpreter.help("twice").is_some());

    interpreter.add_documented_function(
        "board-size",
        &Doc {
            usage: "(board-size)",
            description: "Number of squares on a chess board.",
            example: "(board-size)\n;; > 64",
        },
        |_this, _caller, _list| Ok(Object::Number(64.0)),
    );
    let value = interpreter.eval_source("(board-size)").expect("documented native");
    assert_eq!(expect_number(&value), 64.0);
    let help = interpreter.help("board-size").expect("board-size help");
    assert!(help.starts_with("### board-size ###"));
    assert!(help.contains("    ;; > 64"));

    interpreter.add_help("engine", "Notes about the host engine.");
    let text = interpreter
        .eval_source(r#"(help "engine")"#)
        .expect("help lookup");
    assert_eq!(expect_string(&text), "Notes about the host engine.");
}

#[test]
fn procedures_evaluate_in_their_own_scope() {
    let mut interpreter = Interpreter::new();
    let closure = interpreter
        .eval_source("(define (make) (let ((secret 7)) (lambda () secret))) (make)")
        .expect("closure");
    let value = closure
        .evaluate(&Object::symbol("secret"))
        .expect("captured binding");
    assert_eq!(expect_number(&value), 7.0);
    assert!(Object::Number(1.0).evaluate(&Object::Nil).is_err());
}

#[test]
fn conval_conses_then_evaluates() {
    assert_eq!(expect_number(&eval("(define a '(1 2 3)) (conval + a)")), 6.0);
    assert_eq!(eval_text("(conval 'list '(4 5))"), "(4 5)");
    let err = eval_error("(conval +)");
    assert_eq!(err.tag(), Some("@insufficient-arguments"));
}

fn on_large_stack<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(work)
        .expect("spawn")
        .join()
        .expect("join")
}

#[test]
fn depth_limits_belong_to_each_interpreter() {
    let (shallow, deep) = on_large_stack(|| {
        let source = "(define (count n) (if (= n 0) 0 (+ 1 (count (- n 1))))) (count 400)";
        let mut limited = Interpreter::new();
        let mut default = Interpreter::new();
        limited.set_max_depth(100);
        assert_eq!(default.max_depth(), sayulisp::runtime::DEFAULT_MAX_DEPTH);
        let shallow = limited.eval_source(source).map(|v| v.to_string());
        let deep = default.eval_source(source).map(|v| v.to_string());
        (
            shallow.map_err(|err| err.tag().map(str::to_string)),
            deep.map_err(|err| err.to_string()),
        )
    });
    assert_eq!(shallow, Err(Some("@runtime-error".to_string())));
    assert_eq!(deep.as_deref(), Ok("400"));
}

#[test]
fn runaway_recursion_is_an_error() {
    let outcome = on_large_stack(|| {
        let mut interpreter = Interpreter::new();
        let err = interpreter
            .eval_source("(define (forever n) (forever n)) (forever 1)")
            .expect_err("recursion should hit the limit");
        let recovered = interpreter.eval_source("(+ 1 2)").ok().map(|v| v.to_string());
        (err.tag().map(str::to_string), recovered)
    });
    assert_eq!(outcome.0.as_deref(), Some("@runtime-error"));
    assert_eq!(outcome.1.as_deref(), Some("3"));
}
