mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;
    use rox::token::Token;
    use rox::value::Value;

    use crate::common::{self, SharedOutput};

    /// Runs a program expected to succeed and returns what it printed.
    fn output_of(source: &str) -> String {
        let (output, diagnostics) = common::run(source);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        output
    }

    // ── expressions ─────────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(
            output_of("print 1 + 2; print \"a\" + \"b\"; print 7 / 2; print (1 + 2) * 3 - 4;"),
            "3\nab\n3.5\n5\n"
        );
    }

    #[test]
    fn test_adding_number_and_string_is_a_runtime_error() {
        let (output, diagnostics) = common::run("print 1 + \"a\";");

        assert_eq!(output, "");
        assert_eq!(
            diagnostics,
            vec!["Operands must be two numbers or two strings.\n[line 1]"]
        );
    }

    #[test]
    fn test_only_nil_and_false_are_falsy() {
        let source = r#"
            if (0) print "0 truthy"; else print "0 falsy";
            if ("") print "empty truthy"; else print "empty falsy";
            if (nil) print "nil truthy"; else print "nil falsy";
            if (false) print "false truthy"; else print "false falsy";
            print !0;
            print !nil;
        "#;

        assert_eq!(
            output_of(source),
            "0 truthy\nempty truthy\nnil falsy\nfalse falsy\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_an_operand() {
        assert_eq!(
            output_of("print nil or \"x\"; print 1 and 2; print false and boom; print 1 or boom;"),
            "x\n2\nfalse\n1\n"
        );
    }

    #[test]
    fn test_equality() {
        let source = r#"
            print 1 == 1;
            print "a" == "a";
            print 1 == "1";
            print nil == nil;
            print nil == false;
            var n = 0 / 0;
            print n == n;
        "#;

        assert_eq!(output_of(source), "true\ntrue\nfalse\ntrue\nfalse\ntrue\n");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(output_of("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let (_, diagnostics) = common::run("print 1 < \"2\";");

        assert_eq!(diagnostics, vec!["Operands must be numbers.\n[line 1]"]);
    }

    // ── variables and scope ─────────────────────────────────────────────────

    #[test]
    fn test_shadowing_is_confined_to_the_inner_block() {
        let source = r#"
            var x = "outer";
            {
                var x = "inner";
                print x;
                x = "changed";
                print x;
            }
            print x;
        "#;

        assert_eq!(output_of(source), "inner\nchanged\nouter\n");
    }

    #[test]
    fn test_closure_binding_is_fixed_at_resolution() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, diagnostics) = common::run("print nope;");
        assert_eq!(diagnostics, vec!["Undefined variable 'nope'.\n[line 1]"]);

        let (_, diagnostics) = common::run("\nnope = 1;");
        assert_eq!(diagnostics, vec!["Undefined variable 'nope'.\n[line 2]"]);
    }

    #[test]
    fn test_loops() {
        let source = r#"
            var sum = 0;
            for (var i = 1; i <= 4; i = i + 1) sum = sum + i;
            print sum;
            var n = 3;
            while (n > 0) { print n; n = n - 1; }
        "#;

        assert_eq!(output_of(source), "10\n3\n2\n1\n");
    }

    // ── functions and closures ──────────────────────────────────────────────

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn test_closures_share_their_defining_scope() {
        let source = r#"
            var inc;
            var get;
            fun make() {
                var n = 0;
                fun i() { n = n + 1; }
                fun g() { return n; }
                inc = i;
                get = g;
            }
            make();
            inc();
            inc();
            print get();
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_counter_closure_keeps_state() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
        "#;

        assert_eq!(output_of(source), "1\n2\n1\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_return_from_inside_loop() {
        let source = r#"
            fun first(limit) {
                var i = 0;
                while (true) {
                    if (i >= limit) return i;
                    i = i + 1;
                }
            }
            print first(4);
        "#;

        assert_eq!(output_of(source), "4\n");
    }

    #[test]
    fn test_call_errors() {
        let (_, diagnostics) = common::run("fun f(a, b) {} f(1);");
        assert_eq!(diagnostics, vec!["Expected 2 arguments but got 1.\n[line 1]"]);

        let (_, diagnostics) = common::run("\"text\"();");
        assert_eq!(diagnostics, vec!["Can only call functions and classes.\n[line 1]"]);
    }

    #[test]
    fn test_display_of_callables() {
        let source = r#"
            fun f() {}
            class A {}
            print f;
            print A;
            print A();
            print clock;
        "#;

        assert_eq!(output_of(source), "<fn f>\nA\nA instance\n<native fn>\n");
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }

    // ── classes ─────────────────────────────────────────────────────────────

    #[test]
    fn test_fields_and_bound_methods() {
        let source = r#"
            class Person {
                greet() { print "hi " + this.name; }
            }
            var p = Person();
            p.name = "ada";
            var greet = p.greet;
            p.name = "grace";
            greet();
        "#;

        assert_eq!(output_of(source), "hi grace\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            print a.m();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(output_of(source), "method\nfield\n");
    }

    #[test]
    fn test_init_returns_instance_even_after_bare_return() {
        let source = r#"
            class Foo {
                init(x) {
                    this.x = x;
                    if (x > 0) return;
                    this.x = -1;
                }
            }
            var f = Foo(5);
            print f.x;
            print f.init(0).x;
            print f.init(7) == f;
        "#;

        assert_eq!(output_of(source), "5\n-1\ntrue\n");
    }

    #[test]
    fn test_class_arity_follows_init() {
        let (_, diagnostics) = common::run("class A { init(a, b) {} } A(1);");
        assert_eq!(diagnostics, vec!["Expected 2 arguments but got 1.\n[line 1]"]);

        let (_, diagnostics) = common::run("class B {} B(1);");
        assert_eq!(diagnostics, vec!["Expected 0 arguments but got 1.\n[line 1]"]);
    }

    #[test]
    fn test_super_calls_keep_this_bound_to_subclass_instance() {
        let source = r#"
            class A {
                method() { print "A method"; }
                describe() { print "A sees " + this.name; }
            }
            class B < A {
                method() { print "B method"; }
                test() {
                    super.method();
                    super.describe();
                }
            }
            var b = B();
            b.name = "bee";
            b.test();
            b.method();
        "#;

        assert_eq!(output_of(source), "A method\nA sees bee\nB method\n");
    }

    #[test]
    fn test_super_resolves_from_the_defining_class() {
        let source = r#"
            class A { method() { print "A"; } }
            class B < A {
                method() { print "B"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
        "#;

        assert_eq!(output_of(source), "A\n");
    }

    #[test]
    fn test_inherited_initializer() {
        let source = r#"
            class A { init(v) { this.v = v; } }
            class B < A {}
            print B(3).v;
        "#;

        assert_eq!(output_of(source), "3\n");
    }

    #[test]
    fn test_property_errors() {
        let (_, diagnostics) = common::run("var n = 1; print n.x;");
        assert_eq!(diagnostics, vec!["Only instances have properties.\n[line 1]"]);

        let (_, diagnostics) = common::run("var n = 1; n.x = 2;");
        assert_eq!(diagnostics, vec!["Only instances have fields.\n[line 1]"]);

        let (_, diagnostics) = common::run("class A {} print A().missing;");
        assert_eq!(diagnostics, vec!["Undefined property 'missing'.\n[line 1]"]);

        let (_, diagnostics) =
            common::run("class A {} class B < A { m() { return super.nope; } } B().m();");
        assert_eq!(diagnostics, vec!["Undefined property 'nope'.\n[line 1]"]);
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, diagnostics) = common::run("var x = 1;\nclass A < x {}");

        assert_eq!(diagnostics, vec!["Superclass must be a class.\n[line 2]"]);
    }

    #[test]
    fn test_instances_compare_by_identity() {
        let source = r#"
            class A {}
            var a = A();
            var b = a;
            print a == b;
            print A() == A();
        "#;

        assert_eq!(output_of(source), "true\nfalse\n");
    }

    // ── pipeline behaviour ──────────────────────────────────────────────────

    #[test]
    fn test_two_syntax_errors_report_twice_and_do_not_execute() {
        let (output, diagnostics) = common::run("print 1;\nvar = 2;\nprint (3;\n");

        assert_eq!(output, "");
        assert_eq!(
            diagnostics,
            vec![
                "[line 2] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect ')' after expression.",
            ]
        );
    }

    #[test]
    fn test_resolution_error_prevents_execution() {
        let (output, diagnostics) = common::run("print 1;\nreturn 2;");

        assert_eq!(output, "");
        assert_eq!(
            diagnostics,
            vec!["[line 2] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_runtime_error_abandons_remaining_statements() {
        let (output, diagnostics) = common::run("print 1;\nprint -\"x\";\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(diagnostics, vec!["Operand must be a number.\n[line 2]"]);
    }

    #[test]
    fn test_rerunning_the_same_ast_is_idempotent() {
        let source = r#"
            var total = 0;
            fun add(n) { total = total + n; return total; }
            class Acc { init() { this.v = add(2); } }
            print add(1);
            print Acc().v;
        "#;

        let (tokens, _) = Scanner::new(source).scan_all();
        let (statements, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty());

        let run_once = || {
            let output = SharedOutput::default();
            let mut interpreter = Interpreter::with_output(output.clone());

            Resolver::new(&mut interpreter)
                .resolve(&statements)
                .expect("program resolves");
            interpreter.interpret(&statements).expect("program runs");

            output.contents()
        };

        let first = run_once();
        let second = run_once();

        assert_eq!(first, "1\n3\n");
        assert_eq!(first, second);
    }

    #[test]
    fn test_session_keeps_definitions_across_runs() {
        let (mut session, output) = common::session();

        session.run("var a = 1;");
        session.run("fun mk() { var local = a + 1; fun g() { return local; } return g; }");
        session.run("var g = mk();");
        session.run("print a; print g();");

        assert_eq!(output.contents(), "1\n2\n");
        assert!(!session.had_error());
    }

    #[test]
    fn test_error_flags_do_not_suppress_later_runs() {
        let (mut session, output) = common::session();

        session.run("print ;");
        assert!(session.had_error());

        session.run("print -nil;");
        assert!(session.had_runtime_error());

        session.run("print 2;");
        assert_eq!(output.contents(), "2\n");

        session.reset_errors();
        assert!(!session.had_error());
        assert!(!session.had_runtime_error());
    }

    #[test]
    fn test_runtime_error_raises_only_the_runtime_flag() {
        let (mut session, _) = common::session();

        session.run("print -nil;");

        assert!(session.had_runtime_error());
        assert!(!session.had_error());
        assert_eq!(
            session.reporter().diagnostics,
            vec!["Operand must be a number.\n[line 1]"]
        );
    }

    #[test]
    fn test_failing_block_restores_the_enclosing_scope() {
        let (mut session, output) = common::session();

        session.run("fun f() { { var x = 1; print -nil; } } f();");
        session.run("var y = 2;");
        session.run("{ fun g() { return y; } print g(); }");

        assert_eq!(output.contents(), "2\n");
        assert_eq!(
            session.reporter().diagnostics,
            vec!["Operand must be a number.\n[line 1]"]
        );

        // `y` was defined at top level, not inside the abandoned block.
        let y = session
            .interpreter_mut()
            .globals()
            .borrow()
            .get(&Token::synthetic("y", 1))
            .expect("y is global");
        assert_eq!(y, Value::Number(2.0));

        let x = session
            .interpreter_mut()
            .globals()
            .borrow()
            .get(&Token::synthetic("x", 1));
        assert!(x.is_err());
    }
}
