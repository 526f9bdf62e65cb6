#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;

    fn resolve(source: &str) -> Vec<String> {
        let (tokens, _) = Scanner::new(source).scan_all();
        let (statements, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {:?}", parse_errors);

        let mut interpreter = Interpreter::with_output(std::io::sink());

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_program_resolves_cleanly() {
        let errors = resolve(
            "var a = 1;
             fun f(x) { var y = x; { var z = y; return z; } }
             class A { m() { return this; } }
             class B < A { m() { return super.m(); } }",
        );

        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_redeclaring_global_is_allowed() {
        assert!(resolve("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_redeclaring_local_in_same_scope() {
        assert_eq!(
            resolve("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_eq!(
            resolve("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_reading_local_in_own_initializer() {
        assert_eq!(
            resolve("var a = 1; { var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            resolve("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
        assert!(resolve("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve("print this;\nfun f() { return this; }"),
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_super_misuse() {
        assert_eq!(
            resolve("super.m();\nclass A { m() { super.m(); } }"),
            vec![
                "[line 1] Error at 'super': Can't use 'super' outside of a class.",
                "[line 2] Error at 'super': Can't use 'super' in a class with no superclass.",
            ]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            resolve("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_errors_are_collected_in_order() {
        let errors = resolve("return;\n{ var b; var b; }\nprint this;");

        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("[line 1]"));
        assert!(errors[1].starts_with("[line 2]"));
        assert!(errors[2].starts_with("[line 3]"));
    }
}
