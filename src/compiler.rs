use crate::error::CompileResult;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Compile one imp source file into VM instruction text. `module` prefixes
/// every generated function and call target so separately compiled files
/// cannot collide.
pub fn compile(source: &str, module: &str) -> CompileResult<String> {
    Parser::new(Lexer::new(source), module).compile()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::compile;
    use crate::error::CompileError;

    fn compile_ok(source: &str) -> String {
        compile(source, "test").expect("program should compile")
    }

    #[test]
    fn expression_compiles_in_stack_order() {
        let out = compile_ok(
            "program def f ( ) int a int b int c a = a + b * c enddef endprogram",
        );
        assert_eq!(
            out,
            "function test.f 3\n\
             \tpush local 0\n\
             \tpush local 1\n\
             \tpush local 2\n\
             \tcall test.mult 2\n\
             \tadd\n\
             \tpop local 0\n\
             \tpush constant 0\n\
             \treturn\n"
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let out = compile_ok("program def f ( ) int a a = 9 - 3 + 1 enddef endprogram");
        assert_eq!(
            out,
            "function test.f 1\n\
             \tpush constant 9\n\
             \tpush constant 3\n\
             \tsub\n\
             \tpush constant 1\n\
             \tadd\n\
             \tpop local 0\n\
             \tpush constant 0\n\
             \treturn\n"
        );
    }

    #[test]
    fn while_not_equal_compiles_to_plain_eq() {
        let out = compile_ok(
            "program def f ( int b ) int a a = 0 while ( a != b ) a = a + 1 endwhile enddef endprogram",
        );
        assert_eq!(
            out,
            "function test.f 1\n\
             \tpush constant 0\n\
             \tpop local 0\n\
             label label0\n\
             \tpush local 0\n\
             \tpush argument 0\n\
             \teq\n\
             \tif-goto label1\n\
             \tpush local 0\n\
             \tpush constant 1\n\
             \tadd\n\
             \tpop local 0\n\
             \tgoto label0\n\
             label label1\n\
             \tpush constant 0\n\
             \treturn\n"
        );
    }

    #[test]
    fn repeat_emits_body_before_the_test() {
        let out = compile_ok(
            "program def f ( ) int a repeat a = a + 1 until ( a == 3 ) enddef endprogram",
        );
        assert_eq!(
            out,
            "function test.f 1\n\
             label label0\n\
             \tpush local 0\n\
             \tpush constant 1\n\
             \tadd\n\
             \tpop local 0\n\
             \tpush local 0\n\
             \tpush constant 3\n\
             \teq\n\
             \tnot\n\
             \tnot\n\
             \tif-goto label1\n\
             \tgoto label0\n\
             label label1\n\
             \tpush constant 0\n\
             \treturn\n"
        );
    }

    #[test]
    fn if_else_branches_on_condition_false() {
        let out = compile_ok(
            "program def f ( int a ) if ( a < 10 ) a = 1 else a = 2 endif enddef endprogram",
        );
        assert_eq!(
            out,
            "function test.f 0\n\
             \tpush argument 0\n\
             \tpush constant 10\n\
             \tlt\n\
             \tnot\n\
             \tif-goto label0\n\
             \tpush constant 1\n\
             \tpop argument 0\n\
             \tgoto label1\n\
             label label0\n\
             \tpush constant 2\n\
             \tpop argument 0\n\
             label label1\n\
             \tpush constant 0\n\
             \treturn\n"
        );
    }

    #[test]
    fn ge_and_le_compile_to_the_inverse_primitive() {
        let ge = compile_ok(
            "program def f ( int a int b ) while ( a >= b ) a = a + 1 endwhile enddef endprogram",
        );
        assert!(ge.contains("\tpush argument 1\n\tlt\n\tif-goto label1\n"));

        let le = compile_ok(
            "program def f ( int a int b ) while ( a <= b ) a = a + 1 endwhile enddef endprogram",
        );
        assert!(le.contains("\tpush argument 1\n\tgt\n\tif-goto label1\n"));
    }

    #[test]
    fn local_shadows_static() {
        let out = compile_ok("program int x def f ( ) int x x = 7 enddef endprogram");
        assert!(out.contains("\tpop local 0\n"));
        assert!(!out.contains("static"));
    }

    #[test]
    fn entry_function_gets_the_halt_idiom() {
        let out = compile_ok("program def main ( ) enddef endprogram");
        assert_eq!(
            out,
            "function test.main 0\n\
             \tpush constant 0\n\
             \treturn\n\
             label label0\n\
             \tgoto label0\n"
        );

        let other = compile_ok("program def f ( ) enddef endprogram");
        assert!(!other.contains("label"));
    }

    #[test]
    fn call_discards_result_and_callf_keeps_it() {
        let out = compile_ok(
            "program int t \
             def f ( int a ) return a enddef \
             def main ( ) t = callf f ( 1 ) call f ( 2 ) enddef \
             endprogram",
        );
        assert_eq!(
            out,
            "function test.f 0\n\
             \tpush argument 0\n\
             \treturn\n\
             \tpush constant 0\n\
             \treturn\n\
             function test.main 0\n\
             \tpush constant 1\n\
             \tcall test.f 1\n\
             \tpop static 0\n\
             \tpush constant 2\n\
             \tcall test.f 1\n\
             \tpop temp 0\n\
             \tpush constant 0\n\
             \treturn\n\
             label label0\n\
             \tgoto label0\n"
        );
    }

    #[test]
    fn recompilation_is_byte_identical() {
        let source = "program int x \
            def main ( int n ) int a \
            while ( a < n ) a = a + 1 endwhile \
            if ( a == n ) print ( a ) else print ( x ) endif \
            enddef endprogram";
        assert_eq!(compile_ok(source), compile_ok(source));
    }

    #[test]
    fn undefined_variable_reports_name_and_line() {
        let err = compile(
            "program\ndef f ( )\nx = 1\nenddef\nendprogram",
            "test",
        )
        .unwrap_err();
        match err {
            CompileError::Undefined { name, line } => {
                assert_eq!(name, "x");
                assert_eq!(line, 3);
            }
            other => panic!("expected undefined-variable error, got {other}"),
        }
    }

    #[test]
    fn redeclaration_is_rejected() {
        let err = compile("program def f ( int a ) int a enddef endprogram", "test").unwrap_err();
        match err {
            CompileError::Redefined { name, .. } => assert_eq!(name, "a"),
            other => panic!("expected redefinition error, got {other}"),
        }
    }

    #[test]
    fn syntax_error_reports_expected_and_found() {
        let err = compile(
            "program\ndef f ( )\nprint 5 )\nenddef\nendprogram",
            "test",
        )
        .unwrap_err();
        match err {
            CompileError::Syntax {
                expected,
                found,
                line,
            } => {
                assert_eq!(expected, "(");
                assert_eq!(found, "5");
                assert_eq!(line, 3);
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn invalid_token_is_rejected_in_context() {
        let err = compile(
            "program\ndef f ( )\na1 = 2\nenddef\nendprogram",
            "test",
        )
        .unwrap_err();
        match err {
            CompileError::Syntax { found, line, .. } => {
                assert_eq!(found, "a1");
                assert_eq!(line, 3);
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn keywords_cannot_name_variables() {
        let err = compile("program int while endprogram", "test").unwrap_err();
        match err {
            CompileError::Syntax {
                expected, found, ..
            } => {
                assert_eq!(expected, "variable");
                assert_eq!(found, "while");
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn oversized_constant_is_rejected() {
        let err = compile(
            "program def f ( ) int a a = 99999999999 enddef endprogram",
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::BadConstant { .. }));
    }
}
