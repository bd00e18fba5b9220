use crate::ast::{Expr, InfixOp, PrefixOp, Stmt};
use crate::lexer::Scanner;

use super::Parser;

fn parse(src: &str) -> Vec<Stmt> {
    let tokens = Scanner::new(src).scan_tokens().expect("lex ok");
    Parser::new(tokens).parse_program().expect("parse ok").statements
}

#[test]
fn parses_integer_arithmetic() {
    let stmts = parse("1 + 2;");
    assert_eq!(
        stmts,
        vec![Stmt::ExpressionStatement(Expr::Infix {
            left: Box::new(Expr::IntegerLiteral(1)),
            operator: InfixOp::Add,
            right: Box::new(Expr::IntegerLiteral(2)),
        })]
    );
}

#[test]
fn precedence_groups_product_tighter_than_sum() {
    let stmts = parse("1 + 2 * 3;");
    assert_eq!(
        stmts,
        vec![Stmt::ExpressionStatement(Expr::Infix {
            left: Box::new(Expr::IntegerLiteral(1)),
            operator: InfixOp::Add,
            right: Box::new(Expr::Infix {
                left: Box::new(Expr::IntegerLiteral(2)),
                operator: InfixOp::Mul,
                right: Box::new(Expr::IntegerLiteral(3)),
            }),
        })]
    );
}

#[test]
fn parses_let_and_assign_statements() {
    let stmts = parse("let x = 1; x = 2;");
    assert_eq!(
        stmts,
        vec![
            Stmt::LetStatement {
                name: "x".to_string(),
                value: Expr::IntegerLiteral(1),
            },
            Stmt::AssignStatement {
                ident: "x".to_string(),
                right_value: Expr::IntegerLiteral(2),
            },
        ]
    );
}

#[test]
fn parses_prefix_operators() {
    let stmts = parse("-5; !true;");
    assert_eq!(
        stmts,
        vec![
            Stmt::ExpressionStatement(Expr::Prefix {
                operator: PrefixOp::Minus,
                right: Box::new(Expr::IntegerLiteral(5)),
            }),
            Stmt::ExpressionStatement(Expr::Prefix {
                operator: PrefixOp::Bang,
                right: Box::new(Expr::BooleanLiteral(true)),
            }),
        ]
    );
}

#[test]
fn parses_if_else_expression() {
    let stmts = parse("if (true) { 10 } else { 20 };");
    match &stmts[0] {
        Stmt::ExpressionStatement(Expr::If {
            consequence,
            alternative,
            ..
        }) => {
            assert_eq!(consequence.len(), 1);
            assert!(alternative.is_some());
        }
        other => panic!("expected if expression, got {other:?}"),
    }
}

#[test]
fn parses_function_literal_with_params() {
    let stmts = parse("fn(a, b) { a + b };");
    match &stmts[0] {
        Stmt::ExpressionStatement(Expr::FunctionLiteral {
            parameters, name, ..
        }) => {
            assert_eq!(parameters, &vec!["a".to_string(), "b".to_string()]);
            assert_eq!(name, &None);
        }
        other => panic!("expected function literal, got {other:?}"),
    }
}

#[test]
fn parses_call_expression() {
    let stmts = parse("add(1, 2 * 3);");
    match &stmts[0] {
        Stmt::ExpressionStatement(Expr::Call { arguments, .. }) => {
            assert_eq!(arguments.len(), 2);
        }
        other => panic!("expected call expression, got {other:?}"),
    }
}

#[test]
fn parses_array_and_index() {
    let stmts = parse("[1, 2, 3][1 + 1];");
    match &stmts[0] {
        Stmt::ExpressionStatement(Expr::Index { left, index }) => {
            assert!(matches!(**left, Expr::ArrayLiteral(_)));
            assert!(matches!(**index, Expr::Infix { .. }));
        }
        other => panic!("expected index expression, got {other:?}"),
    }
}

#[test]
fn parses_hash_literal() {
    let stmts = parse(r#"{"one": 1, "two": 2};"#);
    match &stmts[0] {
        Stmt::ExpressionStatement(Expr::HashLiteral(pairs)) => {
            assert_eq!(pairs.len(), 2);
        }
        other => panic!("expected hash literal, got {other:?}"),
    }
}

#[test]
fn parses_while_loop() {
    let stmts = parse("let i = 0; while (i < 3) { i = i + 1; } i;");
    assert!(matches!(stmts[1], Stmt::WhileStatement { .. }));
}

#[test]
fn parses_for_loop() {
    let stmts = parse("for (let i = 0; i < 3; i = i + 1) { i; }");
    assert!(matches!(stmts[0], Stmt::ForStatement { .. }));
}

#[test]
fn parses_import_statement() {
    let stmts = parse(r#"import "util.rivet";"#);
    assert_eq!(
        stmts,
        vec![Stmt::ImportStatement {
            file_path: "util.rivet".to_string()
        }]
    );
}

#[test]
fn parses_return_statement() {
    let stmts = parse("return 42;");
    assert_eq!(stmts, vec![Stmt::ReturnStatement(Expr::IntegerLiteral(42))]);
}
