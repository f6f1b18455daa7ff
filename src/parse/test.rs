use crate::{Error, Span};

use super::*;

fn parse_ok(input: &str) -> Pred {
    let (res, ctx) = crate::parse(input);
    if let Some(e) = ctx.errors.first() {
        panic!("unexpected error: {e:?}");
    }
    res.unwrap()
}

fn parse_err(input: &str) -> Error {
    let (_, ctx) = crate::parse(input);
    match ctx.errors.first() {
        Some(e) => e.clone(),
        None => panic!("expected an error"),
    }
}

fn cond(pred: Pred) -> Cond {
    match pred.typ {
        PredT::Cond(c) => c,
        t => panic!("expected a plain condition, found {t:?}"),
    }
}

#[test]
fn or_and_equal_precedence() {
    let pred = parse_ok("a == 1 OR b == 2 AND c == 3");
    match pred.typ {
        PredT::And(lhs, _) => assert!(matches!(lhs.typ, PredT::Or(_, _))),
        t => panic!("expected and at the root, found {t:?}"),
    }
}

#[test]
fn parens_group_predications() {
    let pred = parse_ok("a == 1 OR (b == 2 AND c == 3)");
    match pred.typ {
        PredT::Or(_, rhs) => assert!(matches!(rhs.typ, PredT::And(_, _))),
        t => panic!("expected or at the root, found {t:?}"),
    }
}

#[test]
fn arithmetic_precedence() {
    let c = cond(parse_ok("x + 2 * 3 == 7"));
    match c.typ {
        CondT::Rel { lhs, .. } => match lhs.typ {
            MathExprT::Add(a, b) => {
                assert!(matches!(a.typ, MathExprT::Path(_)));
                assert!(matches!(b.typ, MathExprT::Mul(_, _)));
            }
            t => panic!("expected addition at the top, found {t:?}"),
        },
        t => panic!("expected a relational condition, found {t:?}"),
    }
}

#[test]
fn power_form() {
    let c = cond(parse_ok("2 ^ 3 == 8"));
    match c.typ {
        CondT::Rel { lhs, .. } => assert!(matches!(lhs.typ, MathExprT::Pow(_, _))),
        t => panic!("expected a relational condition, found {t:?}"),
    }
}

#[test]
fn in_condition_text_list() {
    let c = cond(parse_ok("status >+< ['active', 'pending']"));
    match c.typ {
        CondT::In {
            rhs: InRhs::TextList(items),
            negated: false,
            ..
        } => assert_eq!(2, items.len()),
        t => panic!("expected a text in condition, found {t:?}"),
    }
}

#[test]
fn in_condition_math_list() {
    let c = cond(parse_ok("age <> [1, 2, 3]"));
    match c.typ {
        CondT::In {
            rhs: InRhs::MathList(items),
            negated: true,
            ..
        } => assert_eq!(3, items.len()),
        t => panic!("expected a numeric in condition, found {t:?}"),
    }
}

#[test]
fn in_condition_path_rhs() {
    let c = cond(parse_ok("status >+< allowed.states"));
    match c.typ {
        CondT::In {
            rhs: InRhs::Path(path),
            ..
        } => assert_eq!(2, path.segments.len()),
        t => panic!("expected a path in condition, found {t:?}"),
    }
}

#[test]
fn path_indices() {
    let c = cond(parse_ok("scores[1] == 20"));
    match c.typ {
        CondT::Rel { lhs, .. } => match lhs.typ {
            MathExprT::Path(path) => {
                assert_eq!(1, path.segments.len());
                assert_eq!(Some(Index::Num(1)), path.segments[0].index);
            }
            t => panic!("expected a path, found {t:?}"),
        },
        t => panic!("expected a relational condition, found {t:?}"),
    }
}

#[test]
fn instance_tag_index() {
    let c = cond(parse_ok("scores[@first] == 20"));
    match c.typ {
        CondT::Rel { lhs, .. } => match lhs.typ {
            MathExprT::Path(path) => {
                assert_eq!(Some(Index::Tag("first".into())), path.segments[0].index);
            }
            t => panic!("expected a path, found {t:?}"),
        },
        t => panic!("expected a relational condition, found {t:?}"),
    }
}

#[test]
fn null_in_text_comparison() {
    let c = cond(parse_ok("name == null"));
    match c.typ {
        CondT::TextMatch { op: TextOp::Eq, rhs, .. } => {
            assert!(matches!(rhs.typ, TextExprT::Null));
        }
        t => panic!("expected a text match, found {t:?}"),
    }
}

#[test]
fn bool_comparison() {
    let c = cond(parse_ok("isActive == true"));
    match c.typ {
        CondT::Bool(expr) => assert!(matches!(expr.typ, BoolExprT::Eq(_, _))),
        t => panic!("expected a boolean condition, found {t:?}"),
    }
}

#[test]
fn call_condition() {
    let c = cond(parse_ok("contains(text, 'World')"));
    match c.typ {
        CondT::Bool(expr) => match expr.typ {
            BoolExprT::Call(call) => {
                assert_eq!("contains", call.name);
                assert_eq!(2, call.args.len());
                assert!(matches!(call.args[0], Arg::Path(_)));
                assert!(matches!(call.args[1], Arg::Text(_)));
            }
            t => panic!("expected a call, found {t:?}"),
        },
        t => panic!("expected a boolean condition, found {t:?}"),
    }
}

#[test]
fn math_arg_spans_operators() {
    let c = cond(parse_ok("round(price * quantity) == 50"));
    match c.typ {
        CondT::Rel { lhs, .. } => match lhs.typ {
            MathExprT::Call(call) => {
                assert!(matches!(&call.args[0], Arg::Math(m) if matches!(m.typ, MathExprT::Mul(_, _))));
            }
            t => panic!("expected a call, found {t:?}"),
        },
        t => panic!("expected a relational condition, found {t:?}"),
    }
}

#[test]
fn invalid_operator_sequence() {
    assert_eq!(
        Error::UnexpectedToken(Span::pos(0, 4)),
        parse_err("age >< 10")
    );
}

#[test]
fn missing_operand() {
    assert_eq!(Error::UnexpectedToken(Span::pos(0, 4)), parse_err("age >"));
}

#[test]
fn empty_input() {
    assert_eq!(Error::ExpectedCondition(Span::pos(0, 0)), parse_err(""));
}

#[test]
fn null_outside_text_position() {
    assert_eq!(
        Error::ExpectedTextOp(Span::cols(0, 5, 8)),
        parse_err("null >=< [1, 2]")
    );
}
