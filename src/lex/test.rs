use crate::{Context, Error, Span, Value};

use super::*;

fn assert(input: &str, expected: Vec<Token>) {
    let tokens = Context::default().lex(input).unwrap();
    assert_eq!(expected, tokens);
}

fn assert_err(input: &str, expected: Error) {
    let mut ctx = Context::default();
    match ctx.lex(input) {
        Ok(_) if !ctx.errors.is_empty() => assert_eq!(expected, ctx.errors[0]),
        Ok(t) => panic!("Expected error: {expected:?}, found tokens: {t:?}"),
        Err(e) => assert_eq!(expected, e),
    }
}

#[test]
fn between_op() {
    assert(
        "age >=< [18, 65]",
        vec![
            Token::ident("age", Span::cols(0, 0, 3)),
            Token::op(OpT::Between, Span::cols(0, 4, 7)),
            Token::par(ParT::SquareOpen, Span::pos(0, 8)),
            Token::val(Value::Int(18), Span::cols(0, 9, 11)),
            Token::pct(PctT::Comma, Span::pos(0, 11)),
            Token::val(Value::Int(65), Span::cols(0, 13, 15)),
            Token::par(ParT::SquareClose, Span::pos(0, 15)),
        ],
    );
}

#[test]
fn membership_ops() {
    assert(
        "a >+< [1] OR b <> [2]",
        vec![
            Token::ident("a", Span::pos(0, 0)),
            Token::op(OpT::In, Span::cols(0, 2, 5)),
            Token::par(ParT::SquareOpen, Span::pos(0, 6)),
            Token::val(Value::Int(1), Span::pos(0, 7)),
            Token::par(ParT::SquareClose, Span::pos(0, 8)),
            Token::kw(KwT::Or, Span::cols(0, 10, 12)),
            Token::ident("b", Span::pos(0, 13)),
            Token::op(OpT::NotIn, Span::cols(0, 15, 17)),
            Token::par(ParT::SquareOpen, Span::pos(0, 18)),
            Token::val(Value::Int(2), Span::pos(0, 19)),
            Token::par(ParT::SquareClose, Span::pos(0, 20)),
        ],
    );
}

#[test]
fn not_in_spelling() {
    assert(
        "x NOT IN [1]",
        vec![
            Token::ident("x", Span::pos(0, 0)),
            Token::op(OpT::NotIn, Span::cols(0, 2, 8)),
            Token::par(ParT::SquareOpen, Span::pos(0, 9)),
            Token::val(Value::Int(1), Span::pos(0, 10)),
            Token::par(ParT::SquareClose, Span::pos(0, 11)),
        ],
    );
}

#[test]
fn longest_match_like_ops() {
    assert(
        "a !~~ 'x%'",
        vec![
            Token::ident("a", Span::pos(0, 0)),
            Token::op(OpT::NotILike, Span::cols(0, 2, 5)),
            Token::val(Value::Str("x%".into()), Span::cols(0, 6, 10)),
        ],
    );
}

#[test]
fn keywords_case_insensitive() {
    assert(
        "true And OR nuLL",
        vec![
            Token::val(Value::Bool(true), Span::cols(0, 0, 4)),
            Token::kw(KwT::And, Span::cols(0, 5, 8)),
            Token::kw(KwT::Or, Span::cols(0, 9, 11)),
            Token::val(Value::Null, Span::cols(0, 12, 16)),
        ],
    );
}

#[test]
fn alphabetic_rel_op() {
    assert(
        "a GTE 5",
        vec![
            Token::ident("a", Span::pos(0, 0)),
            Token::op(OpT::Ge, Span::cols(0, 2, 5)),
            Token::val(Value::Int(5), Span::pos(0, 6)),
        ],
    );
}

#[test]
fn dot_path_and_float() {
    assert(
        "a.b 1.5",
        vec![
            Token::ident("a", Span::pos(0, 0)),
            Token::op(OpT::Dot, Span::pos(0, 1)),
            Token::ident("b", Span::pos(0, 2)),
            Token::val(Value::Float(1.5), Span::cols(0, 4, 7)),
        ],
    );
}

#[test]
fn dollar_ident_and_instance_tag() {
    assert(
        "$x[@first]",
        vec![
            Token::ident("$x", Span::cols(0, 0, 2)),
            Token::par(ParT::SquareOpen, Span::pos(0, 2)),
            Token::tag("first", Span::cols(0, 3, 9)),
            Token::par(ParT::SquareClose, Span::pos(0, 9)),
        ],
    );
}

#[test]
fn text_literal_keeps_wildcards() {
    assert(
        "'%n D%'",
        vec![Token::val(Value::Str("%n D%".into()), Span::cols(0, 0, 7))],
    );
}

#[test]
fn invalid_char() {
    assert_err("age & 5", Error::InvalidChar(Span::pos(0, 4)));
}

#[test]
fn invalid_number() {
    assert_err("12a", Error::InvalidNumberFormat(Span::cols(0, 0, 3)));
}

#[test]
fn missing_closing_quote() {
    assert_err("name ~ 'abc", Error::MissingClosingQuote(Span::pos(0, 7)));
}

#[test]
fn unpaired_not() {
    assert_err("x NOT 5", Error::UnpairedNot(Span::cols(0, 2, 5)));
}

#[test]
fn invalid_text_char_is_collected() {
    let mut ctx = Context::default();
    let tokens = ctx.lex("'a-b'").unwrap();
    assert_eq!(1, tokens.len());
    assert_eq!(
        Error::InvalidTextChar('-', Span::pos(0, 2)),
        ctx.errors[0]
    );
}
