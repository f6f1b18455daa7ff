use serde_json::json;

use crate::{Error, QueryError};

use super::*;

fn eval_q(data: serde_json::Value, query: &str) -> bool {
    match crate::evaluate(data, query) {
        Ok(b) => b,
        Err(e) => panic!("query: {query}\n{e}"),
    }
}

#[test]
fn integer_division_stays_integral() {
    assert!(eval_q(json!({}), "7 / 2 == 3"));
    assert!(eval_q(json!({}), "7.0 / 2 == 3.5"));
}

#[test]
fn truncated_remainder() {
    assert!(eval_q(json!({}), "8 % 3 == 2"));
    assert!(eval_q(json!({}), "-8 % 3 == -2"));
    assert!(eval_q(json!({}), "8 % -5 == 3"));
}

#[test]
fn divide_by_zero() {
    match crate::evaluate(json!({}), "1 / 0 == 1") {
        Err(QueryError::Evaluation {
            source: Error::DivideByZero(_, _),
            ..
        }) => (),
        r => panic!("expected a division error, found {r:?}"),
    }
}

#[test]
fn remainder_by_zero() {
    match crate::evaluate(json!({}), "1 % 0 == 1") {
        Err(QueryError::Evaluation {
            source: Error::RemainderByZero(_, _),
            ..
        }) => (),
        r => panic!("expected a remainder error, found {r:?}"),
    }
}

#[test]
fn power_is_float_valued() {
    assert!(eval_q(json!({}), "2 ^ 3 == 8"));
    assert!(eval_q(json!({}), "2 ^ 3 == 8.0"));
    assert!(eval_q(json!({}), "1.5 ^ 2 == 2.25"));
}

#[test]
fn field_access_on_scalar_fails() {
    match crate::evaluate(json!({ "age": 25 }), "age.x == 1") {
        Err(QueryError::Evaluation {
            source: Error::CannotAccessField(name, _),
            ..
        }) => assert_eq!("x", name),
        r => panic!("expected a resolution error, found {r:?}"),
    }
}

#[test]
fn index_into_scalar_fails() {
    match crate::evaluate(json!({ "age": 25 }), "age[0] == 1") {
        Err(QueryError::Evaluation {
            source: Error::CannotIndex(name, _),
            ..
        }) => assert_eq!("age", name),
        r => panic!("expected a resolution error, found {r:?}"),
    }
}

#[test]
fn present_null_under_field_fails() {
    match crate::evaluate(json!({ "x": null }), "x.y == 1") {
        Err(QueryError::Evaluation {
            source: Error::CannotAccessField(name, _),
            ..
        }) => assert_eq!("y", name),
        r => panic!("expected a resolution error, found {r:?}"),
    }
}

#[test]
fn missing_field_is_null() {
    assert!(!eval_q(json!({ "a": { "b": 1 } }), "a.missing == 1"));
    assert!(eval_q(json!({ "a": { "b": 1 } }), "a.missing == null"));
    // the walk stops at the first missing field
    assert!(!eval_q(json!({ "a": { "b": 1 } }), "a.missing.deeper == 1"));
}

#[test]
fn out_of_bounds_index_is_null() {
    assert!(eval_q(json!({ "xs": [1, 2] }), "xs[5] == null"));
    assert!(!eval_q(json!({ "xs": [1, 2] }), "xs[5] > 0"));
}

#[test]
fn instance_tags() {
    let mut ev = Evaluator::new(json!({ "xs": [10, 20, 30] }));
    ev.register_instance_tag("second", 1);
    assert!(crate::evaluate_with(&mut ev, "xs[@second] == 20").unwrap());

    match crate::evaluate_with(&mut ev, "xs[@third] == 20") {
        Err(QueryError::Evaluation {
            source: Error::UnresolvedTag(name, _),
            ..
        }) => assert_eq!("third", name),
        r => panic!("expected an unresolved tag error, found {r:?}"),
    }
}

#[test]
fn registration_replaces() {
    let mut ev = Evaluator::new(json!({}));
    ev.register("answer", |_| Ok(Value::Int(1))).unwrap();
    ev.register("answer", |_| Ok(Value::Int(2))).unwrap();
    assert!(crate::evaluate_with(&mut ev, "answer() == 2").unwrap());
}

#[test]
fn registration_requires_name() {
    let mut ev = Evaluator::new(json!({}));
    match ev.register("  ", |_| Ok(Value::Null)) {
        Err(QueryError::Argument(_)) => (),
        r => panic!("expected an argument error, found {r:?}"),
    }
}

#[test]
fn wildcard_modes() {
    assert!(wildcard_match("John Doe", "John%"));
    assert!(wildcard_match("John Doe", "%Doe"));
    assert!(wildcard_match("John Doe", "%n D%"));
    assert!(wildcard_match("John Doe", "John Doe"));
    assert!(!wildcard_match("John Doe", "Doe%"));
    assert!(!wildcard_match("John Doe", "%John"));
    assert!(!wildcard_match("John Doe", "John"));
}

#[test]
fn bool_coercion_from_strings() {
    assert!(eval_q(json!({ "flag": "TRUE" }), "flag == true"));
    assert!(!eval_q(json!({ "flag": "active" }), "flag == true"));
    assert!(eval_q(json!({ "flag": "active" }), "flag == false"));
}

#[test]
fn substring_builtin() {
    let data = json!({ "text": "Hello World" });
    assert!(eval_q(data.clone(), "substring(text, 0, 5) == 'Hello'"));
    assert!(eval_q(data.clone(), "substring(text, 6) == 'World'"));
    assert!(eval_q(data.clone(), "substring(text, 0, 99) == 'Hello World'"));

    match crate::evaluate(data, "substring(text, 20) == 'x'") {
        Err(QueryError::Evaluation {
            source: Error::FunFailed { name, .. },
            ..
        }) => assert_eq!("substring", name),
        r => panic!("expected a function error, found {r:?}"),
    }
}

#[test]
fn length_builtin() {
    let data = json!({ "xs": [1, 2, 3], "name": "John Doe", "flag": true, "missing": null });
    assert!(eval_q(data.clone(), "length(xs) == 3"));
    assert!(eval_q(data.clone(), "length(name) == 8"));
    assert!(eval_q(data.clone(), "length(flag) == 0"));
    assert!(eval_q(data, "length(missing) == null"));
}

#[test]
fn concat_skips_null() {
    let data = json!({ "missing": null });
    assert!(eval_q(data, "concat('a', missing, 'b') == 'ab'"));
}

#[test]
fn min_max_builtins() {
    let data = json!({ "missing": null });
    assert!(eval_q(data.clone(), "min(10, 20, 5.5) == 5.5"));
    assert!(eval_q(data.clone(), "max(1, missing, 3) == 3"));

    match crate::evaluate(data, "min(missing) == 1") {
        Err(QueryError::Evaluation {
            source: Error::FunFailed { name, .. },
            ..
        }) => assert_eq!("min", name),
        r => panic!("expected a function error, found {r:?}"),
    }
}

#[test]
fn replace_is_regex_based() {
    let data = json!({ "name": "John Doe" });
    assert!(eval_q(data, "replace(name, 'o+', '0') == 'J0hn D0e'"));
}

#[test]
fn text_tests_with_ignore_case() {
    let data = json!({ "name": "John Doe" });
    assert!(!eval_q(data.clone(), "contains(name, 'JOHN')"));
    assert!(eval_q(data.clone(), "contains(name, 'JOHN', true)"));
    assert!(eval_q(data.clone(), "startsWith(name, 'john', true)"));
    assert!(eval_q(data, "endsWith(name, 'DOE', true)"));
}

#[test]
fn in_with_path_rhs() {
    let data = json!({
        "status": "active",
        "allowed": ["active", "pending"],
        "nums": [1, 2, 3],
    });
    assert!(eval_q(data.clone(), "status >+< allowed"));
    assert!(eval_q(data.clone(), "status <> nums"));

    match crate::evaluate(data, "status >+< status") {
        Err(QueryError::Evaluation {
            source: Error::ExpectedList(_),
            ..
        }) => (),
        r => panic!("expected a list error, found {r:?}"),
    }
}
