use std::result;

use tracing::debug;

pub use error::*;
pub use eval::*;
pub use lex::*;
pub use parse::*;
pub use span::*;

mod error;
mod eval;
mod lex;
mod parse;
mod span;

/// Collects diagnostics while lexing and parsing a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    pub errors: Vec<Error>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Evaluates `query` against `root` with a default evaluator.
///
/// ```
/// let root = serde_json::json!({ "age": 25, "name": "John Doe" });
/// let res = objectql::evaluate(root, "age >=< [18, 65] AND name ~ 'John%'").unwrap();
/// assert!(res);
/// ```
pub fn evaluate(root: impl Into<Value>, query: &str) -> result::Result<bool, QueryError> {
    let mut evaluator = Evaluator::new(root);
    evaluate_with(&mut evaluator, query)
}

/// Evaluates `query` against a JSON document.
pub fn evaluate_json(input: &str, query: &str) -> result::Result<bool, QueryError> {
    let mut evaluator = Evaluator::from_json(input)?;
    evaluate_with(&mut evaluator, query)
}

/// Evaluates `query` with an existing evaluator, keeping its registrations.
pub fn evaluate_with(evaluator: &mut Evaluator, query: &str) -> result::Result<bool, QueryError> {
    if query.trim().is_empty() {
        return Err(QueryError::Argument("Query cannot be empty".into()));
    }

    debug!("evaluating query: {query}");
    let (pred, ctx) = parse(query);
    let pred = match pred {
        Ok(p) if ctx.errors.is_empty() => p,
        _ => return Err(QueryError::from_parse_errors(&ctx.errors)),
    };

    evaluator.eval(&pred).map_err(|e| QueryError::Evaluation {
        query: query.to_string(),
        source: e,
    })
}

/// Lexes and parses `query`, collecting diagnostics into the returned context.
pub fn parse(query: &str) -> (result::Result<Pred, ()>, Context) {
    let mut ctx = Context::new();

    let tokens = match ctx.lex(query) {
        Ok(t) => t,
        Err(e) => {
            ctx.errors.push(e);
            return (Err(()), ctx);
        }
    };

    let pred = match ctx.parse(tokens) {
        Ok(p) => p,
        Err(e) => {
            ctx.errors.push(e);
            return (Err(()), ctx);
        }
    };

    if ctx.errors.is_empty() {
        (Ok(pred), ctx)
    } else {
        (Err(()), ctx)
    }
}
