use std::error;
use std::fmt::{self, Debug, Display};

use crate::{OpT, ParT, Span, ValSpan};

pub type Result<T> = std::result::Result<T, Error>;

pub trait UserFacing: Sized + Debug + Display {
    fn spans(&self) -> Vec<Span>;
}

/// A diagnostic produced while lexing, parsing or evaluating a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    // lex
    InvalidChar(Span),
    InvalidNumberFormat(Span),
    InvalidTextChar(char, Span),
    MissingClosingQuote(Span),
    UnpairedNot(Span),
    // parse
    ExpectedCondition(Span),
    ExpectedMathExpr(Span),
    ExpectedTextExpr(Span),
    ExpectedBoolExpr(Span),
    ExpectedRelOp(Span),
    ExpectedTextOp(Span),
    ExpectedInOp(Span),
    ExpectedNumber(Span),
    ExpectedIdent(Span),
    ExpectedIndex(Span),
    ExpectedOp(OpT, Span),
    ExpectedPar(ParT, Span),
    ExpectedComma(Span),
    UnexpectedToken(Span),
    // eval
    ExpectedBool(ValSpan),
    ExpectedNum(ValSpan),
    ExpectedList(Span),
    CannotAccessField(String, Span),
    CannotIndex(String, Span),
    UnresolvedTag(String, Span),
    UnknownFun(String, Span),
    FunFailed {
        name: String,
        cause: String,
        span: Span,
    },
    InvalidNullComparison(Span),
    AddOverflow(ValSpan, ValSpan),
    SubOverflow(ValSpan, ValSpan),
    MulOverflow(ValSpan, ValSpan),
    NegOverflow(ValSpan),
    DivideByZero(ValSpan, ValSpan),
    RemainderByZero(ValSpan, ValSpan),
}

impl error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar(_) => write!(f, "Unrecognized character"),
            Self::InvalidNumberFormat(_) => write!(f, "Invalid number format"),
            Self::InvalidTextChar(c, _) => {
                write!(f, "Invalid character '{}' in text literal", c.escape_default())
            }
            Self::MissingClosingQuote(_) => write!(f, "Missing closing quote"),
            Self::UnpairedNot(_) => write!(f, "Expected IN, LIKE or ILIKE after NOT"),
            Self::ExpectedCondition(_) => write!(f, "Expected a condition"),
            Self::ExpectedMathExpr(_) => write!(f, "Expected a numeric expression"),
            Self::ExpectedTextExpr(_) => write!(f, "Expected a text expression"),
            Self::ExpectedBoolExpr(_) => write!(f, "Expected a boolean expression"),
            Self::ExpectedRelOp(_) => write!(f, "Expected a relational operator"),
            Self::ExpectedTextOp(_) => write!(f, "Expected a text match operator"),
            Self::ExpectedInOp(_) => write!(f, "Expected IN or NOT IN"),
            Self::ExpectedNumber(_) => write!(f, "Expected a number literal"),
            Self::ExpectedIdent(_) => write!(f, "Expected an identifier"),
            Self::ExpectedIndex(_) => write!(f, "Expected a list index"),
            Self::ExpectedOp(o, _) => write!(f, "Expected '{o}'"),
            Self::ExpectedPar(p, _) => write!(f, "Expected '{p}'"),
            Self::ExpectedComma(_) => write!(f, "Expected ','"),
            Self::UnexpectedToken(_) => write!(f, "Unexpected token"),
            Self::ExpectedBool(v) => {
                write!(f, "Expected a bool found '{v}' of type {}", v.type_name())
            }
            Self::ExpectedNum(v) => {
                write!(f, "Expected a number found '{v}' of type {}", v.type_name())
            }
            Self::ExpectedList(_) => {
                write!(f, "The right-hand side of IN must resolve to a list")
            }
            Self::CannotAccessField(name, _) => {
                write!(f, "Cannot access field '{name}' of a non-object value")
            }
            Self::CannotIndex(name, _) => {
                write!(f, "Cannot index into '{name}', which is not a list")
            }
            Self::UnresolvedTag(name, _) => write!(f, "Unresolved instance tag '@{name}'"),
            Self::UnknownFun(name, _) => write!(f, "Unknown function: {name}"),
            Self::FunFailed { name, cause, .. } => {
                write!(f, "Function execution failed: {name}: {cause}")
            }
            Self::InvalidNullComparison(_) => {
                write!(f, "Invalid operator is used to compare with a null value")
            }
            Self::AddOverflow(_, _) => write!(f, "Addition would overflow"),
            Self::SubOverflow(_, _) => write!(f, "Subtraction would overflow"),
            Self::MulOverflow(_, _) => write!(f, "Multiplication would overflow"),
            Self::NegOverflow(_) => write!(f, "Negation would overflow"),
            Self::DivideByZero(_, _) => write!(f, "Attempted to divide by 0"),
            Self::RemainderByZero(_, _) => {
                write!(f, "Attempted to calculate the remainder with a divisor of 0")
            }
        }
    }
}

impl UserFacing for Error {
    fn spans(&self) -> Vec<Span> {
        match self {
            Self::InvalidChar(s) => vec![*s],
            Self::InvalidNumberFormat(s) => vec![*s],
            Self::InvalidTextChar(_, s) => vec![*s],
            Self::MissingClosingQuote(s) => vec![*s],
            Self::UnpairedNot(s) => vec![*s],
            Self::ExpectedCondition(s) => vec![*s],
            Self::ExpectedMathExpr(s) => vec![*s],
            Self::ExpectedTextExpr(s) => vec![*s],
            Self::ExpectedBoolExpr(s) => vec![*s],
            Self::ExpectedRelOp(s) => vec![*s],
            Self::ExpectedTextOp(s) => vec![*s],
            Self::ExpectedInOp(s) => vec![*s],
            Self::ExpectedNumber(s) => vec![*s],
            Self::ExpectedIdent(s) => vec![*s],
            Self::ExpectedIndex(s) => vec![*s],
            Self::ExpectedOp(_, s) => vec![*s],
            Self::ExpectedPar(_, s) => vec![*s],
            Self::ExpectedComma(s) => vec![*s],
            Self::UnexpectedToken(s) => vec![*s],
            Self::ExpectedBool(v) => vec![v.span],
            Self::ExpectedNum(v) => vec![v.span],
            Self::ExpectedList(s) => vec![*s],
            Self::CannotAccessField(_, s) => vec![*s],
            Self::CannotIndex(_, s) => vec![*s],
            Self::UnresolvedTag(_, s) => vec![*s],
            Self::UnknownFun(_, s) => vec![*s],
            Self::FunFailed { span, .. } => vec![*span],
            Self::InvalidNullComparison(s) => vec![*s],
            Self::AddOverflow(a, b) => vec![a.span, b.span],
            Self::SubOverflow(a, b) => vec![a.span, b.span],
            Self::MulOverflow(a, b) => vec![a.span, b.span],
            Self::NegOverflow(v) => vec![v.span],
            Self::DivideByZero(a, b) => vec![a.span, b.span],
            Self::RemainderByZero(a, b) => vec![a.span, b.span],
        }
    }
}

/// The error surfaced by the public entry points.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The caller handed over something unusable before any parsing started.
    #[error("{0}")]
    Argument(String),
    /// One or more lexical or syntactic diagnostics, reported together.
    #[error("Failed to parse query: {}", .0.join("; "))]
    Parse(Vec<String>),
    /// Evaluation of a well-formed query failed.
    #[error("Error evaluating query '{query}': {source}")]
    Evaluation {
        query: String,
        #[source]
        source: Error,
    },
}

impl QueryError {
    pub(crate) fn from_parse_errors(errors: &[Error]) -> Self {
        let msgs = errors
            .iter()
            .map(|e| {
                let pos = e
                    .spans()
                    .first()
                    .map(|s| s.start)
                    .unwrap_or(crate::Pos::new(0, 0));
                format!("Syntax error at line {}:{} - {e}", pos.line + 1, pos.col)
            })
            .collect();
        Self::Parse(msgs)
    }
}
