use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::{
    Arg, BoolExpr, BoolExprT, Call, Cond, CondT, Error, InLhs, InRhs, MathExpr, MathExprT, Pred,
    PredT, QueryError, RelOp, Span, TextExpr, TextExprT, TextOp,
};

pub use fun::*;
pub use val::*;

mod fun;
mod path;
#[cfg(test)]
mod test;
mod val;

/// Holds the data root, the function registry and the instance tag table,
/// and executes parsed queries against them.
///
/// An evaluator is cheap to keep around and reusing one preserves custom
/// registrations and compiled patterns. It is not meant to be shared between
/// threads, use one evaluator per thread instead.
pub struct Evaluator {
    root: Value,
    funs: Registry,
    tags: HashMap<String, usize>,
}

impl Evaluator {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            root: root.into(),
            funs: Registry::default(),
            tags: HashMap::new(),
        }
    }

    /// Parses a JSON document into the data root.
    pub fn from_json(input: &str) -> Result<Self, QueryError> {
        let json: serde_json::Value = serde_json::from_str(input).map_err(|_| {
            QueryError::Argument("The provided input is not an object nor a JSON string".into())
        })?;
        Ok(Self::new(json))
    }

    /// Registers `fun` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: &str, fun: F) -> Result<(), QueryError>
    where
        F: Fn(&[Value]) -> Result<Value, FunError> + 'static,
    {
        self.funs.register(name, fun)
    }

    /// Maps the instance tag `@name` to a list index.
    pub fn register_instance_tag(&mut self, name: &str, index: usize) {
        debug!("registered instance tag @{name} -> {index}");
        self.tags.insert(name.to_string(), index);
    }

    pub fn eval(&mut self, pred: &Pred) -> crate::Result<bool> {
        self.eval_pred(pred)
    }

    fn eval_pred(&mut self, pred: &Pred) -> crate::Result<bool> {
        match &pred.typ {
            PredT::And(a, b) => Ok(self.eval_pred(a)? && self.eval_pred(b)?),
            PredT::Or(a, b) => Ok(self.eval_pred(a)? || self.eval_pred(b)?),
            PredT::Cond(c) => self.eval_cond(c),
        }
    }

    fn eval_cond(&mut self, cond: &Cond) -> crate::Result<bool> {
        match &cond.typ {
            CondT::Between { val, lo, hi } => {
                let (val, lo, hi) = (
                    self.eval_math(val)?,
                    self.eval_math(lo)?,
                    self.eval_math(hi)?,
                );
                let (Some(v), Some(l), Some(h)) = (val, lo, hi) else {
                    return Ok(false);
                };
                let v = v.to_f64();
                Ok(l.to_f64() <= v && v <= h.to_f64())
            }
            CondT::Rel { lhs, op, rhs } => {
                let (lhs, rhs) = (self.eval_math(lhs)?, self.eval_math(rhs)?);
                let (Some(l), Some(r)) = (lhs, rhs) else {
                    return Ok(false);
                };
                Ok(match op {
                    RelOp::Eq => num_eq(l, r),
                    RelOp::Ne => !num_eq(l, r),
                    RelOp::Lt => l.to_f64() < r.to_f64(),
                    RelOp::Le => l.to_f64() <= r.to_f64(),
                    RelOp::Gt => l.to_f64() > r.to_f64(),
                    RelOp::Ge => l.to_f64() >= r.to_f64(),
                })
            }
            CondT::In { lhs, rhs, negated } => self.eval_in(lhs, rhs, *negated),
            CondT::TextMatch { lhs, op, rhs } => self.eval_text_match(lhs, *op, rhs),
            CondT::Bool(expr) => self.eval_bool_expr(expr),
        }
    }

    fn eval_in(&mut self, lhs: &InLhs, rhs: &InRhs, negated: bool) -> crate::Result<bool> {
        let present = match (lhs, rhs) {
            (InLhs::Text(lhs), InRhs::TextList(items)) => {
                let Some(l) = self.eval_text(lhs)? else {
                    return Ok(false);
                };
                let mut present = false;
                for item in items {
                    if self.eval_text(item)?.is_some_and(|s| s == l) {
                        present = true;
                    }
                }
                present
            }
            (InLhs::Text(lhs), InRhs::Path(path)) => {
                let Some(l) = self.eval_text(lhs)? else {
                    return Ok(false);
                };
                match self.resolve_path(path)? {
                    Value::Null => return Ok(false),
                    Value::List(items) => items.iter().any(|v| v.to_string() == l),
                    _ => return Err(Error::ExpectedList(path.span)),
                }
            }
            (InLhs::Math(lhs), InRhs::MathList(items)) => {
                let Some(l) = self.eval_math(lhs)? else {
                    return Ok(false);
                };
                let mut present = false;
                for item in items {
                    if self.eval_math(item)?.is_some_and(|r| num_eq(l, r)) {
                        present = true;
                    }
                }
                present
            }
            _ => unreachable!("the parser pairs in-operands by kind"),
        };

        Ok(present != negated)
    }

    fn eval_text_match(&mut self, lhs: &TextExpr, op: TextOp, rhs: &TextExpr) -> crate::Result<bool> {
        let l_lit_null = matches!(lhs.typ, TextExprT::Null);
        let r_lit_null = matches!(rhs.typ, TextExprT::Null);
        let span = Span::across(lhs.span, rhs.span);

        // a literal NULL operand turns `==` and `!=` into null checks
        if l_lit_null && r_lit_null {
            return match op {
                TextOp::Eq => Ok(true),
                TextOp::Ne => Ok(false),
                _ => Err(Error::InvalidNullComparison(span)),
            };
        }
        if l_lit_null || r_lit_null {
            let other = if l_lit_null { rhs } else { lhs };
            let val = self.eval_text(other)?;
            return match op {
                TextOp::Eq => Ok(val.is_none()),
                TextOp::Ne => Ok(val.is_some()),
                _ => Err(Error::InvalidNullComparison(span)),
            };
        }

        let (lhs, rhs) = (self.eval_text(lhs)?, self.eval_text(rhs)?);
        let (Some(l), Some(r)) = (lhs, rhs) else {
            return Ok(op == TextOp::Ne);
        };

        Ok(match op {
            TextOp::Eq => l == r,
            TextOp::Ne => l != r,
            TextOp::Like => wildcard_match(&l, &r),
            TextOp::ILike => wildcard_match(&l.to_ascii_lowercase(), &r.to_ascii_lowercase()),
            TextOp::NotLike => !wildcard_match(&l, &r),
            TextOp::NotILike => !wildcard_match(&l.to_ascii_lowercase(), &r.to_ascii_lowercase()),
        })
    }

    fn eval_bool_expr(&mut self, expr: &BoolExpr) -> crate::Result<bool> {
        match &expr.typ {
            BoolExprT::Lit(b) => Ok(*b),
            BoolExprT::Path(path) => {
                let val = self.resolve_path(path)?;
                Ok(coerce_bool(&val))
            }
            BoolExprT::Call(call) => match self.eval_call(call)? {
                Value::Bool(b) => Ok(b),
                v => Err(Error::ExpectedBool(ValSpan::new(v, call.span))),
            },
            BoolExprT::Eq(a, b) => {
                let (a, b) = (self.eval_bool_operand(a)?, self.eval_bool_operand(b)?);
                let (Some(l), Some(r)) = (a, b) else {
                    return Ok(false);
                };
                Ok(l == r)
            }
            BoolExprT::Ne(a, b) => {
                let (a, b) = (self.eval_bool_operand(a)?, self.eval_bool_operand(b)?);
                let (Some(l), Some(r)) = (a, b) else {
                    return Ok(false);
                };
                Ok(l != r)
            }
        }
    }

    /// Boolean reading of a comparison operand, `None` if it is null.
    fn eval_bool_operand(&mut self, expr: &BoolExpr) -> crate::Result<Option<bool>> {
        match &expr.typ {
            BoolExprT::Lit(b) => Ok(Some(*b)),
            BoolExprT::Path(path) => match self.resolve_path(path)? {
                Value::Null => Ok(None),
                v => Ok(Some(coerce_bool(&v))),
            },
            BoolExprT::Call(call) => match self.eval_call(call)? {
                Value::Null => Ok(None),
                v => Ok(Some(coerce_bool(&v))),
            },
            BoolExprT::Eq(_, _) | BoolExprT::Ne(_, _) => Ok(Some(self.eval_bool_expr(expr)?)),
        }
    }

    fn eval_text(&mut self, expr: &TextExpr) -> crate::Result<Option<String>> {
        match &expr.typ {
            TextExprT::Lit(s) => Ok(Some(s.clone())),
            TextExprT::Null => Ok(None),
            TextExprT::Path(path) => match self.resolve_path(path)? {
                Value::Null => Ok(None),
                v => Ok(Some(v.to_string())),
            },
            TextExprT::Call(call) => match self.eval_call(call)? {
                Value::Null => Ok(None),
                v => Ok(Some(v.to_string())),
            },
        }
    }

    fn eval_math(&mut self, expr: &MathExpr) -> crate::Result<Option<Num>> {
        match &expr.typ {
            MathExprT::Int(i) => Ok(Some(Num::Int(*i))),
            MathExprT::Float(f) => Ok(Some(Num::Float(*f))),
            MathExprT::Neg(a) => match self.eval_math(a)? {
                Some(Num::Int(i)) => match i.checked_neg() {
                    Some(i) => Ok(Some(Num::Int(i))),
                    None => Err(Error::NegOverflow(ValSpan::new(Value::Int(i), a.span))),
                },
                Some(Num::Float(f)) => Ok(Some(Num::Float(-f))),
                None => Ok(None),
            },
            MathExprT::Add(a, b) => self.eval_math_pair(a, b, add),
            MathExprT::Sub(a, b) => self.eval_math_pair(a, b, sub),
            MathExprT::Mul(a, b) => self.eval_math_pair(a, b, mul),
            MathExprT::Div(a, b) => self.eval_math_pair(a, b, div),
            MathExprT::Rem(a, b) => self.eval_math_pair(a, b, rem),
            MathExprT::Pow(a, b) => {
                let (a, b) = (self.eval_math(a)?, self.eval_math(b)?);
                let (Some(l), Some(r)) = (a, b) else {
                    return Ok(None);
                };
                Ok(Some(Num::Float(l.to_f64().powf(r.to_f64()))))
            }
            MathExprT::Path(path) => match self.resolve_path(path)? {
                Value::Int(i) => Ok(Some(Num::Int(i))),
                Value::Float(f) => Ok(Some(Num::Float(f))),
                Value::Null => Ok(None),
                v => {
                    warn!("identifier {path} resolved to non-numeric '{v}' in a numeric context");
                    Ok(None)
                }
            },
            MathExprT::Call(call) => match self.eval_call(call)? {
                Value::Int(i) => Ok(Some(Num::Int(i))),
                Value::Float(f) => Ok(Some(Num::Float(f))),
                Value::Null => Ok(None),
                v => Err(Error::ExpectedNum(ValSpan::new(v, call.span))),
            },
        }
    }

    fn eval_math_pair(
        &mut self,
        a: &MathExpr,
        b: &MathExpr,
        op: fn(Num, Num, Span, Span) -> crate::Result<Num>,
    ) -> crate::Result<Option<Num>> {
        let (l, r) = (self.eval_math(a)?, self.eval_math(b)?);
        let (Some(l), Some(r)) = (l, r) else {
            return Ok(None);
        };
        op(l, r, a.span, b.span).map(Some)
    }

    fn eval_call(&mut self, call: &Call) -> crate::Result<Value> {
        let fun = match self.funs.get(&call.name) {
            Some(f) => f,
            None => return Err(Error::UnknownFun(call.name.clone(), call.span)),
        };

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_arg(arg)?);
        }

        trace!("calling function {} with {} arguments", call.name, args.len());
        fun(&args).map_err(|e| Error::FunFailed {
            name: call.name.clone(),
            cause: e.to_string(),
            span: call.span,
        })
    }

    fn eval_arg(&mut self, arg: &Arg) -> crate::Result<Value> {
        match arg {
            Arg::Path(path) => self.resolve_path(path),
            Arg::Text(expr) => Ok(match self.eval_text(expr)? {
                Some(s) => Value::Str(s),
                None => Value::Null,
            }),
            Arg::Math(expr) => Ok(match self.eval_math(expr)? {
                Some(n) => n.to_value(),
                None => Value::Null,
            }),
        }
    }
}

/// A numeric intermediate, kept integral as long as possible.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
        }
    }

    fn val_span(self, span: Span) -> ValSpan {
        ValSpan::new(self.to_value(), span)
    }
}

fn num_eq(l: Num, r: Num) -> bool {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => a == b,
        _ => l.to_f64() == r.to_f64(),
    }
}

fn add(l: Num, r: Num, ls: Span, rs: Span) -> crate::Result<Num> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => match a.checked_add(b) {
            Some(i) => Ok(Num::Int(i)),
            None => Err(Error::AddOverflow(l.val_span(ls), r.val_span(rs))),
        },
        _ => Ok(Num::Float(l.to_f64() + r.to_f64())),
    }
}

fn sub(l: Num, r: Num, ls: Span, rs: Span) -> crate::Result<Num> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => match a.checked_sub(b) {
            Some(i) => Ok(Num::Int(i)),
            None => Err(Error::SubOverflow(l.val_span(ls), r.val_span(rs))),
        },
        _ => Ok(Num::Float(l.to_f64() - r.to_f64())),
    }
}

fn mul(l: Num, r: Num, ls: Span, rs: Span) -> crate::Result<Num> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => match a.checked_mul(b) {
            Some(i) => Ok(Num::Int(i)),
            None => Err(Error::MulOverflow(l.val_span(ls), r.val_span(rs))),
        },
        _ => Ok(Num::Float(l.to_f64() * r.to_f64())),
    }
}

fn div(l: Num, r: Num, ls: Span, rs: Span) -> crate::Result<Num> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => {
            if b == 0 {
                return Err(Error::DivideByZero(l.val_span(ls), r.val_span(rs)));
            }
            match a.checked_div(b) {
                Some(i) => Ok(Num::Int(i)),
                None => Err(Error::NegOverflow(l.val_span(ls))),
            }
        }
        _ => {
            if r.to_f64() == 0.0 {
                return Err(Error::DivideByZero(l.val_span(ls), r.val_span(rs)));
            }
            Ok(Num::Float(l.to_f64() / r.to_f64()))
        }
    }
}

fn rem(l: Num, r: Num, ls: Span, rs: Span) -> crate::Result<Num> {
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => {
            if b == 0 {
                return Err(Error::RemainderByZero(l.val_span(ls), r.val_span(rs)));
            }
            // i64::MIN % -1 would overflow the builtin operator
            Ok(Num::Int(a.checked_rem(b).unwrap_or(0)))
        }
        _ => {
            if r.to_f64() == 0.0 {
                return Err(Error::RemainderByZero(l.val_span(ls), r.val_span(rs)));
            }
            Ok(Num::Float(l.to_f64() % r.to_f64()))
        }
    }
}

/// `%` at the pattern edges selects the match mode: leading means ends-with,
/// trailing means starts-with, both mean contains and none means equals.
fn wildcard_match(text: &str, pattern: &str) -> bool {
    let leading = pattern.starts_with('%');
    let trailing = pattern.len() > 1 && pattern.ends_with('%');

    match (leading, trailing) {
        (true, true) => text.contains(&pattern[1..pattern.len() - 1]),
        (true, false) => text.ends_with(&pattern[1..]),
        (false, true) => text.starts_with(&pattern[..pattern.len() - 1]),
        (false, false) => text == pattern,
    }
}

fn coerce_bool(val: &Value) -> bool {
    match val {
        Value::Bool(b) => *b,
        Value::Null => false,
        v => v.to_string().eq_ignore_ascii_case("true"),
    }
}
