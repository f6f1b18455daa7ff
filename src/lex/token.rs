use std::fmt::{self, Display};
use std::ops::{Deref, DerefMut};

use crate::{Span, ValSpan, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Val(ValSpan),
    Ident(IdentSpan),
    Tag(TagSpan),
    Op(Op),
    Par(Par),
    Pct(Pct),
    Kw(Kw),
}

impl Token {
    pub fn val(val: Value, span: Span) -> Self {
        Self::Val(ValSpan::new(val, span))
    }

    pub fn ident(name: &str, span: Span) -> Self {
        Self::Ident(IdentSpan::new(name.to_string(), span))
    }

    pub fn tag(name: &str, span: Span) -> Self {
        Self::Tag(TagSpan::new(name.to_string(), span))
    }

    pub fn op(typ: OpT, span: Span) -> Self {
        Self::Op(Op::new(typ, span))
    }

    pub fn par(typ: ParT, span: Span) -> Self {
        Self::Par(Par::new(typ, span))
    }

    pub fn pct(typ: PctT, span: Span) -> Self {
        Self::Pct(Pct::new(typ, span))
    }

    pub fn kw(typ: KwT, span: Span) -> Self {
        Self::Kw(Kw::new(typ, span))
    }

    pub fn as_op(&self) -> Option<Op> {
        match self {
            Self::Op(o) => Some(*o),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Val(v) => v.span,
            Self::Ident(i) => i.span,
            Self::Tag(t) => t.span,
            Self::Op(o) => o.span,
            Self::Par(p) => p.span,
            Self::Pct(p) => p.span,
            Self::Kw(k) => k.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IdentSpan {
    pub name: String,
    pub span: Span,
}

impl IdentSpan {
    pub const fn new(name: String, span: Span) -> Self {
        Self { name, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TagSpan {
    pub name: String,
    pub span: Span,
}

impl TagSpan {
    pub const fn new(name: String, span: Span) -> Self {
        Self { name, span }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Op {
    pub typ: OpT,
    pub span: Span,
}

impl Op {
    pub const fn new(typ: OpT, span: Span) -> Self {
        Self { typ, span }
    }
}

impl Deref for Op {
    type Target = OpT;

    fn deref(&self) -> &Self::Target {
        &self.typ
    }
}

impl DerefMut for Op {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.typ
    }
}

/// Operator kinds. Most have a symbolic and an alphabetic spelling,
/// `Display` uses the symbolic one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpT {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    In,
    NotIn,
    Like,
    ILike,
    NotLike,
    NotILike,
    Dot,
}

impl Display for OpT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "+"),
            Self::Sub => write!(f, "-"),
            Self::Mul => write!(f, "*"),
            Self::Div => write!(f, "/"),
            Self::Rem => write!(f, "%"),
            Self::Pow => write!(f, "^"),
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
            Self::Between => write!(f, ">=<"),
            Self::In => write!(f, ">+<"),
            Self::NotIn => write!(f, "<>"),
            Self::Like => write!(f, "~"),
            Self::ILike => write!(f, "~~"),
            Self::NotLike => write!(f, "!~"),
            Self::NotILike => write!(f, "!~~"),
            Self::Dot => write!(f, "."),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Par {
    pub typ: ParT,
    pub span: Span,
}

impl Par {
    pub const fn new(typ: ParT, span: Span) -> Self {
        Self { typ, span }
    }
}

impl Deref for Par {
    type Target = ParT;

    fn deref(&self) -> &Self::Target {
        &self.typ
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParT {
    RoundOpen,
    RoundClose,
    SquareOpen,
    SquareClose,
}

impl Display for ParT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundOpen => write!(f, "("),
            Self::RoundClose => write!(f, ")"),
            Self::SquareOpen => write!(f, "["),
            Self::SquareClose => write!(f, "]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pct {
    pub typ: PctT,
    pub span: Span,
}

impl Pct {
    pub const fn new(typ: PctT, span: Span) -> Self {
        Self { typ, span }
    }
}

impl Deref for Pct {
    type Target = PctT;

    fn deref(&self) -> &Self::Target {
        &self.typ
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PctT {
    Comma,
}

impl Display for PctT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comma => write!(f, ","),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Kw {
    pub typ: KwT,
    pub span: Span,
}

impl Kw {
    pub const fn new(typ: KwT, span: Span) -> Self {
        Self { typ, span }
    }
}

impl Deref for Kw {
    type Target = KwT;

    fn deref(&self) -> &Self::Target {
        &self.typ
    }
}

/// Logical keywords, recognized case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KwT {
    And,
    Or,
}

impl Display for KwT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}
