use crate::{Error, IdentSpan, Op, OpT, Par, ParT, PctT, Pos, Span, Token};

pub(super) struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    end: Pos,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map(|t| t.span().end).unwrap_or(Pos::new(0, 0));
        Self {
            tokens,
            idx: 0,
            end,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    pub fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.idx + 1)
    }

    pub fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.idx).cloned();
        if t.is_some() {
            self.idx += 1;
        }
        t
    }

    pub fn at_end(&self) -> bool {
        self.idx >= self.tokens.len()
    }

    /// Position where parsing currently stands, used to rank backtracked errors.
    pub fn checkpoint(&self) -> usize {
        self.idx
    }

    pub fn rewind(&mut self, cp: usize) {
        self.idx = cp;
    }

    /// Span of the next token, or of the end of input.
    pub fn span_here(&self) -> Span {
        match self.peek() {
            Some(t) => t.span(),
            None => Span::from(self.end),
        }
    }

    pub fn next_if_op(&mut self, typ: OpT) -> Option<Op> {
        match self.peek() {
            Some(Token::Op(o)) if o.typ == typ => {
                let o = *o;
                self.idx += 1;
                Some(o)
            }
            _ => None,
        }
    }

    pub fn next_if_par(&mut self, typ: ParT) -> Option<Par> {
        match self.peek() {
            Some(Token::Par(p)) if p.typ == typ => {
                let p = *p;
                self.idx += 1;
                Some(p)
            }
            _ => None,
        }
    }

    pub fn next_if_comma(&mut self) -> bool {
        match self.peek() {
            Some(Token::Pct(p)) if p.typ == PctT::Comma => {
                self.idx += 1;
                true
            }
            _ => false,
        }
    }

    pub fn expect_op(&mut self, typ: OpT) -> crate::Result<Op> {
        let span = self.span_here();
        self.next_if_op(typ).ok_or(Error::ExpectedOp(typ, span))
    }

    pub fn expect_par(&mut self, typ: ParT) -> crate::Result<Par> {
        let span = self.span_here();
        self.next_if_par(typ).ok_or(Error::ExpectedPar(typ, span))
    }

    pub fn expect_comma(&mut self) -> crate::Result<()> {
        let span = self.span_here();
        if self.next_if_comma() {
            Ok(())
        } else {
            Err(Error::ExpectedComma(span))
        }
    }

    pub fn expect_ident(&mut self) -> crate::Result<IdentSpan> {
        match self.peek() {
            Some(Token::Ident(id)) => {
                let id = id.clone();
                self.idx += 1;
                Ok(id)
            }
            _ => Err(Error::ExpectedIdent(self.span_here())),
        }
    }
}
