use crate::{Context, Error, KwT, OpT, ParT, Span, Token, Value};

pub use ast::*;
use parser::*;

mod ast;
mod parser;
#[cfg(test)]
mod test;

impl Context {
    /// Parses a token stream into a predication.
    ///
    /// The condition alternatives of the grammar share prefixes but live in
    /// different operand worlds (numeric, text, boolean), so the parser tries
    /// them in grammar order and rewinds on failure, keeping the error of the
    /// alternative that got furthest.
    pub fn parse(&mut self, tokens: Vec<Token>) -> crate::Result<Pred> {
        let mut parser = Parser::new(tokens);
        if parser.at_end() {
            return Err(Error::ExpectedCondition(parser.span_here()));
        }

        let pred = self.parse_predication(&mut parser)?;

        if !parser.at_end() {
            return Err(Error::UnexpectedToken(parser.span_here()));
        }

        Ok(pred)
    }

    fn parse_predication(&mut self, p: &mut Parser) -> crate::Result<Pred> {
        let mut lhs = self.parse_pred_operand(p)?;

        // AND and OR bind equally and associate to the left
        loop {
            let kw = match p.peek() {
                Some(Token::Kw(k)) => *k,
                _ => break,
            };
            p.next();

            let rhs = self.parse_pred_operand(p)?;
            let span = Span::across(lhs.span, rhs.span);
            let typ = match kw.typ {
                KwT::And => PredT::And(Box::new(lhs), Box::new(rhs)),
                KwT::Or => PredT::Or(Box::new(lhs), Box::new(rhs)),
            };
            lhs = Pred::new(typ, span);
        }

        Ok(lhs)
    }

    fn parse_pred_operand(&mut self, p: &mut Parser) -> crate::Result<Pred> {
        let cp = p.checkpoint();

        // A leading parenthesis may wrap a whole predication or just an
        // operand of a condition, only the first case is handled here.
        if let Some(open) = p.next_if_par(ParT::RoundOpen) {
            if let Ok(pred) = self.parse_predication(p) {
                if let Some(close) = p.next_if_par(ParT::RoundClose) {
                    return Ok(Pred::new(pred.typ, Span::across(open.span, close.span)));
                }
            }
            p.rewind(cp);
        }

        let cond = self.parse_cond(p)?;
        let span = cond.span;
        Ok(Pred::new(PredT::Cond(cond), span))
    }

    fn parse_cond(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let cp = p.checkpoint();
        let mut best: Option<(usize, Error)> = None;

        match self.parse_between(p) {
            Ok(c) => return Ok(c),
            Err(e) => {
                keep_best(&mut best, p.checkpoint(), e);
                p.rewind(cp);
            }
        }
        match self.parse_in(p) {
            Ok(c) => return Ok(c),
            Err(e) => {
                keep_best(&mut best, p.checkpoint(), e);
                p.rewind(cp);
            }
        }
        match self.parse_rel(p) {
            Ok(c) => return Ok(c),
            Err(e) => {
                keep_best(&mut best, p.checkpoint(), e);
                p.rewind(cp);
            }
        }
        match self.parse_text_match(p) {
            Ok(c) => return Ok(c),
            Err(e) => {
                keep_best(&mut best, p.checkpoint(), e);
                p.rewind(cp);
            }
        }
        match self.parse_bool_cond(p) {
            Ok(c) => return Ok(c),
            Err(e) => {
                keep_best(&mut best, p.checkpoint(), e);
                p.rewind(cp);
            }
        }

        Err(match best {
            Some((_, e)) => e,
            None => Error::ExpectedCondition(p.span_here()),
        })
    }

    fn parse_between(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let val = self.parse_math_expr(p)?;
        p.expect_op(OpT::Between)?;
        p.expect_par(ParT::SquareOpen)?;
        let lo = self.parse_math_expr(p)?;
        p.expect_comma()?;
        let hi = self.parse_math_expr(p)?;
        let close = p.expect_par(ParT::SquareClose)?;

        let span = Span::across(val.span, close.span);
        Ok(Cond::new(CondT::Between { val, lo, hi }, span))
    }

    fn parse_in(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let cp = p.checkpoint();

        // `10` is no text expression and `'pending'` no math expression, so
        // which of the in forms applies only becomes apparent at the list.
        match self.parse_in_text(p) {
            Ok(c) => return Ok(c),
            Err(_) => p.rewind(cp),
        }
        self.parse_in_math(p)
    }

    fn parse_in_text(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let lhs = self.parse_text_expr(p)?;
        let negated = self.parse_in_op(p)?;

        if p.next_if_par(ParT::SquareOpen).is_some() {
            let mut items = vec![self.parse_text_expr(p)?];
            while p.next_if_comma() {
                items.push(self.parse_text_expr(p)?);
            }
            let close = p.expect_par(ParT::SquareClose)?;

            let span = Span::across(lhs.span, close.span);
            let typ = CondT::In {
                lhs: InLhs::Text(lhs),
                rhs: InRhs::TextList(items),
                negated,
            };
            Ok(Cond::new(typ, span))
        } else {
            let path = self.parse_path(p)?;
            let span = Span::across(lhs.span, path.span);
            let typ = CondT::In {
                lhs: InLhs::Text(lhs),
                rhs: InRhs::Path(path),
                negated,
            };
            Ok(Cond::new(typ, span))
        }
    }

    fn parse_in_math(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let lhs = self.parse_math_expr(p)?;
        let negated = self.parse_in_op(p)?;

        p.expect_par(ParT::SquareOpen)?;
        let mut items = vec![self.parse_math_expr(p)?];
        while p.next_if_comma() {
            items.push(self.parse_math_expr(p)?);
        }
        let close = p.expect_par(ParT::SquareClose)?;

        let span = Span::across(lhs.span, close.span);
        let typ = CondT::In {
            lhs: InLhs::Math(lhs),
            rhs: InRhs::MathList(items),
            negated,
        };
        Ok(Cond::new(typ, span))
    }

    fn parse_in_op(&mut self, p: &mut Parser) -> crate::Result<bool> {
        if p.next_if_op(OpT::In).is_some() {
            Ok(false)
        } else if p.next_if_op(OpT::NotIn).is_some() {
            Ok(true)
        } else {
            Err(Error::ExpectedInOp(p.span_here()))
        }
    }

    fn parse_rel(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let lhs = self.parse_math_expr(p)?;

        let op = p
            .peek()
            .and_then(Token::as_op)
            .and_then(|o| RelOp::from_op(o.typ));
        let op = match op {
            Some(op) => {
                p.next();
                op
            }
            None => return Err(Error::ExpectedRelOp(p.span_here())),
        };

        let rhs = self.parse_math_expr(p)?;
        let span = Span::across(lhs.span, rhs.span);
        Ok(Cond::new(CondT::Rel { lhs, op, rhs }, span))
    }

    fn parse_text_match(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let lhs = self.parse_text_expr(p)?;

        let op = p
            .peek()
            .and_then(Token::as_op)
            .and_then(|o| TextOp::from_op(o.typ));
        let op = match op {
            Some(op) => {
                p.next();
                op
            }
            None => return Err(Error::ExpectedTextOp(p.span_here())),
        };

        let rhs = self.parse_text_expr(p)?;
        let span = Span::across(lhs.span, rhs.span);
        Ok(Cond::new(CondT::TextMatch { lhs, op, rhs }, span))
    }

    fn parse_bool_cond(&mut self, p: &mut Parser) -> crate::Result<Cond> {
        let expr = self.parse_bool_expr(p)?;
        let span = expr.span;
        Ok(Cond::new(CondT::Bool(expr), span))
    }

    fn parse_bool_expr(&mut self, p: &mut Parser) -> crate::Result<BoolExpr> {
        let mut lhs = self.parse_bool_primary(p)?;

        loop {
            let eq = if p.next_if_op(OpT::Eq).is_some() {
                true
            } else if p.next_if_op(OpT::Ne).is_some() {
                false
            } else {
                break;
            };

            let rhs = self.parse_bool_primary(p)?;
            let span = Span::across(lhs.span, rhs.span);
            let typ = if eq {
                BoolExprT::Eq(Box::new(lhs), Box::new(rhs))
            } else {
                BoolExprT::Ne(Box::new(lhs), Box::new(rhs))
            };
            lhs = BoolExpr::new(typ, span);
        }

        Ok(lhs)
    }

    fn parse_bool_primary(&mut self, p: &mut Parser) -> crate::Result<BoolExpr> {
        let t = match p.peek() {
            Some(t) => t.clone(),
            None => return Err(Error::ExpectedBoolExpr(p.span_here())),
        };

        match t {
            Token::Par(par) if par.typ == ParT::RoundOpen => {
                p.next();
                let expr = self.parse_bool_expr(p)?;
                let close = p.expect_par(ParT::RoundClose)?;
                Ok(BoolExpr::new(expr.typ, Span::across(par.span, close.span)))
            }
            Token::Val(v) => match v.val {
                Value::Bool(b) => {
                    p.next();
                    Ok(BoolExpr::new(BoolExprT::Lit(b), v.span))
                }
                _ => Err(Error::ExpectedBoolExpr(v.span)),
            },
            Token::Ident(_) => {
                if self.peek_call(p) {
                    let call = self.parse_call(p)?;
                    let span = call.span;
                    Ok(BoolExpr::new(BoolExprT::Call(call), span))
                } else {
                    let path = self.parse_path(p)?;
                    let span = path.span;
                    Ok(BoolExpr::new(BoolExprT::Path(path), span))
                }
            }
            t => Err(Error::ExpectedBoolExpr(t.span())),
        }
    }

    fn parse_text_expr(&mut self, p: &mut Parser) -> crate::Result<TextExpr> {
        let t = match p.peek() {
            Some(t) => t.clone(),
            None => return Err(Error::ExpectedTextExpr(p.span_here())),
        };

        match t {
            Token::Par(par) if par.typ == ParT::RoundOpen => {
                p.next();
                let expr = self.parse_text_expr(p)?;
                let close = p.expect_par(ParT::RoundClose)?;
                Ok(TextExpr::new(expr.typ, Span::across(par.span, close.span)))
            }
            Token::Val(v) => match v.val {
                Value::Str(s) => {
                    p.next();
                    Ok(TextExpr::new(TextExprT::Lit(s), v.span))
                }
                Value::Null => {
                    p.next();
                    Ok(TextExpr::new(TextExprT::Null, v.span))
                }
                _ => Err(Error::ExpectedTextExpr(v.span)),
            },
            Token::Ident(_) => {
                if self.peek_call(p) {
                    let call = self.parse_call(p)?;
                    let span = call.span;
                    Ok(TextExpr::new(TextExprT::Call(call), span))
                } else {
                    let path = self.parse_path(p)?;
                    let span = path.span;
                    Ok(TextExpr::new(TextExprT::Path(path), span))
                }
            }
            t => Err(Error::ExpectedTextExpr(t.span())),
        }
    }

    fn parse_math_expr(&mut self, p: &mut Parser) -> crate::Result<MathExpr> {
        let mut lhs = self.parse_math_term(p)?;

        loop {
            let op = match p.peek() {
                Some(Token::Op(o)) if matches!(o.typ, OpT::Add | OpT::Sub) => *o,
                _ => break,
            };
            p.next();

            let rhs = self.parse_math_term(p)?;
            let span = Span::across(lhs.span, rhs.span);
            let typ = match op.typ {
                OpT::Add => MathExprT::Add(Box::new(lhs), Box::new(rhs)),
                _ => MathExprT::Sub(Box::new(lhs), Box::new(rhs)),
            };
            lhs = MathExpr::new(typ, span);
        }

        Ok(lhs)
    }

    fn parse_math_term(&mut self, p: &mut Parser) -> crate::Result<MathExpr> {
        let mut lhs = self.parse_math_factor(p)?;

        loop {
            let op = match p.peek() {
                Some(Token::Op(o)) if matches!(o.typ, OpT::Mul | OpT::Div | OpT::Rem) => *o,
                _ => break,
            };
            p.next();

            let rhs = self.parse_math_factor(p)?;
            let span = Span::across(lhs.span, rhs.span);
            let typ = match op.typ {
                OpT::Mul => MathExprT::Mul(Box::new(lhs), Box::new(rhs)),
                OpT::Div => MathExprT::Div(Box::new(lhs), Box::new(rhs)),
                _ => MathExprT::Rem(Box::new(lhs), Box::new(rhs)),
            };
            lhs = MathExpr::new(typ, span);
        }

        Ok(lhs)
    }

    fn parse_math_factor(&mut self, p: &mut Parser) -> crate::Result<MathExpr> {
        let t = match p.peek() {
            Some(t) => t.clone(),
            None => return Err(Error::ExpectedMathExpr(p.span_here())),
        };

        match t {
            Token::Par(par) if par.typ == ParT::RoundOpen => {
                p.next();
                let expr = self.parse_math_expr(p)?;
                let close = p.expect_par(ParT::RoundClose)?;
                Ok(MathExpr::new(expr.typ, Span::across(par.span, close.span)))
            }
            Token::Op(o) if o.typ == OpT::Sub => {
                p.next();
                let val = self.parse_math_factor(p)?;
                let span = Span::across(o.span, val.span);
                Ok(MathExpr::new(MathExprT::Neg(Box::new(val)), span))
            }
            Token::Val(v) => {
                let lhs = match v.val {
                    Value::Int(i) => MathExpr::new(MathExprT::Int(i), v.span),
                    Value::Float(f) => MathExpr::new(MathExprT::Float(f), v.span),
                    _ => return Err(Error::ExpectedMathExpr(v.span)),
                };
                p.next();

                // the dedicated power form with number literals on both sides
                if p.next_if_op(OpT::Pow).is_some() {
                    let rhs = self.parse_number(p)?;
                    let span = Span::across(lhs.span, rhs.span);
                    return Ok(MathExpr::new(
                        MathExprT::Pow(Box::new(lhs), Box::new(rhs)),
                        span,
                    ));
                }
                Ok(lhs)
            }
            Token::Ident(_) => {
                if self.peek_call(p) {
                    let call = self.parse_call(p)?;
                    let span = call.span;
                    Ok(MathExpr::new(MathExprT::Call(call), span))
                } else {
                    let path = self.parse_path(p)?;
                    let span = path.span;
                    Ok(MathExpr::new(MathExprT::Path(path), span))
                }
            }
            t => Err(Error::ExpectedMathExpr(t.span())),
        }
    }

    fn parse_number(&mut self, p: &mut Parser) -> crate::Result<MathExpr> {
        let t = match p.peek() {
            Some(t) => t.clone(),
            None => return Err(Error::ExpectedNumber(p.span_here())),
        };

        match t {
            Token::Val(v) => {
                let lit = match v.val {
                    Value::Int(i) => MathExpr::new(MathExprT::Int(i), v.span),
                    Value::Float(f) => MathExpr::new(MathExprT::Float(f), v.span),
                    _ => return Err(Error::ExpectedNumber(v.span)),
                };
                p.next();
                Ok(lit)
            }
            t => Err(Error::ExpectedNumber(t.span())),
        }
    }

    fn parse_path(&mut self, p: &mut Parser) -> crate::Result<Path> {
        let first = p.expect_ident()?;
        let mut span = first.span;
        let mut segments = vec![Segment {
            name: first.name,
            index: None,
        }];

        if let Some((index, s)) = self.parse_index(p)? {
            segments[0].index = Some(index);
            span = Span::across(span, s);
        }

        while p.next_if_op(OpT::Dot).is_some() {
            let id = p.expect_ident()?;
            span = Span::across(span, id.span);

            let mut seg = Segment {
                name: id.name,
                index: None,
            };
            if let Some((index, s)) = self.parse_index(p)? {
                seg.index = Some(index);
                span = Span::across(span, s);
            }
            segments.push(seg);
        }

        Ok(Path { segments, span })
    }

    fn parse_index(&mut self, p: &mut Parser) -> crate::Result<Option<(Index, Span)>> {
        let open = match p.next_if_par(ParT::SquareOpen) {
            Some(o) => o,
            None => return Ok(None),
        };

        let index = match p.next() {
            Some(Token::Val(v)) => match v.val {
                Value::Int(i) if i >= 0 => Index::Num(i as usize),
                _ => return Err(Error::ExpectedIndex(v.span)),
            },
            Some(Token::Tag(t)) => Index::Tag(t.name),
            Some(t) => return Err(Error::ExpectedIndex(t.span())),
            None => return Err(Error::ExpectedIndex(p.span_here())),
        };

        let close = p.expect_par(ParT::SquareClose)?;
        Ok(Some((index, Span::across(open.span, close.span))))
    }

    fn parse_call(&mut self, p: &mut Parser) -> crate::Result<Call> {
        let id = p.expect_ident()?;
        p.expect_par(ParT::RoundOpen)?;

        let mut args = Vec::new();
        let close = match p.next_if_par(ParT::RoundClose) {
            Some(c) => c,
            None => {
                loop {
                    args.push(self.parse_arg(p)?);
                    if !p.next_if_comma() {
                        break;
                    }
                }
                p.expect_par(ParT::RoundClose)?
            }
        };

        Ok(Call {
            name: id.name,
            args,
            span: Span::across(id.span, close.span),
        })
    }

    /// An argument is a raw identifier path, a text expression or a math
    /// expression, whichever consumes everything up to the next `,` or `)`.
    fn parse_arg(&mut self, p: &mut Parser) -> crate::Result<Arg> {
        let cp = p.checkpoint();

        if let Ok(path) = self.parse_path(p) {
            if at_arg_end(p) {
                return Ok(Arg::Path(path));
            }
        }
        p.rewind(cp);

        if let Ok(expr) = self.parse_text_expr(p) {
            if at_arg_end(p) {
                return Ok(Arg::Text(expr));
            }
        }
        p.rewind(cp);

        let expr = self.parse_math_expr(p)?;
        Ok(Arg::Math(expr))
    }

    fn peek_call(&self, p: &Parser) -> bool {
        matches!(p.peek(), Some(Token::Ident(_)))
            && matches!(p.peek2(), Some(Token::Par(par)) if par.typ == ParT::RoundOpen)
    }
}

fn keep_best(best: &mut Option<(usize, Error)>, at: usize, e: Error) {
    match best {
        Some((i, _)) if *i >= at => (),
        _ => *best = Some((at, e)),
    }
}

fn at_arg_end(p: &Parser) -> bool {
    match p.peek() {
        Some(Token::Pct(_)) => true,
        Some(Token::Par(par)) => par.typ == ParT::RoundClose,
        None => false,
        _ => false,
    }
}
