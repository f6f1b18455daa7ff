use std::iter::Peekable;
use std::mem;
use std::str::Chars;

use crate::{Context, Error, Pos, Span, Value};

pub use token::*;

#[cfg(test)]
mod test;
mod token;

struct Lexer<'a> {
    tokens: Vec<Token>,
    literal: String,
    chars: Peekable<Chars<'a>>,
    cursor: Pos,
    /// span of a `NOT` waiting for its `IN`, `LIKE` or `ILIKE`
    pending_not: Option<Span>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: Vec::new(),
            literal: String::new(),
            chars: input.chars().peekable(),
            cursor: Pos::new(0, 0),
            pending_not: None,
        }
    }

    fn next(&mut self) -> Option<char> {
        self.cursor.col += 1;
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    fn next_if(&mut self, expected: char) -> Option<char> {
        if let Some(c) = self.peek() {
            if c == expected {
                return self.next();
            }
        }

        None
    }

    fn new_line(&mut self) {
        self.cursor.line += 1;
        self.cursor.col = 0;
    }

    const fn pos(&self) -> Pos {
        Pos::new(self.cursor.line, self.cursor.col.saturating_sub(1))
    }

    const fn end_pos(&self) -> Pos {
        self.cursor
    }
}

impl Context {
    pub fn lex(&mut self, input: &str) -> crate::Result<Vec<Token>> {
        let mut lexer = Lexer::new(input);

        while let Some(c) = lexer.next() {
            let span = Span::from(lexer.pos());
            match c {
                '\'' | '"' => self.text_literal(&mut lexer, c)?,
                ' ' | '\t' | '\r' => self.end_literal(&mut lexer)?,
                '\n' => {
                    self.end_literal(&mut lexer)?;
                    lexer.new_line();
                }
                '+' => self.new_atom(&mut lexer, Token::op(OpT::Add, span))?,
                '-' => self.new_atom(&mut lexer, Token::op(OpT::Sub, span))?,
                '*' => self.new_atom(&mut lexer, Token::op(OpT::Mul, span))?,
                '/' => self.new_atom(&mut lexer, Token::op(OpT::Div, span))?,
                '%' => self.new_atom(&mut lexer, Token::op(OpT::Rem, span))?,
                '^' => self.new_atom(&mut lexer, Token::op(OpT::Pow, span))?,
                '=' => match lexer.next_if('=') {
                    Some(_) => {
                        let s = Span::new(span.start, lexer.end_pos());
                        self.new_atom(&mut lexer, Token::op(OpT::Eq, s))?;
                    }
                    None => return Err(Error::InvalidChar(span)),
                },
                '<' => {
                    let typ = if lexer.next_if('=').is_some() {
                        OpT::Le
                    } else if lexer.next_if('>').is_some() {
                        OpT::NotIn
                    } else {
                        OpT::Lt
                    };
                    let s = Span::new(span.start, lexer.end_pos());
                    self.new_atom(&mut lexer, Token::op(typ, s))?;
                }
                '>' => {
                    let typ = if lexer.next_if('=').is_some() {
                        if lexer.next_if('<').is_some() {
                            OpT::Between
                        } else {
                            OpT::Ge
                        }
                    } else if lexer.peek() == Some('+') && lexer.peek2() == Some('<') {
                        lexer.next();
                        lexer.next();
                        OpT::In
                    } else {
                        OpT::Gt
                    };
                    let s = Span::new(span.start, lexer.end_pos());
                    self.new_atom(&mut lexer, Token::op(typ, s))?;
                }
                '~' => {
                    let typ = match lexer.next_if('~') {
                        Some(_) => OpT::ILike,
                        None => OpT::Like,
                    };
                    let s = Span::new(span.start, lexer.end_pos());
                    self.new_atom(&mut lexer, Token::op(typ, s))?;
                }
                '!' => {
                    let typ = if lexer.next_if('~').is_some() {
                        match lexer.next_if('~') {
                            Some(_) => OpT::NotILike,
                            None => OpT::NotLike,
                        }
                    } else if lexer.next_if('=').is_some() {
                        OpT::Ne
                    } else {
                        return Err(Error::InvalidChar(span));
                    };
                    let s = Span::new(span.start, lexer.end_pos());
                    self.new_atom(&mut lexer, Token::op(typ, s))?;
                }
                '.' => match lexer.peek() {
                    Some(c)
                        if !lexer.literal.is_empty()
                            && lexer.literal.chars().all(|c| c.is_ascii_digit())
                            && c.is_ascii_digit() =>
                    {
                        lexer.literal.push('.');
                    }
                    _ => self.new_atom(&mut lexer, Token::op(OpT::Dot, span))?,
                },
                '(' => self.new_atom(&mut lexer, Token::par(ParT::RoundOpen, span))?,
                ')' => self.new_atom(&mut lexer, Token::par(ParT::RoundClose, span))?,
                '[' => self.new_atom(&mut lexer, Token::par(ParT::SquareOpen, span))?,
                ']' => self.new_atom(&mut lexer, Token::par(ParT::SquareClose, span))?,
                ',' => self.new_atom(&mut lexer, Token::pct(PctT::Comma, span))?,
                c => lexer.literal.push(c),
            }
        }

        self.end_literal(&mut lexer)?;
        if let Some(s) = lexer.pending_not.take() {
            return Err(Error::UnpairedNot(s));
        }

        Ok(lexer.tokens)
    }

    fn new_atom(&mut self, lexer: &mut Lexer<'_>, token: Token) -> crate::Result<()> {
        self.end_literal(lexer)?;
        if let Some(s) = lexer.pending_not.take() {
            return Err(Error::UnpairedNot(s));
        }
        lexer.tokens.push(token);
        Ok(())
    }

    fn end_literal(&mut self, lexer: &mut Lexer<'_>) -> crate::Result<()> {
        if lexer.literal.is_empty() {
            return Ok(());
        }

        let end = lexer.pos();
        let start_col = end.col - lexer.literal.chars().count() as u32;
        let span = Span::new(Pos::new(end.line, start_col), end);

        let literal = lexer.literal.as_str();

        if let Some(not_span) = lexer.pending_not.take() {
            let typ = match literal {
                "IN" => OpT::NotIn,
                "LIKE" => OpT::NotLike,
                "ILIKE" => OpT::NotILike,
                _ => return Err(Error::UnpairedNot(not_span)),
            };
            lexer.literal.clear();
            lexer.tokens.push(Token::op(typ, Span::across(not_span, span)));
            return Ok(());
        }

        let token = match literal {
            "NOT" => {
                lexer.pending_not = Some(span);
                lexer.literal.clear();
                return Ok(());
            }
            "EQ" => Token::op(OpT::Eq, span),
            "NE" => Token::op(OpT::Ne, span),
            "LT" => Token::op(OpT::Lt, span),
            "LTE" => Token::op(OpT::Le, span),
            "GT" => Token::op(OpT::Gt, span),
            "GTE" => Token::op(OpT::Ge, span),
            "BETWEEN" => Token::op(OpT::Between, span),
            "IN" => Token::op(OpT::In, span),
            "LIKE" => Token::op(OpT::Like, span),
            "ILIKE" => Token::op(OpT::ILike, span),
            _ => {
                if literal.eq_ignore_ascii_case("AND") {
                    Token::kw(KwT::And, span)
                } else if literal.eq_ignore_ascii_case("OR") {
                    Token::kw(KwT::Or, span)
                } else if literal.eq_ignore_ascii_case("TRUE") {
                    Token::val(Value::Bool(true), span)
                } else if literal.eq_ignore_ascii_case("FALSE") {
                    Token::val(Value::Bool(false), span)
                } else if literal.eq_ignore_ascii_case("NULL") {
                    Token::val(Value::Null, span)
                } else if literal.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    let val = if let Ok(i) = literal.parse::<i64>() {
                        Value::Int(i)
                    } else if let Ok(f) = literal.parse::<f64>() {
                        Value::Float(f)
                    } else {
                        return Err(Error::InvalidNumberFormat(span));
                    };
                    Token::val(val, span)
                } else if let Some(tag) = literal.strip_prefix('@') {
                    if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphabetic()) {
                        Token::tag(tag, span)
                    } else {
                        return Err(Error::InvalidChar(span));
                    }
                } else {
                    let (rest, sigil) = match literal.strip_prefix('$') {
                        Some(r) => (r, 1),
                        None => (literal, 0),
                    };
                    if rest.is_empty() {
                        return Err(Error::InvalidChar(span));
                    }
                    for (i, c) in rest.char_indices() {
                        let valid = if i == 0 {
                            c.is_ascii_alphabetic() || c == '_'
                        } else {
                            c.is_ascii_alphanumeric() || c == '_'
                        };
                        if !valid {
                            return Err(Error::InvalidChar(Span::pos(
                                span.start.line,
                                start_col + sigil + i as u32,
                            )));
                        }
                    }
                    Token::ident(literal, span)
                }
            }
        };

        lexer.literal.clear();
        lexer.tokens.push(token);

        Ok(())
    }

    fn text_literal(&mut self, lexer: &mut Lexer<'_>, quote: char) -> crate::Result<()> {
        self.end_literal(lexer)?;
        if let Some(s) = lexer.pending_not.take() {
            return Err(Error::UnpairedNot(s));
        }

        let start = lexer.pos();
        while let Some(c) = lexer.next() {
            if c == quote {
                let span = Span::new(start, lexer.end_pos());
                let str = mem::take(&mut lexer.literal);
                lexer.tokens.push(Token::val(Value::Str(str), span));
                return Ok(());
            }

            match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | ' ' => lexer.literal.push(c),
                '.' | '+' | '(' | ')' | '/' | '%' | '#' | '\\' | '@' => lexer.literal.push(c),
                '\n' => return Err(Error::MissingClosingQuote(Span::from(start))),
                _ => {
                    self.errors
                        .push(Error::InvalidTextChar(c, Span::from(lexer.pos())));
                    lexer.literal.push(c);
                }
            }
        }

        Err(Error::MissingClosingQuote(Span::from(start)))
    }
}
