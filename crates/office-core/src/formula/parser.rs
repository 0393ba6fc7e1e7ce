//! Recursive-descent formula parser
//!
//! Precedence, lowest first: comparison, `&`, `+ -`, `* /`, `^`, unary
//! `-`/`%`, ranges, primaries.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::{FormulaError, FormulaResult};
use crate::cell::CellAddress;
use crate::range::CellRange;

/// Parse formula text (with or without the leading `=`)
pub fn parse(formula: &str) -> FormulaResult<Expr> {
    let body = formula.trim();
    let body = body.strip_prefix('=').unwrap_or(body);
    if body.trim().is_empty() {
        return Err(FormulaError::Parse("empty formula".into()));
    }
    let mut parser = Parser::new(body)?;
    let expr = parser.expression()?;
    match parser.current() {
        Token::Eof => Ok(expr),
        other => Err(FormulaError::Parse(format!("unexpected {other:?} after expression"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    Ident(String),
    CellRef(String),
    Sheet(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Colon,
    Comma,
    LeftParen,
    RightParen,
    Eof,
}

const ERROR_LITERALS: [&str; 7] = [
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
];

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current: Token::Eof,
        };
        parser.current = parser.scan()?;
        Ok(parser)
    }

    // === Scanning ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek_char().is_some_and(&keep) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn scan(&mut self) -> FormulaResult<Token> {
        self.eat_while(char::is_whitespace);
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Equal),
            ':' => Some(Token::Colon),
            ',' | ';' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok(token);
        }

        match c {
            '<' => {
                self.bump();
                Ok(match self.peek_char() {
                    Some('=') => {
                        self.bump();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.bump();
                        Token::NotEqual
                    }
                    _ => Token::Less,
                })
            }
            '>' => {
                self.bump();
                if self.peek_char() == Some('=') {
                    self.bump();
                    return Ok(Token::GreaterEqual);
                }
                Ok(Token::Greater)
            }
            '"' => self.scan_text(),
            '\'' => self.scan_quoted_sheet(),
            '#' => self.scan_error(),
            c if c.is_ascii_digit() || c == '.' => self.scan_number(),
            c if c.is_alphabetic() || c == '_' || c == '$' => Ok(self.scan_word()),
            other => Err(FormulaError::Parse(format!("unexpected character '{other}'"))),
        }
    }

    fn scan_text(&mut self) -> FormulaResult<Token> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => return Err(FormulaError::Parse("unterminated string".into())),
                Some('"') => {
                    self.bump();
                    // "" inside a string is a literal quote
                    if self.peek_char() == Some('"') {
                        text.push('"');
                        self.bump();
                    } else {
                        return Ok(Token::Text(text));
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> FormulaResult<Token> {
        self.bump();
        let mut name = String::new();
        loop {
            match self.peek_char() {
                None => return Err(FormulaError::Parse("unterminated sheet name".into())),
                Some('\'') => {
                    self.bump();
                    if self.peek_char() == Some('\'') {
                        name.push('\'');
                        self.bump();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    name.push(c);
                    self.bump();
                }
            }
        }
        if self.peek_char() != Some('!') {
            return Err(FormulaError::Parse(format!("expected '!' after '{name}'")));
        }
        self.bump();
        Ok(Token::Sheet(name))
    }

    fn scan_error(&mut self) -> FormulaResult<Token> {
        let rest = &self.input[self.pos..];
        let literal = ERROR_LITERALS
            .iter()
            .find(|lit| rest.get(..lit.len()).is_some_and(|head| head.eq_ignore_ascii_case(lit)))
            .ok_or_else(|| FormulaError::Parse(format!("unknown error literal in '{rest}'")))?;
        self.pos += literal.len();
        Ok(Token::Error((*literal).to_string()))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek_char() == Some('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.bump();
            }
            self.eat_while(|c| c.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];
        text.parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("invalid number '{text}'")))
    }

    fn scan_word(&mut self) -> Token {
        let word = self.eat_while(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));
        if self.peek_char() == Some('!') {
            self.bump();
            return Token::Sheet(word.to_string());
        }
        let call = self.peek_char() == Some('(');
        if !call {
            if word.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if word.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if looks_like_cell(word) {
                return Token::CellRef(word.to_string());
            }
        }
        Token::Ident(word.to_string())
    }

    // === Token stream ===

    fn current(&self) -> &Token {
        &self.current
    }

    fn advance(&mut self) -> FormulaResult<Token> {
        let next = self.scan()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> FormulaResult<()> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "expected {expected:?}, found {:?}",
                self.current
            )))
        }
    }

    // === Expressions ===

    fn expression(&mut self) -> FormulaResult<Expr> {
        let mut left = self.concatenation()?;
        loop {
            let op = match self.current() {
                Token::Equal => BinaryOp::Equal,
                Token::NotEqual => BinaryOp::NotEqual,
                Token::Less => BinaryOp::Less,
                Token::LessEqual => BinaryOp::LessEqual,
                Token::Greater => BinaryOp::Greater,
                Token::GreaterEqual => BinaryOp::GreaterEqual,
                _ => return Ok(left),
            };
            self.advance()?;
            left = binary(op, left, self.concatenation()?);
        }
    }

    fn concatenation(&mut self) -> FormulaResult<Expr> {
        let mut left = self.additive()?;
        while self.current() == &Token::Ampersand {
            self.advance()?;
            left = binary(BinaryOp::Concat, left, self.additive()?);
        }
        Ok(left)
    }

    fn additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance()?;
            left = binary(op, left, self.multiplicative()?);
        }
    }

    fn multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.power()?;
        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.advance()?;
            left = binary(op, left, self.power()?);
        }
    }

    /// `^` is left-associative in spreadsheets: `2^3^2` is 64
    fn power(&mut self) -> FormulaResult<Expr> {
        let mut left = self.unary()?;
        while self.current() == &Token::Caret {
            self.advance()?;
            left = binary(BinaryOp::Power, left, self.unary()?);
        }
        Ok(left)
    }

    fn unary(&mut self) -> FormulaResult<Expr> {
        match self.current() {
            Token::Minus => {
                self.advance()?;
                let operand = self.unary()?;
                return Ok(Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                });
            }
            Token::Plus => {
                self.advance()?;
                return self.unary();
            }
            _ => {}
        }
        let mut expr = self.primary()?;
        while self.current() == &Token::Percent {
            self.advance()?;
            expr = Expr::Unary {
                op: UnaryOp::Percent,
                operand: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> FormulaResult<Expr> {
        match self.advance()? {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Text(s) => Ok(Expr::Text(s)),
            Token::Boolean(b) => Ok(Expr::Boolean(b)),
            Token::Error(e) => Ok(Expr::Error(e)),
            Token::CellRef(text) => self.reference(None, &text),
            Token::Sheet(sheet) => match self.advance()? {
                Token::CellRef(text) => self.reference(Some(sheet), &text),
                other => Err(FormulaError::Parse(format!(
                    "expected a cell after '{sheet}!', found {other:?}"
                ))),
            },
            Token::Ident(name) => {
                if self.current() != &Token::LeftParen {
                    return Err(FormulaError::Unsupported(format!("name '{name}'")));
                }
                self.advance()?;
                let args = self.arguments()?;
                Ok(Expr::Function {
                    name: name.to_ascii_uppercase(),
                    args,
                })
            }
            Token::LeftParen => {
                let inner = self.expression()?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::Parse(format!("unexpected {other:?}"))),
        }
    }

    /// A cell, or a range when a `:` follows
    fn reference(&mut self, sheet: Option<String>, text: &str) -> FormulaResult<Expr> {
        let start = cell_address(text)?;
        if self.current() != &Token::Colon {
            return Ok(Expr::Cell {
                sheet,
                address: start,
            });
        }
        self.advance()?;
        match self.advance()? {
            Token::CellRef(end) => Ok(Expr::Range {
                sheet,
                range: CellRange::new(start, cell_address(&end)?),
            }),
            other => Err(FormulaError::Unsupported(format!("range ending in {other:?}"))),
        }
    }

    /// Arguments after `(` up to and including `)`; empty arguments are not allowed
    fn arguments(&mut self) -> FormulaResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.current() == &Token::RightParen {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance()? {
                Token::Comma => continue,
                Token::RightParen => return Ok(args),
                other => {
                    return Err(FormulaError::Parse(format!(
                        "expected ',' or ')' in arguments, found {other:?}"
                    )))
                }
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `[$]letters[$]digits` with nothing else
fn looks_like_cell(word: &str) -> bool {
    let rest = word.strip_prefix('$').unwrap_or(word);
    let letters = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let rest = &rest[letters..];
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

fn cell_address(text: &str) -> FormulaResult<CellAddress> {
    CellAddress::parse(text).map_err(|e| FormulaError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(a1: &str) -> Expr {
        Expr::Cell {
            sheet: None,
            address: CellAddress::parse(a1).unwrap(),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse("=1+B2*3").unwrap();
        assert_eq!(
            expr,
            binary(
                BinaryOp::Add,
                Expr::Number(1.0),
                binary(BinaryOp::Multiply, cell("B2"), Expr::Number(3.0)),
            )
        );
        assert!(matches!(
            parse("=A1&\"x\"=\"5x\"").unwrap(),
            Expr::Binary { op: BinaryOp::Equal, .. }
        ));
    }

    #[test]
    fn test_functions_ranges_and_sheets() {
        let expr = parse("=sum(A1:$B$3, 'My Data'!C4, Sheet2!D1:D2)").unwrap();
        let Expr::Function { name, args } = expr else {
            panic!("expected a function call");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0], Expr::Range { sheet: None, range } if range.to_a1() == "A1:B3"));
        assert!(matches!(&args[1], Expr::Cell { sheet: Some(s), .. } if s == "My Data"));
        assert!(matches!(&args[2], Expr::Range { sheet: Some(s), .. } if s == "Sheet2"));
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("=\"say \"\"hi\"\"\"").unwrap(), Expr::Text("say \"hi\"".into()));
        assert_eq!(parse("=TRUE").unwrap(), Expr::Boolean(true));
        assert_eq!(parse("=#div/0!").unwrap(), Expr::Error("#DIV/0!".into()));
        assert_eq!(parse("=1.5e2").unwrap(), Expr::Number(150.0));
        // a cell-like name followed by ( is a call
        assert!(matches!(parse("=LOG10(100)").unwrap(), Expr::Function { .. }));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("="), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("=1+"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("=(1"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("=\"open"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("=Rate*2"), Err(FormulaError::Unsupported(_))));
        assert!(matches!(parse("=SUM(A:A)"), Err(FormulaError::Unsupported(_)) | Err(FormulaError::Parse(_))));
    }
}
