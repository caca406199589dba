//! Arithmetic expression evaluator behind the `calculate` tool.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! sum     = product (('+' | '-') product)*
//! product = unary (('*' | '/') unary)*
//! unary   = '-' unary | power
//! power   = atom ('**' unary)?        right-associative
//! atom    = NUMBER | '(' sum ')'
//! ```
//!
//! Nothing but numbers and these operators is accepted. Nesting through
//! parentheses, negation and exponents is capped at [`MAX_DEPTH`].

use std::iter::Peekable;
use std::str::CharIndices;

/// Deepest nesting the parser descends into before giving up.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    UnclosedParen,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(n) => format!("number {n}"),
            Token::Add => "'+'".into(),
            Token::Sub => "'-'".into(),
            Token::Mul => "'*'".into(),
            Token::Div => "'/'".into(),
            Token::Pow => "'**'".into(),
            Token::Open => "'('".into(),
            Token::Close => "')'".into(),
        }
    }
}

/// Evaluate an arithmetic expression such as `"(10 - 2) * 4"` or `"2 ** 8"`.
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    let tokens = lex(input)?;
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = cursor.sum()?;
    if let Some(tok) = cursor.peek() {
        return Err(ExprError::UnexpectedToken(tok.describe()));
    }
    if !value.is_finite() {
        return Err(ExprError::NotFinite);
    }
    Ok(value)
}

/// Render a result the way the arithmetic tools do: `60` rather than `60.0`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some((pos, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '+' => Token::Add,
            '-' => Token::Sub,
            '/' => Token::Div,
            '(' => Token::Open,
            ')' => Token::Close,
            '^' => Token::Pow,
            '*' => {
                if chars.next_if(|&(_, c)| c == '*').is_some() {
                    Token::Pow
                } else {
                    Token::Mul
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = pos + c.len_utf8();
                while let Some((i, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit() || d == '.') {
                    end = i + d.len_utf8();
                }
                let literal = &input[pos..end];
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(literal.to_string()))?;
                Token::Num(n)
            }
            ch => return Err(ExprError::UnexpectedChar { ch, pos }),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Run `f` one nesting level down.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<f64, ExprError>) -> Result<f64, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn sum(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.product()?;
        loop {
            match self.peek() {
                Some(Token::Add) => {
                    self.bump();
                    acc += self.product()?;
                }
                Some(Token::Sub) => {
                    self.bump();
                    acc -= self.product()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn product(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.bump();
                    acc *= self.unary()?;
                }
                Some(Token::Div) => {
                    self.bump();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    acc /= divisor;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ExprError> {
        if self.peek() == Some(Token::Sub) {
            self.bump();
            return Ok(-self.nested(Self::unary)?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.bump();
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ExprError> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Open) => {
                let inner = self.nested(Self::sum)?;
                match self.bump() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ExprError::UnclosedParen),
                }
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
