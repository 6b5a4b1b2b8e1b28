//! Pratt parser: token stream to expression tree, with symbol resolution.

use core::f64::consts;

use crate::engine::ast::{Func, Node};
use crate::engine::token::{tokenize, Token};
use crate::engine::EngineError;

/// Named constants usable in any expression.
const CONSTANTS: &[(&str, f64)] = &[("pi", consts::PI), ("tau", consts::TAU), ("e", consts::E)];

/// Parse `src` against the declared variable list.
pub(crate) fn parse(src: &str, vars: &[String]) -> Result<Node, EngineError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        vars,
    };
    let node = parser.expr(0)?;
    match parser.peek() {
        None => Ok(node),
        Some(Token::RParen) => Err(EngineError::UnbalancedParens),
        Some(tok) => Err(EngineError::UnexpectedToken(tok.describe())),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    vars: &'a [String],
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self) -> Result<(), EngineError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            Some(tok) => Err(EngineError::UnexpectedToken(tok.describe())),
            None => Err(EngineError::UnbalancedParens),
        }
    }

    /// Precedence-climbing over infix operators. Binding powers:
    /// `+ -` (1,2), `* /` (3,4), `^` (6,5) so `^` associates right.
    fn expr(&mut self, min_bp: u8) -> Result<Node, EngineError> {
        let mut lhs = self.prefix()?;

        while let Some(tok) = self.peek() {
            let (lbp, rbp) = match tok {
                Token::Plus | Token::Minus => (1, 2),
                Token::Star | Token::Slash => (3, 4),
                Token::Caret => (6, 5),
                _ => break,
            };
            if lbp < min_bp {
                break;
            }
            let op = self.next().cloned().expect("peeked");
            let rhs = self.expr(rbp)?;
            lhs = match op {
                Token::Plus => Node::Add(Box::new(lhs), Box::new(rhs)),
                Token::Minus => Node::Sub(Box::new(lhs), Box::new(rhs)),
                Token::Star => Node::Mul(Box::new(lhs), Box::new(rhs)),
                Token::Slash => Node::Div(Box::new(lhs), Box::new(rhs)),
                Token::Caret => Node::Pow(Box::new(lhs), Box::new(rhs)),
                _ => unreachable!(),
            };
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Node, EngineError> {
        match self.next().cloned() {
            Some(Token::Num(v)) => Ok(Node::Num(v)),
            Some(Token::Minus) => {
                // unary minus binds tighter than `* /` but looser than `^`,
                // so `-x^2` reads as `-(x^2)`
                let inner = self.expr(5)?;
                Ok(Node::Neg(Box::new(inner)))
            }
            Some(Token::LParen) => {
                let inner = self.expr(0)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.resolve(&name),
            Some(tok) => Err(EngineError::UnexpectedToken(tok.describe())),
            None => Err(EngineError::UnexpectedEnd),
        }
    }

    /// Resolve an identifier to a variable, constant or function call.
    fn resolve(&mut self, name: &str) -> Result<Node, EngineError> {
        if let Some(idx) = self.vars.iter().position(|v| v == name) {
            return Ok(Node::Var(idx));
        }
        if let Some(&(_, value)) = CONSTANTS.iter().find(|(n, _)| *n == name) {
            return Ok(Node::Num(value));
        }
        if let Some(func) = Func::from_name(name) {
            return match self.next() {
                Some(Token::LParen) => {
                    let arg = self.expr(0)?;
                    self.expect_rparen()?;
                    Ok(Node::Call(func, Box::new(arg)))
                }
                Some(tok) => Err(EngineError::UnexpectedToken(tok.describe())),
                None => Err(EngineError::UnexpectedEnd),
            };
        }
        Err(EngineError::UndefinedSymbol {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })
    }

    /// Closest known name within edit distance 2, if any.
    fn suggest(&self, name: &str) -> Option<String> {
        Func::known_names()
            .iter()
            .copied()
            .chain(CONSTANTS.iter().map(|(n, _)| *n))
            .chain(self.vars.iter().map(String::as_str))
            .map(|known| (strsim::levenshtein(name, known), known))
            .filter(|(dist, _)| *dist <= 2)
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, known)| known.to_string())
    }
}
