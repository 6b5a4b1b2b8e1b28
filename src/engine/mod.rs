//! Symbolic expression engine.
//!
//! The plotting pipeline treats this module as an opaque collaborator: it
//! hands in an expression string plus a declared variable list and gets back
//! an immutable [`Expression`] handle that can be evaluated at a point,
//! differentiated, integrated (polynomials only) and numerically integrated
//! over an interval. Handles are cheap to share (`Arc`) and never mutated,
//! so undo/redo history can hold many versions without copying trees.

mod ast;
mod calculus;
mod parser;
mod token;

use std::fmt;

use thiserror::Error;

use ast::{Node, NodeDisplay};

/// Everything that can go wrong while creating or using an expression.
///
/// Every operation returns its error directly; there is no shared
/// last-error state to race on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid symbol name `{0}`")]
    InvalidSymbolName(String),
    #[error("undefined symbols detected: `{name}`{}", suggestion_suffix(.suggestion))]
    UndefinedSymbol {
        name: String,
        suggestion: Option<String>,
    },
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("mismatched parentheses")]
    UnbalancedParens,
    #[error("expected {expected} value(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a number")]
    NotANumber,
    #[error("result of expression is not a real number")]
    NotReal,
    #[error("can't integrate non-polynomials")]
    NonPolynomial,
    #[error("result of numeric integration is not a real number")]
    IntegralNotReal,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean `{s}`?)"),
        None => String::new(),
    }
}

/// One immutable expression version: a parsed tree, its declared variable
/// order and its display string. Parsed expressions keep the user's input
/// text as display string; derived ones carry canonical text generated
/// from the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    node: Node,
    vars: Vec<String>,
    display: String,
}

fn is_valid_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Expression {
    /// Parse `text` with the given ordered variable list.
    pub fn parse<S: AsRef<str>>(text: &str, variables: &[S]) -> Result<Self, EngineError> {
        let mut vars = Vec::with_capacity(variables.len());
        for v in variables {
            let v = v.as_ref();
            if !is_valid_symbol_name(v) {
                return Err(EngineError::InvalidSymbolName(v.to_string()));
            }
            vars.push(v.to_string());
        }
        let node = parser::parse(text, &vars)?;
        Ok(Self {
            node,
            vars,
            display: text.trim().to_string(),
        })
    }

    /// The declared variable names, in evaluation order.
    pub fn variables(&self) -> &[String] {
        &self.vars
    }

    /// Canonical display text, used by the history for duplicate detection.
    pub fn display_string(&self) -> &str {
        &self.display
    }

    /// Evaluate at a point. `values` are positional, matching
    /// [`variables`](Self::variables).
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, EngineError> {
        if values.len() != self.vars.len() {
            return Err(EngineError::ArityMismatch {
                expected: self.vars.len(),
                got: values.len(),
            });
        }
        let y = self.node.eval(values)?;
        if y.is_nan() {
            Err(EngineError::NotReal)
        } else if y.is_infinite() {
            Err(EngineError::NotANumber)
        } else {
            Ok(y)
        }
    }

    fn var_index(&self, name: &str) -> Result<usize, EngineError> {
        if !is_valid_symbol_name(name) {
            return Err(EngineError::InvalidSymbolName(name.to_string()));
        }
        self.vars
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    fn derived(&self, node: Node) -> Self {
        let display = NodeDisplay {
            node: &node,
            vars: &self.vars,
        }
        .to_string();
        Self {
            node,
            vars: self.vars.clone(),
            display,
        }
    }

    /// Symbolic derivative with respect to `variable`. The result keeps
    /// this expression's declared variable order.
    pub fn derivative(&self, variable: &str) -> Result<Self, EngineError> {
        let idx = self.var_index(variable)?;
        Ok(self.derived(calculus::differentiate(&self.node, idx)))
    }

    /// Polynomial antiderivative with integration constant `constant`.
    pub fn antiderivative(&self, variable: &str, constant: f64) -> Result<Self, EngineError> {
        let idx = self.var_index(variable)?;
        let node = calculus::antiderivative(&self.node, idx, constant)
            .ok_or(EngineError::NonPolynomial)?;
        Ok(self.derived(node))
    }

    /// Numeric definite integral over `[lower, upper]` (adaptive Simpson).
    /// Any additional declared variables are left unbound, which surfaces
    /// as a non-real result, matching evaluation of an underdetermined
    /// expression.
    pub fn definite_integral(
        &self,
        variable: &str,
        lower: f64,
        upper: f64,
    ) -> Result<f64, EngineError> {
        let idx = self.var_index(variable)?;
        let unbound = vec![f64::NAN; self.vars.len()];
        calculus::definite_integral(
            |x| {
                let mut values = unbound.clone();
                values[idx] = x;
                self.node.eval(&values)
            },
            lower,
            upper,
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
