//! Lexer for the expression grammar.

use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// Short human-readable form for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Num(v) => format!("{v}"),
            Token::Ident(s) => s.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Caret => "^".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

/// Split `src` into tokens. Identifiers are `[A-Za-z_][A-Za-z0-9_]*`,
/// numbers are decimal literals with an optional fractional part.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, EngineError> {
    let mut out = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_ascii_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                out.push(Token::Plus);
            }
            '-' => {
                chars.next();
                out.push(Token::Minus);
            }
            '*' => {
                chars.next();
                out.push(Token::Star);
            }
            '/' => {
                chars.next();
                out.push(Token::Slash);
            }
            '^' => {
                chars.next();
                out.push(Token::Caret);
            }
            '(' => {
                chars.next();
                out.push(Token::LParen);
            }
            ')' => {
                chars.next();
                out.push(Token::RParen);
            }
            ',' => {
                chars.next();
                out.push(Token::Comma);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &src[start..end];
                let value: f64 = text
                    .parse()
                    .map_err(|_| EngineError::InvalidNumber(text.to_string()))?;
                out.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(Token::Ident(src[start..end].to_string()));
            }
            other => return Err(EngineError::UnexpectedChar(other)),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_mixed_expression() {
        let toks = tokenize("2*sqrt(x1) - .5").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Num(2.0),
                Token::Star,
                Token::Ident("sqrt".into()),
                Token::LParen,
                Token::Ident("x1".into()),
                Token::RParen,
                Token::Minus,
                Token::Num(0.5),
            ]
        );
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(tokenize("x $ 2"), Err(EngineError::UnexpectedChar('$')));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(
            tokenize("1.2.3"),
            Err(EngineError::InvalidNumber("1.2.3".into()))
        );
    }
}
