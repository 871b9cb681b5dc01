//! Parser for the concrete LTLf syntax.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! formula := implies ( '<->' implies )*
//! implies := xor ( '->' xor )*
//! xor     := or ( '^' or )*
//! or      := and ( '|' and )*
//! and     := temporal ( '&' temporal )*
//! temporal:= unary ( ('U' | 'R') unary )*        right-associative
//! unary   := ('!' | 'X[!]' | 'X' | 'F' | 'G') unary | primary
//! primary := '(' formula ')' | 'tt' | 'ff' | 'true' | 'false' | ident
//! ```
//!
//! `X[!]` is the strong next, `X` the weak one. The single uppercase letters
//! `X`, `U`, `R`, `F`, `G` are reserved and cannot be used as atom names.

use crate::error::SynthError;
use crate::logic::{Arena, Ltlf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    TraceTrue,
    TraceFalse,
    PropTrue,
    PropFalse,
    Not,
    And,
    Or,
    Implies,
    Equivalent,
    Xor,
    StrongNext,
    WeakNext,
    Until,
    Release,
    Eventually,
    Always,
    LParen,
    RParen,
}

struct Lexer<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text: text.as_bytes(), pos: 0 }
    }

    fn error(&self, msg: impl Into<String>) -> SynthError {
        SynthError::Parse { pos: self.pos, msg: msg.into() }
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, SynthError> {
        let mut tokens = Vec::new();
        while self.pos < self.text.len() {
            let start = self.pos;
            let c = self.text[self.pos];
            let token = match c {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                    continue;
                }
                b'(' => {
                    self.pos += 1;
                    Token::LParen
                }
                b')' => {
                    self.pos += 1;
                    Token::RParen
                }
                b'!' => {
                    self.pos += 1;
                    Token::Not
                }
                b'&' => {
                    self.pos += 1;
                    Token::And
                }
                b'|' => {
                    self.pos += 1;
                    Token::Or
                }
                b'^' => {
                    self.pos += 1;
                    Token::Xor
                }
                b'-' => {
                    if self.text.get(self.pos + 1) == Some(&b'>') {
                        self.pos += 2;
                        Token::Implies
                    } else {
                        return Err(self.error("expected '->'"));
                    }
                }
                b'<' => {
                    if self.text[self.pos..].starts_with(b"<->") {
                        self.pos += 3;
                        Token::Equivalent
                    } else {
                        return Err(self.error("expected '<->'"));
                    }
                }
                c if c.is_ascii_alphabetic() || c == b'_' => self.word(),
                c => return Err(self.error(format!("unexpected character '{}'", c as char))),
            };
            tokens.push((start, token));
        }
        Ok(tokens)
    }

    fn word(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.text.len() {
            let c = self.text[self.pos];
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
        match word {
            "tt" => Token::TraceTrue,
            "ff" => Token::TraceFalse,
            "true" => Token::PropTrue,
            "false" => Token::PropFalse,
            "X" => {
                if self.text[self.pos..].starts_with(b"[!]") {
                    self.pos += 3;
                    Token::StrongNext
                } else {
                    Token::WeakNext
                }
            }
            "U" => Token::Until,
            "R" => Token::Release,
            "F" => Token::Eventually,
            "G" => Token::Always,
            _ => Token::Ident(word.to_string()),
        }
    }
}

struct Parser<'a> {
    arena: &'a Arena,
    tokens: Vec<(usize, Token)>,
    pos: usize,
    len: usize,
}

/// Parses `text` into a formula interned in `arena`.
pub fn parse(arena: &Arena, text: &str) -> Result<Ltlf, SynthError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser { arena, tokens, pos: 0, len: text.len() };
    let f = parser.formula()?;
    parser.expect_end()?;
    Ok(f)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn here(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |&(p, _)| p)
    }

    fn error(&self, msg: impl Into<String>) -> SynthError {
        SynthError::Parse { pos: self.here(), msg: msg.into() }
    }

    fn expect_end(&self) -> Result<(), SynthError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.error("trailing input after formula"))
        }
    }

    fn chain(
        &mut self,
        op: Token,
        next: impl Fn(&mut Self) -> Result<Ltlf, SynthError>,
        build: impl FnOnce(&Arena, Vec<Ltlf>) -> Ltlf,
    ) -> Result<Ltlf, SynthError> {
        let first = next(self)?;
        if self.peek() != Some(&op) {
            return Ok(first);
        }
        let mut args = vec![first];
        while self.peek() == Some(&op) {
            self.advance();
            args.push(next(self)?);
        }
        Ok(build(self.arena, args))
    }

    fn formula(&mut self) -> Result<Ltlf, SynthError> {
        self.chain(Token::Equivalent, Self::implies, |a, args| a.equivalent(args))
    }

    fn implies(&mut self) -> Result<Ltlf, SynthError> {
        self.chain(Token::Implies, Self::xor, |a, args| a.implies(args))
    }

    fn xor(&mut self) -> Result<Ltlf, SynthError> {
        self.chain(Token::Xor, Self::or, |a, args| a.xor(args))
    }

    fn or(&mut self) -> Result<Ltlf, SynthError> {
        self.chain(Token::Or, Self::and, |a, args| a.or(args))
    }

    fn and(&mut self) -> Result<Ltlf, SynthError> {
        self.chain(Token::And, Self::temporal, |a, args| a.and(args))
    }

    fn temporal(&mut self) -> Result<Ltlf, SynthError> {
        let lhs = self.unary()?;
        match self.peek() {
            Some(Token::Until) => {
                self.advance();
                let rhs = self.temporal()?;
                Ok(self.arena.until(vec![lhs, rhs]))
            }
            Some(Token::Release) => {
                self.advance();
                let rhs = self.temporal()?;
                Ok(self.arena.release(vec![lhs, rhs]))
            }
            _ => Ok(lhs),
        }
    }

    fn unary(&mut self) -> Result<Ltlf, SynthError> {
        match self.peek() {
            Some(Token::Not) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.arena.not(f))
            }
            Some(Token::StrongNext) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.arena.next(f))
            }
            Some(Token::WeakNext) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.arena.weak_next(f))
            }
            Some(Token::Eventually) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.arena.eventually(f))
            }
            Some(Token::Always) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.arena.always(f))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Ltlf, SynthError> {
        let pos = self.here();
        match self.advance() {
            Some(Token::LParen) => {
                let f = self.formula()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(f),
                    _ => Err(SynthError::Parse { pos: self.here(), msg: "expected ')'".into() }),
                }
            }
            Some(Token::TraceTrue) => Ok(self.arena.tt()),
            Some(Token::TraceFalse) => Ok(self.arena.ff()),
            Some(Token::PropTrue) => Ok(self.arena.prop_true()),
            Some(Token::PropFalse) => Ok(self.arena.prop_false()),
            Some(Token::Ident(name)) => Ok(self.arena.atom(&name)),
            Some(t) => Err(SynthError::Parse { pos, msg: format!("unexpected token {t:?}") }),
            None => Err(SynthError::Parse { pos, msg: "unexpected end of input".into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LtlfNode;
    use test_log::test;

    fn roundtrip(text: &str) -> String {
        let arena = Arena::new();
        let f = parse(&arena, text).unwrap();
        arena.fmt(f)
    }

    #[test]
    fn atoms_and_constants() {
        assert_eq!(roundtrip("a"), "a");
        assert_eq!(roundtrip("tt"), "tt");
        assert_eq!(roundtrip("ff"), "ff");
        assert_eq!(roundtrip("true"), "true");
        assert_eq!(roundtrip("false"), "false");
    }

    #[test]
    fn precedence() {
        assert_eq!(roundtrip("a & b | c"), "((a & b) | c)");
        assert_eq!(roundtrip("a | b -> c"), "((a | b) -> c)");
        assert_eq!(roundtrip("a & b U c"), "(a & (b U c))");
        assert_eq!(roundtrip("! a U b"), "(!a U b)");
        assert_eq!(roundtrip("a <-> b -> c"), "(a <-> (b -> c))");
    }

    #[test]
    fn next_variants() {
        assert_eq!(roundtrip("X[!] a"), "X[!](a)");
        assert_eq!(roundtrip("X a"), "X(a)");
        assert_eq!(roundtrip("X[!] X a"), "X[!](X(a))");
    }

    #[test]
    fn until_is_right_associative() {
        let arena = Arena::new();
        let f = parse(&arena, "a U b U c").unwrap();
        let b_u_c = arena.until(vec![arena.atom("b"), arena.atom("c")]);
        assert_eq!(f, arena.until(vec![arena.atom("a"), b_u_c]));
    }

    #[test]
    fn mixed_until_release() {
        let arena = Arena::new();
        let f = parse(&arena, "a U b R c").unwrap();
        let b_r_c = arena.release(vec![arena.atom("b"), arena.atom("c")]);
        assert_eq!(f, arena.until(vec![arena.atom("a"), b_r_c]));
    }

    #[test]
    fn nary_chains() {
        let arena = Arena::new();
        let f = parse(&arena, "a <-> b <-> c").unwrap();
        assert!(matches!(arena.node(f), LtlfNode::Equivalent(args) if args.len() == 3));
    }

    #[test]
    fn errors_carry_position() {
        let arena = Arena::new();
        let err = parse(&arena, "a &").unwrap_err();
        assert!(matches!(err, SynthError::Parse { .. }));
        let err = parse(&arena, "a @ b").unwrap_err();
        assert!(matches!(err, SynthError::Parse { pos: 2, .. }));
    }

    #[test]
    fn reserved_words_are_not_atoms() {
        let arena = Arena::new();
        assert!(parse(&arena, "U").is_err());
        let f = parse(&arena, "G a").unwrap();
        assert!(matches!(arena.node(f), LtlfNode::Always(_)));
    }
}
