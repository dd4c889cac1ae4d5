//! Recursive-descent parser. One syntax error per file: parsing stops at the
//! first unexpected token.

use super::{
    ast::{ComponentDecl, EnumDecl, Item, Literal, LiteralExpr, MemberDecl, MemberKind, PathRef, SourceFile},
    diagnostic::{Diagnostic, Span},
    lexer::{Token, TokenKind, tokenize},
};
use std::path::Path;

pub fn parse(path: &Path, source: &str) -> Result<SourceFile, Diagnostic> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        namespace: None,
    };
    let items = parser.items()?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        items,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    namespace: Option<String>,
}

impl Parser {
    fn peek(&self) -> &Token {
        // `tokenize` always ends with Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let token = self.peek();
        Diagnostic::error(format!("expected {expected}, found {}", token.kind)).at(token.span)
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().kind == TokenKind::Punct(c)
    }

    fn at_keyword(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s == word)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        let hit = self.at_punct(c);
        if hit {
            self.advance();
        }
        hit
    }

    fn expect_punct(&mut self, c: char) -> Result<Span, Diagnostic> {
        if self.at_punct(c) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&format!("`{c}`")))
        }
    }

    fn ident(&mut self) -> Result<(String, Span), Diagnostic> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn path(&mut self) -> Result<PathRef, Diagnostic> {
        let (first, span) = self.ident()?;
        let mut segments = vec![first];
        while self.eat_punct('.') {
            segments.push(self.ident()?.0);
        }
        Ok(PathRef { segments, span })
    }

    fn items(&mut self) -> Result<Vec<Item>, Diagnostic> {
        let mut items = Vec::new();
        loop {
            if self.peek().kind == TokenKind::Eof {
                return Ok(items);
            }
            if self.at_keyword("namespace") {
                self.advance();
                let path = self.path()?;
                self.expect_punct(';')?;
                self.namespace = Some(path.joined());
            } else if self.at_keyword("enum") {
                items.push(Item::Enum(self.enum_decl()?));
            } else if self.at_keyword("component") || self.at_keyword("abstract") {
                items.push(Item::Component(self.component_decl()?));
            } else {
                return Err(self.unexpected("`namespace`, `enum` or `component`"));
            }
        }
    }

    fn enum_decl(&mut self) -> Result<EnumDecl, Diagnostic> {
        let span = self.advance().span;
        let (name, _) = self.ident()?;
        self.expect_punct('{')?;

        let mut variants = Vec::new();
        while !self.at_punct('}') {
            variants.push(self.ident()?);
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct('}')?;

        Ok(EnumDecl {
            name,
            namespace: self.namespace.clone(),
            variants,
            span,
        })
    }

    fn component_decl(&mut self) -> Result<ComponentDecl, Diagnostic> {
        let span = self.peek().span;
        let is_abstract = self.at_keyword("abstract");
        if is_abstract {
            self.advance();
        }
        if !self.at_keyword("component") {
            return Err(self.unexpected("`component`"));
        }
        self.advance();

        let (name, _) = self.ident()?;
        let base = if self.eat_punct(':') {
            Some(self.path()?)
        } else {
            None
        };

        self.expect_punct('{')?;
        let mut members = Vec::new();
        while !self.at_punct('}') {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.unexpected("`}`"));
            }
            members.push(self.member()?);
        }
        self.expect_punct('}')?;

        Ok(ComponentDecl {
            name,
            namespace: self.namespace.clone(),
            is_abstract,
            base,
            members,
            span,
        })
    }

    fn member(&mut self) -> Result<MemberDecl, Diagnostic> {
        let is_prop = self.at_keyword("prop");
        if is_prop {
            self.advance();
        }

        let (name, span) = self.ident()?;
        self.expect_punct(':')?;
        let ty = self.path()?;
        let default = if self.eat_punct('=') {
            Some(self.literal()?)
        } else {
            None
        };

        let kind = if is_prop {
            self.accessors()?
        } else {
            self.expect_punct(';')?;
            MemberKind::Field
        };

        Ok(MemberDecl {
            name,
            ty,
            default,
            kind,
            span,
        })
    }

    fn accessors(&mut self) -> Result<MemberKind, Diagnostic> {
        self.expect_punct('{')?;
        let (mut get, mut set, mut range) = (false, false, None);

        while !self.at_punct('}') {
            let (word, span) = self.ident()?;
            match word.as_str() {
                "get" => get = true,
                "set" => set = true,
                "range" => {
                    self.expect_punct('(')?;
                    let min = self.number()?;
                    self.expect_punct(',')?;
                    let max = self.number()?;
                    self.expect_punct(')')?;
                    if min > max {
                        return Err(Diagnostic::error(format!("empty range({min}, {max})")).at(span));
                    }
                    range = Some((min, max));
                }
                other => {
                    return Err(Diagnostic::error(format!(
                        "unknown accessor `{other}` (expected `get`, `set` or `range`)"
                    ))
                    .at(span));
                }
            }
            self.eat_punct(';');
        }
        self.expect_punct('}')?;

        Ok(MemberKind::Property { get, set, range })
    }

    fn number(&mut self) -> Result<f64, Diagnostic> {
        match self.peek().kind.clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(v as f64)
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(v)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn literal(&mut self) -> Result<LiteralExpr, Diagnostic> {
        let span = self.peek().span;
        let literal = match self.peek().kind.clone() {
            TokenKind::Int(v) => {
                self.advance();
                Literal::Int(v)
            }
            TokenKind::Float(v) => {
                self.advance();
                Literal::Float(v)
            }
            TokenKind::Str(s) => {
                self.advance();
                Literal::Str(s)
            }
            TokenKind::Ident(word) if word == "true" || word == "false" => {
                self.advance();
                Literal::Bool(word == "true")
            }
            TokenKind::Ident(_) => Literal::Path(self.path()?.segments),
            TokenKind::Punct('(') => {
                self.advance();
                let mut values = vec![self.number()?];
                while self.eat_punct(',') {
                    values.push(self.number()?);
                }
                self.expect_punct(')')?;
                Literal::Tuple(values)
            }
            _ => return Err(self.unexpected("literal")),
        };
        Ok(LiteralExpr { literal, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
namespace Game.Player;

enum Team { Red, Blue, }

component Mover : Behaviour {
    speed: float = 5.0;
    team: Team = Team.Red;
    offset: vec3 = (0, 1, 0);
    prop health: int = 100 { get; set; range(0, 100) }
}

abstract component Base { tint: color = (1, 1, 1, 1); }
"#;

    fn parse_str(src: &str) -> Result<SourceFile, Diagnostic> {
        parse(Path::new("test.nes"), src)
    }

    #[test]
    fn test_parse_sample() {
        let file = parse_str(SAMPLE).unwrap();
        assert_eq!(file.items.len(), 3);

        let Item::Enum(team) = &file.items[0] else { panic!("expected enum") };
        assert_eq!(team.variants.len(), 2);
        assert_eq!(file.items[0].qualified_name(), "Game.Player.Team");

        let Item::Component(mover) = &file.items[1] else { panic!("expected component") };
        assert_eq!(mover.base.as_ref().unwrap().joined(), "Behaviour");
        assert_eq!(mover.members.len(), 4);
        assert_eq!(
            mover.members[1].default.as_ref().unwrap().literal,
            Literal::Path(vec!["Team".into(), "Red".into()])
        );
        assert_eq!(
            mover.members[3].kind,
            MemberKind::Property {
                get: true,
                set: true,
                range: Some((0.0, 100.0))
            }
        );

        let Item::Component(base) = &file.items[2] else { panic!("expected component") };
        assert!(base.is_abstract);
        assert_eq!(
            base.members[0].default.as_ref().unwrap().literal,
            Literal::Tuple(vec![1.0; 4])
        );
    }

    #[test]
    fn test_namespace_applies_to_following_items() {
        let file = parse_str("component A {}\nnamespace N;\ncomponent B {}").unwrap();
        assert_eq!(file.items[0].qualified_name(), "A");
        assert_eq!(file.items[1].qualified_name(), "N.B");
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_str("component A {\n    speed float;\n}").unwrap_err();
        assert!(err.message.contains("expected `:`"), "{}", err.message);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_missing_close_brace() {
        let err = parse_str("component A { x: int = 1;").unwrap_err();
        assert!(err.message.contains("end of file"));
    }

    #[test]
    fn test_unknown_accessor() {
        let err = parse_str("component A { prop x: int { get; frob; } }").unwrap_err();
        assert!(err.message.contains("unknown accessor `frob`"));
    }
}
