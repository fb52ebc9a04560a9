//! Reader for the textual type syntax (`Map<K, List<? extends V>>[]`).
//!
//! Only simple names are accepted; qualified names are rejected.

use std::str::FromStr;

use symgen_core::ModelError;

use crate::{Type, TypeArgument, TypeArguments, WildcardBound};

impl FromStr for Type {
    type Err = ModelError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut reader = Reader {
            text,
            chars: text.chars().collect(),
            pos: 0,
        };
        let ty = reader.ty()?;
        reader.skip_ws();
        if !reader.at_end() {
            return Err(reader.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

struct Reader<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Reader<'_> {
    fn error(&self, what: &str) -> ModelError {
        ModelError::Invalid(format!(
            "invalid type expression `{}` at offset {}: {what}",
            self.text, self.pos
        ))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String, ModelError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            let ok = if self.pos == start {
                c.is_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_alphanumeric() || c == '_' || c == '$'
            };
            if !ok {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a name"));
        }
        if self.peek() == Some('.') {
            return Err(self.error("qualified names are not supported"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn ty(&mut self) -> Result<Type, ModelError> {
        let name = self.ident()?;
        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.argument()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected `,` or `>`"));
            }
        }
        let mut dims = 0;
        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected `]`"));
            }
            dims += 1;
        }
        Ok(Type {
            name,
            args: TypeArguments(args),
            dims,
        })
    }

    fn argument(&mut self) -> Result<TypeArgument, ModelError> {
        if !self.eat('?') {
            return Ok(TypeArgument::Type(self.ty()?));
        }
        self.skip_ws();
        let save = self.pos;
        if let Ok(keyword) = self.ident() {
            match keyword.as_str() {
                "extends" => return Ok(TypeArgument::Wildcard(WildcardBound::Extends(self.ty()?))),
                "super" => return Ok(TypeArgument::Wildcard(WildcardBound::Super(self.ty()?))),
                _ => return Err(self.error("expected `extends` or `super`")),
            }
        }
        self.pos = save;
        Ok(TypeArgument::Wildcard(WildcardBound::Unbounded))
    }
}
