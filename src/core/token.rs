use serde::Serialize;
use std::fmt;

use super::{Field, Method};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    SimpleType {
        underlying: String,
    },
    Interface {
        methods: Vec<Method>,
        embedded: Vec<String>,
    },
    Struct {
        fields: Vec<Field>,
    },
}

/// One renderable type in a package's API surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    id: String,
    pub name: String,
    pub package: String,
    /// Package the shape was copied from, for hoisted aliases
    pub origin: Option<String>,
    #[serde(flatten)]
    pub kind: TokenKind,
}

impl Token {
    fn new(package: &str, name: &str, origin: Option<&str>, kind: TokenKind) -> Self {
        Self {
            id: token_id(package, name),
            name: name.to_string(),
            package: package.to_string(),
            origin: origin.map(str::to_string),
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

pub fn token_id(package: &str, name: &str) -> String {
    format!("{}.{}", package, name)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::SimpleType { underlying } => {
                write!(f, "type {} {}", self.name, underlying)
            }
            TokenKind::Interface { methods, embedded } => {
                if methods.is_empty() && embedded.is_empty() {
                    return write!(f, "type {} interface{{}}", self.name);
                }
                writeln!(f, "type {} interface {{", self.name)?;
                for element in embedded {
                    writeln!(f, "\t{}", element)?;
                }
                for method in methods {
                    writeln!(f, "\t{}{}", method.name, method.signature)?;
                }
                write!(f, "}}")
            }
            TokenKind::Struct { fields } => {
                if fields.is_empty() {
                    return write!(f, "type {} struct{{}}", self.name);
                }
                writeln!(f, "type {} struct {{", self.name)?;
                for field in fields {
                    write!(f, "\t")?;
                    if let Some(name) = &field.name {
                        write!(f, "{} ", name)?;
                    }
                    write!(f, "{}", field.type_text)?;
                    if let Some(tag) = &field.tag {
                        write!(f, " {}", tag)?;
                    }
                    writeln!(f)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The rendered API surface of one package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Content {
    tokens: Vec<Token>,
}

impl Content {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.id == id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn add_simple_type(
        &mut self,
        origin: Option<&str>,
        name: &str,
        package: &str,
        underlying: &str,
    ) -> &Token {
        let kind = TokenKind::SimpleType {
            underlying: underlying.to_string(),
        };
        self.push(Token::new(package, name, origin, kind))
    }

    pub fn add_interface(
        &mut self,
        origin: Option<&str>,
        name: &str,
        package: &str,
        methods: &[Method],
        embedded: &[String],
    ) -> &Token {
        let kind = TokenKind::Interface {
            methods: methods.to_vec(),
            embedded: embedded.to_vec(),
        };
        self.push(Token::new(package, name, origin, kind))
    }

    pub fn add_struct(
        &mut self,
        origin: Option<&str>,
        name: &str,
        package: &str,
        fields: &[Field],
    ) -> &Token {
        let kind = TokenKind::Struct {
            fields: fields.to_vec(),
        };
        self.push(Token::new(package, name, origin, kind))
    }

    fn push(&mut self, token: Token) -> &Token {
        // IDs are unique per package; a later token replaces an earlier one
        if let Some(pos) = self.tokens.iter().position(|existing| existing.id == token.id) {
            let replaced = self.tokens.remove(pos);
            tracing::debug!(id = %token.id, replaced = %replaced, "token replaced");
        }
        self.tokens.push(token);
        &self.tokens[self.tokens.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_depends_only_on_package_and_name() {
        let mut a = Content::default();
        let mut b = Content::default();
        let first = a.add_simple_type(None, "Bar", "example/b", "int").id().to_string();
        let second = b
            .add_struct(Some("example/a"), "Bar", "example/b", &[])
            .id()
            .to_string();
        assert_eq!(first, second);
        assert_eq!(first, "example/b.Bar");
    }

    #[test]
    fn struct_token_renders_fields() {
        let mut content = Content::default();
        let fields = vec![
            Field {
                name: Some("X".to_string()),
                type_text: "int".to_string(),
                tag: Some("`json:\"x\"`".to_string()),
            },
            Field {
                name: None,
                type_text: "*Base".to_string(),
                tag: None,
            },
        ];
        let token = content.add_struct(None, "Foo", "m/a", &fields);
        assert_eq!(
            token.to_string(),
            "type Foo struct {\n\tX int `json:\"x\"`\n\t*Base\n}"
        );
    }

    #[test]
    fn adding_same_name_twice_keeps_one_token() {
        let mut content = Content::default();
        content.add_simple_type(None, "A", "m", "int");
        content.add_simple_type(None, "A", "m", "string");
        assert_eq!(content.len(), 1);
        assert_eq!(content.tokens()[0].to_string(), "type A string");
    }

    #[test]
    fn replacing_a_token_leaves_the_others() {
        let mut content = Content::default();
        content.add_simple_type(None, "A", "m", "int");
        content.add_simple_type(None, "B", "m", "int");
        content.add_struct(Some("m/inner"), "A", "m", &[]);

        let ids: Vec<_> = content.tokens().iter().map(Token::id).collect();
        assert_eq!(ids, vec!["m.B", "m.A"]);
        assert_eq!(content.get("m.A").unwrap().origin.as_deref(), Some("m/inner"));
    }
}
