use std::fmt;

use crate::token::Span;

/// The name of the identifier denoting the empty/null value. An empty
/// parenthesized form parses to this identifier, and it prints back as `()`.
pub const NIL: &str = "nil";

/// One surface form. The tree is immutable after parsing; every child is
/// owned exclusively by its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// A symbol.
    Ident(Box<str>),
    /// A string literal, kept raw (quotes and escape sequences included).
    Str(Box<str>),
    /// A numeric literal, kept as written.
    Number { text: Box<str>, kind: NumberKind },
    /// A square-bracketed literal sequence.
    Vector(Vec<Node>),
    /// A parenthesized form: callee followed by arguments.
    Call { callee: Box<Node>, args: Vec<Node> },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    Float,
    Complex,
}

impl Node {
    pub fn ident(name: impl Into<Box<str>>, span: Span) -> Node {
        Node {
            kind: NodeKind::Ident(name.into()),
            span,
        }
    }

    pub fn nil(span: Span) -> Node {
        Node::ident(NIL, span)
    }

    /// Returns the symbol name if this node is an identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.as_ident() == Some(name)
    }

    pub fn is_nil(&self) -> bool {
        self.is_ident(NIL)
    }
}

// Nodes print as surface syntax, so that a printed form re-parses to a
// structurally identical tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Ident(name) if &**name == NIL => write!(f, "()"),
            NodeKind::Ident(name) => write!(f, "{name}"),
            NodeKind::Str(raw) => write!(f, "{raw}"),
            NodeKind::Number { text, .. } => write!(f, "{text}"),
            NodeKind::Vector(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            NodeKind::Call { callee, args } => {
                write!(f, "({callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dummy(kind: NodeKind) -> Node {
        Node {
            kind,
            span: Span::new_of_length(0, 0),
        }
    }

    #[test]
    fn prints_surface_syntax() {
        let call = dummy(NodeKind::Call {
            callee: Box::new(dummy(NodeKind::Ident("+".into()))),
            args: vec![
                dummy(NodeKind::Number {
                    text: "1".into(),
                    kind: NumberKind::Int,
                }),
                dummy(NodeKind::Vector(vec![
                    dummy(NodeKind::Str("\"hi\"".into())),
                    dummy(NodeKind::Ident(NIL.into())),
                ])),
            ],
        });
        assert_eq!(call.to_string(), r#"(+ 1 ["hi" ()])"#);
    }

    #[test]
    fn nil_prints_as_empty_list() {
        assert_eq!(dummy(NodeKind::Ident(NIL.into())).to_string(), "()");
    }
}
