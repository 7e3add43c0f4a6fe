use thiserror::Error;

/// Linearized graph substituted when a string cannot be delinearized.
pub const TOY_GRAPH: &str =
    "[ <root_0> H [ <H_0> D [ <D_0> T [ Highly ] ] S [ <S_0> T [ recommended ] ] ] ]";
/// Sentence that goes with [`TOY_GRAPH`].
pub const TOY_SENT: &str = "Highly recommended";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UccaTree {
    pub root: UccaNode,
}

/// A unit. Terminal units carry words and no edges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UccaNode {
    pub id: Option<String>,
    pub edges: Vec<UccaEdge>,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UccaEdge {
    pub label: String,
    pub child: UccaNode,
}

impl UccaNode {
    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }
}

impl UccaTree {
    /// Words of all terminal units, left to right.
    pub fn words(&self) -> Vec<&str> {
        fn walk<'a>(node: &'a UccaNode, out: &mut Vec<&'a str>) {
            out.extend(node.words.iter().map(String::as_str));
            for edge in &node.edges {
                walk(&edge.child, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("input ended inside a unit")]
    UnexpectedEnd,
    #[error("unexpected `{token}` at token {position}")]
    Unexpected { token: String, position: usize },
    #[error("empty unit at token {0}")]
    EmptyUnit(usize),
    #[error("unit mixes words and labeled children at token {0}")]
    MixedUnit(usize),
    #[error("trailing input at token {0}")]
    Trailing(usize),
}

/// Turns a linearized graph string back into a tree.
pub trait Delinearizer {
    fn delinearize(&self, linear: &str) -> Result<UccaTree, ParseError>;
}

/// Parser for the bracketed linearization
/// `[ <id> LABEL [ ... ] LABEL [ word word ] ]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketDelinearizer;

impl Delinearizer for BracketDelinearizer {
    fn delinearize(&self, linear: &str) -> Result<UccaTree, ParseError> {
        let spaced = linear.replace('[', " [ ").replace(']', " ] ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.node()?;
        if parser.pos != parser.tokens.len() {
            return Err(ParseError::Trailing(parser.pos));
        }
        Ok(UccaTree { root })
    }
}

struct Parser<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<&'a str, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &str) -> Result<(), ParseError> {
        let position = self.pos;
        let token = self.next()?;
        if token != expected {
            return Err(ParseError::Unexpected {
                token: token.to_string(),
                position,
            });
        }
        Ok(())
    }

    fn node(&mut self) -> Result<UccaNode, ParseError> {
        let start = self.pos;
        self.expect("[")?;

        let mut node = UccaNode::default();
        if let Some(tag) = self.peek().filter(|t| is_id(t)) {
            node.id = Some(tag[1..tag.len() - 1].to_string());
            self.pos += 1;
        }

        loop {
            let position = self.pos;
            match self.peek().ok_or(ParseError::UnexpectedEnd)? {
                "]" => {
                    self.pos += 1;
                    break;
                }
                "[" => {
                    return Err(ParseError::Unexpected {
                        token: "[".to_string(),
                        position,
                    })
                }
                token if self.tokens.get(self.pos + 1) == Some(&"[") => {
                    if !node.words.is_empty() {
                        return Err(ParseError::MixedUnit(position));
                    }
                    self.pos += 1;
                    let child = self.node()?;
                    node.edges.push(UccaEdge {
                        label: token.to_string(),
                        child,
                    });
                }
                word => {
                    if !node.edges.is_empty() {
                        return Err(ParseError::MixedUnit(position));
                    }
                    node.words.push(word.to_string());
                    self.pos += 1;
                }
            }
        }

        if node.edges.is_empty() && node.words.is_empty() {
            return Err(ParseError::EmptyUnit(start));
        }
        Ok(node)
    }
}

fn is_id(token: &str) -> bool {
    token.len() > 2 && token.starts_with('<') && token.ends_with('>')
}

/// Outcome of delinearizing one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Restored {
    Parsed(UccaTree),
    /// The item was replaced by the toy graph and sentence.
    FallbackUsed { tree: UccaTree, reason: String },
}

impl Restored {
    pub fn tree(&self) -> &UccaTree {
        match self {
            Restored::Parsed(tree) | Restored::FallbackUsed { tree, .. } => tree,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Restored::FallbackUsed { .. })
    }

    /// Sentence to pair with the tree: the toy sentence after a fallback.
    ///
    /// Anchors are resolved by matching words against this text, so the toy
    /// tree needs the toy sentence; the real sentence lacks its words.
    pub fn sentence<'a>(&self, original: &'a str) -> &'a str {
        match self {
            Restored::Parsed(_) => original,
            Restored::FallbackUsed { .. } => TOY_SENT,
        }
    }
}
