//! MRP (Meaning Representation Parsing) records for UCCA trees.

use super::tree::{UccaNode, UccaTree};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrpGraph {
    pub id: String,
    pub flavor: u8,
    pub framework: String,
    pub version: f64,
    pub input: String,
    pub tops: Vec<usize>,
    pub nodes: Vec<MrpNode>,
    pub edges: Vec<MrpEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrpNode {
    pub id: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<MrpAnchor>,
}

/// Character span into `input`, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrpAnchor {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrpEdge {
    pub source: usize,
    pub target: usize,
    pub label: String,
}

/// Converts a restored tree plus its sentence into an MRP record.
pub trait MrpConverter {
    fn convert(&self, tree: &UccaTree, sentence: &str, index: usize) -> anyhow::Result<MrpGraph>;
}

/// Nodes numbered in preorder from the root (`tops = [0]`); each terminal word
/// is anchored to the first unused whitespace token of the sentence equal to
/// it, regardless of the order in which the tree lists its words.
#[derive(Debug, Clone, Copy, Default)]
pub struct UccaMrpConverter;

impl MrpConverter for UccaMrpConverter {
    fn convert(&self, tree: &UccaTree, sentence: &str, index: usize) -> anyhow::Result<MrpGraph> {
        let mut builder = GraphBuilder {
            tokens: sentence_tokens(sentence),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        builder.visit(&tree.root);

        Ok(MrpGraph {
            id: index.to_string(),
            flavor: 1,
            framework: "ucca".to_string(),
            version: 1.0,
            input: sentence.to_string(),
            tops: vec![0],
            nodes: builder.nodes,
            edges: builder.edges,
        })
    }
}

/// Whitespace-delimited token of the sentence with its character span.
struct Token<'s> {
    text: &'s str,
    from: usize,
    to: usize,
    used: bool,
}

fn sentence_tokens(sentence: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    // (byte offset, char offset) of the token being read
    let mut start: Option<(usize, usize)> = None;
    let mut chars = 0;
    for (byte, c) in sentence.char_indices() {
        if c.is_whitespace() {
            if let Some((b, from)) = start.take() {
                tokens.push(Token {
                    text: &sentence[b..byte],
                    from,
                    to: chars,
                    used: false,
                });
            }
        } else if start.is_none() {
            start = Some((byte, chars));
        }
        chars += 1;
    }
    if let Some((b, from)) = start {
        tokens.push(Token {
            text: &sentence[b..],
            from,
            to: chars,
            used: false,
        });
    }
    tokens
}

struct GraphBuilder<'s> {
    tokens: Vec<Token<'s>>,
    nodes: Vec<MrpNode>,
    edges: Vec<MrpEdge>,
}

impl GraphBuilder<'_> {
    fn visit(&mut self, node: &UccaNode) -> usize {
        let id = self.nodes.len();
        let anchors = node.words.iter().filter_map(|w| self.anchor(w)).collect();
        self.nodes.push(MrpNode { id, anchors });

        for edge in &node.edges {
            let target = self.visit(&edge.child);
            self.edges.push(MrpEdge {
                source: id,
                target,
                label: edge.label.clone(),
            });
        }
        id
    }

    fn anchor(&mut self, word: &str) -> Option<MrpAnchor> {
        let token = self.tokens.iter_mut().find(|t| !t.used && t.text == word)?;
        token.used = true;
        Some(MrpAnchor {
            from: token.from,
            to: token.to,
        })
    }
}

/// Write one compact JSON object per line, in input order.
pub fn write_mrp<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
