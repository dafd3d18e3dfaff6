//! The keyframe text format.
//!
//! A dynamic graph serializes as a brace-delimited state sequence, each
//! state a bracket-delimited list of `n <id> <x> <y>;` node records and
//! `e <id> <one> <two>;` edge records. Whitespace between tokens is
//! ignored; any other character outside a record is an error.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::{GraphError, Result};
use crate::graph::dynamic::DynamicGraph;
use crate::graph::GraphState;
use crate::model::{Edge, EdgeId, Node, NodeId};

/// Serializes a dynamic graph's keyframes. Nodes are emitted before
/// edges within each state.
pub fn to_text(dgraph: &DynamicGraph) -> String {
    let mut out = String::from("{\n");
    for state in dgraph.states() {
        out.push_str("[\n");
        for node in state.nodes() {
            let _ = writeln!(out, "n {} {} {};", node.id, node.pos.x, node.pos.y);
        }
        for edge in state.edges() {
            let _ = writeln!(out, "e {} {} {};", edge.id, edge.one, edge.two);
        }
        out.push_str("]\n");
    }
    out.push_str("}\n");
    out
}

/// Parses the text format back into a dynamic graph. The keyframes are
/// adopted via [`DynamicGraph::build_from`], which recomputes the
/// `is_new` / `is_old` flags and the id counters.
pub fn from_text(input: &str) -> Result<DynamicGraph> {
    Scanner::new(input).dynamic_graph()
}

impl fmt::Display for DynamicGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(self))
    }
}

impl FromStr for DynamicGraph {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        from_text(s)
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn dynamic_graph(&mut self) -> Result<DynamicGraph> {
        self.expect('{')?;
        let mut states = Vec::new();
        loop {
            match self.peek() {
                Some('}') => {
                    self.bump('}');
                    let mut dgraph = DynamicGraph::new();
                    dgraph.build_from(states);
                    return Ok(dgraph);
                }
                Some('[') => {
                    self.bump('[');
                    states.push(self.state()?);
                }
                Some(other) => {
                    return Err(GraphError::Parse(format!("unexpected character '{other}'")))
                }
                None => return Err(GraphError::Parse("stream ended, expected '}'".into())),
            }
        }
    }

    fn state(&mut self) -> Result<GraphState> {
        let mut state = GraphState::new();
        loop {
            match self.peek() {
                Some(']') => {
                    self.bump(']');
                    return Ok(state);
                }
                Some('n') => {
                    self.bump('n');
                    let [id, x, y] = self.record_fields("node")?;
                    let mut node = Node::new(NodeId(parse_int(id, "node")?));
                    node.pos.x = parse_float(x, "node")?;
                    node.pos.y = parse_float(y, "node")?;
                    state.push_node(node);
                }
                Some('e') => {
                    self.bump('e');
                    let [id, one, two] = self.record_fields("edge")?;
                    state.push_edge(Edge::new(
                        EdgeId(parse_int(id, "edge")?),
                        NodeId(parse_int(one, "edge")?),
                        NodeId(parse_int(two, "edge")?),
                    ))?;
                }
                Some(other) => {
                    return Err(GraphError::Parse(format!("unexpected character '{other}'")))
                }
                None => return Err(GraphError::Parse("stream ended, expected ']'".into())),
            }
        }
    }

    /// Reads up to the terminating `;` and splits the record body into
    /// exactly three whitespace-separated fields.
    fn record_fields(&mut self, kind: &str) -> Result<[&'a str; 3]> {
        let mut fields = [""; 3];
        let mut count = 0;
        loop {
            match self.peek() {
                Some(';') => {
                    self.bump(';');
                    break;
                }
                Some(_) => {
                    if count == 3 {
                        return Err(GraphError::Parse(format!(
                            "invalid number of {kind} parameters"
                        )));
                    }
                    fields[count] = self.token();
                    count += 1;
                }
                None => return Err(GraphError::Parse("stream ended, expected ';'".into())),
            }
        }
        if count != 3 {
            return Err(GraphError::Parse(format!(
                "invalid number of {kind} parameters"
            )));
        }
        Ok(fields)
    }

    /// Consumes a run of characters up to the next whitespace or `;`.
    fn token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.current() {
            if c.is_whitespace() || c == ';' {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump(c);
                Ok(())
            }
            Some(other) => Err(GraphError::Parse(format!(
                "unexpected character '{other}', expected '{expected}'"
            ))),
            None => Err(GraphError::Parse(format!(
                "stream ended, expected '{expected}'"
            ))),
        }
    }

    /// Skips whitespace and returns the next significant character
    /// without consuming it.
    fn peek(&mut self) -> Option<char> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                return Some(c);
            }
        }
        None
    }

    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }
}

fn parse_int(token: &str, kind: &str) -> Result<u64> {
    token
        .parse()
        .map_err(|_| GraphError::Parse(format!("invalid {kind} parameters")))
}

fn parse_float(token: &str, kind: &str) -> Result<f32> {
    token
        .parse()
        .map_err(|_| GraphError::Parse(format!("invalid {kind} parameters")))
}
