//! The Huffman coding tree.
//!
//! Build the tree once from a 256-entry frequency table, then encode and decode single bytes
//! against a bitstream. The tree shape can be written to the stream with save_tree() so the
//! decompressor can rebuild the identical code with load_tree() instead of re-deriving it.
//!
//! Codes are read root to leaf: a left branch is a 0 bit, a right branch a 1 bit.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::{Read, Write};

use log::{debug, trace};

use super::node::{Node, NodeData, NodeId};
use crate::bitstream::{BitSink, BitSource};
use crate::error::HuffError;

/// Number of symbols in the alphabet: every byte value.
pub const ALPHABET: usize = 256;

/// A Huffman coding tree over byte symbols.
#[derive(Debug, Clone)]
pub struct HuffTree {
    /// Arena holding every node. Dropping the tree drops them all at once.
    nodes: Vec<Node>,
    root: Option<NodeId>,
    /// Leaf for each symbol, None when the symbol had no weight.
    leaves: [Option<NodeId>; ALPHABET],
}

impl Default for HuffTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HuffTree {
    /// Create an empty (unbuilt) tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            leaves: [None; ALPHABET],
        }
    }

    /// Build a tree from (symbol, count) pairs. Repeated symbols add up.
    pub fn from_pairs(pairs: &[(u8, u64)]) -> Self {
        let mut freqs = [0_u64; ALPHABET];
        for &(sym, count) in pairs {
            freqs[sym as usize] = freqs[sym as usize].saturating_add(count);
        }
        let mut tree = Self::new();
        tree.build(&freqs);
        tree
    }

    /// Drop all nodes and forget all leaves.
    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.leaves = [None; ALPHABET];
    }

    /// Put a node into the arena and return its index.
    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Build the tree from symbol frequencies, replacing any previous tree.
    ///
    /// The queue is keyed on (weight, sequence). Leaves take their symbol as sequence number
    /// and merged nodes take 256, 257, ... as they are created, so equal weights always resolve
    /// the same way. The first node off the queue becomes the left child.
    ///
    /// If every frequency is zero the tree stays empty.
    pub fn build(&mut self, freqs: &[u64; ALPHABET]) {
        self.clear();

        let mut queue = BinaryHeap::with_capacity(ALPHABET);
        for (sym, &freq) in freqs.iter().enumerate().filter(|&(_, &f)| f > 0) {
            let id = self.push_node(Node::leaf(sym as u8, freq));
            self.leaves[sym] = Some(id);
            queue.push(Reverse((freq, sym as u32, id)));
        }
        let symbols = queue.len();

        let mut seq = ALPHABET as u32;
        self.root = loop {
            match (queue.pop(), queue.pop()) {
                (Some(Reverse((lw, _, left))), Some(Reverse((rw, _, right)))) => {
                    let weight = lw.saturating_add(rw);
                    let id = self.push_node(Node::internal(left, right, weight));
                    self.nodes[left].parent = Some(id);
                    self.nodes[right].parent = Some(id);
                    trace!("Merged {} and {} into node {} (weight {})", left, right, id, weight);
                    queue.push(Reverse((weight, seq, id)));
                    seq += 1;
                }
                (last, _) => break last.map(|Reverse((_, _, id))| id),
            }
        };

        debug!(
            "Built huffman tree: {} symbols, {} nodes, height {}",
            symbols,
            self.nodes.len(),
            self.height()
        );
    }

    /// True once the tree holds at least one symbol.
    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    /// Number of symbols (leaves) in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaves.iter().flatten().count()
    }

    /// Weight of the whole tree (total symbol count). Zero for loaded trees.
    pub fn weight(&self) -> u64 {
        self.root.map_or(0, |root| self.nodes[root].weight)
    }

    /// Length of the longest code, 0 for an empty or single-leaf tree.
    pub fn height(&self) -> usize {
        self.leaves
            .iter()
            .flatten()
            .map(|&leaf| self.depth(leaf))
            .max()
            .unwrap_or(0)
    }

    /// Steps from a node up to the root.
    fn depth(&self, mut node: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.nodes[node].parent {
            depth += 1;
            node = parent;
        }
        depth
    }

    /// Write the code for symbol to the sink. Does not flush the sink.
    ///
    /// A tree with a single symbol codes it as one 0 bit.
    pub fn encode<S: BitSink + ?Sized>(&self, symbol: u8, sink: &mut S) -> Result<(), HuffError> {
        let root = self.root.ok_or(HuffError::NotBuilt)?;
        let leaf = self.leaves[symbol as usize].ok_or(HuffError::UnknownSymbol(symbol))?;
        if leaf == root {
            sink.put(false);
            return Ok(());
        }

        // Walk up to the root, then play the path back down.
        let mut path = [false; ALPHABET];
        let mut len = 0;
        let mut node = leaf;
        while let Some(parent) = self.nodes[node].parent {
            path[len] = matches!(self.nodes[parent].node_data, NodeData::Kids(_, right) if right == node);
            len += 1;
            node = parent;
        }
        path[..len].iter().rev().for_each(|&bit| sink.put(bit));
        Ok(())
    }

    /// Read one code word from the source and return its symbol.
    pub fn decode<S: BitSource + ?Sized>(&self, source: &mut S) -> Result<u8, HuffError> {
        let mut node = self.root.ok_or(HuffError::NotBuilt)?;

        if let NodeData::Leaf(sym) = self.nodes[node].node_data {
            return match source.get() {
                Some(false) => Ok(sym),
                Some(true) => Err(HuffError::Corrupt("invalid code for single symbol tree")),
                None => Err(HuffError::Truncated),
            };
        }

        loop {
            match self.nodes[node].node_data {
                NodeData::Kids(left, right) => {
                    node = if source.get().ok_or(HuffError::Truncated)? {
                        right
                    } else {
                        left
                    };
                }
                NodeData::Leaf(sym) => return Ok(sym),
            }
        }
    }

    /// Root-to-leaf code for symbol, None if the symbol isn't in the tree.
    pub fn code(&self, symbol: u8) -> Option<Vec<bool>> {
        let mut bits: Vec<bool> = Vec::new();
        self.encode(symbol, &mut bits).ok()?;
        Some(bits)
    }

    /// Code length in bits for symbol, None if the symbol isn't in the tree.
    pub fn code_len(&self, symbol: u8) -> Option<usize> {
        let root = self.root?;
        let leaf = self.leaves[symbol as usize]?;
        Some(if leaf == root { 1 } else { self.depth(leaf) })
    }

    /// Total bits needed to code a message with these frequencies. None if the message holds
    /// a symbol the tree can't code, or the total doesn't fit in a u64.
    pub fn encoded_len(&self, freqs: &[u64; ALPHABET]) -> Option<u64> {
        freqs
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f > 0)
            .try_fold(0_u64, |total, (sym, &f)| {
                let len = self.code_len(sym as u8)? as u64;
                total.checked_add(f.checked_mul(len)?)
            })
    }

    /// Write the tree shape to the sink, pre-order: 0 for an internal node (followed by its
    /// left then right subtree), 1 followed by the 8 symbol bits for a leaf.
    pub fn save_tree<S: BitSink + ?Sized>(&self, sink: &mut S) -> Result<(), HuffError> {
        let root = self.root.ok_or(HuffError::NotBuilt)?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.nodes[node].node_data {
                NodeData::Kids(left, right) => {
                    sink.put(false);
                    stack.push(right);
                    stack.push(left);
                }
                NodeData::Leaf(sym) => {
                    sink.put(true);
                    sink.out8(sym);
                }
            }
        }
        Ok(())
    }

    /// Replace this tree with one read from the source in the save_tree() format.
    /// On error the tree is left empty. Weights are not transmitted, so they read back as 0.
    pub fn load_tree<S: BitSource + ?Sized>(&mut self, source: &mut S) -> Result<(), HuffError> {
        self.clear();

        // Pass 1: read the pre-order tokens. Some(sym) is a leaf, None an internal node.
        // A full binary tree has one fewer internal node than leaves, so `pending` (subtrees
        // still to read) hits zero exactly at the end.
        let mut tokens: Vec<Option<u8>> = Vec::with_capacity(2 * ALPHABET);
        let mut seen = [false; ALPHABET];
        let mut pending = 1_usize;
        let mut internal = 0_usize;
        while pending > 0 {
            if source.get().ok_or(HuffError::Truncated)? {
                let sym = source.byte().ok_or(HuffError::Truncated)?;
                if seen[sym as usize] {
                    return Err(HuffError::Corrupt("duplicate symbol in tree"));
                }
                seen[sym as usize] = true;
                tokens.push(Some(sym));
                pending -= 1;
            } else {
                internal += 1;
                if internal >= ALPHABET {
                    return Err(HuffError::Corrupt("tree has too many nodes"));
                }
                tokens.push(None);
                pending += 1;
            }
        }

        // Pass 2: assemble bottom-up by walking the tokens backwards. When an internal node
        // comes up, its left subtree is on top of the stack and its right subtree below it.
        let mut nodes = Vec::with_capacity(tokens.len());
        let mut leaves = [None; ALPHABET];
        let mut stack: Vec<NodeId> = Vec::with_capacity(ALPHABET);
        for token in tokens.iter().rev() {
            let id = nodes.len();
            match *token {
                Some(sym) => {
                    nodes.push(Node::leaf(sym, 0));
                    leaves[sym as usize] = Some(id);
                }
                None => {
                    let (left, right) = match (stack.pop(), stack.pop()) {
                        (Some(left), Some(right)) => (left, right),
                        _ => return Err(HuffError::Corrupt("malformed tree")),
                    };
                    nodes.push(Node::internal(left, right, 0));
                    nodes[left].parent = Some(id);
                    nodes[right].parent = Some(id);
                }
            }
            stack.push(id);
        }
        if stack.len() != 1 {
            return Err(HuffError::Corrupt("malformed tree"));
        }

        self.nodes = nodes;
        self.root = stack.pop();
        self.leaves = leaves;
        debug!(
            "Loaded huffman tree: {} symbols, height {}",
            self.leaf_count(),
            self.height()
        );
        Ok(())
    }

    /// Write the code for symbol as ASCII '0' and '1' characters. Meant for inspecting codes
    /// by eye, not for real output.
    pub fn encode_ascii<W: Write + ?Sized>(&self, symbol: u8, out: &mut W) -> Result<(), HuffError> {
        let mut bits: Vec<bool> = Vec::new();
        self.encode(symbol, &mut bits)?;
        let text: Vec<u8> = bits.iter().map(|&b| if b { b'1' } else { b'0' }).collect();
        out.write_all(&text)?;
        Ok(())
    }

    /// Read one ASCII code word ('0'/'1' characters, whitespace skipped) and return its symbol.
    pub fn decode_ascii<R: Read + ?Sized>(&self, input: &mut R) -> Result<u8, HuffError> {
        let mut bits = AsciiBits { input, bad: None };
        match self.decode(&mut bits) {
            Err(HuffError::Truncated) => Err(bits.bad.take().unwrap_or(HuffError::Truncated)),
            result => result,
        }
    }
}

/// Bit source over ASCII '0'/'1' text. Remembers why it stopped early.
struct AsciiBits<'a, R: Read + ?Sized> {
    input: &'a mut R,
    bad: Option<HuffError>,
}

impl<'a, R: Read + ?Sized> BitSource for AsciiBits<'a, R> {
    fn get(&mut self) -> Option<bool> {
        let mut ch = [0_u8; 1];
        loop {
            match self.input.read(&mut ch) {
                Ok(0) => return None,
                Ok(_) => match ch[0] {
                    b'0' => return Some(false),
                    b'1' => return Some(true),
                    c if c.is_ascii_whitespace() => continue,
                    _ => {
                        self.bad = Some(HuffError::Corrupt("expected '0' or '1'"));
                        return None;
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.bad = Some(HuffError::Io(e));
                    return None;
                }
            }
        }
    }
}
