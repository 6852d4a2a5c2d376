//! Nodes of the Huffman tree.
//!
//! Nodes live in an arena (a Vec owned by the tree) and refer to each other by index. Children
//! are owned through the tree; the parent link is only a way back up for the encoder.

/// Index of a node in the tree's arena.
pub type NodeId = usize;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NodeData {
    /// Internal node: left child, right child.
    Kids(NodeId, NodeId),
    /// Leaf node holding a symbol.
    Leaf(u8),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Node {
    /// Symbol count for a leaf, sum of the children for an internal node.
    pub weight: u64,
    /// None for the root.
    pub parent: Option<NodeId>,
    pub node_data: NodeData,
}

impl Node {
    /// Create a new leaf
    pub fn leaf(symbol: u8, weight: u64) -> Node {
        Node {
            weight,
            parent: None,
            node_data: NodeData::Leaf(symbol),
        }
    }

    /// Create a new internal node over two existing nodes. The caller links the children back.
    pub fn internal(left: NodeId, right: NodeId, weight: u64) -> Node {
        Node {
            weight,
            parent: None,
            node_data: NodeData::Kids(left, right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_data, NodeData::Leaf(_))
    }

    /// The symbol, if this is a leaf.
    pub fn symbol(&self) -> Option<u8> {
        match self.node_data {
            NodeData::Leaf(sym) => Some(sym),
            NodeData::Kids(..) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Node, NodeData};

    #[test]
    fn leaf_test() {
        let n = Node::leaf(b'q', 12);
        assert!(n.is_leaf());
        assert_eq!(n.symbol(), Some(b'q'));
        assert_eq!(n.parent, None);
    }

    #[test]
    fn internal_test() {
        let n = Node::internal(3, 4, 9);
        assert!(!n.is_leaf());
        assert_eq!(n.symbol(), None);
        assert_eq!(n.node_data, NodeData::Kids(3, 4));
        assert_eq!(n.weight, 9);
    }
}
