//! The huffman_coding module holds the Huffman coding tree for the byte alphabet.
//!
//! A tree is built once from the frequency of each byte value in the input. After that it can
//! encode a byte to its code word, decode a code word back to its byte, and write its own shape
//! to the bitstream so the decompressor gets exactly the same code without needing the
//! frequencies.
//!
//! - node: the tree vertex, stored in an arena and linked by index.
//! - huffman: the tree itself (build, encode, decode, save_tree, load_tree).
//!

pub mod huffman;
pub mod node;
