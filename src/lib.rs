//! A Huffman coding tree for the byte alphabet, and a small lossless file compressor built on it.
//!
//! The tree derives an optimal prefix-free code from the frequency of each of the 256 byte
//! values, translates single bytes to and from bit sequences, and can write its own shape to
//! the output so the decompressor rebuilds the identical code without the frequency table.
//!
//! Basic usage to compress a file is as follows:
//!
//! `$> hctree -z test.txt`
//!
//! This will compress the file and create the file test.txt.hcz.
//! The original file will be deleted unless -k is given.
//!
//! Using the tree directly:
//!
//! ```
//! use hctree::bitstream::bitpacker::BitPacker;
//! use hctree::bitstream::bitreader::BitReader;
//! use hctree::huffman_coding::huffman::HuffTree;
//!
//! let tree = HuffTree::from_pairs(&[(b'a', 5), (b'b', 2), (b'c', 1), (b'd', 1)]);
//! let mut bp = BitPacker::new(4);
//! tree.encode(b'c', &mut bp).unwrap();
//! bp.flush();
//!
//! let mut br = BitReader::new(bp.output.as_slice());
//! assert_eq!(tree.decode(&mut br).unwrap(), b'c');
//! ```
//!
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;
