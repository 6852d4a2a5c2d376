//! The compression module drives whole-file compression and decompression.
//!
//! Compression happens in the following steps:
//! - Frequency count: how often each byte value occurs in the input.
//! - Tree build: a Huffman tree from those counts.
//! - Output: the stream header, the tree shape, then one code word per input byte.
//!
//! Decompression reads the header, rebuilds the tree from its shape and decodes exactly as many
//! bytes as the header says. The padding bits in the last byte are never looked at.
//!
//! Stream layout (bits are packed most significant bit first):
//!
//! | field  | size                | notes                                  |
//! |--------|---------------------|----------------------------------------|
//! | magic  | 4 bytes             | "HCZ1"                                 |
//! | length | 8 bytes, big-endian | original byte count                    |
//! | tree   | varies              | save_tree() format, absent if length 0 |
//! | codes  | varies              | one code word per original byte        |
//!

pub mod compress;
pub mod decompress;

/// Magic signature at the start of every compressed stream.
pub const MAGIC: &[u8; 4] = b"HCZ1";

/// File name extension for compressed files.
pub const EXTENSION: &str = ".hcz";
