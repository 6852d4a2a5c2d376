//! The bitstream module forms the I/O subsystem for the Huffman coder.
//!
//! The Huffman tree itself only needs two things from the outside world: somewhere to put one
//! bit at a time, and somewhere to get one bit at a time. Those two contracts are the
//! [`BitSink`] and [`BitSource`] traits below.
//!
//! - bitpacker: packs bits into an in-memory byte vec.
//! - bitwriter: packs bits and writes them, with the file header, to any output stream.
//! - bitreader: reads bits back from any I/O source that supports the read() call.
//!
//! All three agree on bit order: the first bit put into a byte lands in its most significant bit.
//!
pub mod bitpacker;
pub mod bitreader;
pub mod bitwriter;

/// Anything that accepts a stream of bits, in call order.
pub trait BitSink {
    /// Append one bit (true = 1) to the stream.
    fn put(&mut self, bit: bool);

    /// Append the 8 bits of a byte, most significant bit first.
    fn out8(&mut self, byte: u8) {
        for shift in (0..8).rev() {
            self.put((byte >> shift) & 1 == 1);
        }
    }
}

/// Anything that hands out bits in the order they were originally written.
pub trait BitSource {
    /// Next unread bit, or None when the stream is exhausted.
    fn get(&mut self) -> Option<bool>;

    /// Next 8 bits as a byte, most significant bit first.
    fn byte(&mut self) -> Option<u8> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte = byte << 1 | self.get()? as u8;
        }
        Some(byte)
    }
}

/// Unpacked sink, handy for inspecting individual code words.
impl BitSink for Vec<bool> {
    fn put(&mut self, bit: bool) {
        self.push(bit);
    }
}

impl BitSource for std::vec::IntoIter<bool> {
    fn get(&mut self) -> Option<bool> {
        self.next()
    }
}
