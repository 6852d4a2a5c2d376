use log::error;

use super::BitSink;

/// Packs a bitstream into memory.
pub struct BitPacker {
    pub output: Vec<u8>,
    /// Number of meaningful bits in the last byte after flush(), 0 meaning all 8.
    pub last_bits: u8,
    queue: u64,
    q_bits: u8,
}

impl BitPacker {
    /// Create a new BitPacker with an output buffer of the size specified (in bytes). Call
    /// flush() to move the partial last byte into the buffer before reading output.
    pub fn new(size: usize) -> Self {
        Self {
            output: Vec::with_capacity(size),
            last_bits: 0,
            queue: 0,
            q_bits: 0,
        }
    }

    /// Internal bitstream write function common to all out.XX functions.
    fn write_stream(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// signficant bits
    pub fn flush(&mut self) {
        self.last_bits = self.q_bits % 8;
        if self.q_bits > 0 {
            self.queue <<= 8 - self.q_bits; //pad the queue with zeros
            self.q_bits += 8 - self.q_bits;
            self.write_stream(); // write out all that is left
            if self.q_bits > 0 {
                error!("Stuff left in the BitPacker queue.");
            }
        }
    }
}

impl BitSink for BitPacker {
    fn put(&mut self, bit: bool) {
        self.queue = self.queue << 1 | bit as u64;
        self.q_bits += 1;
        if self.q_bits > 7 {
            self.write_stream();
        }
    }

    fn out8(&mut self, data: u8) {
        self.queue <<= 8; //shift queue by one byte
        self.queue |= data as u64; //add the byte to queue
        self.q_bits += 8; //update depth of queue bits
        self.write_stream();
    }
}
