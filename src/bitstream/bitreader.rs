//! BitReader: the bit source for the Huffman decoder.
//!
//! Reads a packed bitstream, most significant bit first, and hands it out one bit (or a few
//! bits) at a time.
//!
//! NOTE: This module can read from any I/O source that supports the read() call.
//!

use log::error;

use super::BitSource;

const BUFFER_SIZE: usize = 1024 * 1024;
const BIT_MASK: u8 = 0xff;

/// Reads a packed bitstream.
#[derive(Debug)]
pub struct BitReader<R> {
    buffer: Vec<u8>,
    cursor: usize,
    bit_index: usize,
    source: R,
    /// Read error that ended the stream early, if any.
    error: Option<std::io::Error>,
}

impl<R: std::io::Read> BitReader<R> {
    /// Creates a new bitReader (with a 1Mbyte buffer).
    pub fn new(source: R) -> Self {
        Self {
            buffer: vec![0; BUFFER_SIZE],
            cursor: BUFFER_SIZE,
            bit_index: 0,
            source,
            error: None,
        }
    }

    /// Check (and refill) buffer. Returns true if we have data, false if there is no more
    fn have_data(&mut self) -> bool {
        // Only try to read more data when the buffer length is equal to the buffer cursor location
        if self.cursor == self.buffer.len() {
            if self.error.is_some() {
                return false;
            }
            // Restore the full buffer size in case a previous read came back short
            self.buffer.resize(BUFFER_SIZE, 0);
            let size = loop {
                match self.source.read(&mut self.buffer) {
                    Ok(size) => break size,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        error!("Unable to read source data: {}", e);
                        self.error = Some(e);
                        break 0;
                    }
                }
            };
            // If nothing came back from our read attempt, then we have no more data.
            self.buffer.truncate(size);
            self.cursor = 0;
            self.bit_index = 0;
            if size == 0 {
                return false;
            }
        }
        true
    }

    /// Return bit as Option<usize> (1 or 0), or None if there is no more data to read
    pub fn bit(&mut self) -> Option<usize> {
        // If bit_index is == 0, check if we have a byte to read. Return None if we have no data
        if self.bit_index == 0 && !self.have_data() {
            return None;
        }
        // Otherwise return the bit as an Some(usize)
        let bit =
            (self.buffer[self.cursor] & BIT_MASK >> self.bit_index) >> (7 - self.bit_index);
        self.bit_index += 1;
        self.bit_index %= 8;
        if self.bit_index == 0 {
            self.cursor += 1;
        }
        Some(bit as usize)
    }

    /// Return Option<Bool> *true* if the next bit is 1, *false* if 0, consuming the bit,
    /// or None if there is no more data to read
    pub fn bool_bit(&mut self) -> Option<bool> {
        self.bit().map(|bit| bit == 1)
    }

    /// Return Option<usize> of the next n bits (n <= 64), or None if there is no more data
    /// to read.
    pub fn bint(&mut self, mut n: usize) -> Option<usize> {
        /*
        First, look to see if we have less than 8 bits in the current byte. If so, get
        those. Then get full bytes as needed to fulfill the request. Lastly, get a
        partial byte to complete the request.
        */
        let mut result = 0_usize;

        // Test if we have a partial byte of data. If we do, read from it.
        if self.bit_index > 0 {
            let needed = n.min(8 - self.bit_index);

            result = ((self.buffer[self.cursor] & BIT_MASK >> self.bit_index)
                >> (8 - self.bit_index - needed)) as usize;
            self.bit_index += needed;
            if self.bit_index / 8 > 0 {
                self.cursor += 1;
            }
            self.bit_index %= 8;

            if n == needed {
                return Some(result);
            } else {
                n -= needed;
            }
        }
        // Get as many full bytes as we need.
        while n >= 8 {
            if !self.have_data() {
                return None;
            }
            result = result << 8 | (self.buffer[self.cursor]) as usize;
            self.cursor += 1;
            n -= 8;
        }
        // If we still need a partial byte, get whatever bits we still need.
        if n > 0 {
            if !self.have_data() {
                return None;
            }
            result = result << n | (self.buffer[self.cursor] >> (8 - n)) as usize;
            self.bit_index += n;
        }
        Some(result)
    }

    /// Returns a byte as an Option<u8>, or None if there is no more data to read. This is
    /// a convenience function, and calls bint(8).
    pub fn byte(&mut self) -> Option<u8> {
        self.bint(8).map(|byte| byte as u8)
    }

    /// Takes the read error that cut the stream short, if there was one.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }
}

impl<R: std::io::Read> BitSource for BitReader<R> {
    fn get(&mut self) -> Option<bool> {
        self.bool_bit()
    }

    fn byte(&mut self) -> Option<u8> {
        BitReader::byte(self)
    }
}

#[cfg(test)]
mod test {
    use super::BitReader;

    #[test]
    fn basic_test() {
        let x = [0b10000001_u8].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bit(), Some(1));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(0));
        assert_eq!(br.bit(), Some(1));
        assert_eq!(br.bit(), None);
    }

    #[test]
    fn bint_test() {
        let x = [0b00011011].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bint(5), Some(3));
        assert_eq!(br.bint(1), Some(0));
        assert_eq!(br.bint(2), Some(3));
        assert_eq!(br.bint(1), None);
    }

    #[test]
    fn unaligned_byte_test() {
        let x = [0b1010_1010, 0b1100_0000].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bool_bit(), Some(true));
        assert_eq!(br.byte(), Some(0b0101_0101));
        assert_eq!(br.bool_bit(), Some(true));
        assert_eq!(br.bool_bit(), Some(false));
    }

    #[test]
    fn bool_bit_test() {
        let x = [0b01010000].as_slice();
        let mut br = BitReader::new(x);
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), Some(true));
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), Some(true));
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), Some(false));
        assert_eq!(br.bool_bit(), None);
    }
}
