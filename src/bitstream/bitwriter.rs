use std::io::{self, Write};

use log::{debug, error};

use super::BitSink;

/// Bytes buffered before they are handed to the output device.
const FLUSH_SIZE: usize = 64 * 1024;

/// Writes a bitstream for output. Takes bits (header, tree and code words) and writes them
/// through to the output device in large chunks.
pub struct BitWriter {
    /// Output buffer used to write the bitstream.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,

    /// Handle to the output stream
    writer: Box<dyn Write + Send + Sync>,
    /// Total bytes handed to the writer so far.
    written: usize,
    /// First write error seen. BitSink::put() can't report it, so finish() does.
    error: Option<io::Error>,
}

impl BitWriter {
    /// Create a new BitWriter on an already opened output device.
    pub fn new(writer: Box<dyn Write + Send + Sync>) -> Self {
        Self {
            output: Vec::with_capacity(FLUSH_SIZE + 8),
            queue: 0,
            q_bits: 0,
            writer,
            written: 0,
            error: None,
        }
    }

    /// Create a new BitWriter on the file at filepath, or on stdout if filepath is None.
    pub fn create(filepath: Option<&str>) -> io::Result<Self> {
        Ok(match filepath {
            Some(path) => Self::new(Box::new(std::fs::File::create(path)?)),
            None => Self::new(Box::new(io::stdout())),
        })
    }

    /// Internal bitstream write function common to all out.XX functions.
    fn push_queue(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte); //push the packed byte out
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
        if self.output.len() >= FLUSH_SIZE {
            self.write_out();
        }
    }

    /// Hand the buffered bytes to the output device. Only the first error is kept.
    fn write_out(&mut self) {
        if self.error.is_some() {
            self.output.clear();
            return;
        }
        match self.writer.write_all(&self.output) {
            Ok(()) => {
                self.written += self.output.len();
                self.output.clear();
            }
            Err(e) => {
                error!("Unable to write compressed data: {}", e);
                self.error = Some(e);
                self.output.clear();
            }
        }
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// signficant bits, and writes everything out. Returns the total bytes written, or the
    /// first error hit along the way. Finish MUST be called or data will be left behind.
    pub fn finish(mut self) -> io::Result<usize> {
        if self.q_bits > 0 {
            let pad = 8 - self.q_bits;
            self.queue <<= pad;
            self.q_bits += pad;
            debug!("Padded the last byte with {} bits.", pad);
        }
        self.push_queue();
        self.write_out();
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.written)
    }
}

impl BitSink for BitWriter {
    fn put(&mut self, bit: bool) {
        self.queue = self.queue << 1 | bit as u64;
        self.q_bits += 1;
        if self.q_bits > 7 {
            self.push_queue();
        }
    }

    /// Put a byte of pre-packed binary encoded data on the stream.
    fn out8(&mut self, data: u8) {
        self.queue <<= 8; //shift queue by one byte
        self.queue |= data as u64; //add the byte to queue
        self.q_bits += 8; //update depth of queue bits
        self.push_queue();
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::BitWriter;
    use crate::bitstream::BitSink;

    /// Shared buffer so the test can look at what went through the boxed writer.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn large_write_test() {
        let out = Shared::default();
        let mut bw = BitWriter::new(Box::new(out.clone()));
        (0..200_000_u32).for_each(|i| bw.out8(i as u8));
        bw.put(true);
        assert_eq!(bw.finish().unwrap(), 200_001);
        let out = out.0.lock().unwrap();
        assert_eq!(out.len(), 200_001);
        assert_eq!(out[70_000], (70_000_u32 % 256) as u8);
        assert_eq!(out[200_000], 0b1000_0000);
    }

    #[test]
    fn last_bits_test() {
        let out = Shared::default();
        let mut bw = BitWriter::new(Box::new(out.clone()));
        bw.out8(255);
        bw.put(true);
        bw.put(true);
        bw.put(true);
        bw.finish().unwrap();
        assert_eq!(*out.0.lock().unwrap(), vec![255, 224]);
    }

    #[test]
    fn write_error_test() {
        let mut bw = BitWriter::new(Box::new(Broken));
        bw.out8(1);
        assert!(bw.finish().is_err());
    }
}
