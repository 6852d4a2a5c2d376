use std::fs;
use std::io::{self, Read};
use std::path::Path;

use log::{debug, error, info, warn};

use super::{EXTENSION, MAGIC};
use crate::bitstream::bitpacker::BitPacker;
use crate::bitstream::bitwriter::BitWriter;
use crate::bitstream::BitSink;
use crate::error::HuffError;
use crate::huffman_coding::huffman::HuffTree;
use crate::tools::cli::{HzOpts, Output};
use crate::tools::freq_count::freqs;

/// Write data as a complete compressed stream (header, tree, code words) to the sink.
/// Does not flush the sink. Returns the tree used, or None for empty input.
pub fn encode_stream<S: BitSink + ?Sized>(
    data: &[u8],
    sink: &mut S,
) -> Result<Option<HuffTree>, HuffError> {
    MAGIC.iter().for_each(|&x| sink.out8(x));
    (data.len() as u64)
        .to_be_bytes()
        .iter()
        .for_each(|&x| sink.out8(x));

    if data.is_empty() {
        debug!("Empty input, writing header only.");
        return Ok(None);
    }

    let freqs = freqs(data);
    let mut tree = HuffTree::new();
    tree.build(&freqs);
    info!(
        "Found {} distinct symbols, longest code is {} bits.",
        tree.leaf_count(),
        tree.height()
    );
    if let Some(bits) = tree.encoded_len(&freqs) {
        debug!("Code words will take {} bits.", bits);
    }

    tree.save_tree(sink)?;
    for &byte in data {
        tree.encode(byte, sink)?;
    }
    Ok(Some(tree))
}

/// Compress a byte slice in memory.
pub fn compress_bytes(data: &[u8]) -> Result<Vec<u8>, HuffError> {
    let mut bp = BitPacker::new(data.len() / 2 + 16);
    encode_stream(data, &mut bp)?;
    bp.flush();
    Ok(bp.output)
}

/// Compress the input files defined in opts. With no files, compress stdin to stdout.
pub fn compress(opts: &HzOpts) -> Result<(), HuffError> {
    if opts.files.is_empty() {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        let mut bw = BitWriter::create(None)?;
        encode_stream(&data, &mut bw)?;
        let written = bw.finish()?;
        report("stdin", data.len(), written);
        return Ok(());
    }

    for fname in &opts.files {
        if let Err(e) = compress_file(fname, opts) {
            error!("Unable to compress {}: {}", fname, e);
            return Err(e);
        }
    }
    Ok(())
}

/// Compress one file into fname.hcz (or to stdout).
fn compress_file(fname: &str, opts: &HzOpts) -> Result<(), HuffError> {
    if fname.ends_with(EXTENSION) {
        warn!("{} already has {} suffix, compressing anyway.", fname, EXTENSION);
    }
    let data = fs::read(fname)?;

    let out_name = format!("{}{}", fname, EXTENSION);
    let target = match opts.output {
        Output::Stdout => None,
        Output::File => {
            if Path::new(&out_name).exists() && !opts.force_overwrite {
                return Err(HuffError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("output file {} already exists", out_name),
                )));
            }
            Some(out_name.as_str())
        }
    };

    let bw = BitWriter::create(target)?;
    let written = write_compressed(&data, bw, target)?;
    report(fname, data.len(), written);

    if opts.output == Output::File && !opts.keep_input_files {
        fs::remove_file(fname)?;
        debug!("Removed input file {}", fname);
    }
    Ok(())
}

/// Encode data through bw and finish it, returning the bytes written. If either step fails
/// and the output is a file, the partial file at path is removed before the error returns.
fn write_compressed(
    data: &[u8],
    mut bw: BitWriter,
    path: Option<&str>,
) -> Result<usize, HuffError> {
    let result = match encode_stream(data, &mut bw) {
        Ok(_) => bw.finish().map_err(HuffError::from),
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Some(path) = path {
            match fs::remove_file(path) {
                Ok(()) => warn!("Removed partial output file {}", path),
                Err(e) => error!("Unable to remove partial output file {}: {}", path, e),
            }
        }
    }
    result
}

/// Tell the user how well compression went.
fn report(name: &str, before: usize, after: usize) {
    if before == 0 {
        info!("{}: empty input, {} bytes out.", name, after);
    } else {
        info!(
            "{}: {} -> {} bytes, {:.3}:1, {:.2} bits/byte.",
            name,
            before,
            after,
            before as f64 / after as f64,
            after as f64 * 8.0 / before as f64
        );
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::{compress_bytes, encode_stream, write_compressed};
    use crate::bitstream::bitwriter::BitWriter;
    use crate::compression::MAGIC;

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
    fn empty_input_test() {
        let out = compress_bytes(&[]).unwrap();
        assert_eq!(&out[..4], MAGIC);
        assert_eq!(&out[4..], &[0; 8]);
    }

    #[test]
    fn single_symbol_test() {
        // header, then 1 + 8 tree bits for 'a', then one 0 bit per byte: 9 + 4 = 13 bits.
        let out = compress_bytes(b"aaaa").unwrap();
        assert_eq!(&out[4..12], &4_u64.to_be_bytes());
        assert_eq!(&out[12..], &[0b1011_0000, 0b1000_0000]);
    }

    #[test]
    fn header_and_tree_test() {
        let mut bits: Vec<bool> = Vec::new();
        let tree = encode_stream(b"abb", &mut bits).unwrap().unwrap();
        // 96 header bits, then 0 | 1 'a' | 1 'b', then a=0 b=1 b=1
        assert_eq!(bits.len(), 96 + 19 + 3);
        assert_eq!(&bits[96 + 19..], &[false, true, true]);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn compresses_skewed_text_test() {
        let data: Vec<u8> = b"aaaaaaaaaaaaaaabbbbbbbccc d"
            .iter()
            .cycle()
            .take(10_000)
            .copied()
            .collect();
        let out = compress_bytes(&data).unwrap();
        assert!(out.len() < data.len() / 3);
    }

    #[test]
    fn failed_write_removes_partial_output_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.hcz");
        std::fs::write(&path, b"HCZ1 half written").unwrap();
        let name = path.to_str().unwrap();

        let bw = BitWriter::new(Box::new(Broken));
        assert!(write_compressed(b"some data", bw, Some(name)).is_err());
        assert!(!path.exists());
    }
}
