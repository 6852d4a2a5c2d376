use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use log::{debug, error, info, trace};

use super::{EXTENSION, MAGIC};
use crate::bitstream::bitreader::BitReader;
use crate::bitstream::BitSource;
use crate::error::HuffError;
use crate::huffman_coding::huffman::HuffTree;
use crate::tools::cli::{HzOpts, Output};

/// Don't trust a header length for more than this much up-front allocation.
const MAX_RESERVE: u64 = 16 * 1024 * 1024;

/// Read a complete compressed stream (header, tree, code words) from the source.
pub fn decode_stream<S: BitSource + ?Sized>(source: &mut S) -> Result<Vec<u8>, HuffError> {
    let mut magic = [0_u8; 4];
    for byte in magic.iter_mut() {
        *byte = source.byte().ok_or(HuffError::Truncated)?;
    }
    if &magic != MAGIC {
        return Err(HuffError::Corrupt("not a compressed stream"));
    }

    let mut length = 0_u64;
    for _ in 0..8 {
        length = length << 8 | source.byte().ok_or(HuffError::Truncated)? as u64;
    }
    debug!("Stream holds {} bytes.", length);
    if length == 0 {
        return Ok(Vec::new());
    }

    let mut tree = HuffTree::new();
    tree.load_tree(source)?;
    trace!("Tree has {} symbols.", tree.leaf_count());

    let mut data = Vec::with_capacity(length.min(MAX_RESERVE) as usize);
    for _ in 0..length {
        data.push(tree.decode(source)?);
    }
    Ok(data)
}

/// Decompress a byte slice in memory.
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>, HuffError> {
    decode_reader(data)
}

/// Decode a whole stream from a reader. A read error beats the Truncated it caused.
fn decode_reader<R: io::Read>(reader: R) -> Result<Vec<u8>, HuffError> {
    let mut br = BitReader::new(reader);
    match decode_stream(&mut br) {
        Err(HuffError::Truncated) => Err(br
            .take_error()
            .map_or(HuffError::Truncated, HuffError::Io)),
        result => result,
    }
}

/// Name of the file to decompress fname into.
fn output_name(fname: &str) -> String {
    match fname.strip_suffix(EXTENSION) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{}.out", fname),
    }
}

/// Decompress the files specified in opts. With no files, decompress stdin to stdout.
pub fn decompress(opts: &HzOpts) -> Result<(), HuffError> {
    if opts.files.is_empty() {
        let data = decode_reader(io::stdin().lock())?;
        io::stdout().write_all(&data)?;
        return Ok(());
    }

    for fname in &opts.files {
        if let Err(e) = decompress_file(fname, opts) {
            error!("Unable to decompress {}: {}", fname, e);
            return Err(e);
        }
    }
    Ok(())
}

/// Decompress one file.
fn decompress_file(fname: &str, opts: &HzOpts) -> Result<(), HuffError> {
    let out_name = output_name(fname);
    if opts.output == Output::File && Path::new(&out_name).exists() && !opts.force_overwrite {
        return Err(HuffError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("output file {} already exists", out_name),
        )));
    }

    let data = decode_reader(File::open(fname)?)?;
    match opts.output {
        Output::Stdout => io::stdout().write_all(&data)?,
        Output::File => {
            fs::write(&out_name, &data)?;
            info!("{}: decompressed {} bytes into {}.", fname, data.len(), out_name);
            if !opts.keep_input_files {
                fs::remove_file(fname)?;
                debug!("Removed input file {}", fname);
            }
        }
    }
    Ok(())
}

/// Check that every file in opts decompresses cleanly, without writing anything. With no
/// files, check stdin.
pub fn test(opts: &HzOpts) -> Result<(), HuffError> {
    if opts.files.is_empty() {
        return check_reader("stdin", io::stdin().lock()).map_err(|e| {
            error!("stdin: {}", e);
            e
        });
    }

    let mut first_err = None;
    for fname in &opts.files {
        let result = File::open(fname)
            .map_err(HuffError::from)
            .and_then(|f| check_reader(fname, f));
        if let Err(e) = result {
            error!("{}: {}", fname, e);
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// Decode a whole stream from reader and throw the bytes away.
fn check_reader<R: io::Read>(name: &str, reader: R) -> Result<(), HuffError> {
    let data = decode_reader(reader)?;
    info!("{}: ok ({} bytes).", name, data.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::Path;

    use super::{check_reader, decompress, decompress_bytes, output_name, test as test_files};
    use crate::compression::compress::{compress, compress_bytes};
    use crate::error::HuffError;
    use crate::tools::cli::{HzOpts, Mode, Output};

    const TEXT: &[u8] = b"she sells sea shells by the sea shore";

    fn opts_for<P: AsRef<Path>>(files: &[P], op_mode: Mode) -> HzOpts {
        HzOpts {
            files: files
                .iter()
                .map(|p| p.as_ref().to_str().unwrap().to_string())
                .collect(),
            op_mode,
            ..HzOpts::default()
        }
    }

    fn already_exists(result: Result<(), HuffError>) -> bool {
        matches!(result, Err(HuffError::Io(e)) if e.kind() == ErrorKind::AlreadyExists)
    }

    #[test]
    fn round_trip_test() {
        let text = b"It was the best of times, it was the worst of times.".to_vec();
        let packed = compress_bytes(&text).unwrap();
        assert_eq!(decompress_bytes(&packed).unwrap(), text);
    }

    #[test]
    fn all_bytes_round_trip_test() {
        let data: Vec<u8> = (0..20_000_u32).map(|i| ((i * i) % 251) as u8 ^ (i as u8)).collect();
        let packed = compress_bytes(&data).unwrap();
        assert_eq!(decompress_bytes(&packed).unwrap(), data);
    }

    #[test]
    fn empty_round_trip_test() {
        let packed = compress_bytes(&[]).unwrap();
        assert_eq!(decompress_bytes(&packed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_symbol_round_trip_test() {
        let data = vec![b'x'; 1000];
        let packed = compress_bytes(&data).unwrap();
        // header + 9 tree bits + 1000 code bits
        assert_eq!(packed.len(), 12 + (9 + 1000 + 7) / 8);
        assert_eq!(decompress_bytes(&packed).unwrap(), data);
    }

    #[test]
    fn truncated_test() {
        let data: Vec<u8> = b"abcdefgh".iter().cycle().take(400).copied().collect();
        let mut packed = compress_bytes(&data).unwrap();
        packed.truncate(packed.len() - 10);
        assert!(matches!(decompress_bytes(&packed), Err(HuffError::Truncated)));
        assert!(matches!(decompress_bytes(&packed[..6]), Err(HuffError::Truncated)));
    }

    #[test]
    fn bad_magic_test() {
        let mut packed = compress_bytes(b"hello").unwrap();
        packed[0] = b'X';
        assert!(matches!(decompress_bytes(&packed), Err(HuffError::Corrupt(_))));
    }

    #[test]
    fn output_name_test() {
        assert_eq!(output_name("notes.txt.hcz"), "notes.txt");
        assert_eq!(output_name("notes.txt"), "notes.txt.out");
        assert_eq!(output_name(".hcz"), ".hcz.out");
    }

    #[test]
    fn compress_file_keep_and_force_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("shells.txt");
        let packed = dir.path().join("shells.txt.hcz");
        fs::write(&input, TEXT).unwrap();

        let mut opts = opts_for(&[&input], Mode::Zip);
        opts.keep_input_files = true;
        compress(&opts).unwrap();
        assert!(input.exists());
        assert_eq!(fs::read(&packed).unwrap(), compress_bytes(TEXT).unwrap());

        // A second run must not clobber the .hcz unless forced.
        fs::write(&packed, b"keep me").unwrap();
        assert!(already_exists(compress(&opts)));
        assert_eq!(fs::read(&packed).unwrap(), b"keep me");

        opts.force_overwrite = true;
        compress(&opts).unwrap();
        assert_eq!(fs::read(&packed).unwrap(), compress_bytes(TEXT).unwrap());
    }

    #[test]
    fn compress_file_removes_input_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("shells.txt");
        fs::write(&input, TEXT).unwrap();

        compress(&opts_for(&[&input], Mode::Zip)).unwrap();
        assert!(!input.exists());
        assert!(dir.path().join("shells.txt.hcz").exists());
    }

    #[test]
    fn compress_to_stdout_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        fs::write(&input, b"").unwrap();

        let mut opts = opts_for(&[&input], Mode::Zip);
        opts.output = Output::Stdout;
        compress(&opts).unwrap();
        // Nothing lands on disk and the input stays, even without --keep.
        assert!(input.exists());
        assert!(!dir.path().join("empty.hcz").exists());
    }

    #[test]
    fn decompress_file_keep_and_force_test() {
        let dir = tempfile::tempdir().unwrap();
        let packed = dir.path().join("shells.txt.hcz");
        let output = dir.path().join("shells.txt");
        fs::write(&packed, compress_bytes(TEXT).unwrap()).unwrap();
        fs::write(&output, b"old").unwrap();

        let mut opts = opts_for(&[&packed], Mode::Unzip);
        opts.keep_input_files = true;
        assert!(already_exists(decompress(&opts)));
        assert_eq!(fs::read(&output).unwrap(), b"old");

        opts.force_overwrite = true;
        decompress(&opts).unwrap();
        assert_eq!(fs::read(&output).unwrap(), TEXT);
        assert!(packed.exists());

        opts.keep_input_files = false;
        decompress(&opts).unwrap();
        assert_eq!(fs::read(&output).unwrap(), TEXT);
        assert!(!packed.exists());
    }

    #[test]
    fn decompress_without_suffix_test() {
        let dir = tempfile::tempdir().unwrap();
        let packed = dir.path().join("shells.bin");
        fs::write(&packed, compress_bytes(TEXT).unwrap()).unwrap();

        decompress(&opts_for(&[&packed], Mode::Unzip)).unwrap();
        assert_eq!(fs::read(dir.path().join("shells.bin.out")).unwrap(), TEXT);
        assert!(!packed.exists());
    }

    #[test]
    fn test_mode_test() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.hcz");
        let bad = dir.path().join("bad.hcz");
        let packed = compress_bytes(TEXT).unwrap();
        fs::write(&good, &packed).unwrap();
        let mut damaged = packed.clone();
        damaged[1] = b'X';
        fs::write(&bad, &damaged).unwrap();

        test_files(&opts_for(&[&good], Mode::Test)).unwrap();
        let result = test_files(&opts_for(&[&bad, &good], Mode::Test));
        assert!(matches!(result, Err(HuffError::Corrupt(_))));

        // Test mode never writes or removes anything.
        assert!(good.exists() && bad.exists());
        assert!(!dir.path().join("good").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_mode_missing_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.hcz");
        let result = test_files(&opts_for(&[&missing], Mode::Test));
        assert!(matches!(result, Err(HuffError::Io(e)) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn check_reader_test() {
        let packed = compress_bytes(TEXT).unwrap();
        check_reader("good", packed.as_slice()).unwrap();
        assert!(matches!(
            check_reader("short", &packed[..packed.len() - 3]),
            Err(HuffError::Truncated)
        ));
        assert!(matches!(
            check_reader("bad", &b"HCZ0"[..]),
            Err(HuffError::Corrupt(_))
        ));
    }
}
