//! Error type shared by the Huffman tree, the bitstream helpers and the file driver.

/// Everything that can go wrong while building, using or transporting a Huffman tree.
#[derive(Debug, thiserror::Error)]
pub enum HuffError {
    /// The tree has no nodes: build() was never called, or every frequency was zero.
    #[error("huffman tree not built")]
    NotBuilt,

    /// The symbol had a zero frequency when the tree was built.
    #[error("unknown symbol: {0:#04x}")]
    UnknownSymbol(u8),

    /// The bit source ran dry before a code word (or the tree) was complete.
    #[error("corrupt or truncated stream: unexpected end of data")]
    Truncated,

    /// The data could be read but does not describe a valid tree or code.
    #[error("corrupt stream: {0}")]
    Corrupt(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HuffError {
    /// Returns true if the error came from damaged input rather than a caller mistake.
    #[inline]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, HuffError::Truncated | HuffError::Corrupt(_))
    }
}

#[cfg(test)]
mod test {
    use super::HuffError;

    #[test]
    fn is_corrupt_test() {
        assert!(HuffError::Truncated.is_corrupt());
        assert!(HuffError::Corrupt("bad tree").is_corrupt());
        assert!(!HuffError::NotBuilt.is_corrupt());
        assert!(!HuffError::UnknownSymbol(7).is_corrupt());
    }

    #[test]
    fn display_test() {
        assert_eq!(HuffError::UnknownSymbol(0x41).to_string(), "unknown symbol: 0x41");
        assert_eq!(HuffError::NotBuilt.to_string(), "huffman tree not built");
        assert_eq!(
            HuffError::Corrupt("bad magic").to_string(),
            "corrupt stream: bad magic"
        );
    }
}
