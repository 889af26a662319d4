use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Truncated input: needed {needed} bytes but only {remaining} remain")]
    TruncatedInput { needed: u64, remaining: u64 },
    #[error("Corrupt tag at offset {offset}: declares {declared} payload bytes but only {available} remain")]
    CorruptTag {
        offset: u64,
        declared: u32,
        available: u64,
    },
    #[error("Seek to offset {offset} is past the end of the input ({len} bytes)")]
    OutOfBounds { offset: u64, len: u64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases = [
            (
                FlvError::UnsupportedFormat("bad signature".to_string()),
                "Unsupported format: bad signature",
            ),
            (
                FlvError::TruncatedInput {
                    needed: 4,
                    remaining: 1,
                },
                "Truncated input: needed 4 bytes but only 1 remain",
            ),
            (
                FlvError::CorruptTag {
                    offset: 13,
                    declared: 500,
                    available: 20,
                },
                "Corrupt tag at offset 13: declares 500 payload bytes but only 20 remain",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
