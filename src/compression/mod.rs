// src/compression/mod.rs
//! Compression utilities for package archives
//!
//! conda packages of this generation are bzip2-compressed tarballs. This
//! module wraps the encoder/decoder so archive writers and readers do not
//! depend on the codec directly.

use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to finish {format} stream: {source}")]
    Finish {
        format: &'static str,
        source: io::Error,
    },
}

impl From<CompressionError> for crate::error::Error {
    fn from(err: CompressionError) -> Self {
        crate::error::Error::Io(io::Error::other(err.to_string()))
    }
}

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionFormat {
    /// No compression (raw tar)
    None,
    /// Bzip2 compression (.bz2)
    #[default]
    Bzip2,
}

impl CompressionFormat {
    /// Detect compression format from magic bytes
    ///
    /// Bzip2 streams start with `BZh` followed by the block size digit.
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() >= 4 && &data[0..3] == b"BZh" && (b'1'..=b'9').contains(&data[3]) {
            Self::Bzip2
        } else {
            Self::None
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bzip2 => "bzip2",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A compressing writer that must be explicitly finished
pub enum Encoder<W: Write> {
    None(W),
    Bzip2(BzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Flush remaining compressed data and return the inner writer
    pub fn finish(self) -> Result<W, CompressionError> {
        match self {
            Self::None(mut w) => {
                w.flush().map_err(|e| CompressionError::Finish {
                    format: "none",
                    source: e,
                })?;
                Ok(w)
            }
            Self::Bzip2(enc) => enc.finish().map_err(|e| CompressionError::Finish {
                format: "bzip2",
                source: e,
            }),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::None(w) => w.write(buf),
            Self::Bzip2(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::None(w) => w.flush(),
            Self::Bzip2(enc) => enc.flush(),
        }
    }
}

/// Wrap a writer with a compressing encoder
pub fn create_encoder<W: Write>(writer: W, format: CompressionFormat) -> Encoder<W> {
    match format {
        CompressionFormat::None => Encoder::None(writer),
        CompressionFormat::Bzip2 => Encoder::Bzip2(BzEncoder::new(writer, Compression::best())),
    }
}

/// Create a decompressing reader for the given format
pub fn create_decoder<'a, R: Read + 'a>(reader: R, format: CompressionFormat) -> Box<dyn Read + 'a> {
    match format {
        CompressionFormat::None => Box::new(reader),
        CompressionFormat::Bzip2 => Box::new(BzDecoder::new(reader)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            CompressionFormat::from_magic_bytes(b"BZh91AY&SY"),
            CompressionFormat::Bzip2
        );
        assert_eq!(CompressionFormat::from_magic_bytes(b"BZh"), CompressionFormat::None);
        assert_eq!(CompressionFormat::from_magic_bytes(b"BZhx"), CompressionFormat::None);
        assert_eq!(
            CompressionFormat::from_magic_bytes(&[0x1f, 0x8b, 0x08, 0x00]),
            CompressionFormat::None
        );
    }

    #[test]
    fn test_bzip2_encode_then_decode() {
        let mut encoder = create_encoder(Vec::new(), CompressionFormat::Bzip2);
        encoder.write_all(b"hello conda").unwrap();
        let compressed = encoder.finish().unwrap();

        let format = CompressionFormat::from_magic_bytes(&compressed);
        assert_eq!(format, CompressionFormat::Bzip2);

        let mut decoded = Vec::new();
        create_decoder(compressed.as_slice(), format)
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, b"hello conda");
    }

    #[test]
    fn test_none_passthrough() {
        let mut encoder = create_encoder(Vec::new(), CompressionFormat::None);
        encoder.write_all(b"raw").unwrap();
        let out = encoder.finish().unwrap();
        assert_eq!(out, b"raw");
        assert_eq!(CompressionFormat::from_magic_bytes(&out), CompressionFormat::None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format!("{}", CompressionFormat::Bzip2), "bzip2");
    }
}
