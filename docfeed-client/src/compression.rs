//! Request body compression.

use flate2::{Compress, Crc, FlushCompress, Status};
use tracing::trace;

use crate::pool::{ObjectPool, Poolable, Pooled};
use crate::{Compression, FeedError, Result};

/// Bodies larger than this are gzipped under [`Compression::Auto`].
pub const AUTO_COMPRESS_THRESHOLD: usize = 512;

const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff];

impl Compression {
    /// Whether a body of `len` bytes should be gzipped.
    pub fn should_compress(&self, len: usize) -> bool {
        match self {
            Self::Gzip => true,
            Self::Auto => len > AUTO_COMPRESS_THRESHOLD,
            Self::None => false,
        }
    }
}

/// Gzip encoder whose deflate state survives between requests.
pub struct GzipCompressor {
    deflate: Compress,
    crc: Crc,
    #[cfg(test)]
    pub(crate) fail: bool,
}

impl Poolable for GzipCompressor {
    fn create() -> Self {
        Self {
            deflate: Compress::new(flate2::Compression::default(), false),
            crc: Crc::new(),
            #[cfg(test)]
            fail: false,
        }
    }

    fn reset(&mut self) {
        self.deflate.reset();
        self.crc.reset();
    }
}

impl GzipCompressor {
    /// Write `data` as one complete gzip member to the end of `out`.
    ///
    /// Starts from fresh deflate and checksum state on every call.
    pub fn compress_into(&mut self, data: &[u8], out: &mut Vec<u8>) -> Result<()> {
        #[cfg(test)]
        if self.fail {
            return Err(FeedError::Encoding("compressor failure".into()));
        }
        self.reset();

        out.extend_from_slice(&GZIP_HEADER);
        self.crc.update(data);

        let mut input = data;
        loop {
            if out.capacity() - out.len() < 64 {
                out.reserve(input.len() / 2 + 64);
            }
            let before = self.deflate.total_in();
            let status = self
                .deflate
                .compress_vec(input, out, FlushCompress::Finish)
                .map_err(|e| FeedError::Encoding(e.to_string()))?;
            input = &input[(self.deflate.total_in() - before) as usize..];

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => out.reserve(out.capacity().max(64)),
            }
        }

        out.extend_from_slice(&self.crc.sum().to_le_bytes());
        out.extend_from_slice(&self.crc.amount().to_le_bytes());
        Ok(())
    }
}

/// Body as handed to the transport.
pub(crate) enum Payload<'a> {
    /// The document body, untouched.
    Raw(&'a [u8]),
    /// Gzipped copy in a pooled buffer.
    Gzip(Pooled<'a, Vec<u8>>),
}

impl Payload<'_> {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Raw(body) => *body,
            Self::Gzip(buf) => buf.as_slice(),
        }
    }

    pub(crate) fn is_gzipped(&self) -> bool {
        matches!(self, Self::Gzip(_))
    }
}

/// Apply the compression policy to a body.
pub(crate) fn encode<'a>(
    body: &'a [u8],
    compression: Compression,
    compressors: &ObjectPool<GzipCompressor>,
    buffers: &'a ObjectPool<Vec<u8>>,
) -> Result<Payload<'a>> {
    if !compression.should_compress(body.len()) {
        return Ok(Payload::Raw(body));
    }

    let mut compressor = compressors.acquire();
    let mut buf = buffers.acquire();
    compressor.compress_into(body, &mut buf)?;
    trace!(
        original = body.len(),
        compressed = buf.len(),
        "Compressed request body"
    );
    Ok(Payload::Gzip(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_should_compress() {
        assert!(!Compression::Auto.should_compress(512));
        assert!(Compression::Auto.should_compress(513));
        assert!(Compression::Gzip.should_compress(0));
        assert!(!Compression::None.should_compress(1 << 20));
    }

    #[test]
    fn test_auto_boundary() {
        let compressors = ObjectPool::new(2);
        let buffers = ObjectPool::new(2);

        let small = vec![b'a'; 512];
        let payload = encode(&small, Compression::Auto, &compressors, &buffers).unwrap();
        assert!(!payload.is_gzipped());
        assert_eq!(payload.as_bytes(), small.as_slice());

        let big = vec![b'a'; 513];
        let payload = encode(&big, Compression::Auto, &compressors, &buffers).unwrap();
        assert!(payload.is_gzipped());
        assert_eq!(&payload.as_bytes()[..2], &[0x1fu8, 0x8b]);
        assert_eq!(gunzip(payload.as_bytes()), big);
    }

    #[test]
    fn test_compressor_is_reusable() {
        let compressors: ObjectPool<GzipCompressor> = ObjectPool::new(1);
        let buffers: ObjectPool<Vec<u8>> = ObjectPool::new(1);

        for body in [&br#"{"fields":{"a":"first"}}"#[..], &br#"{"fields":{"b":"second, longer"}}"#[..]] {
            let payload = encode(body, Compression::Gzip, &compressors, &buffers).unwrap();
            assert_eq!(gunzip(payload.as_bytes()), body);
        }
        assert_eq!(compressors.stats().misses(), 1);
        assert_eq!(compressors.stats().hits(), 1);
    }

    #[test]
    fn test_large_incompressible_body() {
        let mut state = 0x2545f491u32;
        let body: Vec<u8> = (0..200_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();

        let mut compressor = GzipCompressor::create();
        let mut out = Vec::new();
        compressor.compress_into(&body, &mut out).unwrap();
        assert_eq!(gunzip(&out), body);
    }

    #[test]
    fn test_compress_into_twice_on_one_instance() {
        let mut compressor = GzipCompressor::create();
        let first = br#"{"fields":{"a":"first"}}"#;
        let second = br#"{"fields":{"b":"second, a bit longer"}}"#;

        let mut out = Vec::new();
        compressor.compress_into(first, &mut out).unwrap();
        assert_eq!(gunzip(&out), first);

        let mut out = Vec::new();
        compressor.compress_into(second, &mut out).unwrap();
        assert_eq!(gunzip(&out), second);
        let crc = u32::from_le_bytes(out[out.len() - 8..out.len() - 4].try_into().unwrap());
        let mut expected = Crc::new();
        expected.update(second);
        assert_eq!(crc, expected.sum());
    }

    #[test]
    fn test_empty_body_gzip() {
        let mut compressor = GzipCompressor::create();
        let mut out = Vec::new();
        compressor.compress_into(b"", &mut out).unwrap();
        assert_eq!(&out[..2], &[0x1fu8, 0x8b]);
        assert!(gunzip(&out).is_empty());
    }
}
