//! Object content carried through the transport boundary.
//!
//! [`Body`] is either empty, a buffered [`Bytes`] value, or a boxed stream of
//! `Bytes` chunks. Small JSON payloads travel buffered; object content may
//! travel as a stream in both directions.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

/// A request or response body.
#[derive(Default)]
pub enum Body {
    /// No content.
    #[default]
    Empty,
    /// Buffered content.
    Full(Bytes),
    /// Streamed content.
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl Body {
    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a buffered body.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Full(data.into())
    }

    /// Wrap a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// Serve buffered data as a stream of chunks of at most `chunk_size`
    /// bytes. Slicing `Bytes` shares the buffer, so no data is copied.
    ///
    /// # Examples
    ///
    /// ```
    /// use bcestack_bos_model::body::Body;
    ///
    /// let body = Body::chunked(bytes::Bytes::from_static(b"abcdefg"), 3);
    /// assert!(matches!(body, Body::Stream(_)));
    /// assert_eq!(tokio_test::block_on(body.collect()).unwrap(), "abcdefg");
    /// ```
    #[must_use]
    pub fn chunked(data: Bytes, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunks: Vec<io::Result<Bytes>> = (0..data.len())
            .step_by(chunk_size)
            .map(|start| Ok(data.slice(start..(start + chunk_size).min(data.len()))))
            .collect();
        Self::Stream(stream::iter(chunks).boxed())
    }

    /// The exact length, when known without reading the body.
    #[must_use]
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Full(bytes) => Some(bytes.len() as u64),
            Self::Stream(_) => None,
        }
    }

    /// The buffered content, if the body is not a stream.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Empty => Some(&[]),
            Self::Full(bytes) => Some(bytes),
            Self::Stream(_) => None,
        }
    }

    /// Keep at most the first `limit` bytes.
    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Full(mut bytes) => {
                let keep = usize::try_from(limit).unwrap_or(usize::MAX).min(bytes.len());
                bytes.truncate(keep);
                Self::Full(bytes)
            }
            Self::Stream(inner) => {
                let limited = inner.scan(limit, |remaining, chunk| {
                    let item = match chunk {
                        Ok(_) if *remaining == 0 => None,
                        Ok(mut bytes) => {
                            let keep = usize::try_from(*remaining)
                                .unwrap_or(usize::MAX)
                                .min(bytes.len());
                            bytes.truncate(keep);
                            *remaining -= keep as u64;
                            Some(Ok(bytes))
                        }
                        Err(e) => Some(Err(e)),
                    };
                    futures::future::ready(item)
                });
                Self::Stream(limited.boxed())
            }
        }
    }

    /// Read the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by a streamed body.
    pub async fn collect(self) -> io::Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(inner) => inner
                .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                    acc.extend_from_slice(&chunk);
                    Ok(acc)
                })
                .await
                .map(BytesMut::freeze),
        }
    }

    /// Turn any body into a stream of chunks.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        match self {
            Self::Empty => stream::empty().boxed(),
            Self::Full(bytes) => stream::once(futures::future::ready(Ok(bytes))).boxed(),
            Self::Stream(inner) => inner,
        }
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::Full(data)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::Full(data.into())
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Self::Full(data.into())
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::Full(Bytes::from_static(data.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Self::Full(Bytes::from_static(data))
    }
}
