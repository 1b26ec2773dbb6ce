//! Body representations the logger can observe
//!
//! A [`Body`] is one of a few concrete shapes. Each readable shape implements
//! [`ReplayableRead`], which reads the whole remaining content while leaving
//! the body as the next consumer expects to find it.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Read + Seek, object safe.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// A reader that can hand out its remaining content without consuming it.
pub trait ReplayableRead {
    /// Read everything a fresh consumer would see, leaving the source untouched.
    fn replay(&mut self) -> io::Result<Bytes>;
}

impl ReplayableRead for [Bytes] {
    fn replay(&mut self) -> io::Result<Bytes> {
        match self {
            [] => Ok(Bytes::new()),
            [single] => Ok(single.clone()),
            chunks => {
                let len = chunks.iter().map(Bytes::len).sum();
                let mut buf = BytesMut::with_capacity(len);
                for chunk in chunks.iter() {
                    buf.extend_from_slice(chunk);
                }
                Ok(buf.freeze())
            }
        }
    }
}

/// A body spooled to a file.
///
/// The open handle's cursor belongs to the consumer; capture reads the file
/// through its path instead.
pub struct FileBody {
    path: PathBuf,
    file: File,
}

impl FileBody {
    /// Open `path` for reading.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The consumer's handle.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

impl ReplayableRead for FileBody {
    fn replay(&mut self) -> io::Result<Bytes> {
        std::fs::read(&self.path).map(Bytes::from)
    }
}

impl fmt::Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBody").field("path", &self.path).finish()
    }
}

/// A seekable stream, rewound after every capture.
pub struct RewindableStream {
    inner: Box<dyn ReadSeek>,
}

impl RewindableStream {
    /// Wrap a seekable reader.
    pub fn new<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }

    /// The underlying reader.
    pub fn get_mut(&mut self) -> &mut dyn ReadSeek {
        self.inner.as_mut()
    }
}

impl ReplayableRead for RewindableStream {
    fn replay(&mut self) -> io::Result<Bytes> {
        let start = self.inner.stream_position()?;
        let mut buf = Vec::new();
        let read = self.inner.read_to_end(&mut buf);
        // Rewind even when the read failed part way.
        self.inner.seek(SeekFrom::Start(start))?;
        read?;
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for RewindableStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewindableStream").finish_non_exhaustive()
    }
}

/// A wrapper around another body, such as a decorator added by an upstream layer.
pub trait BodyProxy: Send {
    /// The wrapped body.
    fn inner_mut(&mut self) -> &mut Body;

    /// Discard the wrapper and return the wrapped body.
    fn into_inner(self: Box<Self>) -> Body;
}

/// An HTTP message body in any supported representation.
#[derive(Default)]
pub enum Body {
    /// No body
    #[default]
    Empty,
    /// In-memory chunks
    Chunks(Vec<Bytes>),
    /// Spooled to a file
    File(FileBody),
    /// A seekable stream
    Stream(RewindableStream),
    /// A wrapper around another body
    Proxy(Box<dyn BodyProxy>),
}

impl Body {
    /// An empty body.
    pub fn empty() -> Self {
        Body::Empty
    }

    /// A body made of in-memory chunks.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Body::Chunks(chunks.into_iter().map(Into::into).collect())
    }

    /// A body read from a seekable stream.
    pub fn from_reader<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Body::Stream(RewindableStream::new(reader))
    }

    /// A body spooled to the file at `path`.
    pub fn from_file(path: impl Into<PathBuf>) -> io::Result<Self> {
        FileBody::open(path).map(Body::File)
    }

    /// Wrap a body in a proxy.
    pub fn proxy<P: BodyProxy + 'static>(proxy: P) -> Self {
        Body::Proxy(Box::new(proxy))
    }

    /// Follow proxies until a concrete body is reached.
    pub fn concrete_mut(&mut self) -> &mut Body {
        match self {
            Body::Proxy(proxy) => proxy.inner_mut().concrete_mut(),
            body => body,
        }
    }

    /// The full content, without disturbing what the next reader will see.
    pub fn to_bytes(&mut self) -> io::Result<Bytes> {
        match self.concrete_mut() {
            Body::Empty => Ok(Bytes::new()),
            Body::Chunks(chunks) => chunks.as_mut_slice().replay(),
            Body::File(file) => file.replay(),
            Body::Stream(stream) => stream.replay(),
            Body::Proxy(_) => unreachable!("concrete_mut strips proxies"),
        }
    }

    /// Consume the body, reading whatever remains.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Chunks(mut chunks) => chunks.as_mut_slice().replay(),
            Body::File(mut file) => {
                let mut buf = Vec::new();
                file.file.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
            Body::Stream(mut stream) => {
                let mut buf = Vec::new();
                stream.inner.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
            Body::Proxy(proxy) => proxy.into_inner().into_bytes(),
        }
    }

    /// Whether the body is known to have no content.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Chunks(chunks) => chunks.iter().all(Bytes::is_empty),
            _ => false,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Chunks(chunks) => f.debug_tuple("Body::Chunks").field(&chunks.len()).finish(),
            Body::File(file) => f.debug_tuple("Body::File").field(file).finish(),
            Body::Stream(stream) => f.debug_tuple("Body::Stream").field(stream).finish(),
            Body::Proxy(_) => f.write_str("Body::Proxy(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Chunks(vec![bytes])
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::from(Bytes::from_static(text.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::from(Bytes::from_static(bytes))
    }
}
