// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Adapters between caller-supplied byte streams and the `std::io` traits
//! consumed by the engine.
//!
//! A caller that cannot hand over a Rust `Read + Seek + Write` value
//! implements [`StreamCallbacks`] instead: four primitive operations that
//! report failure through negative sentinels rather than panics or
//! exceptions. [`CallbackStream`] borrows such an object and presents it
//! to the engine as an ordinary stream. The borrow keeps the object alive
//! for as long as any engine call holds the stream.

use std::io::{Read, Seek, SeekFrom, Write};

use log::error;

/// Defines the seek mode for [`StreamCallbacks::seek`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekMode {
    /// Seeks from the start of the stream.
    Start = 0,

    /// Seeks from the current position in the stream.
    Current = 1,

    /// Seeks from the end of the stream.
    End = 2,
}

/// The primitive operations a foreign stream provides.
///
/// Every operation returns a negative value on failure.
pub trait StreamCallbacks: Send {
    /// Reads into `buf` and returns the number of bytes read, `0` at the end
    /// of the data.
    fn read(&mut self, buf: &mut [u8]) -> isize;

    /// Moves the stream position and returns the new position.
    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64;

    /// Writes `buf` and returns the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> isize;

    /// Flushes buffered data. Returns `0` on success.
    fn flush(&mut self) -> isize;
}

/// A Rust `Read`/`Write`/`Seek` stream backed by a [`StreamCallbacks`] object.
pub struct CallbackStream<'a> {
    callbacks: &'a mut dyn StreamCallbacks,
}

impl<'a> CallbackStream<'a> {
    /// Wraps `callbacks` for the lifetime of the borrow.
    pub fn new(callbacks: &'a mut dyn StreamCallbacks) -> Self {
        Self { callbacks }
    }
}

fn callback_failed(op: &str, code: i64) -> std::io::Error {
    std::io::Error::other(format!("stream {op} failed ({code})"))
}

impl Read for CallbackStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.len() > isize::MAX as usize {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Read buffer is too large",
            ));
        }

        let bytes_read = self.callbacks.read(buf);
        if bytes_read < 0 {
            return Err(callback_failed("read", bytes_read as i64));
        }

        // A callback may not claim more than the buffer holds.
        Ok((bytes_read as usize).min(buf.len()))
    }
}

impl Seek for CallbackStream<'_> {
    fn seek(&mut self, from: SeekFrom) -> std::io::Result<u64> {
        let (pos, mode) = match from {
            SeekFrom::Current(pos) => (pos, SeekMode::Current),
            SeekFrom::Start(pos) => (
                i64::try_from(pos).map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek offset too large")
                })?,
                SeekMode::Start,
            ),
            SeekFrom::End(pos) => (pos, SeekMode::End),
        };

        let new_pos = self.callbacks.seek(pos, mode);
        if new_pos < 0 {
            return Err(callback_failed("seek", new_pos));
        }
        Ok(new_pos as u64)
    }
}

impl Write for CallbackStream<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.len() > isize::MAX as usize {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Write buffer is too large",
            ));
        }

        let bytes_written = self.callbacks.write(buf);
        if bytes_written < 0 {
            return Err(callback_failed("write", bytes_written as i64));
        }
        Ok((bytes_written as usize).min(buf.len()))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let result = self.callbacks.flush();
        if result < 0 {
            return Err(callback_failed("flush", result as i64));
        }
        Ok(())
    }
}

/// Exposes any `std::io` stream through [`StreamCallbacks`].
///
/// I/O failures are logged and reported as `-1`.
pub struct IoStream<T> {
    inner: T,
}

impl<T> IoStream<T>
where
    T: Read + Write + Seek + Send,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> StreamCallbacks for IoStream<T>
where
    T: Read + Write + Seek + Send,
{
    fn read(&mut self, buf: &mut [u8]) -> isize {
        match self.inner.read(buf) {
            Ok(bytes) => bytes as isize,
            Err(e) => {
                error!("stream read: {e}");
                -1
            }
        }
    }

    fn seek(&mut self, offset: i64, mode: SeekMode) -> i64 {
        let from = match mode {
            SeekMode::Start => {
                if offset < 0 {
                    error!("stream seek: offset out of bounds");
                    return -1;
                }
                SeekFrom::Start(offset as u64)
            }
            SeekMode::Current => SeekFrom::Current(offset),
            SeekMode::End => SeekFrom::End(offset),
        };

        match self.inner.seek(from) {
            Ok(pos) => i64::try_from(pos).unwrap_or(-1),
            Err(e) => {
                error!("stream seek: {e}");
                -1
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> isize {
        match self.inner.write(buf) {
            Ok(bytes) => bytes as isize,
            Err(e) => {
                error!("stream write: {e}");
                -1
            }
        }
    }

    fn flush(&mut self) -> isize {
        match self.inner.flush() {
            Ok(()) => 0,
            Err(e) => {
                error!("stream flush: {e}");
                -1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    /// A stream whose every operation fails.
    struct Broken;

    impl StreamCallbacks for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> isize {
            -1
        }

        fn seek(&mut self, _offset: i64, _mode: SeekMode) -> i64 {
            -1
        }

        fn write(&mut self, _buf: &[u8]) -> isize {
            -1
        }

        fn flush(&mut self) -> isize {
            -1
        }
    }

    /// Claims ten times more bytes than it was given.
    struct Boastful;

    impl StreamCallbacks for Boastful {
        fn read(&mut self, buf: &mut [u8]) -> isize {
            (buf.len() * 10) as isize
        }

        fn seek(&mut self, _offset: i64, _mode: SeekMode) -> i64 {
            0
        }

        fn write(&mut self, buf: &[u8]) -> isize {
            (buf.len() * 10) as isize
        }

        fn flush(&mut self) -> isize {
            0
        }
    }

    #[test]
    fn over_reported_counts_are_clamped() {
        let mut boastful = Boastful;
        let mut stream = CallbackStream::new(&mut boastful);

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        assert_eq!(stream.write(b"abc").unwrap(), 3);
        stream.write_all(b"hello world").unwrap();
    }

    #[test]
    fn read_in_chunks() {
        let mut io = IoStream::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut stream = CallbackStream::new(&mut io);

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [4, 5, 0]);

        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_modes() {
        let mut io = IoStream::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut stream = CallbackStream::new(&mut io);

        assert_eq!(stream.seek(SeekFrom::Start(2)).unwrap(), 2);
        assert_eq!(stream.seek(SeekFrom::Current(1)).unwrap(), 3);
        assert_eq!(stream.seek(SeekFrom::End(-1)).unwrap(), 4);

        let mut buf = [0u8; 1];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [5]);

        assert!(stream.seek(SeekFrom::Current(-10)).is_err());
    }

    #[test]
    fn write_and_read_back() {
        let mut io = IoStream::new(Cursor::new(Vec::new()));
        {
            let mut stream = CallbackStream::new(&mut io);
            stream.write_all(b"hello").unwrap();
            stream.flush().unwrap();
            stream.rewind().unwrap();

            let mut s = String::new();
            stream.read_to_string(&mut s).unwrap();
            assert_eq!(s, "hello");
        }
        assert_eq!(io.into_inner().into_inner(), b"hello");
    }

    #[test]
    fn negative_start_offset_is_rejected() {
        let mut io = IoStream::new(Cursor::new(vec![0u8; 4]));
        assert_eq!(io.seek(-1, SeekMode::Start), -1);
        assert_eq!(io.seek(2, SeekMode::Start), 2);
    }

    #[test]
    fn sentinels_become_io_errors() {
        let mut broken = Broken;
        let mut stream = CallbackStream::new(&mut broken);

        let mut buf = [0u8; 4];
        assert!(stream.read(&mut buf).is_err());
        assert!(stream.seek(SeekFrom::Start(0)).is_err());
        assert!(stream.write(b"x").is_err());
        assert!(stream.flush().is_err());

        let err: crate::Error = stream.read(&mut buf).unwrap_err().into();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }
}
