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

use std::io::{Read, Seek, SeekFrom, Write};

use crate::Result;

/// Returns the length of the stream without moving its position.
pub(crate) fn stream_len<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<u64> {
    let old_pos = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;

    if old_pos != len {
        reader.seek(SeekFrom::Start(old_pos))?;
    }

    Ok(len)
}

/// Copies all of `source` into `dest`, starting from the beginning.
pub(crate) fn copy_stream<R: Read + Seek + ?Sized, W: Write + ?Sized>(
    source: &mut R,
    dest: &mut W,
) -> Result<u64> {
    source.rewind()?;
    let n = std::io::copy(source, dest)?;
    dest.flush()?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_stream_len_keeps_position() {
        let mut source = Cursor::new(vec![0u8; 10]);
        source.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(stream_len(&mut source).unwrap(), 10);
        assert_eq!(source.stream_position().unwrap(), 3);
    }

    #[test]
    fn test_copy_stream() {
        let mut source = Cursor::new(b"hello".to_vec());
        source.seek(SeekFrom::End(0)).unwrap();
        let mut dest = Cursor::new(Vec::new());
        assert_eq!(copy_stream(&mut source, &mut dest).unwrap(), 5);
        assert_eq!(dest.into_inner(), b"hello");
    }
}
