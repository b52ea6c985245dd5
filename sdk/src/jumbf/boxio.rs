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

//! Size accounting for box writers.

use std::io::{Result as IoResult, Write};

/// A writer that discards its input and counts the bytes it was given.
#[derive(Debug, Default)]
pub struct ByteCounter {
    count: usize,
}

impl ByteCounter {
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the number of bytes `f` writes.
    pub fn calculate<F>(f: F) -> IoResult<u64>
    where
        F: FnOnce(&mut Self) -> IoResult<()>,
    {
        let mut writer = ByteCounter::default();
        f(&mut writer)?;
        Ok(writer.count() as u64)
    }
}

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.count += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
