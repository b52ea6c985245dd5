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

use crate::time_stamp::TimeStampError;

/// A `TimeStampProvider` implementation can obtain a [RFC 3161] time stamp
/// token for a specific piece of data.
///
/// [RFC 3161]: https://datatracker.ietf.org/doc/html/rfc3161
pub trait TimeStampProvider {
    /// Return the URL for time stamp service.
    fn time_stamp_service_url(&self) -> Option<String> {
        None
    }

    /// Request a [RFC 3161] time stamp token over an arbitrary data packet.
    ///
    /// Returns `None` when no token is available. The default implementation
    /// never performs network I/O; implementations that can reach the
    /// service named by [`Self::time_stamp_service_url()`] override it.
    ///
    /// [RFC 3161]: https://datatracker.ietf.org/doc/html/rfc3161
    fn send_time_stamp_request(&self, _message: &[u8]) -> Option<Result<Vec<u8>, TimeStampError>> {
        None
    }
}
