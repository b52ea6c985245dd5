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

use thiserror::Error;

/// Describes errors that can occur when requesting a time stamp.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum TimeStampError {
    /// The time stamp service could not be reached or rejected the request.
    #[error("time stamp service error ({0})")]
    ServiceError(String),

    /// The time stamp response could not be decoded.
    #[error("invalid time stamp response ({0})")]
    DecodeError(String),

    /// An unexpected internal error occured while requesting the time stamp
    /// response.
    #[error("internal error ({0})")]
    InternalError(String),
}
