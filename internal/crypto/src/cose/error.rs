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

use crate::{
    raw_signature::{RawSignatureValidationError, RawSignerError},
    time_stamp::TimeStampError,
};

/// Describes errors that can occur when processing or generating [COSE]
/// signatures.
///
/// [COSE]: https://datatracker.ietf.org/doc/rfc9052/
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoseError {
    /// No signing certificate chain was found.
    #[error("missing signing certificate chain")]
    MissingSigningCertificateChain,

    /// Signing certificates appeared in both protected and unprotected headers.
    #[error("multiple signing certificate chains detected")]
    MultipleSigningCertificateChains,

    /// An error occurred while parsing CBOR.
    #[error("error while parsing CBOR ({0})")]
    CborParsingError(String),

    /// An error occurred while generating CBOR.
    #[error("error while generating CBOR ({0})")]
    CborGenerationError(String),

    /// The signature names an algorithm this crate does not support.
    #[error("unsupported signing algorithm")]
    UnsupportedSigningAlgorithm,

    /// The signature does not fit in the space reserved for it.
    #[error("the signature box is too small")]
    BoxSizeTooSmall,

    /// The end-entity certificate could not be parsed.
    #[error("invalid certificate ({0})")]
    InvalidCertificate(String),

    /// The raw signer failed.
    #[error(transparent)]
    RawSignerError(#[from] RawSignerError),

    /// The raw signature did not validate.
    #[error(transparent)]
    RawSignatureValidationError(#[from] RawSignatureValidationError),

    /// The time stamp provider failed.
    #[error(transparent)]
    TimeStampError(#[from] TimeStampError),
}
