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

use crate::raw_signature::{native_validator::NativeValidator, SigningAlg};

/// Checks a raw signature, without any COSE wrapping, against a public key.
pub trait RawSignatureValidator {
    /// Returns `Ok(())` when `sig` over `data` was made with the private half
    /// of `public_key`, a DER `SubjectPublicKeyInfo`.
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError>;
}

/// Returns the validator for `alg`.
pub fn validator_for_signing_alg(alg: SigningAlg) -> Box<dyn RawSignatureValidator> {
    Box::new(NativeValidator(alg))
}

/// Why a raw signature was rejected.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum RawSignatureValidationError {
    /// The signature was not made over this data with this key.
    #[error("the signature does not match the provided data or public key")]
    SignatureMismatch,

    /// The public key could not be decoded for the algorithm.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The signature bytes are malformed for the algorithm.
    #[error("invalid signature value")]
    InvalidSignature,
}
