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
//! Provides access to COSE signature generation.

#![deny(missing_docs)]

use c2pa_engine_crypto::cose::{sign, CoseError};

use crate::{
    claim::Claim, cose_validator::verify_cose, signer::RawSignerWrapper, Error, Result, Signer,
};

/// Generate a COSE signature for a block of bytes which must be a valid C2PA
/// claim structure.
///
/// ## Actions taken
///
/// 1. Verifies that the data supplied is a valid C2PA claim. The function will
///    respond with [`Error::Decoding`] if not.
/// 2. Signs the data using the provided [`Signer`] instance. Will ensure that
///    the signature is padded to match `box_size`, which should be the number of
///    bytes reserved for the `c2pa.signature` JUMBF box in this claim's manifest.
///    (If `box_size` is too small for the generated signature, this function
///    will respond with an error.)
/// 3. Verifies that the signature is valid COSE. Will respond with
///    [`Error::Signature`] if unable to validate.
pub(crate) fn sign_claim(claim_bytes: &[u8], signer: &dyn Signer, box_size: usize) -> Result<Vec<u8>> {
    // Must be a valid claim.
    let _claim = Claim::from_data("dummy_label", claim_bytes)?;

    let signed_bytes = cose_sign(signer, claim_bytes, box_size)?;

    // Sanity check: Ensure that this signature is valid.
    verify_cose(&signed_bytes, claim_bytes)
        .map_err(|e| Error::Signature(format!("generated signature does not verify: {e}")))?;

    Ok(signed_bytes)
}

/// Returns signed Cose_Sign1 bytes for `data`, exactly `box_size` long.
pub(crate) fn cose_sign(signer: &dyn Signer, data: &[u8], box_size: usize) -> Result<Vec<u8>> {
    // Make sure there is a signing cert.
    if signer.certs()?.is_empty() {
        return Err(Error::Signature("no signing certificate".to_string()));
    }

    let wrapper = RawSignerWrapper(signer);
    sign(&wrapper, data, Some(box_size)).map_err(|e| match e {
        CoseError::BoxSizeTooSmall => Error::Signature(format!(
            "signature needs more than the {box_size} bytes reserved for it"
        )),
        e => e.into(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{claim::Claim, utils::test::test_signer, ErrorKind, SigningAlg};

    fn claim_bytes() -> Vec<u8> {
        let claim = Claim::new("cose_sign_test", "image/jpeg", Some("cose.jpg"));
        claim.data().unwrap()
    }

    #[test]
    fn test_sign_claim() {
        let signer = test_signer(SigningAlg::Ps256);
        let claim_bytes = claim_bytes();
        let box_size = signer.reserve_size();

        let cose = sign_claim(&claim_bytes, &signer, box_size).unwrap();
        assert_eq!(cose.len(), box_size);

        let info = verify_cose(&cose, &claim_bytes).unwrap();
        assert_eq!(info.alg, Some(SigningAlg::Ps256));
    }

    #[test]
    fn test_sign_claim_ed25519() {
        let signer = test_signer(SigningAlg::Ed25519);
        let claim_bytes = claim_bytes();

        let cose = sign_claim(&claim_bytes, &signer, signer.reserve_size()).unwrap();
        assert_eq!(cose.len(), signer.reserve_size());
    }

    #[test]
    fn test_box_too_small() {
        let signer = test_signer(SigningAlg::Es256);
        let err = sign_claim(&claim_bytes(), &signer, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signature);
    }

    #[test]
    fn test_not_a_claim() {
        let signer = test_signer(SigningAlg::Es256);
        let err = sign_claim(b"not cbor at all", &signer, signer.reserve_size()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }
}
