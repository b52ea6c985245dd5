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

use rsa::{
    pss,
    sha2::{Sha256, Sha384, Sha512},
    signature::Verifier,
    RsaPublicKey,
};
use spki::DecodePublicKey;

use crate::raw_signature::{RawSignatureValidationError, RawSignatureValidator, SigningAlg};

/// Validates signatures made with any [`SigningAlg`].
pub(crate) struct NativeValidator(pub(crate) SigningAlg);

fn public_key<K: DecodePublicKey>(der: &[u8]) -> Result<K, RawSignatureValidationError> {
    K::from_public_key_der(der).map_err(|_| RawSignatureValidationError::InvalidPublicKey)
}

fn signature<S>(sig: &[u8]) -> Result<S, RawSignatureValidationError>
where
    S: for<'a> TryFrom<&'a [u8]>,
{
    S::try_from(sig).map_err(|_| RawSignatureValidationError::InvalidSignature)
}

fn check<S, K: Verifier<S>>(
    key: K,
    sig: &[u8],
    data: &[u8],
) -> Result<(), RawSignatureValidationError>
where
    S: for<'a> TryFrom<&'a [u8]>,
{
    key.verify(data, &signature::<S>(sig)?)
        .map_err(|_| RawSignatureValidationError::SignatureMismatch)
}

impl RawSignatureValidator for NativeValidator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key_der: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        match self.0 {
            SigningAlg::Ed25519 => {
                let sig: ed25519_dalek::Signature = signature(sig)?;
                let key: ed25519_dalek::VerifyingKey = public_key(public_key_der)?;
                key.verify_strict(data, &sig)
                    .map_err(|_| RawSignatureValidationError::SignatureMismatch)
            }
            SigningAlg::Es256 => check::<p256::ecdsa::Signature, _>(
                public_key::<p256::ecdsa::VerifyingKey>(public_key_der)?,
                sig,
                data,
            ),
            SigningAlg::Es384 => check::<p384::ecdsa::Signature, _>(
                public_key::<p384::ecdsa::VerifyingKey>(public_key_der)?,
                sig,
                data,
            ),
            SigningAlg::Es512 => {
                // P-521 keys only decode as a plain public key
                let pk: p521::PublicKey = public_key(public_key_der)?;
                let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(&pk.to_sec1_bytes())
                    .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;
                check::<p521::ecdsa::Signature, _>(key, sig, data)
            }
            SigningAlg::Ps256 => {
                let key: RsaPublicKey = public_key(public_key_der)?;
                check::<pss::Signature, _>(pss::VerifyingKey::<Sha256>::new(key), sig, data)
            }
            SigningAlg::Ps384 => {
                let key: RsaPublicKey = public_key(public_key_der)?;
                check::<pss::Signature, _>(pss::VerifyingKey::<Sha384>::new(key), sig, data)
            }
            SigningAlg::Ps512 => {
                let key: RsaPublicKey = public_key(public_key_der)?;
                check::<pss::Signature, _>(pss::VerifyingKey::<Sha512>::new(key), sig, data)
            }
        }
    }
}
