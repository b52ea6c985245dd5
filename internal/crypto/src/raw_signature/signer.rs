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
use x509_parser::pem::Pem;

use crate::{
    raw_signature::native_signer::NativeSigner, time_stamp::TimeStampProvider, SigningAlg,
};

/// Produces the raw signature bytes that go inside a COSE signature.
pub trait RawSigner: TimeStampProvider {
    /// Signs `data`.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, RawSignerError>;

    /// The algorithm [`sign`](Self::sign) uses.
    fn alg(&self) -> SigningAlg;

    /// DER certificates, end-entity first.
    fn cert_chain(&self) -> Result<Vec<Vec<u8>>, RawSignerError>;

    /// Upper bound, in bytes, for the COSE signature this signer produces,
    /// including its certificate chain and any time stamp.
    fn reserve_size(&self) -> usize;
}

/// Why a signer could not be built or could not sign.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum RawSignerError {
    /// The certificate chain or private key is unusable for the algorithm.
    #[error("invalid signing credentials ({0})")]
    InvalidSigningCredentials(String),

    /// Signing itself failed.
    #[error("internal error ({0})")]
    InternalError(String),
}

/// Builds a signer from a PEM certificate chain and a PKCS#8 PEM private key.
///
/// Fails with [`RawSignerError::InvalidSigningCredentials`] when either does
/// not parse or the key does not belong to `alg`.
pub fn signer_from_cert_chain_and_private_key(
    cert_chain: &[u8],
    private_key: &[u8],
    alg: SigningAlg,
    time_stamp_service_url: Option<String>,
) -> Result<Box<dyn RawSigner + Send + Sync>, RawSignerError> {
    Ok(Box::new(NativeSigner::from_cert_chain_and_private_key(
        cert_chain,
        private_key,
        alg,
        time_stamp_service_url,
    )?))
}

// Splits a PEM buffer holding one or more certificates into DER blobs.
pub(crate) fn cert_chain_from_pem(cert_chain: &[u8]) -> Result<Vec<Vec<u8>>, RawSignerError> {
    let mut certs = Vec::new();
    for pem in Pem::iter_from_buffer(cert_chain) {
        let pem = pem.map_err(|e| RawSignerError::InvalidSigningCredentials(e.to_string()))?;
        certs.push(pem.contents);
    }

    if certs.is_empty() {
        return Err(RawSignerError::InvalidSigningCredentials(
            "no certificates found".to_string(),
        ));
    }
    Ok(certs)
}
