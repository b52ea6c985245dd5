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

//! The `callback_signer` module provides a way to obtain a [`Signer`]
//! using a callback and public signing certificates.

use crate::{Error, Result, Signer, SigningAlg};

/// Defines a callback function interface for a [`CallbackSigner`].
///
/// The callback should return a signature for the given data, or an error if
/// the data cannot be signed.
pub type CallbackFunc = dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync;

/// Defines a signer that uses a callback to sign data.
///
/// The private key should only be known by the callback.
pub struct CallbackSigner {
    callback: Box<CallbackFunc>,
    alg: SigningAlg,
    // public certificates in PEM format
    certs: Vec<u8>,
    reserve_size: usize,
    tsa_url: Option<String>,
}

impl CallbackSigner {
    /// Create a new callback signer.
    pub fn new<F, T>(callback: F, alg: SigningAlg, certs: T) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
        T: Into<Vec<u8>>,
    {
        let certs = certs.into();
        let reserve_size = 10000 + certs.len();

        Self {
            callback: Box::new(callback),
            alg,
            certs,
            reserve_size,
            tsa_url: None,
        }
    }

    /// Set a time stamping authority URL to call when signing.
    pub fn set_tsa_url<S: Into<String>>(mut self, url: S) -> Self {
        self.tsa_url = Some(url.into());
        self
    }

    /// Overrides the number of bytes reserved for the signature.
    pub fn set_reserve_size(mut self, reserve_size: usize) -> Self {
        self.reserve_size = reserve_size;
        self
    }

    /// Sign data using an Ed25519 private key.
    /// This static function is provided for testing with [`CallbackSigner`].
    /// For a released product the private key should be stored securely.
    ///
    /// ```
    /// use c2pa_engine::{CallbackSigner, SigningAlg};
    ///
    /// const CERTS: &[u8] = include_bytes!("../tests/fixtures/certs/ed25519.pub");
    /// const PRIVATE_KEY: &[u8] = include_bytes!("../tests/fixtures/certs/ed25519.pem");
    ///
    /// let ed_signer = |data: &[u8]| CallbackSigner::ed25519_sign(data, PRIVATE_KEY);
    /// let signer = CallbackSigner::new(ed_signer, SigningAlg::Ed25519, CERTS);
    /// ```
    pub fn ed25519_sign(data: &[u8], private_key: &[u8]) -> Result<Vec<u8>> {
        ed25519_sign(data, private_key)
    }
}

/// Signs `data` with an Ed25519 PKCS#8 PEM private key. The signature is
/// always 64 bytes.
pub fn ed25519_sign(data: &[u8], private_key: &[u8]) -> Result<Vec<u8>> {
    use ed25519_dalek::{pkcs8::DecodePrivateKey, Signer as _, SigningKey};

    let pem = std::str::from_utf8(private_key)
        .map_err(|_| Error::Signature("private key is not PEM text".to_string()))?;
    let signing_key = SigningKey::from_pkcs8_pem(pem)
        .map_err(|e| Error::Signature(format!("invalid Ed25519 key: {e}")))?;

    Ok(signing_key.sign(data).to_bytes().to_vec())
}

impl Signer for CallbackSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match (self.callback)(data) {
            Ok(signature) if signature.is_empty() => Err(Error::Signature(
                "signing callback returned no signature".to_string(),
            )),
            Ok(signature) => Ok(signature),
            Err(Error::Signature(msg)) => Err(Error::Signature(msg)),
            Err(e) => Err(Error::Signature(format!("signing callback failed: {e}"))),
        }
    }

    fn alg(&self) -> SigningAlg {
        self.alg
    }

    fn certs(&self) -> Result<Vec<Vec<u8>>> {
        let pems = pem::parse_many(&self.certs)
            .map_err(|e| Error::Signature(format!("invalid certificates: {e}")))?;
        if pems.is_empty() {
            return Err(Error::Signature("no certificates found".to_string()));
        }
        Ok(pems.into_iter().map(|p| p.into_contents()).collect())
    }

    fn reserve_size(&self) -> usize {
        self.reserve_size
    }

    fn time_authority_url(&self) -> Option<String> {
        self.tsa_url.clone()
    }
}
