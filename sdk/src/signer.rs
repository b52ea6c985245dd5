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

use c2pa_engine_crypto::{
    raw_signature::{signer_from_cert_chain_and_private_key, RawSigner, RawSignerError},
    time_stamp::{TimeStampError, TimeStampProvider},
    SigningAlg,
};
use log::debug;

use crate::{callback_signer::CallbackSigner, Error, Result};

/// The `Signer` trait generates a cryptographic signature over a byte array.
///
/// This is the interface the signing pipeline consumes. It is implemented by
/// [`LocalSigner`], [`CallbackSigner`] and [`SignerHandle`], and may be
/// implemented by callers that keep keys elsewhere.
pub trait Signer {
    /// Returns a new byte array which is a signature over the original.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Returns the algorithm of the Signer.
    fn alg(&self) -> SigningAlg;

    /// Returns the certificates as a Vec containing a Vec of DER bytes for each certificate.
    fn certs(&self) -> Result<Vec<Vec<u8>>>;

    /// Returns the size in bytes of the largest possible expected signature.
    /// Signing will fail if the result of the `sign` function is larger
    /// than this value.
    fn reserve_size(&self) -> usize;

    /// URL for time authority to time stamp the signature
    fn time_authority_url(&self) -> Option<String> {
        None
    }

    /// Request an RFC 3161 time stamp over `message`.
    ///
    /// The default returns `None`: this crate never contacts a time stamp
    /// authority itself.
    fn send_timestamp_request(&self, _message: &[u8]) -> Option<Result<Vec<u8>>> {
        None
    }
}

/// An owned, thread safe [`Signer`].
pub type BoxedSigner = Box<dyn Signer + Send + Sync>;

impl<T: Signer + ?Sized> Signer for Box<T> {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        (**self).sign(data)
    }

    fn alg(&self) -> SigningAlg {
        (**self).alg()
    }

    fn certs(&self) -> Result<Vec<Vec<u8>>> {
        (**self).certs()
    }

    fn reserve_size(&self) -> usize {
        (**self).reserve_size()
    }

    fn time_authority_url(&self) -> Option<String> {
        (**self).time_authority_url()
    }

    fn send_timestamp_request(&self, message: &[u8]) -> Option<Result<Vec<u8>>> {
        (**self).send_timestamp_request(message)
    }
}

/// Lets the COSE builder drive any [`Signer`].
pub(crate) struct RawSignerWrapper<'a>(pub &'a dyn Signer);

impl RawSigner for RawSignerWrapper<'_> {
    fn sign(&self, data: &[u8]) -> std::result::Result<Vec<u8>, RawSignerError> {
        self.0
            .sign(data)
            .map_err(|e| RawSignerError::InternalError(e.message().to_string()))
    }

    fn alg(&self) -> SigningAlg {
        self.0.alg()
    }

    fn cert_chain(&self) -> std::result::Result<Vec<Vec<u8>>, RawSignerError> {
        self.0
            .certs()
            .map_err(|e| RawSignerError::InvalidSigningCredentials(e.message().to_string()))
    }

    fn reserve_size(&self) -> usize {
        self.0.reserve_size()
    }
}

impl TimeStampProvider for RawSignerWrapper<'_> {
    fn time_stamp_service_url(&self) -> Option<String> {
        self.0.time_authority_url()
    }

    fn send_time_stamp_request(
        &self,
        message: &[u8],
    ) -> Option<std::result::Result<Vec<u8>, TimeStampError>> {
        self.0.send_timestamp_request(message).map(|r| {
            r.map_err(|e| TimeStampError::ServiceError(e.message().to_string()))
        })
    }
}

/// A [`Signer`] holding a certificate chain and private key in memory.
pub struct LocalSigner {
    raw: Box<dyn RawSigner + Send + Sync>,
}

impl LocalSigner {
    /// Creates a signer from PEM encoded certificates and a PKCS#8 PEM
    /// private key.
    pub fn new(
        certs: &[u8],
        private_key: &[u8],
        alg: SigningAlg,
        tsa_url: Option<String>,
    ) -> Result<Self> {
        let raw = signer_from_cert_chain_and_private_key(certs, private_key, alg, tsa_url)?;
        Ok(Self { raw })
    }
}

impl Signer for LocalSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.raw.sign(data)?)
    }

    fn alg(&self) -> SigningAlg {
        self.raw.alg()
    }

    fn certs(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.raw.cert_chain()?)
    }

    fn reserve_size(&self) -> usize {
        self.raw.reserve_size()
    }

    fn time_authority_url(&self) -> Option<String> {
        self.raw.time_stamp_service_url()
    }

    fn send_timestamp_request(&self, message: &[u8]) -> Option<Result<Vec<u8>>> {
        self.raw
            .send_time_stamp_request(message)
            .map(|r| r.map_err(|e| Error::Signature(e.to_string())))
    }
}

/// An owned signing context that can be closed.
///
/// A handle wraps exactly one signer: either local key material or a
/// signing callback. After [`close`](Self::close) every operation fails.
pub struct SignerHandle {
    inner: Option<BoxedSigner>,
}

impl SignerHandle {
    /// Creates a handle that signs with a local certificate chain and key.
    pub fn from_local_key(
        alg: SigningAlg,
        certs: &[u8],
        private_key: &[u8],
        tsa_url: Option<String>,
    ) -> Result<Self> {
        let signer = LocalSigner::new(certs, private_key, alg, tsa_url)?;
        Ok(Self::from_signer(Box::new(signer)))
    }

    /// Creates a handle that delegates the raw signature to `callback`.
    pub fn from_callback<F>(
        alg: SigningAlg,
        certs: &[u8],
        tsa_url: Option<String>,
        callback: F,
    ) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        let mut signer = CallbackSigner::new(callback, alg, certs);
        if let Some(url) = tsa_url {
            signer = signer.set_tsa_url(url);
        }
        Self::from_signer(Box::new(signer))
    }

    pub fn from_signer(signer: BoxedSigner) -> Self {
        Self {
            inner: Some(signer),
        }
    }

    fn signer(&self) -> Result<&BoxedSigner> {
        self.inner.as_ref().ok_or_else(|| Error::closed("Signer"))
    }

    /// Returns the number of bytes to reserve for the signature.
    pub fn reserve_size(&self) -> Result<usize> {
        Ok(self.signer()?.reserve_size())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Releases the signer. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("signer closed");
        }
    }
}

impl Signer for SignerHandle {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.signer()?.sign(data)
    }

    fn alg(&self) -> SigningAlg {
        self.inner
            .as_ref()
            .map(|s| s.alg())
            .unwrap_or(SigningAlg::Es256)
    }

    fn certs(&self) -> Result<Vec<Vec<u8>>> {
        self.signer()?.certs()
    }

    fn reserve_size(&self) -> usize {
        self.inner.as_ref().map(|s| s.reserve_size()).unwrap_or(0)
    }

    fn time_authority_url(&self) -> Option<String> {
        self.inner.as_ref().and_then(|s| s.time_authority_url())
    }

    fn send_timestamp_request(&self, message: &[u8]) -> Option<Result<Vec<u8>>> {
        self.inner
            .as_ref()
            .and_then(|s| s.send_timestamp_request(message))
    }
}
