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

//! Signers for every [`SigningAlg`], built on the RustCrypto and dalek
//! crates. All of them load a PKCS#8 PEM private key the same way.

use ed25519_dalek::SigningKey as Ed25519Key;
use rsa::{
    pkcs8::DecodePrivateKey,
    pss::SigningKey as PssKey,
    sha2::{Sha256, Sha384, Sha512},
    signature::{RandomizedSigner, SignatureEncoding, Signer},
    RsaPrivateKey,
};

use crate::{
    raw_signature::{signer::cert_chain_from_pem, RawSigner, RawSignerError, SigningAlg},
    time_stamp::TimeStampProvider,
};

// Room for the COSE structure around the signature itself.
const COSE_OVERHEAD: usize = 1024;

// Room for an RFC 3161 time stamp token.
const TIME_STAMP_SIZE: usize = 10000;

enum PrivateKey {
    Ed25519(Ed25519Key),
    Es256(p256::ecdsa::SigningKey),
    Es384(p384::ecdsa::SigningKey),
    Es512(p521::ecdsa::SigningKey),
    Ps256(PssKey<Sha256>),
    Ps384(PssKey<Sha384>),
    Ps512(PssKey<Sha512>),
}

fn pkcs8_key<K: DecodePrivateKey>(pem: &str, alg: SigningAlg) -> Result<K, RawSignerError> {
    K::from_pkcs8_pem(pem).map_err(|e| {
        RawSignerError::InvalidSigningCredentials(format!("invalid {alg} private key: {e}"))
    })
}

impl PrivateKey {
    fn from_pkcs8_pem(pem: &[u8], alg: SigningAlg) -> Result<Self, RawSignerError> {
        let pem = std::str::from_utf8(pem).map_err(|e| {
            RawSignerError::InvalidSigningCredentials(format!("private key is not PEM: {e}"))
        })?;

        Ok(match alg {
            SigningAlg::Ed25519 => Self::Ed25519(pkcs8_key(pem, alg)?),
            SigningAlg::Es256 => Self::Es256(pkcs8_key(pem, alg)?),
            SigningAlg::Es384 => Self::Es384(pkcs8_key(pem, alg)?),
            SigningAlg::Es512 => {
                // the P-521 signing key has no PKCS#8 decoder of its own
                let secret: p521::SecretKey = pkcs8_key(pem, alg)?;
                let key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(|e| {
                    RawSignerError::InvalidSigningCredentials(format!(
                        "invalid {alg} private key: {e}"
                    ))
                })?;
                Self::Es512(key)
            }
            SigningAlg::Ps256 => Self::Ps256(PssKey::new(pkcs8_key::<RsaPrivateKey>(pem, alg)?)),
            SigningAlg::Ps384 => Self::Ps384(PssKey::new(pkcs8_key::<RsaPrivateKey>(pem, alg)?)),
            SigningAlg::Ps512 => Self::Ps512(PssKey::new(pkcs8_key::<RsaPrivateKey>(pem, alg)?)),
        })
    }

    fn alg(&self) -> SigningAlg {
        match self {
            Self::Ed25519(_) => SigningAlg::Ed25519,
            Self::Es256(_) => SigningAlg::Es256,
            Self::Es384(_) => SigningAlg::Es384,
            Self::Es512(_) => SigningAlg::Es512,
            Self::Ps256(_) => SigningAlg::Ps256,
            Self::Ps384(_) => SigningAlg::Ps384,
            Self::Ps512(_) => SigningAlg::Ps512,
        }
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, RawSignerError> {
        let mut rng = rand::thread_rng();

        Ok(match self {
            Self::Ed25519(key) => key
                .try_sign(data)
                .map_err(|e| RawSignerError::InternalError(format!("signature error: {e}")))?
                .to_bytes()
                .to_vec(),
            Self::Es256(key) => Signer::<p256::ecdsa::Signature>::sign(key, data).to_vec(),
            Self::Es384(key) => Signer::<p384::ecdsa::Signature>::sign(key, data).to_vec(),
            Self::Es512(key) => Signer::<p521::ecdsa::Signature>::sign(key, data).to_vec(),
            Self::Ps256(key) => key.sign_with_rng(&mut rng, data).to_bytes().to_vec(),
            Self::Ps384(key) => key.sign_with_rng(&mut rng, data).to_bytes().to_vec(),
            Self::Ps512(key) => key.sign_with_rng(&mut rng, data).to_bytes().to_vec(),
        })
    }
}

/// A [`RawSigner`] holding a private key and the PEM certificate chain that
/// goes with it.
pub(crate) struct NativeSigner {
    key: PrivateKey,
    cert_chain: Vec<Vec<u8>>,
    time_stamp_service_url: Option<String>,
}

impl NativeSigner {
    pub(crate) fn from_cert_chain_and_private_key(
        cert_chain: &[u8],
        private_key: &[u8],
        alg: SigningAlg,
        time_stamp_service_url: Option<String>,
    ) -> Result<Self, RawSignerError> {
        Ok(Self {
            cert_chain: cert_chain_from_pem(cert_chain)?,
            key: PrivateKey::from_pkcs8_pem(private_key, alg)?,
            time_stamp_service_url,
        })
    }
}

impl RawSigner for NativeSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, RawSignerError> {
        self.key.sign(data)
    }

    fn alg(&self) -> SigningAlg {
        self.key.alg()
    }

    fn cert_chain(&self) -> Result<Vec<Vec<u8>>, RawSignerError> {
        Ok(self.cert_chain.clone())
    }

    fn reserve_size(&self) -> usize {
        let chain_len: usize = self.cert_chain.iter().map(Vec::len).sum();
        COSE_OVERHEAD + chain_len + TIME_STAMP_SIZE
    }
}

impl TimeStampProvider for NativeSigner {
    fn time_stamp_service_url(&self) -> Option<String> {
        self.time_stamp_service_url.clone()
    }
}
