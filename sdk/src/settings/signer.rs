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

use serde::{Deserialize, Serialize};

use crate::{create_signer, settings::SettingsValidate, BoxedSigner, Error, Result, SigningAlg};

/// Settings for configuring a local [`Signer`].
///
/// A [`Signer`] can be obtained by calling [`Settings::signer()`].
///
/// [`Signer`]: crate::Signer
/// [`Settings::signer()`]: crate::settings::Settings::signer
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerSettings {
    /// A signer configured locally.
    Local {
        /// Algorithm to use for signing.
        alg: SigningAlg,
        /// Certificate chain used for signing (PEM format).
        sign_cert: String,
        /// Private key used for signing (PEM format).
        private_key: String,
        /// Time stamp authority URL for signing.
        #[serde(skip_serializing_if = "Option::is_none")]
        tsa_url: Option<String>,
    },
}

impl SignerSettings {
    /// Returns a signer using the provided signer settings.
    pub fn c2pa_signer(self) -> Result<BoxedSigner> {
        match self {
            SignerSettings::Local {
                alg,
                sign_cert,
                private_key,
                tsa_url,
            } => {
                create_signer::from_keys(sign_cert.as_bytes(), private_key.as_bytes(), alg, tsa_url)
            }
        }
    }
}

impl SettingsValidate for SignerSettings {
    fn validate(&self) -> Result<()> {
        match self {
            SignerSettings::Local {
                sign_cert,
                private_key,
                ..
            } => {
                if !sign_cert.contains("-----BEGIN") {
                    return Err(Error::Other(
                        "signer.local.sign_cert must be a PEM certificate chain".into(),
                    ));
                }
                if !private_key.contains("-----BEGIN") {
                    return Err(Error::Other(
                        "signer.local.private_key must be a PEM private key".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_local_signer_from_settings() {
        let settings = SignerSettings::Local {
            alg: SigningAlg::Ed25519,
            sign_cert: include_str!("../../tests/fixtures/certs/ed25519.pub").to_string(),
            private_key: include_str!("../../tests/fixtures/certs/ed25519.pem").to_string(),
            tsa_url: None,
        };
        assert!(settings.validate().is_ok());

        let signer = settings.c2pa_signer().unwrap();
        assert_eq!(signer.alg(), SigningAlg::Ed25519);
        assert!(signer.reserve_size() > 0);
    }

    #[test]
    fn test_non_pem_values_are_rejected() {
        let settings = SignerSettings::Local {
            alg: SigningAlg::Es256,
            sign_cert: "not a cert".to_string(),
            private_key: "not a key".to_string(),
            tsa_url: None,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let settings = SignerSettings::Local {
            alg: SigningAlg::Ps256,
            sign_cert: "cert".to_string(),
            private_key: "key".to_string(),
            tsa_url: Some("http://timestamp.example.com".to_string()),
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["local"]["alg"], "ps256");
        assert_eq!(value["local"]["tsa_url"], "http://timestamp.example.com");
    }
}
