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

use serde::Deserialize;

use crate::{create_signer, BoxedSigner, Error, Result, SigningAlg};

/// SignerInfo provides the information needed to create a signer
/// and sign a manifest.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignerInfo {
    /// The alg field is used to determine the signing algorithm.
    pub alg: String,
    /// The public certificate used to sign the manifest in PEM format.
    pub sign_cert: Vec<u8>,
    /// The private key used to sign the manifest in PEM format.
    pub private_key: Vec<u8>,
    /// The ta_url field is an optional URL used to specify a timestamp server.
    pub ta_url: Option<String>,
}

impl SignerInfo {
    /// Create a SignerInfo from a JSON formatted SignerInfo string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // Returns the signing algorithm converted from string format
    fn alg(&self) -> Result<SigningAlg> {
        self.alg
            .to_lowercase()
            .parse()
            .map_err(|_| Error::Other("Invalid signing algorithm".to_string()))
    }

    /// Create a signer from the SignerInfo
    pub fn signer(&self) -> Result<BoxedSigner> {
        create_signer::from_keys(
            &self.sign_cert,
            &self.private_key,
            self.alg()?,
            self.ta_url.clone(),
        )
    }
}
