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

#![deny(missing_docs)]

//! The `create_signer` module provides a way to obtain a [`Signer`](crate::Signer)
//! instance for each signing format supported by this crate.

use std::path::Path;

use crate::{error::Result, signer::LocalSigner, BoxedSigner, SigningAlg};

/// Creates a [`Signer`](crate::Signer) instance using signing certificate and private key
/// as byte slices.
///
/// The signing certificate chain and private key are both PEM encoded; the
/// key must be PKCS#8. Which signature algorithm to use is chosen by the
/// `alg` argument.
pub fn from_keys(
    signcert: &[u8],
    pkey: &[u8],
    alg: SigningAlg,
    tsa_url: Option<String>,
) -> Result<BoxedSigner> {
    Ok(Box::new(LocalSigner::new(signcert, pkey, alg, tsa_url)?))
}

/// Creates a [`Signer`](crate::Signer) instance using signing certificate and
/// private key files.
pub fn from_files<P: AsRef<Path>>(
    signcert_path: P,
    pkey_path: P,
    alg: SigningAlg,
    tsa_url: Option<String>,
) -> Result<BoxedSigner> {
    let signcert = std::fs::read(signcert_path)?;
    let pkey = std::fs::read(pkey_path)?;

    from_keys(&signcert, &pkey, alg, tsa_url)
}
