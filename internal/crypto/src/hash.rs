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

//! Hash convenience functions.

use sha2::{Digest, Sha256, Sha384, Sha512};

/// Given a byte slice, return the SHA-256 hash of that content.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::default();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Given a byte slice, return the SHA-384 hash of that content.
pub fn sha384(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha384::default();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Given a byte slice, return the SHA-512 hash of that content.
pub fn sha512(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::default();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Hash `data` with the algorithm named by `alg` (`"sha256"`, `"sha384"`, or
/// `"sha512"`).
///
/// Returns `None` if the algorithm name is not recognized.
pub fn hash_by_alg_name(alg: &str, data: &[u8]) -> Option<Vec<u8>> {
    match alg {
        "sha256" => Some(sha256(data)),
        "sha384" => Some(sha384(data)),
        "sha512" => Some(sha512(data)),
        _ => None,
    }
}
