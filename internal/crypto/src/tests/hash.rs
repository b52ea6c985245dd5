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

use crate::hash::{hash_by_alg_name, sha256, sha384, sha512};

#[test]
fn digest_lengths() {
    assert_eq!(sha256(b"abc").len(), 32);
    assert_eq!(sha384(b"abc").len(), 48);
    assert_eq!(sha512(b"abc").len(), 64);
}

#[test]
fn sha256_known_value() {
    assert_eq!(
        hex::encode(sha256(b"abc")),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn by_alg_name() {
    assert_eq!(hash_by_alg_name("sha256", b"abc"), Some(sha256(b"abc")));
    assert_eq!(hash_by_alg_name("sha384", b"abc"), Some(sha384(b"abc")));
    assert_eq!(hash_by_alg_name("sha512", b"abc"), Some(sha512(b"abc")));
    assert_eq!(hash_by_alg_name("md5", b"abc"), None);
}
