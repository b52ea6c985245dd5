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

use crate::raw_signature::{
    signer_from_cert_chain_and_private_key, validator_for_signing_alg, RawSignerError, SigningAlg,
};

const SAMPLE_DATA: &[u8] = b"some sample content to sign";

fn sign_and_validate(alg: SigningAlg, cert_chain: &[u8], private_key: &[u8], pub_key: &[u8]) {
    let signer = signer_from_cert_chain_and_private_key(cert_chain, private_key, alg, None).unwrap();
    assert_eq!(signer.alg(), alg);

    let signature = signer.sign(SAMPLE_DATA).unwrap();
    assert!(signature.len() <= signer.reserve_size());

    let validator = validator_for_signing_alg(alg);
    validator.validate(&signature, SAMPLE_DATA, pub_key).unwrap();
}

#[test]
fn es256() {
    sign_and_validate(
        SigningAlg::Es256,
        include_bytes!("../fixtures/raw_signature/es256.pub"),
        include_bytes!("../fixtures/raw_signature/es256.priv"),
        include_bytes!("../fixtures/raw_signature/es256.pub_key"),
    );
}

#[test]
fn es384() {
    sign_and_validate(
        SigningAlg::Es384,
        include_bytes!("../fixtures/raw_signature/es384.pub"),
        include_bytes!("../fixtures/raw_signature/es384.priv"),
        include_bytes!("../fixtures/raw_signature/es384.pub_key"),
    );
}

#[test]
fn es512() {
    sign_and_validate(
        SigningAlg::Es512,
        include_bytes!("../fixtures/raw_signature/es512.pub"),
        include_bytes!("../fixtures/raw_signature/es512.priv"),
        include_bytes!("../fixtures/raw_signature/es512.pub_key"),
    );
}

#[test]
fn ed25519() {
    sign_and_validate(
        SigningAlg::Ed25519,
        include_bytes!("../fixtures/raw_signature/ed25519.pub"),
        include_bytes!("../fixtures/raw_signature/ed25519.priv"),
        include_bytes!("../fixtures/raw_signature/ed25519.pub_key"),
    );
}

#[test]
fn ed25519_signature_is_64_bytes() {
    let signer = signer_from_cert_chain_and_private_key(
        include_bytes!("../fixtures/raw_signature/ed25519.pub"),
        include_bytes!("../fixtures/raw_signature/ed25519.priv"),
        SigningAlg::Ed25519,
        None,
    )
    .unwrap();

    assert_eq!(signer.sign(SAMPLE_DATA).unwrap().len(), 64);
}

#[test]
fn ps256() {
    sign_and_validate(
        SigningAlg::Ps256,
        include_bytes!("../fixtures/raw_signature/ps256.pub"),
        include_bytes!("../fixtures/raw_signature/ps256.priv"),
        include_bytes!("../fixtures/raw_signature/ps256.pub_key"),
    );
}

#[test]
fn ps384() {
    sign_and_validate(
        SigningAlg::Ps384,
        include_bytes!("../fixtures/raw_signature/ps384.pub"),
        include_bytes!("../fixtures/raw_signature/ps384.priv"),
        include_bytes!("../fixtures/raw_signature/ps384.pub_key"),
    );
}

#[test]
fn ps512() {
    sign_and_validate(
        SigningAlg::Ps512,
        include_bytes!("../fixtures/raw_signature/ps512.pub"),
        include_bytes!("../fixtures/raw_signature/ps512.priv"),
        include_bytes!("../fixtures/raw_signature/ps512.pub_key"),
    );
}

#[test]
fn cert_chain_is_der() {
    let signer = signer_from_cert_chain_and_private_key(
        include_bytes!("../fixtures/raw_signature/es256.pub"),
        include_bytes!("../fixtures/raw_signature/es256.priv"),
        SigningAlg::Es256,
        None,
    )
    .unwrap();

    let certs = signer.cert_chain().unwrap();
    assert_eq!(certs.len(), 1);

    // DER SEQUENCE tag
    assert_eq!(certs[0][0], 0x30);
}

#[test]
fn reserve_size_accounts_for_cert_chain() {
    let signer = signer_from_cert_chain_and_private_key(
        include_bytes!("../fixtures/raw_signature/ps256.pub"),
        include_bytes!("../fixtures/raw_signature/ps256.priv"),
        SigningAlg::Ps256,
        None,
    )
    .unwrap();

    let chain_len: usize = signer.cert_chain().unwrap().iter().map(|c| c.len()).sum();
    assert_eq!(signer.reserve_size(), 1024 + chain_len + 10000);
}

#[test]
fn empty_cert_chain() {
    let err = signer_from_cert_chain_and_private_key(
        b"",
        include_bytes!("../fixtures/raw_signature/es256.priv"),
        SigningAlg::Es256,
        None,
    )
    .err()
    .unwrap();

    assert!(matches!(err, RawSignerError::InvalidSigningCredentials(_)));
}

#[test]
fn mismatched_key_type() {
    let err = signer_from_cert_chain_and_private_key(
        include_bytes!("../fixtures/raw_signature/ps256.pub"),
        include_bytes!("../fixtures/raw_signature/es256.priv"),
        SigningAlg::Ps256,
        None,
    )
    .err()
    .unwrap();

    assert!(matches!(err, RawSignerError::InvalidSigningCredentials(_)));
}

#[test]
fn time_stamp_url_is_kept() {
    let signer = signer_from_cert_chain_and_private_key(
        include_bytes!("../fixtures/raw_signature/ed25519.pub"),
        include_bytes!("../fixtures/raw_signature/ed25519.priv"),
        SigningAlg::Ed25519,
        Some("http://timestamp.example.com".to_string()),
    )
    .unwrap();

    assert_eq!(
        signer.time_stamp_service_url().as_deref(),
        Some("http://timestamp.example.com")
    );

    // No token is fetched without a provider override.
    assert!(signer.send_time_stamp_request(SAMPLE_DATA).is_none());
}
