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
    signer_from_cert_chain_and_private_key, validator_for_signing_alg,
    RawSignatureValidationError, SigningAlg,
};

const SAMPLE_DATA: &[u8] = b"some sample content to sign";

fn sign(alg: SigningAlg, cert_chain: &[u8], private_key: &[u8]) -> Vec<u8> {
    signer_from_cert_chain_and_private_key(cert_chain, private_key, alg, None)
        .unwrap()
        .sign(SAMPLE_DATA)
        .unwrap()
}

#[test]
fn es256_bad_signature() {
    let mut signature = sign(
        SigningAlg::Es256,
        include_bytes!("../fixtures/raw_signature/es256.pub"),
        include_bytes!("../fixtures/raw_signature/es256.priv"),
    );
    signature[10] ^= 0xff;

    let pub_key = include_bytes!("../fixtures/raw_signature/es256.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Es256);

    assert_eq!(
        validator
            .validate(&signature, SAMPLE_DATA, pub_key)
            .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn es384_bad_data() {
    let signature = sign(
        SigningAlg::Es384,
        include_bytes!("../fixtures/raw_signature/es384.pub"),
        include_bytes!("../fixtures/raw_signature/es384.priv"),
    );

    let mut data = SAMPLE_DATA.to_vec();
    data[10] = 0;

    let pub_key = include_bytes!("../fixtures/raw_signature/es384.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Es384);

    assert_eq!(
        validator.validate(&signature, &data, pub_key).unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn es512_wrong_key() {
    let signature = sign(
        SigningAlg::Es512,
        include_bytes!("../fixtures/raw_signature/es512.pub"),
        include_bytes!("../fixtures/raw_signature/es512.priv"),
    );

    let pub_key = include_bytes!("../fixtures/raw_signature/es256.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Es512);

    assert!(validator
        .validate(&signature, SAMPLE_DATA, pub_key)
        .is_err());
}

#[test]
fn ed25519_bad_data() {
    let signature = sign(
        SigningAlg::Ed25519,
        include_bytes!("../fixtures/raw_signature/ed25519.pub"),
        include_bytes!("../fixtures/raw_signature/ed25519.priv"),
    );

    let mut data = SAMPLE_DATA.to_vec();
    data[5] = 0;

    let pub_key = include_bytes!("../fixtures/raw_signature/ed25519.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Ed25519);

    assert_eq!(
        validator.validate(&signature, &data, pub_key).unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn ed25519_truncated_signature() {
    let signature = sign(
        SigningAlg::Ed25519,
        include_bytes!("../fixtures/raw_signature/ed25519.pub"),
        include_bytes!("../fixtures/raw_signature/ed25519.priv"),
    );

    let pub_key = include_bytes!("../fixtures/raw_signature/ed25519.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Ed25519);

    assert_eq!(
        validator
            .validate(&signature[..40], SAMPLE_DATA, pub_key)
            .unwrap_err(),
        RawSignatureValidationError::InvalidSignature
    );
}

#[test]
fn ps256_bad_signature() {
    let mut signature = sign(
        SigningAlg::Ps256,
        include_bytes!("../fixtures/raw_signature/ps256.pub"),
        include_bytes!("../fixtures/raw_signature/ps256.priv"),
    );
    signature[20] ^= 0xff;

    let pub_key = include_bytes!("../fixtures/raw_signature/ps256.pub_key");
    let validator = validator_for_signing_alg(SigningAlg::Ps256);

    assert_eq!(
        validator
            .validate(&signature, SAMPLE_DATA, pub_key)
            .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn invalid_public_key() {
    let signature = sign(
        SigningAlg::Ps384,
        include_bytes!("../fixtures/raw_signature/ps384.pub"),
        include_bytes!("../fixtures/raw_signature/ps384.priv"),
    );

    let validator = validator_for_signing_alg(SigningAlg::Ps384);

    assert_eq!(
        validator
            .validate(&signature, SAMPLE_DATA, b"not a key")
            .unwrap_err(),
        RawSignatureValidationError::InvalidPublicKey
    );
}
