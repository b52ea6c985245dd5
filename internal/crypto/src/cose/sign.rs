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

use std::cmp::Ordering;

use ciborium::value::Value;
use coset::{
    iana::{self, EnumI64},
    CoseSign1, CoseSign1Builder, Header, HeaderBuilder, Label, TaggedCborSerializable,
};

use crate::{
    cose::CoseError,
    raw_signature::{RawSigner, SigningAlg},
};

/// Given an arbitrary block of data and a [`RawSigner`] instance, generate a
/// COSE signature for that block of data.
///
/// Returns a byte vector that is a tagged `COSE_Sign1` data structure with a
/// detached payload. The signing algorithm and the certificate chain
/// (`x5chain`, RFC 9360) go in the protected header. A time stamp token, if
/// the signer supplies one, goes in the unprotected `sigTst` header.
///
/// When `box_size` is given, the result is padded to exactly that many
/// bytes, or [`CoseError::BoxSizeTooSmall`] is returned.
pub fn sign(
    signer: &dyn RawSigner,
    data: &[u8],
    box_size: Option<usize>,
) -> Result<Vec<u8>, CoseError> {
    let alg = signer.alg();

    let protected_header = build_protected_header(signer, alg)?;
    let unprotected_header = build_unprotected_header(signer, data)?;

    // We don't use the additional data header.
    let aad: &[u8; 0] = b"";

    let mut sign1 = CoseSign1Builder::new()
        .protected(protected_header)
        .unprotected(unprotected_header)
        .build();

    let tbs = coset::sig_structure_data(
        coset::SignatureContext::CoseSign1,
        sign1.protected.clone(),
        None,
        aad,
        data,
    );

    let signature = signer.sign(&tbs)?;
    sign1.signature = ecdsa_der_to_p1363(alg, signature);

    // The payload is provided elsewhere, so we don't repeat it in the
    // `COSE_Sign1` structure.
    sign1.payload = None;

    pad_cose_sig(&mut sign1, box_size)
}

fn build_protected_header(signer: &dyn RawSigner, alg: SigningAlg) -> Result<Header, CoseError> {
    let algorithm = match alg {
        SigningAlg::Ps256 => iana::Algorithm::PS256,
        SigningAlg::Ps384 => iana::Algorithm::PS384,
        SigningAlg::Ps512 => iana::Algorithm::PS512,
        SigningAlg::Es256 => iana::Algorithm::ES256,
        SigningAlg::Es384 => iana::Algorithm::ES384,
        SigningAlg::Es512 => iana::Algorithm::ES512,
        SigningAlg::Ed25519 => iana::Algorithm::EdDSA,
    };

    let certs = signer.cert_chain()?;
    if certs.is_empty() {
        return Err(CoseError::MissingSigningCertificateChain);
    }

    let x5chain = match certs.len() {
        1 => Value::Bytes(certs[0].clone()),
        _ => Value::Array(certs.into_iter().map(Value::Bytes).collect()),
    };

    Ok(HeaderBuilder::new()
        .algorithm(algorithm)
        .value(iana::HeaderParameter::X5Chain.to_i64(), x5chain)
        .build())
}

fn build_unprotected_header(signer: &dyn RawSigner, data: &[u8]) -> Result<Header, CoseError> {
    let mut unprotected_h = HeaderBuilder::new();

    if let Some(token) = signer.send_time_stamp_request(data) {
        let token = token?;
        let tst_container = Value::Map(vec![(
            Value::Text("tstTokens".to_string()),
            Value::Array(vec![Value::Map(vec![(
                Value::Text("val".to_string()),
                Value::Bytes(token),
            )])]),
        )]);
        unprotected_h = unprotected_h.text_value("sigTst".to_string(), tst_container);
    }

    Ok(unprotected_h.build())
}

// Signers backed by external libraries often return ECDSA signatures in DER
// form. COSE requires the fixed-width r || s encoding.
fn ecdsa_der_to_p1363(alg: SigningAlg, signature: Vec<u8>) -> Vec<u8> {
    let converted = match alg {
        SigningAlg::Es256 => p256::ecdsa::Signature::from_der(&signature)
            .ok()
            .map(|s| s.to_vec()),
        SigningAlg::Es384 => p384::ecdsa::Signature::from_der(&signature)
            .ok()
            .map(|s| s.to_vec()),
        SigningAlg::Es512 => p521::ecdsa::Signature::from_der(&signature)
            .ok()
            .map(|s| s.to_vec()),
        _ => None,
    };

    converted.unwrap_or(signature)
}

const PAD: &str = "pad";
const PAD2: &str = "pad2";

// Length of the CBOR header in front of a byte string of `len` bytes.
fn bstr_header_len(len: usize) -> usize {
    match len {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn with_pad(sign1: &CoseSign1, pad_len: usize) -> Result<Vec<u8>, CoseError> {
    let mut padded = sign1.clone();
    padded.unprotected.rest.push((
        Label::Text(PAD.to_string()),
        Value::Bytes(vec![0u8; pad_len]),
    ));
    padded
        .to_tagged_vec()
        .map_err(|e| CoseError::CborGenerationError(e.to_string()))
}

// Pad the CoseSign1 structure with zeroes to match the reserved box size. Some
// lengths cannot be hit with a single pad because the CBOR length prefix
// grows, so a second, empty pad is added when that happens.
fn pad_cose_sig(sign1: &mut CoseSign1, end_size: Option<usize>) -> Result<Vec<u8>, CoseError> {
    let cur_vec = sign1
        .clone()
        .to_tagged_vec()
        .map_err(|e| CoseError::CborGenerationError(e.to_string()))?;

    let Some(end_size) = end_size else {
        return Ok(cur_vec);
    };

    match cur_vec.len().cmp(&end_size) {
        Ordering::Equal => return Ok(cur_vec),
        Ordering::Greater => return Err(CoseError::BoxSizeTooSmall),
        Ordering::Less => (),
    }

    // An empty pad costs `base` bytes; each pad byte adds one more, plus any
    // growth of the byte string header.
    let base = with_pad(sign1, 0)?.len();
    if base <= end_size {
        for header_len in [1usize, 2, 3, 5, 9] {
            let Some(pad_len) = (end_size - base).checked_sub(header_len - 1) else {
                continue;
            };
            if bstr_header_len(pad_len) != header_len {
                continue;
            }
            let padded = with_pad(sign1, pad_len)?;
            if padded.len() == end_size {
                return Ok(padded);
            }
        }
    }

    let has_pad2 = sign1
        .unprotected
        .rest
        .iter()
        .any(|(label, _)| *label == Label::Text(PAD2.to_string()));
    if has_pad2 {
        return Err(CoseError::BoxSizeTooSmall);
    }

    sign1
        .unprotected
        .rest
        .push((Label::Text(PAD2.to_string()), Value::Bytes(vec![])));

    pad_cose_sig(sign1, Some(end_size))
}
