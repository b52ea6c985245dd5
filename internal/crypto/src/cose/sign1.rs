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

use ciborium::value::Value;
use coset::{
    iana::{self, EnumI64},
    CoseSign1, Label, RegisteredLabelWithPrivate, TaggedCborSerializable,
};

use crate::{cose::CoseError, raw_signature::SigningAlg};

/// Parse a byte slice as a tagged `COSE_Sign1` structure.
pub fn parse_cose_sign1(cose_bytes: &[u8]) -> Result<CoseSign1, CoseError> {
    CoseSign1::from_tagged_slice(cose_bytes)
        .map_err(|e| CoseError::CborParsingError(e.to_string()))
}

/// Return the signing algorithm named in the protected header of a
/// `COSE_Sign1` structure.
pub fn signing_alg_from_sign1(sign1: &CoseSign1) -> Result<SigningAlg, CoseError> {
    let Some(ref alg) = sign1.protected.header.alg else {
        return Err(CoseError::UnsupportedSigningAlgorithm);
    };

    match alg {
        RegisteredLabelWithPrivate::Assigned(a) => SigningAlg::from_cose_alg_id(a.to_i64())
            .ok_or(CoseError::UnsupportedSigningAlgorithm),
        RegisteredLabelWithPrivate::PrivateUse(id) => {
            SigningAlg::from_cose_alg_id(*id).ok_or(CoseError::UnsupportedSigningAlgorithm)
        }
        RegisteredLabelWithPrivate::Text(_) => Err(CoseError::UnsupportedSigningAlgorithm),
    }
}

/// Return the DER-encoded certificate chain carried by a `COSE_Sign1`
/// structure, end-entity certificate first.
///
/// The protected header is checked first. A chain may appear in the
/// protected or the unprotected header, never both.
pub fn cert_chain_from_sign1(sign1: &CoseSign1) -> Result<Vec<Vec<u8>>, CoseError> {
    if let Some(value) = find_x5chain(&sign1.protected.header.rest) {
        if find_x5chain(&sign1.unprotected.rest).is_some() {
            return Err(CoseError::MultipleSigningCertificateChains);
        }
        return certs_from_value(value);
    }

    match find_x5chain(&sign1.unprotected.rest) {
        Some(value) => certs_from_value(value),
        None => Err(CoseError::MissingSigningCertificateChain),
    }
}

fn find_x5chain(headers: &[(Label, Value)]) -> Option<&Value> {
    headers.iter().find_map(|(label, value)| {
        if *label == Label::Int(iana::HeaderParameter::X5Chain.to_i64())
            || *label == Label::Text("x5chain".to_string())
        {
            Some(value)
        } else {
            None
        }
    })
}

fn certs_from_value(value: &Value) -> Result<Vec<Vec<u8>>, CoseError> {
    match value {
        Value::Bytes(der) => Ok(vec![der.clone()]),
        Value::Array(chain) => {
            let certs: Vec<Vec<u8>> = chain
                .iter()
                .filter_map(|c| match c {
                    Value::Bytes(der) => Some(der.clone()),
                    _ => None,
                })
                .collect();

            if certs.is_empty() {
                Err(CoseError::MissingSigningCertificateChain)
            } else {
                Ok(certs)
            }
        }
        _ => Err(CoseError::MissingSigningCertificateChain),
    }
}
