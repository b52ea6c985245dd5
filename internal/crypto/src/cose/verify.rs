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

use x509_parser::{certificate::X509Certificate, prelude::FromDer};

use crate::{
    cose::{cert_chain_from_sign1, parse_cose_sign1, signing_alg_from_sign1, CoseError},
    raw_signature::validator_for_signing_alg,
    SigningAlg,
};

/// Summary of a successfully verified COSE signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoseSignInfo {
    /// Algorithm used to produce the signature.
    pub alg: SigningAlg,

    /// Organization named in the signing certificate's subject, if any.
    pub issuer_org: Option<String>,

    /// Common name of the signing certificate's subject, if any.
    pub common_name: Option<String>,

    /// Serial number of the signing certificate, in decimal.
    pub cert_serial_number: String,
}

/// Verify a detached-payload `COSE_Sign1` signature over `data`.
///
/// The algorithm and the end-entity certificate are taken from the
/// signature's own headers. Certificate chains are not evaluated against any
/// trust list.
pub fn verify(cose_bytes: &[u8], data: &[u8]) -> Result<CoseSignInfo, CoseError> {
    let sign1 = parse_cose_sign1(cose_bytes)?;
    let alg = signing_alg_from_sign1(&sign1)?;

    let certs = cert_chain_from_sign1(&sign1)?;
    let Some(end_entity_der) = certs.first() else {
        return Err(CoseError::MissingSigningCertificateChain);
    };

    let (_, cert) = X509Certificate::from_der(end_entity_der)
        .map_err(|e| CoseError::InvalidCertificate(e.to_string()))?;

    let tbs = coset::sig_structure_data(
        coset::SignatureContext::CoseSign1,
        sign1.protected.clone(),
        None,
        b"",
        data,
    );

    validator_for_signing_alg(alg).validate(&sign1.signature, &tbs, cert.public_key().raw)?;

    let subject = cert.subject();
    let issuer_org = subject
        .iter_organization()
        .find_map(|o| o.as_str().ok())
        .map(|s| s.to_string());
    let common_name = subject
        .iter_common_name()
        .find_map(|cn| cn.as_str().ok())
        .map(|s| s.to_string());

    Ok(CoseSignInfo {
        alg,
        issuer_org,
        common_name,
        cert_serial_number: cert.tbs_certificate.serial.to_string(),
    })
}
