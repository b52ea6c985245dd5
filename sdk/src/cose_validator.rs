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
use c2pa_engine_crypto::cose::{
    cert_chain_from_sign1, parse_cose_sign1, signing_alg_from_sign1, verify,
};
use log::debug;
use x509_parser::{certificate::X509Certificate, prelude::FromDer};

use crate::{manifest::SignatureInfo, Result};

/// Verifies a `COSE_Sign1` signature over `data` and returns a summary of the
/// signing certificate.
///
/// Certificate chains are not evaluated against any trust list.
pub(crate) fn verify_cose(cose_bytes: &[u8], data: &[u8]) -> Result<SignatureInfo> {
    let info = verify(cose_bytes, data)?;

    Ok(SignatureInfo {
        alg: Some(info.alg),
        issuer: info.issuer_org,
        common_name: info.common_name,
        cert_serial_number: Some(info.cert_serial_number),
        time: None,
    })
}

/// Returns whatever can be learned from a signature without validating it.
///
/// Used to describe a signature that failed validation.
pub(crate) fn get_signing_info(cose_bytes: &[u8]) -> SignatureInfo {
    let Ok(sign1) = parse_cose_sign1(cose_bytes) else {
        debug!("signature is not a COSE_Sign1 structure");
        return SignatureInfo::default();
    };

    let alg = signing_alg_from_sign1(&sign1).ok();

    let certs = cert_chain_from_sign1(&sign1).unwrap_or_default();
    let cert = certs
        .first()
        .and_then(|der| X509Certificate::from_der(der).ok().map(|(_, cert)| cert));

    match cert {
        Some(cert) => {
            let subject = cert.subject();
            SignatureInfo {
                alg,
                issuer: subject
                    .iter_organization()
                    .find_map(|o| o.as_str().ok())
                    .map(|s| s.to_string()),
                common_name: subject
                    .iter_common_name()
                    .find_map(|cn| cn.as_str().ok())
                    .map(|s| s.to_string()),
                cert_serial_number: Some(cert.tbs_certificate.serial.to_string()),
                time: None,
            }
        }
        None => SignatureInfo {
            alg,
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{cose_sign::cose_sign, utils::test::test_signer, ErrorKind, Signer, SigningAlg};

    #[test]
    fn test_verify_cose() {
        let signer = test_signer(SigningAlg::Es384);
        let data = b"some claim bytes";
        let cose = cose_sign(&signer, data, signer.reserve_size()).unwrap();

        let info = verify_cose(&cose, data).unwrap();
        assert_eq!(info.alg, Some(SigningAlg::Es384));
        assert!(info.cert_serial_number.is_some());

        // the unverified summary agrees
        let unverified = get_signing_info(&cose);
        assert_eq!(unverified.alg, info.alg);
        assert_eq!(unverified.cert_serial_number, info.cert_serial_number);
        assert_eq!(unverified.issuer, info.issuer);
    }

    #[test]
    fn test_verify_cose_wrong_data() {
        let signer = test_signer(SigningAlg::Ed25519);
        let cose = cose_sign(&signer, b"original", signer.reserve_size()).unwrap();

        let err = verify_cose(&cose, b"tampered").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signature);
    }

    #[test]
    fn test_garbage_signature() {
        let err = verify_cose(b"garbage", b"data").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);

        let info = get_signing_info(b"garbage");
        assert!(info.alg.is_none());
        assert!(info.cert_serial_number.is_none());
    }
}
