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

use crate::raw_signature::{SigningAlg, UnknownAlgorithmError};

#[test]
fn alg_from_str() {
    assert_eq!("es256".parse(), Ok(SigningAlg::Es256));
    assert_eq!("es384".parse(), Ok(SigningAlg::Es384));
    assert_eq!("es512".parse(), Ok(SigningAlg::Es512));
    assert_eq!("ps256".parse(), Ok(SigningAlg::Ps256));
    assert_eq!("ps384".parse(), Ok(SigningAlg::Ps384));
    assert_eq!("ps512".parse(), Ok(SigningAlg::Ps512));
    assert_eq!("ed25519".parse(), Ok(SigningAlg::Ed25519));

    assert_eq!("ES256".parse(), Ok(SigningAlg::Es256));
    assert_eq!("Ed25519".parse(), Ok(SigningAlg::Ed25519));

    let r: Result<SigningAlg, UnknownAlgorithmError> = "bogus".parse();
    assert_eq!(r, Err(UnknownAlgorithmError("bogus".to_string())));
}

#[test]
fn signing_alg_impl_display() {
    assert_eq!(format!("{}", SigningAlg::Es256), "es256");
    assert_eq!(format!("{}", SigningAlg::Es384), "es384");
    assert_eq!(format!("{}", SigningAlg::Es512), "es512");
    assert_eq!(format!("{}", SigningAlg::Ps256), "ps256");
    assert_eq!(format!("{}", SigningAlg::Ps384), "ps384");
    assert_eq!(format!("{}", SigningAlg::Ps512), "ps512");
    assert_eq!(format!("{}", SigningAlg::Ed25519), "ed25519");
}

#[test]
fn cose_alg_ids() {
    assert_eq!(SigningAlg::Es256.cose_alg_id(), -7);
    assert_eq!(SigningAlg::Ed25519.cose_alg_id(), -8);
    assert_eq!(SigningAlg::Ps512.cose_alg_id(), -39);

    for alg in SigningAlg::ALL {
        assert_eq!(SigningAlg::from_cose_alg_id(alg.cose_alg_id()), Some(alg));
    }

    assert_eq!(SigningAlg::from_cose_alg_id(-1), None);
}

#[test]
fn serde_uses_lowercase_names() {
    let json = serde_json::to_string(&SigningAlg::Ps384).unwrap();
    assert_eq!(json, "\"ps384\"");

    let alg: SigningAlg = serde_json::from_str("\"es512\"").unwrap();
    assert_eq!(alg, SigningAlg::Es512);
}

#[test]
fn unknown_algorithm_error_display() {
    let err = UnknownAlgorithmError("bogus".to_string());
    assert_eq!(err.to_string(), "UnknownAlgorithmError(bogus)");
}
