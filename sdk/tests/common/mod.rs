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

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use c2pa_engine::{create_signer, BoxedSigner, Builder, Result, SigningAlg};

#[allow(unused_macros)]
macro_rules! assert_err {
    ($expression:expr, $($pattern:tt)+) => {
        match $expression {
            $($pattern)+ => (),
            ref e => panic!("expected `{}` but got `{:?}`", stringify!($($pattern)+), e),
        }
    }
}
#[allow(unused_imports)]
pub(super) use assert_err;

pub const DEFINITION: &str = r#"{
    "claim_generator_info": [{"name": "integration_test", "version": "1.0"}],
    "title": "Test Title",
    "assertions": [
        {"label": "org.test.rating", "data": {"value": 4}},
        {"label": "org.test.note", "kind": "Json", "data": {"text": "from a test"}}
    ]
}"#;

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Returns the extension of `name` as the format and its bytes as a stream.
#[allow(dead_code)]
pub fn fixture_stream(name: &str) -> Result<(String, Cursor<Vec<u8>>)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = fixture_path(name);
    let format = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok((format, Cursor::new(std::fs::read(path)?)))
}

#[allow(dead_code, clippy::unwrap_used)]
pub fn test_signer(alg: SigningAlg) -> BoxedSigner {
    let certs = fixture_path(&format!("certs/{alg}.pub"));
    let key = fixture_path(&format!("certs/{alg}.pem"));
    create_signer::from_files(certs, key, alg, None).unwrap()
}

/// Signs the fixture `name` with `definition` and returns the signed bytes.
#[allow(dead_code)]
pub fn signed_fixture(name: &str, definition: &str) -> Result<(String, Vec<u8>)> {
    let (format, mut source) = fixture_stream(name)?;
    let mut dest = Cursor::new(Vec::new());
    let signer = test_signer(SigningAlg::Es256);
    Builder::from_json(definition)?.sign(signer.as_ref(), &format, &mut source, &mut dest)?;
    Ok((format, dest.into_inner()))
}
