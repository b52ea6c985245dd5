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

//! Box labels of a manifest store and the `self#jumbf=` URIs that address
//! boxes inside it.

/// Label for the C2PA manifest store.
pub const MANIFEST_STORE: &str = "c2pa";

/// Label for the C2PA assertion store box.
pub const ASSERTIONS: &str = "c2pa.assertions";

/// Label for the C2PA claim box.
pub const CLAIM: &str = "c2pa.claim";

/// Label for the C2PA claim signature box.
pub const SIGNATURE: &str = "c2pa.signature";

const JUMBF_PREFIX: &str = "self#jumbf";

/// `self#jumbf=/c2pa/<manifest>`
pub(crate) fn to_manifest_uri(manifest_label: &str) -> String {
    format!("{JUMBF_PREFIX}=/{MANIFEST_STORE}/{manifest_label}")
}

/// `self#jumbf=/c2pa/<manifest>/c2pa.assertions/<assertion>`
pub(crate) fn to_assertion_uri(manifest_label: &str, assertion_label: &str) -> String {
    let manifest_uri = to_manifest_uri(manifest_label);
    format!("{manifest_uri}/{ASSERTIONS}/{assertion_label}")
}

/// `self#jumbf=/c2pa/<manifest>/c2pa.signature`
pub(crate) fn to_signature_uri(manifest_label: &str) -> String {
    let manifest_uri = to_manifest_uri(manifest_label);
    format!("{manifest_uri}/{SIGNATURE}")
}

// Path segments of a URI, without the `self#jumbf=` prefix or a leading `/`.
fn segments(uri: &str) -> Vec<&str> {
    let path = uri.split_once('=').map_or(uri, |(_, path)| path);
    path.trim_start_matches('/').split('/').collect()
}

/// Drops the manifest store and manifest parts of an absolute URI, leaving a
/// URI relative to its manifest. Other URIs are returned unchanged.
pub(crate) fn to_relative_uri(uri: &str) -> String {
    match segments(uri).as_slice() {
        [MANIFEST_STORE, _manifest, rest @ ..] if rest.len() > 1 => {
            format!("{JUMBF_PREFIX}={}", rest.join("/"))
        }
        _ => uri.to_string(),
    }
}

/// The manifest label of an absolute URI.
pub(crate) fn manifest_label_from_uri(uri: &str) -> Option<String> {
    match segments(uri).as_slice() {
        [MANIFEST_STORE, manifest, ..] => Some(manifest.to_string()),
        _ => None,
    }
}

/// The assertion label of an absolute or manifest-relative assertion URI.
pub(crate) fn assertion_label_from_uri(uri: &str) -> Option<String> {
    match segments(uri).as_slice() {
        [MANIFEST_STORE, _, ASSERTIONS, assertion, ..] | [ASSERTIONS, assertion, ..] => {
            Some(assertion.to_string())
        }
        _ => None,
    }
}
