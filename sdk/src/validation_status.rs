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
//! Implements validation status for specific parts of a manifest.
//!
//! See <https://c2pa.org/specifications/specifications/1.0/specs/C2PA_Specification.html#_existing_manifests>.

#![deny(missing_docs)]

use serde::{Deserialize, Serialize};

/// The claim signature referenced in the ingredient's claim validated.
pub const CLAIM_SIGNATURE_VALIDATED: &str = "claimSignature.validated";

/// The claim signature referenced in the ingredient's claim failed to
/// validate.
pub const CLAIM_SIGNATURE_MISMATCH: &str = "claimSignature.mismatch";

/// The hash of the referenced assertion in the manifest does not match the
/// corresponding hash in the assertion's hashed URI in the claim.
pub const ASSERTION_HASHEDURI_MISMATCH: &str = "assertion.hashedURI.mismatch";

/// An assertion listed in the claim is missing from the manifest.
pub const ASSERTION_MISSING: &str = "assertion.missing";

/// The hash of a byte range of the asset does not match the hash declared in
/// the data hash assertion.
pub const ASSERTION_DATAHASH_MISMATCH: &str = "assertion.dataHash.mismatch";

/// The claim has no hard binding to the asset.
pub const CLAIM_HARD_BINDINGS_MISSING: &str = "claim.hardBindings.missing";

/// Returns `true` if the status code is a known C2PA success status code.
///
/// Returns `false` if the status code is a known C2PA failure status code
/// or is unknown.
pub fn is_success(code: &str) -> bool {
    matches!(code, CLAIM_SIGNATURE_VALIDATED)
}

/// A `ValidationStatus` struct describes the validation status of a
/// specific part of a manifest.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ValidationStatus {
    code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl ValidationStatus {
    pub(crate) fn new<S: Into<String>>(code: S) -> Self {
        Self {
            code: code.into(),
            url: None,
            explanation: None,
        }
    }

    /// Returns the validation status code.
    ///
    /// These are defined as constants in the
    /// [`validation_status`](crate::validation_status) mod.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the internal JUMBF reference to the entity that was validated.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns a human-readable description of the validation that was performed.
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Sets the internal JUMBF reference to the entity was validated.
    pub(crate) fn set_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the human-readable description of the validation that was performed.
    pub(crate) fn set_explanation<S: Into<String>>(mut self, explanation: S) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Returns `true` if this has a successful validation code.
    pub fn passed(&self) -> bool {
        is_success(&self.code)
    }
}

/// Overall outcome of validating a manifest store.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum ValidationState {
    /// No failure codes were recorded.
    Valid,
    /// At least one failure code was recorded.
    Invalid,
}

impl ValidationState {
    /// Derives the state from a list of statuses.
    pub(crate) fn from_statuses(statuses: &[ValidationStatus]) -> Self {
        if statuses.iter().all(|s| s.passed()) {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}
