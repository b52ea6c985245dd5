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

use c2pa_engine_crypto::SigningAlg;
use serde::Serialize;

use crate::{
    assertion::AssertionBase,
    assertion::AssertionData,
    assertions::{self, labels},
    claim::Claim,
    claim_generator_info::ClaimGeneratorInfo,
    cose_validator::get_signing_info,
    error::Result,
    ingredient::Ingredient,
    jumbf::labels::to_assertion_uri,
    manifest_assertion::{ManifestAssertion, ManifestAssertionKind},
    resource_store::{ResourceRef, ResourceStore},
};

/// Summary of the certificate that signed a manifest.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct SignatureInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<SigningAlg>,
    /// Organization of the signing certificate subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_serial_number: Option<String>,
    /// Signing time from a time stamp, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// A Manifest as read from a manifest store.
///
/// Data hash assertions are internal and not listed. Ingredients and the
/// claim thumbnail have their own fields, and binary payloads are exposed
/// as [`ResourceRef`]s into [`Manifest::resources`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct Manifest {
    claim_generator: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    claim_generator_info: Option<Vec<ClaimGeneratorInfo>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    format: String,

    instance_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<ResourceRef>,

    #[serde(default)]
    ingredients: Vec<Ingredient>,

    assertions: Vec<ManifestAssertion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    signature_info: Option<SignatureInfo>,

    label: String,

    #[serde(skip)]
    resources: ResourceStore,
}

impl Manifest {
    pub fn claim_generator(&self) -> &str {
        &self.claim_generator
    }

    pub fn claim_generator_info(&self) -> Option<&[ClaimGeneratorInfo]> {
        self.claim_generator_info.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the MIME type of the asset this manifest was made for.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The manifest label, a `urn:uuid:` string.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn thumbnail_ref(&self) -> Option<&ResourceRef> {
        self.thumbnail.as_ref()
    }

    pub fn assertions(&self) -> &[ManifestAssertion] {
        &self.assertions
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn signature_info(&self) -> Option<&SignatureInfo> {
        self.signature_info.as_ref()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// Finds the first assertion with `label` and deserializes its data.
    pub fn find_assertion<T: serde::de::DeserializeOwned>(&self, label: &str) -> Result<T> {
        self.assertions
            .iter()
            .find(|a| a.label() == label)
            .ok_or_else(|| crate::Error::AssertionNotFound(label.to_string()))?
            .to_t()
    }

    /// Builds the reader view of a parsed claim.
    pub(crate) fn from_claim(claim: &Claim) -> Result<Self> {
        let mut manifest = Manifest {
            claim_generator: claim.claim_generator().to_string(),
            claim_generator_info: claim.claim_generator_info().map(|info| info.to_vec()),
            title: claim.title().map(str::to_string),
            format: claim.format().to_string(),
            instance_id: claim.instance_id().to_string(),
            label: claim.label().to_string(),
            ..Default::default()
        };

        if !claim.signature_val().is_empty() {
            manifest.signature_info = Some(get_signing_info(claim.signature_val()));
        }

        for ca in claim.claim_assertion_store() {
            let assertion = ca.assertion();
            let label = assertion.label();
            let uri = to_assertion_uri(claim.label(), &ca.label());

            if label == labels::DATA_HASH {
                continue;
            }

            if label == labels::INGREDIENT {
                let ingredient = assertions::Ingredient::from_assertion(assertion)?;
                manifest
                    .ingredients
                    .push(Ingredient::from_assertion(&ingredient));
                continue;
            }

            if let AssertionData::Binary { format, data } = assertion.decode_data() {
                let resource_ref = manifest.resources.add_with(&uri, format, data.clone())?;
                if label.starts_with(labels::CLAIM_THUMBNAIL) {
                    manifest.thumbnail = Some(resource_ref);
                } else {
                    manifest.assertions.push(
                        ManifestAssertion::from_labeled_assertion(label, &resource_ref)?
                            .set_instance(ca.instance())
                            .set_kind(ManifestAssertionKind::Binary),
                    );
                }
                continue;
            }

            if let Some(ma) = ManifestAssertion::from_assertion(assertion, ca.instance())? {
                manifest.assertions.push(ma);
            }
        }

        Ok(manifest)
    }
}

impl std::fmt::Display for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        f.write_str(&json)
    }
}
