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

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::{
    manifest_assertion::ManifestAssertion, resource_store::ResourceRef, ClaimGeneratorInfo, Error,
    Ingredient, Result,
};

/// A Manifest Definition
///
/// This is the JSON a [`Builder`](crate::Builder) is created from: the
/// claim properties plus the assertions and ingredients to sign.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ManifestDefinition {
    /// A user agent style claim generator string. Generated from
    /// `claim_generator_info` when absent.
    pub claim_generator: Option<String>,

    #[serde(default)]
    pub claim_generator_info: Vec<ClaimGeneratorInfo>,

    /// A human-readable title, generally source filename.
    pub title: Option<String>,

    /// The format of the source file as a MIME type. Taken from the signing
    /// format when empty.
    #[serde(default)]
    pub format: String,

    /// Instance ID from `xmpMM:InstanceID` in XMP metadata.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    pub thumbnail: Option<ResourceRef>,

    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub assertions: Vec<ManifestAssertion>,

    /// The manifest label to use instead of a generated `urn:uuid:`.
    pub label: Option<String>,
}

fn default_instance_id() -> String {
    format!("xmp:iid:{}", Uuid::new_v4())
}

impl ManifestDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Json(format!("manifest definition: {e}")))
    }
}
