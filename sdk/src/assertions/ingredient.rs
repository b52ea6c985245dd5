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

use crate::{
    assertion::{Assertion, AssertionBase, AssertionCbor},
    assertions::labels,
    error::Result,
    hashed_uri::HashedUri,
};

/// The relationship of the ingredient to the current asset.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum Relationship {
    /// The current asset is derived from this ingredient.
    #[serde(rename = "parentOf")]
    ParentOf,
    /// The current asset is a part of this ingredient.
    #[serde(rename = "componentOf")]
    #[default]
    ComponentOf,
    /// The ingredient was used as an input to a computational process to create or modify the asset.
    #[serde(rename = "inputTo")]
    InputTo,
}

/// An ingredient assertion
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Ingredient {
    #[serde(rename = "dc:title")]
    pub title: String,

    #[serde(rename = "dc:format")]
    pub format: String,

    #[serde(rename = "documentID", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    #[serde(rename = "instanceID")]
    pub instance_id: String,

    pub relationship: Relationship,

    /// Hashed URI of the ingredient's active manifest in this store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c2pa_manifest: Option<HashedUri>,
}

impl Ingredient {
    pub const LABEL: &'static str = labels::INGREDIENT;

    pub fn new(title: &str, format: &str, instance_id: &str) -> Self {
        Self {
            title: title.to_owned(),
            format: format.to_owned(),
            instance_id: instance_id.to_owned(),
            ..Default::default()
        }
    }

    pub fn set_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = relationship;
        self
    }

    pub fn set_c2pa_manifest_from_hashed_uri(mut self, provenance: Option<HashedUri>) -> Self {
        self.c2pa_manifest = provenance;
        self
    }
}

impl AssertionCbor for Ingredient {}

impl AssertionBase for Ingredient {
    const LABEL: &'static str = Self::LABEL;

    fn to_assertion(&self) -> Result<Assertion> {
        Self::to_cbor_assertion(self)
    }

    fn from_assertion(assertion: &Assertion) -> Result<Self> {
        Self::from_cbor_assertion(assertion)
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_build_assertion() {
        let uri = HashedUri::new(
            "self#jumbf=/c2pa/urn:uuid:1".to_string(),
            Some("sha256".to_string()),
            &[1, 2, 3],
        );
        let ingredient = Ingredient::new("A.jpg", "image/jpeg", "xmp.iid:1234")
            .set_relationship(Relationship::ParentOf)
            .set_c2pa_manifest_from_hashed_uri(Some(uri));

        let assertion = ingredient.to_assertion().unwrap();
        assert_eq!(assertion.label(), "c2pa.ingredient");

        let json = assertion.as_json_object().unwrap().unwrap();
        assert_eq!(json["dc:title"], "A.jpg");
        assert_eq!(json["relationship"], "parentOf");
        assert_eq!(json["instanceID"], "xmp.iid:1234");

        assert_eq!(Ingredient::from_assertion(&assertion).unwrap(), ingredient);
    }
}
