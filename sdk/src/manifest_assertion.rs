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

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    assertion::{Assertion, AssertionData},
    error::{Error, Result},
};

/// How an assertion is stored in the C2PA content.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ManifestAssertionKind {
    #[default]
    Cbor,
    Json,
    /// The data is a [`ResourceRef`](crate::ResourceRef) to binary content.
    Binary,
}

/// A labeled container for an Assertion value in a Manifest
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestAssertion {
    /// An assertion label in reverse domain format
    label: String,
    /// The data of the assertion as Value
    data: Value,
    /// There can be more than one assertion for any label
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<usize>,
    /// The [ManifestAssertionKind] for this assertion (as stored in c2pa content)
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ManifestAssertionKind>,
}

impl ManifestAssertion {
    /// Create with label and value
    pub fn new(label: String, data: Value) -> Self {
        Self {
            label,
            data,
            instance: None,
            kind: None,
        }
    }

    /// Creates a ManifestAssertion from any serializable value.
    pub fn from_labeled_assertion<S: Into<String>, T: Serialize>(
        label: S,
        data: &T,
    ) -> Result<Self> {
        let label = label.into();
        let data =
            serde_json::to_value(data).map_err(|e| Error::Assertion(format!("{label}: {e}")))?;
        Ok(Self::new(label, data))
    }

    /// An assertion label in reverse domain format
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The label with the `__<instance>` suffix used in the assertion store.
    pub fn label_with_instance(&self) -> String {
        match self.instance {
            Some(i) if i > 0 => format!("{}__{}", self.label, i),
            _ => self.label.to_owned(),
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn instance(&self) -> usize {
        self.instance.unwrap_or_default()
    }

    /// The ManifestAssertionKind for this assertion.
    /// The default is ManifestAssertionKind::Cbor
    pub fn kind(&self) -> ManifestAssertionKind {
        self.kind.unwrap_or_default()
    }

    pub(crate) fn set_instance(mut self, instance: usize) -> Self {
        self.instance = if instance > 0 { Some(instance) } else { None };
        self
    }

    /// Overrides the default [ManifestAssertionKind].
    pub fn set_kind(mut self, kind: ManifestAssertionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Deserializes the assertion data into `T`.
    pub fn to_t<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| Error::Assertion(format!("{}: {e}", self.label)))
    }

    /// Builds the stored form of a JSON or CBOR assertion.
    ///
    /// Binary assertions carry only a resource reference, so the caller
    /// resolves them against its resources instead.
    pub(crate) fn to_assertion(&self) -> Result<Assertion> {
        match self.kind() {
            ManifestAssertionKind::Json => Ok(Assertion::from_data_json(
                &self.label,
                &serde_json::to_string(&self.data)?,
            )),
            ManifestAssertionKind::Cbor => {
                let mut cbor = Vec::new();
                ciborium::into_writer(&self.data, &mut cbor)?;
                Ok(Assertion::from_data_cbor(&self.label, &cbor))
            }
            ManifestAssertionKind::Binary => Err(Error::Assertion(format!(
                "{}: binary assertion data must reference a resource",
                self.label
            ))),
        }
    }

    /// Converts a stored JSON or CBOR assertion. Binary data yields `None`.
    pub(crate) fn from_assertion(assertion: &Assertion, instance: usize) -> Result<Option<Self>> {
        let kind = match assertion.decode_data() {
            AssertionData::Json(_) => ManifestAssertionKind::Json,
            AssertionData::Cbor(_) => ManifestAssertionKind::Cbor,
            AssertionData::Binary { .. } => return Ok(None),
        };
        let Some(data) = assertion.as_json_object()? else {
            return Ok(None);
        };

        let ma = Self::new(assertion.label(), data).set_instance(instance);
        Ok(Some(match kind {
            ManifestAssertionKind::Cbor => ma,
            kind => ma.set_kind(kind),
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Rating {
        value: u8,
        reviewer: String,
    }

    #[test]
    fn assertion_kinds() {
        let rating = Rating {
            value: 5,
            reviewer: "pat".to_string(),
        };
        let ma = ManifestAssertion::from_labeled_assertion("org.test.rating", &rating).unwrap();
        assert_eq!(ma.kind(), ManifestAssertionKind::Cbor);
        assert_eq!(ma.to_t::<Rating>().unwrap(), rating);

        let cbor = ma.to_assertion().unwrap();
        assert_eq!(cbor.mime_type(), "application/cbor");
        let back = ManifestAssertion::from_assertion(&cbor, 0).unwrap().unwrap();
        assert_eq!(back, ma);

        let ma = ma.set_kind(ManifestAssertionKind::Json);
        let json_assertion = ma.to_assertion().unwrap();
        assert_eq!(json_assertion.mime_type(), "application/json");
        let back = ManifestAssertion::from_assertion(&json_assertion, 2)
            .unwrap()
            .unwrap();
        assert_eq!(back.kind(), ManifestAssertionKind::Json);
        assert_eq!(back.label_with_instance(), "org.test.rating__2");
    }

    #[test]
    fn binary_needs_resource() {
        let ma = ManifestAssertion::new(
            "org.test.blob".to_string(),
            json!({"format": "image/png", "identifier": "blob.png"}),
        )
        .set_kind(ManifestAssertionKind::Binary);
        assert!(ma.to_assertion().is_err());

        let binary = Assertion::from_data_binary("org.test.blob", "image/png", &[1, 2]);
        assert!(ManifestAssertion::from_assertion(&binary, 0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn json_form() {
        let ma: ManifestAssertion = serde_json::from_value(json!({
            "label": "org.test.json",
            "data": {"a": 1},
            "kind": "Json"
        }))
        .unwrap();
        assert_eq!(ma.kind(), ManifestAssertionKind::Json);
        assert_eq!(ma.instance(), 0);
        assert_eq!(ma.data()["a"], 1);
    }
}
