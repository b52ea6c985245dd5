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

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// The core required trait for all assertions.
///
/// This defines the label for the assertion and supplies the to/from
/// converters for the stored assertion format.
pub trait AssertionBase
where
    Self: Sized,
{
    const LABEL: &'static str = "unknown";

    /// Returns a label for this assertion.
    fn label(&self) -> &str {
        Self::LABEL
    }

    /// Returns an Assertion upon success or Error otherwise.
    fn to_assertion(&self) -> Result<Assertion>;

    /// Returns Self or an Error from an assertion
    fn from_assertion(assertion: &Assertion) -> Result<Self>;
}

/// Trait to handle default Cbor encoding/decoding of Assertions
pub trait AssertionCbor: Serialize + DeserializeOwned + AssertionBase {
    fn to_cbor_assertion(&self) -> Result<Assertion> {
        let mut data = Vec::new();
        ciborium::into_writer(self, &mut data)
            .map_err(|e| Error::Assertion(format!("{}: {e}", self.label())))?;
        Ok(Assertion::new(self.label(), AssertionData::Cbor(data)))
    }

    fn from_cbor_assertion(assertion: &Assertion) -> Result<Self> {
        match assertion.decode_data() {
            AssertionData::Cbor(data) => ciborium::from_reader(data.as_slice())
                .map_err(|e| Error::Assertion(format!("{}: {e}", assertion.label()))),
            data => Err(Error::Assertion(format!(
                "{}: expected cbor data, found {}",
                assertion.label(),
                data.type_name()
            ))),
        }
    }
}

/// Assertion payload as stored in the manifest.
#[derive(PartialEq, Eq, Clone)]
pub enum AssertionData {
    /// JSON text.
    Json(String),
    /// CBOR encoded data.
    Cbor(Vec<u8>),
    /// Opaque bytes with a media type, stored as an embedded file.
    Binary { format: String, data: Vec<u8> },
}

impl AssertionData {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Cbor(_) => "cbor",
            Self::Binary { .. } => "binary",
        }
    }
}

impl fmt::Debug for AssertionData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Json(s) => write!(f, "{s:?}"),
            Self::Cbor(c) => write!(f, "<cbor {} bytes>", c.len()),
            Self::Binary { format, .. } => write!(f, "<{format} omitted>"),
        }
    }
}

/// A labelled assertion inside a claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    label: String,
    data: AssertionData,
}

impl Assertion {
    pub(crate) fn new(label: &str, data: AssertionData) -> Self {
        Self {
            label: label.to_owned(),
            data,
        }
    }

    pub(crate) fn from_data_json(label: &str, json: &str) -> Self {
        Self::new(label, AssertionData::Json(json.to_owned()))
    }

    pub(crate) fn from_data_cbor(label: &str, cbor: &[u8]) -> Self {
        Self::new(label, AssertionData::Cbor(cbor.to_vec()))
    }

    pub(crate) fn from_data_binary(label: &str, format: &str, data: &[u8]) -> Self {
        Self::new(
            label,
            AssertionData::Binary {
                format: format.to_owned(),
                data: data.to_vec(),
            },
        )
    }

    pub(crate) fn label(&self) -> String {
        self.label.clone()
    }

    pub(crate) fn decode_data(&self) -> &AssertionData {
        &self.data
    }

    /// return mimetype for the the data enclosed in the Assertion
    pub(crate) fn mime_type(&self) -> String {
        match &self.data {
            AssertionData::Json(_) => "application/json".to_owned(),
            AssertionData::Cbor(_) => "application/cbor".to_owned(),
            AssertionData::Binary { format, .. } => format.clone(),
        }
    }

    /// Return a reference to the data as a byte array
    pub(crate) fn data(&self) -> &[u8] {
        match &self.data {
            AssertionData::Json(x) => x.as_bytes(),
            AssertionData::Cbor(x) => x,
            AssertionData::Binary { data, .. } => data,
        }
    }

    /// Returns JSON and CBOR payloads as a JSON value.
    ///
    /// Binary payloads have no JSON form and yield `None`.
    pub(crate) fn as_json_object(&self) -> Result<Option<Value>> {
        match &self.data {
            AssertionData::Json(x) => Ok(Some(serde_json::from_str(x)?)),
            AssertionData::Cbor(x) => {
                let value: ciborium::Value = ciborium::from_reader(x.as_slice())?;
                Ok(Some(cbor_to_json(value)))
            }
            AssertionData::Binary { .. } => Ok(None),
        }
    }
}

// Lossy conversion used for display: byte strings become arrays of numbers
// and tags are dropped.
fn cbor_to_json(value: ciborium::Value) -> Value {
    use ciborium::Value as Cbor;
    match value {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(i) => {
            let i = i128::from(i);
            if let Ok(v) = i64::try_from(i) {
                Value::from(v)
            } else if let Ok(v) = u64::try_from(i) {
                Value::from(v)
            } else {
                Value::String(i.to_string())
            }
        }
        Cbor::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Cbor::Text(s) => Value::String(s),
        Cbor::Bytes(b) => Value::Array(b.into_iter().map(Value::from).collect()),
        Cbor::Array(a) => Value::Array(a.into_iter().map(cbor_to_json).collect()),
        Cbor::Map(m) => Value::Object(
            m.into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        Cbor::Text(s) => s,
                        other => cbor_to_json(other).to_string(),
                    };
                    (key, cbor_to_json(v))
                })
                .collect(),
        ),
        Cbor::Tag(_, inner) => cbor_to_json(*inner),
        _ => Value::Null,
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
    }

    impl AssertionCbor for Sample {}

    impl AssertionBase for Sample {
        const LABEL: &'static str = "org.test.sample";

        fn to_assertion(&self) -> Result<Assertion> {
            self.to_cbor_assertion()
        }

        fn from_assertion(assertion: &Assertion) -> Result<Self> {
            Self::from_cbor_assertion(assertion)
        }
    }

    #[test]
    fn test_cbor_assertion() {
        let sample = Sample {
            name: "thing".to_string(),
            bytes: vec![1, 2],
        };
        let assertion = sample.to_assertion().unwrap();
        assert_eq!(assertion.label(), "org.test.sample");
        assert_eq!(assertion.mime_type(), "application/cbor");
        assert_eq!(Sample::from_assertion(&assertion).unwrap(), sample);

        let json = assertion.as_json_object().unwrap().unwrap();
        assert_eq!(json["name"], "thing");
        assert_eq!(json["bytes"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_wrong_data_type() {
        let assertion = Assertion::from_data_json("org.test.sample", r#"{"name":"x"}"#);
        let err = Sample::from_assertion(&assertion).unwrap_err();
        assert!(matches!(err, Error::Assertion(_)));
        assert_eq!(
            assertion.as_json_object().unwrap().unwrap()["name"],
            "x"
        );
    }

    #[test]
    fn test_binary() {
        let assertion = Assertion::from_data_binary("org.test.bin", "image/png", &[9, 9]);
        assert_eq!(assertion.mime_type(), "image/png");
        assert_eq!(assertion.data(), &[9, 9]);
        assert!(assertion.as_json_object().unwrap().is_none());
    }
}
