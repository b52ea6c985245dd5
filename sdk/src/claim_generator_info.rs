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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of the claim generator, or the software used in generating the claim.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClaimGeneratorInfo {
    /// A human readable string naming the claim_generator
    pub name: String,
    /// A human readable string of the product's version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    // Any other values that are not part of the standard
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

impl ClaimGeneratorInfo {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            version: None,
            other: BTreeMap::new(),
        }
    }

    /// Sets the version of the generator.
    pub fn set_version<S: Into<String>>(&mut self, version: S) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a new key/value pair to the generator info.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> &Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.other.insert(key.into(), value.into());
        self
    }

    /// Gets additional values by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }

    /// Formats as the legacy `name/version` claim generator string.
    pub(crate) fn to_user_agent(&self) -> String {
        match &self.version {
            Some(v) => format!("{}/{}", self.name.replace(' ', "_"), v),
            None => self.name.replace(' ', "_"),
        }
    }
}

impl Default for ClaimGeneratorInfo {
    fn default() -> Self {
        let mut info = Self::new(crate::NAME);
        info.set_version(crate::VERSION);
        info
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut g = ClaimGeneratorInfo::new("test app");
        g.set_version("1.0").insert("org.test.build", 42);

        let json = serde_json::to_string_pretty(&g).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["org.test.build"], 42);

        let result: ClaimGeneratorInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(g, result);
        assert_eq!(result.get("org.test.build"), Some(&Value::from(42)));
        assert_eq!(g.to_user_agent(), "test_app/1.0");
    }

    #[test]
    fn test_default_names_this_crate() {
        let g = ClaimGeneratorInfo::default();
        assert_eq!(g.name, crate::NAME);
        assert_eq!(g.version.as_deref(), Some(crate::VERSION));
    }
}
