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

use crate::{settings::SettingsValidate, ClaimGeneratorInfo, Error, Result};

/// Description of the claim generator used when a manifest definition does
/// not name one.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ClaimGeneratorInfoSettings {
    /// A human readable string naming the claim_generator.
    pub name: String,
    /// A human readable string of the product's version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl From<ClaimGeneratorInfoSettings> for ClaimGeneratorInfo {
    fn from(value: ClaimGeneratorInfoSettings) -> Self {
        let mut info = ClaimGeneratorInfo::new(value.name);
        if let Some(version) = value.version {
            info.set_version(version);
        }
        info
    }
}

/// Settings for the [`Builder`][crate::Builder].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Claim generator info added to manifests whose definition has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_generator_info: Option<ClaimGeneratorInfoSettings>,
}

impl SettingsValidate for BuilderSettings {
    fn validate(&self) -> Result<()> {
        match &self.claim_generator_info {
            Some(info) if info.name.trim().is_empty() => Err(Error::Other(
                "builder.claim_generator_info.name must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }
}
