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

use std::sync::OnceLock;

use crate::{settings::Settings, BoxedSigner, Error, Result, Signer};

/// A trait for types that can be converted into [`Settings`].
pub trait IntoSettings {
    /// Convert this type into Settings.
    fn into_settings(self) -> Result<Settings>;
}

/// Implement for Settings (passthrough)
impl IntoSettings for Settings {
    fn into_settings(self) -> Result<Settings> {
        Ok(self)
    }
}

/// Implement for &str (a JSON object or a TOML document)
impl IntoSettings for &str {
    fn into_settings(self) -> Result<Settings> {
        // a JSON document is always an object, anything else is TOML
        let format = if self.trim_start().starts_with('{') {
            "json"
        } else {
            "toml"
        };
        Settings::from_string(self, format)
    }
}

/// Implement for String
impl IntoSettings for String {
    fn into_settings(self) -> Result<Settings> {
        self.as_str().into_settings()
    }
}

/// Implement for serde_json::Value
impl IntoSettings for serde_json::Value {
    fn into_settings(self) -> Result<Settings> {
        let json_str = serde_json::to_string(&self)?;
        let mut settings = Settings::default();
        settings.update_from_str(&json_str, "json")?;
        Ok(settings)
    }
}

/// Settings and shared services for a [`Reader`] or [`Builder`].
///
/// A default context takes a snapshot of the process-wide settings when it
/// is created.
///
/// [`Reader`]: crate::Reader
/// [`Builder`]: crate::Builder
pub struct Context {
    settings: Settings,
    signer: OnceLock<BoxedSigner>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            settings: crate::settings::get_settings(),
            signer: OnceLock::new(),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// use the provided settings in this context
    pub fn with_settings<S: IntoSettings>(mut self, settings: S) -> Result<Self> {
        self.settings = settings.into_settings()?;
        Ok(self)
    }

    /// Returns a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a mutable reference to the settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Use the provided signer in this context.
    pub fn with_signer(self, signer: BoxedSigner) -> Self {
        let _ = self.signer.set(signer);
        self
    }

    /// Returns the signer for this context, building it from the signer
    /// settings the first time.
    pub fn signer(&self) -> Result<&dyn Signer> {
        if self.signer.get().is_none() {
            let signer = self.settings.signer()?;
            let _ = self.signer.set(signer);
        }
        match self.signer.get() {
            Some(signer) => Ok(signer.as_ref()),
            None => Err(Error::Signature("no signer available".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::SigningAlg;

    #[test]
    fn test_with_json_and_toml_strings() {
        let context = Context::new()
            .with_settings(r#"{"verify": {"verify_after_reading": false}}"#)
            .unwrap();
        assert!(!context.settings().verify.verify_after_reading);

        let context = Context::new()
            .with_settings("[verify]\nverify_after_sign = true\n".to_string())
            .unwrap();
        assert!(context.settings().verify.verify_after_sign);

        assert!(Context::new().with_settings("= nonsense =").is_err());
    }

    #[test]
    fn test_with_value() {
        let value = serde_json::json!({"core": {"hash_alg": "sha384"}});
        let context = Context::new().with_settings(value).unwrap();
        assert_eq!(context.settings().core.hash_alg, "sha384");
    }

    #[test]
    fn test_settings_mut() {
        let mut context = Context::new().with_settings(Settings::default()).unwrap();
        context.settings_mut().verify.verify_after_sign = true;
        assert!(context.settings().verify.verify_after_sign);
    }

    #[test]
    fn test_signer_from_settings() {
        let context = Context::new().with_settings(Settings::default()).unwrap();
        assert!(context.signer().is_err());

        let json = serde_json::json!({
            "signer": {
                "local": {
                    "alg": "es384",
                    "sign_cert": include_str!("../tests/fixtures/certs/es384.pub"),
                    "private_key": include_str!("../tests/fixtures/certs/es384.pem"),
                }
            }
        });
        let context = Context::new().with_settings(json).unwrap();
        assert_eq!(context.signer().unwrap().alg(), SigningAlg::Es384);
        // the second call reuses the same signer
        assert_eq!(context.signer().unwrap().alg(), SigningAlg::Es384);
    }
}
