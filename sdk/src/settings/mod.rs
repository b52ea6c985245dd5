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

/// Settings for configuring the [`Builder`][crate::Builder].
pub mod builder;
/// Settings for configuring the [`Settings::signer`].
pub mod signer;

use std::{
    path::Path,
    sync::{LazyLock, RwLock},
};

use config::{Config, FileFormat};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    settings::{builder::BuilderSettings, signer::SignerSettings},
    BoxedSigner, Error, Result,
};

const VERSION: u32 = 1;

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

// trait used to validate user input to make sure user supplied configurations are valid
pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings to configure core features.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Core {
    /// Hash algorithm used for data hashes and hashed URIs.
    ///
    /// One of `sha256`, `sha384` or `sha512`. The default value is `sha256`.
    pub hash_alg: String,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            hash_alg: "sha256".to_string(),
        }
    }
}

impl SettingsValidate for Core {
    fn validate(&self) -> Result<()> {
        match self.hash_alg.as_str() {
            "sha256" | "sha384" | "sha512" => Ok(()),
            alg => Err(Error::Other(format!("unsupported hash algorithm: {alg}"))),
        }
    }
}

/// Settings to configure the verification process.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Verify {
    /// Whether to verify the manifest after reading in the [`Reader`].
    ///
    /// The default value is true.
    ///
    /// [`Reader`]: crate::Reader
    pub verify_after_reading: bool,
    /// Whether to verify the manifest after signing in the [`Builder`].
    ///
    /// The default value is false.
    ///
    /// [`Builder`]: crate::Builder
    pub verify_after_sign: bool,
}

impl Default for Verify {
    fn default() -> Self {
        Self {
            verify_after_reading: true,
            verify_after_sign: false,
        }
    }
}

impl SettingsValidate for Verify {}

/// Settings for configuring the engine.
///
/// A process-wide copy is kept by [`load_settings`]. A [`Context`] may carry
/// its own copy instead.
///
/// [`Context`]: crate::Context
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Version of the configuration.
    pub version: u32,
    /// Settings for configuring core features.
    pub core: Core,
    /// Settings for configuring verification.
    pub verify: Verify,
    /// Settings for configuring the [`Builder`].
    ///
    /// [`Builder`]: crate::Builder
    pub builder: BuilderSettings,
    /// Settings for configuring a signer, accessible via [`Settings::signer`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerSettings>,
}

fn file_format(format: &str) -> Result<FileFormat> {
    match format.to_lowercase().as_str() {
        "json" => Ok(FileFormat::Json),
        "toml" => Ok(FileFormat::Toml),
        _ => Err(Error::NotSupported(format!(
            "settings format {format} is not supported"
        ))),
    }
}

impl Settings {
    /// Creates a new Settings instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from a JSON or TOML string, overlaid on the default
    /// values. Keys that are not present keep their defaults.
    ///
    /// This does not change the process-wide settings.
    pub fn from_string(settings_str: &str, format: &str) -> Result<Self> {
        let mut settings = Settings::default();
        settings.update_from_str(settings_str, format)?;
        Ok(settings)
    }

    /// Update this `Settings` instance from a string representation.
    /// This overlays the provided configuration on top of the current values.
    ///
    /// # Example
    /// ```
    /// use c2pa_engine::settings::Settings;
    ///
    /// let mut settings = Settings::default();
    /// settings
    ///     .update_from_str(
    ///         r#"
    ///     [verify]
    ///     verify_after_sign = true
    /// "#,
    ///         "toml",
    ///     )
    ///     .unwrap();
    ///
    /// assert!(settings.verify.verify_after_sign);
    /// ```
    pub fn update_from_str(&mut self, settings_str: &str, format: &str) -> Result<()> {
        let file_format = file_format(format)?;

        let current_config = Config::try_from(&*self)
            .map_err(|e| Error::Other(format!("could not convert settings: {e}")))?;

        // merge overrides, allows for partial changes
        let merged_config = Config::builder()
            .add_source(current_config)
            .add_source(config::File::from_str(settings_str, file_format))
            .build()
            .map_err(|e| Error::Other(format!("could not merge configuration: {e}")))?;

        let updated_settings = merged_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::Other(e.to_string()))?;

        updated_settings.validate()?;

        *self = updated_settings;
        Ok(())
    }

    /// Load settings from JSON, overlaid on this instance.
    pub fn with_json(mut self, json: &str) -> Result<Self> {
        self.update_from_str(json, "json")?;
        Ok(self)
    }

    /// Load settings from TOML, overlaid on this instance.
    pub fn with_toml(mut self, toml: &str) -> Result<Self> {
        self.update_from_str(toml, "toml")?;
        Ok(self)
    }

    /// Serializes these settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Serializes these settings as pretty-printed TOML.
    pub fn to_pretty_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns a signer built from the [`Settings::signer`] field.
    ///
    /// Fails with [`Error::Signature`] when no signer is configured.
    pub fn signer(&self) -> Result<BoxedSigner> {
        match &self.signer {
            Some(signer_settings) => signer_settings.clone().c2pa_signer(),
            None => Err(Error::Signature("no signer configured in settings".into())),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: VERSION,
            core: Default::default(),
            verify: Default::default(),
            builder: Default::default(),
            signer: None,
        }
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        if self.version > VERSION {
            return Err(Error::Other("settings version too new".into()));
        }
        if let Some(signer) = &self.signer {
            signer.validate()?;
        }
        self.core.validate()?;
        self.verify.validate()?;
        self.builder.validate()
    }
}

/// Replaces the process-wide settings with `settings_str` (JSON or TOML)
/// overlaid on the defaults.
///
/// Later loads replace earlier ones. Nothing changes if the text fails to
/// parse or validate.
pub fn load_settings(settings_str: &str, format: &str) -> Result<()> {
    let settings = Settings::from_string(settings_str, format)?;
    set_settings(settings);
    Ok(())
}

/// Loads the process-wide settings from a `.json` or `.toml` file.
pub fn load_settings_from_file<P: AsRef<Path>>(settings_path: P) -> Result<()> {
    let path = settings_path.as_ref();
    let ext = path
        .extension()
        .ok_or_else(|| Error::NotSupported(format!("no settings format for {}", path.display())))?
        .to_string_lossy()
        .into_owned();

    let setting_buf = std::fs::read(path)?;
    load_settings(&String::from_utf8_lossy(&setting_buf), &ext)
}

/// Returns a snapshot of the process-wide settings.
pub fn get_settings() -> Settings {
    match SETTINGS.read() {
        Ok(settings) => settings.clone(),
        Err(poisoned) => {
            warn!("settings lock poisoned, using last value");
            poisoned.into_inner().clone()
        }
    }
}

/// Restores the process-wide settings to their default values.
pub fn reset_default_settings() {
    set_settings(Settings::default());
}

fn set_settings(settings: Settings) {
    match SETTINGS.write() {
        Ok(mut current) => *current = settings,
        Err(poisoned) => *poisoned.into_inner() = settings,
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use serial_test::serial;

    use super::*;
    use crate::SigningAlg;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.core.hash_alg, "sha256");
        assert!(settings.verify.verify_after_reading);
        assert!(!settings.verify.verify_after_sign);
        assert!(settings.builder.claim_generator_info.is_none());
        assert!(settings.signer.is_none());
    }

    #[test]
    fn test_partial_json() {
        let settings =
            Settings::from_string(r#"{"verify": {"verify_after_sign": true}}"#, "json").unwrap();
        assert!(settings.verify.verify_after_sign);
        // untouched keys keep their defaults
        assert!(settings.verify.verify_after_reading);
        assert_eq!(settings.core.hash_alg, "sha256");
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_string(
            r#"
            [core]
            hash_alg = "sha512"

            [builder.claim_generator_info]
            name = "my app"
            version = "2.1"
            "#,
            "toml",
        )
        .unwrap();
        assert_eq!(settings.core.hash_alg, "sha512");
        let info = settings.builder.claim_generator_info.unwrap();
        assert_eq!(info.name, "my app");
        assert_eq!(info.version.as_deref(), Some("2.1"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = Settings::from_string("[verify]\nverify_after_sign = true\n", "toml").unwrap();
        assert!(settings.verify.verify_after_sign);
        assert_eq!(settings.builder, BuilderSettings::default());
        assert_eq!(settings.core, Core::default());

        let settings = Settings::from_string("{}", "json").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_bad_values() {
        let err = Settings::from_string(r#"{"core": {"hash_alg": "md5"}}"#, "json").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Other);

        let err = Settings::from_string(r#"{"version": 99}"#, "json").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Other);

        let err = Settings::from_string("{", "json").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Other);

        let err = Settings::from_string("a = 1", "yaml").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotSupported);
    }

    #[test]
    fn test_update_keeps_previous_values() {
        let mut settings = Settings::default();
        settings
            .update_from_str(r#"{"verify": {"verify_after_reading": false}}"#, "json")
            .unwrap();
        settings
            .update_from_str("[verify]\nverify_after_sign = true\n", "toml")
            .unwrap();
        assert!(!settings.verify.verify_after_reading);
        assert!(settings.verify.verify_after_sign);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Settings::new()
            .with_json(r#"{"builder": {"claim_generator_info": {"name": "test"}}}"#)
            .unwrap();
        let toml = settings.to_pretty_toml().unwrap();
        let back = Settings::from_string(&toml, "toml").unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_signer_settings() {
        let json = serde_json::json!({
            "signer": {
                "local": {
                    "alg": "es256",
                    "sign_cert": include_str!("../../tests/fixtures/certs/es256.pub"),
                    "private_key": include_str!("../../tests/fixtures/certs/es256.pem"),
                }
            }
        })
        .to_string();
        let settings = Settings::from_string(&json, "json").unwrap();
        let signer = settings.signer().unwrap();
        assert_eq!(signer.alg(), SigningAlg::Es256);

        let err = Settings::default().signer().err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Signature);
    }

    #[test]
    #[serial]
    fn test_process_wide_settings() {
        reset_default_settings();
        load_settings(r#"{"core": {"hash_alg": "sha512"}}"#, "json").unwrap();
        assert_eq!(get_settings().core.hash_alg, "sha512");

        // a later load replaces the earlier one
        load_settings("[verify]\nverify_after_sign = true\n", "toml").unwrap();
        let settings = get_settings();
        assert_eq!(settings.core.hash_alg, "sha256");
        assert!(settings.verify.verify_after_sign);

        // a bad load leaves the current value alone
        assert!(load_settings("not json", "json").is_err());
        assert!(get_settings().verify.verify_after_sign);

        reset_default_settings();
        assert_eq!(get_settings(), Settings::default());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[core]\nhash_alg = \"sha384\"\n").unwrap();

        load_settings_from_file(&path).unwrap();
        assert_eq!(get_settings().core.hash_alg, "sha384");

        let missing = dir.path().join("none.json");
        assert_eq!(
            load_settings_from_file(&missing).unwrap_err().kind(),
            crate::ErrorKind::FileNotFound
        );

        reset_default_settings();
    }
}
