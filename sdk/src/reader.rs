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

//! Reading and validating manifest stores.

use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Seek, Write},
    path::Path,
};

use log::{debug, warn};
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    asset_io::CAIRead,
    context::Context,
    error::{Error, Result},
    jumbf_io,
    manifest::Manifest,
    store::Store,
    utils::mime::format_to_extension,
    validation_status::{ValidationState, ValidationStatus},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ReaderState {
    #[default]
    Unopened,
    Open,
    Closed,
}

/// Use a Reader to read and validate a manifest store.
///
/// A reader is opened once, from an asset stream or from detached manifest
/// bytes plus the asset they describe. [`Reader::close`] releases the
/// parsed store; a closed reader answers every query as empty and fails
/// [`Reader::resource_to_stream`].
#[skip_serializing_none]
#[derive(Debug, Default, Serialize)]
pub struct Reader {
    /// A label for the active (most recent) manifest in the store
    active_manifest: Option<String>,

    manifests: HashMap<String, Manifest>,

    /// Validation failures found while opening
    validation_status: Option<Vec<ValidationStatus>>,

    /// Present when the store was validated
    validation_state: Option<ValidationState>,

    #[serde(skip)]
    remote_url: Option<String>,

    #[serde(skip)]
    embedded: bool,

    #[serde(skip)]
    verify: bool,

    #[serde(skip)]
    state: ReaderState,
}

impl Reader {
    /// Creates an unopened reader that uses the settings of `context`.
    ///
    /// Open it with [`Reader::with_stream`] or
    /// [`Reader::with_manifest_data_and_stream`].
    pub fn from_context(context: Context) -> Self {
        Self {
            verify: context.settings().verify.verify_after_reading,
            ..Default::default()
        }
    }

    /// Create a manifest store [`Reader`] from a stream.
    ///
    /// # Arguments
    /// * `format` - The format of the stream. MIME type or extension.
    /// * `stream` - The asset to read.
    ///
    /// # Errors
    /// Fails with [`Error::ManifestNotFound`] when the asset has no C2PA data,
    /// [`Error::RemoteManifest`] when it only references a remote store and
    /// [`Error::NotSupported`] for an unknown format. A reader that opens may
    /// still hold validation failures; check [`Reader::validation_state`].
    ///
    /// # Example
    /// ```no_run
    /// use std::fs::File;
    ///
    /// use c2pa_engine::Reader;
    ///
    /// let stream = File::open("tests/fixtures/C.jpg").unwrap();
    /// let reader = Reader::from_stream("image/jpeg", stream).unwrap();
    /// println!("{reader}");
    /// ```
    pub fn from_stream(format: &str, stream: impl Read + Seek + Send) -> Result<Reader> {
        Self::from_context(Context::new()).with_stream(format, stream)
    }

    /// Opens this reader on an asset stream.
    pub fn with_stream(mut self, format: &str, mut stream: impl Read + Seek + Send) -> Result<Self> {
        self.check_unopened()?;
        check_format(format)?;

        let store = Store::load_from_stream(format, &mut stream)?;
        self.remote_url = Store::get_remote_manifest_url(format, &mut stream);
        self.embedded = true;
        self.open(store, format, &mut stream)?;
        Ok(self)
    }

    /// Create a [`Reader`] from detached manifest store bytes and the asset
    /// they describe, for example a store fetched from a remote URL.
    pub fn from_manifest_data_and_stream(
        manifest_data: &[u8],
        format: &str,
        stream: impl Read + Seek + Send,
    ) -> Result<Reader> {
        Self::from_context(Context::new()).with_manifest_data_and_stream(
            manifest_data,
            format,
            stream,
        )
    }

    pub fn with_manifest_data_and_stream(
        mut self,
        manifest_data: &[u8],
        format: &str,
        mut stream: impl Read + Seek + Send,
    ) -> Result<Self> {
        self.check_unopened()?;
        check_format(format)?;

        let store = Store::from_jumbf(manifest_data)?;
        self.remote_url = Store::get_remote_manifest_url(format, &mut stream);
        self.embedded = false;
        self.open(store, format, &mut stream)?;
        Ok(self)
    }

    /// Create a [`Reader`] from a file, taking the format from its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Reader> {
        let path = path.as_ref();
        let format = jumbf_io::format_from_path(path)
            .ok_or_else(|| Error::NotSupported(format!("file type of {}", path.display())))?;
        let file = File::open(path)?;
        Self::from_stream(&format, file)
    }

    fn check_unopened(&self) -> Result<()> {
        match self.state {
            ReaderState::Unopened => Ok(()),
            ReaderState::Open => Err(Error::Other("Reader is already open".to_string())),
            ReaderState::Closed => Err(Error::closed("Reader")),
        }
    }

    fn open(&mut self, store: Store, format: &str, asset: &mut dyn CAIRead) -> Result<()> {
        if self.verify {
            // a sidecar store has no asset bytes to hash
            let asset = match format_to_extension(format) {
                Some("c2pa") => None,
                _ => Some(asset),
            };
            let statuses = store.verify(asset);
            self.validation_state = Some(ValidationState::from_statuses(&statuses));
            if !statuses.is_empty() {
                debug!("manifest store has {} validation failures", statuses.len());
                self.validation_status = Some(statuses);
            }
        }

        for claim in store.claims() {
            self.manifests
                .insert(claim.label().to_string(), Manifest::from_claim(claim)?);
        }
        self.active_manifest = store.provenance_label();
        self.state = ReaderState::Open;
        Ok(())
    }

    /// Returns the formats a reader can open, as MIME types and extensions.
    pub fn supported_mime_types() -> Vec<String> {
        jumbf_io::supported_mime_types()
    }

    /// Returns the manifest store as a JSON string, or an empty string when
    /// the reader is not open.
    pub fn json(&self) -> String {
        if self.state != ReaderState::Open {
            return String::new();
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                warn!("could not serialize manifest store: {e}");
                String::new()
            }
        }
    }

    /// Returns the validation failures, if validation found any.
    pub fn validation_status(&self) -> Option<&[ValidationStatus]> {
        self.validation_status.as_deref()
    }

    /// Returns [`ValidationState::Invalid`] when any failure was recorded.
    pub fn validation_state(&self) -> ValidationState {
        self.validation_state.unwrap_or(ValidationState::Valid)
    }

    pub fn active_manifest(&self) -> Option<&Manifest> {
        self.active_manifest
            .as_ref()
            .and_then(|label| self.manifests.get(label))
    }

    pub fn active_label(&self) -> Option<&str> {
        self.active_manifest.as_deref()
    }

    pub fn manifests(&self) -> &HashMap<String, Manifest> {
        &self.manifests
    }

    pub fn get_manifest(&self, label: &str) -> Option<&Manifest> {
        self.manifests.get(label)
    }

    /// The remote manifest URL found in the asset's XMP, if any.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// True when the store was read from the asset itself.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Writes a resource to `stream` and returns the number of bytes written.
    ///
    /// The resource is looked up in the active manifest first, then in the
    /// others.
    pub fn resource_to_stream(&self, uri: &str, mut stream: impl Write) -> Result<u64> {
        if self.state == ReaderState::Closed {
            return Err(Error::closed("Reader"));
        }

        let active = self.active_manifest().into_iter();
        let others = self
            .manifests
            .values()
            .filter(|m| Some(m.label()) != self.active_label());

        active
            .chain(others)
            .find(|m| m.resources().exists(uri))
            .ok_or_else(|| Error::ResourceNotFound(uri.to_string()))?
            .resources()
            .write_stream(uri, &mut stream)
    }

    /// Writes `manifest_store.json` and every resource into `path`.
    pub fn to_folder<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("manifest_store.json"), self.json())?;

        let resources = path.join("resources");
        for manifest in self.manifests.values() {
            for (id, data) in manifest.resources().resources() {
                std::fs::create_dir_all(&resources)?;
                std::fs::write(resources.join(id), data)?;
            }
        }
        Ok(())
    }

    /// Releases the parsed store. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.state == ReaderState::Closed {
            return;
        }
        self.manifests.clear();
        self.active_manifest = None;
        self.validation_status = None;
        self.validation_state = None;
        self.state = ReaderState::Closed;
        debug!("reader closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state == ReaderState::Closed
    }
}

fn check_format(format: &str) -> Result<()> {
    if jumbf_io::is_supported_format(format) {
        Ok(())
    } else {
        Err(Error::NotSupported(format!("format {format}")))
    }
}

impl std::fmt::Display for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.json())
    }
}
