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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! This library reads, builds and signs C2PA manifests for JPEG and PNG
//! images and for standalone `.c2pa` manifest stores.
//!
//! # Example: Adding a manifest to an asset and reading it back
//!
//! ```
//! use std::io::{Cursor, Seek};
//!
//! use c2pa_engine::{create_signer, Builder, Reader, Result, SigningAlg};
//! use serde_json::json;
//!
//! # fn main() -> Result<()> {
//! let mut builder = Builder::from_json(r#"{"title": "A.jpg"}"#)?;
//! builder.add_assertion("org.example.note", &json!({"text": "hello"}))?;
//!
//! let signer = create_signer::from_files(
//!     "tests/fixtures/certs/ed25519.pub",
//!     "tests/fixtures/certs/ed25519.pem",
//!     SigningAlg::Ed25519,
//!     None,
//! )?;
//!
//! let mut source = std::fs::File::open("tests/fixtures/A.jpg")?;
//! let mut dest = Cursor::new(Vec::new());
//! builder.sign(&signer, "image/jpeg", &mut source, &mut dest)?;
//!
//! dest.rewind()?;
//! let reader = Reader::from_stream("image/jpeg", dest)?;
//! assert_eq!(reader.active_manifest().and_then(|m| m.title()), Some("A.jpg"));
//! # Ok(())
//! # }
//! ```

use std::{fs::File, path::Path};

pub mod assertions;

mod builder;
pub use builder::Builder;

mod callback_signer;
pub use callback_signer::{ed25519_sign, CallbackFunc, CallbackSigner};

mod claim_generator_info;
pub use claim_generator_info::ClaimGeneratorInfo;

mod context;
pub use context::{Context, IntoSettings};

pub mod create_signer;

mod error;
pub use error::{Error, ErrorKind, Result};

mod ingredient;
pub use ingredient::Ingredient;

pub mod jumbf_io;

mod manifest;
pub use manifest::{Manifest, SignatureInfo};

mod manifest_assertion;
pub use manifest_assertion::{ManifestAssertion, ManifestAssertionKind};

mod manifest_definition;
pub use manifest_definition::ManifestDefinition;

mod reader;
pub use reader::Reader;

mod resource_store;
pub use resource_store::{ResourceRef, ResourceStore};

pub mod settings;
pub use settings::{load_settings, Settings};

mod signer;
pub use signer::{BoxedSigner, LocalSigner, Signer, SignerHandle};

mod signer_info;
pub use signer_info::SignerInfo;

mod stream;
pub use stream::{CallbackStream, IoStream, SeekMode, StreamCallbacks};

pub mod validation_status;
pub use validation_status::{ValidationState, ValidationStatus};

pub use asset_io::{CAIRead, CAIReadWrite};
pub use c2pa_engine_crypto::SigningAlg;
pub use utils::hash_utils::HashRange;

/// crate private declarations
pub(crate) mod assertion;
pub(crate) mod asset_handlers;
pub(crate) mod asset_io;
pub(crate) mod claim;
pub(crate) mod cose_sign;
pub(crate) mod cose_validator;
pub(crate) mod hashed_uri;
pub(crate) mod jumbf;
pub(crate) mod store;
pub(crate) mod utils;

/// The internal name of this engine
pub const NAME: &str = "c2pa-engine";
/// The version of this engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the engine name and version as `c2pa-engine/<version>`.
pub fn version() -> String {
    format!("{NAME}/{VERSION}")
}

/// Converts manifest store bytes to the form embedded in assets of `format`.
///
/// Sidecar formats get the bytes back unchanged.
pub fn format_embeddable(format: &str, manifest_bytes: &[u8]) -> Result<Vec<u8>> {
    jumbf_io::compose_manifest(format, manifest_bytes)
}

/// Returns the manifest store JSON of the asset at `path`.
///
/// With a `data_dir` the JSON and every resource are also written there.
pub fn read_file<P: AsRef<Path>>(path: P, data_dir: Option<&Path>) -> Result<String> {
    let reader = Reader::from_file(path)?;
    if let Some(dir) = data_dir {
        reader.to_folder(dir)?;
    }
    Ok(reader.json())
}

/// Returns the ingredient JSON for the asset at `path`.
///
/// With a `data_dir` the ingredient's manifest store, when it has one, is
/// written there as `manifest_data.c2pa`.
pub fn read_ingredient_file<P: AsRef<Path>>(path: P, data_dir: Option<&Path>) -> Result<String> {
    let path = path.as_ref();
    let format = jumbf_io::format_from_path(path)
        .ok_or_else(|| Error::NotSupported(format!("file type of {}", path.display())))?;

    let mut ingredient = Ingredient::from_stream(&format, &mut File::open(path)?)?;
    if ingredient.title() == Ingredient::default().title() {
        if let Some(name) = path.file_name() {
            ingredient.set_title(name.to_string_lossy());
        }
    }

    if let (Some(dir), Some(data)) = (data_dir, ingredient.manifest_data()) {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("manifest_data.c2pa"), data)?;
    }
    Ok(serde_json::to_string_pretty(&ingredient)?)
}

/// Signs `source` into `dest` with the manifest described by
/// `manifest_json` and returns the JSON of the signed manifest store.
///
/// Thumbnails and binary assertions name resources that are read from
/// `data_dir`.
pub fn sign_file<S, D>(
    source: S,
    dest: D,
    manifest_json: &str,
    signer_info: &SignerInfo,
    data_dir: Option<&Path>,
) -> Result<String>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let mut builder = Builder::from_json(manifest_json)?;
    if let Some(dir) = data_dir {
        let mut ids: Vec<String> = builder
            .definition
            .assertions
            .iter()
            .filter(|a| a.kind() == ManifestAssertionKind::Binary)
            .map(|a| a.to_t::<ResourceRef>().map(|r| r.identifier))
            .collect::<Result<_>>()?;
        if let Some(thumbnail) = &builder.definition.thumbnail {
            ids.push(thumbnail.identifier.clone());
        }
        ids.dedup();
        for id in ids {
            builder.add_resource(&id, File::open(dir.join(&id))?)?;
        }
    }

    let signer = signer_info.signer()?;
    builder.sign_file(signer.as_ref(), source, &dest)?;
    read_file(dest, None)
}
