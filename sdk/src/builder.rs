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

//! Assembling and signing new manifests.

use std::{
    collections::{HashMap, HashSet},
    fs::OpenOptions,
    io::{Cursor, Read, Seek, Write},
    path::Path,
};

use log::{debug, error};
use serde::Serialize;
use zip::{write::SimpleFileOptions, ZipArchive, ZipWriter};

use crate::{
    assertion::Assertion,
    assertions::{labels, DataHash},
    asset_io::CAIRead,
    claim::Claim,
    claim_generator_info::ClaimGeneratorInfo,
    context::Context,
    error::{Error, Result},
    ingredient::Ingredient,
    jumbf_io,
    manifest_assertion::{ManifestAssertion, ManifestAssertionKind},
    manifest_definition::ManifestDefinition,
    resource_store::{ResourceRef, ResourceStore},
    settings::Settings,
    store::Store,
    utils::mime::{format_to_extension, format_to_mime},
    Signer,
};

/// Version of the archive layout written by [`Builder::to_archive`].
const ARCHIVE_VERSION: &str = "1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum BuilderState {
    #[default]
    Constructed,
    Archived,
    Signed,
    Closed,
}

// A store whose placeholder has been handed out, kept so the final manifest
// has the same label and size.
#[derive(Debug)]
struct PendingStore {
    store: Store,
    format: String,
    sig_box_size: usize,
}

/// Use a Builder to add a signed manifest to an asset.
///
/// # Example: Building and signing a manifest
///
/// ```no_run
/// use std::io::Cursor;
///
/// use c2pa_engine::{create_signer, Builder, SigningAlg};
/// use serde_json::json;
///
/// # fn main() -> c2pa_engine::Result<()> {
/// let mut builder = Builder::from_json(r#"{"title": "Test.jpg"}"#)?;
/// builder.add_assertion("org.example.rating", &json!({"value": 5}))?;
///
/// let signer = create_signer::from_files(
///     "tests/fixtures/certs/es256.pub",
///     "tests/fixtures/certs/es256.pem",
///     SigningAlg::Es256,
///     None,
/// )?;
/// let mut source = std::fs::File::open("tests/fixtures/A.jpg")?;
/// let mut dest = Cursor::new(Vec::new());
/// builder.sign(&signer, "image/jpeg", &mut source, &mut dest)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    /// The manifest definition being built.
    pub definition: ManifestDefinition,

    resources: ResourceStore,

    no_embed: bool,

    remote_url: Option<String>,

    settings: Settings,

    pending: Option<PendingStore>,

    state: BuilderState,
}

impl Builder {
    /// Creates an empty builder using the process-wide settings.
    pub fn new() -> Self {
        Self::from_context(Context::new())
    }

    /// Creates an empty builder using the settings of `context`.
    pub fn from_context(context: Context) -> Self {
        Self {
            settings: context.settings().clone(),
            ..Default::default()
        }
    }

    /// Creates a builder from a JSON [`ManifestDefinition`].
    ///
    /// # Errors
    /// [`Error::Json`] for malformed JSON and [`Error::Manifest`] for a
    /// definition that cannot be signed.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new().with_definition(json)
    }

    /// Replaces the definition with one parsed from JSON.
    pub fn with_definition(mut self, json: &str) -> Result<Self> {
        let definition = ManifestDefinition::from_json(json)?;
        if let Some(ma) = definition.assertions.iter().find(|a| a.label().is_empty()) {
            return Err(Error::Manifest(format!(
                "assertion without a label: {}",
                ma.data()
            )));
        }
        self.definition = definition;
        Ok(self)
    }

    fn check_mutable(&self) -> Result<()> {
        match self.state {
            BuilderState::Constructed | BuilderState::Archived => Ok(()),
            BuilderState::Signed => Err(Error::Other("Builder has already signed".to_string())),
            BuilderState::Closed => Err(Error::closed("Builder")),
        }
    }

    /// Signing will not write the manifest into the asset.
    pub fn set_no_embed(&mut self, no_embed: bool) -> Result<&mut Self> {
        self.check_mutable()?;
        self.no_embed = no_embed;
        Ok(self)
    }

    /// Signing will add a reference to `url` to the asset's XMP.
    pub fn set_remote_url<S: Into<String>>(&mut self, url: S) -> Result<&mut Self> {
        self.check_mutable()?;
        self.remote_url = Some(url.into());
        Ok(self)
    }

    pub fn no_embed(&self) -> bool {
        self.no_embed
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Adds an assertion stored as CBOR.
    pub fn add_assertion<S, T>(&mut self, label: S, data: &T) -> Result<&mut Self>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.check_mutable()?;
        let assertion = ManifestAssertion::from_labeled_assertion(label, data)?;
        self.definition.assertions.push(assertion);
        Ok(self)
    }

    /// Adds an assertion stored as JSON.
    pub fn add_assertion_json<S, T>(&mut self, label: S, data: &T) -> Result<&mut Self>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.check_mutable()?;
        let assertion = ManifestAssertion::from_labeled_assertion(label, data)?
            .set_kind(ManifestAssertionKind::Json);
        self.definition.assertions.push(assertion);
        Ok(self)
    }

    /// Registers binary data under `id` for assertions and thumbnails to
    /// reference.
    ///
    /// # Errors
    /// [`Error::Other`] when `id` is already registered.
    pub fn add_resource(&mut self, id: &str, mut stream: impl Read) -> Result<&mut Self> {
        self.check_mutable()?;
        if self.resources.exists(id) {
            return Err(Error::Other(format!("resource {id} already exists")));
        }
        self.resources.add_from_stream(id, &mut stream)?;
        Ok(self)
    }

    /// Sets the claim thumbnail.
    pub fn set_thumbnail(&mut self, format: &str, mut stream: impl Read) -> Result<&mut Self> {
        self.check_mutable()?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        let resource_ref = self.resources.add_with("thumbnail", format, data)?;
        self.definition.thumbnail = Some(resource_ref);
        Ok(self)
    }

    /// Adds an ingredient described by `ingredient_json` and read from
    /// `stream`.
    ///
    /// The ingredient's manifest store, when it has one, is carried into the
    /// signed store.
    pub fn add_ingredient_from_stream(
        &mut self,
        ingredient_json: &str,
        format: &str,
        mut stream: impl Read + Seek + Send,
    ) -> Result<&mut Ingredient> {
        self.check_mutable()?;
        let ingredient = Ingredient::from_json(ingredient_json)?.with_stream(format, &mut stream)?;
        debug!("adding ingredient {}", ingredient.title());
        self.definition.ingredients.push(ingredient);

        let index = self.definition.ingredients.len() - 1;
        Ok(&mut self.definition.ingredients[index])
    }

    /// Writes the pending definition, resources and ingredient manifest
    /// stores to a zip archive.
    ///
    /// The builder stays usable after archiving.
    pub fn to_archive(&mut self, stream: impl Write + Seek) -> Result<()> {
        self.check_mutable()?;

        let mut zip = ZipWriter::new(stream);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zip.start_file("version.txt", options)?;
        zip.write_all(ARCHIVE_VERSION.as_bytes())?;

        zip.start_file("manifest.json", options)?;
        zip.write_all(&serde_json::to_vec(&self.definition)?)?;

        for (id, data) in self.resources.resources() {
            zip.start_file(format!("resources/{id}"), options)?;
            zip.write_all(data)?;
        }

        // ingredients from the same parent share one entry
        let mut written = HashSet::new();
        for ingredient in &self.definition.ingredients {
            if let (Some(label), Some(data)) =
                (ingredient.active_manifest(), ingredient.manifest_data())
            {
                let name = archive_manifest_name(label);
                if written.insert(name.clone()) {
                    zip.start_file(format!("manifests/{name}"), options)?;
                    zip.write_all(data)?;
                }
            }
        }
        zip.finish()?;

        if self.state == BuilderState::Constructed {
            self.state = BuilderState::Archived;
        }
        Ok(())
    }

    /// Restores a builder written by [`Builder::to_archive`].
    pub fn from_archive(stream: impl Read + Seek) -> Result<Self> {
        Self::new().with_archive(stream)
    }

    /// Replaces the pending state of this builder with an archived one.
    pub fn with_archive(mut self, stream: impl Read + Seek) -> Result<Self> {
        self.check_mutable()?;
        let mut zip = ZipArchive::new(stream)?;

        let version = read_zip_entry(&mut zip, "version.txt")?;
        if version.trim_ascii() != ARCHIVE_VERSION.as_bytes() {
            return Err(Error::NotSupported(format!(
                "archive version {}",
                String::from_utf8_lossy(&version)
            )));
        }

        let definition = read_zip_entry(&mut zip, "manifest.json")?;
        self.definition = serde_json::from_slice(&definition)?;
        self.resources = ResourceStore::new();

        let mut manifests = HashMap::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            if let Some(id) = name.strip_prefix("resources/") {
                self.resources.add(id, data)?;
            } else if let Some(manifest_name) = name.strip_prefix("manifests/") {
                manifests.insert(manifest_name.to_string(), data);
            }
        }

        for ingredient in self.definition.ingredients.iter_mut() {
            let name = ingredient.active_manifest().map(archive_manifest_name);
            if let Some(data) = name.and_then(|n| manifests.get(&n)) {
                ingredient.set_manifest_data(data.clone())?;
            }
        }

        self.pending = None;
        self.state = BuilderState::Constructed;
        Ok(self)
    }

    fn claim_generator_info(&self) -> Vec<ClaimGeneratorInfo> {
        if !self.definition.claim_generator_info.is_empty() {
            return self.definition.claim_generator_info.clone();
        }
        match &self.settings.builder.claim_generator_info {
            Some(info) => vec![info.clone().into()],
            None => vec![ClaimGeneratorInfo::default()],
        }
    }

    fn resource_data(&self, resource_ref: &ResourceRef) -> Result<Vec<u8>> {
        Ok(self.resources.get(&resource_ref.identifier)?.into_owned())
    }

    // Builds the assertion for a definition entry, resolving binary data.
    fn stored_assertion(&self, ma: &ManifestAssertion) -> Result<Assertion> {
        match ma.kind() {
            ManifestAssertionKind::Binary => {
                let resource_ref: ResourceRef = ma.to_t()?;
                let data = self.resource_data(&resource_ref)?;
                Ok(Assertion::from_data_binary(
                    ma.label(),
                    &resource_ref.format,
                    &data,
                ))
            }
            _ => ma.to_assertion(),
        }
    }

    /// Converts the definition into a store holding the unsigned claim and
    /// the claims of every ingredient.
    fn to_store(&self, format: &str) -> Result<Store> {
        let definition = &self.definition;
        let claim_generator_info = self.claim_generator_info();

        let claim_generator = match &definition.claim_generator {
            Some(claim_generator) => claim_generator.clone(),
            None => {
                let mut agents: Vec<String> = claim_generator_info
                    .iter()
                    .map(|info| info.to_user_agent())
                    .collect();
                agents.push(crate::version());
                agents.join(" ")
            }
        };

        let claim_format = if definition.format.is_empty() {
            format_to_mime(format).unwrap_or(format).to_string()
        } else {
            definition.format.clone()
        };

        let title = definition.title.as_deref();
        let mut claim = match &definition.label {
            Some(label) => Claim::new_with_label(&claim_generator, &claim_format, title, label),
            None => Claim::new(&claim_generator, &claim_format, title),
        };
        claim.set_instance_id(definition.instance_id.clone());
        claim.set_alg(&self.settings.core.hash_alg);
        for info in claim_generator_info {
            claim.add_claim_generator_info(info);
        }

        if let Some(thumbnail) = &definition.thumbnail {
            let data = self.resource_data(thumbnail)?;
            claim.add_assertion_data(Assertion::from_data_binary(
                &labels::claim_thumbnail(&thumbnail.format),
                &thumbnail.format,
                &data,
            ))?;
        }

        for ma in &definition.assertions {
            claim.add_assertion_data(self.stored_assertion(ma)?)?;
        }

        let mut store = Store::new();
        for ingredient in &definition.ingredients {
            let c2pa_manifest = match ingredient.manifest_data() {
                Some(data) => {
                    let ingredient_store = Store::from_jumbf(data)?;
                    let hashed_uri = ingredient_store
                        .provenance_claim()
                        .map(Store::manifest_hashed_uri)
                        .transpose()?;
                    store.append_ingredient_store(ingredient_store);
                    hashed_uri
                }
                None => None,
            };
            claim.add_assertion(&ingredient.to_assertion(c2pa_manifest))?;
        }

        store.commit_claim(claim)?;
        Ok(store)
    }

    fn verify_signed(
        &self,
        format: &str,
        jumbf: &[u8],
        dest: &mut dyn CAIRead,
    ) -> Result<()> {
        let store = if self.no_embed {
            Store::from_jumbf(jumbf)?
        } else {
            Store::load_from_stream(format, dest)?
        };

        match store.verify(Some(dest)).first() {
            Some(status) => {
                error!("signed asset does not validate: {}", status.code());
                Err(Error::Verify(format!(
                    "{} {}",
                    status.code(),
                    status.explanation().unwrap_or_default()
                )))
            }
            None => Ok(()),
        }
    }

    /// Signs the manifest and writes the asset to `dest`.
    ///
    /// The manifest store bytes are always returned. With
    /// [`Builder::set_no_embed`] `dest` receives an unmodified copy of
    /// `source`, or one that only gains the XMP reference set with
    /// [`Builder::set_remote_url`].
    ///
    /// # Errors
    /// [`Error::NotSupported`] for formats that cannot be signed,
    /// [`Error::Signature`] when the signer fails and [`Error::Verify`] when
    /// `verify_after_sign` is set and the output does not validate.
    pub fn sign<R, W>(
        &mut self,
        signer: &dyn Signer,
        format: &str,
        source: &mut R,
        dest: &mut W,
    ) -> Result<Vec<u8>>
    where
        R: Read + Seek + Send,
        W: Write + Read + Seek + Send,
    {
        self.check_mutable()?;
        if !jumbf_io::is_supported_format(format) {
            return Err(Error::NotSupported(format!("format {format}")));
        }

        let mut store = self.to_store(format)?;
        let jumbf = store.save_to_stream(
            format,
            source,
            dest,
            signer,
            self.remote_url.as_deref(),
            self.no_embed,
        )?;

        if self.settings.verify.verify_after_sign {
            self.verify_signed(format, &jumbf, dest)?;
        }

        self.state = BuilderState::Signed;
        self.pending = None;
        Ok(jumbf)
    }

    /// Signs `source` into `dest`, taking the format from the source
    /// extension. `dest` may be the same path as `source`.
    pub fn sign_file<S, D>(&mut self, signer: &dyn Signer, source: S, dest: D) -> Result<Vec<u8>>
    where
        S: AsRef<Path>,
        D: AsRef<Path>,
    {
        let source = source.as_ref();
        let dest = dest.as_ref();
        let format = jumbf_io::format_from_path(source)
            .ok_or_else(|| Error::NotSupported(format!("file type of {}", source.display())))?;

        if self.definition.title.is_none() {
            self.definition.title = dest
                .file_name()
                .map(|name| name.to_string_lossy().to_string());
        }

        let mut input = Cursor::new(std::fs::read(source)?);
        if let Some(dir) = dest.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut output = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(dest)?;
        self.sign(signer, &format, &mut input, &mut output)
    }

    /// Returns a placeholder manifest of exactly `reserve_size` bytes in the
    /// embeddable form of `format`.
    ///
    /// Splice it into the asset, then finish with
    /// [`Builder::sign_data_hashed_embeddable`]; the final manifest has the
    /// same length.
    ///
    /// # Errors
    /// [`Error::Manifest`] when the manifest cannot fit in `reserve_size`.
    pub fn data_hashed_placeholder(&mut self, reserve_size: usize, format: &str) -> Result<Vec<u8>> {
        self.check_mutable()?;
        let mut store = self.to_store(format)?;
        let (placeholder, sig_box_size) =
            store.get_data_hashed_manifest_placeholder(reserve_size, format)?;

        self.pending = Some(PendingStore {
            store,
            format: format.to_string(),
            sig_box_size,
        });
        Ok(placeholder)
    }

    /// Signs a manifest bound to the asset by `data_hash` and returns it in
    /// the embeddable form of `format`.
    ///
    /// With a `source` the hash is recomputed over it, honouring the
    /// exclusions in `data_hash`; otherwise `data_hash.hash` is used as is.
    pub fn sign_data_hashed_embeddable(
        &mut self,
        signer: &dyn Signer,
        data_hash: &DataHash,
        format: &str,
        source: Option<&mut dyn CAIRead>,
    ) -> Result<Vec<u8>> {
        self.check_mutable()?;

        // the manifest must be signed for the format its placeholder was made for
        if let Some(pending) = &self.pending {
            if format_to_extension(&pending.format) != format_to_extension(format) {
                return Err(Error::NotSupported(format!(
                    "placeholder was reserved for {}, not {format}",
                    pending.format
                )));
            }
        }
        let (mut store, sig_box_size) = match self.pending.take() {
            Some(p) => (p.store, Some(p.sig_box_size)),
            None => (self.to_store(format)?, None),
        };

        let manifest = store.get_data_hashed_embeddable_manifest(
            data_hash,
            signer,
            format,
            source,
            sig_box_size,
        )?;
        self.state = BuilderState::Signed;
        Ok(manifest)
    }

    /// Converts manifest store bytes to the embeddable form of `format`.
    pub fn composed_manifest(manifest_bytes: &[u8], format: &str) -> Result<Vec<u8>> {
        jumbf_io::compose_manifest(format, manifest_bytes)
    }

    /// Releases the pending manifest and resources. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.state == BuilderState::Closed {
            return;
        }
        self.definition = ManifestDefinition::default();
        self.resources = ResourceStore::new();
        self.pending = None;
        self.state = BuilderState::Closed;
        debug!("builder closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state == BuilderState::Closed
    }
}

// Archive entry name for an ingredient manifest store.
fn archive_manifest_name(label: &str) -> String {
    format!("{}.c2pa", label.replace(':', "_"))
}

fn read_zip_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = zip
        .by_name(name)
        .map_err(|_| Error::Manifest(format!("archive has no {name}")))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use c2pa_engine_crypto::SigningAlg;
    use serde_json::json;

    use super::*;
    use crate::{
        assertions::Relationship,
        utils::test::{signed_test_asset, test_signer, TEST_JPEG, TEST_PNG},
        ErrorKind, HashRange, Reader, ValidationState,
    };

    const DEFINITION: &str = r#"{
        "claim_generator_info": [{"name": "builder_test", "version": "0.1"}],
        "title": "Test.jpg",
        "assertions": [
            {"label": "org.test.rating", "data": {"value": 5}},
            {"label": "org.test.json", "data": {"text": "hello"}, "kind": "Json"}
        ]
    }"#;

    fn sign_jpeg(builder: &mut Builder) -> (Vec<u8>, Vec<u8>) {
        let signer = test_signer(SigningAlg::Es256);
        let mut dest = Cursor::new(Vec::new());
        let manifest = builder
            .sign(&signer, "image/jpeg", &mut Cursor::new(TEST_JPEG), &mut dest)
            .unwrap();
        (dest.into_inner(), manifest)
    }

    #[test]
    fn sign_and_read() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder
            .add_assertion("org.test.added", &json!({"n": 1}))
            .unwrap();
        builder
            .set_thumbnail("image/png", Cursor::new(TEST_PNG))
            .unwrap();
        let (signed, _) = sign_jpeg(&mut builder);

        let reader = Reader::from_stream("jpg", Cursor::new(signed)).unwrap();
        assert_eq!(reader.validation_state(), ValidationState::Valid);

        let manifest = reader.active_manifest().unwrap();
        assert_eq!(manifest.title(), Some("Test.jpg"));
        assert_eq!(manifest.format(), "image/jpeg");
        assert!(manifest.claim_generator().starts_with("builder_test/0.1 c2pa-engine/"));
        assert_eq!(manifest.claim_generator_info().unwrap()[0].name, "builder_test");
        assert!(manifest.thumbnail_ref().is_some());

        let labels: Vec<&str> = manifest.assertions().iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["org.test.rating", "org.test.json", "org.test.added"]);
        assert_eq!(manifest.assertions()[1].kind(), ManifestAssertionKind::Json);
        assert_eq!(manifest.assertions()[0].data()["value"], 5);
    }

    #[test]
    fn claim_generator_kept() {
        let mut builder =
            Builder::from_json(r#"{"claim_generator": "my_app/2.0", "title": "t"}"#).unwrap();
        let (signed, _) = sign_jpeg(&mut builder);
        let reader = Reader::from_stream("jpg", Cursor::new(signed)).unwrap();
        assert_eq!(
            reader.active_manifest().unwrap().claim_generator(),
            "my_app/2.0"
        );
    }

    #[test]
    fn binary_assertion() {
        let mut builder = Builder::from_json(
            r#"{"assertions": [{"label": "org.test.blob", "kind": "Binary",
                "data": {"format": "application/octet-stream", "identifier": "blob.bin"}}]}"#,
        )
        .unwrap();
        builder
            .add_resource("blob.bin", Cursor::new(vec![7u8; 16]))
            .unwrap();
        let (signed, _) = sign_jpeg(&mut builder);

        let reader = Reader::from_stream("jpg", Cursor::new(signed)).unwrap();
        let assertion = &reader.active_manifest().unwrap().assertions()[0];
        let resource_ref: ResourceRef = assertion.to_t().unwrap();
        let mut data = Vec::new();
        reader
            .resource_to_stream(&resource_ref.identifier, &mut data)
            .unwrap();
        assert_eq!(data, vec![7u8; 16]);
    }

    #[test]
    fn missing_resource() {
        let mut builder = Builder::from_json(
            r#"{"assertions": [{"label": "org.test.blob", "kind": "Binary",
                "data": {"format": "image/png", "identifier": "nope.png"}}]}"#,
        )
        .unwrap();
        let signer = test_signer(SigningAlg::Es256);
        let err = builder
            .sign(
                &signer,
                "jpg",
                &mut Cursor::new(TEST_JPEG),
                &mut Cursor::new(Vec::new()),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    }

    #[test]
    fn duplicate_resource() {
        let mut builder = Builder::new();
        builder.add_resource("a.png", Cursor::new(TEST_PNG)).unwrap();
        let err = builder
            .add_resource("a.png", Cursor::new(TEST_PNG))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn bad_definition() {
        let err = Builder::from_json("[1, 2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Json);

        let err = Builder::from_json(r#"{"assertions": [{"label": "", "data": {}}]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Manifest);
    }

    #[test]
    fn no_embed() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder.set_no_embed(true).unwrap();
        let (dest, manifest) = sign_jpeg(&mut builder);
        assert_eq!(dest, TEST_JPEG);

        let reader =
            Reader::from_manifest_data_and_stream(&manifest, "jpg", Cursor::new(dest)).unwrap();
        assert_eq!(reader.validation_state(), ValidationState::Valid);
        assert_eq!(
            reader.active_manifest().unwrap().title(),
            Some("Test.jpg")
        );
    }

    #[test]
    fn remote_url() {
        let url = "https://example.com/manifests/test.c2pa";
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder.set_no_embed(true).unwrap().set_remote_url(url).unwrap();
        let (dest, manifest) = sign_jpeg(&mut builder);

        let err = Reader::from_stream("jpg", Cursor::new(dest.clone())).unwrap_err();
        assert_eq!(err, Error::RemoteManifest(url.to_string()));

        let reader =
            Reader::from_manifest_data_and_stream(&manifest, "jpg", Cursor::new(dest)).unwrap();
        assert_eq!(reader.remote_url(), Some(url));
        assert_eq!(reader.validation_state(), ValidationState::Valid);
    }

    #[test]
    fn ingredient_chain() {
        let parent = signed_test_asset("png");
        let parent_label = Reader::from_stream("png", Cursor::new(parent.clone()))
            .unwrap()
            .active_label()
            .unwrap()
            .to_string();

        let mut builder = Builder::from_json(DEFINITION).unwrap();
        let ingredient = builder
            .add_ingredient_from_stream(
                r#"{"title": "parent.png", "relationship": "parentOf"}"#,
                "png",
                Cursor::new(parent),
            )
            .unwrap();
        assert_eq!(ingredient.active_manifest(), Some(parent_label.as_str()));

        let signer = test_signer(SigningAlg::Ed25519);
        let mut dest = Cursor::new(Vec::new());
        builder
            .sign(&signer, "png", &mut Cursor::new(TEST_PNG), &mut dest)
            .unwrap();

        let reader = Reader::from_stream("png", dest).unwrap();
        assert_eq!(reader.validation_state(), ValidationState::Valid);
        assert_eq!(reader.manifests().len(), 2);
        assert!(reader.get_manifest(&parent_label).is_some());

        let ingredients = reader.active_manifest().unwrap().ingredients();
        assert_eq!(ingredients[0].title(), "parent.png");
        assert_eq!(ingredients[0].relationship(), &Relationship::ParentOf);
        assert_eq!(ingredients[0].active_manifest(), Some(parent_label.as_str()));
    }

    #[test]
    fn archive_round_trip() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder.add_resource("extra.bin", Cursor::new(vec![1, 2, 3])).unwrap();
        builder
            .add_ingredient_from_stream(
                r#"{"title": "parent.jpg"}"#,
                "jpg",
                Cursor::new(signed_test_asset("jpg")),
            )
            .unwrap();

        let mut archive = Cursor::new(Vec::new());
        builder.to_archive(&mut archive).unwrap();
        archive.rewind().unwrap();

        let mut restored = Builder::from_archive(archive).unwrap();
        assert_eq!(restored.definition.title.as_deref(), Some("Test.jpg"));
        assert_eq!(restored.definition.assertions.len(), 2);
        assert!(restored.resources.exists("extra.bin"));
        let ingredient = &restored.definition.ingredients[0];
        assert!(ingredient.manifest_data().is_some());

        // the original can still sign after archiving
        let (_, _) = sign_jpeg(&mut builder);
        let (signed, _) = sign_jpeg(&mut restored);
        let reader = Reader::from_stream("jpg", Cursor::new(signed)).unwrap();
        assert_eq!(reader.manifests().len(), 2);
        assert_eq!(reader.validation_state(), ValidationState::Valid);
    }

    #[test]
    fn archive_shared_parent() {
        let parent = signed_test_asset("jpg");
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder
            .add_ingredient_from_stream(
                r#"{"title": "parent.jpg", "relationship": "parentOf"}"#,
                "jpg",
                Cursor::new(parent.clone()),
            )
            .unwrap();
        builder
            .add_ingredient_from_stream(
                r#"{"title": "part.jpg", "relationship": "componentOf"}"#,
                "jpg",
                Cursor::new(parent),
            )
            .unwrap();

        let mut archive = Cursor::new(Vec::new());
        builder.to_archive(&mut archive).unwrap();
        archive.rewind().unwrap();

        let mut restored = Builder::from_archive(archive).unwrap();
        let ingredients = &restored.definition.ingredients;
        assert_eq!(ingredients.len(), 2);
        assert!(ingredients.iter().all(|i| i.manifest_data().is_some()));
        assert_eq!(
            ingredients[0].active_manifest(),
            ingredients[1].active_manifest()
        );

        let (signed, _) = sign_jpeg(&mut restored);
        let reader = Reader::from_stream("jpg", Cursor::new(signed)).unwrap();
        assert_eq!(reader.validation_state(), ValidationState::Valid);
    }

    #[test]
    fn not_an_archive() {
        let err = Builder::from_archive(Cursor::new(b"plain bytes".to_vec())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn data_hashed_embeddable() {
        let signer = test_signer(SigningAlg::Es256);
        data_hashed_round_trip(&signer, signer.reserve_size() + 4000);
    }

    #[test]
    fn data_hashed_large_reserve() {
        let signer = test_signer(SigningAlg::Es256);
        for reserve_size in [60_000, 80_000] {
            data_hashed_round_trip(&signer, reserve_size);
        }
    }

    #[test]
    fn data_hashed_format_mismatch() {
        let signer = test_signer(SigningAlg::Es256);
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        builder
            .data_hashed_placeholder(signer.reserve_size() + 4000, "image/jpeg")
            .unwrap();

        let mut dh = DataHash::new("jumbf manifest", "sha256");
        dh.set_hash(vec![0u8; 32]);
        let err = builder
            .sign_data_hashed_embeddable(&signer, &dh, "png", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);

        // the placeholder is still pending for its own format
        assert!(builder.pending.is_some());
        builder
            .sign_data_hashed_embeddable(&signer, &dh, "jpg", None)
            .unwrap();
    }

    fn data_hashed_round_trip(signer: &dyn Signer, reserve_size: usize) {
        let mut builder = Builder::from_json(DEFINITION).unwrap();

        let placeholder = builder
            .data_hashed_placeholder(reserve_size, "image/jpeg")
            .unwrap();
        assert_eq!(placeholder.len(), reserve_size);

        // splice the placeholder in after SOI
        let mut asset = TEST_JPEG[..2].to_vec();
        asset.extend_from_slice(&placeholder);
        asset.extend_from_slice(&TEST_JPEG[2..]);

        let mut dh = DataHash::new("jumbf manifest", "sha256");
        dh.add_exclusion(HashRange::new(2, placeholder.len() as u64));
        let manifest = builder
            .sign_data_hashed_embeddable(signer, &dh, "image/jpeg", Some(&mut Cursor::new(&asset)))
            .unwrap();
        assert_eq!(manifest.len(), placeholder.len());

        asset[2..2 + manifest.len()].copy_from_slice(&manifest);
        let reader = Reader::from_stream("jpg", Cursor::new(asset)).unwrap();
        assert_eq!(reader.validation_state(), ValidationState::Valid);
        assert_eq!(reader.active_manifest().unwrap().title(), Some("Test.jpg"));
    }

    #[test]
    fn placeholder_too_small() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        let err = builder
            .data_hashed_placeholder(64, "jpg")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Manifest);
    }

    #[test]
    fn lifecycle() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        sign_jpeg(&mut builder);

        let err = builder.add_assertion("org.test.late", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let signer = test_signer(SigningAlg::Es256);
        let err = builder
            .sign(
                &signer,
                "jpg",
                &mut Cursor::new(TEST_JPEG),
                &mut Cursor::new(Vec::new()),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        builder.close();
        builder.close();
        assert!(builder.is_closed());
        let err = builder.set_no_embed(true).unwrap_err();
        assert_eq!(err.message(), "Builder is closed");
    }

    #[test]
    fn sidecar_format_not_supported() {
        let mut builder = Builder::from_json(DEFINITION).unwrap();
        let signer = test_signer(SigningAlg::Es256);
        let err = builder
            .sign(
                &signer,
                "c2pa",
                &mut Cursor::new(Vec::new()),
                &mut Cursor::new(Vec::new()),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn verify_after_sign() {
        let context = Context::new()
            .with_settings(r#"{"verify": {"verify_after_sign": true}}"#)
            .unwrap();
        let mut builder = Builder::from_context(context)
            .with_definition(DEFINITION)
            .unwrap();
        let (signed, _) = sign_jpeg(&mut builder);
        assert!(Reader::from_stream("jpg", Cursor::new(signed)).is_ok());
    }
}
