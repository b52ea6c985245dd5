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

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    assertion::{Assertion, AssertionBase, AssertionData},
    assertions::{labels, DataHash},
    claim_generator_info::ClaimGeneratorInfo,
    error::{Error, Result},
    hashed_uri::HashedUri,
    jumbf::{
        self,
        boxes::{
            JUMBFCBORContentBox, JUMBFEmbeddedFileContentBox, JUMBFEmbeddedFileDescriptionBox,
            JUMBFJSONContentBox, JUMBFSuperBox, JUMBF_CBOR_UUID, JUMBF_EMBEDDED_FILE_UUID,
            JUMBF_JSON_UUID,
        },
    },
    utils::hash_utils::hash_by_alg,
};

const DEFAULT_ALG: &str = "sha256";

// Assertions are stored apart from the hashed URI list so that they can be
// patched in place (the data hash is finalized after the placeholder is
// written) and so that the instance can be bound to the label late.
#[derive(PartialEq, Eq, Clone)]
pub(crate) struct ClaimAssertion {
    assertion: Assertion,
    instance: usize,
    hash_val: Vec<u8>,
    hash_alg: String,
}

impl ClaimAssertion {
    pub(crate) fn new(assertion: Assertion, instance: usize, hash_val: &[u8], alg: &str) -> Self {
        Self {
            assertion,
            instance,
            hash_val: hash_val.to_vec(),
            hash_alg: alg.to_string(),
        }
    }

    /// The label as stored in the assertion store, with the instance suffix.
    pub(crate) fn label(&self) -> String {
        if self.instance > 0 {
            format!("{}__{}", self.assertion.label(), self.instance)
        } else {
            self.assertion.label()
        }
    }

    pub(crate) fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub(crate) fn instance(&self) -> usize {
        self.instance
    }

    pub(crate) fn hash(&self) -> &[u8] {
        &self.hash_val
    }

    pub(crate) fn hash_alg(&self) -> &str {
        &self.hash_alg
    }
}

impl fmt::Debug for ClaimAssertion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}, instance: {}", self.assertion, self.instance)
    }
}

/// A `Claim` gathers together all the `Assertion`s about an asset
/// from an actor at a given time, and may also include one or more
/// hashes of the asset itself.
///
/// The claim is serialized to CBOR, cryptographically hashed and that hash
/// is signed to produce the claim signature.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub(crate) struct Claim {
    claim_generator: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    claim_generator_info: Option<Vec<ClaimGeneratorInfo>>,

    #[serde(rename = "dc:title", skip_serializing_if = "Option::is_none")]
    title: Option<String>,

    #[serde(rename = "dc:format")]
    format: String,

    #[serde(rename = "instanceID")]
    instance_id: String,

    signature: String,

    assertions: Vec<HashedUri>,

    #[serde(skip_serializing_if = "Option::is_none")]
    alg: Option<String>,

    // label of the manifest holding this claim
    #[serde(skip)]
    label: String,

    #[serde(skip)]
    signature_val: Vec<u8>,

    #[serde(skip)]
    assertion_store: Vec<ClaimAssertion>,

    // CBOR as read from an asset; signatures are computed over these exact bytes
    #[serde(skip)]
    original_bytes: Option<Vec<u8>>,

    // the whole manifest box as read, written back verbatim when this claim
    // is carried forward as an ingredient
    #[serde(skip)]
    manifest_box: Option<Vec<u8>>,
}

impl Claim {
    /// Creates a claim for an asset of `format`, labelled with a new
    /// `urn:uuid:`.
    pub fn new(claim_generator: &str, format: &str, title: Option<&str>) -> Self {
        let label = format!("urn:uuid:{}", Uuid::new_v4());
        Self::new_with_label(claim_generator, format, title, &label)
    }

    /// Creates a claim with a caller chosen manifest label.
    pub fn new_with_label(
        claim_generator: &str,
        format: &str,
        title: Option<&str>,
        label: &str,
    ) -> Self {
        let label = label.to_string();
        Self {
            claim_generator: claim_generator.to_string(),
            title: title.map(|t| t.to_string()),
            format: format.to_string(),
            instance_id: format!("xmp:iid:{}", Uuid::new_v4()),
            signature: jumbf::labels::to_signature_uri(&label),
            alg: Some(DEFAULT_ALG.to_string()),
            label,
            ..Default::default()
        }
    }

    /// Decodes a claim from its CBOR bytes, keeping the bytes for signature
    /// checks.
    pub fn from_data(label: &str, data: &[u8]) -> Result<Self> {
        let mut claim: Claim = ciborium::from_reader(data)
            .map_err(|e| Error::Decoding(format!("invalid claim: {e}")))?;
        claim.label = label.to_string();
        claim.original_bytes = Some(data.to_vec());
        Ok(claim)
    }

    /// Returns the CBOR encoding of this claim.
    pub fn data(&self) -> Result<Vec<u8>> {
        if let Some(bytes) = &self.original_bytes {
            return Ok(bytes.clone());
        }
        let mut data = Vec::new();
        ciborium::into_writer(self, &mut data)?;
        Ok(data)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// JUMBF URI of the manifest holding this claim.
    pub fn uri(&self) -> String {
        jumbf::labels::to_manifest_uri(&self.label)
    }

    pub fn signature_uri(&self) -> &str {
        &self.signature
    }

    pub fn claim_generator(&self) -> &str {
        &self.claim_generator
    }

    pub fn claim_generator_info(&self) -> Option<&[ClaimGeneratorInfo]> {
        self.claim_generator_info.as_deref()
    }

    pub fn add_claim_generator_info(&mut self, info: ClaimGeneratorInfo) -> &mut Self {
        self.claim_generator_info
            .get_or_insert_with(Vec::new)
            .push(info);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn set_instance_id<S: Into<String>>(&mut self, instance_id: S) {
        self.instance_id = instance_id.into();
    }

    /// Hash algorithm for assertion hashes, defaulting to sha256.
    pub fn alg(&self) -> &str {
        self.alg.as_deref().unwrap_or(DEFAULT_ALG)
    }

    pub fn set_alg(&mut self, alg: &str) {
        self.alg = Some(alg.to_string());
    }

    pub fn signature_val(&self) -> &[u8] {
        &self.signature_val
    }

    pub(crate) fn set_signature_val(&mut self, signature: Vec<u8>) {
        self.signature_val = signature;
    }

    /// The hashed URIs listed in the claim.
    pub fn assertions(&self) -> &[HashedUri] {
        &self.assertions
    }

    pub(crate) fn claim_assertion_store(&self) -> &[ClaimAssertion] {
        &self.assertion_store
    }

    pub(crate) fn manifest_box(&self) -> Option<&[u8]> {
        self.manifest_box.as_deref()
    }

    pub(crate) fn set_manifest_box(&mut self, manifest_box: Vec<u8>) {
        self.manifest_box = Some(manifest_box);
    }

    /// Builds the JUMBF superbox an assertion is stored in.
    pub(crate) fn assertion_superbox(label: &str, assertion: &Assertion) -> JUMBFSuperBox {
        match assertion.decode_data() {
            AssertionData::Json(json) => {
                let mut sbox = JUMBFSuperBox::new(label, JUMBF_JSON_UUID);
                sbox.add_data_box(Box::new(JUMBFJSONContentBox::new(json.as_bytes().to_vec())));
                sbox
            }
            AssertionData::Cbor(cbor) => {
                let mut sbox = JUMBFSuperBox::new(label, JUMBF_CBOR_UUID);
                sbox.add_data_box(Box::new(JUMBFCBORContentBox::new(cbor.clone())));
                sbox
            }
            AssertionData::Binary { format, data } => {
                let mut sbox = JUMBFSuperBox::new(label, JUMBF_EMBEDDED_FILE_UUID);
                sbox.add_data_box(Box::new(JUMBFEmbeddedFileDescriptionBox::new(format, None)));
                sbox.add_data_box(Box::new(JUMBFEmbeddedFileContentBox::new(data.clone())));
                sbox
            }
        }
    }

    /// Reads an assertion back out of its superbox.
    ///
    /// Returns the assertion with the instance suffix removed from its label
    /// and the instance number.
    pub(crate) fn assertion_from_superbox(sbox: &JUMBFSuperBox) -> Result<(Assertion, usize)> {
        let full_label = sbox.desc_box().label();
        let (label, instance) = split_instance(&full_label);

        let uuid = sbox.desc_box().uuid();
        let data = if uuid == JUMBF_JSON_UUID {
            let json_box = sbox.data_box_as_json_box(0).ok_or_else(|| {
                Error::Decoding(format!("assertion {full_label} has no json box"))
            })?;
            let json = String::from_utf8(json_box.json().to_vec())
                .map_err(|_| Error::Decoding(format!("assertion {full_label} is not utf-8")))?;
            AssertionData::Json(json)
        } else if uuid == JUMBF_CBOR_UUID {
            let cbor_box = sbox.data_box_as_cbor_box(0).ok_or_else(|| {
                Error::Decoding(format!("assertion {full_label} has no cbor box"))
            })?;
            AssertionData::Cbor(cbor_box.cbor().to_vec())
        } else if uuid == JUMBF_EMBEDDED_FILE_UUID {
            let desc = sbox.data_box_as_embedded_media_type_box(0);
            let content = sbox.data_box_as_embedded_file_content_box(1);
            match (desc, content) {
                (Some(desc), Some(content)) => AssertionData::Binary {
                    format: desc.media_type().to_string(),
                    data: content.data().to_vec(),
                },
                _ => {
                    return Err(Error::Decoding(format!(
                        "assertion {full_label} is not a valid embedded file"
                    )))
                }
            }
        } else {
            return Err(Error::NotSupported(format!(
                "assertion {full_label} has unknown content type {uuid}"
            )));
        };

        Ok((Assertion::new(label, data), instance))
    }

    /// Hash of an assertion's superbox payload, as referenced by the claim.
    pub(crate) fn calc_assertion_box_hash(
        label: &str,
        assertion: &Assertion,
        alg: &str,
    ) -> Result<Vec<u8>> {
        let payload = Self::assertion_superbox(label, assertion).payload_bytes()?;
        hash_by_alg(alg, &payload)
            .ok_or_else(|| Error::NotSupported(format!("hash algorithm {alg}")))
    }

    fn next_instance(&self, label: &str) -> usize {
        self.assertion_store
            .iter()
            .filter(|ca| ca.assertion.label() == label)
            .count()
    }

    /// Adds an assertion to this claim and returns the hashed URI linking to
    /// it.
    pub fn add_assertion(&mut self, assertion_builder: &impl AssertionBase) -> Result<HashedUri> {
        let assertion = assertion_builder.to_assertion()?;
        self.add_assertion_data(assertion)
    }

    pub(crate) fn add_assertion_data(&mut self, assertion: Assertion) -> Result<HashedUri> {
        if self.original_bytes.is_some() {
            return Err(Error::Manifest(
                "cannot add assertions to a claim read from an asset".to_string(),
            ));
        }

        let label = assertion.label();
        let instance = self.next_instance(&label);
        let ca = ClaimAssertion::new(assertion, instance, &[], self.alg());
        let instance_label = ca.label();

        let hash = Self::calc_assertion_box_hash(&instance_label, &ca.assertion, self.alg())?;
        let link = jumbf::labels::to_relative_uri(&jumbf::labels::to_assertion_uri(
            &self.label,
            &instance_label,
        ));
        let hashed_uri = HashedUri::new(link, None, &hash);

        self.assertion_store.push(ClaimAssertion { hash_val: hash, ..ca });
        self.assertions.push(hashed_uri.clone());

        Ok(hashed_uri)
    }

    /// Restores an assertion read from the assertion store.
    pub(crate) fn put_assertion_store(&mut self, ca: ClaimAssertion) {
        self.assertion_store.push(ca);
    }

    /// Finds an assertion by its stored label (including any instance
    /// suffix).
    pub(crate) fn get_claim_assertion(&self, label: &str) -> Option<&ClaimAssertion> {
        self.assertion_store.iter().find(|ca| ca.label() == label)
    }

    pub(crate) fn data_hash_assertions(&self) -> Vec<&ClaimAssertion> {
        self.assertions_by_base(labels::DATA_HASH)
    }

    pub(crate) fn ingredient_assertions(&self) -> Vec<&ClaimAssertion> {
        self.assertions_by_base(labels::INGREDIENT)
    }

    fn assertions_by_base(&self, base: &str) -> Vec<&ClaimAssertion> {
        self.assertion_store
            .iter()
            .filter(|ca| ca.assertion.label() == base)
            .collect()
    }

    /// Replaces the first data hash assertion with final contents, padded
    /// to the placeholder's size so that no other offsets move.
    pub(crate) fn update_data_hash(&mut self, mut data_hash: DataHash) -> Result<()> {
        let alg = self.alg().to_string();

        let index = self
            .assertion_store
            .iter()
            .position(|ca| ca.assertion.label() == labels::DATA_HASH)
            .ok_or_else(|| Error::AssertionNotFound(labels::DATA_HASH.to_string()))?;

        let original_len = self.assertion_store[index].assertion.data().len();
        data_hash.pad_to_size(original_len)?;
        let assertion = data_hash.to_assertion()?;

        let label = self.assertion_store[index].label();
        let hash = Self::calc_assertion_box_hash(&label, &assertion, &alg)?;

        let target = &mut self.assertion_store[index];
        let original_hash = std::mem::replace(&mut target.hash_val, hash.clone());
        target.assertion = assertion;

        let link = self
            .assertions
            .iter_mut()
            .find(|hu| hu.url().ends_with(&label) && hu.hash() == original_hash)
            .ok_or_else(|| Error::AssertionNotFound(label.clone()))?;
        *link = HashedUri::new(link.url(), link.alg(), &hash);

        debug!("updated data hash in claim {}", self.label);
        self.original_bytes = None;
        Ok(())
    }
}

// "c2pa.ingredient__2" -> ("c2pa.ingredient", 2)
fn split_instance(label: &str) -> (&str, usize) {
    let base = labels::base(label);
    if base.len() == label.len() {
        return (label, 0);
    }
    match label[base.len() + 2..].parse::<usize>() {
        Ok(instance) => (base, instance),
        Err(_) => (label, 0),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{assertions::Ingredient, utils::hash_utils::HashRange, ErrorKind};

    #[test]
    fn test_new_claim() {
        let claim = Claim::new("test generator", "image/jpeg", Some("test.jpg"));
        assert!(claim.label().starts_with("urn:uuid:"));
        assert_eq!(claim.format(), "image/jpeg");
        assert_eq!(claim.title(), Some("test.jpg"));
        assert!(claim.instance_id().starts_with("xmp:iid:"));
        assert_eq!(
            claim.signature_uri(),
            format!("self#jumbf=/c2pa/{}/c2pa.signature", claim.label())
        );
    }

    #[test]
    fn test_cbor_round_trip() {
        let mut claim = Claim::new("test generator", "image/png", None);
        claim.add_claim_generator_info(ClaimGeneratorInfo::new("unit test"));
        claim
            .add_assertion_data(Assertion::from_data_json("org.test", r#"{"a":1}"#))
            .unwrap();

        let data = claim.data().unwrap();
        let restored = Claim::from_data(claim.label(), &data).unwrap();

        assert_eq!(restored.claim_generator(), "test generator");
        assert_eq!(restored.format(), "image/png");
        assert_eq!(restored.title(), None);
        assert_eq!(restored.instance_id(), claim.instance_id());
        assert_eq!(restored.assertions(), claim.assertions());
        assert_eq!(
            restored.claim_generator_info().unwrap()[0].name,
            "unit test"
        );
        // original bytes are kept verbatim
        assert_eq!(restored.data().unwrap(), data);
    }

    #[test]
    fn test_instance_labels() {
        let mut claim = Claim::new("test", "image/jpeg", None);
        let first = Ingredient::new("A.jpg", "image/jpeg", "xmp:iid:1");
        let second = Ingredient::new("B.jpg", "image/jpeg", "xmp:iid:2");

        let hu1 = claim.add_assertion(&first).unwrap();
        let hu2 = claim.add_assertion(&second).unwrap();

        assert_eq!(hu1.url(), "self#jumbf=c2pa.assertions/c2pa.ingredient");
        assert_eq!(hu2.url(), "self#jumbf=c2pa.assertions/c2pa.ingredient__1");
        assert!(claim.get_claim_assertion("c2pa.ingredient__1").is_some());
        assert_eq!(claim.ingredient_assertions().len(), 2);
    }

    #[test]
    fn test_superbox_round_trip() {
        let binary = Assertion::from_data_binary("c2pa.thumbnail.claim.jpeg", "image/jpeg", &[1, 2, 3]);
        let json = Assertion::from_data_json("org.test", r#"{"b":true}"#);
        let cbor = Assertion::from_data_cbor("org.cbor", &[0xa0]);

        for (label, assertion) in [
            ("c2pa.thumbnail.claim.jpeg", &binary),
            ("org.test__3", &json),
            ("org.cbor", &cbor),
        ] {
            let sbox = Claim::assertion_superbox(label, assertion);
            let bytes = sbox.to_bytes().unwrap();
            let parsed = JUMBFSuperBox::from_slice(&bytes).unwrap();
            let (restored, instance) = Claim::assertion_from_superbox(&parsed).unwrap();
            assert_eq!(&restored, assertion);
            assert_eq!(instance, if label == "org.test__3" { 3 } else { 0 });
        }
    }

    #[test]
    fn test_assertion_hash_matches_box() {
        let mut claim = Claim::new("test", "image/jpeg", None);
        let assertion = Assertion::from_data_json("org.test", r#"{"a":1}"#);
        let hu = claim.add_assertion_data(assertion.clone()).unwrap();

        let payload = Claim::assertion_superbox("org.test", &assertion)
            .payload_bytes()
            .unwrap();
        assert!(hu.hash_matches(&payload, "sha256"));
    }

    #[test]
    fn test_update_data_hash() {
        let mut claim = Claim::new("test", "image/jpeg", None);
        let mut placeholder = DataHash::new("jumbf manifest", "sha256");
        placeholder.add_exclusion(HashRange::new(0, 0));
        placeholder.set_hash(vec![0; 32]);
        placeholder.pad = vec![0; 8];
        claim.add_assertion(&placeholder).unwrap();

        let original_len = claim.data_hash_assertions()[0].assertion().data().len();
        let original_uri = claim.assertions()[0].clone();

        let mut final_hash = DataHash::new("jumbf manifest", "sha256");
        final_hash.add_exclusion(HashRange::new(20, 5000));
        final_hash.set_hash(vec![7; 32]);
        claim.update_data_hash(final_hash).unwrap();

        let updated = claim.data_hash_assertions()[0];
        assert_eq!(updated.assertion().data().len(), original_len);
        let dh = DataHash::from_assertion(updated.assertion()).unwrap();
        assert_eq!(dh.hash, vec![7; 32]);

        assert_eq!(claim.assertions()[0].url(), original_uri.url());
        assert_ne!(claim.assertions()[0].hash(), original_uri.hash());
        assert_eq!(claim.assertions()[0].hash(), updated.hash());
    }

    #[test]
    fn test_update_missing_data_hash() {
        let mut claim = Claim::new("test", "image/jpeg", None);
        let err = claim
            .update_data_hash(DataHash::new("jumbf manifest", "sha256"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AssertionNotFound);
    }

    #[test]
    fn test_bad_claim_data() {
        let err = Claim::from_data("label", &[0xff, 0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    #[test]
    fn test_split_instance() {
        assert_eq!(split_instance("c2pa.ingredient__2"), ("c2pa.ingredient", 2));
        assert_eq!(split_instance("c2pa.ingredient"), ("c2pa.ingredient", 0));
    }
}
