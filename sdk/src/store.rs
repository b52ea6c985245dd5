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

use std::io::Cursor;

use log::{debug, error, warn};

use crate::{
    assertion::AssertionBase,
    assertions::DataHash,
    asset_io::{CAIRead, CAIReadWrite, HashBlockObjectType, HashObjectPositions},
    claim::{Claim, ClaimAssertion},
    cose_sign,
    cose_validator::verify_cose,
    error::{Error, Result},
    hashed_uri::HashedUri,
    jumbf::{
        boxes::{
            JUMBFCBORContentBox, JUMBFSuperBox, RawBox, CAI_ASSERTION_STORE_UUID,
            CAI_BLOCK_UUID, CAI_CLAIM_UUID, CAI_SIGNATURE_UUID, CAI_STORE_UUID, HEADER_SIZE,
        },
        labels::{
            assertion_label_from_uri, to_assertion_uri, to_manifest_uri, ASSERTIONS, CLAIM,
            MANIFEST_STORE, SIGNATURE,
        },
    },
    jumbf_io,
    utils::{
        hash_utils::{hash_by_alg, HashRange},
        io_utils::{copy_stream, stream_len},
        xmp_inmemory_utils::XmpInfo,
    },
    validation_status::{self, ValidationStatus},
    Signer,
};

/// Name given to the data hash that binds a claim to its asset.
const DATA_HASH_NAME: &str = "jumbf manifest";

// Room left in a placeholder data hash for the final exclusion values.
const EMBED_PLACEHOLDER_PAD: usize = 32;

// Room left for caller supplied exclusions in the data hashed flow.
const DATA_HASHED_PLACEHOLDER_PAD: usize = 128;

const MAX_PLACEHOLDER_PASSES: usize = 8;

/// A manifest store: the claims of an asset and of its ingredients, in
/// JUMBF order. The last claim is the active (provenance) claim.
#[derive(Debug, Default)]
pub(crate) struct Store {
    claims: Vec<Claim>,
}

impl Store {
    /// Create a new, empty claims store.
    pub fn new() -> Self {
        Self::default()
    }

    /// get the list of claims for this store
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn get_claim(&self, label: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.label() == label)
    }

    /// return the current provenance claim if available
    pub fn provenance_claim(&self) -> Option<&Claim> {
        self.claims.last()
    }

    fn provenance_claim_mut(&mut self) -> Result<&mut Claim> {
        self.claims
            .last_mut()
            .ok_or_else(|| Error::Manifest("store has no claim".to_string()))
    }

    /// return the current provenance claim label if available
    pub fn provenance_label(&self) -> Option<String> {
        self.provenance_claim().map(|c| c.label().to_string())
    }

    /// Add a new Claim to this Store, making it the provenance claim.
    /// Returns the label of the claim.
    pub fn commit_claim(&mut self, claim: Claim) -> Result<String> {
        if self.get_claim(claim.label()).is_some() {
            return Err(Error::Manifest(format!(
                "manifest {} is already in the store",
                claim.label()
            )));
        }
        let label = claim.label().to_string();
        self.claims.push(claim);
        Ok(label)
    }

    /// Carries the claims of an ingredient's store into this one.
    ///
    /// Must be called before the provenance claim is committed. Claims
    /// already present (by label) are skipped.
    pub fn append_ingredient_store(&mut self, ingredient_store: Store) {
        for claim in ingredient_store.claims {
            if self.get_claim(claim.label()).is_some() {
                debug!("manifest {} already carried forward", claim.label());
                continue;
            }
            self.claims.push(claim);
        }
    }

    // The manifest superbox for a claim, or the bytes it was read from.
    fn manifest_box_bytes(claim: &Claim, sig_box_size: usize) -> Result<Vec<u8>> {
        match claim.manifest_box() {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Ok(Self::build_manifest_box(claim, sig_box_size)?.to_bytes()?),
        }
    }

    fn build_manifest_box(claim: &Claim, sig_box_size: usize) -> Result<JUMBFSuperBox> {
        let mut cai_store = JUMBFSuperBox::new(claim.label(), CAI_STORE_UUID);

        // assertion store
        let mut a_store = JUMBFSuperBox::new(ASSERTIONS, CAI_ASSERTION_STORE_UUID);
        for ca in claim.claim_assertion_store() {
            a_store.add_data_box(Box::new(Claim::assertion_superbox(
                &ca.label(),
                ca.assertion(),
            )));
        }
        cai_store.add_data_box(Box::new(a_store));

        // claim
        let mut claim_box = JUMBFSuperBox::new(CLAIM, CAI_CLAIM_UUID);
        claim_box.add_data_box(Box::new(JUMBFCBORContentBox::new(claim.data()?)));
        cai_store.add_data_box(Box::new(claim_box));

        // signature, zero filled until the claim is signed
        let signed_data = if claim.signature_val().is_empty() {
            vec![0u8; sig_box_size]
        } else {
            claim.signature_val().to_vec()
        };
        let mut sig_box = JUMBFSuperBox::new(SIGNATURE, CAI_SIGNATURE_UUID);
        sig_box.add_data_box(Box::new(JUMBFCBORContentBox::new(signed_data)));
        cai_store.add_data_box(Box::new(sig_box));

        Ok(cai_store)
    }

    /// Serializes the store. Unsigned claims get a zero filled signature of
    /// `sig_box_size` bytes.
    pub fn to_jumbf_internal(&self, sig_box_size: usize) -> Result<Vec<u8>> {
        let mut cai_block = JUMBFSuperBox::new(MANIFEST_STORE, CAI_BLOCK_UUID);

        for claim in &self.claims {
            let manifest = Self::manifest_box_bytes(claim, sig_box_size)?;
            cai_block.add_data_box(Box::new(RawBox::new(manifest)));
        }

        let mem_box = cai_block.to_bytes()?;
        if mem_box.is_empty() {
            return Err(Error::Encoding("empty manifest store".to_string()));
        }
        Ok(mem_box)
    }

    /// Hashed URI of a claim's manifest box, as referenced by an ingredient.
    pub fn manifest_hashed_uri(claim: &Claim) -> Result<HashedUri> {
        let bytes = Self::manifest_box_bytes(claim, 0)?;
        let header_len = match bytes.get(0..4) {
            // large size boxes carry a 64 bit length after the type
            Some([0, 0, 0, 1]) => HEADER_SIZE as usize + 8,
            _ => HEADER_SIZE as usize,
        };
        let payload = bytes
            .get(header_len..)
            .ok_or_else(|| Error::Decoding("truncated manifest box".to_string()))?;

        let alg = claim.alg();
        let hash = hash_by_alg(alg, payload)
            .ok_or_else(|| Error::NotSupported(format!("hash algorithm {alg}")))?;
        Ok(HashedUri::new(
            to_manifest_uri(claim.label()),
            Some(alg.to_string()),
            &hash,
        ))
    }

    fn find_child_by_uuid<'a>(sbox: &'a JUMBFSuperBox, uuid: &str) -> Option<&'a JUMBFSuperBox> {
        sbox.superboxes().find(|b| b.desc_box().uuid() == uuid)
    }

    /// Parses a JUMBF manifest store.
    pub fn from_jumbf(buffer: &[u8]) -> Result<Store> {
        if buffer.is_empty() {
            return Err(Error::ManifestNotFound("no JUMBF data found".to_string()));
        }

        let cai_block = JUMBFSuperBox::from_slice(buffer)?;
        if cai_block.desc_box().uuid() != CAI_BLOCK_UUID {
            return Err(Error::Decoding("c2pa box not found".to_string()));
        }

        let mut store = Store::new();
        for manifest_box in cai_block.superboxes() {
            let desc_box = manifest_box.desc_box();

            // ignore unknown boxes
            if desc_box.uuid() != CAI_STORE_UUID {
                debug!("skipping unknown manifest box {}", desc_box.label());
                continue;
            }
            let label = desc_box.label();

            let claim_cbor = Self::find_child_by_uuid(manifest_box, CAI_CLAIM_UUID)
                .and_then(|b| b.data_box_as_cbor_box(0))
                .ok_or_else(|| Error::Decoding(format!("manifest {label} has no claim")))?;
            let mut claim = Claim::from_data(&label, claim_cbor.cbor())?;

            if let Some(sig) = Self::find_child_by_uuid(manifest_box, CAI_SIGNATURE_UUID)
                .and_then(|b| b.data_box_as_cbor_box(0))
            {
                claim.set_signature_val(sig.cbor().to_vec());
            }

            if let Some(a_store) = Self::find_child_by_uuid(manifest_box, CAI_ASSERTION_STORE_UUID)
            {
                let alg = claim.alg().to_string();
                for sbox in a_store.superboxes() {
                    match Claim::assertion_from_superbox(sbox) {
                        Ok((assertion, instance)) => {
                            let hash = hash_by_alg(&alg, &sbox.payload_bytes()?).ok_or_else(
                                || Error::NotSupported(format!("hash algorithm {alg}")),
                            )?;
                            claim.put_assertion_store(ClaimAssertion::new(
                                assertion, instance, &hash, &alg,
                            ));
                        }
                        // unknown content types are reported as missing if referenced
                        Err(Error::NotSupported(msg)) => warn!("{msg}"),
                        Err(e) => return Err(e),
                    }
                }
            }

            claim.set_manifest_box(manifest_box.to_bytes()?);
            store.claims.push(claim);
        }

        if store.claims.is_empty() {
            return Err(Error::ManifestNotFound(
                "manifest store holds no manifests".to_string(),
            ));
        }
        Ok(store)
    }

    /// Returns the remote manifest URL from the asset's XMP, if any.
    pub fn get_remote_manifest_url(format: &str, stream: &mut dyn CAIRead) -> Option<String> {
        stream.rewind().ok()?;
        let provenance = XmpInfo::from_source(stream, format).provenance?;
        if provenance.starts_with("http://") || provenance.starts_with("https://") {
            Some(provenance)
        } else {
            None
        }
    }

    /// Loads the store embedded in an asset.
    ///
    /// An asset that only references a remote manifest fails with
    /// [`Error::RemoteManifest`] carrying the URL.
    pub fn load_from_stream(format: &str, stream: &mut dyn CAIRead) -> Result<Store> {
        let jumbf = match jumbf_io::load_jumbf_from_stream(format, stream) {
            Ok(jumbf) => jumbf,
            Err(Error::ManifestNotFound(msg)) => {
                return match Self::get_remote_manifest_url(format, stream) {
                    Some(url) => Err(Error::RemoteManifest(url)),
                    None => Err(Error::ManifestNotFound(msg)),
                };
            }
            Err(e) => return Err(e),
        };
        Self::from_jumbf(&jumbf)
    }

    fn verify_claim_signature(claim: &Claim, statuses: &mut Vec<ValidationStatus>) {
        let result = claim
            .data()
            .and_then(|data| verify_cose(claim.signature_val(), &data));
        if let Err(e) = result {
            debug!("claim signature of {} did not verify: {e}", claim.label());
            statuses.push(
                ValidationStatus::new(validation_status::CLAIM_SIGNATURE_MISMATCH)
                    .set_url(claim.signature_uri())
                    .set_explanation(format!("claim signature is not valid: {}", e.message())),
            );
        }
    }

    fn verify_assertion_links(claim: &Claim, statuses: &mut Vec<ValidationStatus>) {
        for hashed_uri in claim.assertions() {
            let url = hashed_uri.url();
            let found = assertion_label_from_uri(&url)
                .and_then(|label| claim.get_claim_assertion(&label));

            match found {
                None => statuses.push(
                    ValidationStatus::new(validation_status::ASSERTION_MISSING)
                        .set_url(url)
                        .set_explanation("assertion referenced by the claim is missing"),
                ),
                Some(ca) if ca.hash() != hashed_uri.hash().as_slice() => statuses.push(
                    ValidationStatus::new(validation_status::ASSERTION_HASHEDURI_MISMATCH)
                        .set_url(url)
                        .set_explanation(format!("hash does not match assertion {}", ca.label())),
                ),
                Some(_) => (),
            }
        }
    }

    fn verify_data_hashes(claim: &Claim, asset: &mut dyn CAIRead) -> Vec<ValidationStatus> {
        let mut statuses = Vec::new();
        let data_hashes = claim.data_hash_assertions();
        if data_hashes.is_empty() {
            statuses.push(
                ValidationStatus::new(validation_status::CLAIM_HARD_BINDINGS_MISSING)
                    .set_url(claim.uri())
                    .set_explanation("claim has no data hash"),
            );
        }

        for ca in data_hashes {
            let url = to_assertion_uri(claim.label(), &ca.label());
            let result = DataHash::from_assertion(ca.assertion())
                .and_then(|dh| dh.verify_stream_hash(asset));
            if let Err(e) = result {
                statuses.push(
                    ValidationStatus::new(validation_status::ASSERTION_DATAHASH_MISMATCH)
                        .set_url(url)
                        .set_explanation(format!("asset hash error: {}", e.message())),
                );
            }
        }
        statuses
    }

    /// Validates every claim's signature and assertion links, and the
    /// active claim's data hash against `asset` when one is given.
    ///
    /// Only failures are returned.
    pub fn verify(&self, asset: Option<&mut dyn CAIRead>) -> Vec<ValidationStatus> {
        let mut statuses = Vec::new();

        for claim in &self.claims {
            Self::verify_claim_signature(claim, &mut statuses);
            Self::verify_assertion_links(claim, &mut statuses);
        }

        if let (Some(claim), Some(asset)) = (self.provenance_claim(), asset) {
            statuses.extend(Self::verify_data_hashes(claim, asset));
        }

        for status in &statuses {
            debug!(
                "validation: {} {}",
                status.code(),
                status.url().unwrap_or_default()
            );
        }
        statuses
    }

    fn placeholder_data_hash(alg: &str, pad_len: usize) -> Result<DataHash> {
        let hash_len = hash_by_alg(alg, &[])
            .map(|h| h.len())
            .ok_or_else(|| Error::NotSupported(format!("hash algorithm {alg}")))?;

        let mut dh = DataHash::new(DATA_HASH_NAME, alg);
        dh.add_exclusion(HashRange::new(0, 0));
        dh.set_hash(vec![0u8; hash_len]);
        dh.pad = vec![0u8; pad_len];
        Ok(dh)
    }

    // generate a data hash that excludes the manifest blocks
    fn generate_data_hash(
        stream: &mut dyn CAIRead,
        alg: &str,
        block_locations: &mut [HashObjectPositions],
    ) -> Result<DataHash> {
        let len = stream_len(stream)?;

        // sort blocks by offset
        block_locations.sort_by(|a, b| a.offset.cmp(&b.offset));

        // find the first jumbf block (ours are always in order)
        // and the end of the last one
        let mut block_start: usize = 0;
        let mut block_end: usize = 0;
        let mut found_jumbf = false;
        for item in block_locations.iter() {
            if item.htype == HashBlockObjectType::Cai {
                if !found_jumbf {
                    block_start = item.offset;
                    found_jumbf = true;
                }
                block_end = item.offset + item.length;
            }
        }

        if !found_jumbf {
            return Err(Error::Manifest(
                "manifest was not found in the written asset".to_string(),
            ));
        }
        if block_end as u64 > len {
            return Err(Error::Manifest(
                "data hash exclusions out of range".to_string(),
            ));
        }

        let mut dh = DataHash::new(DATA_HASH_NAME, alg);
        dh.add_exclusion(HashRange::new(
            block_start as u64,
            (block_end - block_start) as u64,
        ));
        dh.gen_hash_from_stream(stream)?;
        Ok(dh)
    }

    // Signs the provenance claim and serializes the store.
    fn sign_provenance(&mut self, signer: &dyn Signer, sig_box_size: usize) -> Result<Vec<u8>> {
        let claim_bytes = self.provenance_claim_mut()?.data()?;
        let sig = cose_sign::sign_claim(&claim_bytes, signer, sig_box_size)?;
        self.provenance_claim_mut()?.set_signature_val(sig);
        self.to_jumbf_internal(sig_box_size)
    }

    /// Signs the provenance claim and writes the asset to `dest`.
    ///
    /// With `no_embed` the asset is copied unchanged (apart from a remote
    /// reference when `remote_url` is set). The store bytes are always
    /// returned.
    pub fn save_to_stream(
        &mut self,
        format: &str,
        source: &mut dyn CAIRead,
        dest: &mut dyn CAIReadWrite,
        signer: &dyn Signer,
        remote_url: Option<&str>,
        no_embed: bool,
    ) -> Result<Vec<u8>> {
        // fails early on a closed signer
        signer.certs()?;
        let reserve_size = signer.reserve_size();
        let alg = self.provenance_claim_mut()?.alg().to_string();

        let mut asset = Cursor::new(jumbf_io::stream_to_vec(source)?);

        // 1) add the remote reference to the XMP
        if let Some(url) = remote_url {
            let mut with_ref = Cursor::new(Vec::new());
            jumbf_io::embed_remote_reference(format, &mut asset, &mut with_ref, url)?;
            asset = with_ref;
        }

        let jumbf = if no_embed {
            let mut dh = DataHash::new(DATA_HASH_NAME, &alg);
            dh.gen_hash_from_stream(&mut asset)?;
            self.provenance_claim_mut()?.add_assertion(&dh)?;
            self.sign_provenance(signer, reserve_size)?
        } else {
            // 2) reserve space with a placeholder data hash and signature
            let placeholder = Self::placeholder_data_hash(&alg, EMBED_PLACEHOLDER_PAD)?;
            self.provenance_claim_mut()?.add_assertion(&placeholder)?;
            let preliminary = self.to_jumbf_internal(reserve_size)?;

            let mut staged = Cursor::new(Vec::new());
            jumbf_io::save_jumbf_to_stream(format, &mut asset, &mut staged, &preliminary)?;

            // 3) hash around the final manifest position
            let mut locations = jumbf_io::object_locations_from_stream(format, &mut staged)?;
            let dh = Self::generate_data_hash(&mut staged, &alg, &mut locations)?;
            self.provenance_claim_mut()?.update_data_hash(dh)?;

            // 4) sign and write over the placeholder
            let jumbf = self.sign_provenance(signer, reserve_size)?;
            if jumbf.len() != preliminary.len() {
                error!(
                    "manifest changed size from {} to {} while signing",
                    preliminary.len(),
                    jumbf.len()
                );
                return Err(Error::Manifest(
                    "manifest size changed while signing".to_string(),
                ));
            }

            let mut signed = Cursor::new(Vec::new());
            jumbf_io::save_jumbf_to_stream(format, &mut asset, &mut signed, &jumbf)?;
            asset = signed;
            jumbf
        };

        dest.rewind()?;
        copy_stream(&mut asset, dest)?;

        Ok(jumbf)
    }

    /// Returns a composed manifest of exactly `reserve_size` bytes holding a
    /// placeholder data hash, and the signature box size that makes it fit.
    pub fn get_data_hashed_manifest_placeholder(
        &mut self,
        reserve_size: usize,
        format: &str,
    ) -> Result<(Vec<u8>, usize)> {
        let pc = self.provenance_claim_mut()?;
        if pc.data_hash_assertions().is_empty() {
            let alg = pc.alg().to_string();
            pc.add_assertion(&Self::placeholder_data_hash(
                &alg,
                DATA_HASHED_PLACEHOLDER_PAD,
            )?)?;
        }

        let too_small = || {
            Error::Manifest(format!(
                "reserve size of {reserve_size} bytes cannot hold the manifest"
            ))
        };

        let base_len = jumbf_io::compose_manifest(format, &self.to_jumbf_internal(0)?)?.len();
        if base_len >= reserve_size {
            return Err(too_small());
        }

        // container overhead can step as the manifest grows, so converge on
        // the signature size rather than compute it
        let mut sig_box_size = reserve_size - base_len;
        for _ in 0..MAX_PLACEHOLDER_PASSES {
            let composed =
                jumbf_io::compose_manifest(format, &self.to_jumbf_internal(sig_box_size)?)?;
            if composed.len() == reserve_size {
                return Ok((composed, sig_box_size));
            }
            if composed.len() > reserve_size {
                let over = composed.len() - reserve_size;
                if over >= sig_box_size {
                    break;
                }
                sig_box_size -= over;
            } else {
                sig_box_size += reserve_size - composed.len();
            }
        }

        Err(too_small())
    }

    /// Finalizes a data hashed manifest and returns it composed for `format`.
    ///
    /// The hash is recomputed over `source` when one is given. The signature
    /// is sized to `sig_box_size`, or the signer's reserve when no
    /// placeholder was generated.
    pub fn get_data_hashed_embeddable_manifest(
        &mut self,
        data_hash: &DataHash,
        signer: &dyn Signer,
        format: &str,
        source: Option<&mut dyn CAIRead>,
        sig_box_size: Option<usize>,
    ) -> Result<Vec<u8>> {
        signer.certs()?;

        let mut dh = data_hash.clone();
        if let Some(source) = source {
            source.rewind()?;
            dh.gen_hash_from_stream(source)?;
        }

        let pc = self.provenance_claim_mut()?;
        if pc.data_hash_assertions().is_empty() {
            pc.add_assertion(&dh)?;
        } else {
            pc.update_data_hash(dh)?;
        }

        let box_size = sig_box_size.unwrap_or_else(|| signer.reserve_size());
        let jumbf = self.sign_provenance(signer, box_size)?;
        jumbf_io::compose_manifest(format, &jumbf)
    }
}
