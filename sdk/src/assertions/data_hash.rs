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
use serde_bytes::ByteBuf;

use crate::{
    assertion::{Assertion, AssertionBase, AssertionCbor},
    assertions::labels,
    asset_io::CAIRead,
    error::{Error, Result},
    utils::hash_utils::{hash_stream_by_alg, HashRange},
};

/// Hard binding of a claim to the bytes of an asset: a hash over the asset
/// with the manifest's own bytes excluded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DataHash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<Vec<HashRange>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,

    #[serde(with = "serde_bytes")]
    pub pad: Vec<u8>,

    // serde_bytes cannot wrap an Option<Vec<u8>>, hence ByteBuf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad2: Option<ByteBuf>,
}

impl DataHash {
    /// Label prefix for a data hash assertion.
    pub const LABEL: &'static str = labels::DATA_HASH;

    /// Create new DataHash instance
    pub fn new(name: &str, alg: &str) -> Self {
        DataHash {
            exclusions: None,
            name: Some(name.to_string()),
            alg: Some(alg.to_string()),
            hash: Vec::new(),
            pad: Vec::new(),
            pad2: None,
        }
    }

    pub fn add_exclusion(&mut self, exclusion: HashRange) {
        self.exclusions.get_or_insert_with(Vec::new).push(exclusion);
    }

    pub fn set_hash(&mut self, hash: Vec<u8>) {
        self.hash = hash;
    }

    fn alg_or_default(&self) -> &str {
        self.alg.as_deref().unwrap_or("sha256")
    }

    /// Computes the hash of the stream honoring the exclusions.
    pub fn hash_from_stream(&self, stream: &mut dyn CAIRead) -> Result<Vec<u8>> {
        hash_stream_by_alg(self.alg_or_default(), stream, self.exclusions.clone())
    }

    /// Generates and stores the hash value for the stream.
    pub fn gen_hash_from_stream(&mut self, stream: &mut dyn CAIRead) -> Result<()> {
        self.hash = self.hash_from_stream(stream)?;
        Ok(())
    }

    /// Checks the stored hash against a stream.
    pub fn verify_stream_hash(&self, stream: &mut dyn CAIRead) -> Result<()> {
        let hash = self.hash_from_stream(stream)?;
        if hash == self.hash {
            Ok(())
        } else {
            Err(Error::Verify("data hash does not match the asset".to_string()))
        }
    }

    fn cbor_len(&self) -> Result<usize> {
        Ok(self.to_cbor_assertion()?.data().len())
    }

    /// Adds padding until the CBOR encoding is exactly `desired_size` bytes.
    ///
    /// A CBOR length prefix can grow by more than one byte as the pad grows,
    /// so when a single pad overshoots the target a second pad takes part of
    /// the length.
    pub fn pad_to_size(&mut self, desired_size: usize) -> Result<()> {
        self.pad.clear();
        self.pad2 = None;

        let mut curr_size = self.cbor_len()?;
        if curr_size > desired_size {
            return Err(Error::Manifest(format!(
                "data hash of {curr_size} bytes cannot shrink to {desired_size}"
            )));
        }

        while curr_size < desired_size {
            self.pad.push(0);
            curr_size = self.cbor_len()?;
        }
        if curr_size == desired_size {
            return Ok(());
        }

        // overshot at a length prefix boundary; split the padding in two
        let total_pad = self.pad.len();
        for pad2_len in 0..=total_pad {
            self.pad2 = Some(ByteBuf::from(vec![0u8; pad2_len]));
            self.pad = Vec::new();
            curr_size = self.cbor_len()?;
            while curr_size < desired_size {
                self.pad.push(0);
                curr_size = self.cbor_len()?;
            }
            if curr_size == desired_size {
                return Ok(());
            }
        }

        Err(Error::Manifest(format!(
            "could not pad data hash to {desired_size} bytes"
        )))
    }
}

impl AssertionCbor for DataHash {}

impl AssertionBase for DataHash {
    const LABEL: &'static str = Self::LABEL;

    fn to_assertion(&self) -> Result<Assertion> {
        Self::to_cbor_assertion(self)
    }

    fn from_assertion(assertion: &Assertion) -> Result<Self> {
        Self::from_cbor_assertion(assertion)
    }
}
