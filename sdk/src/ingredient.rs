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

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    assertions::{self, Relationship},
    asset_io::CAIRead,
    error::{Error, Result},
    hashed_uri::HashedUri,
    jumbf::labels::manifest_label_from_uri,
    jumbf_io,
    store::Store,
    utils::{mime::format_to_mime, xmp_inmemory_utils::XmpInfo},
    validation_status::ValidationStatus,
};

fn default_title() -> String {
    "untitled".to_string()
}

/// An ingredient is any external asset that has been used in the creation
/// of an asset.
///
/// When the ingredient carries its own manifest store, that store travels
/// with the ingredient and is carried into the new asset's store on signing.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Ingredient {
    /// A human readable title, generally source filename
    #[serde(default = "default_title")]
    title: String,

    /// The format of the source file as a mime type
    #[serde(default)]
    format: String,

    /// Document ID from `xmpMM:DocumentID` in XMP metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    document_id: Option<String>,

    /// Instance ID from `xmpMM:InstanceID` in XMP metadata
    #[serde(default)]
    instance_id: String,

    /// URI from `dcterms:provenance` in XMP metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    provenance: Option<String>,

    #[serde(default)]
    relationship: Relationship,

    /// The label of the active manifest of the ingredient, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    active_manifest: Option<String>,

    /// Validation failures found in the ingredient's manifest store
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_status: Option<Vec<ValidationStatus>>,

    /// The ingredient's manifest store as a binary c2pa blob
    #[serde(skip)]
    manifest_data: Option<Vec<u8>>,
}

impl Default for Ingredient {
    fn default() -> Self {
        Self {
            title: default_title(),
            format: String::new(),
            document_id: None,
            instance_id: String::new(),
            provenance: None,
            relationship: Relationship::default(),
            active_manifest: None,
            validation_status: None,
            manifest_data: None,
        }
    }
}

impl Ingredient {
    pub fn new(title: &str, format: &str, instance_id: &str) -> Self {
        Self {
            title: title.to_owned(),
            format: format.to_owned(),
            instance_id: instance_id.to_owned(),
            ..Default::default()
        }
    }

    /// Creates an ingredient from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Creates an ingredient from an asset stream.
    ///
    /// An asset without a manifest store still makes an ingredient. Format
    /// and parse failures are the same as for [`Reader`](crate::Reader).
    pub fn from_stream(format: &str, stream: &mut dyn CAIRead) -> Result<Self> {
        Self::default().with_stream(format, stream)
    }

    /// Fills in the properties that come from the asset itself, keeping the
    /// title and relationship already set.
    pub fn with_stream(mut self, format: &str, stream: &mut dyn CAIRead) -> Result<Self> {
        let mime = format_to_mime(format)
            .ok_or_else(|| Error::NotSupported(format!("format {format}")))?;
        self.format = mime.to_string();

        let xmp = XmpInfo::from_source(stream, format);
        self.document_id = xmp.document_id;
        self.provenance = xmp.provenance;
        self.instance_id = xmp
            .instance_id
            .unwrap_or_else(|| format!("xmp:iid:{}", Uuid::new_v4()));

        let manifest_data = match jumbf_io::load_jumbf_from_stream(format, stream) {
            Ok(data) => Some(data),
            Err(Error::ManifestNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        if let Some(data) = manifest_data {
            let store = Store::from_jumbf(&data)?;
            let statuses = store.verify(Some(stream));
            if !statuses.is_empty() {
                debug!(
                    "ingredient {} has {} validation failures",
                    self.title,
                    statuses.len()
                );
                self.validation_status = Some(statuses);
            }
            self.active_manifest = store.provenance_label();
            self.manifest_data = Some(data);
        }
        Ok(self)
    }

    /// Returns a user displayable title for this ingredient
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns a mime content_type for this asset associated with this ingredient
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Returns the remote manifest reference found in the ingredient's XMP.
    pub fn provenance(&self) -> Option<&str> {
        self.provenance.as_deref()
    }

    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    /// Returns the label of the ingredient's active manifest.
    pub fn active_manifest(&self) -> Option<&str> {
        self.active_manifest.as_deref()
    }

    pub fn validation_status(&self) -> Option<&[ValidationStatus]> {
        self.validation_status.as_deref()
    }

    /// Returns the ingredient's manifest store bytes.
    pub fn manifest_data(&self) -> Option<&[u8]> {
        self.manifest_data.as_deref()
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_relationship(&mut self, relationship: Relationship) -> &mut Self {
        self.relationship = relationship;
        self
    }

    pub(crate) fn set_manifest_data(&mut self, data: Vec<u8>) -> Result<&mut Self> {
        let store = Store::from_jumbf(&data)?;
        self.active_manifest = store.provenance_label();
        self.manifest_data = Some(data);
        Ok(self)
    }

    /// The assertion recorded in the claim, linking to the ingredient's
    /// active manifest.
    pub(crate) fn to_assertion(&self, c2pa_manifest: Option<HashedUri>) -> assertions::Ingredient {
        let mut assertion = assertions::Ingredient::new(&self.title, &self.format, &self.instance_id)
            .set_relationship(self.relationship.clone())
            .set_c2pa_manifest_from_hashed_uri(c2pa_manifest);
        assertion.document_id = self.document_id.clone();
        assertion
    }

    /// The reader view of an ingredient assertion.
    pub(crate) fn from_assertion(assertion: &assertions::Ingredient) -> Self {
        Self {
            title: assertion.title.clone(),
            format: assertion.format.clone(),
            document_id: assertion.document_id.clone(),
            instance_id: assertion.instance_id.clone(),
            relationship: assertion.relationship.clone(),
            active_manifest: assertion
                .c2pa_manifest
                .as_ref()
                .and_then(|hu| manifest_label_from_uri(&hu.url())),
            ..Default::default()
        }
    }
}
