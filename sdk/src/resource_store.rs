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

use std::{
    borrow::Cow,
    collections::HashMap,
    io::{Read, Write},
};

use serde::{Deserialize, Serialize};

use crate::{utils::mime::format_to_extension, Error, Result};

/// A reference to a binary resource held outside the manifest JSON.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct ResourceRef {
    /// Mime type or extension of the resource.
    pub format: String,
    /// The identifier the resource is stored under.
    pub identifier: String,
}

impl ResourceRef {
    pub fn new<S: Into<String>, I: Into<String>>(format: S, identifier: I) -> Self {
        Self {
            format: format.into(),
            identifier: identifier.into(),
        }
    }
}

/// Binary resources of a manifest, keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct ResourceStore {
    resources: HashMap<String, Vec<u8>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates an identifier for `key` that is unique in this store,
    /// with a file extension for the format.
    pub fn id_from(&self, key: &str, format: &str) -> String {
        let ext = format_to_extension(format)
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        // clean string for possible filesystem use
        let id_base = key.replace(['/', ':', '#', '='], "-");

        let mut count = 1;
        let mut id = format!("{id_base}{ext}");
        while self.exists(&id) {
            id = format!("{id_base}-{count}{ext}");
            count += 1;
        }
        id
    }

    /// Adds a resource under a generated identifier and returns its reference.
    pub fn add_with<R>(&mut self, key: &str, format: &str, value: R) -> Result<ResourceRef>
    where
        R: Into<Vec<u8>>,
    {
        let id = self.id_from(key, format);
        self.add(&id, value)?;
        Ok(ResourceRef::new(format, id))
    }

    /// Adds a resource, replacing any previous value with the same id.
    pub fn add<S, R>(&mut self, id: S, value: R) -> Result<()>
    where
        S: Into<String>,
        R: Into<Vec<u8>>,
    {
        self.resources.insert(id.into(), value.into());
        Ok(())
    }

    /// Adds a resource read from `stream`.
    pub fn add_from_stream<S: Into<String>>(&mut self, id: S, stream: &mut dyn Read) -> Result<()> {
        let mut value = Vec::new();
        stream.read_to_end(&mut value)?;
        self.add(id, value)
    }

    pub fn resources(&self) -> &HashMap<String, Vec<u8>> {
        &self.resources
    }

    /// Returns the resource bytes.
    ///
    /// Fails with [`Error::ResourceNotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Cow<'_, [u8]>> {
        self.resources
            .get(id)
            .map(|v| Cow::Borrowed(v.as_slice()))
            .ok_or_else(|| Error::ResourceNotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Writes a resource to `stream`, returning the number of bytes written.
    pub fn write_stream(&self, id: &str, stream: &mut dyn Write) -> Result<u64> {
        let data = self.get(id)?;
        stream.write_all(&data)?;
        stream.flush()?;
        Ok(data.len() as u64)
    }

    /// Moves every resource of `other` into this store.
    pub(crate) fn merge(&mut self, other: ResourceStore) {
        self.resources.extend(other.resources);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn resource_store() {
        let mut store = ResourceStore::new();
        let key = "self#jumbf=c2pa.assertions/c2pa.thumbnail.claim.jpeg";
        let r = store.add_with(key, "image/jpeg", vec![1, 2, 3]).unwrap();
        assert_eq!(r.format, "image/jpeg");
        assert!(r.identifier.ends_with(".jpg"));
        assert!(!r.identifier.contains('/'));

        // same key gets a new id
        let r2 = store.add_with(key, "image/jpeg", vec![4]).unwrap();
        assert_ne!(r.identifier, r2.identifier);

        assert_eq!(store.get(&r.identifier).unwrap().as_ref(), &[1, 2, 3]);

        let mut out = Vec::new();
        assert_eq!(store.write_stream(&r2.identifier, &mut out).unwrap(), 1);
        assert_eq!(out, vec![4]);
    }

    #[test]
    fn resource_not_found() {
        let mut store = ResourceStore::new();
        store
            .add_from_stream("thumb.png", &mut Cursor::new(vec![9u8; 10]))
            .unwrap();
        assert!(store.exists("thumb.png"));

        let err = store.get("missing.png").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    }
}
