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

use fast_xml::{
    events::{BytesStart, Event},
    Reader, Writer,
};
use log::error;

use crate::{asset_io::CAIRead, jumbf_io::get_cailoader_handler, Error, Result};

const RDF_DESCRIPTION: &[u8] = b"rdf:Description";

pub const MIN_XMP: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?><x:xmpmeta xmlns:x="adobe:ns:meta/" x:xmptk="XMP Core 6.0.0"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" > </rdf:Description></rdf:RDF> </x:xmpmeta> "#;

/// Identifiers found in an asset's XMP packet.
#[derive(Debug, Default)]
pub struct XmpInfo {
    pub document_id: Option<String>,
    pub instance_id: Option<String>,
    pub provenance: Option<String>,
}

impl XmpInfo {
    /// search xmp data for provenance, documentID and instanceID
    pub fn from_source(source: &mut dyn CAIRead, format: &str) -> Self {
        let xmp = get_cailoader_handler(format).and_then(|cai_loader| cai_loader.read_xmp(source));

        let provenance = xmp.as_deref().and_then(extract_provenance);
        let document_id = xmp.as_deref().and_then(|x| extract_xmp_key(x, "xmpMM:DocumentID"));
        let instance_id = xmp.as_deref().and_then(|x| extract_xmp_key(x, "xmpMM:InstanceID"));
        Self {
            document_id,
            instance_id,
            provenance,
        }
    }
}

/// Extract a value from XMP using a key, either as an `rdf:Description`
/// attribute or as an element.
fn extract_xmp_key(xmp: &str, key: &str) -> Option<String> {
    let mut reader = Reader::from_str(xmp);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.name() == RDF_DESCRIPTION {
                    let value = e
                        .attributes()
                        .flatten()
                        .find(|attribute| attribute.key == key.as_bytes());
                    if let Some(attribute) = value {
                        if let Ok(s) = String::from_utf8(attribute.value.to_vec()) {
                            return Some(s);
                        }
                    }
                } else if e.name() == key.as_bytes() {
                    let mut buf: Vec<u8> = Vec::new();
                    if let Ok(s) = reader.read_text(e.name(), &mut buf) {
                        return Some(s);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
}

/// Add a value to XMP using a key, replaces the value if the key exists
fn add_xmp_key(xmp: &str, key: &str, value: &str) -> Result<String> {
    let mut reader = Reader::from_str(xmp);
    reader.trim_text(true);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    let write_err = |e: fast_xml::Error| Error::Encoding(format!("XMP write: {e}"));

    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(ref e)) if e.name() == RDF_DESCRIPTION => {
                let mut elem = BytesStart::owned(RDF_DESCRIPTION.to_vec(), RDF_DESCRIPTION.len());
                let mut added = false;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| {
                        error!("Error at position {}", reader.buffer_position());
                        Error::Decoding(format!("XMP attribute: {e}"))
                    })?;
                    if attr.key == key.as_bytes() {
                        elem.push_attribute((key, value));
                        added = true;
                    } else {
                        elem.extend_attributes([attr]);
                    }
                }
                if !added {
                    elem.push_attribute((key, value));
                }
                writer.write_event(Event::Start(elem)).map_err(write_err)?;
            }
            Ok(Event::Eof) => break,
            Ok(e) => writer.write_event(e).map_err(write_err)?,
            Err(e) => {
                error!("Error at position {}: {:?}", reader.buffer_position(), e);
                return Err(Error::Decoding(format!("XMP read: {e}")));
            }
        }
        buf.clear();
    }
    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|_e| Error::Encoding("XMP is not UTF-8".to_string()))
}

/// extract the dcterms:provenance value from xmp
pub fn extract_provenance(xmp: &str) -> Option<String> {
    extract_xmp_key(xmp, "dcterms:provenance")
}

/// add or replace a dcterms:provenance value to xmp, including the dcterms
/// namespace if needed
pub fn add_provenance(xmp: &str, provenance: &str) -> Result<String> {
    let xmp = add_xmp_key(xmp, "xmlns:dcterms", "http://purl.org/dc/terms/")?;
    add_xmp_key(&xmp, "dcterms:provenance", provenance)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const XMP_DATA: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
    <x:xmpmeta xmlns:x="adobe:ns:meta/" x:xmptk="contentauth">
        <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
            <rdf:Description rdf:about=""
                    xmlns:xmpMM="http://ns.adobe.com/xap/1.0/mm/"
                    xmlns:dcterms="http://purl.org/dc/terms/"
                xmpMM:DocumentID="xmp.did:cb9f5498-bb58-4572-8043-8c369e6bfb9b"
                xmpMM:InstanceID="xmp.iid:cb9f5498-bb58-4572-8043-8c369e6bfb9b"
                dcterms:provenance="https://example.com/manifests/1.c2pa">
            </rdf:Description>
        </rdf:RDF>
    </x:xmpmeta>"#;

    const PROVENANCE: &str = "https://example.com/manifests/2.c2pa";

    #[test]
    fn read_xmp() {
        assert_eq!(
            extract_provenance(XMP_DATA),
            Some("https://example.com/manifests/1.c2pa".to_owned())
        );
        assert_eq!(
            extract_xmp_key(XMP_DATA, "xmpMM:InstanceID"),
            Some("xmp.iid:cb9f5498-bb58-4572-8043-8c369e6bfb9b".to_owned())
        );
        assert_eq!(extract_xmp_key(XMP_DATA, "unicorn"), None);
        assert_eq!(extract_xmp_key("bad xmp", "unicorn"), None);
    }

    #[test]
    fn add_xmp() {
        let xmp = add_provenance(XMP_DATA, PROVENANCE).unwrap();
        assert_eq!(extract_provenance(&xmp), Some(PROVENANCE.to_string()));
        // other values survive
        assert_eq!(
            extract_xmp_key(&xmp, "xmpMM:DocumentID"),
            Some("xmp.did:cb9f5498-bb58-4572-8043-8c369e6bfb9b".to_owned())
        );

        let xmp = add_provenance(MIN_XMP, PROVENANCE).unwrap();
        assert_eq!(extract_provenance(&xmp), Some(PROVENANCE.to_string()));
    }
}
