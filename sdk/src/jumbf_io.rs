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
    io::{Cursor, Read, Seek},
    path::Path,
};

use crate::{
    asset_handlers::{c2pa_io::C2paIO, jpeg_io::JpegIO, png_io::PngIO},
    asset_io::{
        AssetIO, CAIRead, CAIReadWrite, CAIReader, CAIWriter, HashObjectPositions,
        RemoteRefEmbedType,
    },
    error::{Error, Result},
    utils::mime::format_to_extension,
};

fn get_handlers() -> Vec<Box<dyn AssetIO>> {
    vec![
        Box::new(C2paIO::new("")),
        Box::new(JpegIO::new("")),
        Box::new(PngIO::new("")),
    ]
}

fn unsupported(format: &str) -> Error {
    Error::NotSupported(format!("format {format} is not supported"))
}

/// Returns the list of extensions and MIME types with a registered handler.
pub fn supported_mime_types() -> Vec<String> {
    let mut types: Vec<String> = get_handlers()
        .iter()
        .flat_map(|h| h.supported_types().iter().map(|t| t.to_string()))
        .collect();
    types.sort();
    types.dedup();
    types
}

pub(crate) fn is_supported_format(format: &str) -> bool {
    get_assetio_handler(format).is_some()
}

pub(crate) fn get_assetio_handler(format: &str) -> Option<Box<dyn AssetIO>> {
    let ext = format_to_extension(format)?;

    get_handlers()
        .into_iter()
        .find(|h| h.supported_types().contains(&ext))
        .map(|h| h.get_handler(ext))
}

pub(crate) fn get_cailoader_handler(format: &str) -> Option<Box<dyn CAIReader>> {
    Some(match format_to_extension(format)? {
        "c2pa" => Box::new(C2paIO {}),
        "jpg" => Box::new(JpegIO {}),
        "png" => Box::new(PngIO {}),
        _ => return None,
    })
}

pub(crate) fn get_caiwriter_handler(format: &str) -> Option<Box<dyn CAIWriter>> {
    get_assetio_handler(format)?.get_writer(format)
}

/// Returns the JUMBF manifest store embedded in `stream`.
pub fn load_jumbf_from_stream(format: &str, stream: &mut dyn CAIRead) -> Result<Vec<u8>> {
    let reader = get_cailoader_handler(format).ok_or_else(|| unsupported(format))?;

    stream.rewind()?;
    let cai_block = reader.read_cai(stream)?;
    if cai_block.is_empty() {
        return Err(Error::ManifestNotFound("no JUMBF data found".to_string()));
    }
    Ok(cai_block)
}

/// Returns the JUMBF manifest store embedded in a byte slice.
pub fn load_jumbf_from_memory(format: &str, data: &[u8]) -> Result<Vec<u8>> {
    load_jumbf_from_stream(format, &mut Cursor::new(data))
}

/// Writes `input` to `output` with its manifest store replaced by `store_bytes`.
pub(crate) fn save_jumbf_to_stream(
    format: &str,
    input: &mut dyn CAIRead,
    output: &mut dyn CAIReadWrite,
    store_bytes: &[u8],
) -> Result<()> {
    let writer = get_caiwriter_handler(format).ok_or_else(|| {
        Error::NotSupported(format!("embedding is not supported for format {format}"))
    })?;

    input.rewind()?;
    writer.write_cai(input, output, store_bytes)
}

pub(crate) fn object_locations_from_stream(
    format: &str,
    stream: &mut dyn CAIRead,
) -> Result<Vec<HashObjectPositions>> {
    let writer = get_caiwriter_handler(format).ok_or_else(|| unsupported(format))?;

    stream.rewind()?;
    writer.get_object_locations_from_stream(stream)
}

/// Writes `input` to `output` with an XMP `dcterms:provenance` entry pointing at `url`.
pub(crate) fn embed_remote_reference(
    format: &str,
    input: &mut dyn CAIRead,
    output: &mut dyn CAIReadWrite,
    url: &str,
) -> Result<()> {
    let handler = get_assetio_handler(format).ok_or_else(|| unsupported(format))?;
    let embedder = handler.remote_ref_writer_ref().ok_or_else(|| {
        Error::NotSupported(format!("remote manifests are not supported for {format}"))
    })?;

    input.rewind()?;
    embedder.embed_reference_to_stream(input, output, RemoteRefEmbedType::Xmp(url.to_string()))
}

/// Wraps a manifest store in the container specific form for `format`.
pub fn compose_manifest(format: &str, manifest_data: &[u8]) -> Result<Vec<u8>> {
    let handler = get_assetio_handler(format).ok_or_else(|| unsupported(format))?;
    let composer = handler.composed_data_ref().ok_or_else(|| {
        Error::NotSupported(format!("composed manifests are not supported for {format}"))
    })?;

    composer.compose_manifest(manifest_data, format)
}

pub(crate) fn format_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    format_to_extension(&ext).map(|e| e.to_string())
}

// Reads a whole stream into memory, leaving it positioned at the start.
pub(crate) fn stream_to_vec<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.rewind()?;
    stream.read_to_end(&mut buf)?;
    stream.rewind()?;
    Ok(buf)
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{
        utils::test::{signed_test_asset, TEST_JPEG, TEST_PNG},
        ErrorKind,
    };

    #[test]
    fn test_get_handlers() {
        assert!(get_assetio_handler("image/jpeg").is_some());
        assert!(get_assetio_handler("PNG").is_some());
        assert!(get_assetio_handler("application/c2pa").is_some());
        assert!(get_assetio_handler("image/tiff").is_none());

        assert!(get_caiwriter_handler("jpg").is_some());
        assert!(get_caiwriter_handler("c2pa").is_none());

        let types = supported_mime_types();
        assert!(types.contains(&"image/jpeg".to_string()));
        assert!(types.contains(&"application/x-c2pa-manifest-store".to_string()));
    }

    #[test]
    fn test_save_load() {
        let store = load_jumbf_from_memory("jpg", &signed_test_asset("jpg")).unwrap();

        for (format, asset) in [("jpg", TEST_JPEG), ("image/png", TEST_PNG)] {
            let mut output = Cursor::new(Vec::new());
            save_jumbf_to_stream(format, &mut Cursor::new(asset), &mut output, &store).unwrap();
            assert_eq!(load_jumbf_from_stream(format, &mut output).unwrap(), store);

            let err = load_jumbf_from_memory(format, asset).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ManifestNotFound);
        }
    }

    #[test]
    fn test_unsupported() {
        let err = load_jumbf_from_memory("image/tiff", TEST_JPEG).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);

        let err = save_jumbf_to_stream(
            "c2pa",
            &mut Cursor::new(TEST_JPEG),
            &mut Cursor::new(Vec::new()),
            b"store",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            format_from_path(Path::new("a/b/test.JPEG")).as_deref(),
            Some("jpg")
        );
        assert_eq!(format_from_path(Path::new("test.tif")), None);
    }
}
