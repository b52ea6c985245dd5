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
use std::io::{Cursor, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use img_parts::{
    jpeg::{markers, Jpeg, JpegSegment},
    Bytes,
};

use crate::{
    asset_io::{
        AssetIO, CAIRead, CAIReadWrite, CAIReader, CAIWriter, ComposedManifestRef,
        HashBlockObjectType, HashObjectPositions, RemoteRefEmbed, RemoteRefEmbedType,
    },
    error::{Error, Result},
    utils::xmp_inmemory_utils::{add_provenance, MIN_XMP},
};

static SUPPORTED_TYPES: [&str; 3] = ["jpg", "jpeg", "image/jpeg"];

const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/";
const XMP_SIGNATURE_BUFFER_SIZE: usize = XMP_SIGNATURE.len() + 1; // skip null or space char at end

const MAX_JPEG_MARKER_SIZE: usize = 64000; // technically it's 64K but a bit smaller is fine

const C2PA_MARKER: [u8; 4] = [0x63, 0x32, 0x70, 0x61];

// JPEG XT header: CI "JP", En, Z
const JPEG_XT_CI: [u8; 2] = [0x4A, 0x50];
const JPEG_XT_EN: [u8; 2] = [0x02, 0x11];

fn extract_xmp(seg: &JpegSegment) -> Option<String> {
    let contents = seg.contents();
    if contents.starts_with(XMP_SIGNATURE) && contents.len() >= XMP_SIGNATURE_BUFFER_SIZE {
        let rest = contents.slice(XMP_SIGNATURE_BUFFER_SIZE..);
        String::from_utf8(rest.to_vec()).ok()
    } else {
        None
    }
}

fn read_jpeg(asset_reader: &mut dyn CAIRead) -> Result<Jpeg> {
    let mut buf: Vec<u8> = Vec::new();
    asset_reader.seek(SeekFrom::Start(0))?;
    asset_reader.read_to_end(&mut buf)?;

    Jpeg::from_bytes(buf.into())
        .map_err(|_err| Error::Decoding("could not parse input JPEG".to_owned()))
}

fn write_jpeg(jpeg: Jpeg, output_stream: &mut dyn CAIReadWrite) -> Result<()> {
    output_stream.seek(SeekFrom::Start(0))?;
    jpeg.encoder()
        .write_to(output_stream)
        .map_err(|err| Error::Io(format!("JPEG write error: {err}")))?;
    Ok(())
}

// (En, Z) of a JPEG XT APP11 segment
fn jpeg_xt_header(raw_bytes: &[u8]) -> Result<([u8; 2], u32)> {
    let en = [raw_bytes[2], raw_bytes[3]];
    let z = Cursor::new(&raw_bytes[4..8]).read_u32::<BigEndian>()?;
    Ok((en, z))
}

fn is_c2pa_box_start(raw_bytes: &[u8]) -> bool {
    // header (8) + jumb box header (8) + jumd box header (8), then the uuid
    raw_bytes.len() > 28 && raw_bytes[24..28] == C2PA_MARKER
}

// all cai specific segments
fn get_cai_segments(jpeg: &Jpeg) -> Result<Vec<usize>> {
    let mut cai_segs: Vec<usize> = Vec::new();
    let mut cai_en: Option<[u8; 2]> = None;

    for (i, segment) in jpeg.segments().iter().enumerate() {
        let raw_bytes = segment.contents();

        // we need at least 16 bytes in each segment for CAI
        if segment.marker() != markers::APP11 || raw_bytes.len() <= 16 {
            continue;
        }

        let (en, _z) = jpeg_xt_header(raw_bytes)?;
        if cai_en == Some(en) {
            cai_segs.push(i);
        } else if is_c2pa_box_start(raw_bytes) {
            cai_segs.push(i);
            cai_en = Some(en);
        }
    }
    Ok(cai_segs)
}

// delete cai segments
fn delete_cai_segments(jpeg: &mut Jpeg) -> Result<()> {
    let cai_segs = get_cai_segments(jpeg)?;
    let jpeg_segs = jpeg.segments_mut();

    for seg in cai_segs.iter().rev() {
        jpeg_segs.remove(*seg);
    }
    Ok(())
}

// Splits a manifest store into APP11 JPEG XT segment payloads.
//
// All segments after the first repeat the LBox and TBox of the store
// (ISO 19566-5).
fn cai_segment_contents(store_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    if store_bytes.len() < 8 {
        return Err(Error::Manifest("manifest store is too short".to_owned()));
    }

    let mut segments = Vec::new();
    for (i, chunk) in store_bytes.chunks(MAX_JPEG_MARKER_SIZE).enumerate() {
        let z = u32::try_from(i + 1)
            .map_err(|_| Error::Manifest("manifest store is too large".to_owned()))?;

        let mut seg_data = Vec::with_capacity(chunk.len() + 16);
        seg_data.extend_from_slice(&JPEG_XT_CI);
        seg_data.extend_from_slice(&JPEG_XT_EN);
        seg_data.write_u32::<BigEndian>(z)?;
        if i > 0 {
            seg_data.extend_from_slice(&store_bytes[..8]);
        }
        seg_data.extend_from_slice(chunk);
        segments.push(seg_data);
    }
    Ok(segments)
}

// index just past any leading APP0 (JFIF) segments
fn first_insert_index(jpeg: &Jpeg) -> usize {
    jpeg.segments()
        .iter()
        .position(|seg| seg.marker() != markers::APP0)
        .unwrap_or(jpeg.segments().len())
}

fn replace_xmp(jpeg: &mut Jpeg, xmp: &str) {
    jpeg.segments_mut()
        .retain(|seg| !(seg.marker() == markers::APP1 && seg.contents().starts_with(XMP_SIGNATURE)));

    let mut contents = Vec::with_capacity(XMP_SIGNATURE_BUFFER_SIZE + xmp.len());
    contents.extend_from_slice(XMP_SIGNATURE);
    contents.push(0);
    contents.extend_from_slice(xmp.as_bytes());

    let index = first_insert_index(jpeg);
    jpeg.segments_mut().insert(
        index,
        JpegSegment::new_with_contents(markers::APP1, Bytes::from(contents)),
    );
}

pub struct JpegIO {}

impl CAIReader for JpegIO {
    fn read_cai(&self, asset_reader: &mut dyn CAIRead) -> Result<Vec<u8>> {
        let jpeg = read_jpeg(asset_reader)?;

        let mut buffer: Vec<u8> = Vec::new();
        let mut manifest_store_cnt = 0;
        let mut cai_en: Option<[u8; 2]> = None;
        let mut cai_seg_cnt: u32 = 0;

        for segment in jpeg.segments_by_marker(markers::APP11) {
            let raw_bytes = segment.contents();
            if raw_bytes.len() <= 16 {
                continue;
            }

            let (en, z) = jpeg_xt_header(raw_bytes)?;

            if cai_seg_cnt > 0 && cai_en == Some(en) {
                // a non contiguous segment with same "en" is a bad set of data
                if z <= cai_seg_cnt {
                    cai_en = None;
                    continue;
                }
                // take out LBox & TBox
                buffer.extend_from_slice(&raw_bytes[16..]);
                cai_seg_cnt += 1;
            } else if is_c2pa_box_start(raw_bytes) {
                if manifest_store_cnt == 1 {
                    return Err(Error::Decoding(
                        "asset contains more than one manifest store".to_owned(),
                    ));
                }

                buffer.extend_from_slice(&raw_bytes[8..]);
                cai_seg_cnt = 1;
                cai_en = Some(en);
                manifest_store_cnt += 1;
            }
        }

        if buffer.is_empty() {
            return Err(Error::ManifestNotFound("no JUMBF data found".to_owned()));
        }

        Ok(buffer)
    }

    fn read_xmp(&self, asset_reader: &mut dyn CAIRead) -> Option<String> {
        let jpeg = read_jpeg(asset_reader).ok()?;
        let xmp: String = jpeg
            .segments_by_marker(markers::APP1)
            .filter_map(extract_xmp)
            .collect();
        if xmp.is_empty() {
            None
        } else {
            Some(xmp)
        }
    }
}

impl CAIWriter for JpegIO {
    fn write_cai(
        &self,
        input_stream: &mut dyn CAIRead,
        output_stream: &mut dyn CAIReadWrite,
        store_bytes: &[u8],
    ) -> Result<()> {
        let mut jpeg = read_jpeg(input_stream)?;

        // remove existing CAI segments
        delete_cai_segments(&mut jpeg)?;

        let index = first_insert_index(&jpeg);
        for (i, seg_data) in cai_segment_contents(store_bytes)?.into_iter().enumerate() {
            let app11_segment = JpegSegment::new_with_contents(markers::APP11, Bytes::from(seg_data));
            jpeg.segments_mut().insert(index + i, app11_segment);
        }

        write_jpeg(jpeg, output_stream)
    }

    fn get_object_locations_from_stream(
        &self,
        input_stream: &mut dyn CAIRead,
    ) -> Result<Vec<HashObjectPositions>> {
        let jpeg = read_jpeg(input_stream)?;
        let cai_segs = get_cai_segments(&jpeg)?;

        let mut positions: Vec<HashObjectPositions> = Vec::new();
        let mut curr_offset = 2; // start after JPEG marker

        for (i, seg) in jpeg.segments().iter().enumerate() {
            let htype = if cai_segs.contains(&i) {
                HashBlockObjectType::Cai
            } else if seg.marker() == markers::APP1 && seg.contents().starts_with(XMP_SIGNATURE) {
                HashBlockObjectType::Xmp
            } else {
                HashBlockObjectType::Other
            };

            positions.push(HashObjectPositions {
                offset: curr_offset,
                length: seg.len_with_entropy(),
                htype,
            });
            curr_offset += seg.len_with_entropy();
        }

        Ok(positions)
    }
}

impl RemoteRefEmbed for JpegIO {
    fn embed_reference_to_stream(
        &self,
        source_stream: &mut dyn CAIRead,
        output_stream: &mut dyn CAIReadWrite,
        embed_ref: RemoteRefEmbedType,
    ) -> Result<()> {
        match embed_ref {
            RemoteRefEmbedType::Xmp(manifest_uri) => {
                let xmp = self
                    .read_xmp(source_stream)
                    .unwrap_or_else(|| MIN_XMP.to_string());
                let xmp = add_provenance(&xmp, &manifest_uri)?;

                let mut jpeg = read_jpeg(source_stream)?;
                replace_xmp(&mut jpeg, &xmp);
                write_jpeg(jpeg, output_stream)
            }
        }
    }
}

impl ComposedManifestRef for JpegIO {
    fn compose_manifest(&self, manifest_data: &[u8], _format: &str) -> Result<Vec<u8>> {
        let mut composed = Vec::with_capacity(manifest_data.len() + 64);
        for seg_data in cai_segment_contents(manifest_data)? {
            // segment length counts its own two bytes
            let len = u16::try_from(seg_data.len() + 2)
                .map_err(|_| Error::Manifest("JPEG segment too large".to_owned()))?;
            composed.push(0xFF);
            composed.push(markers::APP11);
            composed.write_u16::<BigEndian>(len)?;
            composed.extend_from_slice(&seg_data);
        }
        Ok(composed)
    }
}

impl AssetIO for JpegIO {
    fn new(_asset_type: &str) -> Self {
        JpegIO {}
    }

    fn get_handler(&self, asset_type: &str) -> Box<dyn AssetIO> {
        Box::new(JpegIO::new(asset_type))
    }

    fn get_reader(&self) -> &dyn CAIReader {
        self
    }

    fn get_writer(&self, asset_type: &str) -> Option<Box<dyn CAIWriter>> {
        Some(Box::new(JpegIO::new(asset_type)))
    }

    fn supported_types(&self) -> &[&str] {
        &SUPPORTED_TYPES
    }

    fn remote_ref_writer_ref(&self) -> Option<&dyn RemoteRefEmbed> {
        Some(self)
    }

    fn composed_data_ref(&self) -> Option<&dyn ComposedManifestRef> {
        Some(self)
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use img_parts::Bytes;

    use super::*;
    use crate::{
        utils::{test::TEST_JPEG, xmp_inmemory_utils::extract_provenance},
        ErrorKind,
    };

    // a fake store that starts like a C2PA manifest store box
    fn fake_store(len: usize) -> Vec<u8> {
        let mut store = vec![0u8; len];
        store[0..4].copy_from_slice(&(len as u32).to_be_bytes());
        store[4..8].copy_from_slice(b"jumb");
        store[12..16].copy_from_slice(b"jumd");
        store[16..20].copy_from_slice(&C2PA_MARKER);
        for (i, b) in store.iter_mut().enumerate().skip(20) {
            *b = (i % 251) as u8;
        }
        store
    }

    #[test]
    fn test_extract_xmp() {
        let contents = Bytes::from_static(b"http://ns.adobe.com/xap/1.0/\0stuff");
        let seg = JpegSegment::new_with_contents(markers::APP1, contents);
        let result = extract_xmp(&seg);
        assert_eq!(result, Some("stuff".to_owned()));

        let contents = Bytes::from_static(b"http://ns.adobe.com/xap/1.0/ stuff");
        let seg = JpegSegment::new_with_contents(markers::APP1, contents);
        let result = extract_xmp(&seg);
        assert_eq!(result, Some("stuff".to_owned()));

        let contents = Bytes::from_static(b"tiny");
        let seg = JpegSegment::new_with_contents(markers::APP1, contents);
        let result = extract_xmp(&seg);
        assert_eq!(result, None);
    }

    #[test]
    fn test_no_manifest() {
        let jpeg_io = JpegIO {};
        let err = jpeg_io.read_cai(&mut Cursor::new(TEST_JPEG)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManifestNotFound);
    }

    #[test]
    fn test_not_a_jpeg() {
        let jpeg_io = JpegIO {};
        let err = jpeg_io
            .read_cai(&mut Cursor::new(b"not a jpeg".to_vec()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    #[test]
    fn test_write_read_multi_segment() {
        let jpeg_io = JpegIO {};
        let store = fake_store(150_000);

        let mut output = Cursor::new(Vec::new());
        jpeg_io
            .write_cai(&mut Cursor::new(TEST_JPEG), &mut output, &store)
            .unwrap();

        let read_back = jpeg_io.read_cai(&mut output).unwrap();
        assert_eq!(read_back, store);

        // three APP11 segments, contiguous, covering the whole store
        let positions = jpeg_io.get_object_locations_from_stream(&mut output).unwrap();
        let cai: Vec<&HashObjectPositions> = positions
            .iter()
            .filter(|p| p.htype == HashBlockObjectType::Cai)
            .collect();
        assert_eq!(cai.len(), 3);
        assert_eq!(cai[0].offset + cai[0].length, cai[1].offset);

        // the composed form is exactly what was inserted
        let composed = jpeg_io.compose_manifest(&store, "jpeg").unwrap();
        let total: usize = cai.iter().map(|p| p.length).sum();
        assert_eq!(composed.len(), total);
        let bytes = output.get_ref();
        assert_eq!(&bytes[cai[0].offset..cai[0].offset + total], composed.as_slice());
    }

    #[test]
    fn test_rewrite_replaces_store() {
        let jpeg_io = JpegIO {};
        let mut first = Cursor::new(Vec::new());
        jpeg_io
            .write_cai(&mut Cursor::new(TEST_JPEG), &mut first, &fake_store(1000))
            .unwrap();

        let second_store = fake_store(500);
        let mut second = Cursor::new(Vec::new());
        jpeg_io
            .write_cai(&mut first, &mut second, &second_store)
            .unwrap();
        assert_eq!(jpeg_io.read_cai(&mut second).unwrap(), second_store);

        // the first store is gone, not shadowed
        let mut fresh = Cursor::new(Vec::new());
        jpeg_io
            .write_cai(&mut Cursor::new(TEST_JPEG), &mut fresh, &second_store)
            .unwrap();
        assert_eq!(fresh.into_inner(), second.into_inner());
    }

    #[test]
    fn test_remote_reference() {
        let jpeg_io = JpegIO {};
        let mut output = Cursor::new(Vec::new());
        jpeg_io
            .embed_reference_to_stream(
                &mut Cursor::new(TEST_JPEG),
                &mut output,
                RemoteRefEmbedType::Xmp("https://example.com/manifest.c2pa".to_owned()),
            )
            .unwrap();

        let xmp = jpeg_io.read_xmp(&mut output).unwrap();
        assert_eq!(
            extract_provenance(&xmp).as_deref(),
            Some("https://example.com/manifest.c2pa")
        );

        let positions = jpeg_io.get_object_locations_from_stream(&mut output).unwrap();
        assert!(positions.iter().any(|p| p.htype == HashBlockObjectType::Xmp));
    }
}
