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
use std::io::SeekFrom;

use byteorder::{BigEndian, ReadBytesExt};
use img_parts::{
    png::{Png, PngChunk},
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

static SUPPORTED_TYPES: [&str; 2] = ["png", "image/png"];

const PNG_ID: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const CAI_CHUNK: [u8; 4] = *b"caBX";
const IMG_HDR: [u8; 4] = *b"IHDR";
const ITXT_CHUNK: [u8; 4] = *b"iTXt";
const XMP_KEY: &str = "XML:com.adobe.xmp";
const PNG_END: [u8; 4] = *b"IEND";
const PNG_HDR_LEN: u64 = 12;

// signature followed by an IEND chunk
const EMPTY_PNG: [u8; 20] = [
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 0, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone, Debug)]
struct PngChunkPos {
    pub start: u64,
    pub length: u32,
    pub name: [u8; 4],
}

impl PngChunkPos {
    pub fn end(&self) -> u64 {
        self.start + self.length as u64 + PNG_HDR_LEN
    }
}

fn invalid_png() -> Error {
    Error::Decoding("could not parse input PNG".to_string())
}

fn get_png_chunk_positions(f: &mut dyn CAIRead) -> Result<Vec<PngChunkPos>> {
    let current_len = f.seek(SeekFrom::End(0))?;
    let mut chunk_positions: Vec<PngChunkPos> = Vec::new();

    // move to beginning of file
    f.seek(SeekFrom::Start(0))?;

    let mut buf4 = [0; 4];
    let mut hdr = [0; 8];

    // check PNG signature
    f.read_exact(&mut hdr).map_err(|_err| invalid_png())?;
    if hdr != PNG_ID {
        return Err(invalid_png());
    }

    loop {
        let current_pos = f.stream_position()?;

        // read the chunk length
        let length = f.read_u32::<BigEndian>().map_err(|_err| invalid_png())?;

        // read the chunk type
        f.read_exact(&mut buf4).map_err(|_err| invalid_png())?;
        let name = buf4;

        // seek past data
        f.seek(SeekFrom::Current(length as i64))
            .map_err(|_err| invalid_png())?;

        // read crc
        f.read_exact(&mut buf4).map_err(|_err| invalid_png())?;

        chunk_positions.push(PngChunkPos {
            start: current_pos,
            length,
            name,
        });

        // should we break the loop
        if name == PNG_END || f.stream_position()? >= current_len {
            break;
        }
    }

    Ok(chunk_positions)
}

fn get_cai_data(f: &mut dyn CAIRead) -> Result<Vec<u8>> {
    let ps = get_png_chunk_positions(f)?;

    if ps.iter().filter(|pcp| pcp.name == CAI_CHUNK).count() > 1 {
        return Err(Error::Decoding(
            "asset contains more than one manifest store".to_string(),
        ));
    }

    let pcp = ps
        .into_iter()
        .find(|pcp| pcp.name == CAI_CHUNK)
        .ok_or_else(|| Error::ManifestNotFound("no JUMBF data found".to_string()))?;

    let length: usize = pcp.length as usize;

    f.seek(SeekFrom::Start(pcp.start + 8))?; // skip ahead from chunk start + length(4) + name(4)

    let mut data: Vec<u8> = vec![0; length];
    f.read_exact(&mut data[..]).map_err(|_err| invalid_png())?;

    Ok(data)
}

fn read_string(asset_reader: &mut dyn CAIRead, max_read: u32) -> Result<String> {
    let mut bytes_read: u32 = 0;
    let mut s: Vec<u8> = Vec::with_capacity(80);

    loop {
        let c = asset_reader.read_u8()?;
        if c == 0 {
            break;
        }

        s.push(c);

        bytes_read += 1;

        if bytes_read == max_read {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&s).to_string())
}

// Reads an uncompressed XMP iTXt chunk, returning None for any other chunk.
fn read_xmp_chunk(asset_reader: &mut dyn CAIRead, pcp: &PngChunkPos) -> Option<String> {
    // move +8 to get past header
    asset_reader.seek(SeekFrom::Start(pcp.start + 8)).ok()?;

    let key = read_string(asset_reader, pcp.length).ok()?;
    if key != XMP_KEY {
        return None;
    }

    let compressed = asset_reader.read_u8().ok()? != 0;
    let _compression_method = asset_reader.read_u8().ok()?;
    let langtag = read_string(asset_reader, pcp.length).ok()?;
    let transkey = read_string(asset_reader, pcp.length).ok()?;

    // compressed XMP is not written by anything we support
    if compressed {
        return None;
    }

    // data len - key - lang - transkey - 3 terminators - compressed flag - method
    let data_len = (pcp.length as usize)
        .checked_sub(key.len() + langtag.len() + transkey.len() + 5)?;
    let mut data = vec![0u8; data_len];
    asset_reader.read_exact(&mut data).ok()?;

    Some(String::from_utf8_lossy(&data).to_string())
}

fn is_xmp_chunk(chunk: &PngChunk) -> bool {
    chunk.kind() == ITXT_CHUNK && chunk.contents().starts_with(XMP_KEY.as_bytes())
}

fn read_png(asset_reader: &mut dyn CAIRead) -> Result<Png> {
    let mut buf: Vec<u8> = Vec::new();
    asset_reader.seek(SeekFrom::Start(0))?;
    asset_reader.read_to_end(&mut buf)?;

    Png::from_bytes(buf.into()).map_err(|_err| invalid_png())
}

fn write_png(png: Png, output_stream: &mut dyn CAIReadWrite) -> Result<()> {
    output_stream.seek(SeekFrom::Start(0))?;
    png.encoder()
        .write_to(output_stream)
        .map_err(|err| Error::Io(format!("PNG write error: {err}")))?;
    Ok(())
}

// new chunks go right after the image header
fn insert_index(png: &Png) -> Result<usize> {
    png.chunks()
        .iter()
        .position(|c| c.kind() == IMG_HDR)
        .map(|i| i + 1)
        .ok_or_else(|| Error::Decoding("PNG has no image header".to_string()))
}

// Serializes a single chunk, with length and CRC.
fn chunk_bytes(kind: [u8; 4], data: &[u8]) -> Result<Vec<u8>> {
    let mut png = Png::from_bytes(Bytes::from_static(&EMPTY_PNG)).map_err(|_err| invalid_png())?;
    png.chunks_mut()
        .insert(0, PngChunk::new(kind, Bytes::copy_from_slice(data)));

    let mut out = Vec::with_capacity(EMPTY_PNG.len() + data.len() + PNG_HDR_LEN as usize);
    png.encoder()
        .write_to(&mut out)
        .map_err(|err| Error::Io(format!("PNG write error: {err}")))?;

    let end = PNG_ID.len() + data.len() + PNG_HDR_LEN as usize;
    Ok(out[PNG_ID.len()..end].to_vec())
}

pub struct PngIO {}

impl CAIReader for PngIO {
    fn read_cai(&self, asset_reader: &mut dyn CAIRead) -> Result<Vec<u8>> {
        get_cai_data(asset_reader)
    }

    // Get XMP block
    fn read_xmp(&self, asset_reader: &mut dyn CAIRead) -> Option<String> {
        let ps = get_png_chunk_positions(asset_reader).ok()?;

        ps.iter()
            .filter(|pcp| pcp.name == ITXT_CHUNK)
            .find_map(|pcp| read_xmp_chunk(asset_reader, pcp))
    }
}

impl CAIWriter for PngIO {
    fn write_cai(
        &self,
        input_stream: &mut dyn CAIRead,
        output_stream: &mut dyn CAIReadWrite,
        store_bytes: &[u8],
    ) -> Result<()> {
        let mut png = read_png(input_stream)?;

        png.chunks_mut().retain(|c| c.kind() != CAI_CHUNK);

        let index = insert_index(&png)?;
        png.chunks_mut().insert(
            index,
            PngChunk::new(CAI_CHUNK, Bytes::copy_from_slice(store_bytes)),
        );

        write_png(png, output_stream)
    }

    fn get_object_locations_from_stream(
        &self,
        input_stream: &mut dyn CAIRead,
    ) -> Result<Vec<HashObjectPositions>> {
        let ps = get_png_chunk_positions(input_stream)?;

        let mut positions: Vec<HashObjectPositions> = vec![HashObjectPositions {
            offset: 0,
            length: PNG_ID.len(),
            htype: HashBlockObjectType::Other,
        }];

        for pcp in ps {
            let htype = if pcp.name == CAI_CHUNK {
                HashBlockObjectType::Cai
            } else if pcp.name == ITXT_CHUNK && read_xmp_chunk(input_stream, &pcp).is_some() {
                HashBlockObjectType::Xmp
            } else {
                HashBlockObjectType::Other
            };

            positions.push(HashObjectPositions {
                offset: pcp.start as usize,
                length: (pcp.end() - pcp.start) as usize,
                htype,
            });
        }

        Ok(positions)
    }
}

impl RemoteRefEmbed for PngIO {
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

                // keyword, compression flag, method, empty language and translated keyword
                let mut data = Vec::with_capacity(XMP_KEY.len() + xmp.len() + 5);
                data.extend_from_slice(XMP_KEY.as_bytes());
                data.extend_from_slice(&[0, 0, 0, 0, 0]);
                data.extend_from_slice(xmp.as_bytes());

                let mut png = read_png(source_stream)?;
                png.chunks_mut().retain(|c| !is_xmp_chunk(c));
                let index = insert_index(&png)?;
                png.chunks_mut()
                    .insert(index, PngChunk::new(ITXT_CHUNK, Bytes::from(data)));

                write_png(png, output_stream)
            }
        }
    }
}

impl ComposedManifestRef for PngIO {
    fn compose_manifest(&self, manifest_data: &[u8], _format: &str) -> Result<Vec<u8>> {
        chunk_bytes(CAI_CHUNK, manifest_data)
    }
}

impl AssetIO for PngIO {
    fn new(_asset_type: &str) -> Self {
        PngIO {}
    }

    fn get_handler(&self, asset_type: &str) -> Box<dyn AssetIO> {
        Box::new(PngIO::new(asset_type))
    }

    fn get_reader(&self) -> &dyn CAIReader {
        self
    }

    fn get_writer(&self, asset_type: &str) -> Option<Box<dyn CAIWriter>> {
        Some(Box::new(PngIO::new(asset_type)))
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

    use super::*;
    use crate::{
        utils::{test::TEST_PNG, xmp_inmemory_utils::extract_provenance},
        ErrorKind,
    };

    #[test]
    fn test_png_parse() {
        let positions = get_png_chunk_positions(&mut Cursor::new(TEST_PNG)).unwrap();
        let names: Vec<[u8; 4]> = positions.iter().map(|p| p.name).collect();
        assert_eq!(names, vec![*b"IHDR", *b"IDAT", *b"IEND"]);

        // chunks tile the file after the signature
        assert_eq!(positions[0].start, 8);
        assert_eq!(positions[0].end(), positions[1].start);
        assert_eq!(positions[2].end(), TEST_PNG.len() as u64);
    }

    #[test]
    fn test_no_manifest() {
        let png_io = PngIO {};
        let err = png_io.read_cai(&mut Cursor::new(TEST_PNG)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManifestNotFound);

        let err = png_io
            .read_cai(&mut Cursor::new(b"\x89PNX....".to_vec()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    #[test]
    fn test_write_read_remove() {
        let png_io = PngIO {};
        let store = vec![7u8; 2000];

        let mut output = Cursor::new(Vec::new());
        png_io
            .write_cai(&mut Cursor::new(TEST_PNG), &mut output, &store)
            .unwrap();
        assert_eq!(png_io.read_cai(&mut output).unwrap(), store);

        let positions = png_io.get_object_locations_from_stream(&mut output).unwrap();
        let cai = positions
            .iter()
            .find(|p| p.htype == HashBlockObjectType::Cai)
            .unwrap();
        assert_eq!(cai.length, store.len() + 12);

        // the composed chunk is byte for byte what was inserted
        let composed = png_io.compose_manifest(&store, "png").unwrap();
        assert_eq!(
            &output.get_ref()[cai.offset..cai.offset + cai.length],
            composed.as_slice()
        );
    }

    #[test]
    fn test_png_xmp() {
        let png_io = PngIO {};
        assert!(png_io.read_xmp(&mut Cursor::new(TEST_PNG)).is_none());

        let mut output = Cursor::new(Vec::new());
        png_io
            .embed_reference_to_stream(
                &mut Cursor::new(TEST_PNG),
                &mut output,
                RemoteRefEmbedType::Xmp("https://example.com/remote.c2pa".to_owned()),
            )
            .unwrap();

        let xmp = png_io.read_xmp(&mut output).unwrap();
        assert_eq!(
            extract_provenance(&xmp).as_deref(),
            Some("https://example.com/remote.c2pa")
        );

        let positions = png_io.get_object_locations_from_stream(&mut output).unwrap();
        assert!(positions.iter().any(|p| p.htype == HashBlockObjectType::Xmp));
    }
}
