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

//! JUMBF (ISO/IEC 19566-5) box model, writer and parser.

use std::{
    any::Any,
    fmt,
    io::{Cursor, Read, Result as IoResult, Seek, SeekFrom, Write},
};

use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error;

use crate::jumbf::boxio::ByteCounter;

/// Errors found while parsing JUMBF data.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum JumbfParseError {
    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("invalid box header")]
    InvalidBoxHeader,

    #[error("box extends past the end of its parent")]
    InvalidBoxRange,

    #[error("invalid JUMB box")]
    InvalidJumbBox,

    #[error("expected JUMD box")]
    ExpectedJumdError,

    #[error("invalid JUMD box")]
    InvalidDescriptionBox,

    #[error("invalid embedded file box")]
    InvalidEmbeddedFileBox,

    #[error("JUMBF boxes nested too deeply")]
    NestingTooDeep,

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for JumbfParseError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::IoError(err.to_string()),
        }
    }
}

pub type JumbfParseResult<T> = Result<T, JumbfParseError>;

macro_rules! write_u8 {
    ($w:expr, $n:expr) => {{
        use byteorder::WriteBytesExt;
        $w.write_u8($n)?
    }};
}

macro_rules! write_u32 {
    ($w:expr, $n:expr) => {{
        use byteorder::{BigEndian, WriteBytesExt};
        $w.write_u32::<BigEndian>($n)?;
    }};
}

macro_rules! write_all {
    ($w:expr, $n:expr) => {
        $w.write_all($n)?;
    };
}

/// Size of a box header (32-bit size plus type code).
pub const HEADER_SIZE: u64 = 8;

// deeper nesting than this is never produced by a manifest store
const MAX_NESTING: usize = 16;

fn to_u32_size(size: u64) -> IoResult<u32> {
    u32::try_from(size).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "box too large to write")
    })
}

/// ISO BMFF box.
pub trait BMFFBox: Any {
    /// Box type code.
    fn box_type(&self) -> [u8; 4];

    /// Box size, including the header.
    fn box_size(&self) -> IoResult<u32> {
        to_u32_size(HEADER_SIZE + self.box_payload_size()? as u64)
    }

    /// Payload size of the box.
    fn box_payload_size(&self) -> IoResult<u32> {
        let size = ByteCounter::calculate(|w| self.write_box_payload(w))?;
        to_u32_size(size)
    }

    /// Writes the box to the given writer.
    fn write_box(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_u32!(writer, self.box_size()?);
        write_all!(writer, &self.box_type());
        self.write_box_payload(writer)
    }

    /// Writes the payload of the box to the given writer.
    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()>;

    // Necessary method to enable conversion between types...
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn BMFFBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BMFFBox")
            .field("type", &String::from_utf8_lossy(&self.box_type()))
            .field("size", &self.box_size().ok())
            .finish()
    }
}

// ANCHOR JUMBF UUIDs
pub const JUMBF_JSON_UUID: &str = "6A736F6E00110010800000AA00389B71";
pub const JUMBF_CBOR_UUID: &str = "63626F7200110010800000AA00389B71";
pub const JUMBF_EMBEDDED_FILE_UUID: &str = "40CB0C32BB8A489DA70B2AD6F47F4369";

// C2PA content type UUIDs
pub const CAI_BLOCK_UUID: &str = "6332706100110010800000AA00389B71";
pub const CAI_STORE_UUID: &str = "63326D6100110010800000AA00389B71";
pub const CAI_ASSERTION_STORE_UUID: &str = "6332617300110010800000AA00389B71";
pub const CAI_CLAIM_UUID: &str = "6332636C00110010800000AA00389B71";
pub const CAI_SIGNATURE_UUID: &str = "6332637300110010800000AA00389B71";

// description box toggles
const TOGGLE_REQUESTABLE: u8 = 0x01;
const TOGGLE_LABEL: u8 = 0x02;
const TOGGLE_ID: u8 = 0x04;
const TOGGLE_SIGNATURE: u8 = 0x08;
const TOGGLE_PRIVATE: u8 = 0x10;

fn uuid_bytes(uuid: &str) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    if let Ok(decoded) = hex::decode(uuid) {
        if decoded.len() == 16 {
            bytes.copy_from_slice(&decoded);
        }
    }
    bytes
}

// ANCHOR JUMBF superbox
/// JUMBF superbox (ISO 19566-5:2019, Annex A)
#[derive(Debug)]
pub struct JUMBFSuperBox {
    desc_box: JUMBFDescriptionBox,
    data_boxes: Vec<Box<dyn BMFFBox>>,
}

impl JUMBFSuperBox {
    /// Creates an empty superbox with the given label and content type UUID
    /// (hex encoded).
    pub fn new(box_label: &str, content_uuid: &str) -> Self {
        JUMBFSuperBox {
            desc_box: JUMBFDescriptionBox::new(box_label, content_uuid),
            data_boxes: vec![],
        }
    }

    pub fn from(desc_box: JUMBFDescriptionBox) -> Self {
        JUMBFSuperBox {
            desc_box,
            data_boxes: vec![],
        }
    }

    /// Adds a data box; boxes are written in insertion order.
    pub fn add_data_box(&mut self, b: Box<dyn BMFFBox>) {
        self.data_boxes.push(b);
    }

    pub fn desc_box(&self) -> &JUMBFDescriptionBox {
        &self.desc_box
    }

    pub fn data_box_count(&self) -> usize {
        self.data_boxes.len()
    }

    pub fn data_box(&self, index: usize) -> Option<&dyn BMFFBox> {
        self.data_boxes.get(index).map(|b| b.as_ref())
    }

    fn data_box_as<T: 'static>(&self, index: usize) -> Option<&T> {
        self.data_box(index)?.as_any().downcast_ref::<T>()
    }

    pub fn data_box_as_superbox(&self, index: usize) -> Option<&JUMBFSuperBox> {
        self.data_box_as::<JUMBFSuperBox>(index)
    }

    pub fn data_box_as_json_box(&self, index: usize) -> Option<&JUMBFJSONContentBox> {
        self.data_box_as::<JUMBFJSONContentBox>(index)
    }

    pub fn data_box_as_cbor_box(&self, index: usize) -> Option<&JUMBFCBORContentBox> {
        self.data_box_as::<JUMBFCBORContentBox>(index)
    }

    pub fn data_box_as_embedded_media_type_box(
        &self,
        index: usize,
    ) -> Option<&JUMBFEmbeddedFileDescriptionBox> {
        self.data_box_as::<JUMBFEmbeddedFileDescriptionBox>(index)
    }

    pub fn data_box_as_embedded_file_content_box(
        &self,
        index: usize,
    ) -> Option<&JUMBFEmbeddedFileContentBox> {
        self.data_box_as::<JUMBFEmbeddedFileContentBox>(index)
    }

    /// Returns the child superboxes in order.
    pub fn superboxes(&self) -> impl Iterator<Item = &JUMBFSuperBox> {
        self.data_boxes
            .iter()
            .filter_map(|b| b.as_any().downcast_ref::<JUMBFSuperBox>())
    }

    /// Returns the first child superbox with the given label.
    pub fn find_superbox(&self, label: &str) -> Option<&JUMBFSuperBox> {
        self.superboxes().find(|sb| sb.desc_box.label() == label)
    }

    /// Serializes the whole box, header included.
    pub fn to_bytes(&self) -> IoResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.box_size()? as usize);
        self.write_box(&mut buf)?;
        Ok(buf)
    }

    /// Serializes the description box and data boxes without the superbox
    /// header. Hashed URIs are computed over these bytes.
    pub fn payload_bytes(&self) -> IoResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_box_payload(&mut buf)?;
        Ok(buf)
    }

    /// Parses a superbox occupying the start of `data`.
    pub fn from_slice(data: &[u8]) -> JumbfParseResult<Self> {
        let mut reader = Cursor::new(data);
        BoxReader::read_super_box(&mut reader)
    }
}

impl BMFFBox for JUMBFSuperBox {
    fn box_type(&self) -> [u8; 4] {
        *b"jumb"
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        self.desc_box.write_box(writer)?;
        for b in &self.data_boxes {
            b.write_box(writer)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ANCHOR JUMBF Description box
/// JUMBF Description box (ISO 19566-5:2019, Annex A)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JUMBFDescriptionBox {
    box_uuid: [u8; 16],
    toggles: u8,
    label: Option<String>,
    box_id: Option<u32>,
    signature: Option<[u8; 32]>,
    private: Option<Vec<u8>>,
}

impl JUMBFDescriptionBox {
    /// Makes a requestable description box with a label.
    pub fn new(label: &str, content_uuid: &str) -> Self {
        JUMBFDescriptionBox {
            box_uuid: uuid_bytes(content_uuid),
            toggles: TOGGLE_REQUESTABLE | TOGGLE_LABEL,
            label: Some(label.to_string()),
            box_id: None,
            signature: None,
            private: None,
        }
    }

    /// Returns the label, or an empty string when there is none.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_default()
    }

    /// Returns the content type UUID as upper case hex.
    pub fn uuid(&self) -> String {
        hex::encode_upper(self.box_uuid)
    }

    pub fn toggles(&self) -> u8 {
        self.toggles
    }
}

impl BMFFBox for JUMBFDescriptionBox {
    fn box_type(&self) -> [u8; 4] {
        *b"jumd"
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.box_uuid);
        write_u8!(writer, self.toggles);

        if let Some(label) = &self.label {
            write_all!(writer, label.as_bytes());
            write_u8!(writer, 0);
        }

        if let Some(x) = self.box_id {
            write_u32!(writer, x);
        }

        if let Some(x) = self.signature {
            write_all!(writer, &x);
        }

        if let Some(private) = &self.private {
            write_all!(writer, private);
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ANCHOR JUMBF JSON Content box
/// JUMBF JSON content box (ISO 19566-5:2019, Annex B)
#[derive(Debug, Default)]
pub struct JUMBFJSONContentBox {
    json: Vec<u8>,
}

impl JUMBFJSONContentBox {
    pub fn new(json_in: Vec<u8>) -> Self {
        JUMBFJSONContentBox { json: json_in }
    }

    pub fn json(&self) -> &[u8] {
        &self.json
    }
}

impl BMFFBox for JUMBFJSONContentBox {
    fn box_type(&self) -> [u8; 4] {
        *b"json"
    }

    fn box_payload_size(&self) -> IoResult<u32> {
        to_u32_size(self.json.len() as u64)
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.json);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ANCHOR JUMBF CBOR Content box
/// JUMBF CBOR content box (ISO 19566-5:2019, Annex B)
#[derive(Debug, Default)]
pub struct JUMBFCBORContentBox {
    cbor: Vec<u8>,
}

impl JUMBFCBORContentBox {
    pub fn new(cbor_in: Vec<u8>) -> Self {
        JUMBFCBORContentBox { cbor: cbor_in }
    }

    pub fn cbor(&self) -> &[u8] {
        &self.cbor
    }
}

impl BMFFBox for JUMBFCBORContentBox {
    fn box_type(&self) -> [u8; 4] {
        *b"cbor"
    }

    fn box_payload_size(&self) -> IoResult<u32> {
        to_u32_size(self.cbor.len() as u64)
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.cbor);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Embedded file description box (`bfdb`): media type and optional file name.
#[derive(Debug)]
pub struct JUMBFEmbeddedFileDescriptionBox {
    toggles: u8,
    media_type: String,
    file_name: Option<String>,
}

impl JUMBFEmbeddedFileDescriptionBox {
    pub fn new(media_type: &str, file_name: Option<String>) -> Self {
        JUMBFEmbeddedFileDescriptionBox {
            toggles: if file_name.is_some() { 1 } else { 0 },
            media_type: media_type.to_string(),
            file_name,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

impl BMFFBox for JUMBFEmbeddedFileDescriptionBox {
    fn box_type(&self) -> [u8; 4] {
        *b"bfdb"
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_u8!(writer, self.toggles);
        write_all!(writer, self.media_type.as_bytes());
        write_u8!(writer, 0);
        if let Some(name) = &self.file_name {
            write_all!(writer, name.as_bytes());
            write_u8!(writer, 0);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Embedded file content box (`bidb`).
#[derive(Debug, Default)]
pub struct JUMBFEmbeddedFileContentBox {
    data: Vec<u8>,
}

impl JUMBFEmbeddedFileContentBox {
    // the content box takes ownership of the data!
    pub fn new(data_in: Vec<u8>) -> Self {
        JUMBFEmbeddedFileContentBox { data: data_in }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl BMFFBox for JUMBFEmbeddedFileContentBox {
    fn box_type(&self) -> [u8; 4] {
        *b"bidb"
    }

    fn box_payload_size(&self) -> IoResult<u32> {
        to_u32_size(self.data.len() as u64)
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Any other box (padding, private data), kept verbatim.
#[derive(Debug)]
pub struct JUMBFUnknownBox {
    box_type: [u8; 4],
    data: Vec<u8>,
}

impl JUMBFUnknownBox {
    pub fn new(box_type: [u8; 4], data: Vec<u8>) -> Self {
        JUMBFUnknownBox { box_type, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl BMFFBox for JUMBFUnknownBox {
    fn box_type(&self) -> [u8; 4] {
        self.box_type
    }

    fn box_payload_size(&self) -> IoResult<u32> {
        to_u32_size(self.data.len() as u64)
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An already serialized box, header included, written back byte for byte.
#[derive(Debug)]
pub struct RawBox {
    bytes: Vec<u8>,
}

impl RawBox {
    /// `bytes` must hold one complete box.
    pub fn new(bytes: Vec<u8>) -> Self {
        RawBox { bytes }
    }
}

impl BMFFBox for RawBox {
    fn box_type(&self) -> [u8; 4] {
        let mut t = [0u8; 4];
        if let Some(code) = self.bytes.get(4..8) {
            t.copy_from_slice(code);
        }
        t
    }

    fn box_size(&self) -> IoResult<u32> {
        to_u32_size(self.bytes.len() as u64)
    }

    fn box_payload_size(&self) -> IoResult<u32> {
        to_u32_size(self.bytes.len().saturating_sub(HEADER_SIZE as usize) as u64)
    }

    fn write_box(&self, writer: &mut dyn Write) -> IoResult<()> {
        write_all!(writer, &self.bytes);
        Ok(())
    }

    fn write_box_payload(&self, writer: &mut dyn Write) -> IoResult<()> {
        if let Some(payload) = self.bytes.get(HEADER_SIZE as usize..) {
            write_all!(writer, payload);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

macro_rules! boxtype {
    ($( $name:ident => $value:expr ),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum BoxType {
            $( $name, )*
            UnknownBox(u32),
        }

        impl From<u32> for BoxType {
            fn from(t: u32) -> BoxType {
                match t {
                    $( $value => BoxType::$name, )*
                    _ => BoxType::UnknownBox(t),
                }
            }
        }
    }
}

boxtype! {
    Jumb => 0x6A75_6D62,
    Jumd => 0x6A75_6D64,
    Padding => 0x6672_6565,
    Json => 0x6A73_6F6E,
    Cbor => 0x6362_6F72,
    EmbedMediaDesc => 0x6266_6462,
    EmbedContent => 0x6269_6462
}

/// A parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub name: BoxType,
    pub fourcc: [u8; 4],
    /// Total box size, header included.
    pub size: u64,
    /// Header length: 8, or 16 when a 64-bit size follows the type.
    pub header_len: u64,
}

impl BoxHeader {
    pub fn payload_size(&self) -> u64 {
        self.size - self.header_len
    }
}

/// Reads JUMBF boxes from a seekable stream.
pub struct BoxReader {}

impl BoxReader {
    /// Reads a box header at the current position.
    pub fn read_header<R: Read + Seek + ?Sized>(reader: &mut R) -> JumbfParseResult<BoxHeader> {
        let start = reader.stream_position()?;

        let size = reader.read_u32::<BigEndian>()? as u64;
        let mut fourcc = [0u8; 4];
        reader.read_exact(&mut fourcc)?;
        let name = BoxType::from(u32::from_be_bytes(fourcc));

        let (size, header_len) = match size {
            // box extends to the end of the data
            0 => {
                let end = reader.seek(SeekFrom::End(0))?;
                reader.seek(SeekFrom::Start(start + HEADER_SIZE))?;
                (end - start, HEADER_SIZE)
            }
            1 => {
                let large_size = reader.read_u64::<BigEndian>()?;
                (large_size, HEADER_SIZE + 8)
            }
            s => (s, HEADER_SIZE),
        };

        if size < header_len {
            return Err(JumbfParseError::InvalidBoxHeader);
        }

        Ok(BoxHeader {
            name,
            fourcc,
            size,
            header_len,
        })
    }

    fn read_payload<R: Read + Seek + ?Sized>(
        reader: &mut R,
        len: u64,
    ) -> JumbfParseResult<Vec<u8>> {
        let mut payload = Vec::new();
        reader.take(len).read_to_end(&mut payload)?;
        if (payload.len() as u64) != len {
            return Err(JumbfParseError::UnexpectedEof);
        }
        Ok(payload)
    }

    /// Reads a description box payload of `size` bytes.
    pub fn read_desc_box<R: Read + Seek + ?Sized>(
        reader: &mut R,
        size: u64,
    ) -> JumbfParseResult<JUMBFDescriptionBox> {
        let payload = Self::read_payload(reader, size)?;
        if payload.len() < 17 {
            return Err(JumbfParseError::InvalidDescriptionBox);
        }

        let mut box_uuid = [0u8; 16];
        box_uuid.copy_from_slice(&payload[..16]);
        let toggles = payload[16];
        let mut rest = &payload[17..];

        let label = if toggles & TOGGLE_LABEL != 0 {
            let end = rest
                .iter()
                .position(|b| *b == 0)
                .ok_or(JumbfParseError::InvalidDescriptionBox)?;
            let label = String::from_utf8(rest[..end].to_vec())
                .map_err(|_| JumbfParseError::InvalidDescriptionBox)?;
            rest = &rest[end + 1..];
            Some(label)
        } else {
            None
        };

        let box_id = if toggles & TOGGLE_ID != 0 {
            if rest.len() < 4 {
                return Err(JumbfParseError::InvalidDescriptionBox);
            }
            let id = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
            rest = &rest[4..];
            Some(id)
        } else {
            None
        };

        let signature = if toggles & TOGGLE_SIGNATURE != 0 {
            if rest.len() < 32 {
                return Err(JumbfParseError::InvalidDescriptionBox);
            }
            let mut sig = [0u8; 32];
            sig.copy_from_slice(&rest[..32]);
            rest = &rest[32..];
            Some(sig)
        } else {
            None
        };

        let private = if toggles & TOGGLE_PRIVATE != 0 && !rest.is_empty() {
            Some(rest.to_vec())
        } else {
            None
        };

        Ok(JUMBFDescriptionBox {
            box_uuid,
            toggles,
            label,
            box_id,
            signature,
            private,
        })
    }

    fn read_embedded_media_desc_box(
        payload: Vec<u8>,
    ) -> JumbfParseResult<JUMBFEmbeddedFileDescriptionBox> {
        let (toggles, rest) = payload
            .split_first()
            .ok_or(JumbfParseError::InvalidEmbeddedFileBox)?;

        let mut strings = rest.split(|b| *b == 0);
        let media_type = strings
            .next()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .ok_or(JumbfParseError::InvalidEmbeddedFileBox)?;

        let file_name = if toggles & 1 != 0 {
            strings
                .next()
                .map(|s| String::from_utf8_lossy(s).into_owned())
        } else {
            None
        };

        Ok(JUMBFEmbeddedFileDescriptionBox {
            toggles: *toggles,
            media_type,
            file_name,
        })
    }

    /// Reads a `jumb` superbox and everything inside it.
    pub fn read_super_box<R: Read + Seek + ?Sized>(
        reader: &mut R,
    ) -> JumbfParseResult<JUMBFSuperBox> {
        Self::read_super_box_at_depth(reader, 0)
    }

    fn read_super_box_at_depth<R: Read + Seek + ?Sized>(
        reader: &mut R,
        depth: usize,
    ) -> JumbfParseResult<JUMBFSuperBox> {
        if depth > MAX_NESTING {
            return Err(JumbfParseError::NestingTooDeep);
        }

        let box_start = reader.stream_position()?;
        let header = Self::read_header(reader)?;
        if header.name != BoxType::Jumb {
            return Err(JumbfParseError::InvalidJumbBox);
        }

        let box_end = box_start
            .checked_add(header.size)
            .ok_or(JumbfParseError::InvalidBoxRange)?;
        let stream_len = reader.seek(SeekFrom::End(0))?;
        if box_end > stream_len {
            return Err(JumbfParseError::InvalidBoxRange);
        }
        reader.seek(SeekFrom::Start(box_start + header.header_len))?;

        // the description box always comes first
        let desc_header = Self::read_header(reader)?;
        if desc_header.name != BoxType::Jumd {
            return Err(JumbfParseError::ExpectedJumdError);
        }
        if reader.stream_position()? + desc_header.payload_size() > box_end {
            return Err(JumbfParseError::InvalidBoxRange);
        }
        let desc_box = Self::read_desc_box(reader, desc_header.payload_size())?;

        let mut sbox = JUMBFSuperBox::from(desc_box);

        loop {
            let pos = reader.stream_position()?;
            if pos >= box_end {
                break;
            }

            let header = Self::read_header(reader)?;
            let child_end = pos
                .checked_add(header.size)
                .ok_or(JumbfParseError::InvalidBoxRange)?;
            if child_end > box_end {
                return Err(JumbfParseError::InvalidBoxRange);
            }

            let payload_size = header.payload_size();
            let child: Box<dyn BMFFBox> = match header.name {
                BoxType::Jumb => {
                    reader.seek(SeekFrom::Start(pos))?;
                    Box::new(Self::read_super_box_at_depth(reader, depth + 1)?)
                }
                BoxType::Json => Box::new(JUMBFJSONContentBox::new(Self::read_payload(
                    reader,
                    payload_size,
                )?)),
                BoxType::Cbor => Box::new(JUMBFCBORContentBox::new(Self::read_payload(
                    reader,
                    payload_size,
                )?)),
                BoxType::EmbedMediaDesc => Box::new(Self::read_embedded_media_desc_box(
                    Self::read_payload(reader, payload_size)?,
                )?),
                BoxType::EmbedContent => Box::new(JUMBFEmbeddedFileContentBox::new(
                    Self::read_payload(reader, payload_size)?,
                )),
                _ => Box::new(JUMBFUnknownBox::new(
                    header.fourcc,
                    Self::read_payload(reader, payload_size)?,
                )),
            };
            sbox.add_data_box(child);

            reader.seek(SeekFrom::Start(child_end))?;
        }

        reader.seek(SeekFrom::Start(box_end))?;
        Ok(sbox)
    }
}
