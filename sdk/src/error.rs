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

use c2pa_engine_crypto::{cose::CoseError, raw_signature::RawSignerError};
use thiserror::Error;

/// `Error` enumerates the failures surfaced by every engine operation.
///
/// Each variant carries a human-readable message. Use [`Error::kind`] to
/// match on the failure category without looking at the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("Assertion: {0}")]
    Assertion(String),

    #[error("AssertionNotFound: {0}")]
    AssertionNotFound(String),

    #[error("Decoding: {0}")]
    Decoding(String),

    #[error("Encoding: {0}")]
    Encoding(String),

    #[error("FileNotFound: {0}")]
    FileNotFound(String),

    #[error("Io: {0}")]
    Io(String),

    #[error("Json: {0}")]
    Json(String),

    #[error("Manifest: {0}")]
    Manifest(String),

    #[error("ManifestNotFound: {0}")]
    ManifestNotFound(String),

    #[error("NotSupported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),

    #[error("RemoteManifest: {0}")]
    RemoteManifest(String),

    #[error("ResourceNotFound: {0}")]
    ResourceNotFound(String),

    #[error("Signature: {0}")]
    Signature(String),

    #[error("Verify: {0}")]
    Verify(String),
}

/// The category of an [`Error`], without its message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Assertion,
    AssertionNotFound,
    Decoding,
    Encoding,
    FileNotFound,
    Io,
    Json,
    Manifest,
    ManifestNotFound,
    NotSupported,
    Other,
    RemoteManifest,
    ResourceNotFound,
    Signature,
    Verify,
}

impl ErrorKind {
    /// Returns the name used for this kind in the display form of an error.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assertion => "Assertion",
            Self::AssertionNotFound => "AssertionNotFound",
            Self::Decoding => "Decoding",
            Self::Encoding => "Encoding",
            Self::FileNotFound => "FileNotFound",
            Self::Io => "Io",
            Self::Json => "Json",
            Self::Manifest => "Manifest",
            Self::ManifestNotFound => "ManifestNotFound",
            Self::NotSupported => "NotSupported",
            Self::Other => "Other",
            Self::RemoteManifest => "RemoteManifest",
            Self::ResourceNotFound => "ResourceNotFound",
            Self::Signature => "Signature",
            Self::Verify => "Verify",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Assertion(_) => ErrorKind::Assertion,
            Self::AssertionNotFound(_) => ErrorKind::AssertionNotFound,
            Self::Decoding(_) => ErrorKind::Decoding,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
            Self::Manifest(_) => ErrorKind::Manifest,
            Self::ManifestNotFound(_) => ErrorKind::ManifestNotFound,
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::Other(_) => ErrorKind::Other,
            Self::RemoteManifest(_) => ErrorKind::RemoteManifest,
            Self::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Self::Signature(_) => ErrorKind::Signature,
            Self::Verify(_) => ErrorKind::Verify,
        }
    }

    /// Returns the message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Assertion(m)
            | Self::AssertionNotFound(m)
            | Self::Decoding(m)
            | Self::Encoding(m)
            | Self::FileNotFound(m)
            | Self::Io(m)
            | Self::Json(m)
            | Self::Manifest(m)
            | Self::ManifestNotFound(m)
            | Self::NotSupported(m)
            | Self::Other(m)
            | Self::RemoteManifest(m)
            | Self::ResourceNotFound(m)
            | Self::Signature(m)
            | Self::Verify(m) => m,
        }
    }

    /// Returns the stable error code for this error type.
    pub fn code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Assertion => 100,
            ErrorKind::AssertionNotFound => 101,
            ErrorKind::Decoding => 102,
            ErrorKind::Encoding => 103,
            ErrorKind::FileNotFound => 104,
            ErrorKind::Io => 105,
            ErrorKind::Json => 106,
            ErrorKind::Manifest => 107,
            ErrorKind::ManifestNotFound => 108,
            ErrorKind::NotSupported => 109,
            ErrorKind::Other => 110,
            ErrorKind::RemoteManifest => 111,
            ErrorKind::ResourceNotFound => 112,
            ErrorKind::Signature => 113,
            ErrorKind::Verify => 114,
        }
    }

    /// Builds an error from a kind and a message.
    ///
    /// This is the structured inverse of [`Error::kind`] and
    /// [`Error::message`]; no string parsing is involved.
    pub fn from_kind_and_message<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Assertion => Self::Assertion(message),
            ErrorKind::AssertionNotFound => Self::AssertionNotFound(message),
            ErrorKind::Decoding => Self::Decoding(message),
            ErrorKind::Encoding => Self::Encoding(message),
            ErrorKind::FileNotFound => Self::FileNotFound(message),
            ErrorKind::Io => Self::Io(message),
            ErrorKind::Json => Self::Json(message),
            ErrorKind::Manifest => Self::Manifest(message),
            ErrorKind::ManifestNotFound => Self::ManifestNotFound(message),
            ErrorKind::NotSupported => Self::NotSupported(message),
            ErrorKind::Other => Self::Other(message),
            ErrorKind::RemoteManifest => Self::RemoteManifest(message),
            ErrorKind::ResourceNotFound => Self::ResourceNotFound(message),
            ErrorKind::Signature => Self::Signature(message),
            ErrorKind::Verify => Self::Verify(message),
        }
    }

    /// Returns the error used when a released Reader, Builder or Signer is
    /// used again.
    pub(crate) fn closed(resource: &str) -> Self {
        Self::Other(format!("{resource} is closed"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl<T: fmt::Debug> From<ciborium::de::Error<T>> for Error {
    fn from(err: ciborium::de::Error<T>) -> Self {
        Self::Decoding(format!("{err:?}"))
    }
}

impl<T: fmt::Debug> From<ciborium::ser::Error<T>> for Error {
    fn from(err: ciborium::ser::Error<T>) -> Self {
        Self::Encoding(format!("{err:?}"))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<RawSignerError> for Error {
    fn from(err: RawSignerError) -> Self {
        Self::Signature(err.to_string())
    }
}

impl From<CoseError> for Error {
    fn from(err: CoseError) -> Self {
        match err {
            CoseError::CborParsingError(e) => Self::Decoding(e),
            e => Self::Signature(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<crate::jumbf::boxes::JumbfParseError> for Error {
    fn from(err: crate::jumbf::boxes::JumbfParseError) -> Self {
        Self::Decoding(err.to_string())
    }
}

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
