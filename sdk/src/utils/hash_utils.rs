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
    io::SeekFrom,
    ops::RangeInclusive,
};

use range_set::RangeSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::{asset_io::CAIRead, Error, Result};

// read buffer used while hashing streams
const HASH_BUF_SIZE: usize = 64 * 1024;

/// A byte range of an asset that is left out of its data hash.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct HashRange {
    start: u64,
    length: u64,
}

impl HashRange {
    pub fn new(start: u64, length: u64) -> Self {
        HashRange { start, length }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn set_start(&mut self, start: u64) {
        self.start = start;
    }

    pub fn set_length(&mut self, length: u64) {
        self.length = length;
    }
}

#[derive(Clone)]
enum Hasher {
    SHA256(Sha256),
    SHA384(Sha384),
    SHA512(Sha512),
}

impl Hasher {
    fn new(alg: &str) -> Option<Self> {
        match alg {
            "sha256" => Some(Hasher::SHA256(Sha256::new())),
            "sha384" => Some(Hasher::SHA384(Sha384::new())),
            "sha512" => Some(Hasher::SHA512(Sha512::new())),
            _ => None,
        }
    }

    // update hash value with new data
    fn update(&mut self, data: &[u8]) {
        use Hasher::*;
        match self {
            SHA256(ref mut d) => d.update(data),
            SHA384(ref mut d) => d.update(data),
            SHA512(ref mut d) => d.update(data),
        }
    }

    // consume hasher and return the final digest
    fn finalize(self) -> Vec<u8> {
        use Hasher::*;
        match self {
            SHA256(d) => d.finalize().to_vec(),
            SHA384(d) => d.finalize().to_vec(),
            SHA512(d) => d.finalize().to_vec(),
        }
    }
}

/// Returns the digest of `data`, or `None` for an unknown algorithm.
pub fn hash_by_alg(alg: &str, data: &[u8]) -> Option<Vec<u8>> {
    let mut hasher = Hasher::new(alg)?;
    hasher.update(data);
    Some(hasher.finalize())
}

/// Hashes a stream with the named algorithm, skipping the excluded ranges.
pub fn hash_stream_by_alg(
    alg: &str,
    data: &mut dyn CAIRead,
    exclusions: Option<Vec<HashRange>>,
) -> Result<Vec<u8>> {
    let mut hasher = Hasher::new(alg)
        .ok_or_else(|| Error::NotSupported(format!("hash algorithm {alg}")))?;

    let data_len = data.seek(SeekFrom::End(0))?;
    data.seek(SeekFrom::Start(0))?;

    if data_len == 0 {
        return Ok(hasher.finalize());
    }

    let mut ranges = RangeSet::<[RangeInclusive<u64>; 1]>::from(0..=data_len - 1);
    if let Some(mut e) = exclusions {
        e.sort_by_key(|a| a.start());
        for exclusion in e.iter().filter(|e| e.length() > 0) {
            let end = exclusion
                .start()
                .checked_add(exclusion.length())
                .filter(|end| *end <= data_len)
                .ok_or_else(|| {
                    Error::Assertion("the exclusion range exceeds the data length".to_string())
                })?;
            ranges.remove_range(exclusion.start()..=end - 1);
        }
    }

    let mut buf = vec![0u8; HASH_BUF_SIZE];
    for r in ranges.into_smallvec() {
        let mut chunk_left = r.end() - r.start() + 1;

        data.seek(SeekFrom::Start(*r.start()))?;

        while chunk_left > 0 {
            let len = std::cmp::min(chunk_left, HASH_BUF_SIZE as u64) as usize;
            data.read_exact(&mut buf[..len])?;
            hasher.update(&buf[..len]);
            chunk_left -= len as u64;
        }
    }

    Ok(hasher.finalize())
}

/// Returns true when the stream hashes to `hash`.
pub fn verify_stream_by_alg(
    alg: &str,
    hash: &[u8],
    data: &mut dyn CAIRead,
    exclusions: Option<Vec<HashRange>>,
) -> bool {
    match hash_stream_by_alg(alg, data, exclusions) {
        Ok(data_hash) => data_hash == hash,
        Err(_) => false,
    }
}

#[cfg(test)]
pub mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_stream_hash_matches_slice_hash() {
        let data: Vec<u8> = (0..200_000u32).map(|v| v as u8).collect();
        let expected = hash_by_alg("sha256", &data).unwrap();
        let actual = hash_stream_by_alg("sha256", &mut Cursor::new(&data), None).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_exclusions() {
        let data = b"0123456789".to_vec();
        let exclusions = vec![HashRange::new(6, 2), HashRange::new(2, 3)];
        let hash = hash_stream_by_alg("sha384", &mut Cursor::new(&data), Some(exclusions.clone()))
            .unwrap();
        assert_eq!(hash, hash_by_alg("sha384", b"01589").unwrap());
        assert!(verify_stream_by_alg(
            "sha384",
            &hash,
            &mut Cursor::new(&data),
            Some(exclusions)
        ));
    }

    #[test]
    fn test_edge_cases() {
        // empty streams and empty exclusions are fine
        let empty: Vec<u8> = Vec::new();
        let hash = hash_stream_by_alg(
            "sha512",
            &mut Cursor::new(&empty),
            Some(vec![HashRange::new(0, 0)]),
        )
        .unwrap();
        assert_eq!(hash, hash_by_alg("sha512", &[]).unwrap());

        let data = b"abc".to_vec();
        let err = hash_stream_by_alg(
            "sha256",
            &mut Cursor::new(&data),
            Some(vec![HashRange::new(2, 5)]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Assertion(_)));

        let err = hash_stream_by_alg("md5", &mut Cursor::new(&data), None).unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert!(hash_by_alg("md5", &data).is_none());
    }
}
