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

//! Labels for the assertions the engine reads and writes.

/// Label prefix for a data hash assertion.
pub const DATA_HASH: &str = "c2pa.hash.data";

/// Label prefix for a claim thumbnail assertion.
pub const CLAIM_THUMBNAIL: &str = "c2pa.thumbnail.claim";

/// Label prefix for an ingredient assertion.
pub const INGREDIENT: &str = "c2pa.ingredient";

/// Returns the claim thumbnail label for an image format, e.g.
/// `c2pa.thumbnail.claim.jpeg`.
pub fn claim_thumbnail(format: &str) -> String {
    let image_type = match crate::utils::mime::format_to_extension(format) {
        Some("jpg") => "jpeg",
        Some(ext) => ext,
        None => format.rsplit('/').next().unwrap_or(format),
    };
    format!("{CLAIM_THUMBNAIL}.{image_type}")
}

/// Strips an instance suffix (`__1`, `__2`...) from a label.
pub fn base(label: &str) -> &str {
    match label.rsplit_once("__") {
        Some((base, n)) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => base,
        _ => label,
    }
}
