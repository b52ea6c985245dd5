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

/// Converts a format (MIME type or extension) to a canonical extension.
pub fn format_to_extension(format: &str) -> Option<&'static str> {
    Some(match format.to_lowercase().as_str() {
        "jpg" | "jpeg" | "image/jpeg" => "jpg",
        "png" | "image/png" => "png",
        "c2pa" | "application/c2pa" | "application/x-c2pa-manifest-store" => "c2pa",
        _ => return None,
    })
}

/// Converts a format (MIME type or extension) to a MIME type.
pub fn format_to_mime(format: &str) -> Option<&'static str> {
    Some(match format_to_extension(format)? {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/c2pa",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(format_to_extension("JPEG"), Some("jpg"));
        assert_eq!(format_to_extension("image/png"), Some("png"));
        assert_eq!(
            format_to_extension("application/x-c2pa-manifest-store"),
            Some("c2pa")
        );
        assert_eq!(format_to_extension("image/tiff"), None);
        assert_eq!(format_to_mime("jpg"), Some("image/jpeg"));
        assert_eq!(format_to_mime("c2pa"), Some("application/c2pa"));
    }
}
