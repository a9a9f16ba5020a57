//! Filename handling for uploads: allow-list validation, sanitization, and
//! content hashing. Sanitized names are opaque display strings; the storage
//! path is derived separately and never from the raw client name.

use sha2::{Digest, Sha256};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const MAX_FILENAME_BYTES: usize = 255;
const FALLBACK_STEM: &str = "unnamed_file";

/// Lowercased extension without the dot, if the name has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, suffix) = split_suffix(basename(filename));
    if suffix.is_empty() {
        None
    } else {
        Some(suffix[1..].to_lowercase())
    }
}

pub fn extension_allowed(filename: &str) -> bool {
    match file_extension(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Sanitize a client-supplied filename into a safe display string.
///
/// Takes the basename only, lowercases the extension, replaces anything
/// outside alphanumerics, `_`, `-`, and whitespace with `_`, collapses
/// whitespace/underscore runs into a single `_`, trims edge underscores, and
/// caps the result at 255 bytes, cutting on a character boundary. Empty
/// input becomes `unnamed_file`. Applying it twice yields the same string.
pub fn sanitize_filename(filename: &str) -> String {
    if filename.is_empty() {
        return FALLBACK_STEM.to_string();
    }

    let name = basename(filename);
    let (stem, suffix) = split_suffix(name);
    let suffix = suffix.to_lowercase();

    let stem = stem.replace("..", "");
    let mut replaced = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
            replaced.push(c);
        } else {
            replaced.push('_');
        }
    }

    let mut collapsed = String::with_capacity(replaced.len());
    let mut in_run = false;
    for c in replaced.chars() {
        if c.is_whitespace() || c == '_' {
            if !in_run {
                collapsed.push('_');
            }
            in_run = true;
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    let mut stem = collapsed.trim_matches('_');
    if stem.is_empty() {
        stem = FALLBACK_STEM;
    }

    if stem.len() + suffix.len() > MAX_FILENAME_BYTES {
        let mut keep = MAX_FILENAME_BYTES.saturating_sub(suffix.len()).min(stem.len());
        while !stem.is_char_boundary(keep) {
            keep -= 1;
        }
        return format!("{}{}", stem[..keep].trim_end_matches('_'), suffix);
    }

    format!("{stem}{suffix}")
}

/// Hex SHA-256 digest of the file contents, used for content-addressed
/// storage paths.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Content type for the raw-file endpoint, inferred from the stored path's
/// extension. Only the upload-allowed extensions map to an image type;
/// anything else is served as an opaque byte stream.
pub fn media_type_for(path: &str) -> &'static str {
    match file_extension(path).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Split `name` into stem and suffix (with leading dot). Dotfiles and names
/// with a trailing dot have no suffix, matching common path semantics.
pub(crate) fn split_suffix(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_accepts_only_image_extensions() {
        assert!(extension_allowed("photo.jpg"));
        assert!(extension_allowed("photo.JPEG"));
        assert!(extension_allowed("photo.png"));
        assert!(extension_allowed("photo.webp"));
        assert!(!extension_allowed("malware.exe"));
        assert!(!extension_allowed("archive.tar.gz"));
        assert!(!extension_allowed("no_extension"));
        assert!(!extension_allowed(""));
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\x\\photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("dir/sub/cat.PNG"), "cat.png");
    }

    #[test]
    fn sanitize_replaces_and_collapses_special_characters() {
        assert_eq!(sanitize_filename("my photo!@#$.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_filename("a   b___c.png"), "a_b_c.png");
        assert_eq!(sanitize_filename("__edge__.webp"), "edge.webp");
        assert_eq!(sanitize_filename("keep-dash_ok.jpg"), "keep-dash_ok.jpg");
    }

    #[test]
    fn sanitize_handles_empty_and_degenerate_names() {
        assert_eq!(sanitize_filename(""), "unnamed_file");
        assert_eq!(sanitize_filename("!!!.jpg"), "unnamed_file.jpg");
        assert_eq!(sanitize_filename("..."), "unnamed_file");
    }

    #[test]
    fn sanitize_truncates_long_names_preserving_extension() {
        let long = format!("{}.jpg", "a".repeat(300));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.ends_with(".jpg"));
    }

    #[test]
    fn sanitize_truncation_counts_bytes_and_cuts_on_char_boundaries() {
        // 120 three-byte characters blow the limit in bytes, not in chars.
        let long = format!("{}.jpg", "画".repeat(120));
        let sanitized = sanitize_filename(&long);
        assert!(sanitized.len() <= 255);
        assert!(sanitized.ends_with(".jpg"));
        // Nothing was cut mid-sequence; every kept character survived whole.
        assert!(sanitized.trim_end_matches(".jpg").chars().all(|c| c == '画'));
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in [
            "my photo!@#$.jpg",
            "../../etc/passwd",
            "normal_name.png",
            "a   b___c.png",
            "__edge__.webp",
            "",
            &format!("{}.jpg", "x y".repeat(200)),
            &format!("{}.jpg", "画".repeat(120)),
        ] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once, "input {name:?}");
        }
    }

    #[test]
    fn content_hash_is_stable_hex_sha256() {
        let first = content_hash(b"test content");
        let second = content_hash(b"test content");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, content_hash(b"other content"));
    }

    #[test]
    fn media_types_follow_the_extension_map() {
        assert_eq!(media_type_for("2025/08/25/ab_cat.jpg"), "image/jpeg");
        assert_eq!(media_type_for("x.jpeg"), "image/jpeg");
        assert_eq!(media_type_for("x.png"), "image/png");
        assert_eq!(media_type_for("x.webp"), "image/webp");
        // Extensions outside the upload allow-list fall back to opaque bytes.
        assert_eq!(media_type_for("x.gif"), "application/octet-stream");
        assert_eq!(media_type_for("x.unknown"), "application/octet-stream");
        assert_eq!(media_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn dotfiles_have_no_suffix() {
        assert_eq!(split_suffix(".bashrc"), (".bashrc", ""));
        assert_eq!(split_suffix("trailing."), ("trailing.", ""));
        assert_eq!(split_suffix("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_suffix("file.tar.gz"), ("file.tar", ".gz"));
    }
}
