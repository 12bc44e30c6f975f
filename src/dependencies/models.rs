// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Model filename checks

/// Whether a model filename is a plain relative path
///
/// Rejects parent-directory segments, absolute paths (either separator)
/// and drive-letter prefixes.
pub fn validate_model_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }

    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return false;
    }

    !path.split(['/', '\\']).any(|segment| segment == "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_escaping_paths() {
        assert!(!validate_model_path("../../etc/passwd"));
        assert!(!validate_model_path("/etc/passwd"));
        assert!(!validate_model_path("C:\\Windows\\x"));
        assert!(!validate_model_path("c:relative"));
        assert!(!validate_model_path("\\\\server\\share\\m.ckpt"));
        assert!(!validate_model_path("loras\\..\\..\\secret"));
        assert!(!validate_model_path(""));
    }

    #[test]
    fn test_accepts_relative_paths() {
        assert!(validate_model_path("models/checkpoints/a.safetensors"));
        assert!(validate_model_path("sd15.safetensors"));
        assert!(validate_model_path("SDXL\\base..v1.safetensors"));
    }
}
