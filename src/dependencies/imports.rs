// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Python import scanning
//!
//! Custom node packs ship Python source. The top-level module of every
//! literal `import` / `from ... import` statement is collected and mapped to
//! the name it is installed under.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Import names whose distribution is published under another name
const DISTRIBUTION_NAMES: &[(&str, &str)] = &[
    ("PIL", "pillow"),
    ("cv2", "opencv-python"),
    ("sklearn", "scikit-learn"),
    ("skimage", "scikit-image"),
    ("yaml", "pyyaml"),
    ("bs4", "beautifulsoup4"),
    ("dateutil", "python-dateutil"),
    ("dotenv", "python-dotenv"),
    ("git", "GitPython"),
    ("Crypto", "pycryptodome"),
    ("fitz", "PyMuPDF"),
    ("jwt", "PyJWT"),
    ("magic", "python-magic"),
    ("docx", "python-docx"),
    ("serial", "pyserial"),
    ("zmq", "pyzmq"),
    ("OpenGL", "PyOpenGL"),
    ("attr", "attrs"),
    ("segment_anything", "segment-anything"),
];

/// Distribution name for a top-level import
pub fn distribution_name(module: &str) -> &str {
    DISTRIBUTION_NAMES
        .iter()
        .find(|(import, _)| *import == module)
        .map_or(module, |(_, dist)| *dist)
}

fn import_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?m)^[ \t]*(?:from[ \t]+([A-Za-z_][\w.]*)[ \t]+import\b|import[ \t]+([^\n#;]+))")
                .ok()
        })
        .as_ref()
}

/// Distribution names for every module imported by `code`
///
/// Relative imports are skipped. Names not in the alias table pass through.
pub fn python_imports_from_source(code: &str) -> BTreeSet<String> {
    let mut packages = BTreeSet::new();
    let Some(pattern) = import_pattern() else {
        return packages;
    };

    for caps in pattern.captures_iter(code) {
        let modules: Vec<&str> = match (caps.get(1), caps.get(2)) {
            (Some(from), _) => vec![from.as_str()],
            (None, Some(list)) => list
                .as_str()
                .trim_end_matches('\\')
                .trim_matches(|c: char| c.is_whitespace() || c == '(' || c == ')')
                .split(',')
                .filter_map(|item| item.split_whitespace().next())
                .collect(),
            _ => continue,
        };

        for module in modules {
            if let Some(top) = module.split('.').next().filter(|m| !m.is_empty()) {
                packages.insert(distribution_name(top).to_string());
            }
        }
    }

    packages
}
