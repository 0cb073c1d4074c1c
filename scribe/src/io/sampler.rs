//! Bounded, deterministic sampling of repository files for README grounding.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::types::FileSample;

pub const DEFAULT_MAX_FILES: usize = 12;
pub const DEFAULT_MAX_BYTES_PER_FILE: usize = 4000;

/// Well-known files checked first, in this order.
pub const PRIORITY_FILES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    "README.md",
    "index.ts",
    "tools.ts",
    "prompts.ts",
    "src/main.rs",
    "src/lib.rs",
    "main.py",
    "bunfig.toml",
    "tsconfig.json",
];

/// Extensions accepted when filling remaining slots from the top-level listing.
pub const SAMPLE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "mjs", "rs", "py", "go", "md", "mdx", "json", "toml", "yaml", "yml",
];

/// Select up to `max_files` files under `root` and return their leading bytes.
///
/// Priority files come first; remaining slots are filled from the sorted,
/// non-hidden top-level files with an accepted extension. Only the leading
/// bytes of each file are read; files that cannot be opened or read are
/// skipped.
#[instrument(skip_all, fields(root = %root.display(), max_files, max_bytes_per_file))]
pub fn sample_project(
    root: &Path,
    max_files: usize,
    max_bytes_per_file: usize,
) -> Result<Vec<FileSample>> {
    let selected = select_files(root, max_files)?;

    let mut samples = Vec::with_capacity(selected.len());
    for rel in selected.iter().take(max_files) {
        let full = root.join(rel);
        let snippet = match read_snippet(&full, max_bytes_per_file) {
            Ok(snippet) => snippet,
            Err(err) => {
                debug!(path = %full.display(), err = %err, "skipping unreadable file");
                continue;
            }
        };
        samples.push(FileSample {
            path: rel.to_string_lossy().replace('\\', "/"),
            snippet,
        });
    }
    debug!(count = samples.len(), "sampled project files");
    Ok(samples)
}

fn select_files(root: &Path, max_files: usize) -> Result<Vec<PathBuf>> {
    let mut selected: Vec<PathBuf> = Vec::new();
    if max_files == 0 {
        return Ok(selected);
    }

    for name in PRIORITY_FILES {
        if fs::metadata(root.join(name)).is_ok_and(|meta| meta.is_file()) {
            selected.push(PathBuf::from(name));
        }
        if selected.len() >= max_files {
            return Ok(selected);
        }
    }

    let mut names: Vec<String> = Vec::new();
    let entries = fs::read_dir(root).with_context(|| format!("read dir {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir entry in {}", root.display()))?;
        let is_file = entry.file_type().is_ok_and(|kind| kind.is_file());
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && !name.starts_with('.') && has_sample_extension(&name) {
            names.push(name);
        }
    }
    names.sort();

    for name in names {
        let candidate = PathBuf::from(name);
        if !selected.contains(&candidate) {
            selected.push(candidate);
        }
        if selected.len() >= max_files {
            break;
        }
    }
    Ok(selected)
}

fn has_sample_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SAMPLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Read at most `max_bytes` from the start of `path` and decode it as text.
///
/// Invalid UTF-8 is replaced rather than rejected; the result never exceeds
/// `max_bytes`.
fn read_snippet(path: &Path, max_bytes: usize) -> io::Result<String> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(max_bytes.min(64 * 1024));
    file.take(max_bytes as u64).read_to_end(&mut head)?;
    let text = String::from_utf8_lossy(&head);
    Ok(truncate_at_char_boundary(&text, max_bytes).to_string())
}

/// Longest prefix of `text` that is at most `max_bytes` long and valid UTF-8.
fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, contents).expect("write");
    }

    fn paths(samples: &[FileSample]) -> Vec<&str> {
        samples.iter().map(|s| s.path.as_str()).collect()
    }

    #[test]
    fn priority_files_precede_listing_in_fixed_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "zeta.ts", "z");
        touch(root, "README.md", "readme");
        touch(root, "alpha.json", "{}");
        touch(root, "package.json", "{}");
        touch(root, "src/main.rs", "fn main() {}");

        let samples = sample_project(root, 12, 4000).expect("sample");
        assert_eq!(
            paths(&samples),
            vec!["package.json", "README.md", "src/main.rs", "alpha.json", "zeta.ts"]
        );
    }

    #[test]
    fn skips_hidden_directories_and_unaccepted_extensions() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, ".env.json", "secret");
        touch(root, "image.png", "png");
        touch(root, "notes.TXT", "txt");
        touch(root, "nested.md/inner.md", "dir named like a file");
        touch(root, "Guide.MD", "guide");

        let samples = sample_project(root, 12, 4000).expect("sample");
        assert_eq!(paths(&samples), vec!["Guide.MD"]);
    }

    #[test]
    fn never_exceeds_file_or_byte_caps() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        for i in 0..20 {
            touch(root, &format!("file{i:02}.ts"), &"é".repeat(100));
        }

        let samples = sample_project(root, 5, 51).expect("sample");
        assert_eq!(samples.len(), 5);
        for sample in &samples {
            assert!(sample.snippet.len() <= 51);
            assert_eq!(sample.snippet.len(), 50, "backs off to a char boundary");
        }
    }

    #[test]
    fn priority_list_alone_can_fill_the_cap() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "package.json", "{}");
        touch(root, "Cargo.toml", "[package]");
        touch(root, "extra.ts", "x");

        let samples = sample_project(root, 2, 4000).expect("sample");
        assert_eq!(paths(&samples), vec!["package.json", "Cargo.toml"]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("README.md"), b"caf\xe9 latin-1 readme").expect("write");
        touch(root, "ok.md", "fine");

        let samples = sample_project(root, 12, 4000).expect("sample");
        assert_eq!(paths(&samples), vec!["README.md", "ok.md"]);
        assert_eq!(samples[0].snippet, "caf\u{fffd} latin-1 readme");
    }

    #[test]
    fn large_files_contribute_only_their_head() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let mut body = "a".repeat(100);
        body.push_str(&"b".repeat(1_000_000));
        touch(root, "big.ts", &body);

        let samples = sample_project(root, 12, 100).expect("sample");
        assert_eq!(samples[0].snippet, "a".repeat(100));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_priority_symlink_is_not_selected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        touch(root, "ok.md", "fine");
        std::os::unix::fs::symlink(root.join("missing"), root.join("package.json"))
            .expect("symlink");

        let samples = sample_project(root, 12, 4000).expect("sample");
        assert_eq!(paths(&samples), vec!["ok.md"]);
    }

    #[test]
    fn zero_cap_returns_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        touch(temp.path(), "README.md", "x");
        assert!(sample_project(temp.path(), 0, 10).expect("sample").is_empty());
    }
}
