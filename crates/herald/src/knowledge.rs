//! Aggregates a directory of documents into the knowledge text the persona is built from
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge";

/// Stem of the file that documents the directory itself rather than the person
const RESERVED_STEM: &str = "readme";

#[derive(Debug, Clone, Copy, PartialEq)]
enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    fn for_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "txt" | "md" | "markdown" => Some(DocumentKind::Text),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Concatenate the text of every supported document in `dir`, ordered by filename
///
/// Returns an empty string when the directory is missing or holds nothing usable. Files
/// that cannot be read are skipped.
pub fn load_knowledge_dir(dir: Option<&Path>) -> String {
    let dir = dir.unwrap_or_else(|| Path::new(DEFAULT_KNOWLEDGE_DIR));
    knowledge_files(dir)
        .into_iter()
        .filter_map(|(path, kind)| {
            let text = match read_document(&path, kind) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping knowledge file");
                    return None;
                }
            };
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let filename = path.file_name()?.to_string_lossy().into_owned();
            Some(format!("--- From {} ---\n{}", filename, text))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether `dir` holds at least one supported document
pub fn has_knowledge_files(dir: &Path) -> bool {
    !knowledge_files(dir).is_empty()
}

fn knowledge_files(dir: &Path) -> Vec<(PathBuf, DocumentKind)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<(PathBuf, DocumentKind)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| !is_reserved(path))
        .filter_map(|path| DocumentKind::for_path(&path).map(|kind| (path, kind)))
        .collect();
    files.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
    files
}

fn is_reserved(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case(RESERVED_STEM))
}

fn read_document(path: &Path, kind: DocumentKind) -> anyhow::Result<String> {
    match kind {
        DocumentKind::Text => Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned()),
        DocumentKind::Pdf => read_pdf(path),
    }
}

fn read_pdf(path: &Path) -> anyhow::Result<String> {
    let document = lopdf::Document::load(path)?;
    let pages = document
        .get_pages()
        .into_keys()
        .filter_map(|page| document.extract_text(&[page]).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    Ok(pages.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(load_knowledge_dir(Some(&dir.path().join("nope"))), "");
    }

    #[test]
    fn test_documents_in_filename_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_projects.md"), "# Projects\nNVFlare work\n").unwrap();
        fs::write(dir.path().join("a_bio.txt"), "  Studies at Columbia.  ").unwrap();

        let blob = load_knowledge_dir(Some(dir.path()));
        assert_eq!(
            blob,
            "--- From a_bio.txt ---\nStudies at Columbia.\n\n--- From b_projects.md ---\n# Projects\nNVFlare work"
        );
        assert!(has_knowledge_files(dir.path()));
    }

    #[test]
    fn test_readme_and_unsupported_files_are_excluded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "Put your documents here.").unwrap();
        fs::write(dir.path().join("readme.txt"), "Lowercase readme").unwrap();
        fs::write(dir.path().join("photo.png"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("notes.MARKDOWN"), "Witty and kind.").unwrap();

        let blob = load_knowledge_dir(Some(dir.path()));
        assert_eq!(blob, "--- From notes.MARKDOWN ---\nWitty and kind.");
    }

    #[test]
    fn test_unreadable_and_blank_files_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), "not really a pdf").unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();

        assert_eq!(load_knowledge_dir(Some(dir.path())), "");
    }

    #[test]
    fn test_only_unsupported_files_means_no_knowledge() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();
        fs::write(dir.path().join("data.csv"), "a,b").unwrap();

        assert!(!has_knowledge_files(dir.path()));
        assert_eq!(load_knowledge_dir(Some(dir.path())), "");
    }
}
