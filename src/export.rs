use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::{Note, Result};

/// Writes a note as markdown into `dir`, named after its title.
///
/// An existing file is never overwritten; the name gets a `-1`, `-2`, ...
/// suffix instead. Returns the path written.
pub async fn export_note(note: &Note, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;

    let stem = file_stem(&note.title);
    let mut path = dir.join(format!("{}.md", stem));
    let mut counter = 1;
    while fs::try_exists(&path).await? {
        path = dir.join(format!("{}-{}.md", stem, counter));
        counter += 1;
    }

    fs::write(&path, render(note)).await?;
    debug!(id = %note.id, path = %path.display(), "note exported");
    Ok(path)
}

pub fn render(note: &Note) -> String {
    let mut out = format!("# {}\n\n{}", note.title.trim(), note.content);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

// Utility: file stem from a note title
fn file_stem(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .filter(|c| *c != '\u{00A0}' && *c != '\u{FEFF}' && !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Groceries"), "Groceries");
        assert_eq!(file_stem("a/b: c?"), "a-b- c-");
        assert_eq!(file_stem("   "), "untitled");
        assert_eq!(file_stem("..hidden"), "hidden");
        assert_eq!(file_stem("\u{00A0}"), "untitled");
    }

    #[test]
    fn test_render_heading_and_body() {
        let note = Note::new("Plan", "step one", 0);
        assert_eq!(render(&note), "# Plan\n\nstep one\n");
    }

    #[tokio::test]
    async fn test_export_writes_markdown() {
        let dir = TempDir::new().unwrap();
        let note = Note::new("Trip: Rome", "pack light", 0);

        let path = export_note(&note, dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("Trip- Rome.md"));
        let written = fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "# Trip: Rome\n\npack light\n");
    }

    #[tokio::test]
    async fn test_export_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let first = Note::new("Same", "one", 0);
        let second = Note::new("Same", "two", 0);

        let a = export_note(&first, dir.path()).await.unwrap();
        let b = export_note(&second, dir.path()).await.unwrap();

        assert_eq!(a, dir.path().join("Same.md"));
        assert_eq!(b, dir.path().join("Same-1.md"));
        assert_eq!(fs::read_to_string(&a).await.unwrap(), "# Same\n\none\n");
    }

    #[tokio::test]
    async fn test_export_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("notes");

        let path = export_note(&Note::new("x", "y", 0), &nested).await.unwrap();
        assert!(path.starts_with(&nested));
    }
}
