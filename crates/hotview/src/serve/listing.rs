//! Minimal HTML directory index.

use crate::serve::error_page::html_escape;
use std::io;
use std::path::Path;
use tokio::fs;

/// Render a one-level listing of `dir`.
///
/// Subdirectories get a trailing `/` in both the link and its text. Entries
/// are sorted by name. The title shows `dir` relative to `cwd` when it lies
/// beneath it.
pub async fn list(dir: &Path, cwd: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let title = html_escape(&display_title(dir, cwd));
    let mut items = String::new();
    for name in &entries {
        let name = html_escape(name);
        items.push_str(&format!("        <li><a href=\"{name}\">{name}</a></li>\n"));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Index of {title}</title>
</head>
<body>
    <h1>Index of {title}</h1>
    <ul>
{items}    </ul>
</body>
</html>
"#
    ))
}

fn display_title(dir: &Path, cwd: &Path) -> String {
    match dir.strip_prefix(cwd) {
        Ok(relative) if relative.as_os_str().is_empty() => "/".to_string(),
        Ok(relative) => format!("/{}/", relative.to_string_lossy().replace('\\', "/")),
        Err(_) => dir.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lists_files_and_directories() {
        let temp = TempDir::new().unwrap();
        stdfs::write(temp.path().join("b.txt"), "b").unwrap();
        stdfs::write(temp.path().join("a.css"), "a").unwrap();
        stdfs::create_dir(temp.path().join("nested")).unwrap();
        stdfs::write(temp.path().join("nested/deep.txt"), "d").unwrap();

        let html = list(temp.path(), temp.path()).await.unwrap();

        assert!(html.contains(r#"<li><a href="a.css">a.css</a></li>"#));
        assert!(html.contains(r#"<li><a href="b.txt">b.txt</a></li>"#));
        assert!(html.contains(r#"<li><a href="nested/">nested/</a></li>"#));
        assert!(!html.contains("deep.txt"));

        let a = html.find("a.css").unwrap();
        let b = html.find("b.txt").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_title_is_relative_to_cwd() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("docs").join("api");
        stdfs::create_dir_all(&dir).unwrap();

        let html = list(&dir, temp.path()).await.unwrap();

        assert!(html.contains("<title>Index of /docs/api/</title>"));
    }

    #[tokio::test]
    async fn test_names_are_escaped() {
        let temp = TempDir::new().unwrap();
        stdfs::write(temp.path().join("a&b.txt"), "x").unwrap();

        let html = list(temp.path(), temp.path()).await.unwrap();

        assert!(html.contains(r#"<a href="a&amp;b.txt">a&amp;b.txt</a>"#));
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(list(&temp.path().join("gone"), temp.path()).await.is_err());
    }

    #[test]
    fn test_display_title_outside_cwd() {
        let title = display_title(Path::new("/srv/site"), Path::new("/home/me"));
        assert_eq!(title, "/srv/site");
    }
}
