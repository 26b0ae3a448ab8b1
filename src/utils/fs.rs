//! Filesystem helpers for working-copy management

use std::fs;
use std::io;
use std::path::Path;

/// Delete a folder and its contents if it exists. Missing folders are not an
/// error; working folders are recreated from scratch on every task.
pub fn delete_folder_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed folder");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively copy `src` over `dst`, creating directories as needed.
/// Files already present in `dst` are overwritten, so copying the
/// submitter's tree after the harness tree makes submitter files win.
pub fn overlay_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            overlay_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_missing_folder_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(delete_folder_if_exists(&missing).is_ok());
    }

    #[test]
    fn test_delete_removes_nested_contents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("file.txt"), "x").unwrap();

        delete_folder_if_exists(&dir.path().join("a")).unwrap();
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn test_overlay_prefers_source_files() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        fs::write(src.path().join("main.py"), "submitter").unwrap();
        fs::create_dir_all(src.path().join("lib")).unwrap();
        fs::write(src.path().join("lib/extra.py"), "new").unwrap();

        fs::write(dst.path().join("main.py"), "harness").unwrap();
        fs::write(dst.path().join("test.py"), "harness").unwrap();

        overlay_tree(src.path(), dst.path()).unwrap();

        assert_eq!(
            fs::read_to_string(dst.path().join("main.py")).unwrap(),
            "submitter"
        );
        assert_eq!(
            fs::read_to_string(dst.path().join("test.py")).unwrap(),
            "harness"
        );
        assert_eq!(
            fs::read_to_string(dst.path().join("lib/extra.py")).unwrap(),
            "new"
        );
    }
}
