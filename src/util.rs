/// Filesystem helpers shared by the subcommands.
pub mod fs {
    use std::fs;
    use std::io;
    use std::path::Path;

    /// Remove a directory tree. A missing path is not an error.
    /// Returns whether anything was removed.
    pub fn remove_tree(path: &Path) -> io::Result<bool> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn remove_tree_is_recursive_and_tolerates_missing() {
            let dir = tempfile::tempdir().unwrap();
            let tree = dir.path().join("TypeScript");
            fs::create_dir_all(tree.join("src").join("compiler")).unwrap();
            fs::write(tree.join("src").join("compiler").join("checker.ts"), "x").unwrap();

            assert!(remove_tree(&tree).unwrap());
            assert!(!tree.exists());
            assert!(!remove_tree(&tree).unwrap());
        }
    }
}
