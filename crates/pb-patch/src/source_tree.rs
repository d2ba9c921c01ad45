use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pb_core::{BridgeError, FunctionQuery, FunctionSpan, SourceFile};
use walkdir::WalkDir;

use crate::{inject, locate};

pub const LUA_EXTENSION: &str = "lua";

/// Lua sources loaded from disk, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    files: BTreeMap<PathBuf, String>,
}

#[derive(Debug, Clone)]
pub struct PatchResult {
    /// Patched file, not yet written anywhere.
    pub file: SourceFile,
    /// Function span in the content before patching.
    pub span: FunctionSpan,
}

impl SourceTree {
    pub fn load(root: &Path) -> Result<Self, BridgeError> {
        if !root.is_dir() {
            return Err(BridgeError::MissingFile {
                path: root.to_path_buf(),
            });
        }

        let mut files = BTreeMap::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LUA_EXTENSION) {
                continue;
            }
            let content =
                fs::read_to_string(path).map_err(|source| BridgeError::io(path, source))?;
            files.insert(path.to_path_buf(), content);
        }

        tracing::debug!(root = %root.display(), files = files.len(), "loaded source tree");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn insert(&mut self, file: SourceFile) {
        self.files.insert(file.path, file.content);
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// First loaded file, in path order, that defines `name`.
    pub fn find_function(&self, name: &str) -> Option<(&Path, FunctionSpan)> {
        let query = FunctionQuery::Name(name.to_string());
        self.files.iter().find_map(|(path, content)| {
            locate(content, &query)
                .ok()
                .map(|span| (path.as_path(), span))
        })
    }

    /// Locates the function and injects `text` into it.
    ///
    /// With an explicit `file` the tree copy is used when loaded, otherwise
    /// the file is read from disk. Without one, only name queries can be
    /// resolved, by searching every loaded file.
    pub fn patch(
        &self,
        file: Option<&Path>,
        query: &FunctionQuery,
        text: &str,
        after_line: usize,
    ) -> Result<PatchResult, BridgeError> {
        let (path, content) = match file {
            Some(path) => (path.to_path_buf(), self.read_source(path)?),
            None => {
                let FunctionQuery::Name(name) = query else {
                    return Err(BridgeError::not_found(format!(
                        "{} (a line query needs a file)",
                        query
                    )));
                };
                let (path, _) = self
                    .find_function(name)
                    .ok_or_else(|| BridgeError::not_found(query))?;
                let content = self.files.get(path).cloned().unwrap_or_default();
                (path.to_path_buf(), content)
            }
        };

        let span = locate(&content, query)?;
        let patched = inject(&content, &span, text, after_line)?;
        Ok(PatchResult {
            file: SourceFile {
                path,
                content: patched,
            },
            span,
        })
    }

    fn read_source(&self, path: &Path) -> Result<String, BridgeError> {
        if let Some(content) = self.files.get(path) {
            return Ok(content.clone());
        }
        if !path.is_file() {
            return Err(BridgeError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        fs::read_to_string(path).map_err(|source| BridgeError::io(path, source))
    }
}

#[cfg(test)]
mod source_tree_tests {
    use super::*;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn load_collects_lua_files_recursively() {
        let root = tempfile::tempdir().expect("tempdir");
        write_file(&root.path().join("main.lua"), "function main()\nend\n");
        write_file(&root.path().join("lib/util.lua"), "function util()\nend\n");
        write_file(&root.path().join("notes.txt"), "function nope()\nend\n");

        let tree = SourceTree::load(root.path()).expect("load should pass");
        assert_eq!(tree.len(), 2);
        assert!(tree.get(&root.path().join("lib/util.lua")).is_some());
        assert!(tree.get(&root.path().join("notes.txt")).is_none());
    }

    #[test]
    fn load_rejects_missing_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let error = SourceTree::load(&root.path().join("absent")).expect_err("missing dir");
        assert_eq!(error.code(), "SESSION_MISSING_FILE");
    }

    #[test]
    fn patch_by_name_searches_every_loaded_file() {
        let root = tempfile::tempdir().expect("tempdir");
        write_file(&root.path().join("a.lua"), "function alpha()\nend\n");
        write_file(
            &root.path().join("b.lua"),
            "-- beta lives here\nfunction beta()\n  return 1\nend\n",
        );
        let tree = SourceTree::load(root.path()).expect("load");

        let (path, _) = tree.find_function("beta").expect("beta should be found");
        assert_eq!(path, root.path().join("b.lua"));

        let result = tree
            .patch(
                None,
                &FunctionQuery::Name("beta".to_string()),
                "  print('hit')",
                1,
            )
            .expect("patch should pass");
        assert_eq!(result.file.path, root.path().join("b.lua"));
        assert_eq!(
            result.file.content,
            "-- beta lives here\nfunction beta()\n  print('hit')\n  return 1\nend\n"
        );
        assert_eq!(result.span.start, "-- beta lives here\n".len());
    }

    #[test]
    fn patch_by_line_needs_an_existing_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = SourceTree::default();

        let error = tree
            .patch(None, &FunctionQuery::Line(3), "x()", 1)
            .expect_err("line query without file");
        assert_eq!(error.code(), "PATCH_NOT_FOUND");

        let missing = root.path().join("gone.lua");
        let error = tree
            .patch(Some(&missing), &FunctionQuery::Line(1), "x()", 1)
            .expect_err("missing file");
        assert_eq!(error.code(), "SESSION_MISSING_FILE");

        let outside = root.path().join("outside.lua");
        write_file(&outside, "function f()\n  a()\nend\n");
        let result = tree
            .patch(Some(&outside), &FunctionQuery::Line(2), "  b()", 2)
            .expect("patch from disk");
        assert_eq!(result.file.content, "function f()\n  a()\n  b()\nend\n");
    }

    #[test]
    fn insert_replaces_tree_content() {
        let mut tree = SourceTree::default();
        let path = PathBuf::from("virtual.lua");
        tree.insert(SourceFile {
            path: path.clone(),
            content: "function v()\nend\n".to_string(),
        });
        tree.insert(SourceFile {
            path: path.clone(),
            content: "function w()\nend\n".to_string(),
        });
        assert_eq!(tree.len(), 1);
        assert!(tree.find_function("w").is_some());
        assert!(tree.find_function("v").is_none());
        assert_eq!(tree.paths().count(), 1);
    }
}
