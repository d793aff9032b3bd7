use std::collections::HashSet;

/// Insertion-ordered, deduplicated set of file paths collected across pages
/// of a diff listing.
#[derive(Debug, Default)]
pub struct ModifiedFiles {
    seen: HashSet<String>,
    paths: Vec<String>,
}

impl ModifiedFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path`, ignoring blanks and paths already seen. Leading `/`
    /// (Azure reports repository-rooted paths) is stripped first.
    pub fn insert(&mut self, path: &str) {
        let path = path.trim_start_matches('/');
        if path.is_empty() || self.seen.contains(path) {
            return;
        }
        self.seen.insert(path.to_string());
        self.paths.push(path.to_string());
    }

    pub fn insert_opt(&mut self, path: Option<&str>) {
        if let Some(path) = path {
            self.insert(path);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedups_and_keeps_first_seen_order() {
        let mut files = ModifiedFiles::new();
        files.insert("src/b.rs");
        files.insert("src/a.rs");
        files.insert("src/b.rs");
        files.insert("/src/a.rs");
        files.insert("");
        files.insert_opt(None);
        files.insert_opt(Some("README.md"));

        assert_eq!(files.into_vec(), vec!["src/b.rs", "src/a.rs", "README.md"]);
    }
}
