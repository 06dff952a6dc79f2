use thiserror::Error;

/// Name of the library rule every package exposes.
pub const DEFAULT_LIBRARY: &str = "go_default_library";

/// Number of leading path components that name an external repository.
const REPOSITORY_COMPONENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid import path {import:?}: empty path component")]
    EmptyComponent { import: String },

    #[error("invalid import path {import:?}: character {ch:?} not allowed")]
    InvalidCharacter { import: String, ch: char },
}

/// Maps Go import paths to build labels.
///
/// Imports under the configured prefix live in this repository and resolve to a
/// package label. Everything else lives in an external repository named after the
/// first path components of the import.
#[derive(Debug, Clone)]
pub struct LabelResolver {
    go_prefix: String,
}

impl LabelResolver {
    pub fn new(go_prefix: impl Into<String>) -> Self {
        Self {
            go_prefix: go_prefix.into(),
        }
    }

    /// Resolves `import` as seen from the package at `from_rel`.
    pub fn resolve(&self, import: &str, from_rel: &str) -> Result<String, ResolveError> {
        validate(import)?;

        if let Some(rel) = self.local_path(import) {
            if rel == from_rel {
                return Ok(format!(":{}", DEFAULT_LIBRARY));
            }
            return Ok(format!("//{}:{}", rel, DEFAULT_LIBRARY));
        }

        let components: Vec<&str> = import.split('/').collect();
        let split = components.len().min(REPOSITORY_COMPONENTS);
        let (repo, rest) = components.split_at(split);

        Ok(format!(
            "@{}//{}:{}",
            repository_name(repo),
            rest.join("/"),
            DEFAULT_LIBRARY
        ))
    }

    /// The repository-relative path of a local import.
    fn local_path<'a>(&self, import: &'a str) -> Option<&'a str> {
        if self.go_prefix.is_empty() {
            return None;
        }
        if import == self.go_prefix {
            return Some("");
        }
        import
            .strip_prefix(self.go_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

fn validate(import: &str) -> Result<(), ResolveError> {
    if import.split('/').any(str::is_empty) {
        return Err(ResolveError::EmptyComponent {
            import: import.to_string(),
        });
    }
    if let Some(ch) = import
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '~' | '+' | '-')))
    {
        return Err(ResolveError::InvalidCharacter {
            import: import.to_string(),
            ch,
        });
    }
    Ok(())
}

/// `github.com/foo/bar` becomes `com_github_foo_bar`.
fn repository_name(components: &[&str]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some((host, rest)) = components.split_first() {
        parts.extend(host.split('.').rev());
        parts.extend(rest.iter().copied());
    }
    parts
        .join("_")
        .chars()
        .map(|c| if c == '.' || c == '-' { '_' } else { c })
        .collect()
}
