//! Composite object identity - (namespace, name)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a stored object within one store instance.
///
/// The namespace is a container or bucket; the name is the blob name or key
/// and may contain `/` to form a nested logical path. A `\` in the name is
/// stored as `/`, so the key always matches its file on disk. Ordering is by
/// namespace first, then name, which keeps listings deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    namespace: String,
    name: String,
}

impl ObjectId {
    /// Build a validated identity
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into().replace('\\', "/");

        if namespace.is_empty() {
            return Err(Error::InvalidIdentity("namespace is empty".into()));
        }
        if name.is_empty() {
            return Err(Error::InvalidIdentity(format!(
                "name is empty in namespace '{}'",
                namespace
            )));
        }
        if namespace.contains(['/', '\\']) {
            return Err(Error::InvalidIdentity(format!(
                "namespace '{}' contains a path separator",
                namespace
            )));
        }
        check_segments(&namespace)?;
        check_segments(&name)?;

        Ok(ObjectId { namespace, name })
    }

    /// The container or bucket
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The blob name or key, with `/` separating nested segments
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical location of this object under `root`
    pub fn path_under(&self, root: &Path) -> PathBuf {
        let mut path = root.join(&self.namespace);
        for segment in self.name.split('/') {
            path.push(segment);
        }
        path
    }

    /// Recover an identity from a path relative to a store root.
    ///
    /// Returns `None` when the path has no namespace directory or does not
    /// form a valid identity.
    pub fn from_relative_path(relative: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                std::path::Component::Normal(part) => parts.push(part.to_str()?),
                _ => return None,
            }
        }
        if parts.len() < 2 {
            return None;
        }
        ObjectId::new(parts[0], parts[1..].join("/")).ok()
    }
}

/// Reject components that would escape or alias a store root
fn check_segments(value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(Error::InvalidIdentity(format!(
            "'{}' contains a NUL byte",
            value.escape_debug()
        )));
    }
    for (position, segment) in value.split('/').enumerate() {
        match segment {
            "" => {
                return Err(Error::InvalidIdentity(format!(
                    "'{}' has an empty path segment",
                    value
                )))
            }
            "." | ".." => {
                return Err(Error::InvalidIdentity(format!(
                    "'{}' contains a relative path segment",
                    value
                )))
            }
            // Drive prefixes such as `C:`
            s if cfg!(windows) && position == 0 && s.len() == 2 && s.ends_with(':') => {
                return Err(Error::InvalidIdentity(format!(
                    "'{}' looks like an absolute path",
                    value
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_slash() {
        let id = ObjectId::new("reports", "2024/q1.pdf").unwrap();
        assert_eq!(id.to_string(), "reports/2024/q1.pdf");
    }

    #[test]
    fn test_separator_in_parts_does_not_collide() {
        let a = ObjectId::new("a:b", "c").unwrap();
        let b = ObjectId::new("a", "b:c").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_empty_parts() {
        assert!(matches!(
            ObjectId::new("", "x"),
            Err(Error::InvalidIdentity(_))
        ));
        assert!(matches!(
            ObjectId::new("x", ""),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(ObjectId::new("..", "x").is_err());
        assert!(ObjectId::new("bucket", "../escape").is_err());
        assert!(ObjectId::new("bucket", "a/./b").is_err());
        assert!(ObjectId::new("bucket", "/abs").is_err());
        assert!(ObjectId::new("bucket", "a//b").is_err());
        assert!(ObjectId::new("a/b", "x").is_err());
    }

    #[test]
    fn test_backslash_names_share_one_identity() {
        let slash = ObjectId::new("c", "a/b").unwrap();
        let backslash = ObjectId::new("c", "a\\b").unwrap();
        assert_eq!(slash, backslash);
        assert_eq!(backslash.name(), "a/b");
        assert_eq!(
            backslash.path_under(Path::new("/data")),
            slash.path_under(Path::new("/data"))
        );
        assert!(ObjectId::new("c", "a\\..\\b").is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_colon_segments_are_plain_names() {
        let id = ObjectId::new("c", "dir/x:").unwrap();
        assert_eq!(id.name(), "dir/x:");
        assert!(ObjectId::new("c", "v:").is_ok());
    }

    #[test]
    fn test_nested_name_path() {
        let id = ObjectId::new("bucket", "dir/sub/file.txt").unwrap();
        let path = id.path_under(Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data/bucket/dir/sub/file.txt"));
    }

    #[test]
    fn test_from_relative_path() {
        let id = ObjectId::from_relative_path(Path::new("bucket/dir/file.txt")).unwrap();
        assert_eq!(id.namespace(), "bucket");
        assert_eq!(id.name(), "dir/file.txt");

        assert!(ObjectId::from_relative_path(Path::new("loose.txt")).is_none());
    }

    #[test]
    fn test_ordering_namespace_first() {
        let mut ids = vec![
            ObjectId::new("b", "a").unwrap(),
            ObjectId::new("a", "z").unwrap(),
            ObjectId::new("a", "b").unwrap(),
        ];
        ids.sort();
        let shown: Vec<_> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(shown, vec!["a/b", "a/z", "b/a"]);
    }
}
