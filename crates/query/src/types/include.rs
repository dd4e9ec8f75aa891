//! Include path parsing and resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::metadata::{MetadataLookup, RelationshipDef};
use crate::error::{QueryError, QueryResult};

/// A dot-separated relationship path such as `comments.author`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    /// Parses a path, rejecting empty segments.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(QueryError::InvalidParameter {
                name: "include".to_string(),
                reason: format!("'{}' contains an empty path segment", raw),
            });
        }
        Ok(Self { segments })
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves each segment against declared relationships, starting at `root_type`.
    ///
    /// Fails with [`QueryError::UnknownRelationshipPath`] on the first segment
    /// the current type does not declare.
    pub fn resolve(
        &self,
        lookup: &dyn MetadataLookup,
        root_type: &str,
    ) -> QueryResult<Vec<ResolvedSegment>> {
        let mut current = root_type.to_string();
        let mut resolved = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            let metadata =
                lookup
                    .get_by_type(&current)
                    .ok_or_else(|| QueryError::UnknownResourceType {
                        resource_type: current.clone(),
                    })?;
            let relationship = metadata.relationship(segment).ok_or_else(|| {
                QueryError::UnknownRelationshipPath {
                    resource_type: current.clone(),
                    segment: segment.clone(),
                }
            })?;
            resolved.push(ResolvedSegment {
                source_type: current.clone(),
                relationship: relationship.clone(),
            });
            current = relationship.target_type.clone();
        }

        Ok(resolved)
    }
}

impl fmt::Display for IncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// One step of a resolved include path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSegment {
    /// Type the relationship is declared on.
    pub source_type: String,
    /// The relationship followed.
    pub relationship: RelationshipDef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetadataRegistry, ResourceMetadata};

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with_type(
                ResourceMetadata::new("articles")
                    .with_relationship(RelationshipDef::to_one("author", "people"))
                    .with_relationship(RelationshipDef::to_many("comments", "comments")),
            )
            .with_type(
                ResourceMetadata::new("comments")
                    .with_relationship(RelationshipDef::to_one("author", "people")),
            )
            .with_type(ResourceMetadata::new("people"))
    }

    #[test]
    fn test_parse_depth() {
        let path = IncludePath::parse("comments.author.profile").unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "comments.author.profile");
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(IncludePath::parse("comments..author").is_err());
        assert!(IncludePath::parse("").is_err());
    }

    #[test]
    fn test_resolve() {
        let path = IncludePath::parse("comments.author").unwrap();
        let resolved = path.resolve(&registry(), "articles").unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].source_type, "articles");
        assert_eq!(resolved[1].source_type, "comments");
        assert_eq!(resolved[1].relationship.target_type, "people");
    }

    #[test]
    fn test_resolve_unknown_segment() {
        let path = IncludePath::parse("comments.editor").unwrap();
        let err = path.resolve(&registry(), "articles").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownRelationshipPath {
                resource_type: "comments".to_string(),
                segment: "editor".to_string(),
            }
        );
    }
}
