//! Entity shapes: the source-level description of a mapped type.
//!
//! A shape lists members in declaration order together with their declarative
//! markers. Conventions discover properties, keys and relationships from it.
//!
//! # Example
//!
//! ```
//! use ormkit_core::marker::{DatabaseGeneratedOption, Marker};
//! use ormkit_core::shape::{EntityShape, MemberInfo};
//! use ormkit_core::types::ValueType;
//!
//! let shape = EntityShape::new("Blog")
//!     .member(
//!         MemberInfo::scalar("Id", ValueType::Int)
//!             .marker(Marker::database_generated(DatabaseGeneratedOption::Identity)),
//!     )
//!     .member(MemberInfo::scalar("Title", ValueType::Text).marker(Marker::Required))
//!     .member(MemberInfo::collection("Posts", "Post"));
//!
//! assert_eq!(shape.scalar_members().count(), 2);
//! ```

use crate::marker::{Marker, MarkerProvider};
use crate::types::ValueType;

/// What kind of member a shape declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// A scalar value that maps to a property.
    Scalar {
        /// Value type
        value_type: ValueType,
        /// Whether the member can hold "no value".
        nullable: bool,
    },
    /// A reference to a single instance of another shape.
    Reference {
        /// Target shape name
        target: String,
    },
    /// A collection of instances of another shape.
    Collection {
        /// Target shape name
        target: String,
    },
}

/// A member of an entity shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Member name.
    pub name: String,
    /// Member kind.
    pub kind: MemberKind,
    /// Declarative markers on this member.
    pub markers: Vec<Marker>,
}

impl MemberInfo {
    /// A scalar member; nullability follows the value type.
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Scalar {
                value_type,
                nullable: !value_type.is_value_type(),
            },
            markers: Vec::new(),
        }
    }

    /// An optional scalar member (`Option<T>`).
    pub fn optional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Scalar {
                value_type,
                nullable: true,
            },
            markers: Vec::new(),
        }
    }

    /// A reference navigation member.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Reference {
                target: target.into(),
            },
            markers: Vec::new(),
        }
    }

    /// A collection navigation member.
    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Collection {
                target: target.into(),
            },
            markers: Vec::new(),
        }
    }

    /// Attach a marker.
    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Value type and nullability for scalar members.
    #[must_use]
    pub fn scalar_type(&self) -> Option<(ValueType, bool)> {
        match self.kind {
            MemberKind::Scalar {
                value_type,
                nullable,
            } => Some((value_type, nullable)),
            _ => None,
        }
    }

    /// Target shape name for navigation members.
    #[must_use]
    pub fn navigation_target(&self) -> Option<&str> {
        match &self.kind {
            MemberKind::Reference { target } | MemberKind::Collection { target } => Some(target),
            MemberKind::Scalar { .. } => None,
        }
    }

    /// Whether this is a collection navigation.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, MemberKind::Collection { .. })
    }
}

/// The source-level description of a mapped type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityShape {
    name: String,
    markers: Vec<Marker>,
    members: Vec<MemberInfo>,
}

impl EntityShape {
    /// Create an empty shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Add a member. Declaration order is preserved.
    #[must_use]
    pub fn member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    /// Attach a marker to the shape itself.
    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Shape name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Find a member by name.
    pub fn find_member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Scalar members in declaration order.
    pub fn scalar_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Scalar { .. }))
    }

    /// Navigation members (references and collections) in declaration order.
    pub fn navigation_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members
            .iter()
            .filter(|m| !matches!(m.kind, MemberKind::Scalar { .. }))
    }

    /// Declaration index of a member, used to order key properties.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

impl MarkerProvider for EntityShape {
    fn entity_markers(&self) -> &[Marker] {
        &self.markers
    }

    fn member_markers(&self, member: &str) -> &[Marker] {
        match self.find_member(member) {
            Some(m) => &m.markers,
            None => &[],
        }
    }
}

/// Types that describe their own shape.
///
/// Implemented by hand or by generated code for each mapped type.
pub trait Mapped {
    /// Build the shape of this type.
    fn shape() -> EntityShape;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerKind;

    fn blog() -> EntityShape {
        EntityShape::new("Blog")
            .marker(Marker::table("Blogs"))
            .member(MemberInfo::scalar("Id", ValueType::Int).marker(Marker::Key))
            .member(MemberInfo::scalar("Title", ValueType::Text))
            .member(MemberInfo::optional("Rating", ValueType::Int))
            .member(MemberInfo::collection("Posts", "Post"))
            .member(MemberInfo::reference("Owner", "User"))
    }

    #[test]
    fn test_scalar_nullability_follows_type() {
        let shape = blog();
        assert_eq!(
            shape.find_member("Id").unwrap().scalar_type(),
            Some((ValueType::Int, false))
        );
        assert_eq!(
            shape.find_member("Title").unwrap().scalar_type(),
            Some((ValueType::Text, true))
        );
        assert_eq!(
            shape.find_member("Rating").unwrap().scalar_type(),
            Some((ValueType::Int, true))
        );
    }

    #[test]
    fn test_member_partitions_keep_declaration_order() {
        let shape = blog();
        let scalars: Vec<_> = shape.scalar_members().map(|m| m.name.as_str()).collect();
        assert_eq!(scalars, vec!["Id", "Title", "Rating"]);
        let navs: Vec<_> = shape
            .navigation_members()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(navs, vec!["Posts", "Owner"]);
        assert!(shape.find_member("Posts").unwrap().is_collection());
        assert_eq!(
            shape.find_member("Owner").unwrap().navigation_target(),
            Some("User")
        );
    }

    #[test]
    fn test_marker_provider_lookup() {
        let shape = blog();
        assert!(shape.find_member_marker("Id", MarkerKind::Key).is_some());
        assert!(shape.find_member_marker("Title", MarkerKind::Key).is_none());
        assert!(shape.member_markers("Missing").is_empty());
        assert_eq!(
            shape.find_entity_marker(MarkerKind::Table),
            Some(&Marker::table("Blogs"))
        );
    }
}
