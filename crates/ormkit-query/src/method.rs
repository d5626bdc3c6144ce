//! Method identities.
//!
//! A [`MethodInfo`] is a `'static` descriptor of one source method overload.
//! Translators recognize calls by the address of the descriptor, so two
//! overloads with the same name never match each other.

use std::fmt;
use std::ptr;

/// Descriptor of a single method overload.
///
/// Equality is identity: two descriptors are equal only if they are the same
/// static.
#[derive(Debug)]
pub struct MethodInfo {
    /// Declaring type.
    pub declaring_type: &'static str,
    /// Method name.
    pub name: &'static str,
    /// Parameter type names, in order.
    pub parameters: &'static [&'static str],
}

impl MethodInfo {
    /// Define a method descriptor.
    pub const fn new(
        declaring_type: &'static str,
        name: &'static str,
        parameters: &'static [&'static str],
    ) -> Self {
        Self {
            declaring_type,
            name,
            parameters,
        }
    }

    /// Identity comparison.
    #[inline]
    pub fn is(&'static self, other: &'static MethodInfo) -> bool {
        ptr::eq(self, other)
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for MethodInfo {}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.declaring_type,
            self.name,
            self.parameters.join(", ")
        )
    }
}

/// `String.EndsWith(String)`.
pub static STRING_ENDS_WITH: MethodInfo = MethodInfo::new("String", "EndsWith", &["String"]);

/// `String.EndsWith(String, StringComparison)`: not translated.
pub static STRING_ENDS_WITH_COMPARISON: MethodInfo =
    MethodInfo::new("String", "EndsWith", &["String", "StringComparison"]);

/// `String.StartsWith(String)`.
pub static STRING_STARTS_WITH: MethodInfo = MethodInfo::new("String", "StartsWith", &["String"]);

/// `String.Contains(String)`.
pub static STRING_CONTAINS: MethodInfo = MethodInfo::new("String", "Contains", &["String"]);

/// `String.ToUpper()`.
pub static STRING_TO_UPPER: MethodInfo = MethodInfo::new("String", "ToUpper", &[]);

/// `String.ToLower()`.
pub static STRING_TO_LOWER: MethodInfo = MethodInfo::new("String", "ToLower", &[]);
