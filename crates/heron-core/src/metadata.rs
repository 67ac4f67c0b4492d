//! Callable identity and the metadata carrier.
//!
//! Every callable carries a [`Metadata`] record: its name, optional
//! documentation, and parameter descriptor. Wrappers republish the metadata of
//! the callable they wrap through [`copy_metadata`], so introspection on the
//! outermost wrapper of a stack always sees the original identity.
//!
//! # Example
//!
//! ```
//! use heron_core::Metadata;
//!
//! let meta = Metadata::new("add")
//!     .with_doc("Adds two numbers.")
//!     .typed_param("a", "i64")
//!     .typed_param("b", "i64");
//!
//! assert_eq!(meta.signature(), "add(a: i64, b: i64)");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single entry of a parameter descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Optional type annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

impl Param {
    /// Creates an untyped parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }

    /// Creates a parameter with a type annotation.
    #[must_use]
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}: {}", self.name, ty),
            None => f.write_str(&self.name),
        }
    }
}

/// Identity of a callable: name, documentation, and parameter descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc: Option<String>,
    #[serde(default)]
    params: Vec<Param>,
}

impl Metadata {
    /// Creates metadata with the given name and no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    /// Metadata for a freshly constructed wrapper, before the carrier copies
    /// the wrapped callable's identity onto it.
    #[must_use]
    pub fn synthetic(layer: &str) -> Self {
        Self::new(format!("<{layer} wrapper>"))
    }

    /// Sets the documentation string.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Appends an untyped parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::new(name));
        self
    }

    /// Appends a typed parameter.
    #[must_use]
    pub fn typed_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(Param::typed(name, ty));
        self
    }

    /// Returns the callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the documentation string, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Returns the ordered parameter descriptor.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Renders `name(param: type, ...)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Anything that carries callable [`Metadata`].
pub trait Described {
    /// Returns the carried metadata.
    fn metadata(&self) -> &Metadata;

    /// Returns the carried metadata mutably.
    fn metadata_mut(&mut self) -> &mut Metadata;
}

/// Copies name, documentation, and parameter descriptor from `source` onto
/// `dest`.
///
/// Every wrapper calls this right after constructing its delegate.
pub fn copy_metadata<S, D>(source: &S, dest: &mut D)
where
    S: Described + ?Sized,
    D: Described + ?Sized,
{
    dest.metadata_mut().clone_from(source.metadata());
}

impl Described for Metadata {
    fn metadata(&self) -> &Metadata {
        self
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_rendering() {
        let meta = Metadata::new("view_database")
            .param("user")
            .typed_param("database_name", "&str");
        assert_eq!(meta.signature(), "view_database(user, database_name: &str)");
    }

    #[test]
    fn test_empty_signature() {
        assert_eq!(Metadata::new("tick").signature(), "tick()");
    }

    #[test]
    fn test_synthetic_name_is_not_the_original() {
        let meta = Metadata::synthetic("timing");
        assert_eq!(meta.name(), "<timing wrapper>");
        assert!(meta.doc().is_none());
    }

    #[test]
    fn test_copy_metadata_replaces_every_field() {
        let source = Metadata::new("slow_time")
            .with_doc("Sleeps for a second.")
            .param("secs");
        let mut dest = Metadata::synthetic("timing");

        copy_metadata(&source, &mut dest);

        assert_eq!(dest, source);
        assert_eq!(dest.doc(), Some("Sleeps for a second."));
        assert_eq!(dest.params(), &[Param::new("secs")]);
    }

    #[test]
    fn test_metadata_serde() {
        let meta = Metadata::new("add").typed_param("a", "i64");
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"name\":\"add\""));
        assert!(!json.contains("doc"));

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
