//! Search attribute.

/// Key/value pair parametrizing a directory search.
///
/// The value can be changed after construction so one attribute can be reused for successive
/// searches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    key: String,
    value: String,
}

impl Attribute {
    /// Creates a new attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Attribute name. Servers of this protocol ignore it.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Attribute value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}
