//! First-class type identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Identifies a type by its defining module path and its name.
///
/// Rendered as `module::Name`. Generic arguments stay part of the name, so
/// `alloc::vec::Vec<shop::Item>` has module `alloc::vec` and name
/// `Vec<shop::Item>`. Types without a module path (primitives) have an
/// empty module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeKey {
    module: String,
    name: String,
}

impl TypeKey {
    /// Create a key from an explicit module path and type name
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Key for a Rust type, derived from its type path
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        let (module, name) = split_path(std::any::type_name::<T>());
        Self::new(module, name)
    }

    /// Parse a `module::Name` path
    ///
    /// # Errors
    ///
    /// Returns an error when the path is empty or has an empty type name.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_type_key(path, "empty type path"));
        }

        let (module, name) = split_path(trimmed);
        if name.is_empty() {
            return Err(Error::invalid_type_key(path, "missing type name"));
        }
        if module.ends_with("::") || module.starts_with("::") {
            return Err(Error::invalid_type_key(path, "malformed module path"));
        }

        Ok(Self::new(module, name))
    }

    /// Defining module path
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Type name, including generic arguments
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified `module::Name` form
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.to_string()
    }
}

fn split_path(path: &str) -> (&str, &str) {
    let head_end = path.find('<').unwrap_or(path.len());
    match path[..head_end].rfind("::") {
        Some(idx) => (&path[..idx], &path[idx + 2..]),
        None => ("", path),
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.module, self.name)
        }
    }
}

impl FromStr for TypeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TypeKey> for String {
    fn from(key: TypeKey) -> Self {
        key.to_string()
    }
}
