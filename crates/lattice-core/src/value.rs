//! Typed configuration operations
//!
//! A device change carries an ordered list of [`ChangeOp`]s. Updates and
//! deletes record the pre-image alongside the new value so that the inverse
//! (rollback) operation set can be derived from the same payload without
//! consulting the device.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration path, an ordered list of element names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path(elements.into_iter().map(Into::into).collect())
    }

    /// Single-element path.
    pub fn root(element: impl Into<String>) -> Self {
        Path(vec![element.into()])
    }

    pub fn elements(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Path {
    /// Renders in the wire text form, e.g. `elem:{name:"interfaces"} elem:{name:"eth0"}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for element in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "elem:{{name:\"{element}\"}}")?;
            first = false;
        }
        Ok(())
    }
}

/// Typed configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedValue {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl TypedValue {
    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::String(value.into())
    }
}

impl fmt::Display for TypedValue {
    /// Renders in the wire text form, e.g. `string_val:"Hello world!"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(value) => write!(f, "string_val:\"{value}\""),
            TypedValue::Int(value) => write!(f, "int_val:{value}"),
            TypedValue::Uint(value) => write!(f, "uint_val:{value}"),
            TypedValue::Bool(value) => write!(f, "bool_val:{value}"),
            TypedValue::Bytes(value) => {
                f.write_str("bytes_val:\"")?;
                for byte in value {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

/// One typed operation against a device's configuration tree.
///
/// `Update` and `Delete` carry the value they replace so the operation can be
/// undone; `Create` asserts the path did not previously exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    /// Set a path that did not previously exist
    Create { path: Path, value: TypedValue },
    /// Replace the value at an existing path
    Update {
        path: Path,
        value: TypedValue,
        previous: TypedValue,
    },
    /// Remove the value at an existing path
    Delete { path: Path, previous: TypedValue },
}

impl ChangeOp {
    pub fn path(&self) -> &Path {
        match self {
            ChangeOp::Create { path, .. }
            | ChangeOp::Update { path, .. }
            | ChangeOp::Delete { path, .. } => path,
        }
    }

    /// The operation that undoes this one.
    ///
    /// Creates invert to deletes and vice versa; updates invert to updates
    /// restoring the recorded pre-image. The derivation is total, so a
    /// rollback request can always be built from the forward payload alone.
    pub fn inverse(&self) -> ChangeOp {
        match self {
            ChangeOp::Create { path, value } => ChangeOp::Delete {
                path: path.clone(),
                previous: value.clone(),
            },
            ChangeOp::Update {
                path,
                value,
                previous,
            } => ChangeOp::Update {
                path: path.clone(),
                value: previous.clone(),
                previous: value.clone(),
            },
            ChangeOp::Delete { path, previous } => ChangeOp::Create {
                path: path.clone(),
                value: previous.clone(),
            },
        }
    }
}
