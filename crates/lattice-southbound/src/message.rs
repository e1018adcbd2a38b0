//! Set request/response messages
//!
//! One [`SetRequest`] carries a device change's full operation set: typed
//! updates (creates and replacements) and deletes. The display rendering
//! follows the wire text form and is embedded by devices into rejection
//! descriptions, e.g.
//! `update:{path:{elem:{name:"baz"}} val:{string_val:"Goodbye world!"}}`.

use std::fmt;

use lattice_core::{ChangeOp, Path, TypedValue};

/// One typed value write within a set request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathUpdate {
    pub path: Path,
    pub value: TypedValue,
}

/// A single atomic request against one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRequest {
    pub updates: Vec<PathUpdate>,
    pub deletes: Vec<Path>,
}

impl SetRequest {
    /// Builds the request corresponding to an operation list. Creates and
    /// updates become value writes; deletes become path deletes. Callers
    /// derive rollback requests by inverting the operations first.
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a ChangeOp>) -> Self {
        let mut request = SetRequest::default();
        for op in ops {
            match op {
                ChangeOp::Create { path, value } | ChangeOp::Update { path, value, .. } => {
                    request.updates.push(PathUpdate {
                        path: path.clone(),
                        value: value.clone(),
                    });
                }
                ChangeOp::Delete { path, .. } => request.deletes.push(path.clone()),
            }
        }
        request
    }
}

impl fmt::Display for SetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for update in &self.updates {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "update:{{path:{{{}}} val:{{{}}}}}", update.path, update.value)?;
            first = false;
        }
        for delete in &self.deletes {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "delete:{{{delete}}}")?;
            first = false;
        }
        Ok(())
    }
}

/// Response to a successful set request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetResponse {}
