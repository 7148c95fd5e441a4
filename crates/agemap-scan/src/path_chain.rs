//! Reference-counted path segments for the scan stack.
//!
//! Each directory on the stack carries one segment linking back to its
//! parent's segment, so a directory's absolute path can be rebuilt into a
//! reused buffer in one pass without walking tree parent pointers. Segments
//! die with the last stack entry that references them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct PathSeg {
    name: OsString,
    parent: Option<Arc<PathSeg>>,
}

impl PathSeg {
    pub(crate) fn root(name: impl Into<OsString>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }

    pub(crate) fn child(parent: &Arc<PathSeg>, name: impl Into<OsString>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Rebuild the absolute path of this segment into `buf`. The buffer is
    /// cleared but keeps its capacity across calls.
    pub(crate) fn write_to(&self, buf: &mut PathBuf) {
        buf.clear();
        self.push_onto(buf);
    }

    fn push_onto(&self, buf: &mut PathBuf) {
        if let Some(parent) = &self.parent {
            parent.push_onto(buf);
        }
        buf.push(&self.name);
    }
}
