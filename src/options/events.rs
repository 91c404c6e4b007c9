// Lifecycle notifications.
// The source system modeled these as an event hierarchy; here they are a
// flat set of optional callbacks carried on the options snapshot. Callers
// that don't care register nothing and pay nothing.

use std::fmt;
use std::sync::Arc;

use crate::partfile::partfile_struct::Partfile;

/// Callback fired around lifecycle transitions. Receives the partfile so
/// sinks can read its properties.
pub type LifecycleCallback = Arc<dyn Fn(&Partfile) + Send + Sync>;

/// Callback fired on soft failures, with a human-readable message.
pub type WarningCallback = Arc<dyn Fn(&Partfile, &str) + Send + Sync>;

/// The observer set for one partfile.
///
/// All callbacks run synchronously on the thread that triggered them, while
/// the partfile's internal locks may be held. Keep them short.
#[derive(Default, Clone)]
pub struct PartfileEvents {
    /// Fired right before the completed file is materialized.
    pub file_creating: Option<LifecycleCallback>,
    /// Fired once the completed file is fully on disk.
    pub file_created: Option<LifecycleCallback>,
    /// Fired on non-fatal misuse (duplicate chunk, write after creation).
    pub warning: Option<WarningCallback>,
}

impl PartfileEvents {
    pub(crate) fn notify_file_creating(&self, partfile: &Partfile) {
        if let Some(ref callback) = self.file_creating {
            callback(partfile);
        }
    }

    pub(crate) fn notify_file_created(&self, partfile: &Partfile) {
        if let Some(ref callback) = self.file_created {
            callback(partfile);
        }
    }

    pub(crate) fn notify_warning(&self, partfile: &Partfile, message: &str) {
        if let Some(ref callback) = self.warning {
            callback(partfile, message);
        }
    }
}

// Closures have no useful Debug output, so we just show which slots are
// occupied.
impl fmt::Debug for PartfileEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartfileEvents")
            .field("file_creating", &self.file_creating.is_some())
            .field("file_created", &self.file_created.is_some())
            .field("warning", &self.warning.is_some())
            .finish()
    }
}
