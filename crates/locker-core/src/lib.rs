pub mod account;
pub mod auth;
pub mod export;
pub mod gallery;
pub mod media;
pub mod meter;
pub mod session;
pub mod store;
pub mod upload;

use std::sync::Mutex;
use std::time::Instant;

/// Maximum combined size of a single upload batch, and of any single file.
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024; // 50 MiB

/// Maximum total bytes an account may store.
pub const MAX_STORAGE_SIZE: u64 = 1536 * 1024 * 1024; // 1.5 GiB

/// Username seeded when the store is empty.
pub const DEFAULT_USERNAME: &str = "default";

/// Password of the seeded account.
pub const DEFAULT_PASSWORD: &str = "1318";

pub use account::Account;
pub use auth::{AuthError, AuthState};
pub use gallery::MediaFilter;
pub use media::{format_file_size, MediaItem, MediaKind};
pub use meter::{Severity, StorageMeter};
pub use store::UserStore;
pub use upload::{BatchError, SkipReason, SkippedFile, UploadCandidate, UploadReport};
pub use uuid::Uuid;

/// Type alias for progress callback
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(Instant::now() - std::time::Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = self.last_emit.lock().unwrap();
            if last.elapsed().as_millis() < 200 {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}
