use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::account::Account;
use crate::media::{self, MediaItem, MediaKind};
use crate::{ProgressCallback, ThrottledProgress, MAX_UPLOAD_SIZE};

/// One file selected for upload: metadata gathered before any content is read.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub path: PathBuf,
    /// Original filename
    pub name: String,
    /// Full MIME type guessed from the path
    pub mime: String,
    pub size: u64,
}

impl UploadCandidate {
    /// Stat a file and guess its MIME type from the extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            mime,
            size: metadata.len(),
        })
    }
}

/// Why a file was left out of an otherwise accepted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// MIME type is neither `image/*` nor `video/*`
    UnsupportedType,
    /// Single file over the upload ceiling
    FileTooLarge,
    /// Content could not be read
    ReadFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedType => f.write_str("not an image or video"),
            SkipReason::FileTooLarge => f.write_str("exceeds the maximum file size"),
            SkipReason::ReadFailed => f.write_str("could not be read"),
        }
    }
}

/// A file dropped from the batch by per-file validation or a failed read.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub name: String,
    pub size: u64,
    pub reason: SkipReason,
}

/// Whole-batch rejection: nothing is stored, the account is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Combined selection size over the upload ceiling
    TooLarge { total: u64 },
    /// Combined selection size over the account's remaining quota
    QuotaExceeded { shortfall: u64 },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::TooLarge { total } => write!(
                f,
                "total upload size ({}) exceeds the maximum allowed ({})",
                media::format_file_size(*total),
                media::format_file_size(MAX_UPLOAD_SIZE)
            ),
            BatchError::QuotaExceeded { shortfall } => write!(
                f,
                "not enough storage available, {} more space needed",
                media::format_file_size(*shortfall)
            ),
        }
    }
}

impl std::error::Error for BatchError {}

/// Outcome of a completed batch.
#[derive(Debug)]
pub struct UploadReport {
    /// Number of items stored
    pub stored: usize,
    /// Files skipped while the rest of the batch proceeded
    pub skipped: Vec<SkippedFile>,
}

fn validate(candidate: &UploadCandidate) -> Result<MediaKind, SkipReason> {
    let kind = MediaKind::from_mime(&candidate.mime).ok_or(SkipReason::UnsupportedType)?;
    // The batch check already bounds every member, but the per-file ceiling
    // is enforced independently.
    if candidate.size > MAX_UPLOAD_SIZE {
        return Err(SkipReason::FileTooLarge);
    }
    Ok(kind)
}

/// Validate and ingest a batch of files for one account.
///
/// Batch-level failures reject the whole selection and leave the account
/// untouched; per-file failures skip that file and the rest proceeds.
/// Accepted files are read and encoded concurrently and may complete in any
/// order; the scope join is the completion barrier, after which items are
/// prepended in completion order and the sizes are charged. Progress counts
/// skipped files as completed. The caller persists the store afterwards.
pub fn upload_batch(
    account: &mut Account,
    candidates: &[UploadCandidate],
    progress: &ProgressCallback,
) -> Result<UploadReport, BatchError> {
    if candidates.is_empty() {
        return Ok(UploadReport {
            stored: 0,
            skipped: Vec::new(),
        });
    }

    let total_size: u64 = candidates.iter().map(|c| c.size).sum();
    if total_size > MAX_UPLOAD_SIZE {
        return Err(BatchError::TooLarge { total: total_size });
    }
    let available = account.remaining_quota();
    if total_size > available {
        return Err(BatchError::QuotaExceeded {
            shortfall: total_size - available,
        });
    }

    let mut skipped: Vec<SkippedFile> = Vec::new();
    let mut accepted: Vec<(&UploadCandidate, MediaKind)> = Vec::new();
    for candidate in candidates {
        match validate(candidate) {
            Ok(kind) => accepted.push((candidate, kind)),
            Err(reason) => skipped.push(SkippedFile {
                name: candidate.name.clone(),
                size: candidate.size,
                reason,
            }),
        }
    }

    let tp = ThrottledProgress::new(progress);
    let total_files = candidates.len() as u64;
    let counter = AtomicU64::new(skipped.len() as u64);
    tp.report(
        "upload",
        counter.load(Ordering::Relaxed),
        total_files,
        "Uploading",
    );

    let completed: Mutex<Vec<MediaItem>> = Mutex::new(Vec::new());
    let read_failures: Mutex<Vec<SkippedFile>> = Mutex::new(Vec::new());

    if !accepted.is_empty() {
        let num_threads = rayon::current_num_threads().max(1);
        let chunk_size = (accepted.len() + num_threads - 1) / num_threads;
        let chunks: Vec<&[(&UploadCandidate, MediaKind)]> = accepted.chunks(chunk_size).collect();

        std::thread::scope(|s| {
            for chunk in chunks {
                let counter = &counter;
                let tp = &tp;
                let completed = &completed;
                let read_failures = &read_failures;
                s.spawn(move || {
                    for &(candidate, kind) in chunk {
                        match fs::read(&candidate.path) {
                            Ok(bytes) => {
                                let data = media::encode_data_url(&candidate.mime, &bytes);
                                let item = MediaItem::new(
                                    candidate.name.clone(),
                                    candidate.mime.clone(),
                                    kind,
                                    candidate.size,
                                    data,
                                );
                                completed.lock().unwrap().push(item);
                            }
                            Err(_) => {
                                read_failures.lock().unwrap().push(SkippedFile {
                                    name: candidate.name.clone(),
                                    size: candidate.size,
                                    reason: SkipReason::ReadFailed,
                                });
                            }
                        }
                        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        tp.report("upload", done, total_files, &candidate.name);
                    }
                });
            }
        });
    }

    // Every read has resolved; apply mutations serially, in completion order.
    let completed = completed.into_inner().unwrap();
    let stored = completed.len();
    for item in completed {
        account.push_item(item);
    }
    skipped.extend(read_failures.into_inner().unwrap());

    tp.report("upload", total_files, total_files, "done");

    Ok(UploadReport { stored, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    fn noop() -> &'static ProgressCallback {
        &|_, _, _, _| {}
    }

    fn write_file(dir: &Path, name: &str, len: usize) -> UploadCandidate {
        let path = dir.join(name);
        fs::write(&path, vec![0xabu8; len]).unwrap();
        UploadCandidate::from_path(&path).unwrap()
    }

    fn fake_candidate(name: &str, mime: &str, size: u64) -> UploadCandidate {
        UploadCandidate {
            path: PathBuf::from(name),
            name: name.to_string(),
            mime: mime.to_string(),
            size,
        }
    }

    #[test]
    fn test_candidate_from_path() {
        let dir = tempdir().unwrap();
        let candidate = write_file(dir.path(), "photo.png", 16);
        assert_eq!(candidate.name, "photo.png");
        assert_eq!(candidate.mime, "image/png");
        assert_eq!(candidate.size, 16);
    }

    #[test]
    fn test_mixed_batch_lands_newest_first() {
        let dir = tempdir().unwrap();
        let image = write_file(dir.path(), "photo.png", 2048);
        let video = write_file(dir.path(), "clip.mp4", 4096);

        let mut account = Account::new("pw");
        let report = upload_batch(&mut account, &[image, video], noop()).unwrap();

        assert_eq!(report.stored, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(account.media.len(), 2);
        assert_eq!(account.storage_used, 2048 + 4096);
        assert_eq!(
            account.storage_used,
            account.media.iter().map(|m| m.size).sum::<u64>()
        );
        let names: Vec<&str> = account.media.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"photo.png"));
        assert!(names.contains(&"clip.mp4"));
        assert_eq!(account.media.iter().filter(|m| m.kind == MediaKind::Image).count(), 1);
        assert_eq!(account.media.iter().filter(|m| m.kind == MediaKind::Video).count(), 1);
    }

    #[test]
    fn test_stored_data_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, b"pixel data goes here").unwrap();
        let candidate = UploadCandidate::from_path(&path).unwrap();

        let mut account = Account::new("pw");
        upload_batch(&mut account, &[candidate], noop()).unwrap();

        let item = &account.media[0];
        assert!(item.data.starts_with("data:image/png;base64,"));
        assert_eq!(
            media::decode_data_url(&item.data).unwrap(),
            b"pixel data goes here"
        );
        assert_eq!(item.file_type, "image/png");
    }

    #[test]
    fn test_batch_over_upload_ceiling_rejected() {
        let mut account = Account::new("pw");
        let big = fake_candidate("big.png", "image/png", MAX_UPLOAD_SIZE + 1);

        let err = upload_batch(&mut account, &[big], noop()).unwrap_err();
        assert_eq!(
            err,
            BatchError::TooLarge {
                total: MAX_UPLOAD_SIZE + 1
            }
        );
        assert!(account.media.is_empty());
        assert_eq!(account.storage_used, 0);
    }

    #[test]
    fn test_batch_over_quota_rejected() {
        let mut account = Account::new("pw");
        account.storage_used = crate::MAX_STORAGE_SIZE - 100;
        let candidate = fake_candidate("photo.png", "image/png", 500);

        let err = upload_batch(&mut account, &[candidate], noop()).unwrap_err();
        assert_eq!(err, BatchError::QuotaExceeded { shortfall: 400 });
        assert!(account.media.is_empty());
    }

    #[test]
    fn test_unsupported_type_skipped_rest_proceeds() {
        let dir = tempdir().unwrap();
        let image = write_file(dir.path(), "photo.png", 1024);
        let text = write_file(dir.path(), "notes.txt", 64);

        let mut account = Account::new("pw");
        let report = upload_batch(&mut account, &[text, image], noop()).unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "notes.txt");
        assert_eq!(report.skipped[0].reason, SkipReason::UnsupportedType);
        assert_eq!(account.media.len(), 1);
        assert_eq!(account.storage_used, 1024);
    }

    #[test]
    fn test_unreadable_file_skipped() {
        let dir = tempdir().unwrap();
        let image = write_file(dir.path(), "photo.png", 1024);
        let missing = fake_candidate("gone.png", "image/png", 512);

        let mut account = Account::new("pw");
        let report = upload_batch(&mut account, &[missing, image], noop()).unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::ReadFailed);
        assert_eq!(account.storage_used, 1024);
    }

    #[test]
    fn test_per_file_ceiling_enforced_independently() {
        let oversized = fake_candidate("huge.png", "image/png", MAX_UPLOAD_SIZE + 1);
        assert_eq!(validate(&oversized), Err(SkipReason::FileTooLarge));

        let fine = fake_candidate("photo.png", "image/png", 1024);
        assert_eq!(validate(&fine), Ok(MediaKind::Image));
    }

    #[test]
    fn test_progress_reaches_completion() {
        let dir = tempdir().unwrap();
        let image = write_file(dir.path(), "photo.png", 256);
        let text = write_file(dir.path(), "notes.txt", 64);

        let seen: std::sync::Arc<StdMutex<Vec<(u64, u64)>>> =
            std::sync::Arc::new(StdMutex::new(Vec::new()));
        let seen_cb = std::sync::Arc::clone(&seen);
        let progress = move |_stage: &str, current: u64, total: u64, _msg: &str| {
            seen_cb.lock().unwrap().push((current, total));
        };

        let mut account = Account::new("pw");
        upload_batch(&mut account, &[image, text], &progress).unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&(2, 2)));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut account = Account::new("pw");
        let report = upload_batch(&mut account, &[], noop()).unwrap();
        assert_eq!(report.stored, 0);
        assert!(report.skipped.is_empty());
    }
}
