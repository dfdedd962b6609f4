use crate::account::Account;
use crate::media::format_file_size;
use crate::MAX_STORAGE_SIZE;

/// Severity band for the storage display. Boundaries belong to the
/// higher band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    /// 75% and above
    Warning,
    /// 90% and above
    Critical,
}

/// Used/total quota view of one account.
#[derive(Debug, Clone, Copy)]
pub struct StorageMeter {
    pub used: u64,
    pub limit: u64,
}

impl StorageMeter {
    pub fn for_account(account: &Account) -> Self {
        Self {
            used: account.storage_used,
            limit: MAX_STORAGE_SIZE,
        }
    }

    /// Rounded percentage of the ceiling in use.
    pub fn percent(&self) -> u32 {
        if self.limit == 0 {
            return 100;
        }
        ((self.used as f64 / self.limit as f64) * 100.0).round() as u32
    }

    pub fn severity(&self) -> Severity {
        let percent = self.percent();
        if percent >= 90 {
            Severity::Critical
        } else if percent >= 75 {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

impl std::fmt::Display for StorageMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Storage: {} / {} ({}%)",
            format_file_size(self.used),
            format_file_size(self.limit),
            self.percent()
        )
    }
}
