use std::str::FromStr;

use crate::account::Account;
use crate::media::{MediaItem, MediaKind};

/// Type filter for the gallery view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Image,
    Video,
}

impl FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(MediaFilter::All),
            "image" => Ok(MediaFilter::Image),
            "video" => Ok(MediaFilter::Video),
            other => Err(format!(
                "unknown filter {:?} (expected all, image or video)",
                other
            )),
        }
    }
}

impl MediaFilter {
    fn matches(self, kind: MediaKind) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Image => kind == MediaKind::Image,
            MediaFilter::Video => kind == MediaKind::Video,
        }
    }
}

/// Items matching the filter, in stored (newest first) order.
pub fn filter_media(account: &Account, filter: MediaFilter) -> Vec<&MediaItem> {
    account
        .media
        .iter()
        .filter(|item| filter.matches(item.kind))
        .collect()
}
