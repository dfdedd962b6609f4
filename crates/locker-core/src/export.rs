use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::account::Account;
use crate::media::{self, MediaItem};
use crate::{ProgressCallback, ThrottledProgress};

/// Decode one stored item back to bytes and write it under its original
/// name. Returns the written path.
pub fn write_item(item: &MediaItem, dest_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let bytes = media::decode_data_url(&item.data)?;
    let dest = dest_dir.join(&item.name);
    fs::write(&dest, bytes)?;
    Ok(dest)
}

/// Package every item of an account into `<username>_media_files.zip`
/// under a `<username>_media/` folder. Returns None when the account has
/// no media (nothing to export, no archive created).
pub fn export_archive(
    username: &str,
    account: &Account,
    dest_dir: &Path,
    progress: &ProgressCallback,
) -> anyhow::Result<Option<PathBuf>> {
    if account.media.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dest_dir)?;
    let archive_path = dest_dir.join(format!("{}_media_files.zip", username));
    let file = File::create(&archive_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    let tp = ThrottledProgress::new(progress);
    let folder = format!("{}_media", username);
    let total = account.media.len() as u64;

    // Stored names may repeat; colliding entries get name(1).ext, name(2).ext
    let mut used_names: HashSet<String> = HashSet::new();

    for (i, item) in account.media.iter().enumerate() {
        let entry_name = unique_entry_name(&item.name, &mut used_names);
        let options = SimpleFileOptions::default().last_modified_time(zip_datetime(item));
        writer.start_file(format!("{}/{}", folder, entry_name), options)?;
        let bytes = media::decode_data_url(&item.data)?;
        writer.write_all(&bytes)?;
        tp.report("export", i as u64, total, &item.name);
    }

    writer.finish()?;
    Ok(Some(archive_path))
}

fn unique_entry_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let mut counter = 1u32;
    loop {
        let candidate = if ext.is_empty() {
            format!("{}({})", stem, counter)
        } else {
            format!("{}({}).{}", stem, counter, ext)
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn zip_datetime(item: &MediaItem) -> zip::DateTime {
    let date = item.upload_date;
    zip::DateTime::from_date_and_time(
        date.year() as u16,
        date.month() as u8,
        date.day() as u8,
        date.hour() as u8,
        date.minute() as u8,
        date.second() as u8,
    )
    .unwrap_or_default()
}
