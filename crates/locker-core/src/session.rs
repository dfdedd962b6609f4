use std::fs;
use std::path::Path;

/// Session marker filename inside the data directory
pub const SESSION_FILENAME: &str = ".session";

/// Read the active username, if a session marker exists.
pub fn load(data_dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(data_dir.join(SESSION_FILENAME)).ok()?;
    let name = raw.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Record the active username.
pub fn set(data_dir: &Path, username: &str) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;
    fs::write(data_dir.join(SESSION_FILENAME), username)?;
    Ok(())
}

/// Remove the marker. A missing marker is fine.
pub fn clear(data_dir: &Path) -> anyhow::Result<()> {
    let path = data_dir.join(SESSION_FILENAME);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}
