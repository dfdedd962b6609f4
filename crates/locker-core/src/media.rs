use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse media category, derived from the top-level MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Categorize a full MIME type string. Anything that is not
    /// `image/*` or `video/*` is unsupported.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One stored image or video: full content plus metadata, immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: Uuid,
    /// Original filename, kept as uploaded (a later upload may reuse a name)
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Byte length of the original file
    pub size: u64,
    /// Human-readable size, fixed at upload time
    pub formatted_size: String,
    /// Full contents as a `data:` URL
    pub data: String,
    /// Full MIME type string
    pub file_type: String,
    pub upload_date: DateTime<Utc>,
}

impl MediaItem {
    pub fn new(name: String, file_type: String, kind: MediaKind, size: u64, data: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            size,
            formatted_size: format_file_size(size),
            data,
            file_type,
            upload_date: Utc::now(),
        }
    }
}

/// Encode raw bytes as a self-describing `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Decode the payload of a `data:` URL back to raw bytes.
pub fn decode_data_url(data: &str) -> anyhow::Result<Vec<u8>> {
    let payload = data.split_once(',').map(|(_, p)| p).unwrap_or(data);
    Ok(BASE64.decode(payload)?)
}

/// Human-readable size: 1024 base, two decimals with trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("text/plain"), None);
        assert_eq!(MediaKind::from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1536 * 1024 * 1024), "1.5 GB");
    }

    #[test]
    fn test_data_url_round_trip() {
        let bytes = b"\x89PNG\r\n\x1a\nnot really a png";
        let url = encode_data_url("image/png", bytes);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), bytes);
    }

    #[test]
    fn test_item_json_shape() {
        let item = MediaItem::new(
            "photo.jpg".to_string(),
            "image/jpeg".to_string(),
            MediaKind::Image,
            4,
            encode_data_url("image/jpeg", b"abcd"),
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["size"], 4);
        assert_eq!(value["formattedSize"], "4 Bytes");
        assert_eq!(value["fileType"], "image/jpeg");
        assert!(value["uploadDate"].is_string());
        assert!(value["id"].is_string());

        let back: MediaItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }
}
