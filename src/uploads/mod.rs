//! Local disk storage for project photos and attachments.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// URL prefix the upload directory is served under
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_name: String,
    /// Public path, e.g. `/uploads/photos/1700000000000-a1b2c3-site.jpg`
    pub file_path: String,
    pub mime_type: String,
    pub file_size: i64,
}

/// Keep letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers on Windows send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() { "file".to_string() } else { trimmed.to_string() }
}

/// Write `bytes` under `<root>/<category>/` with a unique name.
pub async fn store(
    root: &Path,
    category: &str,
    original_name: &str,
    mime_type: Option<String>,
    bytes: &[u8],
) -> std::io::Result<StoredFile> {
    let dir: PathBuf = root.join(category);
    tokio::fs::create_dir_all(&dir).await?;

    let stored_name = format!("{}-{}", crate::resources::generate_id(), sanitize_file_name(original_name));
    tokio::fs::write(dir.join(&stored_name), bytes).await?;
    tracing::info!("Stored upload {}/{} ({} bytes)", category, stored_name, bytes.len());

    Ok(StoredFile {
        file_name: original_name.to_string(),
        file_path: format!("{}/{}/{}", PUBLIC_PREFIX, category, stored_name),
        mime_type: mime_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        file_size: bytes.len() as i64,
    })
}

/// Best-effort removal of a stored file whose row could not be written
pub async fn discard(root: &Path, file: &StoredFile) {
    let Some(relative) = file.file_path.strip_prefix(PUBLIC_PREFIX) else { return };
    let path = root.join(relative.trim_start_matches('/'));
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!("Failed to remove orphaned upload {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_paths_and_odd_characters() {
        assert_eq!(sanitize_file_name("C:\\Users\\me\\site photo (1).jpg"), "site_photo__1_.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".env"), "env");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[tokio::test]
    async fn stores_and_discards() {
        let root = std::env::temp_dir().join(format!("pmis-upload-test-{}", uuid::Uuid::new_v4()));
        let stored = store(&root, "photos", "bridge.png", Some("image/png".into()), b"png-bytes")
            .await
            .unwrap();
        assert!(stored.file_path.starts_with("/uploads/photos/"));
        assert!(stored.file_path.ends_with("-bridge.png"));
        assert_eq!(stored.file_size, 9);

        let on_disk = root.join(stored.file_path.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        discard(&root, &stored).await;
        assert!(!on_disk.exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
