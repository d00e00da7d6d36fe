//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::info;

/// Ensure the data directory used by the file backend exists.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(data_dir).await.is_err() {
        info!(%data_dir, "creating data directory");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_data_dir() -> anyhow::Result<()> {
        let pid = std::process::id();
        let root = std::env::temp_dir().join(format!("rack_tracker_env_{pid}"));
        let nested = root.join("a/b");
        let nested_str = nested.to_string_lossy().to_string();
        ensure_data_dir(&nested_str).await?;
        assert!(tokio::fs::metadata(&nested).await?.is_dir());
        // idempotent
        ensure_data_dir(&nested_str).await?;
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
