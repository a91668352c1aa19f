//! Writing a payload out as a PNG image or plain text.

use std::path::Path;

use super::error::Result;
use super::qr;

/// Render `payload` as a QR code and save it as PNG.
pub async fn save_png(path: &Path, payload: &str, scale: u32) -> Result<()> {
    let text = payload.to_string();
    let png = tokio::task::spawn_blocking(move || {
        let image = qr::encode(&text, scale)?;
        qr::render_png(&image)
    })
    .await
    .map_err(std::io::Error::other)??;

    tokio::fs::write(path, png).await?;
    tracing::info!("Saved QR image to {}", path.display());
    Ok(())
}

/// Save the payload text as-is, without a trailing newline.
pub async fn save_text(path: &Path, payload: &str) -> Result<()> {
    tokio::fs::write(path, payload).await?;
    tracing::info!("Saved QR text to {}", path.display());
    Ok(())
}
