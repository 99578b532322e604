//! 写真の取り込み（デコードはブロッキングスレッドで並行実行）

use tokio::task::spawn_blocking;

use super::decode::{decode_upload, StoredImage, Upload};
use super::FormStore;
use crate::error::Result;

/// Keep only entries whose declared media type is an image. Rejected
/// entries are dropped without error.
pub fn accept_images(uploads: Vec<Upload>) -> Vec<Upload> {
    uploads
        .into_iter()
        .filter(|upload| {
            let accepted = upload.is_image();
            if !accepted {
                tracing::debug!(file = %upload.file_name, media_type = %upload.media_type, "skipping non-image");
            }
            accepted
        })
        .collect()
}

/// Decode every image upload concurrently; results keep input order.
pub async fn decode_uploads(uploads: Vec<Upload>) -> Vec<StoredImage> {
    let handles: Vec<_> = accept_images(uploads)
        .into_iter()
        .map(|upload| spawn_blocking(move || decode_upload(upload)))
        .collect();

    let mut decoded = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(image) => decoded.push(image),
            Err(e) => tracing::warn!(error = %e, "decode task failed"),
        }
    }
    decoded
}

/// Photo Intake: filter, decode, append, cap at three. Returns how many
/// photos the form holds afterwards.
pub async fn add_photos(store: &mut FormStore, uploads: Vec<Upload>) -> usize {
    let ticket = store.begin_photo_batch();
    let decoded = decode_uploads(uploads).await;
    store.complete_photos(ticket, decoded);
    store.photos().len()
}

/// Attach evidence to one checklist item. `Ok(false)` when the upload was
/// not an image.
pub async fn attach_evidence(store: &mut FormStore, item_id: &str, upload: Upload) -> Result<bool> {
    let Some(ticket) = store.begin_evidence(item_id, &upload)? else {
        return Ok(false);
    };
    match spawn_blocking(move || decode_upload(upload)).await {
        Ok(image) => Ok(store.complete_evidence(ticket, image)),
        Err(e) => {
            tracing::warn!(item = item_id, error = %e, "evidence decode task failed");
            Ok(false)
        }
    }
}
