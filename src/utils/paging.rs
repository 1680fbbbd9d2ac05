//! Continuation handling for paged listings
//!
//! SDK listings arrive as a stream of pages; the file share REST listing
//! hands back a `NextMarker` to pass on the following request.

use crate::error::{AzstoreError, Result};
use futures::{Stream, TryStreamExt};
use std::future::Future;

/// Drain an SDK page stream, flattening each page with `items`.
pub async fn collect_pages<S, P, T, F>(stream: S, what: &str, mut items: F) -> Result<Vec<T>>
where
    S: Stream<Item = azure_core::Result<P>>,
    F: FnMut(P) -> Vec<T>,
{
    futures::pin_mut!(stream);
    let mut collected = Vec::new();

    while let Some(page) = stream
        .try_next()
        .await
        .map_err(|e| AzstoreError::azure_api(format!("Failed to list {what}: {e}")))?
    {
        collected.extend(items(page));
    }

    Ok(collected)
}

/// Request pages until the service stops returning a marker.
///
/// `fetch` receives the marker of the previous page (`None` for the first one)
/// and returns that page's items plus the next marker; an empty marker ends
/// the listing.
pub async fn collect_marked_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, String)>>,
{
    let mut collected = Vec::new();
    let mut marker = None;

    loop {
        let (items, next) = fetch(marker.take()).await?;
        collected.extend(items);
        if next.is_empty() {
            break;
        }
        tracing::trace!("Following listing marker {next}");
        marker = Some(next);
    }

    Ok(collected)
}
