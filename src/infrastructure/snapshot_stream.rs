// Chunked snapshot streaming: length-prefixed JSON frames
use crate::application::snapshot_hub::SnapshotHub;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Create a chunked streaming response, one frame per snapshot
pub fn chunked_snapshot_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = Arc<TelemetrySnapshot>> + Send + 'static,
{
    let byte_stream = stream.then(move |snapshot| async move { serialize_chunk(&snapshot, compress).await });

    let body = Body::from_stream(byte_stream);

    // Frames are compressed individually, so no Content-Encoding on the response itself
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize one snapshot: 4-byte big-endian length, then the (optionally compressed) JSON
async fn serialize_chunk(snapshot: &TelemetrySnapshot, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(snapshot)?;

    let payload = if compress {
        brotli_compress(json).await?
    } else {
        json
    };

    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream the hub's latest snapshot followed by every new one
pub fn snapshot_stream(hub: &SnapshotHub) -> impl Stream<Item = Arc<TelemetrySnapshot>> + Send + 'static {
    let mut rx = hub.stream();
    let first = hub.latest();

    async_stream::stream! {
        let mut last: Option<Arc<TelemetrySnapshot>> = None;
        if let Some(snapshot) = first {
            last = Some(snapshot.clone());
            yield snapshot;
        }

        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    // The latest snapshot may also be queued on the receiver
                    if last.as_ref().is_some_and(|l| Arc::ptr_eq(l, &snapshot)) {
                        continue;
                    }
                    last = Some(snapshot.clone());
                    yield snapshot;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Snapshot stream lagged, skipped {} snapshots", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

pub fn stream_from_hub(hub: &SnapshotHub, compress: bool) -> Response<Body> {
    match chunked_snapshot_stream(snapshot_stream(hub), compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
