//! Submission validation, payload building, and the upload collaborator.

use crate::geometry::{CoordinateMapper, ImageLayout, NotReady, OriginalImageSize};
use crate::store::BoxStore;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("add at least one bounding box before submitting")]
    NoBoxes,
    #[error("unlabeled boxes remain: {0:?}")]
    UnlabeledBoxes(Vec<u64>),
    #[error("image layout or original size not resolved yet")]
    NotReady,
    #[error("upload failed: {0}")]
    Network(String),
}

impl From<NotReady> for SubmitError {
    fn from(_: NotReady) -> Self {
        SubmitError::NotReady
    }
}

/// One box of the submission metadata, in original-image pixel space with
/// `x1 <= x2` and `y1 <= y2`. The display color is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadBox {
    pub label: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// The metadata JSON handed to the submit collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelingPayload {
    pub boxes: Vec<PayloadBox>,
    pub image_width: u32,
    pub image_height: u32,
}

/// External collaborator that carries the image bytes and metadata JSON in
/// a single request and reports success or failure.
pub trait Submitter {
    fn submit(&self, image: &[u8], metadata_json: &str) -> Result<(), SubmitError>;
}

/// Pre-network validation, in order: an empty store, then unlabeled boxes.
pub fn validate(store: &BoxStore) -> Result<(), SubmitError> {
    if store.is_empty() {
        return Err(SubmitError::NoBoxes);
    }
    let unlabeled = store.unlabeled_ids();
    if !unlabeled.is_empty() {
        return Err(SubmitError::UnlabeledBoxes(unlabeled));
    }
    Ok(())
}

/// Projects every stored box into original-image space. Idempotent over an
/// unchanged store. Fails with `NotReady` until both readiness inputs exist.
pub fn build_payload(
    store: &BoxStore,
    layout: Option<ImageLayout>,
    original: Option<OriginalImageSize>,
) -> Result<LabelingPayload, SubmitError> {
    let mapper = CoordinateMapper::resolve(layout, original)?;
    let original = original.ok_or(SubmitError::NotReady)?;
    let boxes = store
        .boxes()
        .iter()
        .map(|b| {
            let p = mapper.project(b);
            PayloadBox {
                label: b.label.clone(),
                x1: p.x1,
                y1: p.y1,
                x2: p.x2,
                y2: p.y2,
            }
        })
        .collect();
    Ok(LabelingPayload {
        boxes,
        image_width: original.width,
        image_height: original.height,
    })
}

/// Validates the store and serializes the metadata JSON from a snapshot of
/// it. Shared by the synchronous orchestration below and by shells that
/// upload on a background thread after snapshotting.
pub fn prepare_metadata(
    store: &BoxStore,
    layout: Option<ImageLayout>,
    original: Option<OriginalImageSize>,
) -> Result<String, SubmitError> {
    validate(store)?;
    let payload = build_payload(store, layout, original)?;
    serde_json::to_string(&payload)
        .map_err(|e| SubmitError::Network(format!("encode metadata: {e}")))
}

/// Validates, builds the payload from a snapshot of the store, and invokes
/// the collaborator. On success the store is cleared and the number of
/// submitted boxes returned; on any failure the store is left untouched so
/// the user can fix input or retry.
pub fn submit_annotations(
    store: &mut BoxStore,
    layout: Option<ImageLayout>,
    original: Option<OriginalImageSize>,
    image: &[u8],
    submitter: &dyn Submitter,
) -> Result<usize, SubmitError> {
    let metadata = prepare_metadata(store, layout, original)?;

    log::info!("submitting {} box(es)", store.len());
    submitter.submit(image, &metadata)?;

    let submitted = store.len();
    store.clear();
    Ok(submitted)
}

// ── HTTP collaborator ───────────────────────────────────────────────────────

const IMAGE_FIELD: &str = "image";
const IMAGE_FILENAME: &str = "labeled_image.jpg";
const METADATA_FIELD: &str = "labeling_data";

/// Frames a two-field multipart/form-data body: the image bytes as a file
/// part and the metadata JSON as a text part.
pub fn encode_multipart(boundary: &str, image: &[u8], metadata_json: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(image.len() + metadata_json.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{IMAGE_FIELD}\"; \
             filename=\"{IMAGE_FILENAME}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(
        format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{METADATA_FIELD}\"\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Uploads submissions to the training backend over HTTP.
#[derive(Clone)]
pub struct HttpSubmitter {
    endpoint: String,
}

impl HttpSubmitter {
    /// `endpoint` is the service base URL, e.g. `http://localhost:8000`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/labeling/submit", self.endpoint.trim_end_matches('/'))
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&self, image: &[u8], metadata_json: &str) -> Result<(), SubmitError> {
        let boundary = format!("----label-submit-{:016x}", rand::random::<u64>());
        let body = encode_multipart(&boundary, image, metadata_json);

        let response = ureq::post(&self.url())
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body);

        match response {
            Ok(resp) => {
                log::info!("backend accepted the submission ({})", resp.status());
                Ok(())
            }
            Err(ureq::Error::Status(code, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                Err(SubmitError::Network(format!("status {code}: {detail}")))
            }
            Err(ureq::Error::Transport(t)) => Err(SubmitError::Network(t.to_string())),
        }
    }
}
