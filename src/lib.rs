//! Interactive region-annotation engine plus its egui shell.
//!
//! The engine modules are headless: pointer events, box lifecycle,
//! coordinate projection, label resolution, and submission are all plain
//! state with no UI-toolkit types, so they are testable without a window.

pub mod app;
pub mod geometry;
pub mod gesture;
pub mod labels;
pub mod store;
pub mod submit;

pub use geometry::{CoordinateMapper, ImageLayout, OriginalImageSize, ProjectedBox};
pub use gesture::{pick_color, DrawPhase, GestureTracker, MIN_BOX_SIDE, PALETTE};
pub use labels::{LabelAssigner, LabelError};
pub use store::{BoundingBox, BoxStore};
pub use submit::{
    build_payload, prepare_metadata, submit_annotations, validate, HttpSubmitter, LabelingPayload,
    PayloadBox, SubmitError, Submitter,
};
