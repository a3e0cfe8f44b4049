//! Device and self-location markers.

mod reconciler;

pub use reconciler::{
    truncate_label, FallbackReason, MarkerEntry, MarkerReconciler, ReconcileResult,
    ViewportDecision, FIT_PADDING, LABEL_MAX_CHARS, MIN_FIT_SPAN_DEG, SELF_LOCATION_ID,
};
