//! visverify is a CPU-only visual verification toolkit for UI test automation.
//!
//! It compares screenshots, locates a reference image inside a capture,
//! extracts text through a pluggable OCR engine, polls captures until an
//! element appears, and computes pointer geometry. Everything is synchronous
//! and single-threaded; structured logging is available behind the `tracing`
//! feature.

mod trace;

mod candidate;
pub mod compare;
pub mod geometry;
pub mod image;
pub mod ocr;
pub mod search;
pub mod template;
pub mod util;
pub mod wait;

pub use compare::{
    compare, diff_mask, highlight_differences, Comparator, CompareConfig, ComparisonResult, Method,
};
pub use geometry::{
    click_sequence, dispatch_all, distance, drag_sequence, interpolate_path, is_in_viewport,
    offset_point, relative_position, BoundingBox, Point, PointerAction, PointerDispatcher,
    PointerEvent, RelativePosition,
};
pub use image::{Image, ImageFormat};
pub use ocr::{
    OcrConfig, OcrEngine, OcrWord, PageSegMode, TesseractEngine, TextExtractor, TextToken,
};
pub use search::{find, find_all, ConfidenceScale, MatchConfig, MatchLocation, Matcher};
pub use template::TemplatePlan;
pub use util::{VisionError, VisionResult};
pub use wait::{
    poll_until, wait_for_image, wait_for_image_outcome, wait_for_text, wait_for_text_outcome,
    WaitConfig, WaitOutcome, WaitState,
};
