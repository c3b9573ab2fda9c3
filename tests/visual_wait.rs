use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use visverify::{
    wait_for_image, wait_for_image_outcome, wait_for_text, wait_for_text_outcome, BoundingBox,
    ConfidenceScale, Image, OcrConfig, OcrEngine, OcrWord, TextExtractor, VisionError,
    VisionResult, WaitConfig, WaitState,
};

#[derive(Debug, PartialEq)]
enum CaptureError {
    Disconnected,
    Vision(VisionError),
}

impl From<VisionError> for CaptureError {
    fn from(value: VisionError) -> Self {
        CaptureError::Vision(value)
    }
}

fn noise(rng: &mut StdRng, width: usize, height: usize) -> Image {
    let mut data = vec![0u8; width * height];
    for value in data.iter_mut() {
        *value = rng.random_range(0..=255);
    }
    Image::new(data, width, height, 1).unwrap()
}

fn paste(canvas: &Image, patch: &Image, x0: usize, y0: usize) -> Image {
    let width = canvas.width();
    let mut data = canvas.data().to_vec();
    for y in 0..patch.height() {
        for x in 0..patch.width() {
            data[(y0 + y) * width + x0 + x] = patch.pixel(x, y).unwrap()[0];
        }
    }
    Image::new(data, width, canvas.height(), 1).unwrap()
}

fn fast(timeout_ms: u64, poll_ms: u64) -> WaitConfig {
    WaitConfig {
        timeout: Duration::from_millis(timeout_ms),
        poll_interval: Duration::from_millis(poll_ms),
        ..WaitConfig::default()
    }
}

#[test]
fn defaults_follow_documented_values() {
    let cfg = WaitConfig::default();
    assert_eq!(cfg.timeout, Duration::from_secs(30));
    assert_eq!(cfg.poll_interval, Duration::from_secs(1));
    assert_eq!(cfg.confidence_threshold, 0.8);
}

#[test]
fn times_out_within_budget_when_reference_never_appears() {
    let mut rng = StdRng::seed_from_u64(1);
    let reference = noise(&mut rng, 10, 10);
    let screen = noise(&mut rng, 48, 48);
    let cfg = fast(200, 50);

    let start = Instant::now();
    let found = wait_for_image::<VisionError, _>(&reference, || Ok(screen.clone()), &cfg).unwrap();
    let elapsed = start.elapsed();

    assert!(!found);
    assert!(elapsed >= cfg.timeout);
    assert!(elapsed < cfg.timeout + cfg.poll_interval + Duration::from_millis(250));
}

#[test]
fn found_on_a_later_capture() {
    let mut rng = StdRng::seed_from_u64(2);
    let reference = noise(&mut rng, 8, 8);
    let before = noise(&mut rng, 40, 30);
    let after = paste(&before, &reference, 17, 9);
    let cfg = fast(5_000, 5);

    let mut captures = 0;
    let outcome = wait_for_image_outcome::<VisionError, _>(
        &reference,
        || {
            captures += 1;
            Ok(if captures < 3 {
                before.clone()
            } else {
                after.clone()
            })
        },
        &cfg,
    )
    .unwrap();

    assert_eq!(outcome.state, WaitState::Found);
    assert_eq!(outcome.attempts, 3);
    assert!(outcome.elapsed < cfg.timeout);
    let location = outcome.location.unwrap();
    assert_eq!(location.bbox, BoundingBox::new(17, 9, 8, 8));
    assert!(location.confidence >= cfg.confidence_threshold);
}

#[test]
fn capture_errors_propagate_unchanged() {
    let mut rng = StdRng::seed_from_u64(3);
    let reference = noise(&mut rng, 4, 4);
    let mut calls = 0;
    let err = wait_for_image(
        &reference,
        || {
            calls += 1;
            Err::<Image, _>(CaptureError::Disconnected)
        },
        &WaitConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, CaptureError::Disconnected);
    assert_eq!(calls, 1);
}

#[test]
fn matcher_errors_convert_into_the_capture_error() {
    let mut rng = StdRng::seed_from_u64(4);
    let reference = noise(&mut rng, 20, 20);
    let tiny = noise(&mut rng, 8, 8);
    let err = wait_for_image(&reference, || Ok::<_, CaptureError>(tiny.clone()), &fast(100, 10))
        .unwrap_err();
    assert!(matches!(
        err,
        CaptureError::Vision(VisionError::InvalidArgument { .. })
    ));
}

struct AppearsAfter {
    threshold: usize,
    calls: std::cell::Cell<usize>,
}

impl OcrEngine for AppearsAfter {
    fn recognize(&self, _image: &Image, _cfg: &OcrConfig) -> VisionResult<Vec<OcrWord>> {
        let n = self.calls.get() + 1;
        self.calls.set(n);
        if n < self.threshold {
            return Ok(Vec::new());
        }
        Ok(vec![OcrWord {
            text: "Welcome".to_string(),
            bbox: BoundingBox::new(5, 5, 60, 20),
            confidence: 91.0,
        }])
    }
}

#[test]
fn waits_for_text_to_render() {
    let engine = AppearsAfter {
        threshold: 2,
        calls: std::cell::Cell::new(0),
    };
    let ocr = TextExtractor::new(&engine);
    let frame = Image::filled(120, 80, &[255, 255, 255]).unwrap();

    let found = wait_for_text::<_, VisionError, _>(
        &ocr,
        "welcome",
        false,
        || Ok(frame.clone()),
        &fast(2_000, 5),
    )
    .unwrap();
    assert!(found);
    assert_eq!(engine.calls.get(), 2);

    let missing = wait_for_text::<_, VisionError, _>(
        &ocr,
        "Goodbye",
        true,
        || Ok(frame.clone()),
        &fast(30, 10),
    )
    .unwrap();
    assert!(!missing);
}

#[test]
fn text_wait_outcome_reports_attempts_and_location() {
    let engine = AppearsAfter {
        threshold: 3,
        calls: std::cell::Cell::new(0),
    };
    let ocr = TextExtractor::new(&engine).with_config(OcrConfig {
        preprocess: false,
        ..OcrConfig::default()
    });
    let frame = Image::filled(120, 80, &[255, 255, 255]).unwrap();

    let mut captures = 0;
    let outcome = wait_for_text_outcome(
        &ocr,
        "Welcome",
        true,
        || {
            captures += 1;
            Ok::<_, CaptureError>(frame.clone())
        },
        &fast(2_000, 5),
    )
    .unwrap();

    assert_eq!(outcome.state, WaitState::Found);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(captures, 3);
    let location = outcome.location.unwrap();
    assert_eq!(location.bbox, BoundingBox::new(5, 5, 60, 20));
    assert_eq!(location.scale, ConfidenceScale::Percent);
}
