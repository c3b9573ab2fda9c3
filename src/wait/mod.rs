//! Blocking poll-until-visible helpers.
//!
//! A wait repeatedly captures a fresh frame through a caller-supplied closure
//! and probes it until the probe reports a location or the timeout elapses.
//! Capture errors end the wait immediately and are returned unchanged.

use crate::image::Image;
use crate::ocr::{OcrEngine, TextExtractor};
use crate::search::{MatchConfig, MatchLocation, Matcher};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::VisionError;
use std::time::{Duration, Instant};

/// Waiter state. `Found` and `TimedOut` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitState {
    Polling,
    Found,
    TimedOut,
}

/// Waiter configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaitConfig {
    /// Total time budget, measured from the start of the wait.
    pub timeout: Duration,
    /// Pause between probes; clipped so no sleep runs past the deadline.
    pub poll_interval: Duration,
    /// Minimum correlation for image waits.
    pub confidence_threshold: f32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            confidence_threshold: 0.8,
        }
    }
}

/// How a wait ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaitOutcome {
    pub state: WaitState,
    /// Number of probes run, at least one.
    pub attempts: usize,
    pub elapsed: Duration,
    /// Location reported by the successful probe.
    pub location: Option<MatchLocation>,
}

impl WaitOutcome {
    pub fn is_found(&self) -> bool {
        self.state == WaitState::Found
    }
}

/// Runs `probe` until it returns a location or `cfg.timeout` elapses.
///
/// The probe always runs at least once, even with a zero timeout.
pub fn poll_until<E, F>(cfg: &WaitConfig, mut probe: F) -> Result<WaitOutcome, E>
where
    F: FnMut() -> Result<Option<MatchLocation>, E>,
{
    let _span = trace_span!(
        "wait_poll",
        timeout_ms = cfg.timeout.as_millis() as u64,
        poll_interval_ms = cfg.poll_interval.as_millis() as u64
    )
    .entered();

    let start = Instant::now();
    let mut state = WaitState::Polling;
    let mut attempts = 0usize;
    let mut location = None;

    while state == WaitState::Polling {
        attempts += 1;
        location = probe()?;
        let elapsed = start.elapsed();
        trace_debug!(
            "attempt",
            attempts = attempts,
            found = location.is_some(),
            elapsed_ms = elapsed.as_millis() as u64
        );

        if location.is_some() {
            state = WaitState::Found;
        } else if elapsed >= cfg.timeout {
            state = WaitState::TimedOut;
        } else {
            std::thread::sleep(cfg.poll_interval.min(cfg.timeout - elapsed));
        }
    }

    let elapsed = start.elapsed();
    trace_event!(
        "wait_done",
        found = state == WaitState::Found,
        attempts = attempts,
        elapsed_ms = elapsed.as_millis() as u64
    );
    Ok(WaitOutcome {
        state,
        attempts,
        elapsed,
        location,
    })
}

/// Polls `capture` until `reference` appears with at least
/// `cfg.confidence_threshold` correlation.
pub fn wait_for_image_outcome<E, C>(
    reference: &Image,
    mut capture: C,
    cfg: &WaitConfig,
) -> Result<WaitOutcome, E>
where
    E: From<VisionError>,
    C: FnMut() -> Result<Image, E>,
{
    let matcher = Matcher::new(reference).with_config(MatchConfig {
        confidence_threshold: cfg.confidence_threshold,
        ..MatchConfig::default()
    });
    poll_until::<E, _>(cfg, || {
        let frame = capture()?;
        Ok(matcher.find(&frame)?)
    })
}

/// Returns `true` once `reference` is visible, `false` on timeout.
pub fn wait_for_image<E, C>(reference: &Image, capture: C, cfg: &WaitConfig) -> Result<bool, E>
where
    E: From<VisionError>,
    C: FnMut() -> Result<Image, E>,
{
    Ok(wait_for_image_outcome(reference, capture, cfg)?.is_found())
}

/// Polls `capture` until `target` is recognised in a frame.
///
/// Token confidence is governed by the extractor's `confidence_floor`;
/// `cfg.confidence_threshold` applies to image waits only.
pub fn wait_for_text_outcome<O, E, C>(
    extractor: &TextExtractor<O>,
    target: &str,
    case_sensitive: bool,
    mut capture: C,
    cfg: &WaitConfig,
) -> Result<WaitOutcome, E>
where
    O: OcrEngine,
    E: From<VisionError>,
    C: FnMut() -> Result<Image, E>,
{
    poll_until::<E, _>(cfg, || {
        let frame = capture()?;
        Ok(extractor.find_text_location(&frame, target, case_sensitive)?)
    })
}

/// Returns `true` once `target` is recognised in a captured frame.
pub fn wait_for_text<O, E, C>(
    extractor: &TextExtractor<O>,
    target: &str,
    case_sensitive: bool,
    capture: C,
    cfg: &WaitConfig,
) -> Result<bool, E>
where
    O: OcrEngine,
    E: From<VisionError>,
    C: FnMut() -> Result<Image, E>,
{
    let outcome =
        wait_for_text_outcome::<O, E, C>(extractor, target, case_sensitive, capture, cfg)?;
    Ok(outcome.is_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::search::ConfidenceScale;

    fn hit() -> MatchLocation {
        MatchLocation {
            bbox: BoundingBox::new(1, 2, 3, 4),
            confidence: 0.9,
            scale: ConfidenceScale::Unit,
        }
    }

    #[test]
    fn zero_timeout_probes_once() {
        let cfg = WaitConfig {
            timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(500),
            confidence_threshold: 0.8,
        };
        let outcome = poll_until::<VisionError, _>(&cfg, || Ok(None)).unwrap();
        assert_eq!(outcome.state, WaitState::TimedOut);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.elapsed < Duration::from_millis(500));
    }

    #[test]
    fn stops_on_first_hit() {
        let cfg = WaitConfig {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
            confidence_threshold: 0.8,
        };
        let mut calls = 0;
        let outcome = poll_until::<VisionError, _>(&cfg, || {
            calls += 1;
            Ok((calls == 3).then(hit))
        })
        .unwrap();
        assert!(outcome.is_found());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.location, Some(hit()));
    }

    #[test]
    fn probe_errors_end_the_wait() {
        let cfg = WaitConfig::default();
        let err = poll_until(&cfg, || {
            Err::<Option<MatchLocation>, _>(VisionError::Engine {
                reason: "boom".to_string(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, VisionError::Engine { .. }));
    }
}
