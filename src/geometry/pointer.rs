//! Pointer event sequences for clicks and drags.

use super::{interpolate_path, Point};
use crate::util::VisionResult;

/// Primitive pointer action understood by a dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    Down,
    Up,
}

/// One action at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub point: Point,
    pub action: PointerAction,
}

impl PointerEvent {
    pub const fn new(point: Point, action: PointerAction) -> Self {
        Self { point, action }
    }
}

/// Performs pointer events on a UI surface (browser page, device, ...).
pub trait PointerDispatcher {
    type Error;

    fn dispatch(&mut self, event: PointerEvent) -> Result<(), Self::Error>;
}

/// Move, press and release at `point`.
pub fn click_sequence(point: Point) -> Vec<PointerEvent> {
    vec![
        PointerEvent::new(point, PointerAction::Move),
        PointerEvent::new(point, PointerAction::Down),
        PointerEvent::new(point, PointerAction::Up),
    ]
}

/// Press at `from`, move along an interpolated path of `steps` points, release at `to`.
pub fn drag_sequence(from: Point, to: Point, steps: usize) -> VisionResult<Vec<PointerEvent>> {
    let path = interpolate_path(from, to, steps)?;
    let mut events = Vec::with_capacity(path.len() + 3);
    events.push(PointerEvent::new(from, PointerAction::Move));
    events.push(PointerEvent::new(from, PointerAction::Down));
    events.extend(
        path.into_iter()
            .map(|p| PointerEvent::new(p, PointerAction::Move)),
    );
    events.push(PointerEvent::new(to, PointerAction::Up));
    Ok(events)
}

/// Dispatches `events` in order, stopping at the first failure.
pub fn dispatch_all<D: PointerDispatcher>(
    dispatcher: &mut D,
    events: &[PointerEvent],
) -> Result<(), D::Error> {
    for event in events {
        dispatcher.dispatch(*event)?;
    }
    Ok(())
}
