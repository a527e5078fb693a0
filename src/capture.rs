//! Turns pointer events into freehand strokes.
//!
//! Pointer positions arrive in view-space; accepted samples are stored in source-space so that
//! strokes stay attached to the image while it is zoomed and panned.

use std::sync::Arc;

use anyhow::bail;

use crate::{
    math::Vec2f,
    path::PathCommand,
    viewport::CoordinateTransform,
};

/// Minimum pointer movement (in view pixels) per unit of stroke width for a sample to be accepted.
pub const THRESHOLD_PER_STROKE_WIDTH: f32 = 0.5;

/// An ordered sequence of source-space points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stroke {
    points: Vec<Vec2f>,
}

impl Stroke {
    pub fn from_points(points: Vec<Vec2f>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec2f] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A `Move` to the first point followed by a `Line` to each of the others.
    pub fn commands(&self) -> Vec<PathCommand> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    PathCommand::Move(p.x(), p.y())
                } else {
                    PathCommand::Line(p.x(), p.y())
                }
            })
            .collect()
    }
}

/// Rebuilds strokes from path commands. Every `Move` starts a new stroke.
pub fn strokes_from_commands(commands: &[PathCommand]) -> anyhow::Result<Vec<Stroke>> {
    let mut strokes: Vec<Stroke> = Vec::new();
    for command in commands {
        match command {
            PathCommand::Move(..) => strokes.push(Stroke::from_points(vec![command.target()])),
            PathCommand::Line(..) => match strokes.last_mut() {
                Some(stroke) => stroke.points.push(command.target()),
                None => bail!("path data must start with a move command (found '{command}')"),
            },
        }
    }
    Ok(strokes)
}

/// State of the gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Session {
    /// No pointer is down.
    Idle,
    /// A single pointer is down and may be drawing.
    Tracking {
        /// View-space position where the pointer went down.
        start: Vec2f,
        /// View-space position of the last accepted sample.
        last: Vec2f,
        /// `start` converted to source-space, once the first sample has been accepted.
        source_start: Option<Vec2f>,
    },
    /// A second pointer went down; the gesture belongs to the host's pan/zoom handling.
    Suspended,
}

/// Outcome of handling a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The event was not used and should be passed on to the host.
    Ignored,
    /// The event was used, but nothing visible changed.
    Consumed,
    /// The event was used and the strokes changed; a redraw is needed.
    Changed,
}

impl Response {
    pub fn is_consumed(self) -> bool {
        self != Response::Ignored
    }
}

/// A read-only view of the strokes at one point in time.
///
/// Later captures never alter a snapshot: closed strokes are immutable and the open stroke is
/// copied before it is appended to while a snapshot still references it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub strokes: Vec<Arc<Stroke>>,
    pub open: Option<Arc<Stroke>>,
}

impl Snapshot {
    /// All strokes in paint order, the open one last.
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().chain(&self.open).map(|s| &**s)
    }
}

pub struct StrokeCapture {
    threshold: f32,
    session: Session,
    /// Closed strokes, in drawing order.
    strokes: Vec<Arc<Stroke>>,
    open: Option<Arc<Stroke>>,
    /// Strokes removed by `undo`, most recent last.
    undone: Vec<Arc<Stroke>>,
}

impl StrokeCapture {
    /// Creates a capture that accepts samples once they are `threshold` view pixels away from the
    /// last accepted one on either axis.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            session: Session::Idle,
            strokes: Vec::new(),
            open: None,
            undone: Vec::new(),
        }
    }

    pub fn for_stroke_width(stroke_width: f32) -> Self {
        Self::new(stroke_width * THRESHOLD_PER_STROKE_WIDTH)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes
    }

    pub fn open_stroke(&self) -> Option<&Stroke> {
        self.open.as_deref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            strokes: self.strokes.clone(),
            open: self.open.clone(),
        }
    }

    /// A pointer went down. `index` 0 is the primary pointer.
    ///
    /// The host always gets to see pointer-down events too, so this returns
    /// [`Response::Ignored`].
    pub fn on_pointer_down(&mut self, index: usize, position: Vec2f) -> Response {
        if index == 0 {
            self.close_open();
            self.session = Session::Tracking {
                start: position,
                last: position,
                source_start: None,
            };
        } else {
            if self.session != Session::Suspended {
                log::trace!("pointer {index} down, suspending capture");
            }
            self.session = Session::Suspended;
        }
        Response::Ignored
    }

    /// The pointer moved to `position` with `active_pointers` pointers down.
    ///
    /// Single-pointer moves are always consumed, even when they are not drawn, so that the host
    /// does not pan on a one-finger drag.
    pub fn on_pointer_move<T>(
        &mut self,
        transform: &T,
        position: Vec2f,
        active_pointers: usize,
    ) -> Response
    where
        T: CoordinateTransform + ?Sized,
    {
        if active_pointers != 1 {
            return Response::Ignored;
        }
        let Session::Tracking {
            start,
            last,
            source_start,
        } = &mut self.session
        else {
            return Response::Consumed;
        };
        if !position.is_finite() || last.max_axis_delta(position) < self.threshold {
            return Response::Consumed;
        }

        let Some(source) = transform.view_to_source(position) else {
            log::trace!("dropping sample at {position:?}, transform not ready");
            return Response::Consumed;
        };
        let source_start = match *source_start {
            Some(s) => s,
            None => {
                let Some(s) = transform.view_to_source(*start) else {
                    return Response::Consumed;
                };
                *source_start = Some(s);
                s
            }
        };
        *last = position;

        match &mut self.open {
            Some(stroke) => Arc::make_mut(stroke).points.push(source),
            None => {
                log::trace!("opening stroke at {source_start:?}");
                self.open = Some(Arc::new(Stroke::from_points(vec![source_start, source])));
            }
        }
        Response::Changed
    }

    /// The pointer went up, or the gesture stopped being a single-pointer one. Closes the open
    /// stroke, if any.
    pub fn on_pointer_up(&mut self) {
        self.close_open();
        self.session = Session::Idle;
    }

    /// Removes every stroke. The gesture in progress keeps going.
    pub fn reset(&mut self) {
        log::debug!("clearing {} strokes", self.strokes.len());
        self.strokes.clear();
        self.open = None;
        self.undone.clear();
    }

    /// Removes the most recently closed stroke. Returns whether there was one.
    pub fn undo(&mut self) -> bool {
        if self.open.is_some() {
            return false;
        }
        let Some(stroke) = self.strokes.pop() else {
            return false;
        };
        log::debug!("undo stroke with {} points", stroke.len());
        self.undone.push(stroke);
        true
    }

    /// Restores the stroke removed by the last `undo`. Returns whether there was one.
    pub fn redo(&mut self) -> bool {
        if self.open.is_some() {
            return false;
        }
        let Some(stroke) = self.undone.pop() else {
            return false;
        };
        log::debug!("redo stroke with {} points", stroke.len());
        self.strokes.push(stroke);
        true
    }

    /// Appends previously captured strokes as closed strokes. Empty strokes are skipped.
    pub fn load(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        self.strokes
            .extend(strokes.into_iter().filter(|s| !s.is_empty()).map(Arc::new));
    }

    fn close_open(&mut self) {
        if let Some(stroke) = self.open.take() {
            log::trace!("closing stroke with {} points", stroke.len());
            self.strokes.push(stroke);
            self.undone.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec2;

    /// Source-space is view-space scaled by 1/2 and shifted by (-5, -5).
    struct Halving {
        ready: bool,
    }

    impl CoordinateTransform for Halving {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn source_to_view(&self, source: Vec2f) -> Option<Vec2f> {
            self.ready.then(|| (source + vec2(5.0, 5.0)) * 2.0)
        }

        fn view_to_source(&self, view: Vec2f) -> Option<Vec2f> {
            self.ready.then(|| view / 2.0 - vec2(5.0, 5.0))
        }
    }

    const READY: Halving = Halving { ready: true };
    const THRESHOLD: f32 = 5.0;

    fn src(x: f32, y: f32) -> Vec2f {
        READY.view_to_source(vec2(x, y)).unwrap()
    }

    #[test]
    fn drag_then_release_closes_stroke() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(10.0, 10.0));
        let response = capture.on_pointer_move(&READY, vec2(10.0, 10.0 + THRESHOLD + 1.0), 1);
        assert_eq!(response, Response::Changed);

        let open = capture.open_stroke().unwrap();
        assert_eq!(open.points(), &[src(10.0, 10.0), src(10.0, 16.0)]);
        assert!(capture.strokes().is_empty());

        capture.on_pointer_up();
        assert!(capture.open_stroke().is_none());
        assert_eq!(*capture.session(), Session::Idle);
        assert_eq!(capture.strokes().len(), 1);
        assert_eq!(capture.strokes()[0].points(), &[src(10.0, 10.0), src(10.0, 16.0)]);
    }

    #[test]
    fn one_point_per_accepted_sample() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        let samples = [
            vec2(6.0, 0.0),
            vec2(6.0, 7.0),
            vec2(0.0, 7.0),
            vec2(-10.0, -10.0),
        ];
        for sample in samples {
            assert_eq!(capture.on_pointer_move(&READY, sample, 1), Response::Changed);
        }
        let expected: Vec<_> = [vec2(0.0, 0.0)]
            .iter()
            .chain(&samples)
            .map(|p| src(p.x(), p.y()))
            .collect();
        assert_eq!(capture.open_stroke().unwrap().points(), expected.as_slice());
    }

    #[test]
    fn threshold_is_measured_from_last_accepted_sample() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(10.0, 10.0));

        // Below the threshold on both axes: consumed, but nothing recorded.
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(14.9, 5.1), 1),
            Response::Consumed
        );
        assert!(capture.open_stroke().is_none());

        // Exactly at the threshold is enough.
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(15.0, 10.0), 1),
            Response::Changed
        );
        assert_eq!(capture.open_stroke().unwrap().len(), 2);

        // Small steps don't move the reference point, so they add up.
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(18.0, 10.0), 1),
            Response::Consumed
        );
        assert_eq!(capture.open_stroke().unwrap().len(), 2);
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(20.0, 10.0), 1),
            Response::Changed
        );
        assert_eq!(capture.open_stroke().unwrap().len(), 3);
    }

    #[test]
    fn tap_without_drag_leaves_no_mark() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(10.0, 10.0));
        capture.on_pointer_move(&READY, vec2(11.0, 11.0), 1);
        capture.on_pointer_up();
        assert!(capture.strokes().is_empty());
        assert!(capture.snapshot().iter().next().is_none());
    }

    #[test]
    fn multi_touch_is_left_to_host() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(50.0, 50.0), 2),
            Response::Ignored
        );
        assert!(capture.open_stroke().is_none());

        assert_eq!(capture.on_pointer_down(1, vec2(100.0, 0.0)), Response::Ignored);
        assert_eq!(*capture.session(), Session::Suspended);

        // Back to one pointer within the same gesture: consumed, not drawn.
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(80.0, 80.0), 1),
            Response::Consumed
        );
        assert!(capture.open_stroke().is_none());

        capture.on_pointer_up();
        assert_eq!(*capture.session(), Session::Idle);
        assert!(capture.strokes().is_empty());
    }

    #[test]
    fn second_pointer_mid_stroke_stops_drawing() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        capture.on_pointer_move(&READY, vec2(10.0, 0.0), 1);
        capture.on_pointer_down(1, vec2(100.0, 100.0));
        capture.on_pointer_move(&READY, vec2(30.0, 0.0), 1);
        assert_eq!(capture.open_stroke().unwrap().len(), 2);

        capture.on_pointer_up();
        assert_eq!(capture.strokes().len(), 1);
        assert!(capture.open_stroke().is_none());
    }

    #[test]
    fn moves_without_session() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(50.0, 50.0), 1),
            Response::Consumed
        );
        assert_eq!(
            capture.on_pointer_move(&READY, vec2(50.0, 50.0), 0),
            Response::Ignored
        );
        assert!(capture.snapshot().iter().next().is_none());
    }

    #[test]
    fn unready_transform_drops_samples() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        assert_eq!(
            capture.on_pointer_move(&Halving { ready: false }, vec2(20.0, 0.0), 1),
            Response::Consumed
        );
        assert!(capture.open_stroke().is_none());
        assert_eq!(
            *capture.session(),
            Session::Tracking {
                start: vec2(0.0, 0.0),
                last: vec2(0.0, 0.0),
                source_start: None,
            }
        );

        assert_eq!(
            capture.on_pointer_move(&READY, vec2(20.0, 0.0), 1),
            Response::Changed
        );
        assert_eq!(
            capture.open_stroke().unwrap().points(),
            &[src(0.0, 0.0), src(20.0, 0.0)]
        );
    }

    #[test]
    fn reset_keeps_gesture_going() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        capture.on_pointer_move(&READY, vec2(10.0, 0.0), 1);
        capture.on_pointer_up();
        capture.on_pointer_down(0, vec2(0.0, 50.0));
        capture.on_pointer_move(&READY, vec2(10.0, 50.0), 1);

        capture.reset();
        assert!(capture.strokes().is_empty());
        assert!(capture.open_stroke().is_none());
        assert!(matches!(capture.session(), Session::Tracking { .. }));

        // The same gesture starts a fresh stroke, seeded with the original start point.
        capture.on_pointer_move(&READY, vec2(20.0, 50.0), 1);
        assert_eq!(
            capture.open_stroke().unwrap().points(),
            &[src(0.0, 50.0), src(20.0, 50.0)]
        );
    }

    #[test]
    fn snapshot_is_not_affected_by_later_samples() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.on_pointer_down(0, vec2(0.0, 0.0));
        capture.on_pointer_move(&READY, vec2(10.0, 0.0), 1);
        let snapshot = capture.snapshot();

        capture.on_pointer_move(&READY, vec2(20.0, 0.0), 1);
        capture.on_pointer_up();
        capture.reset();

        assert!(snapshot.strokes.is_empty());
        assert_eq!(snapshot.open.as_ref().unwrap().len(), 2);
        assert_eq!(snapshot.iter().count(), 1);
    }

    #[test]
    fn undo_and_redo() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        for y in [0.0, 50.0] {
            capture.on_pointer_down(0, vec2(0.0, y));
            capture.on_pointer_move(&READY, vec2(10.0, y), 1);
            capture.on_pointer_up();
        }
        assert_eq!(capture.strokes().len(), 2);

        assert!(capture.undo());
        assert_eq!(capture.strokes().len(), 1);
        assert_eq!(capture.strokes()[0].points()[0], src(0.0, 0.0));
        assert!(capture.redo());
        assert_eq!(capture.strokes().len(), 2);
        assert!(!capture.redo());

        // A new stroke discards the redo history.
        assert!(capture.undo());
        capture.on_pointer_down(0, vec2(0.0, 100.0));
        capture.on_pointer_move(&READY, vec2(10.0, 100.0), 1);
        assert!(!capture.undo(), "can't undo while drawing");
        capture.on_pointer_up();
        assert!(!capture.redo());

        assert!(capture.undo());
        assert!(capture.undo());
        assert!(!capture.undo());
    }

    #[test]
    fn threshold_from_stroke_width() {
        assert_eq!(StrokeCapture::for_stroke_width(19.0).threshold(), 9.5);
    }

    #[test]
    fn commands_round_trip_through_strokes() {
        let stroke = Stroke::from_points(vec![vec2(1.0, 2.0), vec2(3.0, 4.0), vec2(5.0, 6.0)]);
        let commands = stroke.commands();
        assert_eq!(
            commands,
            vec![
                PathCommand::Move(1.0, 2.0),
                PathCommand::Line(3.0, 4.0),
                PathCommand::Line(5.0, 6.0),
            ]
        );

        let mut all = commands.clone();
        all.push(PathCommand::Move(9.0, 9.0));
        let strokes = strokes_from_commands(&all).unwrap();
        assert_eq!(strokes, vec![stroke, Stroke::from_points(vec![vec2(9.0, 9.0)])]);

        assert!(strokes_from_commands(&[PathCommand::Line(0.0, 0.0)]).is_err());
    }

    #[test]
    fn load_skips_empty_strokes() {
        let mut capture = StrokeCapture::new(THRESHOLD);
        capture.load([
            Stroke::default(),
            Stroke::from_points(vec![vec2(0.0, 0.0), vec2(1.0, 1.0)]),
        ]);
        assert_eq!(capture.strokes().len(), 1);
    }
}
