use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array3, s};

use follow_servo::control::{ActuatorLink, DepthDirection, HorizontalDirection};
use follow_servo::integration::ExitReason;
use follow_servo::render::NullRenderer;
use follow_servo::replay::{Scenario, ScenarioSource, ScriptedDetector, ScriptedTracker};
use follow_servo::{
    Actuator, BoundingBox, ClickPoint, Detection, Detector, EventQueue, Frame, FrameReport,
    FrameSource, InputEvent, KalmanTracker, Mode, ServoConfig, ServoError, ServoLoop,
    ServoPipeline, SingleObjectTracker,
};

#[derive(Clone, Default)]
struct RecordingLink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl ActuatorLink for RecordingLink {
    fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}

fn recording_actuator() -> (Actuator, Rc<RefCell<Vec<String>>>) {
    let link = RecordingLink::default();
    let lines = link.lines.clone();
    (Actuator::new(Box::new(link)), lines)
}

struct OnePerson;

impl Detector for OnePerson {
    type Error = std::convert::Infallible;

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        Ok(vec![Detection::new(
            BoundingBox::new(100.0, 100.0, 50.0, 80.0),
            "person",
            0.9,
        )])
    }
}

/// Reports a fixed box a set number of times, then fails forever.
struct CountdownTracker {
    bbox: BoundingBox,
    remaining: u32,
    updates: Rc<RefCell<u32>>,
}

impl SingleObjectTracker for CountdownTracker {
    type Error = std::convert::Infallible;

    fn init(&mut self, _frame: &Frame, _bbox: BoundingBox) -> Result<(), Self::Error> {
        Ok(())
    }

    fn update(&mut self, _frame: &Frame) -> Option<BoundingBox> {
        *self.updates.borrow_mut() += 1;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.bbox)
    }
}

#[test]
fn test_click_to_command_end_to_end() {
    let (actuator, lines) = recording_actuator();
    let mut pipeline = ServoPipeline::new(
        OnePerson,
        || CountdownTracker {
            bbox: BoundingBox::new(300.0, 100.0, 50.0, 80.0),
            remaining: 1,
            updates: Rc::default(),
        },
        &ServoConfig::default(),
        actuator,
    );

    // Frame 1: detection produces the person candidate
    let frame1 = Frame::blank(0, 640, 480);
    pipeline.process_frame(&frame1);
    assert_eq!(pipeline.candidates().len(), 1);

    // Click inside the box acquires it
    let acquisition = pipeline.handle_click(&frame1, ClickPoint::new(120.0, 150.0)).unwrap();
    assert_eq!(acquisition.bbox, BoundingBox::new(100.0, 100.0, 50.0, 80.0));
    assert_eq!(pipeline.session().unwrap().reference_area(), 4000.0);

    // Frame 2: tracker moves the box; center 325 vs 320 is inside the dead zone
    let report = pipeline.process_frame(&Frame::blank(1, 640, 480));
    let FrameReport::Tracking { output, command, delivered, .. } = &report else {
        panic!("expected tracking, got {report:?}");
    };
    assert_eq!(output.horizontal_error, 5.0);
    assert_eq!(output.horizontal.direction, HorizontalDirection::Centered);
    assert_eq!(output.depth.direction, DepthDirection::Hold);
    assert_eq!(output.servo_angle, 90);
    assert_eq!(command.encode(), "90,M\n");
    assert!(*delivered);
    assert_eq!(*lines.borrow(), vec!["90,M\n"]);
}

#[test]
fn test_first_failure_returns_to_detection() {
    let updates = Rc::new(RefCell::new(0));
    let counter = updates.clone();
    let mut pipeline = ServoPipeline::with_default_config(OnePerson, move || CountdownTracker {
        bbox: BoundingBox::new(100.0, 100.0, 50.0, 80.0),
        remaining: 0,
        updates: counter.clone(),
    });

    let frame = Frame::blank(0, 640, 480);
    pipeline.process_frame(&frame);
    pipeline.handle_click(&frame, ClickPoint::new(101.0, 101.0)).unwrap();
    assert_eq!(pipeline.mode(), Mode::Tracking);

    for seq in 1..=4 {
        pipeline.process_frame(&Frame::blank(seq, 640, 480));
        assert_eq!(pipeline.mode(), Mode::Detection);
    }
    // The failed tracker was asked once and then discarded
    assert_eq!(*updates.borrow(), 1);
    assert_eq!(pipeline.stats().losses, 1);
}

#[test]
fn test_reacquisition_replaces_session() {
    let mut pipeline = ServoPipeline::with_default_config(OnePerson, || CountdownTracker {
        bbox: BoundingBox::new(100.0, 100.0, 60.0, 80.0),
        remaining: 1,
        updates: Rc::default(),
    });
    let frame = Frame::blank(0, 640, 480);

    pipeline.process_frame(&frame);
    pipeline.handle_click(&frame, ClickPoint::new(120.0, 150.0)).unwrap();
    pipeline.process_frame(&Frame::blank(1, 640, 480));
    pipeline.process_frame(&Frame::blank(2, 640, 480));
    assert_eq!(pipeline.mode(), Mode::Detection);

    let frame = Frame::blank(3, 640, 480);
    pipeline.process_frame(&frame);
    pipeline.handle_click(&frame, ClickPoint::new(120.0, 150.0)).unwrap();
    let session = pipeline.session().unwrap();
    assert_eq!(session.frames_tracked(), 0);
    assert_eq!(session.reference_area(), 4000.0);
    assert_eq!(pipeline.stats().acquisitions, 2);
}

const SCENARIO: &str = r#"
{"detections": [{"bbox": [100, 100, 50, 80], "label": "person", "score": 0.9}, {"bbox": [90, 90, 200, 200], "label": "car", "score": 0.8}], "events": [{"click": {"x": 120, "y": 150}}]}
{"track": [300, 100, 50, 80]}
{"track": [100, 100, 50, 80]}
{"track": [500, 100, 60, 80], "events": ["exit"]}
{"track": [300, 100, 50, 80]}
"#;

/// Run a scenario to completion; also reports whether the link is still open.
fn replay(text: &str, actuator: Actuator) -> (follow_servo::RunSummary, bool) {
    let scenario = Rc::new(Scenario::parse(text).unwrap());
    let events = EventQueue::new();
    let source = ScenarioSource::new(scenario.clone(), events.sender());
    let script = scenario.clone();
    let mut pipeline = ServoPipeline::new(
        ScriptedDetector::new(scenario),
        move || ScriptedTracker::new(script.clone()),
        &ServoConfig::default(),
        actuator,
    );
    let summary = ServoLoop::new(source, NullRenderer, events).run(&mut pipeline);
    (summary, pipeline.actuator().is_connected())
}

#[test]
fn test_replay_exit_mid_tracking_parks_actuator() {
    let (actuator, lines) = recording_actuator();
    let (summary, connected) = replay(SCENARIO, actuator);

    assert_eq!(summary.exit, ExitReason::OperatorExit);
    assert_eq!(summary.frames, 4);
    assert_eq!(summary.acquisitions, 1);
    assert_eq!(summary.final_mode, Mode::Tracking);
    assert!(!connected);

    // error 5 -> centered; error -195 -> left, 90 + 19.5 * 4.5 truncated; error 210 -> right,
    // clamped to 0
    let lines = lines.borrow();
    assert_eq!(*lines, vec!["90,M\n", "177,M\n", "0,F\n", "90,M\n"]);
    assert_eq!(lines.last().map(String::as_str), Some("90,M\n"));
}

#[test]
fn test_replay_without_link_drops_commands() {
    let (summary, _) = replay(SCENARIO, Actuator::disconnected());
    assert_eq!(summary.commands_sent, 0);
    assert_eq!(summary.commands_dropped, 3);
}

#[test]
fn test_replay_loss_then_exhaustion() {
    let script = r#"
{"detections": [{"bbox": [100, 100, 50, 80], "label": "dog", "score": 0.7}], "events": [{"click": {"x": 150, "y": 180}}]}
{"track": [110, 100, 50, 80]}
{"detections": [{"bbox": [100, 100, 50, 80], "label": "dog", "score": 0.7}]}
"#;
    let (actuator, lines) = recording_actuator();
    let (summary, _) = replay(script, actuator);

    assert_eq!(summary.exit, ExitReason::SourceExhausted);
    assert_eq!(summary.losses, 1);
    assert_eq!(summary.final_mode, Mode::Detection);
    // tracked frame (error -185 -> left), then neutral on shutdown
    assert_eq!(*lines.borrow(), vec!["173,M\n", "90,M\n"]);
}

struct BrokenSource {
    served: bool,
}

impl FrameSource for BrokenSource {
    fn next_frame(&mut self) -> follow_servo::Result<Option<Frame>> {
        if self.served {
            return Err(ServoError::FrameSource("device unplugged".into()));
        }
        self.served = true;
        Ok(Some(Frame::blank(0, 640, 480)))
    }
}

#[test]
fn test_source_failure_still_shuts_down() {
    let (actuator, lines) = recording_actuator();
    let mut pipeline = ServoPipeline::new(
        OnePerson,
        || CountdownTracker {
            bbox: BoundingBox::default(),
            remaining: 0,
            updates: Rc::default(),
        },
        &ServoConfig::default(),
        actuator,
    );
    let summary = ServoLoop::new(BrokenSource { served: false }, NullRenderer, EventQueue::new())
        .run(&mut pipeline);

    assert!(matches!(summary.exit, ExitReason::SourceFailed(ref m) if m.contains("unplugged")));
    assert_eq!(summary.frames, 1);
    assert_eq!(*lines.borrow(), vec!["90,M\n"]);
}

#[test]
fn test_kalman_tracker_in_pipeline() {
    let scenario = Rc::new(
        Scenario::parse(
            r#"
{"detections": [{"bbox": [100, 100, 50, 80], "label": "person", "score": 0.9}]}
{"detections": [{"bbox": [104, 100, 50, 80], "label": "person", "score": 0.9}]}
{"detections": [{"bbox": [108, 100, 50, 80], "label": "person", "score": 0.9}]}
"#,
        )
        .unwrap(),
    );
    let script = scenario.clone();
    let mut pipeline = ServoPipeline::with_default_config(ScriptedDetector::new(scenario), move || {
        KalmanTracker::with_default_config(ScriptedDetector::new(script.clone()))
    });

    let frame = Frame::blank(0, 640, 480);
    pipeline.process_frame(&frame);
    pipeline.handle_click(&frame, ClickPoint::new(125.0, 140.0)).unwrap();

    for seq in 1..=2 {
        let report = pipeline.process_frame(&Frame::blank(seq, 640, 480));
        let FrameReport::Tracking { bbox, output, .. } = &report else {
            panic!("expected tracking on frame {seq}, got {report:?}");
        };
        assert!(bbox.x > 100.0);
        assert_eq!(output.horizontal.direction, HorizontalDirection::Left);
    }
}

/// Serves the same frames it was built with, then runs out.
struct FixedSource {
    frames: std::vec::IntoIter<Frame>,
}

impl FrameSource for FixedSource {
    fn next_frame(&mut self) -> follow_servo::Result<Option<Frame>> {
        Ok(self.frames.next())
    }
}

/// Reports one "person" box over the columns whose first-row red channel is
/// lit, or nothing on a dark frame.
struct BrightColumns;

impl Detector for BrightColumns {
    type Error = std::convert::Infallible;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let row = frame.pixels.slice(s![0, .., 0]);
        let lit: Vec<usize> = (0..row.len()).filter(|&x| row[x] > 0).collect();
        let (Some(&first), Some(&last)) = (lit.first(), lit.last()) else {
            return Ok(vec![]);
        };
        let bbox = BoundingBox::new(
            first as f32,
            0.0,
            (last - first + 1) as f32,
            frame.height() as f32,
        );
        Ok(vec![Detection::new(bbox, "person", 0.9)])
    }
}

/// 640x480 frame lit in columns 10..60 only.
fn left_lit_frame() -> Frame {
    let mut pixels = Array3::zeros((480, 640, 3));
    pixels.slice_mut(s![.., 10..60, 0]).fill(255);
    Frame::new(0, pixels)
}

/// Runs one frame, clicks at `click`, and returns the seeded box, if any.
fn click_on_one_frame(mirror: bool, click: ClickPoint) -> Option<BoundingBox> {
    let events = EventQueue::new();
    let sender = events.sender();
    sender.send(InputEvent::Click(click)).unwrap();
    sender.send(InputEvent::Exit).unwrap();

    let mut pipeline = ServoPipeline::with_default_config(BrightColumns, || CountdownTracker {
        bbox: BoundingBox::default(),
        remaining: 0,
        updates: Rc::default(),
    });
    let source = FixedSource {
        frames: vec![left_lit_frame()].into_iter(),
    };
    let summary = ServoLoop::new(source, NullRenderer, events)
        .mirror(mirror)
        .run(&mut pipeline);
    assert_eq!(summary.exit, ExitReason::OperatorExit);
    pipeline.session().map(|session| session.current_box())
}

#[test]
fn test_mirrored_frame_reaches_detection_and_selection() {
    // Lit columns 10..60 land on 580..630 after the flip
    let flipped = BoundingBox::new(580.0, 0.0, 50.0, 480.0);
    assert_eq!(click_on_one_frame(true, ClickPoint::new(600.0, 100.0)), Some(flipped));

    // The unflipped position holds no candidate once mirrored
    assert_eq!(click_on_one_frame(true, ClickPoint::new(30.0, 100.0)), None);
}

#[test]
fn test_unmirrored_loop_keeps_capture_orientation() {
    let original = BoundingBox::new(10.0, 0.0, 50.0, 480.0);
    assert_eq!(click_on_one_frame(false, ClickPoint::new(30.0, 100.0)), Some(original));
    assert_eq!(click_on_one_frame(false, ClickPoint::new(600.0, 100.0)), None);
}
