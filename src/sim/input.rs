//! Input sources feeding the locomotion motor.
//!
//! The motor only ever sees an `InputSample`; where the sample comes from is
//! decided at character setup time by picking an `InputSource` implementation:
//! a scripted action timeline, a latest-wins intent mailbox fed from another
//! thread, or a seeded wander generator for demos.

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::InputSegmentConfig;

/// One tick's worth of control intent. Absent fields default to neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    /// Planar move intent, nominally in [-1, 1] per axis
    pub move_axes: [f32; 2],
    /// Look delta in device units
    pub look: [f32; 2],
    pub jump_held: bool,
    pub sprint_held: bool,
    pub toggle_view: bool,
}

/// Per-tick provider of control intent for one character.
pub trait InputSource: Send + Sync {
    fn sample(&mut self, dt: f32) -> InputSample;
}

/// Plays back a fixed timeline of input segments, then goes neutral.
pub struct ScriptedInput {
    segments: Vec<(f32, InputSample)>,
    elapsed: f32,
}

impl ScriptedInput {
    pub fn new(segments: Vec<(f32, InputSample)>) -> Self {
        Self {
            segments,
            elapsed: 0.0,
        }
    }

    pub fn from_segments(segments: &[InputSegmentConfig]) -> Self {
        Self::new(
            segments
                .iter()
                .map(|s| {
                    (
                        s.duration,
                        InputSample {
                            move_axes: s.move_axes,
                            look: s.look,
                            jump_held: s.jump,
                            sprint_held: s.sprint,
                            toggle_view: s.toggle_view,
                        },
                    )
                })
                .collect(),
        )
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, dt: f32) -> InputSample {
        let mut cursor = 0.0;
        let mut current = InputSample::default();
        for &(duration, sample) in &self.segments {
            cursor += duration;
            if self.elapsed < cursor {
                current = sample;
                break;
            }
        }
        self.elapsed += dt;
        current
    }
}

/// Latest-wins intent mailbox fed over a channel from a producer thread.
/// Holds the last received sample between sends, so a slow producer keeps
/// its last intent active rather than dropping to neutral.
pub struct IntentBuffer {
    rx: Receiver<InputSample>,
    latest: InputSample,
}

impl IntentBuffer {
    /// Creates the mailbox plus the sender half handed to the producer.
    pub fn channel() -> (Sender<InputSample>, IntentBuffer) {
        let (tx, rx) = unbounded();
        (
            tx,
            IntentBuffer {
                rx,
                latest: InputSample::default(),
            },
        )
    }
}

impl InputSource for IntentBuffer {
    fn sample(&mut self, _dt: f32) -> InputSample {
        while let Ok(sample) = self.rx.try_recv() {
            self.latest = sample;
        }
        self.latest
    }
}

/// Randomly steered walk intent for demos: picks a heading, holds it for a
/// few seconds, occasionally sprints or hops.
pub struct WanderInput {
    rng: StdRng,
    current: InputSample,
    until_change: f32,
}

impl WanderInput {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: InputSample::default(),
            until_change: 0.0,
        }
    }
}

impl InputSource for WanderInput {
    fn sample(&mut self, dt: f32) -> InputSample {
        self.until_change -= dt;
        if self.until_change <= 0.0 {
            self.until_change = self.rng.gen_range(1.5..4.0);
            let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
            self.current = InputSample {
                move_axes: [angle.cos(), angle.sin()],
                look: [0.0, 0.0],
                jump_held: self.rng.gen_bool(0.15),
                sprint_held: self.rng.gen_bool(0.3),
                toggle_view: false,
            };
        } else {
            // Release jump after the initial press so it stays edge-triggered.
            self.current.jump_held = false;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_advances_segments() {
        let walk = InputSample {
            move_axes: [0.0, 1.0],
            ..Default::default()
        };
        let sprint = InputSample {
            move_axes: [0.0, 1.0],
            sprint_held: true,
            ..Default::default()
        };
        let mut script = ScriptedInput::new(vec![(0.1, walk), (0.1, sprint)]);

        let dt = 0.05;
        assert_eq!(script.sample(dt), walk);
        assert_eq!(script.sample(dt), walk);
        assert_eq!(script.sample(dt), sprint);
        assert_eq!(script.sample(dt), sprint);
        // Past the timeline: neutral
        assert_eq!(script.sample(dt), InputSample::default());
    }

    #[test]
    fn test_intent_buffer_keeps_latest() {
        let (tx, mut buffer) = IntentBuffer::channel();
        assert_eq!(buffer.sample(0.016), InputSample::default());

        tx.send(InputSample {
            move_axes: [1.0, 0.0],
            ..Default::default()
        })
        .unwrap();
        tx.send(InputSample {
            move_axes: [0.0, 1.0],
            ..Default::default()
        })
        .unwrap();

        let sample = buffer.sample(0.016);
        assert_eq!(sample.move_axes, [0.0, 1.0], "Latest send wins");

        // No new sends: last intent stays active.
        assert_eq!(buffer.sample(0.016).move_axes, [0.0, 1.0]);
    }

    #[test]
    fn test_wander_is_deterministic_per_seed() {
        let mut a = WanderInput::new(7);
        let mut b = WanderInput::new(7);
        for _ in 0..120 {
            assert_eq!(a.sample(1.0 / 60.0), b.sample(1.0 / 60.0));
        }
    }
}
