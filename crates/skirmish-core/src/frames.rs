//! Fixed-depth history of recent observations.

use std::collections::VecDeque;

use skirmish_types::ObservationVector;

/// The last `depth` observations, oldest first, zero-padded at the front
/// until enough cycles have been seen.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStack {
    depth: usize,
    frames: VecDeque<ObservationVector>,
}

impl FrameStack {
    /// Create an empty stack holding `depth` frames (at least one).
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            frames: VecDeque::with_capacity(depth),
        }
    }

    /// Number of frames every [`FrameStack::frames`] call returns.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Append the newest observation, evicting the oldest when full.
    pub fn push(&mut self, observation: ObservationVector) {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(observation);
    }

    /// Exactly `depth` frames, oldest first.
    pub fn frames(&self) -> Vec<ObservationVector> {
        let padding = self.depth.saturating_sub(self.frames.len());
        std::iter::repeat_with(ObservationVector::zeroed)
            .take(padding)
            .chain(self.frames.iter().cloned())
            .collect()
    }

    /// Forget every frame.
    pub fn reset(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_types::ObservationField;

    fn frame(health: f64) -> ObservationVector {
        let mut obs = ObservationVector::zeroed();
        obs.set(ObservationField::AgentHealth, health);
        obs
    }

    #[test]
    fn pads_with_zero_frames_until_full() {
        let mut stack = FrameStack::new(3);
        stack.push(frame(0.5));
        let frames = stack.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.first(), Some(&ObservationVector::zeroed()));
        assert_eq!(frames.last(), Some(&frame(0.5)));
    }

    #[test]
    fn evicts_oldest_frame() {
        let mut stack = FrameStack::new(2);
        stack.push(frame(0.1));
        stack.push(frame(0.2));
        stack.push(frame(0.3));
        assert_eq!(stack.frames(), vec![frame(0.2), frame(0.3)]);
        stack.reset();
        assert_eq!(stack.frames(), vec![ObservationVector::zeroed(); 2]);
    }

    #[test]
    fn zero_depth_is_raised_to_one() {
        assert_eq!(FrameStack::new(0).depth(), 1);
    }
}
