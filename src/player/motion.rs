use glam::Vec3;

use super::{
    axis::AxisBounds,
    error::{MotionError, PlaybackError},
    topology::JOINT_COUNT,
};

/// Positions of every joint in a single frame.
pub type JointFrame = [Vec3; JOINT_COUNT];

/// Data that travels with a motion for display only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionMetadata {
    /// Text prompts the motion was generated from.
    pub texts: Vec<String>,
    /// Length of each generated segment, in frames.
    pub lengths: Vec<usize>,
}

/// An immutable sequence of skeleton poses. Always holds at least one frame.
#[derive(Debug)]
pub struct MotionSequence {
    frames: Vec<JointFrame>,
    metadata: MotionMetadata,
}

impl MotionSequence {
    pub fn new(frames: Vec<JointFrame>) -> Result<Self, MotionError> {
        if frames.is_empty() {
            return Err(MotionError::Empty);
        }

        Ok(Self {
            frames,
            metadata: MotionMetadata::default(),
        })
    }

    /// Build a sequence from values laid out as `(joint, axis, frame)` in row-major order, which
    /// is how a single batch entry of a generated motion array is stored.
    pub fn from_joint_axis_frame(values: &[f32], frame_count: usize) -> Result<Self, MotionError> {
        let expected = JOINT_COUNT * 3 * frame_count;
        if values.len() != expected {
            return Err(MotionError::ValueCount {
                expected,
                found: values.len(),
            });
        }

        let frames = (0..frame_count)
            .map(|frame| {
                std::array::from_fn(|joint| {
                    let at = |axis: usize| values[(joint * 3 + axis) * frame_count + frame];
                    Vec3::new(at(0), at(1), at(2))
                })
            })
            .collect();

        Self::new(frames)
    }

    pub fn with_metadata(mut self, metadata: MotionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Apply `f` to every joint position. Only used while ingesting data.
    pub fn map_points(mut self, f: impl Fn(Vec3) -> Vec3) -> Self {
        self.frames
            .iter_mut()
            .flatten()
            .for_each(|p| *p = f(*p));
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the final frame.
    pub fn last_index(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn frame(&self, index: usize) -> Result<&JointFrame, PlaybackError> {
        self.frames.get(index).ok_or(PlaybackError::OutOfRange {
            index,
            frame_count: self.frames.len(),
        })
    }

    pub fn metadata(&self) -> &MotionMetadata {
        &self.metadata
    }

    pub fn bounds(&self) -> Option<AxisBounds> {
        AxisBounds::from_points(self.frames.iter().flatten().copied())
    }
}
