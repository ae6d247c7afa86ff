//! The fixed 22 joint skeleton used by the T2M / HumanML3D motion datasets.

/// Number of joints in a T2M skeleton.
pub const JOINT_COUNT: usize = 22;

/// Number of joints that carry a text label in the viewer.
pub const KEY_JOINT_COUNT: usize = 7;

/// Human readable joint names, indexed by joint index.
pub const JOINT_NAMES: [&str; JOINT_COUNT] = [
    "Pelvis",
    "L.Hip",
    "R.Hip",
    "Spine1",
    "L.Knee",
    "R.Knee",
    "Spine2",
    "L.Ankle",
    "R.Ankle",
    "Spine3",
    "L.Foot",
    "R.Foot",
    "Neck",
    "L.Collar",
    "R.Collar",
    "Head",
    "L.Shoulder",
    "R.Shoulder",
    "L.Elbow",
    "R.Elbow",
    "L.Wrist",
    "R.Wrist",
];

/// Kinematic chains, each an ordered path of connected joints.
pub const KINEMATIC_CHAINS: [&[usize]; 5] = [
    // Right leg: Pelvis, R.Hip, R.Knee, R.Ankle, R.Foot
    &[0, 2, 5, 8, 11],
    // Left leg: Pelvis, L.Hip, L.Knee, L.Ankle, L.Foot
    &[0, 1, 4, 7, 10],
    // Spine: Pelvis, Spine1, Spine2, Spine3, Neck, Head
    &[0, 3, 6, 9, 12, 15],
    // Right arm: Spine3, R.Collar, R.Shoulder, R.Elbow, R.Wrist
    &[9, 14, 17, 19, 21],
    // Left arm: Spine3, L.Collar, L.Shoulder, L.Elbow, L.Wrist
    &[9, 13, 16, 18, 20],
];

/// Joints anchoring a text label: Pelvis, Neck, Head, L.Foot, R.Foot, L.Wrist, R.Wrist.
pub const KEY_JOINTS: [usize; KEY_JOINT_COUNT] = [0, 12, 15, 10, 11, 20, 21];

/// A line segment between two adjacent joints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BonePair {
    pub start: usize,
    pub end: usize,
}

/// Joint names and the bone list derived from the kinematic chains.
#[derive(Debug)]
pub struct SkeletonTopology {
    names: &'static [&'static str],
    bones: Vec<BonePair>,
}

impl SkeletonTopology {
    /// The T2M skeleton.
    pub fn t2m() -> Self {
        Self::from_chains(&JOINT_NAMES, &KINEMATIC_CHAINS)
    }

    /// Flattens `chains` into bone pairs. A pair that was already produced by an earlier chain
    /// is skipped, so the bone order is the order in which pairs first appear.
    fn from_chains(
        names: &'static [&'static str],
        chains: &'static [&'static [usize]],
    ) -> Self {
        let mut bones: Vec<BonePair> = Vec::new();

        for chain in chains {
            for window in chain.windows(2) {
                let bone = BonePair {
                    start: window[0],
                    end: window[1],
                };
                debug_assert!(bone.start < names.len() && bone.end < names.len());
                debug_assert_ne!(bone.start, bone.end);

                if !bones.contains(&bone) {
                    bones.push(bone);
                }
            }
        }

        Self { names, bones }
    }

    pub fn joint_count(&self) -> usize {
        self.names.len()
    }

    /// The name of the joint at `index`, if there is one.
    pub fn joint_name(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    pub fn bones(&self) -> &[BonePair] {
        &self.bones
    }
}
