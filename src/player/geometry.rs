use std::{
    fmt::Write,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use glam::Vec3;
use tracing::{debug, warn};

use super::{
    motion::JointFrame,
    target::{RenderError, RenderTarget, TextCapabilities, TextId},
    topology::{JOINT_COUNT, KEY_JOINT_COUNT, KEY_JOINTS, SkeletonTopology},
};

/// Help shown after the playback state in the status line.
pub const CONTROLS_HELP: &str = "Space Play/Pause, Arrows Step, R Reset, Q Quit";

/// Contents of the live buffers at one point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryData {
    pub joints: JointFrame,
    /// Positions of [`KEY_JOINTS`], in the same order.
    pub key_joints: [Vec3; KEY_JOINT_COUNT],
}

/// The point buffers a renderer draws from.
///
/// The storage is allocated once and rewritten on every frame, so anything holding on to the
/// buffers always sees the current frame.
#[derive(Debug)]
pub struct SkeletonBuffers {
    topology: SkeletonTopology,
    data: Mutex<GeometryData>,
    revision: AtomicU64,
}

impl SkeletonBuffers {
    pub fn new(topology: SkeletonTopology) -> Arc<Self> {
        Arc::new(Self {
            topology,
            data: Mutex::new(GeometryData {
                joints: [Vec3::ZERO; JOINT_COUNT],
                key_joints: [Vec3::ZERO; KEY_JOINT_COUNT],
            }),
            revision: AtomicU64::new(0),
        })
    }

    pub fn topology(&self) -> &SkeletonTopology {
        &self.topology
    }

    /// Number of writes so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Run `f` with a consistent view of the buffers. Keep `f` short, the writer waits on it.
    ///
    /// The status text of a frame is updated before the writer lets go of the buffers, so text
    /// read from the render target inside `f` belongs to the same frame as the joints.
    pub fn read<R>(&self, f: impl FnOnce(&GeometryData) -> R) -> R {
        f(&self.lock())
    }

    /// Write `joints` and keep the buffers locked until the returned guard is dropped.
    fn write(&self, joints: &JointFrame) -> MutexGuard<'_, GeometryData> {
        let mut data = self.lock();
        data.joints.copy_from_slice(joints);
        for (dst, &joint) in data.key_joints.iter_mut().zip(KEY_JOINTS.iter()) {
            *dst = joints[joint];
        }
        self.revision.fetch_add(1, Ordering::Release);
        data
    }

    fn lock(&self) -> MutexGuard<'_, GeometryData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The status line drawn below the skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub frame: usize,
    pub last_frame: usize,
    pub playing: bool,
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "F {}/{} | {} | {}",
            self.frame,
            self.last_frame,
            if self.playing { "Play" } else { "Pause" },
            CONTROLS_HELP
        )
    }
}

/// How the status text is updated on a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextUpdate {
    SetText,
    ReplaceText,
    /// Remove the element and add a new one. Works on every target.
    Recreate,
}

impl TextUpdate {
    /// The first strategy `capabilities` allows.
    fn probe(capabilities: TextCapabilities) -> Self {
        Self::SetText.first_supported(capabilities)
    }

    /// The strategy tried after `self` failed.
    fn demote(self, capabilities: TextCapabilities) -> Self {
        match self {
            Self::SetText => Self::ReplaceText.first_supported(capabilities),
            Self::ReplaceText | Self::Recreate => Self::Recreate,
        }
    }

    fn first_supported(self, capabilities: TextCapabilities) -> Self {
        match self {
            Self::SetText if capabilities.contains(TextCapabilities::SET_TEXT) => Self::SetText,
            Self::SetText | Self::ReplaceText
                if capabilities.contains(TextCapabilities::REPLACE_TEXT) =>
            {
                Self::ReplaceText
            }
            _ => Self::Recreate,
        }
    }
}

/// Writes frames into the live buffers and keeps the render target up to date.
pub struct GeometrySync<T: RenderTarget> {
    target: T,
    buffers: Arc<SkeletonBuffers>,
    capabilities: TextCapabilities,
    text_update: TextUpdate,
    status_id: TextId,
    status_text: String,
}

impl<T: RenderTarget> GeometrySync<T> {
    pub fn new(mut target: T, buffers: Arc<SkeletonBuffers>) -> Result<Self, RenderError> {
        let capabilities = target.text_capabilities();
        let text_update = TextUpdate::probe(capabilities);
        debug!("Status text update strategy: {text_update:?}");

        let status_id = target.add_text("")?;

        Ok(Self {
            target,
            buffers,
            capabilities,
            text_update,
            status_id,
            status_text: String::with_capacity(128),
        })
    }

    /// Copy `joints` into the live buffers, refresh the status text and request one redraw.
    pub fn apply_frame(
        &mut self,
        joints: &JointFrame,
        status: StatusLine,
    ) -> Result<(), RenderError> {
        let buffers = Arc::clone(&self.buffers);
        let frame = buffers.write(joints);

        self.status_text.clear();
        // Writing into a `String` can not fail.
        let _ = write!(self.status_text, "{status}");
        self.update_status()?;
        drop(frame);

        self.target.request_redraw()
    }

    pub fn close(&mut self) -> Result<(), RenderError> {
        self.target.close()
    }

    fn update_status(&mut self) -> Result<(), RenderError> {
        loop {
            let result = match self.text_update {
                TextUpdate::SetText => self.target.set_text(self.status_id, &self.status_text),
                TextUpdate::ReplaceText => {
                    self.target.replace_text(self.status_id, &self.status_text)
                }
                TextUpdate::Recreate => return self.recreate_status(),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(RenderError::Closed) => return Err(RenderError::Closed),
                Err(err) => {
                    let next = self.text_update.demote(self.capabilities);
                    warn!(
                        "Updating status text with {:?} failed ({err}), falling back to {next:?}",
                        self.text_update
                    );
                    self.text_update = next;
                }
            }
        }
    }

    fn recreate_status(&mut self) -> Result<(), RenderError> {
        match self.target.remove_text(self.status_id) {
            Ok(()) => {}
            Err(RenderError::Closed) => return Err(RenderError::Closed),
            Err(err) => debug!("Could not remove old status text: {err}"),
        }
        self.status_id = self.target.add_text(&self.status_text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::RecordingTarget;

    fn ramp_frame(value: f32) -> JointFrame {
        std::array::from_fn(|joint| Vec3::new(value, joint as f32, 0.0))
    }

    fn sync_with(target: RecordingTarget) -> GeometrySync<RecordingTarget> {
        GeometrySync::new(target, SkeletonBuffers::new(SkeletonTopology::t2m())).unwrap()
    }

    const PAUSED_AT_3: StatusLine = StatusLine {
        frame: 3,
        last_frame: 9,
        playing: false,
    };

    #[test]
    fn status_line_format() {
        assert_eq!(
            PAUSED_AT_3.to_string(),
            "F 3/9 | Pause | Space Play/Pause, Arrows Step, R Reset, Q Quit"
        );
        let playing = StatusLine {
            playing: true,
            ..PAUSED_AT_3
        };
        assert_eq!(
            playing.to_string(),
            "F 3/9 | Play | Space Play/Pause, Arrows Step, R Reset, Q Quit"
        );
    }

    #[test]
    fn apply_frame_rewrites_buffers_in_place() {
        let target = RecordingTarget::new(TextCapabilities::SET_TEXT);
        let log = target.log();
        let mut sync = sync_with(target);
        let buffers = Arc::clone(&sync.buffers);

        let storage = buffers.read(|data| data.joints.as_ptr());

        sync.apply_frame(&ramp_frame(1.0), PAUSED_AT_3).unwrap();
        sync.apply_frame(&ramp_frame(2.0), PAUSED_AT_3).unwrap();

        assert_eq!(buffers.read(|data| data.joints.as_ptr()), storage);
        assert_eq!(buffers.revision(), 2);
        buffers.read(|data| {
            assert_eq!(data.joints, ramp_frame(2.0));
            assert_eq!(data.key_joints[1], Vec3::new(2.0, 12.0, 0.0));
            assert_eq!(data.key_joints[6], Vec3::new(2.0, 21.0, 0.0));
        });

        let log = log.lock().unwrap();
        assert_eq!(log.redraws, 2);
        assert_eq!(log.added, 1);
        assert_eq!(log.texts.len(), 1);
        assert!(log.texts.values().all(|text| text == &PAUSED_AT_3.to_string()));
    }

    /// Records whether the buffers were locked whenever the status text changed.
    struct LockCheck {
        buffers: Arc<SkeletonBuffers>,
        locked_during_update: Vec<bool>,
    }

    impl RenderTarget for LockCheck {
        fn text_capabilities(&self) -> TextCapabilities {
            TextCapabilities::SET_TEXT
        }

        fn add_text(&mut self, _text: &str) -> Result<TextId, RenderError> {
            Ok(TextId(0))
        }

        fn remove_text(&mut self, _id: TextId) -> Result<(), RenderError> {
            Ok(())
        }

        fn set_text(&mut self, _id: TextId, _text: &str) -> Result<(), RenderError> {
            self.locked_during_update.push(self.buffers.data.try_lock().is_err());
            Ok(())
        }

        fn request_redraw(&mut self) -> Result<(), RenderError> {
            assert!(self.buffers.data.try_lock().is_ok());
            Ok(())
        }

        fn close(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[test]
    fn status_text_changes_together_with_the_joints() {
        let buffers = SkeletonBuffers::new(SkeletonTopology::t2m());
        let target = LockCheck {
            buffers: Arc::clone(&buffers),
            locked_during_update: vec![],
        };
        let mut sync = GeometrySync::new(target, buffers).unwrap();

        sync.apply_frame(&ramp_frame(1.0), PAUSED_AT_3).unwrap();
        sync.apply_frame(&ramp_frame(2.0), PAUSED_AT_3).unwrap();

        assert_eq!(sync.target.locked_during_update, vec![true, true]);
    }

    #[test]
    fn strategy_is_probed_from_capabilities() {
        let both = TextCapabilities::SET_TEXT | TextCapabilities::REPLACE_TEXT;
        assert_eq!(TextUpdate::probe(both), TextUpdate::SetText);
        assert_eq!(
            TextUpdate::probe(TextCapabilities::REPLACE_TEXT),
            TextUpdate::ReplaceText
        );
        assert_eq!(
            TextUpdate::probe(TextCapabilities::empty()),
            TextUpdate::Recreate
        );
    }

    #[test]
    fn recreate_replaces_the_status_element() {
        let target = RecordingTarget::new(TextCapabilities::empty());
        let log = target.log();
        let mut sync = sync_with(target);

        sync.apply_frame(&ramp_frame(0.0), PAUSED_AT_3).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.added, 2);
        assert_eq!(log.removed, 1);
        assert_eq!(log.texts.len(), 1);
        assert_eq!(log.redraws, 1);
    }

    #[test]
    fn failing_strategy_is_demoted_once() {
        let both = TextCapabilities::SET_TEXT | TextCapabilities::REPLACE_TEXT;
        let target = RecordingTarget::new(both).with_broken(TextCapabilities::SET_TEXT);
        let log = target.log();
        let mut sync = sync_with(target);

        sync.apply_frame(&ramp_frame(0.0), PAUSED_AT_3).unwrap();
        sync.apply_frame(&ramp_frame(1.0), PAUSED_AT_3).unwrap();

        assert_eq!(sync.text_update, TextUpdate::ReplaceText);
        let log = log.lock().unwrap();
        assert_eq!(log.set_text_calls, 1);
        assert_eq!(log.replace_text_calls, 2);
        assert_eq!(log.redraws, 2);
    }

    #[test]
    fn demotion_skips_tiers_that_are_not_advertised() {
        let target = RecordingTarget::new(TextCapabilities::SET_TEXT)
            .with_broken(TextCapabilities::SET_TEXT);
        let log = target.log();
        let mut sync = sync_with(target);

        sync.apply_frame(&ramp_frame(0.0), PAUSED_AT_3).unwrap();

        assert_eq!(sync.text_update, TextUpdate::Recreate);
        let log = log.lock().unwrap();
        assert_eq!(log.replace_text_calls, 0);
        assert_eq!(log.texts.len(), 1);
    }

    #[test]
    fn closed_target_is_not_retried() {
        let target = RecordingTarget::new(TextCapabilities::SET_TEXT);
        let log = target.log();
        let mut sync = sync_with(target);

        log.lock().unwrap().closed = true;

        assert_eq!(
            sync.apply_frame(&ramp_frame(0.0), PAUSED_AT_3),
            Err(RenderError::Closed)
        );
        assert_eq!(sync.text_update, TextUpdate::SetText);
        assert_eq!(log.lock().unwrap().redraws, 0);
    }
}
