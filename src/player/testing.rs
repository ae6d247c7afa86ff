//! Test doubles shared by the player tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use glam::Vec3;

use super::{
    motion::MotionSequence,
    target::{RenderError, RenderTarget, TextCapabilities, TextId},
    topology::JOINT_COUNT,
};

/// Everything a [`RecordingTarget`] was asked to do.
#[derive(Debug, Default)]
pub struct TargetLog {
    pub texts: HashMap<TextId, String>,
    pub added: usize,
    pub removed: usize,
    pub set_text_calls: usize,
    pub replace_text_calls: usize,
    pub redraws: usize,
    /// Once set, every call fails with [`RenderError::Closed`].
    pub closed: bool,
    pub close_calls: usize,
}

/// A render target that records calls instead of drawing.
pub struct RecordingTarget {
    log: Arc<Mutex<TargetLog>>,
    capabilities: TextCapabilities,
    /// Advertised capabilities that fail anyway.
    broken: TextCapabilities,
    /// Close the target after this many successful redraws.
    redraw_limit: Option<usize>,
    next_id: u32,
}

impl RecordingTarget {
    pub fn new(capabilities: TextCapabilities) -> Self {
        Self {
            log: Arc::default(),
            capabilities,
            broken: TextCapabilities::empty(),
            redraw_limit: None,
            next_id: 0,
        }
    }

    pub fn with_broken(mut self, broken: TextCapabilities) -> Self {
        self.broken = broken;
        self
    }

    pub fn with_redraw_limit(mut self, limit: usize) -> Self {
        self.redraw_limit = Some(limit);
        self
    }

    pub fn log(&self) -> Arc<Mutex<TargetLog>> {
        Arc::clone(&self.log)
    }

    fn update_text(
        &mut self,
        capability: TextCapabilities,
        name: &'static str,
        id: TextId,
        text: &str,
    ) -> Result<(), RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.closed {
            return Err(RenderError::Closed);
        }
        if capability == TextCapabilities::SET_TEXT {
            log.set_text_calls += 1;
        } else {
            log.replace_text_calls += 1;
        }
        if !self.capabilities.contains(capability) || self.broken.contains(capability) {
            return Err(RenderError::Unsupported(name));
        }

        let slot = log.texts.get_mut(&id).ok_or(RenderError::UnknownText(id))?;
        slot.clear();
        slot.push_str(text);
        Ok(())
    }
}

impl RenderTarget for RecordingTarget {
    fn text_capabilities(&self) -> TextCapabilities {
        self.capabilities
    }

    fn add_text(&mut self, text: &str) -> Result<TextId, RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.closed {
            return Err(RenderError::Closed);
        }

        let id = TextId(self.next_id);
        self.next_id += 1;
        log.texts.insert(id, text.to_owned());
        log.added += 1;
        Ok(id)
    }

    fn remove_text(&mut self, id: TextId) -> Result<(), RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.closed {
            return Err(RenderError::Closed);
        }

        log.texts.remove(&id).ok_or(RenderError::UnknownText(id))?;
        log.removed += 1;
        Ok(())
    }

    fn set_text(&mut self, id: TextId, text: &str) -> Result<(), RenderError> {
        self.update_text(TextCapabilities::SET_TEXT, "set_text", id, text)
    }

    fn replace_text(&mut self, id: TextId, text: &str) -> Result<(), RenderError> {
        self.update_text(TextCapabilities::REPLACE_TEXT, "replace_text", id, text)
    }

    fn request_redraw(&mut self) -> Result<(), RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.closed {
            return Err(RenderError::Closed);
        }
        if self.redraw_limit.is_some_and(|limit| log.redraws >= limit) {
            log.closed = true;
            return Err(RenderError::Closed);
        }

        log.redraws += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RenderError> {
        let mut log = self.log.lock().unwrap();
        log.close_calls += 1;
        log.closed = true;
        Ok(())
    }
}

/// A motion where every joint of frame `i` sits at `(i, i, i)`.
pub fn ramp_motion(frame_count: usize) -> Arc<MotionSequence> {
    let frames = (0..frame_count)
        .map(|frame| [Vec3::splat(frame as f32); JOINT_COUNT])
        .collect();
    Arc::new(MotionSequence::new(frames).unwrap())
}
