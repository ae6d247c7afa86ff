use std::sync::{Arc, Mutex, PoisonError};

use winit::event_loop::EventLoopProxy;

use crate::player::target::{RenderError, RenderTarget, TextCapabilities, TextId};

/// Events sent to the window event loop from other threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The live buffers changed.
    Redraw,
    /// The playback session was closed.
    Exit,
}

/// Text elements drawn over the scene, in the order they were added.
#[derive(Debug, Default)]
pub struct TextOverlay {
    entries: Mutex<Vec<(TextId, String)>>,
}

impl TextOverlay {
    pub fn for_each(&self, mut f: impl FnMut(&str)) {
        self.lock().iter().for_each(|(_, text)| f(text));
    }

    fn insert(&self, id: TextId, text: &str) {
        self.lock().push((id, text.to_owned()));
    }

    fn remove(&self, id: TextId) -> Result<(), RenderError> {
        let mut entries = self.lock();
        let index = entries
            .iter()
            .position(|(entry, _)| *entry == id)
            .ok_or(RenderError::UnknownText(id))?;
        entries.remove(index);
        Ok(())
    }

    fn set(&self, id: TextId, text: &str) -> Result<(), RenderError> {
        let mut entries = self.lock();
        let (_, slot) = entries
            .iter_mut()
            .find(|(entry, _)| *entry == id)
            .ok_or(RenderError::UnknownText(id))?;
        // Reuses the existing allocation.
        slot.clear();
        slot.push_str(text);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(TextId, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Render target backed by the viewer window. Redraws and shutdown are forwarded to the window
/// event loop.
pub struct WindowTarget {
    proxy: EventLoopProxy<ViewerEvent>,
    overlay: Arc<TextOverlay>,
    next_id: u32,
}

impl WindowTarget {
    pub fn new(proxy: EventLoopProxy<ViewerEvent>, overlay: Arc<TextOverlay>) -> Self {
        Self {
            proxy,
            overlay,
            next_id: 0,
        }
    }

    fn send(&self, event: ViewerEvent) -> Result<(), RenderError> {
        self.proxy
            .send_event(event)
            .map_err(|_| RenderError::Closed)
    }
}

impl RenderTarget for WindowTarget {
    fn text_capabilities(&self) -> TextCapabilities {
        TextCapabilities::SET_TEXT
    }

    fn add_text(&mut self, text: &str) -> Result<TextId, RenderError> {
        let id = TextId(self.next_id);
        self.next_id += 1;
        self.overlay.insert(id, text);
        Ok(id)
    }

    fn remove_text(&mut self, id: TextId) -> Result<(), RenderError> {
        self.overlay.remove(id)
    }

    fn set_text(&mut self, id: TextId, text: &str) -> Result<(), RenderError> {
        self.overlay.set(id, text)
    }

    fn request_redraw(&mut self) -> Result<(), RenderError> {
        self.send(ViewerEvent::Redraw)
    }

    fn close(&mut self) -> Result<(), RenderError> {
        self.send(ViewerEvent::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(overlay: &TextOverlay) -> Vec<String> {
        let mut texts = vec![];
        overlay.for_each(|text| texts.push(text.to_owned()));
        texts
    }

    #[test]
    fn overlay_keeps_insertion_order() {
        let overlay = TextOverlay::default();
        overlay.insert(TextId(0), "status");
        overlay.insert(TextId(1), "labels");
        overlay.set(TextId(0), "F 1/9").unwrap();

        assert_eq!(texts(&overlay), vec!["F 1/9", "labels"]);

        overlay.remove(TextId(0)).unwrap();
        assert_eq!(texts(&overlay), vec!["labels"]);
    }

    #[test]
    fn unknown_elements_are_reported() {
        let overlay = TextOverlay::default();
        assert_eq!(
            overlay.set(TextId(3), "x"),
            Err(RenderError::UnknownText(TextId(3)))
        );
        assert_eq!(
            overlay.remove(TextId(3)),
            Err(RenderError::UnknownText(TextId(3)))
        );
    }
}
