//! The interface between the playback engine and whatever draws the skeleton.

bitflags::bitflags! {
    /// In-place text updates a render target supports.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TextCapabilities: u8 {
        const SET_TEXT = 1 << 0;
        const REPLACE_TEXT = 1 << 1;
    }
}

/// A text element owned by a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The target was torn down. Nothing sent to it will be drawn again.
    #[error("Render target is closed")]
    Closed,

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Unknown text element: {0:?}")]
    UnknownText(TextId),
}

/// A renderer that displays the live skeleton buffers.
///
/// Targets are moved onto the playback thread while the animation is playing, so every call
/// may come from a thread other than the one that created the target.
pub trait RenderTarget: Send + 'static {
    /// Which in-place text updates can be used for the status line.
    fn text_capabilities(&self) -> TextCapabilities {
        TextCapabilities::empty()
    }

    fn add_text(&mut self, text: &str) -> Result<TextId, RenderError>;

    fn remove_text(&mut self, id: TextId) -> Result<(), RenderError>;

    /// Overwrite the contents of an existing text element.
    fn set_text(&mut self, _id: TextId, _text: &str) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("set_text"))
    }

    /// Alternate way of overwriting the contents of an existing text element.
    fn replace_text(&mut self, _id: TextId, _text: &str) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("replace_text"))
    }

    /// Ask the target to draw the current buffer contents. Does not wait for the draw.
    fn request_redraw(&mut self) -> Result<(), RenderError>;

    /// Release the target. The session ends after this.
    fn close(&mut self) -> Result<(), RenderError>;
}
