// SPDX-License-Identifier: CEPL-1.0
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Size in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-sized framebuffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Anything that can report the current framebuffer size in pixels.
pub trait FramebufferSize {
    fn framebuffer_size(&self) -> RenderSize;
}

impl FramebufferSize for RenderSize {
    fn framebuffer_size(&self) -> RenderSize {
        *self
    }
}

/// The window collaborator a graphics backend is brought up against: native
/// handles for surface creation, the framebuffer size for extent selection,
/// and whether the user asked to close it.
pub trait PresentationWindow: HasWindowHandle + HasDisplayHandle + FramebufferSize {
    fn should_close(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_empty() {
        assert!(RenderSize::new(0, 600).is_empty());
        assert!(RenderSize::new(800, 0).is_empty());
        assert!(!RenderSize::new(1, 1).is_empty());
    }

    #[test]
    fn render_size_reports_itself() {
        let size = RenderSize::new(1920, 1080);
        assert_eq!(size.framebuffer_size(), size);
    }
}
