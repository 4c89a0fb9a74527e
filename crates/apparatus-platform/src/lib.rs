// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::{Context, Result};
use apparatus_render::{FramebufferSize, PresentationWindow, RenderSize};
use tracing::{debug, info};

pub use winit;

use winit::{
    dpi::PhysicalSize,
    event_loop::ActiveEventLoop,
    raw_window_handle::{
        DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
    },
    window::WindowId,
};

/// A native window plus the close flag the graphics layer polls.
#[derive(Debug)]
pub struct Window {
    inner: winit::window::Window,
    close_requested: bool,
}

impl Window {
    pub fn create(event_loop: &ActiveEventLoop, title: &str, size: RenderSize) -> Result<Self> {
        let attributes = winit::window::Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(size.width.max(1), size.height.max(1)));
        let inner = event_loop
            .create_window(attributes)
            .context("create_window")?;
        let actual = inner.inner_size();
        info!(
            "window \"{}\" created ({}x{})",
            title, actual.width, actual.height
        );
        Ok(Self {
            inner,
            close_requested: false,
        })
    }

    pub fn id(&self) -> WindowId {
        self.inner.id()
    }

    pub fn request_redraw(&self) {
        self.inner.request_redraw();
    }

    pub fn request_close(&mut self) {
        debug!("close requested for window {:?}", self.inner.id());
        self.close_requested = true;
    }
}

impl FramebufferSize for Window {
    fn framebuffer_size(&self) -> RenderSize {
        let size = self.inner.inner_size();
        RenderSize::new(size.width, size.height)
    }
}

impl PresentationWindow for Window {
    fn should_close(&self) -> bool {
        self.close_requested
    }
}

impl HasWindowHandle for Window {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.inner.window_handle()
    }
}

impl HasDisplayHandle for Window {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.inner.display_handle()
    }
}
