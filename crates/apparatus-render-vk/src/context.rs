// SPDX-License-Identifier: CEPL-1.0
//! Full bring-up: instance, diagnostics, surface, device selection, logical
//! device and swapchain, torn down in the reverse order.

use apparatus_render::{FramebufferSize, PresentationWindow};
use tracing::{debug, info, warn};

use crate::debug::DebugMessenger;
use crate::device::LogicalDevice;
use crate::driver::DeviceApi;
use crate::error::{BringUpError, SwapchainError};
use crate::instance::{Instance, InstanceConfig};
use crate::selector::find_suitable_device;
use crate::surface::Surface;
use crate::swapchain::{negotiate, Swapchain, SwapchainConfiguration, SwapchainPreferences};

#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    pub instance: InstanceConfig,
    pub swapchain: SwapchainPreferences,
}

pub struct GraphicsContext {
    swapchain: Swapchain,
    device: LogicalDevice,
    surface: Surface,
    debug: Option<DebugMessenger>,
    instance: Instance,
    preferences: SwapchainPreferences,
}

impl GraphicsContext {
    /// `Ok(None)` when no physical device is suitable for the window's
    /// surface. Anything created before a failure is released on the way out.
    pub fn new<W: PresentationWindow>(
        window: &W,
        config: &ContextConfig,
    ) -> Result<Option<Self>, BringUpError> {
        let instance = Instance::new(&config.instance, window)?;
        let debug = if instance.validation_enabled() {
            Some(
                DebugMessenger::new(&instance, config.instance.min_severity)
                    .map_err(BringUpError::Diagnostics)?,
            )
        } else {
            None
        };
        let surface = Surface::new(&instance, window)?;

        let Some(physical_device) =
            find_suitable_device(&instance, &surface).map_err(BringUpError::Selection)?
        else {
            warn!("No GPU satisfies the presentation requirements");
            return Ok(None);
        };

        let device = LogicalDevice::open(&instance, physical_device, &surface)?;
        let configuration = negotiate(&device, &surface, window, &config.swapchain)?;
        let swapchain = Swapchain::create(&instance, &device, &surface, configuration, None)?;

        info!("Graphics context ready");
        Ok(Some(Self {
            swapchain,
            device,
            surface,
            debug,
            instance,
            preferences: config.swapchain,
        }))
    }

    pub fn configuration(&self) -> &SwapchainConfiguration {
        self.swapchain.configuration()
    }

    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Renegotiates against the window's new framebuffer size. A zero-area
    /// framebuffer (minimized window) leaves the current swapchain in place.
    pub fn resize<W: FramebufferSize + ?Sized>(&mut self, window: &W) -> Result<(), SwapchainError> {
        let size = window.framebuffer_size();
        if size.is_empty() {
            debug!("Skipping swapchain rebuild for empty framebuffer");
            return Ok(());
        }
        self.device
            .handle()
            .ok_or(SwapchainError::DeviceClosed)?
            .wait_idle()?;

        let configuration = negotiate(&self.device, &self.surface, window, &self.preferences)?;
        let replacement = Swapchain::create(
            &self.instance,
            &self.device,
            &self.surface,
            configuration,
            Some(&self.swapchain),
        )?;
        let mut old = std::mem::replace(&mut self.swapchain, replacement);
        old.destroy();
        Ok(())
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        if let Some(device) = self.device.handle() {
            if let Err(err) = device.wait_idle() {
                warn!("{err} during teardown");
            }
        }
        self.swapchain.destroy();
        self.device.destroy();
        self.surface.destroy();
        if let Some(mut debug) = self.debug.take() {
            debug.destroy();
        }
        self.instance.destroy();
        info!("Graphics context torn down");
    }
}
