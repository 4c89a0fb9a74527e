// SPDX-License-Identifier: CEPL-1.0
use ash::khr::surface;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::driver::SurfaceApi;
use crate::error::{DriverCallError, SurfaceCreationError};
use crate::instance::Instance;

/// A presentable target bound to one window. Must be destroyed after any
/// swapchain created from it and before the instance.
pub struct Surface {
    loader: surface::Instance,
    handle: vk::SurfaceKHR,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub fn new<W>(instance: &Instance, window: &W) -> Result<Self, SurfaceCreationError>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        const CALL: &str = "vkCreateSurfaceKHR";
        let display = window
            .display_handle()
            .map_err(SurfaceCreationError::InvalidDisplayHandle)?
            .as_raw();
        let window = window
            .window_handle()
            .map_err(SurfaceCreationError::InvalidWindowHandle)?
            .as_raw();

        let raw = instance.live(CALL)?;
        // SAFETY: the instance is live and was created with the extensions
        // ash_window reported for this display; the window outlives the
        // surface (caller contract).
        let handle =
            unsafe { ash_window::create_surface(instance.entry(), raw, display, window, None) }
                .map_err(DriverCallError::from_call(CALL))?;
        let loader = surface::Instance::new(instance.entry(), raw);
        tracing::debug!("Surface created {:?}", handle);
        Ok(Self { loader, handle })
    }

    pub fn raw_handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    fn live(&self, call: &'static str) -> Result<vk::SurfaceKHR, DriverCallError> {
        if self.handle == vk::SurfaceKHR::null() {
            Err(DriverCallError::new(call, vk::Result::ERROR_SURFACE_LOST_KHR))
        } else {
            Ok(self.handle)
        }
    }

    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.handle == vk::SurfaceKHR::null() {
            return;
        }
        tracing::debug!("Dropping surface {:?}", self.handle);
        // SAFETY: non-null means not yet destroyed; swapchains built on it are
        // gone and the instance is still live (caller contract).
        unsafe { self.loader.destroy_surface(self.handle, None) };
        self.handle = vk::SurfaceKHR::null();
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl SurfaceApi for Surface {
    fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR, DriverCallError> {
        const CALL: &str = "vkGetPhysicalDeviceSurfaceCapabilitiesKHR";
        let surface = self.live(CALL)?;
        // SAFETY: `physical_device` comes from the instance this surface was
        // created under.
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
        .map_err(DriverCallError::from_call(CALL))
    }

    fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, DriverCallError> {
        const CALL: &str = "vkGetPhysicalDeviceSurfaceFormatsKHR";
        let surface = self.live(CALL)?;
        // SAFETY: see `capabilities`.
        unsafe {
            self.loader
                .get_physical_device_surface_formats(physical_device, surface)
        }
        .map_err(DriverCallError::from_call(CALL))
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>, DriverCallError> {
        const CALL: &str = "vkGetPhysicalDeviceSurfacePresentModesKHR";
        let surface = self.live(CALL)?;
        // SAFETY: see `capabilities`.
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
        .map_err(DriverCallError::from_call(CALL))
    }

    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, DriverCallError> {
        const CALL: &str = "vkGetPhysicalDeviceSurfaceSupportKHR";
        let surface = self.live(CALL)?;
        // SAFETY: see `capabilities`; `family_index` is bounds-checked by the
        // callers against the device's family list.
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, family_index, surface)
        }
        .map_err(DriverCallError::from_call(CALL))
    }
}
