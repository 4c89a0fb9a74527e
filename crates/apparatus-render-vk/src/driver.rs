// SPDX-License-Identifier: CEPL-1.0
//! The seam between the negotiation logic and the Vulkan driver.
//!
//! Selection, queue resolution, logical device construction and swapchain
//! negotiation only talk to these traits. `Instance`, `Surface` and
//! `ash::Device` implement them over the real driver; tests plug in a fake
//! topology instead.
//!
//! Physical device handles passed to these methods must have been
//! enumerated from the same instance the implementation wraps.

use std::ffi::{CStr, CString};

use ash::vk;

use crate::error::DriverCallError;

/// One `VkDeviceQueueCreateInfo`: `count` queues from a single family, all at
/// the same priority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub count: u32,
    pub priority: f32,
}

/// Everything the driver needs to open a logical device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub queues: Vec<QueueRequest>,
    pub extensions: Vec<&'static CStr>,
}

pub trait InstanceApi {
    type Device: DeviceApi;

    fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, DriverCallError>;

    fn device_extension_names(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<CString>, DriverCallError>;

    /// Queue families in index order.
    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;

    /// Human-readable name, only used for logging.
    fn device_name(&self, physical_device: vk::PhysicalDevice) -> String;

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<Self::Device, DriverCallError>;
}

pub trait DeviceApi {
    /// # Safety
    /// `family_index` must have been part of the creation request with at
    /// least `queue_index + 1` queues.
    unsafe fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue;

    fn wait_idle(&self) -> Result<(), DriverCallError>;

    /// # Safety
    /// Must be called at most once, after every object created from the
    /// device has been destroyed.
    unsafe fn destroy(&mut self);
}

/// Capability queries for one presentable surface. Results are relayed
/// as the driver reports them; empty lists are valid answers.
pub trait SurfaceApi {
    fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR, DriverCallError>;

    fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, DriverCallError>;

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>, DriverCallError>;

    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, DriverCallError>;
}

impl DeviceApi for ash::Device {
    unsafe fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue {
        // SAFETY: forwarded to the caller's contract.
        unsafe { self.get_device_queue(family_index, queue_index) }
    }

    fn wait_idle(&self) -> Result<(), DriverCallError> {
        // SAFETY: the device handle is live for as long as `self` is.
        unsafe { self.device_wait_idle() }
            .map_err(DriverCallError::from_call("vkDeviceWaitIdle"))
    }

    unsafe fn destroy(&mut self) {
        tracing::debug!("Destroying device {:?}", self.handle());
        // SAFETY: forwarded to the caller's contract.
        unsafe { self.destroy_device(None) };
    }
}
