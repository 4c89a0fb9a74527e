// SPDX-License-Identifier: CEPL-1.0
//! Deterministic in-memory driver used by the unit tests.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString};
use std::rc::Rc;

use ash::vk::{self, Handle};

use crate::driver::{DeviceApi, DeviceRequest, InstanceApi, SurfaceApi};
use crate::error::DriverCallError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeFamily {
    pub flags: vk::QueueFlags,
    pub present: bool,
}

impl FakeFamily {
    pub fn graphics() -> Self {
        Self {
            flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            present: false,
        }
    }

    pub fn present() -> Self {
        Self {
            flags: vk::QueueFlags::TRANSFER,
            present: true,
        }
    }

    pub fn combined() -> Self {
        Self {
            flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
            present: true,
        }
    }

    pub fn compute() -> Self {
        Self {
            flags: vk::QueueFlags::COMPUTE,
            present: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeDevice {
    pub name: &'static str,
    pub extensions: Vec<CString>,
    pub families: Vec<FakeFamily>,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
}

impl FakeDevice {
    /// Passes every suitability check with one combined family.
    pub fn capable(name: &'static str) -> Self {
        Self {
            name,
            extensions: vec![c"VK_KHR_maintenance1".to_owned(), c"VK_KHR_swapchain".to_owned()],
            families: vec![FakeFamily::combined()],
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 1,
                ..Default::default()
            },
        }
    }

    pub fn with_extensions(mut self, names: &[&CStr]) -> Self {
        self.extensions = names.iter().map(|n| (*n).to_owned()).collect();
        self
    }

    pub fn with_families(mut self, families: Vec<FakeFamily>) -> Self {
        self.families = families;
        self
    }

    pub fn with_formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_present_modes(mut self, modes: Vec<vk::PresentModeKHR>) -> Self {
        self.present_modes = modes;
        self
    }

    pub fn with_capabilities(mut self, capabilities: vk::SurfaceCapabilitiesKHR) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Plays both the instance and the surface. Physical device `i` has the raw
/// handle `i + 1`.
pub(crate) struct FakeDriver {
    devices: Vec<FakeDevice>,
    requests: RefCell<Vec<(vk::PhysicalDevice, DeviceRequest)>>,
    destroyed: Rc<Cell<u32>>,
    fail_enumerate: Option<vk::Result>,
    fail_create: Option<vk::Result>,
}

impl FakeDriver {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            requests: RefCell::new(Vec::new()),
            destroyed: Rc::new(Cell::new(0)),
            fail_enumerate: None,
            fail_create: None,
        }
    }

    pub fn failing_enumeration(mut self, result: vk::Result) -> Self {
        self.fail_enumerate = Some(result);
        self
    }

    pub fn failing_device_creation(mut self, result: vk::Result) -> Self {
        self.fail_create = Some(result);
        self
    }

    pub fn physical(&self, index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(index as u64 + 1)
    }

    pub fn requests(&self) -> Vec<(vk::PhysicalDevice, DeviceRequest)> {
        self.requests.borrow().clone()
    }

    pub fn destroyed_devices(&self) -> u32 {
        self.destroyed.get()
    }

    fn device(
        &self,
        physical_device: vk::PhysicalDevice,
        call: &'static str,
    ) -> Result<&FakeDevice, DriverCallError> {
        (physical_device.as_raw() as usize)
            .checked_sub(1)
            .and_then(|index| self.devices.get(index))
            .ok_or(DriverCallError::new(call, vk::Result::ERROR_DEVICE_LOST))
    }
}

impl InstanceApi for FakeDriver {
    type Device = FakeLogicalDevice;

    fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, DriverCallError> {
        if let Some(result) = self.fail_enumerate {
            return Err(DriverCallError::new("vkEnumeratePhysicalDevices", result));
        }
        Ok((0..self.devices.len()).map(|i| self.physical(i)).collect())
    }

    fn device_extension_names(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<CString>, DriverCallError> {
        Ok(self
            .device(physical_device, "vkEnumerateDeviceExtensionProperties")?
            .extensions
            .clone())
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.device(physical_device, "vkGetPhysicalDeviceQueueFamilyProperties")
            .map(|device| {
                device
                    .families
                    .iter()
                    .map(|family| vk::QueueFamilyProperties {
                        queue_flags: family.flags,
                        queue_count: 1,
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn device_name(&self, physical_device: vk::PhysicalDevice) -> String {
        self.device(physical_device, "vkGetPhysicalDeviceProperties")
            .map(|device| device.name.to_string())
            .unwrap_or_default()
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<FakeLogicalDevice, DriverCallError> {
        self.device(physical_device, "vkCreateDevice")?;
        if let Some(result) = self.fail_create {
            return Err(DriverCallError::new("vkCreateDevice", result));
        }
        self.requests
            .borrow_mut()
            .push((physical_device, request.clone()));
        Ok(FakeLogicalDevice {
            destroyed: Rc::clone(&self.destroyed),
        })
    }
}

impl SurfaceApi for FakeDriver {
    fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR, DriverCallError> {
        Ok(self
            .device(physical_device, "vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?
            .capabilities)
    }

    fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, DriverCallError> {
        Ok(self
            .device(physical_device, "vkGetPhysicalDeviceSurfaceFormatsKHR")?
            .formats
            .clone())
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>, DriverCallError> {
        Ok(self
            .device(physical_device, "vkGetPhysicalDeviceSurfacePresentModesKHR")?
            .present_modes
            .clone())
    }

    fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, DriverCallError> {
        Ok(self
            .device(physical_device, "vkGetPhysicalDeviceSurfaceSupportKHR")?
            .families
            .get(family_index as usize)
            .is_some_and(|family| family.present))
    }
}

#[derive(Debug)]
pub(crate) struct FakeLogicalDevice {
    destroyed: Rc<Cell<u32>>,
}

impl DeviceApi for FakeLogicalDevice {
    /// Same family and index always map to the same queue handle.
    unsafe fn queue(&self, family_index: u32, queue_index: u32) -> vk::Queue {
        vk::Queue::from_raw(((family_index as u64 + 1) << 16) | queue_index as u64)
    }

    fn wait_idle(&self) -> Result<(), DriverCallError> {
        Ok(())
    }

    unsafe fn destroy(&mut self) {
        self.destroyed.set(self.destroyed.get() + 1);
    }
}
