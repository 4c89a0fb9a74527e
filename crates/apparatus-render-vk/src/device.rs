// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::{debug, info};

use crate::driver::{DeviceApi, DeviceRequest, InstanceApi, SurfaceApi};
use crate::error::{DeviceCreationError, IncompatibleDeviceError};
use crate::queue::{queue_requests, QueueFamilyIndices, ResolvedQueueFamilies};
use crate::selector::REQUIRED_DEVICE_EXTENSIONS;

/// The opened connection to one physical device plus its graphics and
/// present queues. When both roles share a family the two queue handles
/// are the same queue.
///
/// Must be destroyed before the instance it was opened from.
pub struct LogicalDevice<D: DeviceApi = ash::Device> {
    handle: Option<D>,
    physical_device: vk::PhysicalDevice,
    families: ResolvedQueueFamilies,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl<D: DeviceApi> std::fmt::Debug for LogicalDevice<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalDevice")
            .field("physical_device", &self.physical_device)
            .field("families", &self.families)
            .field("open", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: DeviceApi> LogicalDevice<D> {
    /// Re-resolves the queue families (selection should already have
    /// guaranteed them) and opens the device with the required extensions.
    /// Extension support is not re-checked; an unsupported one surfaces as
    /// the driver's error.
    pub fn open<I, S>(
        instance: &I,
        physical_device: vk::PhysicalDevice,
        surface: &S,
    ) -> Result<Self, DeviceCreationError>
    where
        I: InstanceApi<Device = D> + ?Sized,
        S: SurfaceApi + ?Sized,
    {
        if physical_device == vk::PhysicalDevice::null() {
            return Err(IncompatibleDeviceError::NullPhysicalDevice.into());
        }

        let families = QueueFamilyIndices::resolve(instance, surface, physical_device)?.require()?;
        let request = DeviceRequest {
            queues: queue_requests(families),
            extensions: REQUIRED_DEVICE_EXTENSIONS.to_vec(),
        };
        let handle = instance.create_device(physical_device, &request)?;

        // SAFETY: both families were part of `request`, each with one queue.
        let (graphics_queue, present_queue) =
            unsafe { (handle.queue(families.graphics, 0), handle.queue(families.present, 0)) };

        info!(
            "Logical device opened on {} (graphics family {}, present family {}{})",
            instance.device_name(physical_device),
            families.graphics,
            families.present,
            if families.is_combined() { ", combined" } else { "" }
        );

        Ok(Self {
            handle: Some(handle),
            physical_device,
            families,
            graphics_queue,
            present_queue,
        })
    }

    /// `None` once destroyed.
    pub fn handle(&self) -> Option<&D> {
        self.handle.as_ref()
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn families(&self) -> ResolvedQueueFamilies {
        self.families
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Waits for the device to go idle and releases it. Safe to call more
    /// than once; queue handles are invalid afterwards.
    pub fn destroy(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = handle.wait_idle() {
            tracing::error!("Error waiting for device idle before destroy: {e}");
        }
        debug!("Destroying logical device on {:?}", self.physical_device);
        // SAFETY: `take` guarantees a single destroy, and dependents (the
        // swapchain) are destroyed first by contract.
        unsafe { handle.destroy() };
        self.graphics_queue = vk::Queue::null();
        self.present_queue = vk::Queue::null();
    }
}

impl<D: DeviceApi> Drop for LogicalDevice<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverCallError;
    use crate::fake::{FakeDevice, FakeDriver, FakeFamily};
    use crate::selector::find_suitable_device;

    #[test]
    fn combined_family_requests_one_queue() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu")]);
        let device = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap();

        let requests = driver.requests();
        assert_eq!(requests.len(), 1);
        let (phys, request) = &requests[0];
        assert_eq!(*phys, driver.physical(0));
        assert_eq!(request.queues.len(), 1);
        assert_eq!(request.queues[0].family_index, 0);
        assert_eq!(request.extensions, vec![ash::khr::swapchain::NAME]);

        assert!(device.families().is_combined());
        assert_eq!(device.graphics_queue(), device.present_queue());
    }

    #[test]
    fn distinct_families_request_two_queues() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu").with_families(vec![
            FakeFamily::graphics(),
            FakeFamily::present(),
        ])]);
        let device = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap();

        let (_, request) = &driver.requests()[0];
        let families: Vec<u32> = request.queues.iter().map(|q| q.family_index).collect();
        assert_eq!(families, vec![0, 1]);
        assert_ne!(device.graphics_queue(), device.present_queue());
    }

    #[test]
    fn null_physical_device_is_incompatible() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu")]);
        let err = LogicalDevice::open(&driver, vk::PhysicalDevice::null(), &driver).unwrap_err();
        assert!(matches!(
            err,
            DeviceCreationError::Incompatible(IncompatibleDeviceError::NullPhysicalDevice)
        ));
        assert!(driver.requests().is_empty());
    }

    #[test]
    fn unresolvable_present_family_is_incompatible() {
        let driver = FakeDriver::new(vec![
            FakeDevice::capable("gpu").with_families(vec![FakeFamily::graphics()])
        ]);
        let err = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap_err();
        assert!(matches!(
            err,
            DeviceCreationError::Incompatible(IncompatibleDeviceError::MissingPresentFamily)
        ));
    }

    #[test]
    fn driver_failure_is_surfaced() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu")])
            .failing_device_creation(vk::Result::ERROR_EXTENSION_NOT_PRESENT);
        let err = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap_err();
        assert!(matches!(
            err,
            DeviceCreationError::Driver(DriverCallError {
                call: "vkCreateDevice",
                result: vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            })
        ));
    }

    #[test]
    fn destroy_is_idempotent() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu")]);
        let mut device = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap();
        device.destroy();
        device.destroy();
        assert!(!device.is_open());
        assert_eq!(device.graphics_queue(), vk::Queue::null());
        drop(device);
        assert_eq!(driver.destroyed_devices(), 1);
    }

    #[test]
    fn drop_destroys_once() {
        let driver = FakeDriver::new(vec![FakeDevice::capable("gpu")]);
        {
            let _device = LogicalDevice::open(&driver, driver.physical(0), &driver).unwrap();
        }
        assert_eq!(driver.destroyed_devices(), 1);
    }

    #[test]
    fn opens_the_selected_device() {
        let driver = FakeDriver::new(vec![
            FakeDevice::capable("integrated").with_extensions(&[]),
            FakeDevice::capable("discrete").with_families(vec![
                FakeFamily::compute(),
                FakeFamily::graphics(),
                FakeFamily::present(),
            ]),
        ]);
        let selected = find_suitable_device(&driver, &driver).unwrap().unwrap();
        let device = LogicalDevice::open(&driver, selected, &driver).unwrap();
        assert_eq!(device.physical_device(), driver.physical(1));
        assert_eq!(
            device.families(),
            ResolvedQueueFamilies {
                graphics: 1,
                present: 2
            }
        );
    }
}
