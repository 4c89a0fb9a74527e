// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr, CString};

use ash::vk;
use ash::Entry;
use raw_window_handle::{HasDisplayHandle, RawDisplayHandle};
use tracing::{debug, info};

use crate::debug::{messenger_create_info, DebugSeverity};
use crate::driver::{DeviceRequest, InstanceApi};
use crate::error::{DriverCallError, InstanceError};
use crate::util::{first_missing, owned_names};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";
const ENGINE_NAME: &CStr = c"Apparatus Engine";

#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub app_name: String,
    /// Enables `VK_LAYER_KHRONOS_validation` and `VK_EXT_debug_utils`.
    pub validation: bool,
    pub min_severity: DebugSeverity,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            app_name: "Apparatus".to_string(),
            validation: cfg!(debug_assertions),
            min_severity: DebugSeverity::Warning,
        }
    }
}

/// Owns the connection to the Vulkan runtime. Every other component borrows
/// the instance handle and must be destroyed before it.
pub struct Instance {
    entry: Entry,
    raw: Option<ash::Instance>,
    validation: bool,
}

impl Instance {
    pub fn new(
        config: &InstanceConfig,
        display: &dyn HasDisplayHandle,
    ) -> Result<Self, InstanceError> {
        let display = display
            .display_handle()
            .map_err(InstanceError::DisplayHandle)?
            .as_raw();

        // SAFETY: the loaded library is kept alive by `entry`, which outlives
        // every object created through it.
        let entry = unsafe { Entry::load() }?;

        let extensions = required_extensions(display, config.validation)?;
        let supported = supported_extensions(&entry)?;
        if let Some(missing) = first_missing(&extensions, &supported) {
            return Err(InstanceError::UnsupportedExtension(missing.to_owned()));
        }

        let layers: Vec<&CStr> = if config.validation {
            vec![VALIDATION_LAYER]
        } else {
            Vec::new()
        };
        if !layers.is_empty() {
            let supported = supported_layers(&entry)?;
            if let Some(missing) = first_missing(&layers, &supported) {
                return Err(InstanceError::UnsupportedLayer(missing.to_owned()));
            }
        }

        let app_name = CString::new(config.app_name.as_str())?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(ENGINE_NAME)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let extension_ptrs: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

        let mut debug_info = messenger_create_info(config.min_severity);
        let mut create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);
        if config.validation {
            create_info = create_info.push_next(&mut debug_info);
        }

        // SAFETY: every pointer in `create_info` refers to locals that live
        // until after this call.
        let raw = unsafe { entry.create_instance(&create_info, None) }
            .map_err(DriverCallError::from_call("vkCreateInstance"))?;

        info!(
            "Vulkan instance created for \"{}\" ({} extensions, validation={})",
            config.app_name,
            extensions.len(),
            config.validation
        );
        for ext in &extensions {
            debug!("  instance extension {:?}", ext);
        }

        Ok(Self {
            entry,
            raw: Some(raw),
            validation: config.validation,
        })
    }

    pub fn validation_enabled(&self) -> bool {
        self.validation
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The live instance, or a `DriverCallError` naming `call` once destroyed.
    pub fn live(&self, call: &'static str) -> Result<&ash::Instance, DriverCallError> {
        self.raw
            .as_ref()
            .ok_or(DriverCallError::new(call, vk::Result::ERROR_INITIALIZATION_FAILED))
    }

    /// Safe to call more than once. Every dependent object must already be
    /// gone.
    pub fn destroy(&mut self) {
        if let Some(raw) = self.raw.take() {
            debug!("Dropping instance {:?}", raw.handle());
            // SAFETY: dependents were destroyed first (caller contract) and
            // `take` guarantees this runs once.
            unsafe { raw.destroy_instance(None) };
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.raw.as_ref().map(|raw| raw.handle()))
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

fn required_extensions(
    display: RawDisplayHandle,
    validation: bool,
) -> Result<Vec<&'static CStr>, DriverCallError> {
    let window_system = ash_window::enumerate_required_extensions(display)
        .map_err(DriverCallError::from_call("ash_window::enumerate_required_extensions"))?;
    let mut extensions: Vec<&'static CStr> = window_system
        .iter()
        // SAFETY: ash_window returns pointers to static NUL-terminated names.
        .map(|&ptr| unsafe { CStr::from_ptr(ptr) })
        .collect();
    if validation {
        extensions.push(ash::ext::debug_utils::NAME);
    }
    Ok(extensions)
}

fn supported_extensions(entry: &Entry) -> Result<Vec<CString>, DriverCallError> {
    // SAFETY: plain enumeration with no layer filter.
    let props = unsafe { entry.enumerate_instance_extension_properties(None) }
        .map_err(DriverCallError::from_call("vkEnumerateInstanceExtensionProperties"))?;
    Ok(owned_names(props.iter().map(|p| p.extension_name_as_c_str())))
}

fn supported_layers(entry: &Entry) -> Result<Vec<CString>, DriverCallError> {
    // SAFETY: plain enumeration.
    let props = unsafe { entry.enumerate_instance_layer_properties() }
        .map_err(DriverCallError::from_call("vkEnumerateInstanceLayerProperties"))?;
    Ok(owned_names(props.iter().map(|p| p.layer_name_as_c_str())))
}

impl InstanceApi for Instance {
    type Device = ash::Device;

    fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, DriverCallError> {
        const CALL: &str = "vkEnumeratePhysicalDevices";
        let raw = self.live(CALL)?;
        // SAFETY: `raw` is live.
        unsafe { raw.enumerate_physical_devices() }.map_err(DriverCallError::from_call(CALL))
    }

    fn device_extension_names(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<CString>, DriverCallError> {
        const CALL: &str = "vkEnumerateDeviceExtensionProperties";
        let raw = self.live(CALL)?;
        // SAFETY: `physical_device` was enumerated from this instance.
        let props = unsafe { raw.enumerate_device_extension_properties(physical_device) }
            .map_err(DriverCallError::from_call(CALL))?;
        Ok(owned_names(props.iter().map(|p| p.extension_name_as_c_str())))
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        match &self.raw {
            // SAFETY: `physical_device` was enumerated from this instance.
            Some(raw) => unsafe { raw.get_physical_device_queue_family_properties(physical_device) },
            None => Vec::new(),
        }
    }

    fn device_name(&self, physical_device: vk::PhysicalDevice) -> String {
        let Some(raw) = &self.raw else {
            return String::from("<destroyed instance>");
        };
        // SAFETY: `physical_device` was enumerated from this instance.
        let props = unsafe { raw.get_physical_device_properties(physical_device) };
        props
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed device>"))
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<ash::Device, DriverCallError> {
        const CALL: &str = "vkCreateDevice";
        let raw = self.live(CALL)?;

        let priorities: Vec<Vec<f32>> = request
            .queues
            .iter()
            .map(|q| vec![q.priority; q.count as usize])
            .collect();
        let queue_infos: Vec<vk::DeviceQueueCreateInfo<'_>> = request
            .queues
            .iter()
            .zip(&priorities)
            .map(|(q, p)| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(q.family_index)
                    .queue_priorities(p)
            })
            .collect();
        let extension_ptrs: Vec<*const c_char> =
            request.extensions.iter().map(|e| e.as_ptr()).collect();
        let features = vk::PhysicalDeviceFeatures::default();

        let info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        // SAFETY: `physical_device` was enumerated from this instance and all
        // pointers in `info` outlive the call.
        unsafe { raw.create_device(physical_device, &info, None) }
            .map_err(DriverCallError::from_call(CALL))
    }
}
