// SPDX-License-Identifier: CEPL-1.0
//! Diagnostics channel: validation and runtime messages from the driver,
//! forwarded to `tracing`. Purely a side-effecting sink.

use std::ffi::{c_void, CStr};
use std::fmt;

use ash::ext::debug_utils;
use ash::vk;

use crate::error::DriverCallError;
use crate::instance::Instance;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub enum DebugSeverity {
    Verbose,
    Info,
    #[default]
    Warning,
    Error,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DebugCategory {
    General,
    Validation,
    Performance,
}

impl DebugSeverity {
    const ALL: [DebugSeverity; 4] = [
        DebugSeverity::Verbose,
        DebugSeverity::Info,
        DebugSeverity::Warning,
        DebugSeverity::Error,
    ];

    /// The driver reports exactly one severity bit per message; unknown bits
    /// are treated as errors so they are never filtered out.
    pub fn from_vk(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        match flags {
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => Self::Verbose,
            vk::DebugUtilsMessageSeverityFlagsEXT::INFO => Self::Info,
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => Self::Warning,
            _ => Self::Error,
        }
    }

    fn to_vk(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        match self {
            Self::Verbose => vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            Self::Info => vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            Self::Warning => vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            Self::Error => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        }
    }

    /// Severity bits to subscribe to: `self` and everything more severe.
    pub fn and_above(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        Self::ALL
            .iter()
            .filter(|s| **s >= self)
            .fold(vk::DebugUtilsMessageSeverityFlagsEXT::empty(), |acc, s| {
                acc | s.to_vk()
            })
    }
}

impl DebugCategory {
    /// Messages may carry several type bits; the most specific one wins.
    pub fn from_vk(flags: vk::DebugUtilsMessageTypeFlagsEXT) -> Self {
        if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
            Self::Validation
        } else if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
            Self::Performance
        } else {
            Self::General
        }
    }
}

impl fmt::Display for DebugSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verbose => "verbose",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

impl fmt::Display for DebugCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::General => "general",
            Self::Validation => "validation",
            Self::Performance => "performance",
        })
    }
}

/// Routes one driver message into `tracing`.
pub fn emit(severity: DebugSeverity, category: DebugCategory, message: &str) {
    match severity {
        DebugSeverity::Verbose => tracing::trace!(%category, "[Vulkan] {message}"),
        DebugSeverity::Info => tracing::info!(%category, "[Vulkan] {message}"),
        DebugSeverity::Warning => tracing::warn!(%category, "[Vulkan] {message}"),
        DebugSeverity::Error => tracing::error!(%category, "[Vulkan] {message}"),
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: the loader passes either null or a callback-data struct that is
    // valid for the duration of this call.
    let message = unsafe {
        match data.as_ref() {
            Some(data) if !data.p_message.is_null() => {
                CStr::from_ptr(data.p_message).to_string_lossy()
            }
            _ => return vk::FALSE,
        }
    };
    emit(
        DebugSeverity::from_vk(severity),
        DebugCategory::from_vk(types),
        &message,
    );
    vk::FALSE
}

/// Create-info shared by the messenger and by instance creation, where it is
/// chained through `p_next` to catch messages from `vkCreateInstance` itself.
pub(crate) fn messenger_create_info(
    min_severity: DebugSeverity,
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(min_severity.and_above())
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

/// Must be destroyed before the instance it was created from.
pub struct DebugMessenger {
    loader: debug_utils::Instance,
    handle: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub fn new(instance: &Instance, min_severity: DebugSeverity) -> Result<Self, DriverCallError> {
        const CALL: &str = "vkCreateDebugUtilsMessengerEXT";
        let raw = instance.live(CALL)?;
        let loader = debug_utils::Instance::new(instance.entry(), raw);
        let info = messenger_create_info(min_severity);
        // SAFETY: the instance is live and was created with VK_EXT_debug_utils
        // whenever validation is enabled.
        let handle = unsafe { loader.create_debug_utils_messenger(&info, None) }
            .map_err(DriverCallError::from_call(CALL))?;
        tracing::debug!("Debug messenger created (severity >= {min_severity})");
        Ok(Self { loader, handle })
    }

    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.handle == vk::DebugUtilsMessengerEXT::null() {
            return;
        }
        tracing::debug!("Dropping debug messenger {:?}", self.handle);
        // SAFETY: the handle is non-null, so it hasn't been destroyed yet, and
        // the caller keeps the parent instance alive until after this.
        unsafe { self.loader.destroy_debug_utils_messenger(self.handle, None) };
        self.handle = vk::DebugUtilsMessengerEXT::null();
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_threshold_subscribes_to_warning_and_error() {
        let flags = DebugSeverity::Warning.and_above();
        assert_eq!(
            flags,
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
        );
    }

    #[test]
    fn verbose_threshold_subscribes_to_everything() {
        let flags = DebugSeverity::Verbose.and_above();
        assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
        assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
        assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
        assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR));
    }

    #[test]
    fn severity_round_trips_through_vk_bits() {
        for severity in DebugSeverity::ALL {
            assert_eq!(DebugSeverity::from_vk(severity.to_vk()), severity);
        }
    }

    #[test]
    fn category_prefers_validation_over_general() {
        let both = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
        assert_eq!(DebugCategory::from_vk(both), DebugCategory::Validation);
        assert_eq!(
            DebugCategory::from_vk(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE),
            DebugCategory::Performance
        );
        assert_eq!(
            DebugCategory::from_vk(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL),
            DebugCategory::General
        );
    }

    #[test]
    fn display_names_are_lowercase() {
        assert_eq!(DebugSeverity::Warning.to_string(), "warning");
        assert_eq!(DebugCategory::Performance.to_string(), "performance");
    }

    #[test]
    fn callback_tolerates_null_data() {
        // SAFETY: a null callback-data pointer is handled without dereference.
        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);
    }
}
