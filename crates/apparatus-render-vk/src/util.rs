// SPDX-License-Identifier: CEPL-1.0
use std::collections::HashSet;
use std::ffi::{CStr, CString, FromBytesUntilNulError};

/// First entry of `required` absent from `available`. Exact byte match;
/// order and duplicates on either side do not matter.
pub(crate) fn first_missing<'a>(required: &[&'a CStr], available: &[CString]) -> Option<&'a CStr> {
    let available: HashSet<&CStr> = available.iter().map(CString::as_c_str).collect();
    required.iter().copied().find(|name| !available.contains(name))
}

/// Copies the fixed-size name arrays Vulkan hands back, dropping any that
/// aren't NUL-terminated.
pub(crate) fn owned_names<'a, I>(names: I) -> Vec<CString>
where
    I: IntoIterator<Item = Result<&'a CStr, FromBytesUntilNulError>>,
{
    names
        .into_iter()
        .filter_map(Result::ok)
        .map(CStr::to_owned)
        .collect()
}
