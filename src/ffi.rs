//! C-compatible Foreign Function Interface (FFI) for rally-copilot
//!
//! This module provides C-compatible bindings so that the callout engine can
//! be driven from C, C++, Python (via ctypes), or a mobile host app.
//!
//! # Memory Management
//!
//! - All string parameters should be null-terminated UTF-8 C strings (char*)
//! - Returned strings are allocated by Rust and must be freed with `rally_free_string()`
//!
//! # Error Handling
//!
//! Functions returning counts encode failures as the negated RallyResult code:
//! - 0: Success
//! - 1: Invalid parameter
//! - 2: Malformed route
//! - 3: Unknown error

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Result codes for C FFI
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallyResult {
    Success = 0,
    InvalidParameter = 1,
    MalformedRoute = 2,
    UnknownError = 3,
}

impl From<&crate::Error> for RallyResult {
    fn from(error: &crate::Error) -> Self {
        match error {
            crate::Error::InvalidInput(_) | crate::Error::InvalidPositionUpdate(_) => {
                RallyResult::InvalidParameter
            }
            crate::Error::MalformedRoute(_)
            | crate::Error::Json(_)
            | crate::Error::RouteUnavailable { .. } => RallyResult::MalformedRoute,
            _ => RallyResult::UnknownError,
        }
    }
}

/// Borrow a C string as `&str`, `None` for NULL or invalid UTF-8
fn borrow_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

/// Generate the rally callout for a maneuver
///
/// # Parameters
/// - `maneuver`: Provider maneuver tag, e.g. "turn-left" (null-terminated string, or NULL for straight)
/// - `distance_meters`: Distance to the maneuver in meters
///
/// # Returns
/// Allocated string that must be freed with `rally_free_string()`, or NULL on error
#[no_mangle]
pub extern "C" fn rally_generate_callout(maneuver: *const c_char, distance_meters: u32) -> *mut c_char {
    let maneuver = if maneuver.is_null() {
        ""
    } else {
        match borrow_str(maneuver) {
            Some(s) => s,
            None => return ptr::null_mut(),
        }
    };

    let callout = crate::generate_callout(maneuver, distance_meters);

    match CString::new(callout) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Great-circle distance in meters between two coordinates given in degrees
#[no_mangle]
pub extern "C" fn rally_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    crate::distance(&crate::GeoPoint::new(lat1, lon1), &crate::GeoPoint::new(lat2, lon2))
}

/// Count the waypoints of a bare route document
///
/// # Parameters
/// - `route_json`: Route document (null-terminated string)
///
/// # Returns
/// Number of waypoints, or a negated RallyResult code on error
#[no_mangle]
pub extern "C" fn rally_route_waypoint_count(route_json: *const c_char) -> i64 {
    let json = match borrow_str(route_json) {
        Some(s) => s,
        None => return -(RallyResult::InvalidParameter as i64),
    };

    match crate::parse_route(json).and_then(|route| crate::extract(&route)) {
        Ok(waypoints) => waypoints.len() as i64,
        Err(e) => -(RallyResult::from(&e) as i64),
    }
}

/// Free a string allocated by the library
///
/// # Parameters
/// - `ptr`: String pointer returned by library functions
#[no_mangle]
pub extern "C" fn rally_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

/// Get library version string
///
/// # Returns
/// Static string with version information (does not need to be freed)
#[no_mangle]
pub extern "C" fn rally_version() -> *const c_char {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<CString> = OnceLock::new();

    VERSION_STRING
        .get_or_init(|| {
            CString::new(format!("rally-copilot {}", env!("RALLY_VERSION")))
                .unwrap_or_default()
        })
        .as_ptr()
}
