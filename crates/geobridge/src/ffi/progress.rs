//! Progress callbacks - host closures behind a `GDALProgressFunc`
//!
//! [`with_progress`] places a bundle on its own stack frame, hands the native
//! call an `extern "C"` trampoline plus the bundle address, and drops the bundle
//! once the call returns. The bundle therefore never moves while the native
//! side can reach it, and nothing survives the call.

use crate::native::types::{GDALProgressFunc, FALSE, TRUE};
use std::any::Any;
use std::borrow::Cow;
use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Host progress callback: `(fraction_done, message) -> keep_going`
pub type ProgressFn<'a> = &'a mut dyn FnMut(f64, &str) -> bool;

struct ProgressBundle<'a> {
    callback: &'a mut dyn FnMut(f64, &str) -> bool,
    stopped: bool,
    panic: Option<Box<dyn Any + Send + 'static>>,
}

unsafe extern "C" fn progress_trampoline(
    complete: c_double,
    message: *const c_char,
    arg: *mut c_void,
) -> c_int {
    if arg.is_null() {
        return TRUE;
    }
    let bundle = &mut *(arg as *mut ProgressBundle<'_>);

    // Once the host said stop, keep saying it without calling back again
    if bundle.stopped {
        return FALSE;
    }

    let message = if message.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(message).to_string_lossy()
    };

    let callback = &mut bundle.callback;
    match panic::catch_unwind(AssertUnwindSafe(|| callback(complete, &message))) {
        Ok(true) => TRUE,
        Ok(false) => {
            tracing::debug!(complete, "progress callback requested cancellation");
            bundle.stopped = true;
            FALSE
        }
        Err(payload) => {
            bundle.stopped = true;
            bundle.panic = Some(payload);
            FALSE
        }
    }
}

/// Run one native call with an optional progress callback
///
/// `call` receives the function pointer and user data to forward. Without a
/// callback both are null. A panic raised by the callback is reported to the
/// native side as cancellation and resumed here after `call` returns.
pub fn with_progress<R>(
    callback: Option<ProgressFn<'_>>,
    call: impl FnOnce(GDALProgressFunc, *mut c_void) -> R,
) -> R {
    let Some(callback) = callback else {
        return call(None, ptr::null_mut());
    };

    let mut bundle = ProgressBundle {
        callback,
        stopped: false,
        panic: None,
    };
    let arg = &mut bundle as *mut ProgressBundle<'_> as *mut c_void;
    let result = call(Some(progress_trampoline), arg);

    if let Some(payload) = bundle.panic.take() {
        panic::resume_unwind(payload);
    }
    result
}
