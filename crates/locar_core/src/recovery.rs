//! Panic containment for host-supplied callbacks
//!
//! Render callbacks and asset completions are written by the embedding app.
//! A panic in one of them must not unwind through the frame loop, so the
//! scene runs each of them through these helpers and keeps going.

use std::panic::{self, AssertUnwindSafe};

/// Run a mutable closure, converting a panic into an error message
pub fn catch_panic_mut<F, R>(mut f: F) -> Result<R, String>
where
    F: FnMut() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(|| f())).map_err(panic_message)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_panic_ok() {
        let mut value = 6;
        let result = catch_panic_mut(|| {
            value += 1;
            value
        });
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn test_catch_panic_message() {
        let result: Result<(), String> = catch_panic_mut(|| panic!("label view gone"));
        assert_eq!(result, Err("label view gone".to_string()));
    }

    #[test]
    fn test_catch_panic_mut_formatted_message() {
        let mut calls = 0;
        let result: Result<(), String> = catch_panic_mut(|| {
            calls += 1;
            panic!("record {} failed", calls)
        });
        assert_eq!(result, Err("record 1 failed".to_string()));
    }
}
