//! Fault isolation
//!
//! Every public hook operation and every report runs under a `Guard`. Work
//! either produces its value or the caller's fallback; errors and panics
//! never reach page code.

use crate::error::HookError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, Default)]
pub struct Guard {
    verbose: bool,
}

impl Guard {
    /// `verbose` logs absorbed faults at error level instead of debug.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Run `work`; on any fault, log it under `context` and return `fallback`.
    pub fn run<T>(
        &self,
        context: &str,
        fallback: T,
        work: impl FnOnce() -> Result<T, HookError>,
    ) -> T {
        let err = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => return value,
            Ok(Err(err)) => err,
            Err(payload) => HookError::Panic(panic_message(payload.as_ref())),
        };
        self.absorb(context, &err);
        fallback
    }

    /// `run` with the absent value as fallback.
    pub fn run_or_default<T: Default>(
        &self,
        context: &str,
        work: impl FnOnce() -> Result<T, HookError>,
    ) -> T {
        self.run(context, T::default(), work)
    }

    fn absorb(&self, context: &str, err: &HookError) {
        if self.verbose {
            tracing::error!(context, "fingerprint hook error: {}", err);
        } else {
            tracing::debug!(context, "absorbed fault: {}", err);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fphook_host::HostError;

    #[test]
    fn returns_value_on_success() {
        let guard = Guard::new(false);
        assert_eq!(guard.run("ok", 0, || Ok(7)), 7);
    }

    #[test]
    fn returns_fallback_on_error() {
        let guard = Guard::new(true);
        let out = guard.run("fails", "fallback", || {
            Err(HookError::Host(HostError::thrown("nope")))
        });
        assert_eq!(out, "fallback");
    }

    #[test]
    fn absorbs_panics() {
        let guard = Guard::default();
        let out: Option<u32> = guard.run_or_default("panics", || panic!("hostile target"));
        assert_eq!(out, None);
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
