//! The process-wide pipeline every action invocation passes through
//!
//! Models are single-threaded, so "process-wide" means per thread: each thread
//! that dispatches actions sees its own global pipeline, created lazily on
//! first use.

use crate::config::MiddlewareConfig;
use crate::middleware::Middleware;
use std::cell::OnceCell;
use tracing::debug;

thread_local! {
    static GLOBAL: OnceCell<Middleware> = const { OnceCell::new() };
}

/// Handle to the global pipeline
pub fn global_middleware() -> Middleware {
    GLOBAL.with(|global| global.get_or_init(Middleware::new).clone())
}

/// Create the global pipeline with a non-default configuration
///
/// Returns `false` if the pipeline already exists; its configuration is then
/// left unchanged.
pub fn configure_global_middleware(config: MiddlewareConfig) -> bool {
    let installed = GLOBAL.with(|global| global.set(Middleware::with_config(config)).is_ok());
    debug!(installed, ?config, "configure global middleware");
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CancelRestore;

    #[test]
    fn test_global_is_shared() {
        let a = global_middleware();
        let b = global_middleware();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_configure_only_before_first_use() {
        std::thread::spawn(|| {
            let config = MiddlewareConfig::default().with_cancel(CancelRestore::Previous);
            assert!(configure_global_middleware(config));
            assert_eq!(global_middleware().config().cancel, CancelRestore::Previous);
            assert!(!configure_global_middleware(MiddlewareConfig::default()));
            assert_eq!(global_middleware().config().cancel, CancelRestore::Previous);
        })
        .join()
        .unwrap();
    }
}
