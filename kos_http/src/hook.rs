use std::sync::{Arc, Mutex, PoisonError};

pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// Single-slot registry for the "session invalidated" callback.
///
/// At most one handler is kept; registering again replaces it.
#[derive(Clone, Default)]
pub struct UnauthorizedHook {
    slot: Arc<Mutex<Option<UnauthorizedHandler>>>,
}

impl UnauthorizedHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// The handler registered right now, for callers that wrap it.
    pub fn handler(&self) -> Option<UnauthorizedHandler> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Runs the handler, if any. The slot lock is released first so the
    /// handler may re-register itself.
    pub fn notify(&self) {
        if let Some(handler) = self.handler() {
            handler();
        }
    }
}

impl std::fmt::Debug for UnauthorizedHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedHook")
            .field("registered", &self.is_registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn notify_without_handler_is_noop() {
        UnauthorizedHook::new().notify();
    }

    #[test]
    fn last_registration_wins() {
        let hook = UnauthorizedHook::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = first.clone();
        hook.register(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = second.clone();
        hook.register(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });

        hook.notify();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        hook.clear();
        hook.notify();
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn current_handler_can_be_wrapped() {
        let hook = UnauthorizedHook::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        hook.register(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let previous = hook.handler();
        let c = calls.clone();
        hook.register(move || {
            c.fetch_add(10, Ordering::SeqCst);
            if let Some(previous) = &previous {
                previous();
            }
        });

        hook.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn handler_may_reregister_from_inside() {
        let hook = UnauthorizedHook::new();
        let inner = hook.clone();
        hook.register(move || inner.register(|| {}));
        hook.notify();
        assert!(hook.is_registered());
    }
}
