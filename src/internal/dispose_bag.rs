//! Internal disposal bag for managing cleanup hooks.

use crate::descriptors::{AnyArc, BoxFuture, DisposeHook};

/// Container for disposal hooks with LIFO execution order.
///
/// Async hooks are executed first (in reverse order), followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>>,
}

impl DisposeBag {
    /// Records the teardown of a freshly created instance.
    pub(crate) fn push(&mut self, hook: &DisposeHook, instance: AnyArc) {
        match hook {
            DisposeHook::Sync(f) => {
                let f = f.clone();
                self.sync.push(Box::new(move || f(&instance)));
            }
            DisposeHook::Async(f) => {
                let f = f.clone();
                self.asyncs.push(Box::new(move || f(instance)));
            }
        }
    }

    /// Runs every hook: async ones first, then sync ones, each in reverse order.
    pub(crate) async fn run_all_reverse(mut self) {
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
        }
        while let Some(f) = self.sync.pop() {
            (f)();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sync.len() + self.asyncs.len()
    }
}
