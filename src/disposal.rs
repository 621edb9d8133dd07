// Collected teardown callbacks: listener unsubscribes, timer cancels.

/// Holds cleanup callbacks until the owner is torn down.
///
/// Cleanups are expected to tolerate resources that are already gone
/// (they capture weak references), so emptying never fails.
#[derive(Default)]
pub struct DisposalBin {
    cleanups: Vec<Box<dyn FnOnce()>>,
}

impl DisposalBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cleanup: impl FnOnce() + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    /// Run and forget every stored cleanup. Safe to call repeatedly.
    pub fn empty(&mut self) {
        for cleanup in std::mem::take(&mut self.cleanups) {
            cleanup();
        }
    }

    pub fn len(&self) -> usize {
        self.cleanups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }
}

impl Drop for DisposalBin {
    fn drop(&mut self) {
        self.empty();
    }
}

impl std::fmt::Debug for DisposalBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalBin")
            .field("pending", &self.cleanups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn empty_runs_every_cleanup_once() {
        let count = Rc::new(Cell::new(0));
        let mut bin = DisposalBin::new();
        for _ in 0..3 {
            let count = count.clone();
            bin.add(move || count.set(count.get() + 1));
        }
        assert_eq!(bin.len(), 3);

        bin.empty();
        bin.empty();
        assert_eq!(count.get(), 3);
        assert!(bin.is_empty());
    }

    #[test]
    fn drop_empties() {
        let ran = Rc::new(Cell::new(false));
        {
            let mut bin = DisposalBin::new();
            let ran = ran.clone();
            bin.add(move || ran.set(true));
        }
        assert!(ran.get());
    }

    #[test]
    fn cleanup_of_released_resource_is_quiet() {
        let resource = Rc::new(Cell::new(1));
        let weak = Rc::downgrade(&resource);
        let mut bin = DisposalBin::new();
        bin.add(move || {
            if let Some(resource) = weak.upgrade() {
                resource.set(0);
            }
        });
        drop(resource);
        bin.empty();
    }
}
