use std::sync::Arc;

use crate::config::RequestSpec;

/// Round-robin cursor over the configured request list.
///
/// `next` takes `&mut self` deliberately: the batch scheduler draws specs
/// sequentially on its own task before fanning dispatches out, so the cursor
/// has a single writer and never races.
#[derive(Debug)]
pub struct RequestCycler {
    specs: Arc<[RequestSpec]>,
    cursor: usize,
}

impl RequestCycler {
    /// `specs` must be non-empty; `Config::validate` guarantees this before
    /// a cycler is built.
    pub fn new(specs: Arc<[RequestSpec]>) -> Self {
        debug_assert!(!specs.is_empty());
        Self { specs, cursor: 0 }
    }

    /// Returns the spec at the cursor and advances one step, wrapping at the
    /// end of the list. Advances on every draw, whatever the dispatch
    /// outcome turns out to be.
    pub fn next(&mut self) -> RequestSpec {
        let spec = self.specs[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.specs.len();
        spec
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
