//! Shared test support utilities
//!
//! Provides an in-memory writer that can be handed to a log sink and read
//! back from the test, plus a ready-made application router.

use axum::Router;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

use crate::adapter::memory::InMemoryStore;
use crate::app::router::main_router;
use crate::app::state::AppState;
use crate::config::Environment;

/// Cloneable `Write` target backed by a shared byte buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Router over an empty in-memory store.
pub fn test_app(environment: Environment) -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(store.clone(), environment);
    (main_router(state), store)
}
