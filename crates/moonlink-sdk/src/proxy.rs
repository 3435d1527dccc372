//! Runtime identity and value proxies
//!
//! A [`ValueProxy`] keeps a runtime value reachable after the stack slot it
//! was read from is gone. The runtime decides how the referent is stored; the
//! proxy only carries the owning runtime and an opaque reference number, plus
//! an optional release hook run when the last clone is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::LuaState;
use crate::error::{BridgeError, BridgeResult};

/// Unique identifier of a runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeId(u64);

impl RuntimeId {
    /// Create a new unique runtime ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        RuntimeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an ID assigned by the embedding runtime
    pub const fn from_raw(raw: u64) -> Self {
        RuntimeId(raw)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ReleaseHook = Box<dyn Fn(u64) + Send + Sync>;

struct ProxyInner {
    runtime: RuntimeId,
    reference: u64,
    release: Option<ReleaseHook>,
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.reference);
        }
    }
}

/// Stable, cloneable handle to a runtime value.
///
/// Clones share one reference; the release hook runs once, when the last
/// clone goes away.
#[derive(Clone)]
pub struct ValueProxy {
    inner: Arc<ProxyInner>,
}

impl ValueProxy {
    /// Create a proxy without a release hook
    pub fn new(runtime: RuntimeId, reference: u64) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                runtime,
                reference,
                release: None,
            }),
        }
    }

    /// Create a proxy that calls `release(reference)` when the last clone drops
    pub fn with_release(
        runtime: RuntimeId,
        reference: u64,
        release: impl Fn(u64) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                runtime,
                reference,
                release: Some(Box::new(release)),
            }),
        }
    }

    /// Runtime that owns the referenced value
    pub fn runtime(&self) -> RuntimeId {
        self.inner.runtime
    }

    /// Opaque reference number assigned by the owning runtime
    pub fn reference(&self) -> u64 {
        self.inner.reference
    }

    /// Fail with `CrossRuntimeReference` unless `state` owns this proxy
    pub fn check_owner(&self, state: &dyn LuaState) -> BridgeResult<()> {
        let expected = state.runtime_id();
        if self.runtime() != expected {
            return Err(BridgeError::CrossRuntimeReference {
                expected,
                found: self.runtime(),
            });
        }
        Ok(())
    }

    /// Push the referenced value back onto its owning stack
    pub fn push(&self, state: &mut dyn LuaState) -> BridgeResult<()> {
        self.check_owner(state)?;
        state.push_proxy(self)
    }
}

impl PartialEq for ValueProxy {
    fn eq(&self, other: &Self) -> bool {
        self.runtime() == other.runtime() && self.reference() == other.reference()
    }
}

impl fmt::Debug for ValueProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueProxy")
            .field("runtime", &self.inner.runtime)
            .field("reference", &self.inner.reference)
            .finish()
    }
}
