// Request-scoped user identity.
//
// Every inbound Discord message is handled on behalf of exactly one user, and
// the tools the agent dispatches need that user's credentials without the id
// being threaded through every call. The handler binds the identity for the
// duration of the request; anything downstream (including closures handed to
// `tokio::task::spawn_blocking`) reads it back with `current()`.
//
// The slot is process-wide, so this is only sound while message handling is
// serialized per process: one DM is fully processed before the next one
// starts. A multi-tenant deployment with concurrent requests would need
// per-call-chain isolation instead.

use std::sync::RwLock;

static CURRENT_USER: RwLock<String> = RwLock::new(String::new());

/// Binds `user_id` as the acting identity until the returned guard is dropped.
///
/// Bindings nest: the guard remembers whatever was bound before and puts it
/// back on drop, so a nested bind never leaks past its own scope. Guards must
/// be dropped in reverse bind order.
pub fn bind(user_id: &str) -> IdentityGuard {
    let mut slot = match CURRENT_USER.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let previous = std::mem::replace(&mut *slot, user_id.to_string());
    IdentityGuard { previous }
}

/// Returns the currently bound identity, or an empty string if none is bound.
///
/// Never panics. Callers that require an authenticated identity must check
/// for the empty sentinel and fail with a permission error themselves.
pub fn current() -> String {
    match CURRENT_USER.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Restores the previously bound identity when dropped, including on panics
/// and early returns.
pub struct IdentityGuard {
    previous: String,
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        let mut slot = match CURRENT_USER.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = std::mem::take(&mut self.previous);
    }
}
