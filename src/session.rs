//! Session registry / lifecycle, §4.3.
//!
//! Translates the original's semaphore-handoff + raw `pthread_t` model
//! into an `mpsc` rendezvous channel for the handoff and a
//! `JoinHandle` held in the registry, keyed by an opaque [`SessionId`]
//! instead of exposing the underlying thread identity (§9).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

use crate::config::{LBSessionParams, SessionKind};
use crate::worker::{lbm, lbr};

/// Opaque handle returned by `session_start`. Never exposes the
/// underlying thread identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(i64);

impl SessionId {
    pub fn raw(self) -> i64 {
        self.0
    }

    /// The sentinel returned by `session_start` on synchronous failure.
    pub fn invalid() -> Self {
        SessionId(-1)
    }

    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

/// Signaled by a worker once it has finished setup: `Ok(())` on
/// success, `Err(code)` mirroring the C API's negative handoff code.
pub(crate) type HandoffResult = std::result::Result<(), i32>;

struct SessionHandle {
    cancel: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

static NEXT_ID: AtomicI64 = AtomicI64::new(1);
static REGISTRY: OnceLock<Mutex<HashMap<i64, SessionHandle>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<i64, SessionHandle>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Starts a worker of the requested `kind`, waits for its setup phase
/// to complete or fail, and returns a session id or the `-1` sentinel
/// ([`SessionId::invalid`]).
///
/// The worker takes ownership of `params` for its lifetime; the caller
/// must outlive the session (§4.3).
pub fn session_start<T>(params: LBSessionParams<T>, kind: SessionKind) -> SessionId
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel::<HandoffResult>();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_worker = Arc::clone(&cancel);

    let join = match kind {
        SessionKind::Lbm => std::thread::spawn(move || lbm::run(params, cancel_for_worker, tx)),
        SessionKind::Lbr => std::thread::spawn(move || lbr::run(params, cancel_for_worker, tx)),
    };

    match rx.recv() {
        Ok(Ok(())) => {
            let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
            registry()
                .lock()
                .unwrap()
                .insert(id, SessionHandle { cancel, join });
            SessionId(id)
        }
        Ok(Err(_)) | Err(_) => {
            let _ = join.join();
            SessionId::invalid()
        }
    }
}

/// Requests cancellation of the worker for `session_id` and waits for
/// it to finish. No-op on an invalid id.
pub fn session_stop(session_id: SessionId) {
    if session_id.0 <= 0 {
        return;
    }
    let handle = registry().lock().unwrap().remove(&session_id.0);
    if let Some(handle) = handle {
        handle.cancel.store(true, Ordering::SeqCst);
        let _ = handle.join.join();
    }
}

/// Signals the registry that this worker's setup succeeded.
pub(crate) fn signal_configured(tx: &mpsc::Sender<HandoffResult>) {
    let _ = tx.send(Ok(()));
}

/// Signals the registry that this worker's setup failed with `code`.
pub(crate) fn signal_failed(tx: &mpsc::Sender<HandoffResult>, code: i32) {
    let _ = tx.send(Err(code));
}
