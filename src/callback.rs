//! User-facing reachability callback, §4.4/§6.

use crate::config::LBSessionParams;

/// Reachability transition reported to the session's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// No transition; reserved for parity with the wire status struct.
    Default = 0,
    /// The missed-ping threshold was reached.
    MissedPingThresh = 1,
    /// The recovery threshold was reached after a miss.
    RecoverPingThresh = 2,
}

/// Status passed to the callback on a reachability transition: the
/// triggering code, a read-only view of the session's configuration,
/// and the opaque client-data value forwarded unchanged from
/// [`LBSessionParams::client_data`].
pub struct LbStatus<'a, T> {
    pub code: StatusCode,
    pub params: &'a LBSessionParams<T>,
    pub client_data: Option<&'a T>,
}

/// The callback signature a session is started with.
pub type LbCallback<T> = Box<dyn Fn(&LbStatus<T>) + Send + 'static>;
