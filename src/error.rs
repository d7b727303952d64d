//! Error types for the ETH-LB engine.
//!
//! This module defines the [`Error`] enum which represents all possible
//! failures that can occur while configuring or running an ETH-LB session.

use std::fmt;

/// Errors that can occur during session configuration or setup.
///
/// Runtime send/receive errors that occur once a session is configured are
/// logged and treated as transient (see the worker modules) — they never
/// surface through this type, matching the propagation policy of the
/// engine: config/setup errors bubble to the caller, runtime errors never
/// do.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred opening a socket, network namespace, or
    /// timer.
    Io(std::io::Error),

    /// The destination MAC address string could not be parsed.
    InvalidMacAddress(String),

    /// The configured network interface does not exist or could not be
    /// resolved to an index/MAC address.
    InvalidInterface(String),

    /// The calling process lacks `CAP_NET_RAW` (or equivalent raw-socket
    /// privilege).
    MissingCapability,

    /// `session_start` was called with a session kind the registry does
    /// not recognize.
    InvalidSessionKind(i32),

    /// The route-netlink sweep used to detect VLAN sub-interfaces failed.
    Netlink(String),

    /// Creating or arming the transmit interval timer failed.
    Timer(std::io::Error),

    /// A worker failed during its setup phase for a reason not covered
    /// by a more specific variant above.
    WorkerSetup(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidMacAddress(s) => write!(f, "invalid destination MAC address: {s}"),
            Error::InvalidInterface(s) => write!(f, "invalid network interface: {s}"),
            Error::MissingCapability => {
                write!(f, "execution requires CAP_NET_RAW capability")
            }
            Error::InvalidSessionKind(k) => write!(f, "invalid session kind: {k}"),
            Error::Netlink(s) => write!(f, "netlink error: {s}"),
            Error::Timer(e) => write!(f, "timer error: {e}"),
            Error::WorkerSetup(s) => write!(f, "worker setup failed: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Timer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// A specialized `Result` type for ETH-LB operations.
pub type Result<T> = std::result::Result<T, Error>;
