//! Per-session worker threads: LBM probing and LBR response, plus the
//! raw-socket and timer primitives they share.

pub mod lbm;
pub mod lbr;
pub mod socket;
pub mod timer;

use std::ffi::CString;
use std::fs::File;
use std::os::fd::AsRawFd;

use crate::error::{Error, Result};

/// Verifies the calling process holds `CAP_NET_RAW` (or equivalent
/// raw-socket privilege), per §4.4 step 1 / §4.5. Reads
/// `/proc/self/status`'s `CapEff` line and checks bit 13
/// (`CAP_NET_RAW`), avoiding a dependency on `libcap`.
pub fn check_cap_net_raw() -> Result<()> {
    const CAP_NET_RAW_BIT: u64 = 13;
    let status = std::fs::read_to_string("/proc/self/status")
        .map_err(Error::Io)?;
    for line in status.lines() {
        if let Some(hex) = line.strip_prefix("CapEff:") {
            let mask = u64::from_str_radix(hex.trim(), 16).unwrap_or(0);
            if mask & (1 << CAP_NET_RAW_BIT) != 0 {
                return Ok(());
            }
            return Err(Error::MissingCapability);
        }
    }
    Err(Error::MissingCapability)
}

/// Enters the named network namespace under `/run/netns/<name>` before
/// any sockets are opened, per §4.4 step 2.
pub fn enter_netns(name: &str) -> Result<()> {
    let path = format!("/run/netns/{name}");
    let file = File::open(&path).map_err(Error::Io)?;

    let name_c = CString::new(name).map_err(|_| Error::InvalidInterface(name.to_string()))?;
    let _ = name_c; // kept for parity with the C API's string handling

    // SAFETY: `file` is a valid, open fd to a network namespace file;
    // CLONE_NEWNET is the fixed, correct flag for entering a netns.
    let rc = unsafe { libc::setns(file.as_raw_fd(), libc::CLONE_NEWNET) };
    if rc < 0 {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Seeds a transaction id from a cryptographically acceptable random
/// source (never from the address of a struct, per §9).
pub fn seed_transaction_id() -> u32 {
    rand::random()
}
