//! End-to-end scenarios that need `CAP_NET_RAW` and a live veth pair.
//! Not runnable in an unprivileged sandbox; run manually as root:
//!
//! ```sh
//! ip link add veth0 type veth peer name veth1
//! ip link set veth0 up
//! ip link set veth1 up
//! cargo test --test veth_loopback -- --ignored
//! ip link del veth0
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ethlb::callback::StatusCode;
use ethlb::{iface, LBSessionParamsBuilder, SessionKind};

#[test]
#[ignore = "requires CAP_NET_RAW and a veth0/veth1 pair; see module docs"]
fn s1_basic_loopback_recovers_within_four_seconds() {
    let veth1_mac = iface::resolve_iface_mac("veth1").unwrap();

    let recover_count = Arc::new(AtomicU32::new(0));
    let recover_count_cb = Arc::clone(&recover_count);

    let lbr_params = LBSessionParamsBuilder::<()>::new("veth1").build().unwrap();
    let lbr_id = ethlb::session_start(lbr_params, SessionKind::Lbr);
    assert!(lbr_id.is_valid());

    let lbm_params = LBSessionParamsBuilder::<()>::new("veth0")
        .dst_mac(veth1_mac.to_string())
        .interval_ms(1000)
        .missed_consecutive_ping_threshold(2)
        .ping_recovery_threshold(2)
        .callback(move |status| {
            if status.code == StatusCode::RecoverPingThresh {
                recover_count_cb.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap();
    let lbm_id = ethlb::session_start(lbm_params, SessionKind::Lbm);
    assert!(lbm_id.is_valid());

    thread::sleep(Duration::from_secs(4));

    assert_eq!(recover_count.load(Ordering::SeqCst), 1);

    ethlb::session_stop(lbm_id);
    ethlb::session_stop(lbr_id);
}

#[test]
#[ignore = "requires CAP_NET_RAW, a veth0/veth1 pair, and `ip link set veth0 down`; see module docs"]
fn s2_interface_down_then_up_signals_missed_then_recover() {
    // Manual scenario: start S1, run `ip link set veth0 down`, observe
    // MISSED_PING_THRESH within interval*(missed+1), then
    // `ip link set veth0 up` and observe RECOVER_PING_THRESH within
    // interval*(recovery+1). Left unautomated since toggling link state
    // from within the test process requires the same CAP_NET_ADMIN
    // privilege as the veth setup itself.
}

#[test]
#[ignore = "requires CAP_NET_RAW and a veth0/veth1 pair; see module docs"]
fn s3_meg_level_mismatch_never_recovers() {
    let veth1_mac = iface::resolve_iface_mac("veth1").unwrap();

    let missed_count = Arc::new(AtomicU32::new(0));
    let recover_count = Arc::new(AtomicU32::new(0));
    let missed_cb = Arc::clone(&missed_count);
    let recover_cb = Arc::clone(&recover_count);

    let lbr_params = LBSessionParamsBuilder::<()>::new("veth1")
        .meg_level(1)
        .build()
        .unwrap();
    let lbr_id = ethlb::session_start(lbr_params, SessionKind::Lbr);
    assert!(lbr_id.is_valid());

    let lbm_params = LBSessionParamsBuilder::<()>::new("veth0")
        .dst_mac(veth1_mac.to_string())
        .meg_level(0)
        .interval_ms(1000)
        .missed_consecutive_ping_threshold(2)
        .ping_recovery_threshold(2)
        .callback(move |status| match status.code {
            StatusCode::MissedPingThresh => {
                missed_cb.fetch_add(1, Ordering::SeqCst);
            }
            StatusCode::RecoverPingThresh => {
                recover_cb.fetch_add(1, Ordering::SeqCst);
            }
            StatusCode::Default => {}
        })
        .build()
        .unwrap();
    let lbm_id = ethlb::session_start(lbm_params, SessionKind::Lbm);
    assert!(lbm_id.is_valid());

    thread::sleep(Duration::from_secs(10));

    assert!(missed_count.load(Ordering::SeqCst) >= 1);
    assert_eq!(recover_count.load(Ordering::SeqCst), 0);

    ethlb::session_stop(lbm_id);
    ethlb::session_stop(lbr_id);
}

#[test]
#[ignore = "requires CAP_NET_RAW and lbm-peer/lbr1/lbr2/lbr3 interfaces bridged together; see module docs"]
fn s5_multicast_discovery_reaches_matching_meg_level_peers_only() {
    // Manual scenario: bridge lbm-peer, lbr1, lbr2, lbr3 onto one
    // broadcast domain. Start LBR on lbr1 (meg_level=0), lbr2
    // (meg_level=0), lbr3 (meg_level=1). Start a multicast LBM on
    // lbm-peer with interval_ms=5000, meg_level=0, and a log_file.
    // Within 15s, the log file must contain "Got LBR from <MAC of
    // lbr1>" and "... lbr2" but never the MAC of lbr3.
}
