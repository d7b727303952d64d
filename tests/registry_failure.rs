//! Synchronous-failure paths of the session registry (S4, S6) that
//! don't require `CAP_NET_RAW` or a live interface pair.

use ethlb::{Error, LBSessionParamsBuilder, SessionId, SessionKind};

#[test]
fn bad_mac_string_never_reaches_session_start() {
    // S4: the Rust redesign rejects an unparseable destination MAC at
    // `build()`, before a `SessionId` can even be requested — a
    // stronger guarantee than the original's "session_start returns -1".
    let err = LBSessionParamsBuilder::<()>::new("eth0")
        .dst_mac("aa:bb:gg")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMacAddress(_)));
}

#[test]
fn invalid_session_kind_never_reaches_session_start() {
    // S6: an invalid numeric kind is rejected by `SessionKind::from_raw`
    // before a worker could be spawned at all.
    let err = SessionKind::from_raw(9).unwrap_err();
    assert!(matches!(err, Error::InvalidSessionKind(9)));
}

#[test]
fn session_start_on_a_nonexistent_interface_fails_synchronously() {
    // No CAP_NET_RAW or live interface required: setup fails either at
    // the capability check or at MAC resolution, and session_start
    // must return the invalid sentinel without leaving a worker alive.
    let params = LBSessionParamsBuilder::<()>::new("ethlb-test-missing-iface-0")
        .dst_mac("00:11:22:33:44:55")
        .build()
        .unwrap();

    let session_id = ethlb::session_start(params, SessionKind::Lbm);
    assert_eq!(session_id, SessionId::invalid());
    assert!(!session_id.is_valid());
}
