use ethlb::config::Destination;
use ethlb::{Error, LBSessionParamsBuilder, SessionKind};

#[test]
fn unicast_requires_a_parseable_mac() {
    let err = LBSessionParamsBuilder::<()>::new("eth0")
        .dst_mac("not-a-mac")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMacAddress(_)));
}

#[test]
fn multicast_session_clamps_interval_and_drops_unicast_fields() {
    let params = LBSessionParamsBuilder::<()>::new("eth0")
        .multicast(true)
        .interval_ms(10)
        .meg_level(2)
        .build()
        .unwrap();

    assert!(matches!(params.dst_mac, Destination::Multicast));
    assert_eq!(params.interval_ms, 5000);
    assert_eq!(params.meg_level, 2);
}

#[test]
fn unknown_session_kind_is_rejected() {
    assert!(matches!(
        SessionKind::from_raw(7),
        Err(Error::InvalidSessionKind(7))
    ));
}
