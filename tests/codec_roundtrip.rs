use ethlb::frame::{
    build_common_header, build_eth_frame, build_lb_pdu, build_vlan_frame, parse_lb_pdu, MacAddress,
    Opcode, ETHERTYPE_OAM,
};

#[test]
fn lbm_probe_round_trips_through_eth_framing() {
    let header = build_common_header(3, 0, Opcode::Lbm, 0, 4);
    let pdu = build_lb_pdu(header, 42, 0);

    let dst = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    let src = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let frame = build_eth_frame(dst, src, ETHERTYPE_OAM, &pdu);

    assert_eq!(&frame[0..6], dst.as_bytes());
    assert_eq!(&frame[6..12], src.as_bytes());
    assert_eq!(&frame[12..14], &ETHERTYPE_OAM.to_be_bytes());

    let decoded = parse_lb_pdu(&frame[14..]).unwrap();
    assert_eq!(decoded.header.meg_level, 3);
    assert_eq!(decoded.header.opcode, Opcode::Lbm.to_byte());
    assert_eq!(decoded.transaction_id, 42);
}

#[test]
fn vlan_tagged_lbm_carries_the_right_inner_ethertype() {
    let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
    let pdu = build_lb_pdu(header, 7, 0);

    let dst = MacAddress::broadcast();
    let src = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    let frame = build_vlan_frame(dst, src, 0x8100, 5, 0, 200, ETHERTYPE_OAM, &pdu);

    assert_eq!(&frame[12..14], &0x8100u16.to_be_bytes());
    assert_eq!(&frame[16..18], &ETHERTYPE_OAM.to_be_bytes());

    let decoded = parse_lb_pdu(&frame[18..]).unwrap();
    assert_eq!(decoded.transaction_id, 7);
}

#[test]
fn an_lbm_rewritten_to_lbr_keeps_its_transaction_id() {
    let header = build_common_header(1, 0, Opcode::Lbm, 0, 4);
    let pdu = build_lb_pdu(header, 99, 0);
    let decoded = parse_lb_pdu(&pdu).unwrap();

    let lbr_header = ethlb::frame::CommonHeader {
        opcode: Opcode::Lbr.to_byte(),
        ..decoded.header
    };
    let reply = build_lb_pdu(lbr_header, decoded.transaction_id, decoded.end_tlv);
    let reply_decoded = parse_lb_pdu(&reply).unwrap();

    assert_eq!(reply_decoded.header.opcode, Opcode::Lbr.to_byte());
    assert_eq!(reply_decoded.transaction_id, 99);
}
