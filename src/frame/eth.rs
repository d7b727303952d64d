//! DIX Ethernet and 802.1Q VLAN frame assembly, §4.1/§6.

use crate::frame::mac::MacAddress;

/// 802.1Q VLAN-tagged frame ethertype.
pub const ETHERTYPE_VLAN: u16 = 0x8100;

/// Size of a DIX Ethernet header: dst MAC + src MAC + ethertype.
pub const ETH_HEADER_LEN: usize = 14;

/// Size of an 802.1Q VLAN header: dst MAC + src MAC + TPI + TCI + inner type.
pub const VLAN_HEADER_LEN: usize = 18;

/// Emits a 14-byte DIX header followed by `payload`.
pub fn build_eth_frame(dst: MacAddress, src: MacAddress, ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(ETH_HEADER_LEN + payload.len());
    frame.extend_from_slice(dst.as_bytes());
    frame.extend_from_slice(src.as_bytes());
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Emits dst+src MACs, a 2-byte TPI, a packed PCP/DEI/VLAN-id TCI, the
/// inner ethertype, and `payload` — all multi-byte fields big-endian.
pub fn build_vlan_frame(
    dst: MacAddress,
    src: MacAddress,
    tpi: u16,
    pcp: u8,
    dei: u8,
    vlan_id: u16,
    inner_type: u16,
    payload: &[u8],
) -> Vec<u8> {
    let tci = ((pcp as u16) << 13) | ((dei as u16) << 12) | (vlan_id & 0x0FFF);

    let mut frame = Vec::with_capacity(VLAN_HEADER_LEN + payload.len());
    frame.extend_from_slice(dst.as_bytes());
    frame.extend_from_slice(src.as_bytes());
    frame.extend_from_slice(&tpi.to_be_bytes());
    frame.extend_from_slice(&tci.to_be_bytes());
    frame.extend_from_slice(&inner_type.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_frame_has_14_byte_header() {
        let dst = MacAddress::broadcast();
        let src = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let frame = build_eth_frame(dst, src, 0x8902, &[1, 2, 3]);
        assert_eq!(frame.len(), ETH_HEADER_LEN + 3);
        assert_eq!(&frame[0..6], dst.as_bytes());
        assert_eq!(&frame[6..12], src.as_bytes());
        assert_eq!(&frame[12..14], &[0x89, 0x02]);
        assert_eq!(&frame[14..], &[1, 2, 3]);
    }

    #[test]
    fn vlan_tci_packs_pcp_dei_and_vid() {
        let dst = MacAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let src = MacAddress::new([0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]);
        let frame = build_vlan_frame(dst, src, ETHERTYPE_VLAN, 5, 0, 100, 0x8902, &[]);
        assert_eq!(&frame[12..14], &ETHERTYPE_VLAN.to_be_bytes());
        let tci = u16::from_be_bytes([frame[14], frame[15]]);
        assert_eq!(tci >> 13, 5);
        assert_eq!((tci >> 12) & 0x1, 0);
        assert_eq!(tci & 0x0FFF, 100);
        assert_eq!(&frame[16..18], &[0x89, 0x02]);
    }

    #[test]
    fn vlan_id_is_masked_to_12_bits() {
        let dst = MacAddress::zero();
        let src = MacAddress::zero();
        let frame = build_vlan_frame(dst, src, ETHERTYPE_VLAN, 0, 1, 0xFFFF, 0, &[]);
        let tci = u16::from_be_bytes([frame[14], frame[15]]);
        assert_eq!(tci & 0x0FFF, 0x0FFF);
    }
}
