//! Loopback Message / Loopback Reply PDU codec, §4.1/§6.
//!
//! Layout after the 4-byte common header:
//! `transaction_id (u32 BE) [sender-id TLV] end_tlv (u8)`.

use crate::frame::header::{CommonHeader, COMMON_HEADER_LEN};

/// TLV type for the Sender ID TLV (IEEE 802.1ag).
pub const OAM_TLV_SENDER_ID: u8 = 1;

/// TLV type marking the end of the TLV list.
pub const OAM_TLV_END: u8 = 0;

#[cfg(feature = "sender-id-tlv")]
const SENDER_ID_TLV_LEN: usize = 4; // type(1) + length(2) + chassis_id_len(1)
#[cfg(not(feature = "sender-id-tlv"))]
const SENDER_ID_TLV_LEN: usize = 0;

pub const LB_PDU_LEN: usize = COMMON_HEADER_LEN + 4 + SENDER_ID_TLV_LEN + 1;

/// A decoded LB PDU (LBM or LBR — the two share a wire format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LbPdu {
    pub header: CommonHeader,
    pub transaction_id: u32,
    pub end_tlv: u8,
}

/// Serializes an LB PDU: `header` must already carry the correct opcode.
/// When the `sender-id-tlv` feature is enabled, emits a Sender ID TLV
/// (type 1, length 1, chassis-id-len 0) between the transaction id and
/// the end TLV, matching the wire layout the `sender-id-tlv` feature is
/// named for.
pub fn build_lb_pdu(header: CommonHeader, transaction_id: u32, end_tlv: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LB_PDU_LEN);
    buf.extend_from_slice(&header.to_bytes());
    buf.extend_from_slice(&transaction_id.to_be_bytes());

    #[cfg(feature = "sender-id-tlv")]
    {
        buf.push(OAM_TLV_SENDER_ID);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.push(0); // chassis_id_len
    }

    buf.push(end_tlv);
    buf
}

/// Parses an LB PDU from `bytes`. Returns `None` if the buffer is too
/// short for the header plus the fixed fields this feature set expects.
pub fn parse_lb_pdu(bytes: &[u8]) -> Option<LbPdu> {
    let header = CommonHeader::from_bytes(bytes)?;
    let mut offset = COMMON_HEADER_LEN;

    if bytes.len() < offset + 4 {
        return None;
    }
    let transaction_id = u32::from_be_bytes(bytes[offset..offset + 4].try_into().ok()?);
    offset += 4;

    #[cfg(feature = "sender-id-tlv")]
    {
        if bytes.len() < offset + SENDER_ID_TLV_LEN {
            return None;
        }
        offset += SENDER_ID_TLV_LEN;
    }

    let end_tlv = *bytes.get(offset)?;

    Some(LbPdu {
        header,
        transaction_id,
        end_tlv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::header::{build_common_header, Opcode};

    #[test]
    fn round_trips_through_build_and_parse() {
        let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
        let bytes = build_lb_pdu(header, 0x1234_5678, OAM_TLV_END);
        assert_eq!(bytes.len(), LB_PDU_LEN);

        let pdu = parse_lb_pdu(&bytes).unwrap();
        assert_eq!(pdu.header, header);
        assert_eq!(pdu.transaction_id, 0x1234_5678);
        assert_eq!(pdu.end_tlv, OAM_TLV_END);
    }

    #[test]
    fn transaction_id_is_big_endian_on_wire() {
        let header = build_common_header(0, 0, Opcode::Lbm, 0, 4);
        let bytes = build_lb_pdu(header, 0x0102_0304, OAM_TLV_END);
        assert_eq!(&bytes[COMMON_HEADER_LEN..COMMON_HEADER_LEN + 4], &[1, 2, 3, 4]);
    }

    #[test]
    fn rejects_truncated_buffer() {
        let header = build_common_header(0, 0, Opcode::Lbr, 0, 4);
        let bytes = build_lb_pdu(header, 1, OAM_TLV_END);
        assert!(parse_lb_pdu(&bytes[..bytes.len() - 1]).is_none());
    }
}
