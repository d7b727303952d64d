//! Pure wire codec for ETH-LB frames: never touches a socket, never
//! allocates unbounded memory.

pub mod eth;
pub mod header;
pub mod mac;
pub mod pdu;

pub use eth::{build_eth_frame, build_vlan_frame, ETHERTYPE_VLAN};
pub use header::{build_common_header, CommonHeader, Opcode, ETHERTYPE_OAM};
pub use mac::MacAddress;
pub use pdu::{build_lb_pdu, parse_lb_pdu, LbPdu, OAM_TLV_END, OAM_TLV_SENDER_ID};
