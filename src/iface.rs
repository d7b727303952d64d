//! Network interface helpers: MAC resolution, VLAN sub-interface
//! detection, and VLAN-tag recovery from socket ancillary data, §4.2.
//!
//! The route-netlink sweep and ancillary-message parse are implemented
//! directly over `libc` rather than a netlink crate — this surface is a
//! small, fixed wire format and the rest of the worker code already
//! depends on `libc` for `AF_PACKET`/`timerfd`/`setns`.

use std::ffi::CString;
use std::io;
use std::mem;

use crate::error::{Error, Result};
use crate::frame::MacAddress;

// `struct ifreq` on Linux is IFNAMSIZ (16) bytes of interface name
// followed by a union whose largest member keeps the struct's total
// size at 40 bytes; `SIOCGIFHWADDR` fills a `sockaddr` at that offset
// (2-byte family, then up to 14 bytes of address data, MAC in the
// first 6). Built as a raw buffer rather than binding the union as a
// Rust type, since its exact member layout isn't part of libc's
// portable surface.
const IFREQ_LEN: usize = 40;
const IFNAMSIZ: usize = 16;

/// Resolves the MAC address bound to `if_name` via `SIOCGIFHWADDR`.
pub fn resolve_iface_mac(if_name: &str) -> Result<MacAddress> {
    let name = CString::new(if_name).map_err(|_| Error::InvalidInterface(if_name.to_string()))?;
    let name_bytes = name.as_bytes_with_nul();
    if name_bytes.len() > IFNAMSIZ {
        return Err(Error::InvalidInterface(if_name.to_string()));
    }

    // SAFETY: a short-lived datagram socket used only for the ioctl below.
    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
    if fd < 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }

    let mut req = [0u8; IFREQ_LEN];
    req[..name_bytes.len()].copy_from_slice(name_bytes);

    // SAFETY: `req` is a 40-byte buffer matching `sizeof(struct ifreq)`
    // with the interface name written at offset 0; fd is a just-opened,
    // still-owned socket descriptor.
    let rc = unsafe {
        libc::ioctl(fd, libc::SIOCGIFHWADDR, req.as_mut_ptr() as *mut libc::c_void)
    };
    // SAFETY: fd was returned by socket(2) above and is not used afterward.
    unsafe { libc::close(fd) };

    if rc < 0 {
        return Err(Error::InvalidInterface(if_name.to_string()));
    }

    // sockaddr starts at offset IFNAMSIZ: 2-byte family, then sa_data.
    let mac_offset = IFNAMSIZ + 2;
    let bytes: [u8; 6] = req[mac_offset..mac_offset + 6].try_into().unwrap();
    Ok(MacAddress::new(bytes))
}

/// Resolves `if_name` to its kernel interface index via
/// `if_nametoindex`.
pub fn if_nametoindex(if_name: &str) -> Result<u32> {
    let name = CString::new(if_name).map_err(|_| Error::InvalidInterface(if_name.to_string()))?;
    // SAFETY: `name` is a valid NUL-terminated C string for the duration
    // of this call.
    let idx = unsafe { libc::if_nametoindex(name.as_ptr()) };
    if idx == 0 {
        return Err(Error::InvalidInterface(if_name.to_string()));
    }
    Ok(idx)
}

/// Three-state result of a VLAN sub-interface check: the netlink sweep
/// itself can fail independently of whether the interface is a VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanCheck {
    Yes,
    No,
}

const NLMSG_HDRLEN: usize = mem::size_of::<libc::nlmsghdr>();
const RTA_HDRLEN: usize = mem::size_of::<libc::rtattr>();

/// Detects whether `if_name` is itself a VLAN sub-interface by sweeping
/// `RTM_GETLINK` over a `NETLINK_ROUTE` socket: for the link whose index
/// matches `if_nametoindex(if_name)`, inspects `IFLA_LINKINFO` →
/// `IFLA_INFO_KIND` and reports [`VlanCheck::Yes`] iff that string is
/// `"vlan"`.
pub fn is_vlan_sub_interface(if_name: &str) -> Result<VlanCheck> {
    let target_index = if_nametoindex(if_name)?;

    // SAFETY: ordinary socket(2) call with a fixed, valid protocol family.
    let fd = unsafe {
        libc::socket(
            libc::AF_NETLINK,
            libc::SOCK_RAW | libc::SOCK_CLOEXEC,
            libc::NETLINK_ROUTE,
        )
    };
    if fd < 0 {
        return Err(Error::Netlink(io::Error::last_os_error().to_string()));
    }
    let result = sweep_links(fd, target_index);
    // SAFETY: fd was returned by socket(2) above and is not used afterward.
    unsafe { libc::close(fd) };
    result
}

fn sweep_links(fd: libc::c_int, target_index: u32) -> Result<VlanCheck> {
    #[repr(C)]
    struct GetLinkRequest {
        nlh: libc::nlmsghdr,
        ifi: libc::ifinfomsg,
    }

    let seq = 1u32;
    let mut req: GetLinkRequest = unsafe { mem::zeroed() };
    req.nlh.nlmsg_len = mem::size_of::<GetLinkRequest>() as u32;
    req.nlh.nlmsg_type = libc::RTM_GETLINK;
    req.nlh.nlmsg_flags = (libc::NLM_F_REQUEST | libc::NLM_F_DUMP) as u16;
    req.nlh.nlmsg_seq = seq;
    req.ifi.ifi_family = libc::AF_UNSPEC as u8;

    let req_bytes = unsafe {
        std::slice::from_raw_parts(
            &req as *const GetLinkRequest as *const u8,
            mem::size_of::<GetLinkRequest>(),
        )
    };
    // SAFETY: fd is a connected NETLINK_ROUTE socket; req_bytes is a
    // valid, fully-initialized byte view of `req`.
    let sent = unsafe {
        libc::send(fd, req_bytes.as_ptr() as *const libc::c_void, req_bytes.len(), 0)
    };
    if sent < 0 {
        return Err(Error::Netlink(io::Error::last_os_error().to_string()));
    }

    let mut buf = [0u8; 16384];
    loop {
        // SAFETY: buf is a valid, appropriately-sized receive buffer.
        let n = unsafe {
            libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
        };
        if n < 0 {
            return Err(Error::Netlink(io::Error::last_os_error().to_string()));
        }
        let n = n as usize;
        let mut offset = 0usize;
        let mut done = false;

        while offset + NLMSG_HDRLEN <= n {
            let nlh = unsafe { &*(buf.as_ptr().add(offset) as *const libc::nlmsghdr) };
            let msg_len = nlh.nlmsg_len as usize;
            if msg_len < NLMSG_HDRLEN || offset + msg_len > n {
                break;
            }

            match nlh.nlmsg_type as i32 {
                libc::NLMSG_DONE => {
                    done = true;
                    break;
                }
                libc::NLMSG_ERROR => {
                    return Err(Error::Netlink("netlink returned NLMSG_ERROR".into()));
                }
                t if t == libc::RTM_NEWLINK => {
                    if let Some(check) = inspect_link(&buf, offset, msg_len, target_index) {
                        return Ok(check);
                    }
                }
                _ => {}
            }

            offset += align4(msg_len);
        }

        if done {
            break;
        }
    }

    Ok(VlanCheck::No)
}

fn inspect_link(buf: &[u8; 16384], offset: usize, msg_len: usize, target_index: u32) -> Option<VlanCheck> {
    let ifi = unsafe { &*(buf.as_ptr().add(offset + NLMSG_HDRLEN) as *const libc::ifinfomsg) };
    if ifi.ifi_index as u32 != target_index {
        return None;
    }
    if ifi.ifi_type as u16 != libc::ARPHRD_ETHER {
        return Some(VlanCheck::No);
    }

    let attrs_start = offset + NLMSG_HDRLEN + mem::size_of::<libc::ifinfomsg>();
    let attrs_end = offset + msg_len;
    let mut pos = attrs_start;

    while pos + RTA_HDRLEN <= attrs_end {
        let rta = unsafe { &*(buf.as_ptr().add(pos) as *const libc::rtattr) };
        let rta_len = rta.rta_len as usize;
        if rta_len < RTA_HDRLEN || pos + rta_len > attrs_end {
            break;
        }
        const IFLA_LINKINFO: u16 = 18;
        if rta.rta_type == IFLA_LINKINFO {
            let nested_start = pos + RTA_HDRLEN;
            let nested_end = pos + rta_len;
            if let Some(kind) = find_info_kind(&buf[..], nested_start, nested_end) {
                return Some(if kind == "vlan" { VlanCheck::Yes } else { VlanCheck::No });
            }
        }
        pos += align4(rta_len);
    }

    Some(VlanCheck::No)
}

fn find_info_kind(buf: &[u8], start: usize, end: usize) -> Option<String> {
    const IFLA_INFO_KIND: u16 = 1;
    let mut pos = start;
    while pos + RTA_HDRLEN <= end {
        let rta = unsafe { &*(buf.as_ptr().add(pos) as *const libc::rtattr) };
        let rta_len = rta.rta_len as usize;
        if rta_len < RTA_HDRLEN || pos + rta_len > end {
            break;
        }
        if rta.rta_type == IFLA_INFO_KIND {
            let data_start = pos + RTA_HDRLEN;
            let data_end = pos + rta_len;
            let raw = &buf[data_start..data_end];
            let nul = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            return Some(String::from_utf8_lossy(&raw[..nul]).into_owned());
        }
        pos += align4(rta_len);
    }
    None
}

fn align4(len: usize) -> usize {
    (len + 3) & !3
}

/// Mirrors `struct packet_auxdata` (`linux/if_packet.h`): the ancillary
/// record the kernel attaches to an `AF_PACKET` receive when
/// `PACKET_AUXDATA` is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketAuxdata {
    pub tp_status: u32,
    pub tp_len: u32,
    pub tp_snaplen: u32,
    pub tp_mac: u16,
    pub tp_net: u16,
    pub tp_vlan_tci: u16,
    pub tp_vlan_tpid: u16,
}

const TP_STATUS_VLAN_VALID: u32 = 1 << 4;

/// Inspects raw `cmsg` bytes from a `recvmsg` call for a
/// `packet_auxdata`-shaped record (`SOL_PACKET`/`PACKET_AUXDATA`).
/// Returns `true` and fills `out_aux` when the VLAN bit is set or the
/// tag is non-zero.
pub fn frame_is_tagged(cmsg_data: &[u8], out_aux: &mut PacketAuxdata) -> bool {
    if cmsg_data.len() < mem::size_of::<PacketAuxdata>() {
        return false;
    }
    let aux = PacketAuxdata {
        tp_status: u32::from_ne_bytes(cmsg_data[0..4].try_into().unwrap()),
        tp_len: u32::from_ne_bytes(cmsg_data[4..8].try_into().unwrap()),
        tp_snaplen: u32::from_ne_bytes(cmsg_data[8..12].try_into().unwrap()),
        tp_mac: u16::from_ne_bytes(cmsg_data[12..14].try_into().unwrap()),
        tp_net: u16::from_ne_bytes(cmsg_data[14..16].try_into().unwrap()),
        tp_vlan_tci: u16::from_ne_bytes(cmsg_data[16..18].try_into().unwrap()),
        tp_vlan_tpid: u16::from_ne_bytes(cmsg_data[18..20].try_into().unwrap()),
    };

    let vlan_present = aux.tp_status & TP_STATUS_VLAN_VALID != 0 || aux.tp_vlan_tci != 0;
    if vlan_present {
        *out_aux = aux;
    }
    vlan_present
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_tagged_requires_minimum_length() {
        let mut aux = PacketAuxdata::default();
        assert!(!frame_is_tagged(&[0u8; 4], &mut aux));
    }

    #[test]
    fn frame_is_tagged_detects_vlan_bit() {
        let mut raw = [0u8; 20];
        raw[0..4].copy_from_slice(&TP_STATUS_VLAN_VALID.to_ne_bytes());
        let mut aux = PacketAuxdata::default();
        assert!(frame_is_tagged(&raw, &mut aux));
        assert_eq!(aux.tp_status & TP_STATUS_VLAN_VALID, TP_STATUS_VLAN_VALID);
    }

    #[test]
    fn frame_is_tagged_false_for_untagged_frame() {
        let raw = [0u8; 20];
        let mut aux = PacketAuxdata::default();
        assert!(!frame_is_tagged(&raw, &mut aux));
    }

    #[test]
    #[ignore = "requires a live network interface; run manually as `cargo test -- --ignored`"]
    fn resolve_iface_mac_on_loopback() {
        let mac = resolve_iface_mac("lo").unwrap();
        assert_eq!(mac, MacAddress::zero());
    }

    #[test]
    #[ignore = "requires CAP_NET_RAW and a live interface pair; run manually"]
    fn is_vlan_sub_interface_on_loopback() {
        assert_eq!(is_vlan_sub_interface("lo").unwrap(), VlanCheck::No);
    }
}
