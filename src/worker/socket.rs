//! Raw `AF_PACKET` rx/tx socket setup, §4.4 steps 9-10/§4.5.

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use crate::error::{Error, Result};
use crate::frame::header::ETHERTYPE_OAM;
use crate::frame::eth::ETHERTYPE_VLAN;
use crate::iface::if_nametoindex;

/// A bound `AF_PACKET` receive socket with `PACKET_AUXDATA` enabled and
/// a BPF filter accepting only OAM (0x8902) or VLAN (0x8100) ethertype
/// frames, so userspace never sees traffic this session doesn't care
/// about. The original library's filter mistakenly matched 0x8809
/// (Slow Protocols) instead of 0x8902; this filter uses the real OAM
/// ethertype.
pub struct RxSocket {
    fd: OwnedFd,
}

impl RxSocket {
    pub fn open(if_name: &str) -> Result<Self> {
        let if_index = if_nametoindex(if_name)?;

        // SAFETY: fixed, valid socket(2) arguments for a raw packet
        // socket bound to ETH_P_ALL.
        let raw = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_ALL as u16).to_be() as i32,
            )
        };
        if raw < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a just-created, valid, owned descriptor.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let enable: libc::c_int = 1;
        // SAFETY: `enable` is a valid, correctly-sized option value;
        // fd is owned and open.
        let rc = unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_PACKET,
                libc::PACKET_AUXDATA,
                &enable as *const libc::c_int as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        let mut sll: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_ifindex = if_index as i32;
        sll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();

        // SAFETY: `sll` is a correctly-sized, fully-initialized
        // sockaddr_ll; fd is owned and open.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        attach_oam_filter(fd.as_raw_fd())?;

        Ok(Self { fd })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Receives one frame plus its `SOL_PACKET`/`PACKET_AUXDATA`
    /// ancillary message, if the kernel attached one. Returns the frame
    /// bytes and just the `packet_auxdata` payload (the `cmsghdr`
    /// wrapper is stripped), ready for [`crate::iface::frame_is_tagged`].
    pub fn recv(&self, frame_buf: &mut [u8]) -> io::Result<(usize, Vec<u8>)> {
        let mut iov = libc::iovec {
            iov_base: frame_buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: frame_buf.len(),
        };
        let mut cmsg_buf = [0u8; 256];
        let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = cmsg_buf.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = cmsg_buf.len();

        // SAFETY: `msg` points at valid, correctly-sized iovec and
        // control buffers that outlive the call.
        let n = unsafe { libc::recvmsg(self.fd.as_raw_fd(), &mut msg, 0) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        let aux = extract_packet_auxdata(&mut msg);
        Ok((n as usize, aux))
    }
}

/// Walks the `cmsghdr` chain of a received `msghdr` for a
/// `SOL_PACKET`/`PACKET_AUXDATA` record and returns just its payload
/// bytes, stripping the `cmsghdr` header the kernel prepends. Empty if
/// no such record is present.
fn extract_packet_auxdata(msg: &mut libc::msghdr) -> Vec<u8> {
    // SAFETY: `msg` was just filled in by a successful `recvmsg` call
    // and its control buffer is still valid and in scope.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            let hdr = &*cmsg;
            if hdr.cmsg_level == libc::SOL_PACKET && hdr.cmsg_type == libc::PACKET_AUXDATA {
                let data = libc::CMSG_DATA(cmsg);
                let data_len = hdr.cmsg_len - libc::CMSG_LEN(0) as usize;
                return std::slice::from_raw_parts(data, data_len).to_vec();
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }
    Vec::new()
}

fn attach_oam_filter(fd: RawFd) -> Result<()> {
    let mut code = [
        libc::sock_filter { code: 0x28, jt: 0, jf: 0, k: 12 }, // ldh [12]
        libc::sock_filter { code: 0x15, jt: 0, jf: 1, k: ETHERTYPE_OAM as u32 },
        libc::sock_filter { code: 0x15, jt: 0, jf: 1, k: ETHERTYPE_VLAN as u32 },
        libc::sock_filter { code: 0x6, jt: 0, jf: 0, k: 0x0000ffff }, // accept
        libc::sock_filter { code: 0x6, jt: 0, jf: 0, k: 0x00000000 }, // reject
    ];
    let prog = libc::sock_fprog {
        len: code.len() as u16,
        filter: code.as_mut_ptr(),
    };

    // SAFETY: `prog` references `code`, which outlives this call;
    // fd is owned and open.
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ATTACH_FILTER,
            &prog as *const libc::sock_fprog as *const libc::c_void,
            std::mem::size_of::<libc::sock_fprog>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
}

/// A bound `AF_PACKET` transmit socket for one ethertype.
pub struct TxSocket {
    fd: OwnedFd,
    if_index: i32,
}

impl TxSocket {
    pub fn open(if_name: &str, ethertype: u16) -> Result<Self> {
        let if_index = if_nametoindex(if_name)? as i32;

        // SAFETY: fixed, valid socket(2) arguments.
        let raw = unsafe {
            libc::socket(libc::AF_PACKET, libc::SOCK_RAW, ethertype.to_be() as i32)
        };
        if raw < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a just-created, valid, owned descriptor.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut sll: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_ifindex = if_index;
        sll.sll_protocol = ethertype.to_be();

        // SAFETY: `sll` is a correctly-sized, fully-initialized
        // sockaddr_ll; fd is owned and open.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(Self { fd, if_index })
    }

    /// Sends `frame` as-is. A short write is logged by the caller and
    /// treated as a transient error, never as a reason to tear the
    /// session down (§4.4 step e, §7).
    pub fn send(&self, frame: &[u8]) -> io::Result<usize> {
        let mut sll: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_ifindex = self.if_index;

        // SAFETY: `frame` is a valid byte slice for its stated length;
        // `sll` is a correctly-sized, fully-initialized sockaddr_ll.
        let n = unsafe {
            libc::sendto(
                self.fd.as_raw_fd(),
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}
