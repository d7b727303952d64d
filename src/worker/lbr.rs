//! LBR worker: answers peer LBM probes, §4.5.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::config::LBSessionParams;
use crate::frame::eth::build_eth_frame;
use crate::frame::header::{CommonHeader, Opcode, ETHERTYPE_OAM};
use crate::frame::mac::MacAddress;
use crate::frame::pdu::{build_lb_pdu, parse_lb_pdu};
use crate::iface::{frame_is_tagged, is_vlan_sub_interface, resolve_iface_mac, PacketAuxdata, VlanCheck};
use crate::log::{LogConfig, SessionLog};
use crate::session;
use crate::worker::socket::{RxSocket, TxSocket};
use crate::worker::{check_cap_net_raw, enter_netns};

const SETUP_FAILED: i32 = -1;
const POLL_TIMEOUT_MS: i32 = 200;

pub fn run<T>(params: LBSessionParams<T>, cancel: Arc<AtomicBool>, tx: mpsc::Sender<Result<(), i32>>)
where
    T: Send + 'static,
{
    let log = match SessionLog::new(&LogConfig {
        log_file: params.log_file.clone(),
        console: params.console_log,
        utc: params.utc_log,
    }) {
        Ok(log) => log,
        Err(_) => {
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

    for warning in &params.config_warnings {
        log.warn(format_args!("{warning}"));
    }

    if let Err(e) = check_cap_net_raw() {
        log.error(format_args!("CAP_NET_RAW check failed: {e}"));
        session::signal_failed(&tx, SETUP_FAILED);
        return;
    }

    if let Some(ns) = &params.net_ns {
        if let Err(e) = enter_netns(ns) {
            log.error(format_args!("failed to enter netns {ns}: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    }

    let src_mac = match resolve_iface_mac(&params.if_name) {
        Ok(mac) => mac,
        Err(e) => {
            log.error(format_args!("failed to resolve MAC of {}: {e}", params.if_name));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

    // Detected for parity with the LBM worker's setup sequence; this
    // session drops any tagged frame outright (§4.5), so the result
    // only matters for the debug line below.
    match is_vlan_sub_interface(&params.if_name) {
        Ok(check) => log.debug(format_args!("{} is_vlan_sub_interface: {check:?}", params.if_name)),
        Err(e) => {
            log.error(format_args!("VLAN sub-interface check failed: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    }

    let rx_socket = match RxSocket::open(&params.if_name) {
        Ok(s) => s,
        Err(e) => {
            log.error(format_args!("failed to open rx socket: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

    let tx_socket = match TxSocket::open(&params.if_name, ETHERTYPE_OAM) {
        Ok(s) => s,
        Err(e) => {
            log.error(format_args!("failed to open tx socket: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

    session::signal_configured(&tx);

    let mut frame_buf = [0u8; 1536];
    let mut pollfd = libc::pollfd {
        fd: rx_socket.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    while !cancel.load(Ordering::SeqCst) {
        // SAFETY: `pollfd` is a single valid entry pointing at the rx
        // socket this worker owns for its lifetime.
        let rc = unsafe { libc::poll(&mut pollfd, 1, POLL_TIMEOUT_MS) };
        if rc < 0 {
            log.error(format_args!("poll failed: {}", std::io::Error::last_os_error()));
            continue;
        }
        if pollfd.revents & libc::POLLIN == 0 {
            continue;
        }
        pollfd.revents = 0;

        handle_one_frame(&params, &log, &rx_socket, &tx_socket, src_mac, &mut frame_buf);
    }
}

fn handle_one_frame<T>(
    params: &LBSessionParams<T>,
    log: &SessionLog,
    rx_socket: &RxSocket,
    tx_socket: &TxSocket,
    src_mac: MacAddress,
    frame_buf: &mut [u8],
) {
    let (n, cmsg) = match rx_socket.recv(frame_buf) {
        Ok(v) => v,
        Err(e) => {
            log.error(format_args!("rx poll error: {e}"));
            return;
        }
    };
    let frame = &frame_buf[..n];
    if frame.len() < 14 {
        return;
    }

    let mut aux = PacketAuxdata::default();
    if frame_is_tagged(&cmsg, &mut aux) {
        return;
    }

    let Some(pdu) = parse_lb_pdu(&frame[14..]) else {
        return;
    };
    if pdu.header.opcode != Opcode::Lbm.to_byte() {
        return;
    }

    let peer_src: [u8; 6] = match frame[6..12].try_into() {
        Ok(bytes) => bytes,
        Err(_) => return,
    };
    let peer_src = MacAddress::new(peer_src);
    let peer_dst = MacAddress::new(frame[0..6].try_into().unwrap());

    let multicast_or_broadcast = peer_dst.is_broadcast() || peer_dst.is_multicast();
    if peer_dst != src_mac && !multicast_or_broadcast {
        return;
    }

    if pdu.header.meg_level != params.meg_level {
        log.debug(format_args!("Ignoring LBM with different MEG level"));
        return;
    }

    let lbr_header = CommonHeader {
        opcode: Opcode::Lbr.to_byte(),
        ..pdu.header
    };
    let reply_pdu = build_lb_pdu(lbr_header, pdu.transaction_id, pdu.end_tlv);
    let reply_frame = build_eth_frame(peer_src, src_mac, ETHERTYPE_OAM, &reply_pdu);

    if multicast_or_broadcast {
        std::thread::sleep(Duration::from_secs_f64(rand::random::<f64>()));
    }

    match tx_socket.send(&reply_frame) {
        Ok(n) if n == reply_frame.len() => {}
        Ok(n) => log.error(format_args!(
            "short write sending LBR: {n} of {} bytes",
            reply_frame.len()
        )),
        Err(e) => log.error(format_args!("failed to send LBR: {e}")),
    }
}
