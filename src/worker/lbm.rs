//! LBM worker: drives one outstanding LB probe at a time (or a free
//! run of probes for multicast), observes replies, and signals
//! reachability transitions, §4.4.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use crate::callback::{LbStatus, StatusCode};
use crate::config::{Destination, LBSessionParams};
use crate::frame::header::{build_common_header, CommonHeader, Opcode, ETHERTYPE_OAM};
use crate::frame::eth::{build_eth_frame, build_vlan_frame, ETHERTYPE_VLAN};
use crate::frame::mac::MacAddress;
use crate::frame::pdu::{build_lb_pdu, parse_lb_pdu, OAM_TLV_END};
use crate::iface::{frame_is_tagged, is_vlan_sub_interface, resolve_iface_mac, PacketAuxdata, VlanCheck};
use crate::log::{LogConfig, SessionLog};
use crate::session;
use crate::worker::socket::{RxSocket, TxSocket};
use crate::worker::timer::TimerFd;
use crate::worker::{check_cap_net_raw, enter_netns, seed_transaction_id};

const SETUP_FAILED: i32 = -1;

/// Reachability state machine of §4.4: starts `Probing`, moves to
/// `Missing` on an unanswered tick, and back on a matched reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReachState {
    Probing,
    Missing,
}

struct LoopState {
    txn_id: u32,
    header: CommonHeader,
    missed: u32,
    replied: u32,
    multicast_replied: u32,
    recovered: bool,
    state: ReachState,
    frame_sent: bool,
    had_reply_last_round: bool,
    time_sent: Instant,
}

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

    let dst_mac = match &params.dst_mac {
        Destination::Multicast => MacAddress::broadcast(),
        Destination::Unicast(mac) => *mac,
    };

    let txn_id = seed_transaction_id();
    let header = build_common_header(params.meg_level, 0, Opcode::Lbm, 0, 4);

    let custom_vlan = match is_vlan_sub_interface(&params.if_name) {
        Ok(VlanCheck::No) => params.vlan_id != 0 || params.pcp != 0,
        Ok(VlanCheck::Yes) => false,
        Err(e) => {
            log.error(format_args!("VLAN sub-interface check failed: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

    let timer = match TimerFd::new() {
        Ok(t) => t,
        Err(e) => {
            log.error(format_args!("failed to create timer: {e}"));
            session::signal_failed(&tx, SETUP_FAILED);
            return;
        }
    };

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

    if let Err(e) = timer.set_interval_ms(params.interval_ms) {
        log.error(format_args!("failed to arm timer: {e}"));
        session::signal_failed(&tx, SETUP_FAILED);
        return;
    }

    session::signal_configured(&tx);

    let mut loop_state = LoopState {
        txn_id,
        header,
        missed: 0,
        replied: 0,
        multicast_replied: 0,
        recovered: false,
        state: ReachState::Probing,
        frame_sent: false,
        had_reply_last_round: true,
        time_sent: Instant::now(),
    };

    let mut frame_buf = [0u8; 1536];
    let mut pollfds = [
        libc::pollfd { fd: rx_socket.as_raw_fd(), events: libc::POLLIN, revents: 0 },
        libc::pollfd { fd: timer.as_raw_fd(), events: libc::POLLIN, revents: 0 },
    ];

    while !cancel.load(Ordering::SeqCst) {
        // SAFETY: `pollfds` is a valid, correctly-sized array of the
        // two fds this worker owns for its lifetime.
        let rc = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, 200) };
        if rc < 0 {
            log.error(format_args!("poll failed: {}", std::io::Error::last_os_error()));
            continue;
        }

        let timer_ready = pollfds[1].revents & libc::POLLIN != 0;
        let rx_ready = pollfds[0].revents & libc::POLLIN != 0;
        pollfds[0].revents = 0;
        pollfds[1].revents = 0;

        if timer_ready {
            let _ = timer.acknowledge();
            if send_if_due(
                &params,
                &log,
                &tx_socket,
                src_mac,
                dst_mac,
                custom_vlan,
                &mut loop_state,
            ) == SendOutcome::OneshotDone
            {
                break;
            }
        }

        if rx_ready {
            drain_replies(
                &params,
                &log,
                &rx_socket,
                src_mac,
                custom_vlan,
                &mut frame_buf,
                &mut loop_state,
            );
        }
    }

    let _ = timer.disarm();
}

/// Outcome of a single `send_if_due` tick, used by the caller's poll
/// loop to decide whether the worker should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendOutcome {
    Continue,
    /// A one-shot session's missed-threshold fired; the worker must
    /// exit, mirroring the original's `pthread_exit` from this point.
    OneshotDone,
}

#[allow(clippy::too_many_arguments)]
fn send_if_due<T>(
    params: &LBSessionParams<T>,
    log: &SessionLog,
    tx_socket: &TxSocket,
    src_mac: MacAddress,
    dst_mac: MacAddress,
    custom_vlan: bool,
    st: &mut LoopState,
) -> SendOutcome {
    if !st.had_reply_last_round {
        if params.is_multicast {
            log.info(format_args!("no replies received for transaction {}", st.txn_id));
            st.multicast_replied = 0;
        } else {
            log.info(format_args!("timeout waiting for LBR, transaction {}", st.txn_id));
            st.missed += 1;
            st.replied = 0;
            st.recovered = false;
            if st.state == ReachState::Probing {
                log.info(format_args!("{} entering MISSING state", params.if_name));
            }
            st.state = ReachState::Missing;
        }
    }

    if params.missed_consecutive_ping_threshold > 0
        && st.missed == params.missed_consecutive_ping_threshold
    {
        if let Some(cb) = &params.callback {
            cb(&LbStatus {
                code: StatusCode::MissedPingThresh,
                params,
                client_data: params.client_data.as_ref(),
            });
        }
        st.missed = 0;
        if params.is_oneshot {
            return SendOutcome::OneshotDone;
        }
    }

    st.txn_id = st.txn_id.wrapping_add(1);
    let pdu = build_lb_pdu(st.header, st.txn_id, OAM_TLV_END);

    let frame = if custom_vlan {
        build_vlan_frame(
            dst_mac,
            src_mac,
            ETHERTYPE_VLAN,
            params.pcp,
            params.dei,
            params.vlan_id,
            ETHERTYPE_OAM,
            &pdu,
        )
    } else {
        build_eth_frame(dst_mac, src_mac, ETHERTYPE_OAM, &pdu)
    };

    match tx_socket.send(&frame) {
        Ok(n) if n == frame.len() => {}
        Ok(n) => log.error(format_args!("short write sending LBM: {n} of {} bytes", frame.len())),
        Err(e) => log.error(format_args!("failed to send LBM: {e}")),
    }

    st.time_sent = Instant::now();
    st.frame_sent = true;
    st.had_reply_last_round = false;
    SendOutcome::Continue
}

#[allow(clippy::too_many_arguments)]
fn drain_replies<T>(
    params: &LBSessionParams<T>,
    log: &SessionLog,
    rx_socket: &RxSocket,
    src_mac: MacAddress,
    custom_vlan: bool,
    frame_buf: &mut [u8],
    st: &mut LoopState,
) {
    // One frame per call: the outer poll loop re-enters this function
    // as long as the rx socket stays readable, so a multicast session's
    // "keep draining" just falls out of that level-triggered poll
    // rather than an inner blocking loop.
    if !st.frame_sent {
        return;
    }

    let (n, cmsg) = match rx_socket.recv(frame_buf) {
        Ok(v) => v,
        Err(e) => {
            log.error(format_args!("rx poll error: {e}"));
            return;
        }
    };
    let time_received = Instant::now();
    let frame = &frame_buf[..n];

    if frame.len() < 14 || &frame[0..6] != src_mac.as_bytes() {
        return;
    }

    let mut aux = PacketAuxdata::default();
    let tagged = frame_is_tagged(&cmsg, &mut aux);
    if tagged && (!custom_vlan || aux.tp_vlan_tci & 0x0FFF != params.vlan_id) {
        return;
    }

    let Some(pdu) = parse_lb_pdu(&frame[14..]) else {
        return;
    };

    if pdu.header.opcode != Opcode::Lbr.to_byte() {
        return;
    }
    if pdu.header.meg_level != params.meg_level {
        return;
    }
    if pdu.transaction_id != st.txn_id {
        return;
    }

    let elapsed_ms = time_received.saturating_duration_since(st.time_sent).as_millis();
    log.info(format_args!("Got LBR from {} time: {elapsed_ms} ms", params.if_name));

    st.missed = 0;
    st.replied += 1;
    st.had_reply_last_round = true;
    if st.state == ReachState::Missing {
        log.info(format_args!("{} recovered to PROBING state", params.if_name));
    }
    st.state = ReachState::Probing;
    if params.is_multicast {
        st.multicast_replied += 1;
    } else {
        // Unicast: one reply per tick (§4.4 Phase B). Clearing
        // `frame_sent` here stops this tick's remaining poll wakeups
        // from matching a second frame against the same transaction id.
        st.frame_sent = false;
    }

    if !st.recovered
        && params.ping_recovery_threshold > 0
        && st.replied == params.ping_recovery_threshold
    {
        st.recovered = true;
        if let Some(cb) = &params.callback {
            cb(&LbStatus {
                code: StatusCode::RecoverPingThresh,
                params,
                client_data: params.client_data.as_ref(),
            });
        }
    }
}
