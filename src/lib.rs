//! # ethlb
//!
//! An IEEE 802.1ag / ITU-T Y.1731 Ethernet Connectivity Fault Management
//! (CFM) Loopback (ETH-LB) engine: a Layer-2 "MAC ping" for MEP/MIP
//! sessions over raw `AF_PACKET` sockets.
//!
//! A session is either an LBM worker, which sends periodic LBM probes
//! to a configured destination and reports reachability transitions
//! through a callback, or an LBR worker, which answers peer LBM probes
//! on an interface. Both are started and stopped through the registry
//! in [`session`].
//!
//! `unsafe` is confined to [`iface`] and the `worker::socket`/
//! `worker::timer` primitives, each documented with its safety
//! contract — raw sockets, netlink, `setns`, `timerfd`, and BPF
//! attachment have no safe abstraction on Linux. Everything above that
//! layer (`config`, `session`, `callback`, `frame`, `log`) is safe
//! Rust.
//!
//! ## Quick start
//!
//! ```no_run
//! use ethlb::{LBSessionParamsBuilder, SessionKind, session_start, session_stop};
//!
//! let params = LBSessionParamsBuilder::<()>::new("eth0")
//!     .dst_mac("aa:bb:cc:dd:ee:ff")
//!     .interval_ms(1000)
//!     .build()
//!     .unwrap();
//!
//! let session_id = session_start(params, SessionKind::Lbm);
//! if session_id.is_valid() {
//!     session_stop(session_id);
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`frame`] | Pure wire codec: OAM common header, LB PDU, Ethernet/VLAN framing |
//! | [`iface`] | Interface MAC resolution, VLAN sub-interface detection, ancillary-data parsing |
//! | [`config`] | [`LBSessionParams`] and its builder |
//! | [`callback`] | The reachability-transition callback surface |
//! | [`session`] | Session registry: `session_start`/`session_stop` |
//! | [`log`] | Per-session logging sink |
//! | [`error`] | [`Error`] and the crate [`Result`] alias |

pub mod callback;
pub mod config;
pub mod error;
pub mod frame;
pub mod iface;
pub mod log;
pub mod session;
mod worker;

pub use callback::{LbCallback, LbStatus, StatusCode};
pub use config::{ClientData, Destination, LBSessionParams, LBSessionParamsBuilder, SessionKind};
pub use error::{Error, Result};
pub use session::{session_start, session_stop, SessionId};
