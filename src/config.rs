//! Session configuration surface, §1.3/§3.

use crate::callback::LbCallback;
use crate::error::{Error, Result};
use crate::frame::MacAddress;

/// The kind of worker a session spawns. LB-discover is out of scope.
// TODO: LB-discover (multi-peer discovery + LIST_LIVE_MACS) is a named
// follow-up, not implemented — see original_source's discover session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Sends LBM probes and watches for LBR replies.
    Lbm,
    /// Listens for LBM and replies with LBR.
    Lbr,
}

impl SessionKind {
    /// Maps a caller-supplied numeric kind onto a [`SessionKind`],
    /// matching the C API's `int kind` parameter. Anything else is
    /// [`Error::InvalidSessionKind`] (scenario S6).
    pub fn from_raw(kind: i32) -> Result<Self> {
        match kind {
            0 => Ok(SessionKind::Lbm),
            1 => Ok(SessionKind::Lbr),
            other => Err(Error::InvalidSessionKind(other)),
        }
    }
}

/// Minimum tx interval enforced for multicast sessions, per standard.
pub const MULTICAST_MIN_INTERVAL_MS: u32 = 5000;

/// Destination selector for an LBM session.
#[derive(Debug, Clone)]
pub enum Destination {
    /// Unicast destination, resolved from the configured MAC string.
    Unicast(MacAddress),
    /// Multicast/broadcast discovery: destination forced to broadcast.
    Multicast,
}

/// Opaque client-data handle forwarded unchanged to the session callback.
pub type ClientData<T> = Option<T>;

/// Immutable-after-start configuration for a single ETH-LB session.
///
/// Construct with [`LBSessionParamsBuilder`]; `build()` validates and
/// clamps fields per the invariants in §3 (MEG level, PCP, VLAN id,
/// multicast overrides). Not `Clone`: the worker takes ownership of its
/// params for the session's lifetime (§9 — no raw pointers into
/// caller-owned state), and the callback closure isn't cloneable.
pub struct LBSessionParams<T> {
    pub if_name: String,
    pub dst_mac: Destination,
    pub interval_ms: u32,
    pub missed_consecutive_ping_threshold: u32,
    pub ping_recovery_threshold: u32,
    pub is_oneshot: bool,
    pub net_ns: Option<String>,
    pub meg_level: u8,
    pub vlan_id: u16,
    pub pcp: u8,
    pub dei: u8,
    pub is_multicast: bool,
    pub console_log: bool,
    pub utc_log: bool,
    pub log_file: Option<String>,
    pub callback: Option<LbCallback<T>>,
    pub client_data: ClientData<T>,
    /// Clamp warnings raised while validating the builder's fields,
    /// e.g. an out-of-range MEG level or PCP. Emitted through the
    /// session's own [`crate::log::SessionLog`] at worker startup — no
    /// `SessionLog` exists yet while `build()` runs in the caller's
    /// thread, and this crate never installs a process-wide logger.
    pub(crate) config_warnings: Vec<String>,
}

impl<T> std::fmt::Debug for LBSessionParams<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LBSessionParams")
            .field("if_name", &self.if_name)
            .field("dst_mac", &self.dst_mac)
            .field("interval_ms", &self.interval_ms)
            .field(
                "missed_consecutive_ping_threshold",
                &self.missed_consecutive_ping_threshold,
            )
            .field("ping_recovery_threshold", &self.ping_recovery_threshold)
            .field("is_oneshot", &self.is_oneshot)
            .field("net_ns", &self.net_ns)
            .field("meg_level", &self.meg_level)
            .field("vlan_id", &self.vlan_id)
            .field("pcp", &self.pcp)
            .field("dei", &self.dei)
            .field("is_multicast", &self.is_multicast)
            .field("console_log", &self.console_log)
            .field("utc_log", &self.utc_log)
            .field("log_file", &self.log_file)
            .field("callback", &self.callback.is_some())
            .field("config_warnings", &self.config_warnings)
            .finish()
    }
}

/// Builds an [`LBSessionParams`], in the style of a chained setter
/// builder: each method returns `Self`, `build()` validates and
/// clamps and returns a [`Result`].
pub struct LBSessionParamsBuilder<T> {
    if_name: String,
    dst_mac: Option<String>,
    interval_ms: u32,
    missed_consecutive_ping_threshold: u32,
    ping_recovery_threshold: u32,
    is_oneshot: bool,
    net_ns: Option<String>,
    meg_level: u8,
    vlan_id: u16,
    pcp: u8,
    dei: u8,
    is_multicast: bool,
    console_log: bool,
    utc_log: bool,
    log_file: Option<String>,
    callback: Option<LbCallback<T>>,
    client_data: ClientData<T>,
}

impl<T> LBSessionParamsBuilder<T> {
    /// Starts a builder for the given interface, with the defaults the
    /// original library used: 1000 ms interval, no thresholds, unicast,
    /// MEG level 0, untagged.
    pub fn new(if_name: impl Into<String>) -> Self {
        Self {
            if_name: if_name.into(),
            dst_mac: None,
            interval_ms: 1000,
            missed_consecutive_ping_threshold: 0,
            ping_recovery_threshold: 0,
            is_oneshot: false,
            net_ns: None,
            meg_level: 0,
            vlan_id: 0,
            pcp: 0,
            dei: 0,
            is_multicast: false,
            console_log: false,
            utc_log: false,
            log_file: None,
            callback: None,
            client_data: None,
        }
    }

    pub fn dst_mac(mut self, mac: impl Into<String>) -> Self {
        self.dst_mac = Some(mac.into());
        self
    }

    pub fn interval_ms(mut self, interval_ms: u32) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn missed_consecutive_ping_threshold(mut self, threshold: u32) -> Self {
        self.missed_consecutive_ping_threshold = threshold;
        self
    }

    pub fn ping_recovery_threshold(mut self, threshold: u32) -> Self {
        self.ping_recovery_threshold = threshold;
        self
    }

    pub fn oneshot(mut self, oneshot: bool) -> Self {
        self.is_oneshot = oneshot;
        self
    }

    pub fn net_ns(mut self, ns: impl Into<String>) -> Self {
        self.net_ns = Some(ns.into());
        self
    }

    pub fn meg_level(mut self, meg_level: u8) -> Self {
        self.meg_level = meg_level;
        self
    }

    pub fn vlan_id(mut self, vlan_id: u16) -> Self {
        self.vlan_id = vlan_id;
        self
    }

    pub fn pcp(mut self, pcp: u8) -> Self {
        self.pcp = pcp;
        self
    }

    pub fn dei(mut self, dei: u8) -> Self {
        self.dei = dei;
        self
    }

    pub fn multicast(mut self, multicast: bool) -> Self {
        self.is_multicast = multicast;
        self
    }

    pub fn console_log(mut self, enabled: bool) -> Self {
        self.console_log = enabled;
        self
    }

    pub fn utc_log(mut self, enabled: bool) -> Self {
        self.utc_log = enabled;
        self
    }

    pub fn log_file(mut self, path: impl Into<String>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn client_data(mut self, data: T) -> Self {
        self.client_data = Some(data);
        self
    }

    /// Sets the reachability-transition callback. Cleared automatically
    /// for multicast sessions by `build()` (§3).
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&crate::callback::LbStatus<T>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Validates and clamps the accumulated fields, applying the
    /// multicast overrides of §3 (dst forced to broadcast, thresholds
    /// and VLAN/PCP cleared, callback cleared by the caller not holding
    /// one, one-shot cleared, interval lower-bounded to 5000 ms).
    pub fn build(self) -> Result<LBSessionParams<T>> {
        let mut config_warnings = Vec::new();

        let meg_level = if self.meg_level > 7 {
            config_warnings.push(format!(
                "MEG level {} out of range 0-7, clamping to 0",
                self.meg_level
            ));
            0
        } else {
            self.meg_level
        };
        let pcp = if self.pcp > 7 {
            config_warnings.push(format!("PCP {} out of range 0-7, clamping to 0", self.pcp));
            0
        } else {
            self.pcp
        };
        let vlan_id = self.vlan_id & 0x0FFF;

        if self.is_multicast {
            return Ok(LBSessionParams {
                if_name: self.if_name,
                dst_mac: Destination::Multicast,
                interval_ms: self.interval_ms.max(MULTICAST_MIN_INTERVAL_MS),
                missed_consecutive_ping_threshold: 0,
                ping_recovery_threshold: 0,
                is_oneshot: false,
                net_ns: self.net_ns,
                meg_level,
                vlan_id: 0,
                pcp: 0,
                dei: 0,
                is_multicast: true,
                console_log: self.console_log,
                utc_log: self.utc_log,
                log_file: self.log_file,
                callback: None,
                client_data: None,
                config_warnings,
            });
        }

        let dst_mac = match self.dst_mac {
            Some(s) => Destination::Unicast(s.parse::<MacAddress>()?),
            None => Destination::Unicast(MacAddress::zero()),
        };

        Ok(LBSessionParams {
            if_name: self.if_name,
            dst_mac,
            interval_ms: self.interval_ms,
            missed_consecutive_ping_threshold: self.missed_consecutive_ping_threshold,
            ping_recovery_threshold: self.ping_recovery_threshold,
            is_oneshot: self.is_oneshot,
            net_ns: self.net_ns,
            meg_level,
            vlan_id,
            pcp,
            dei: self.dei,
            is_multicast: false,
            console_log: self.console_log,
            utc_log: self.utc_log,
            log_file: self.log_file,
            callback: self.callback,
            client_data: self.client_data,
            config_warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_mac_string_fails_synchronously() {
        let err = LBSessionParamsBuilder::<()>::new("eth0")
            .dst_mac("aa:bb:gg")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMacAddress(_)));
    }

    #[test]
    fn meg_level_out_of_range_clamps_to_zero() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .dst_mac("00:11:22:33:44:55")
            .meg_level(9)
            .build()
            .unwrap();
        assert_eq!(params.meg_level, 0);
    }

    #[test]
    fn out_of_range_meg_level_and_pcp_are_recorded_as_config_warnings() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .dst_mac("00:11:22:33:44:55")
            .meg_level(9)
            .pcp(12)
            .build()
            .unwrap();
        assert_eq!(params.config_warnings.len(), 2);
        assert!(params.config_warnings[0].contains("MEG level"));
        assert!(params.config_warnings[1].contains("PCP"));
    }

    #[test]
    fn in_range_fields_record_no_config_warnings() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .dst_mac("00:11:22:33:44:55")
            .meg_level(3)
            .pcp(2)
            .build()
            .unwrap();
        assert!(params.config_warnings.is_empty());
    }

    #[test]
    fn multicast_forces_broadcast_and_clears_thresholds() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .multicast(true)
            .interval_ms(1000)
            .missed_consecutive_ping_threshold(3)
            .vlan_id(42)
            .pcp(5)
            .oneshot(true)
            .build()
            .unwrap();
        assert!(matches!(params.dst_mac, Destination::Multicast));
        assert_eq!(params.missed_consecutive_ping_threshold, 0);
        assert_eq!(params.ping_recovery_threshold, 0);
        assert_eq!(params.vlan_id, 0);
        assert_eq!(params.pcp, 0);
        assert!(!params.is_oneshot);
        assert_eq!(params.interval_ms, MULTICAST_MIN_INTERVAL_MS);
    }

    #[test]
    fn multicast_interval_not_lowered_when_already_above_minimum() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .multicast(true)
            .interval_ms(9000)
            .build()
            .unwrap();
        assert_eq!(params.interval_ms, 9000);
    }

    #[test]
    fn vlan_id_is_masked_to_12_bits() {
        let params = LBSessionParamsBuilder::<()>::new("eth0")
            .dst_mac("00:11:22:33:44:55")
            .vlan_id(0xFFFF)
            .build()
            .unwrap();
        assert_eq!(params.vlan_id, 0x0FFF);
    }

    #[test]
    fn session_kind_from_raw_rejects_unknown_values() {
        assert!(matches!(SessionKind::from_raw(0), Ok(SessionKind::Lbm)));
        assert!(matches!(SessionKind::from_raw(1), Ok(SessionKind::Lbr)));
        assert!(matches!(
            SessionKind::from_raw(9),
            Err(Error::InvalidSessionKind(9))
        ));
    }
}
