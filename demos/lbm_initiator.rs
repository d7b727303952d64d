//! Starts an LBM session against a peer MAC and logs reachability
//! transitions to stdout until interrupted.
//!
//! ```sh
//! sudo cargo run --example lbm_initiator -- eth0 aa:bb:cc:dd:ee:ff
//! ```

use std::env;
use std::thread;
use std::time::Duration;

use ethlb::callback::StatusCode;
use ethlb::{LBSessionParamsBuilder, Result, SessionKind};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let if_name = args.next().unwrap_or_else(|| "eth0".to_string());
    let dst_mac = args.next().unwrap_or_else(|| "ff:ff:ff:ff:ff:ff".to_string());

    let params = LBSessionParamsBuilder::<()>::new(if_name.clone())
        .dst_mac(dst_mac)
        .interval_ms(1000)
        .missed_consecutive_ping_threshold(3)
        .ping_recovery_threshold(2)
        .console_log(true)
        .callback(|status| match status.code {
            StatusCode::MissedPingThresh => println!("=> peer unreachable"),
            StatusCode::RecoverPingThresh => println!("=> peer reachable again"),
            StatusCode::Default => {}
        })
        .build()?;

    let session_id = ethlb::session_start(params, SessionKind::Lbm);
    if !session_id.is_valid() {
        eprintln!("failed to start LBM session on {if_name}");
        std::process::exit(1);
    }
    println!("LBM session {} running on {if_name}, Ctrl-C to stop", session_id.raw());

    loop {
        thread::sleep(Duration::from_secs(3600));
    }
}
