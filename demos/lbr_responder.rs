//! Starts an LBR session that answers peer LBM probes on an interface
//! until interrupted.
//!
//! ```sh
//! sudo cargo run --example lbr_responder -- eth0
//! ```

use std::env;
use std::thread;
use std::time::Duration;

use ethlb::{LBSessionParamsBuilder, Result, SessionKind};

fn main() -> Result<()> {
    let if_name = env::args().nth(1).unwrap_or_else(|| "eth0".to_string());

    let params = LBSessionParamsBuilder::<()>::new(if_name.clone())
        .console_log(true)
        .build()?;

    let session_id = ethlb::session_start(params, SessionKind::Lbr);
    if !session_id.is_valid() {
        eprintln!("failed to start LBR session on {if_name}");
        std::process::exit(1);
    }
    println!("LBR session {} running on {if_name}, Ctrl-C to stop", session_id.raw());

    loop {
        thread::sleep(Duration::from_secs(3600));
    }
}
