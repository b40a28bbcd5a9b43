//! Standalone reconnect-loop monitor: connects to a KW1281 ECU, prints its
//! identification text and any decoded measurement groups, and reconnects
//! after a session error until interrupted with Ctrl-C.

use std::env;
use std::time::Duration;

use tracing::{error, info, warn, Level};

use kw1281::{CancelToken, Callbacks, ConnectConfig, Connection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    println!(
        r#"
 _    ___       _ ____   ___  __
| |  / (_)___ _(_) / /  / _ \<  /
| | / / / __ `/ / /_/ | / __/ / /
| |/ / / /_/ / / __/| |/ /_/ / /
|___/_/\__,_/_/_/    |___/_/_/   monitor
"#
    );

    let port_name = env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".into());
    let cancel = CancelToken::new();

    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping after the current block exchange");
            ctrlc_cancel.cancel();
        }
    });

    run_forever(&port_name, cancel).await
}

/// Reconnect after a fatal session error, matching the reference client's
/// outer run loop. Returns once `cancel` is observed.
async fn run_forever(port_name: &str, cancel: CancelToken) -> anyhow::Result<()> {
    let config = ConnectConfig::new(port_name);

    while !cancel.is_cancelled() {
        info!(port = port_name, "connecting");
        let mut conn = match Connection::connect(&config) {
            Ok(conn) => conn,
            Err(err) => {
                error!(%err, "connect failed, retrying in 2s");
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        println!(
            "connected: {} ({} detail lines)",
            conn.ecu_details().part_number,
            conn.ecu_details().details.len()
        );
        for line in &conn.ecu_details().details {
            println!("  {line}");
        }

        let callbacks = Callbacks {
            ecu_details: None,
            measurement: Some(Box::new(|group, measurements| {
                for m in measurements {
                    println!("group {group}: {:?} = {}", m.metric, m.value.render());
                }
            })),
        };

        if let Err(err) = conn.start_async(cancel.clone(), callbacks).await {
            warn!(%err, "session ended, reconnecting");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    Ok(())
}
