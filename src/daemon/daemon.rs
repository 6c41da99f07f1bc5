use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::control::{
    tracing_control_sink, tracing_raw_sink, tracing_state_sink, Command, Controller,
};
use crate::errors::{error, info, warn, Error, ErrorKind, Result};
use crate::link::Link;
use crate::utils::mono_time_ms;

/// Frames multiplexed onto the single pump loop below: an inbound notification
/// payload from the ring, or an outbound command the controller wants sent.
enum PumpEvent {
    Payload(Vec<u8>),
    Command(Command),
}

/// Runs scan/connect/poll cycles until shutdown. Transient link failures are
/// logged and retried after `config.ring.reconnect_delay_ms`.
pub async fn run(config: Config) -> Result<()> {
    info!("daemon starting");

    let tunables = crate::control::Tunables::default().with_overrides(&config.tunables);

    let cancel = CancellationToken::new();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|e| Error::wrap(e, ErrorKind::Read).with_msg("daemon: failed to register SIGTERM handler"))?;

    let run_loop = async {
        let mut link = match Link::new().await {
            Ok(link) => link,
            Err(e) => {
                error(&e);
                return;
            }
        };

        loop {
            match run_once(&mut link, &config, tunables, cancel.clone()).await {
                Ok(()) => break,
                Err(e) => {
                    error(&e);
                    if !link.take_reconnect_budget() {
                        warn!("daemon: reconnect budget exhausted for this disconnect, giving up");
                        break;
                    }
                    warn!(delay_ms = config.ring.reconnect_delay_ms, "daemon: link cycle ended, reconnecting");
                    sleep(Duration::from_millis(config.ring.reconnect_delay_ms)).await;
                }
            }
        }
    };

    tokio::select! {
        _ = run_loop => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }

    cancel.cancel();
    Ok(())
}

/// One connection lifetime. Returns `Ok(())` only when `cancel` fires;
/// any link error returns `Err` so the caller can retry (budget permitting).
async fn run_once(
    link: &mut Link,
    config: &Config,
    tunables: crate::control::Tunables,
    cancel: CancellationToken,
) -> Result<()> {
    let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
    let (payload_tx, payload_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let controller = Controller::new(
        tunables,
        tracing_state_sink(),
        tracing_control_sink(),
        Some(tracing_raw_sink()),
        Box::new(move |cmd| {
            let _ = command_tx.send(cmd);
        }),
    );
    // Guarantees the controller's own disconnect (and, via its ControllerState
    // invariants, a stop to event emission) fires on every exit from this
    // function, including an early `?` return below — matching the "no
    // sample can produce an event until the next connect()" guarantee without
    // threading manual cleanup through each return site.
    let mut controller = scopeguard::guard(controller, |mut c| c.disconnect());

    controller.begin_scanning();
    let rings = link.scan(config.ring.mac_address.as_deref()).await?;
    let ring = rings
        .into_iter()
        .next()
        .ok_or_else(|| Error::new(ErrorKind::NotFound).with_msg("daemon: no matching ring found during scan"))?;

    info!(name = %ring.name, address = %ring.address, "ring discovered");
    controller.begin_connecting();
    link.connect(ring).await?;
    controller.mark_connected();

    let notifications = link.run_notifications(payload_tx, cancel.clone());

    let mut pump = UnboundedReceiverStream::new(payload_rx)
        .map(PumpEvent::Payload)
        .merge(UnboundedReceiverStream::new(command_rx).map(PumpEvent::Command));

    let pump = async {
        while let Some(event) = pump.next().await {
            match event {
                PumpEvent::Payload(bytes) => controller.on_payload(&bytes, mono_time_ms()),
                PumpEvent::Command(cmd) => {
                    if let Err(e) = link.send(cmd).await {
                        error(&e);
                    }
                }
            }
        }
    };

    let outcome = tokio::select! {
        result = notifications => result,
        _ = pump => Ok(()),
        _ = cancel.cancelled() => Ok(()),
    };

    if let Err(e) = link.disconnect().await {
        error(&e);
    }

    outcome
}
