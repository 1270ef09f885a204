//! # Websocket Transport
//!
//! Connects to the realtime endpoint, feeds every text frame through a
//! [`FeedIngester`] and forwards the resulting liquidations.
//!
//! A session ends when the connection breaks, the peer closes it, the
//! exchange reports an error, or nothing at all arrives for the read
//! timeout. Outgoing pings do not count as activity. [`run_feed`]
//! reconnects after every failed session until the downstream queue is
//! dropped.

use crate::config::FeedConfig;
use crate::domain::entities::Liquidation;
use crate::infrastructure::feed::error::{FeedError, FeedResult};
use crate::infrastructure::feed::ingestion::FeedIngester;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Runs one websocket session.
///
/// Returns `Ok(())` once `sink` has been dropped, which is the orderly way
/// to stop the feed.
///
/// # Errors
///
/// Returns a [`FeedError`] describing why the session ended otherwise.
pub async fn run_session(
    config: &FeedConfig,
    ingester: &mut FeedIngester,
    sink: &mpsc::Sender<Liquidation>,
) -> FeedResult<()> {
    let (stream, _response) = connect_async(config.url.as_str())
        .await
        .map_err(|e| FeedError::connection(e.to_string()))?;
    info!(url = %config.url, "feed connected");

    let (mut write, mut read) = stream.split();

    let ping_every = config.ping_interval();
    let mut ping = interval_at(Instant::now() + ping_every, ping_every);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let read_timeout = config.read_timeout();
    let silence = sleep_until(Instant::now() + read_timeout);
    tokio::pin!(silence);

    loop {
        tokio::select! {
            () = &mut silence => {
                return Err(FeedError::protocol(format!(
                    "no frame received for {}s",
                    read_timeout.as_secs()
                )));
            }
            _ = ping.tick() => {
                write
                    .send(Message::Ping(Vec::new()))
                    .await
                    .map_err(|e| FeedError::connection(e.to_string()))?;
            }
            _ = sink.closed() => {
                debug!("liquidation queue closed, ending session");
                return Ok(());
            }
            frame = read.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return Err(FeedError::connection(e.to_string())),
                    None => return Err(FeedError::Closed),
                };

                let now = Instant::now();
                silence.as_mut().reset(now + read_timeout);

                match message {
                    Message::Text(text) => {
                        for liquidation in ingester.ingest(&text, now)? {
                            if sink.send(liquidation).await.is_err() {
                                debug!("liquidation queue closed, ending session");
                                return Ok(());
                            }
                        }
                    }
                    Message::Ping(data) => {
                        write
                            .send(Message::Pong(data))
                            .await
                            .map_err(|e| FeedError::connection(e.to_string()))?;
                    }
                    Message::Close(frame) => {
                        debug!(?frame, "feed closed by peer");
                        return Err(FeedError::Closed);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Runs sessions back to back, pausing `reconnect_delay` between them.
///
/// The ingester, and with it the order id dedup window, survives
/// reconnects. Returns once `sink` has been dropped.
pub async fn run_feed(config: FeedConfig, sink: mpsc::Sender<Liquidation>) {
    let mut ingester = FeedIngester::new(config.dedup_horizon());

    loop {
        match run_session(&config, &mut ingester, &sink).await {
            Ok(()) => break,
            Err(error) => warn!(%error, "feed session ended"),
        }

        let delay = config.reconnect_delay();
        info!(delay_secs = delay.as_secs(), "reconnecting to feed");
        tokio::select! {
            () = sleep(delay) => {}
            _ = sink.closed() => break,
        }
    }

    info!("feed stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    const FIXTURE: &str = include_str!("../../../tests/fixtures/instruments.json");

    fn snapshot_frame() -> String {
        format!(r#"{{"table":"instrument","action":"partial","data":{FIXTURE}}}"#)
    }

    fn insert_frame(order_id: &str) -> String {
        format!(
            r#"{{"table":"liquidation","action":"insert","data":[{{"orderID":"{order_id}","symbol":"XBTUSD","side":"Buy","price":23000,"leavesQty":5000}}]}}"#
        )
    }

    fn config(addr: SocketAddr) -> FeedConfig {
        FeedConfig {
            url: format!("ws://{addr}"),
            reconnect_delay_secs: 1,
            ping_interval_secs: 1,
            read_timeout_secs: 2,
            ..FeedConfig::default()
        }
    }

    /// Accepts one connection, sends `frames`, then holds the socket open
    /// without reading for `hold`.
    async fn serve_once(frames: Vec<String>, hold: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            for frame in frames {
                ws.send(Message::Text(frame)).await.unwrap();
            }
            tokio::time::sleep(hold).await;
        });
        addr
    }

    mod session {
        use super::*;

        #[tokio::test]
        async fn forwards_valued_liquidations() {
            let addr = serve_once(
                vec![snapshot_frame(), insert_frame("a"), insert_frame("a")],
                Duration::from_secs(5),
            )
            .await;
            let (tx, mut rx) = mpsc::channel(8);
            let mut ingester = FeedIngester::default();
            let cfg = config(addr);

            let session = tokio::spawn(async move {
                let result = run_session(&cfg, &mut ingester, &tx).await;
                (result, ingester)
            });

            let liquidation = rx.recv().await.unwrap();
            assert_eq!(liquidation.symbol.as_str(), "XBTUSD");
            assert_eq!(liquidation.usd_value(), 5000.0);

            drop(rx);
            let (result, ingester) = session.await.unwrap();
            assert!(result.is_ok());
            assert!(ingester.is_loaded());
            assert_eq!(ingester.seen_len(), 1);
        }

        #[tokio::test]
        async fn silent_connection_times_out() {
            let addr = serve_once(Vec::new(), Duration::from_secs(10)).await;
            let (tx, _rx) = mpsc::channel(8);
            let mut ingester = FeedIngester::default();

            let err = run_session(&config(addr), &mut ingester, &tx)
                .await
                .unwrap_err();
            assert!(matches!(err, FeedError::Protocol(_)));
        }

        #[tokio::test]
        async fn upstream_error_ends_session() {
            let addr = serve_once(
                vec![r#"{"status":400,"error":"Unknown table: liquidations"}"#.to_string()],
                Duration::from_secs(5),
            )
            .await;
            let (tx, _rx) = mpsc::channel(8);
            let mut ingester = FeedIngester::default();

            let err = run_session(&config(addr), &mut ingester, &tx)
                .await
                .unwrap_err();
            assert_eq!(err, FeedError::upstream("Unknown table: liquidations"));
        }

        #[tokio::test]
        async fn peer_close_is_reported() {
            let addr = serve_once(Vec::new(), Duration::ZERO).await;
            let (tx, _rx) = mpsc::channel(8);
            let mut ingester = FeedIngester::default();

            let err = run_session(&config(addr), &mut ingester, &tx)
                .await
                .unwrap_err();
            assert!(matches!(err, FeedError::Closed | FeedError::Connection(_)));
        }

        #[tokio::test]
        async fn refused_connection_is_a_connection_error() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let (tx, _rx) = mpsc::channel(8);
            let mut ingester = FeedIngester::default();
            let err = run_session(&config(addr), &mut ingester, &tx)
                .await
                .unwrap_err();
            assert!(matches!(err, FeedError::Connection(_)));
        }
    }

    mod reconnect {
        use super::*;

        #[tokio::test]
        async fn stops_when_queue_is_dropped() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let (tx, rx) = mpsc::channel(8);
            let feed = tokio::spawn(run_feed(config(addr), tx));
            drop(rx);

            tokio::time::timeout(Duration::from_secs(5), feed)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
