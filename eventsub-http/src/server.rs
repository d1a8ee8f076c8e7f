//! HTTP server serving EventSub webhook callbacks.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::pin::Pin;

use eventsub::EventSubListener;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::{HttpListenerError, Result};
use crate::router::routes;

type ServerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type ReadyState = Option<std::result::Result<SocketAddr, HttpListenerError>>;

/// Binds an [`EventSubListener`] to a warp server.
///
/// The bound port and TLS settings come from the listener's adapter. Once the
/// socket is bound the listener is marked ready to subscribe and pending
/// subscriptions are reconciled with the remote service in the background.
///
/// ```rust,ignore
/// let server = EventSubHttpListener::new(listener.clone());
/// server.start().await?;
/// let addr = server.ready().await?;
/// // ...
/// server.stop().await?;
/// ```
pub struct EventSubHttpListener {
    listener: EventSubListener,
    running: Mutex<Option<RunningServer>>,
}

struct RunningServer {
    shutdown_tx: oneshot::Sender<()>,
    ready_rx: watch::Receiver<ReadyState>,
    handle: JoinHandle<()>,
}

impl EventSubHttpListener {
    pub fn new(listener: EventSubListener) -> Self {
        Self {
            listener,
            running: Mutex::new(None),
        }
    }

    pub fn listener(&self) -> &EventSubListener {
        &self.listener
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Spawn the server task and return without waiting for the socket.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(HttpListenerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = watch::channel(None);
        let handle = tokio::spawn(serve(self.listener.clone(), shutdown_rx, ready_tx));

        *running = Some(RunningServer {
            shutdown_tx,
            ready_rx,
            handle,
        });
        Ok(())
    }

    /// Wait until the server is bound; returns the local address.
    pub async fn ready(&self) -> Result<SocketAddr> {
        let mut ready_rx = {
            let running = self.running.lock().await;
            match running.as_ref() {
                Some(server) => server.ready_rx.clone(),
                None => return Err(HttpListenerError::NotRunning),
            }
        };

        let state = ready_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| HttpListenerError::ServerGone)?;
        match &*state {
            Some(result) => result.clone(),
            None => Err(HttpListenerError::ServerGone),
        }
    }

    /// Suspend every subscription and shut the server down gracefully.
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        let server = running.take().ok_or(HttpListenerError::NotRunning)?;

        self.listener.set_ready_to_subscribe(false);
        self.listener.suspend_all().await;

        // The task may already have ended after a bind failure.
        let _ = server.shutdown_tx.send(());
        if let Err(e) = server.handle.await {
            tracing::error!(error = %e, "HTTP server task failed");
        }
        tracing::info!("EventSub HTTP listener stopped");
        Ok(())
    }
}

impl std::fmt::Debug for EventSubHttpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubHttpListener")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

async fn serve(listener: EventSubListener, shutdown_rx: oneshot::Receiver<()>, ready_tx: watch::Sender<ReadyState>) {
    let adapter = listener.adapter().clone();
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), adapter.listener_port());
    let routes = routes(listener.clone());
    let shutdown = async move {
        let _ = shutdown_rx.await;
    };

    let bound: std::result::Result<(SocketAddr, ServerFuture), String> = match adapter.tls() {
        Some(tls) => {
            // The TLS server panics on bind failure, so check the port first.
            if is_port_available(addr.port()) {
                let (local, server) = warp::serve(routes)
                    .tls()
                    .cert(tls.cert_pem.clone())
                    .key(tls.key_pem.clone())
                    .bind_with_graceful_shutdown(addr, shutdown);
                Ok((local, Box::pin(server) as ServerFuture))
            } else {
                Err("port is already in use".to_string())
            }
        }
        None => warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map(|(local, server)| (local, Box::pin(server) as ServerFuture))
            .map_err(|e| e.to_string()),
    };

    let (local, server) = match bound {
        Ok(bound) => bound,
        Err(message) => {
            tracing::error!(addr = %addr, error = %message, "Critical: EventSub HTTP listener could not bind");
            ready_tx.send_replace(Some(Err(HttpListenerError::Bind {
                addr: addr.to_string(),
                message,
            })));
            return;
        }
    };

    tracing::info!(addr = %local, tls = adapter.tls().is_some(), "EventSub HTTP listener bound");
    listener.set_ready_to_subscribe(true);
    ready_tx.send_replace(Some(Ok(local)));

    let resumer = listener.clone();
    tokio::spawn(async move {
        if let Err(e) = resumer.resume_existing_subscriptions().await {
            tracing::error!(error = %e, "Failed to resume subscriptions");
        }
    });

    server.await;
    listener.set_ready_to_subscribe(false);
    tracing::debug!(addr = %local, "EventSub HTTP server exited");
}

/// Check if a port is available for binding.
fn is_port_available(port: u16) -> bool {
    TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)).is_ok()
}
