//! Listeners and accept loops for the control and transfer ports

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::activity::ActivityTracker;
use crate::connection::{ConnectionParams, handle_connection};
use crate::provider::Provider;
use crate::transfers::{EndpointBroker, handle_transfer_connection};

/// A bound pair of listeners serving one provider
pub struct Server {
    control: TcpListener,
    transfer: TcpListener,
    provider: Provider,
    broker: Arc<EndpointBroker>,
    activity: Arc<ActivityTracker>,
}

impl Server {
    /// Bind both ports
    ///
    /// Either address may use port 0; the transfer port actually bound is
    /// the one advertised in endpoints.
    pub async fn bind(
        control_addr: SocketAddr,
        transfer_addr: SocketAddr,
        provider: Provider,
        activity: Arc<ActivityTracker>,
    ) -> io::Result<Self> {
        let control = TcpListener::bind(control_addr).await?;
        let transfer = TcpListener::bind(transfer_addr).await?;
        Ok(Self {
            control,
            transfer,
            provider,
            broker: Arc::new(EndpointBroker::new()),
            activity,
        })
    }

    pub fn control_addr(&self) -> io::Result<SocketAddr> {
        self.control.local_addr()
    }

    pub fn transfer_addr(&self) -> io::Result<SocketAddr> {
        self.transfer.local_addr()
    }

    pub fn broker(&self) -> &Arc<EndpointBroker> {
        &self.broker
    }

    /// Accept connections on both ports until either listener fails
    pub async fn run(self) -> io::Result<()> {
        let transfer_port = self.transfer_addr()?.port();
        info!(
            target: "storaged::server",
            "listening on {} (transfer port {})",
            self.control_addr()?,
            transfer_port
        );

        let control = accept_control(
            self.control,
            self.provider,
            self.broker.clone(),
            transfer_port,
            self.activity,
        );
        let transfer = accept_transfer(self.transfer, self.broker);

        tokio::select! {
            result = control => result,
            result = transfer => result,
        }
    }
}

async fn accept_control(
    listener: TcpListener,
    provider: Provider,
    broker: Arc<EndpointBroker>,
    transfer_port: u16,
    activity: Arc<ActivityTracker>,
) -> io::Result<()> {
    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_transient_accept_error(&e) => {
                warn!(target: "storaged::server", "control accept failed: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let _ = socket.set_nodelay(true);

        let params = ConnectionParams {
            peer_addr,
            provider: provider.clone(),
            broker: broker.clone(),
            transfer_port,
            activity: activity.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, params).await {
                log_connection_error(&e, peer_addr);
            }
        });
    }
}

async fn accept_transfer(listener: TcpListener, broker: Arc<EndpointBroker>) -> io::Result<()> {
    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_transient_accept_error(&e) => {
                warn!(target: "storaged::server", "transfer accept failed: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let broker = broker.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_transfer_connection(socket, peer_addr, broker).await {
                log_connection_error(&e, peer_addr);
            }
        });
    }
}

/// Errors that concern one pending connection rather than the listener
fn is_transient_accept_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

fn log_connection_error(error: &io::Error, peer_addr: SocketAddr) {
    // Peers vanishing mid-request are routine
    if matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::UnexpectedEof
    ) {
        debug!(target: "storaged::server", "connection {} dropped: {}", peer_addr, error);
        return;
    }
    warn!(target: "storaged::server", "connection error from {}: {}", peer_addr, error);
}
