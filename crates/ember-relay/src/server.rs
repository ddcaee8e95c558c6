//! Selector-driven packet relay.
//!
//! One selector multiplexes the listener and every connected client.
//! Each received packet is forwarded to every other client; clients whose
//! connection reports `Close` or `Error` are dropped from the selector.

use std::time::Duration;

use ember_config::NetworkConfig;
use ember_socket::{
    Packet, Selector, SocketError, Status, TcpListener, TcpSocket, WaitStatus,
};

/// A running relay: listener, selector, and connected clients.
pub struct RelayServer {
    listener: TcpListener,
    selector: Selector,
    clients: Vec<TcpSocket>,
    max_clients: usize,
    max_packet_bytes: u64,
}

impl RelayServer {
    /// Bind the listener and register it with a fresh selector.
    pub fn bind(config: &NetworkConfig) -> Result<Self, SocketError> {
        let listener = TcpListener::try_bind(config.listen_port, config.family)?;
        let mut selector = Selector::new();
        selector.add_socket(&listener);
        Ok(Self {
            listener,
            selector,
            clients: Vec::new(),
            max_clients: config.max_clients as usize,
            max_packet_bytes: config.max_packet_bytes,
        })
    }

    /// The actual listening port (useful when configured as 0).
    pub fn local_port(&self) -> Option<u16> {
        self.listener.local_addr().map(|addr| addr.port())
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Wait once for readiness and service whatever became ready.
    ///
    /// `None` blocks indefinitely. Returns the selector's wait outcome;
    /// accepting, relaying, and disconnect cleanup all happen before it
    /// returns.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> WaitStatus {
        let status = self.selector.wait(timeout);
        if status != WaitStatus::Event {
            return status;
        }

        if self.selector.is_ready(&self.listener) {
            self.accept_client();
        }
        self.service_clients();
        status
    }

    fn accept_client(&mut self) {
        let (mut client, peer) = self.listener.accept_from();
        if !client.is_valid() {
            return;
        }
        if self.clients.len() >= self.max_clients {
            tracing::warn!(?peer, "client limit reached, refusing connection");
            client.disconnect();
            return;
        }
        client.set_max_packet_len(self.max_packet_bytes);
        self.selector.add_socket(&client);
        tracing::info!(?peer, clients = self.clients.len() + 1, "client connected");
        self.clients.push(client);
    }

    fn service_clients(&mut self) {
        // Gather first: relaying mutates other clients while we iterate.
        let mut inbound: Vec<(usize, Packet)> = Vec::new();
        let mut dead: Vec<usize> = Vec::new();

        for (index, client) in self.clients.iter_mut().enumerate() {
            if !self.selector.is_ready(&*client) {
                continue;
            }
            let mut packet = Packet::new();
            match client.recv_packet(&mut packet) {
                Status::Data(_) => inbound.push((index, packet)),
                Status::Block => {}
                Status::Close | Status::Error => dead.push(index),
            }
        }

        for (source, packet) in &inbound {
            for (index, client) in self.clients.iter_mut().enumerate() {
                if index == *source || dead.contains(&index) {
                    continue;
                }
                match client.send_packet(packet) {
                    Status::Data(_) | Status::Block => {}
                    Status::Close | Status::Error => dead.push(index),
                }
            }
        }

        dead.sort_unstable();
        dead.dedup();
        for index in dead.into_iter().rev() {
            let mut client = self.clients.remove(index);
            self.selector.remove_socket(&client);
            tracing::info!(
                peer = ?client.remote_addr(),
                clients = self.clients.len(),
                "client disconnected"
            );
            client.disconnect();
        }
    }
}
