//! Server network layer: UDP transport around the request dispatcher

use crate::dispatch::{Dispatch, Dispatcher};
use log::{debug, error, info, warn};
use shared::Message;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Largest payload a single UDP datagram can carry
pub const MAX_DATAGRAM: usize = 65_507;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    DatagramReceived { text: String, addr: SocketAddr },
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    Send { message: Message, addr: SocketAddr },
}

/// Decodes a datagram as text, replacing invalid UTF-8.
pub fn decode_datagram(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Main server owning the socket and the single game.
pub struct Server {
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher,
}

impl Server {
    pub async fn new(addr: &str, dispatcher: Dispatcher) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        Ok(Server { socket, dispatcher })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Spawns task that continuously listens for incoming datagrams
    fn spawn_network_receiver(
        &self,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let text = decode_datagram(&buffer[..len]);
                        if let Err(e) = server_tx.send(ServerMessage::DatagramReceived { text, addr })
                        {
                            error!("Failed to send datagram to main loop: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        // ICMP port-unreachable from a vanished client shows
                        // up here on some platforms
                        warn!("Error receiving datagram: {}", e);
                    }
                }
            }
        })
    }

    /// Spawns task that drains the outgoing message queue
    fn spawn_network_sender(
        &self,
        mut game_rx: mpsc::UnboundedReceiver<GameMessage>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(GameMessage::Send { message, addr }) = game_rx.recv().await {
                let text = message.to_string();
                if let Err(e) = socket.send_to(text.as_bytes(), addr).await {
                    error!("Failed to send to {}: {}", addr, e);
                }
            }
        })
    }

    fn queue(game_tx: &mpsc::UnboundedSender<GameMessage>, dispatch: Dispatch) {
        for out in dispatch.outbox {
            if let Err(e) = game_tx.send(GameMessage::Send {
                message: out.message,
                addr: out.addr,
            }) {
                error!("Failed to queue message for sending: {}", e);
            }
        }
    }

    /// Serves requests until the last nugget is collected.
    ///
    /// Outgoing messages already queued when the game ends are flushed
    /// before this returns.
    pub async fn run(&mut self) -> io::Result<()> {
        let (server_tx, mut server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        let receiver = self.spawn_network_receiver(server_tx);
        let sender = self.spawn_network_sender(game_rx);

        info!("Server started successfully");

        while let Some(ServerMessage::DatagramReceived { text, addr }) = server_rx.recv().await {
            debug!("{} -> {:?}", addr, text);
            let dispatch = self.dispatcher.handle(addr, &text);
            let game_over = dispatch.game_over;
            Self::queue(&game_tx, dispatch);

            if game_over {
                info!("Game over, shutting down");
                break;
            }
        }

        receiver.abort();
        drop(game_tx);
        if let Err(e) = sender.await {
            error!("Sender task failed: {}", e);
        }
        Ok(())
    }
}
