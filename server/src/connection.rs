use crate::{
    error::{Error, Result},
    message::ToIrc,
};
use log::{debug, warn};
use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    sync::{
        Arc,
        mpsc::{self, Receiver, SyncSender, TrySendError},
    },
    thread,
};
use uuid::Uuid;

/// Send handle for one client connection.
///
/// Cloning is cheap and every clone writes to the same client, so the registry and any other
/// connection handler can hold one. Lines are queued to a writer thread owned by the connection,
/// which means `send` never waits on a slow peer. The queue holds at most `shared::OUTBOX_SIZE`
/// lines; a client that lets it fill up is disconnected.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: Uuid,
    pub address: SocketAddr,
    outbox: SyncSender<String>,
    socket: Option<Arc<TcpStream>>,
}

impl Connection {
    /// Start the writer thread for `stream` and return the send handle.
    ///
    /// The caller keeps `stream` for reading. If a write fails the socket is shut down in both
    /// directions, which ends the caller's blocked read and lets it clean up.
    pub fn open(stream: &TcpStream) -> io::Result<Self> {
        let address = stream.peer_addr()?;
        let writer = stream.try_clone()?;
        let socket = Arc::new(stream.try_clone()?);
        let (outbox, inbox) = mpsc::sync_channel(shared::OUTBOX_SIZE);
        let id = Uuid::new_v4();

        thread::Builder::new()
            .name(format!("writer-{address}"))
            .spawn(move || write_loop(writer, inbox, address))?;

        Ok(Connection {
            id,
            address,
            outbox,
            socket: Some(socket),
        })
    }

    /// Queue one protocol line for delivery.
    ///
    /// A full queue is a transport fault: the socket is shut down so the owning handler cleans up,
    /// and the line is dropped.
    pub fn send<T: ToIrc>(&self, message: &T) -> Result<()> {
        match self.outbox.try_send(message.to_irc()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Outbox for {} is full, disconnecting", self.address);
                if let Some(socket) = &self.socket {
                    let _ = socket.shutdown(Shutdown::Both);
                }
                Err(Error::Closed(self.id))
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::Closed(self.id)),
        }
    }

    /// A connection with no socket behind it. Everything sent to it lands in the returned receiver.
    #[cfg(test)]
    pub fn detached() -> (Self, Receiver<String>) {
        let (outbox, inbox) = mpsc::sync_channel(shared::OUTBOX_SIZE);
        let connection = Connection {
            id: Uuid::new_v4(),
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
            outbox,
            socket: None,
        };
        (connection, inbox)
    }
}

/// Drain the outbox onto the socket until every sender is gone or the peer stops accepting data.
fn write_loop(mut stream: TcpStream, inbox: Receiver<String>, address: SocketAddr) {
    for line in inbox {
        if let Err(e) = stream.write_all(line.as_bytes()) {
            warn!("Failed to write to {address}: {e}");
            // Wakes the reader so the handler deregisters this client
            let _ = stream.shutdown(Shutdown::Both);
            return;
        }
    }
    debug!("Writer for {address} finished");
}
