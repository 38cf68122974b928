use crate::{
    broadcast::broadcast,
    config::Config,
    connection::Connection,
    dispatch::dispatch,
    error::Result,
    message::{Command, Message, ReplyCode, Response},
    registry::{Registry, Scope},
};
use log::{debug, info, warn};
use std::{
    io::{self, BufRead, BufReader, Read},
    net::{TcpListener, TcpStream},
    sync::Arc,
    thread,
};

/// Accepts clients and runs one handler thread per connection, all sharing a single registry.
pub struct Server {
    config: Config,
    registry: Arc<Registry>,
    server_name: Arc<str>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let server_name = Arc::from(config.server_name.as_str());
        Server {
            config,
            registry: Arc::new(Registry::new()),
            server_name,
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.config.address())
    }

    /// Accept connections forever. A failed accept is logged and skipped.
    pub fn serve(&self, listener: TcpListener) {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to accept connection: {e}");
                    continue;
                }
            };
            let registry = self.registry.clone();
            let server_name = self.server_name.clone();

            thread::spawn(move || handle_connection(stream, registry, server_name));
        }
    }
}

/// Per-connection state. Dropping it deregisters the nickname and tells every channel it was in,
/// so cleanup runs exactly once however the read loop ends.
pub struct Session {
    pub connection: Connection,
    pub nick: Option<String>,
    pub registry: Arc<Registry>,
    server_name: Arc<str>,
}

impl Session {
    /// Send a numbered reply addressed to this client, or to `*` before it has a nickname.
    pub fn reply(&self, code: ReplyCode, params: &[&str], text: &str) -> Result<()> {
        let target = self.nick.as_deref().unwrap_or("*");
        let params = std::iter::once(target)
            .chain(params.iter().copied())
            .collect::<Vec<_>>();
        let response = Response::new(&self.server_name, code, &params, text);
        self.connection.send(&response)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let address = self.connection.address;
        let Some(nick) = self.nick.take() else {
            info!("Connection from {address} closed.");
            return;
        };

        let departed = self.registry.deregister(&nick);
        for channel in &departed {
            let notice = Message::new(&nick, Command::Part, &[channel], Some("Connection closed"));
            broadcast(
                &self.registry,
                &notice,
                &Scope::Channel(channel.clone()),
                None,
            );
        }
        info!(
            "User '{nick}' ({address}) disconnected, left {} channel(s). {} users remain.",
            departed.len(),
            self.registry.nick_count()
        );
    }
}

pub fn handle_connection(stream: TcpStream, registry: Arc<Registry>, server_name: Arc<str>) {
    let connection = match Connection::open(&stream) {
        Ok(connection) => connection,
        Err(e) => {
            warn!("Failed to set up connection: {e}");
            return;
        }
    };
    let address = connection.address;
    info!(
        "New connection from {address}. {} registered users.",
        registry.nick_count()
    );

    let mut session = Session {
        connection,
        nick: None,
        registry,
        server_name,
    };
    let mut reader = BufReader::new(stream);

    match serve_lines(&mut session, &mut reader) {
        Ok(()) => debug!("{address} closed the stream"),
        Err(e) => warn!("Dropping {address}: {e}"),
    }
}

/// Handle lines until the stream ends. A failed read or a failed send to this client ends the
/// loop with an error.
fn serve_lines<R: BufRead>(session: &mut Session, reader: &mut R) -> Result<()> {
    // Wait for a line from the client
    while let Some(line) = next_line(reader)? {
        handle_line(session, &line)?;
    }
    Ok(())
}

/// Answer keep-alives directly and hand everything else to the dispatcher.
fn handle_line(session: &mut Session, line: &str) -> Result<()> {
    debug!("Raw Message: {line:?}");

    if let Some(token) = line.strip_prefix("PING") {
        return session.connection.send(&format!("PONG{token}"));
    }
    if line.starts_with("PONG") {
        return Ok(());
    }

    match Message::parse(line) {
        Some(message) => dispatch(session, message),
        None => Ok(()),
    }
}

/// Read one line without its line ending. Return `None` at end of stream.
///
/// Lines longer than `shared::MESSAGE_SIZE` are cut off there and the rest of the line is
/// discarded. Invalid UTF-8 is replaced rather than rejected.
fn next_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut raw = Vec::new();
    let read = reader
        .by_ref()
        .take(shared::MESSAGE_SIZE as u64)
        .read_until(b'\n', &mut raw)?;
    if read == 0 {
        return Ok(None);
    }
    if read == shared::MESSAGE_SIZE && raw.last() != Some(&b'\n') {
        reader.skip_until(b'\n')?;
    }

    let line = String::from_utf8_lossy(&raw);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
