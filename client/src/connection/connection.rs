use std::{collections::VecDeque, net::SocketAddr};

use log::{debug, info, warn};

use snapwire_shared::{
    ApplicationId, ByteReader, ConnectHeader, ConnectionConfig, ConnectionId, DisconnectReason,
    Header, PacketKind, ReplicationError, StandardHeader, Timer, UsageError,
};

use super::io::Io;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Handshaking,
    Connected,
}

/// The client's side of the connection handshake & liveness tracking.
///
/// Update payloads received while connected are decoded and queued, to be
/// taken with [`receive_update`](Self::receive_update).
pub struct Connection {
    application_id: ApplicationId,
    config: ConnectionConfig,
    state: ConnectionState,
    connection_id: ConnectionId,
    server_addr: Option<SocketAddr>,
    io: Option<Io>,
    resend_timer: Timer,
    timeout_timer: Timer,
    incoming: VecDeque<Vec<u8>>,
}

impl Connection {
    pub fn new(application_id: ApplicationId, config: &ConnectionConfig) -> Self {
        Self {
            application_id,
            config: config.clone(),
            state: ConnectionState::Closed,
            connection_id: 0,
            server_addr: None,
            io: None,
            resend_timer: Timer::new(config.request_resend_interval, 0.0),
            timeout_timer: Timer::new(config.handshake_timeout, 0.0),
            incoming: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Starts connecting to `server_addr`
    pub fn open(&mut self, io: Io, server_addr: SocketAddr, now: f64) -> Result<(), UsageError> {
        if self.state != ConnectionState::Closed {
            return Err(UsageError::AlreadyOpen);
        }

        self.io = Some(io);
        self.server_addr = Some(server_addr);
        self.connection_id = 0;
        self.incoming.clear();
        self.state = ConnectionState::Connecting;
        self.resend_timer = Timer::new(self.config.request_resend_interval, now);
        self.timeout_timer = Timer::new(self.config.handshake_timeout, now);

        info!("connecting to {}", server_addr);
        self.send_connection_request();
        Ok(())
    }

    /// Drains the socket and runs the resend & timeout timers
    pub fn update(&mut self, now: f64) -> Result<(), ReplicationError> {
        if self.state == ConnectionState::Closed {
            self.drain();
            return Ok(());
        }

        while let Some((address, payload)) = self.io.as_mut().and_then(|io| io.receive()) {
            if Some(address) != self.server_addr {
                warn!("dropping packet from unknown address {}", address);
                continue;
            }
            if let Err(error) = self.process_packet(&payload, now) {
                self.state = ConnectionState::Closed;
                return Err(error);
            }
        }

        self.run_timers(now)
    }

    fn drain(&mut self) {
        if let Some(io) = self.io.as_mut() {
            while io.receive().is_some() {}
        }
    }

    fn process_packet(&mut self, payload: &[u8], now: f64) -> Result<(), ReplicationError> {
        let mut reader = ByteReader::new(payload);
        let header = match Header::read(&mut reader) {
            Ok(header) => header,
            Err(error) => {
                warn!("dropping unreadable packet: {}", error);
                return Ok(());
            }
        };
        if header.application_id() != self.application_id {
            warn!(
                "dropping packet for application {}, expected {}",
                header.application_id(),
                self.application_id
            );
            return Ok(());
        }

        match header {
            Header::Connect(header) => {
                if self.state == ConnectionState::Connecting && header.connection_id != 0 {
                    self.connection_id = header.connection_id;
                    self.state = ConnectionState::Handshaking;
                    self.resend_timer = Timer::new(self.config.handshake_resend_interval, now);
                    self.timeout_timer = Timer::new(self.config.handshake_timeout, now);
                    info!("received connection id {}, handshaking", self.connection_id);
                    self.send_kind(PacketKind::Handshake);
                }
            }
            Header::Standard(header) => {
                if self.state == ConnectionState::Connecting
                    || header.connection_id != self.connection_id
                {
                    debug!("dropping packet for connection {}", header.connection_id);
                    return Ok(());
                }

                match header.kind {
                    PacketKind::Disconnect => {
                        info!("server closed connection {}", self.connection_id);
                        return Err(DisconnectReason::RemoteClosed.into());
                    }
                    PacketKind::Update => {
                        if self.state == ConnectionState::Handshaking {
                            info!("connection {} established", self.connection_id);
                            self.state = ConnectionState::Connected;
                        }
                        self.timeout_timer = Timer::new(self.config.disconnection_timeout, now);
                        if let Some(io) = self.io.as_mut() {
                            let update = io.decode(reader.rest())?;
                            self.incoming.push_back(update);
                        }
                    }
                    PacketKind::Handshake => {
                        debug!("ignoring handshake packet sent to a client");
                    }
                }
            }
        }

        Ok(())
    }

    fn run_timers(&mut self, now: f64) -> Result<(), ReplicationError> {
        if self.timeout_timer.ringing(now) {
            let seconds = self.timeout_timer.elapsed(now);
            warn!("connection timed out after {:.1}s", seconds);
            self.state = ConnectionState::Closed;
            return Err(DisconnectReason::TimedOut { seconds }.into());
        }

        match self.state {
            ConnectionState::Connecting if self.resend_timer.ringing(now) => {
                self.resend_timer.reset(now);
                self.send_connection_request();
            }
            ConnectionState::Handshaking if self.resend_timer.ringing(now) => {
                self.resend_timer.reset(now);
                self.send_kind(PacketKind::Handshake);
            }
            _ => {}
        }

        Ok(())
    }

    /// Takes the next decoded update payload
    pub fn receive_update(&mut self) -> Option<Vec<u8>> {
        self.incoming.pop_front()
    }

    /// Sends an update payload to the server
    pub fn send_update(&mut self, payload: &[u8]) -> Result<(), ReplicationError> {
        if self.state != ConnectionState::Connected {
            return Err(UsageError::NotConnected.into());
        }
        let (Some(io), Some(address)) = (self.io.as_mut(), self.server_addr) else {
            return Err(UsageError::NotConnected.into());
        };
        let header =
            StandardHeader::new(self.application_id, self.connection_id, PacketKind::Update);
        io.send_packet(&address, &header.to_bytes(), payload)?;
        Ok(())
    }

    /// Closes the connection, telling the server when it knows about us
    pub fn close(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Handshaking | ConnectionState::Connected
        ) {
            info!("closing connection {}", self.connection_id);
            self.send_kind(PacketKind::Disconnect);
        }
        self.state = ConnectionState::Closed;
        self.incoming.clear();
    }

    fn send_connection_request(&mut self) {
        let request = ConnectHeader::new(self.application_id, 0).to_bytes();
        self.send_raw(&request);
    }

    fn send_kind(&mut self, kind: PacketKind) {
        let packet = StandardHeader::new(self.application_id, self.connection_id, kind).to_bytes();
        self.send_raw(&packet);
    }

    fn send_raw(&mut self, datagram: &[u8]) {
        if let (Some(io), Some(address)) = (self.io.as_mut(), self.server_addr) {
            io.send_raw(&address, datagram);
        }
    }
}
