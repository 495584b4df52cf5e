use std::io;
use std::net::{
    IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket,
};
use std::thread;
use std::time::{Duration, Instant};

use super::config::NetConfig;
use super::error::NetError;
use super::protocol::{DEFAULT_PORT, Role};
use super::transport::{Connection, Transport};

/// Listens for exactly one joiner, then behaves like any other connection.
#[derive(Debug)]
pub struct Host {
    connection: Connection,
    local_addr: SocketAddr,
}

impl Host {
    pub fn start(config: &NetConfig) -> Result<Self, NetError> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).map_err(
            |source| NetError::Bind {
                port: config.port,
                source,
            },
        )?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let connection = Connection::new(Role::Host, config);
        let acceptor = connection.clone();
        let poll_interval = config.accept_poll_interval;

        thread::Builder::new()
            .name("tankduel-host".to_string())
            .spawn(move || {
                let Some((stream, addr)) = accept_one(&listener, &acceptor, poll_interval) else {
                    return;
                };
                drop(listener);

                log::info!("Peer connected from {}", addr);
                match acceptor.attach(&stream, addr) {
                    Ok(()) => acceptor.read_until_closed(stream),
                    Err(e) => log::warn!("Could not configure peer socket: {}", e),
                }
            })?;

        log::info!("Hosting on {}", local_addr);
        Ok(Self {
            connection,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn has_peer(&self) -> bool {
        self.connection.peer_addr().is_some()
    }

    pub fn wait_for_peer(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout && self.connection.is_running() {
            if self.has_peer() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        self.has_peer()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn into_connection(self) -> Connection {
        self.connection
    }

    pub fn stop(&self) {
        self.connection.stop();
    }
}

fn accept_one(
    listener: &TcpListener,
    connection: &Connection,
    poll_interval: Duration,
) -> Option<(TcpStream, SocketAddr)> {
    while connection.is_running() {
        match listener.accept() {
            Ok(accepted) => return Some(accepted),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(poll_interval),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("Accept failed: {}", e);
                return None;
            }
        }
    }
    None
}

/// Connects out to a waiting host.
#[derive(Debug)]
pub struct Joiner {
    connection: Connection,
    target: SocketAddr,
}

impl Joiner {
    pub fn connect(target: SocketAddr, config: &NetConfig) -> Result<Self, NetError> {
        log::info!("Connecting to {}", target);
        let stream = TcpStream::connect_timeout(&target, config.connect_timeout)
            .map_err(|source| NetError::ConnectFailed {
                addr: target,
                source,
            })?;

        let connection = Connection::new(Role::Joiner, config);
        connection.attach(&stream, target)?;
        connection.spawn_reader(stream)?;

        log::info!("Connected to {}", target);
        Ok(Self { connection, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn into_connection(self) -> Connection {
        self.connection
    }

    pub fn disconnect(&self) {
        self.connection.stop();
    }
}

/// Turns user-typed address fields into a target, falling back to
/// loopback and the default port for blank or unusable input.
pub fn parse_target(ip: &str, port: &str) -> SocketAddr {
    let port = port
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|&p| p != 0)
        .unwrap_or(DEFAULT_PORT);

    let host = ip.trim();
    if host.is_empty() {
        return SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return SocketAddr::new(ip, port);
    }

    match (host, port).to_socket_addrs() {
        Ok(mut addrs) => addrs.next(),
        Err(_) => None,
    }
    .unwrap_or_else(|| {
        log::warn!("Could not resolve {:?}, using loopback", host);
        SocketAddr::from((Ipv4Addr::LOCALHOST, port))
    })
}

/// LAN address a joiner should type in. No packet is sent.
pub fn advertised_ip() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
