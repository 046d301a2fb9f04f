//! Socket utilities

use anyhow::Result;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

/// Pending connection queue for the scrape listener
pub const LISTEN_BACKLOG: i32 = 128;

/// Create a non-blocking TCP listener with address reuse enabled
///
/// Address reuse lets a restarted process rebind the scrape port while old
/// connections sit in TIME_WAIT.
pub fn create_tcp_listener(addr: SocketAddr) -> Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
