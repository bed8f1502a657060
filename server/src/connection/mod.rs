pub mod connection;
pub mod handshake_manager;
pub mod io;
