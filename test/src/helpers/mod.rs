mod schema;
mod test_client;
mod test_network;
mod test_server;

pub use schema::*;
pub use test_client::TestClient;
pub use test_network::TestNetwork;
pub use test_server::TestServer;
