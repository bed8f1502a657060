use std::net::SocketAddr;

use snapwire_client::ClientConfig;
use snapwire_server::ServerConfig;
use snapwire_shared::{ApplicationId, AttributeId, ClassId, ClassRegistry, ObjectClass};

pub const APPLICATION_ID: ApplicationId = 0x5357;

/// Seconds between two server ticks
pub const TICK_INTERVAL: f64 = 0.05;

/// A moving unit: interpolated position, discrete health
pub const UNIT_CLASS: ClassId = 1;
pub const X: AttributeId = 0;
pub const Y: AttributeId = 1;
pub const HEALTH: AttributeId = 2;

/// A static marker with a single discrete byte
pub const MARKER_CLASS: ClassId = 2;
pub const KIND: AttributeId = 0;

pub fn registry() -> ClassRegistry {
    ClassRegistry::new()
        .with_class(
            ObjectClass::new(UNIT_CLASS)
                .with_attribute::<f32>()
                .with_attribute::<f32>()
                .with_discrete_attribute::<u16>(),
        )
        .and_then(|registry| {
            registry.with_class(ObjectClass::new(MARKER_CLASS).with_discrete_attribute::<u8>())
        })
        .expect("test schema registers")
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        application_id: APPLICATION_ID,
        ..ServerConfig::default()
    }
}

pub fn client_config() -> ClientConfig {
    ClientConfig {
        application_id: APPLICATION_ID,
        ..ClientConfig::default()
    }
}

pub fn server_address() -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 1], 7000))
}

pub fn client_address(index: usize) -> SocketAddr {
    SocketAddr::from(([10, 0, 1, 1], 9000 + index as u16))
}
