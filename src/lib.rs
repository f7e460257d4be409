pub mod am7p;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod device;
pub mod mqtt;
pub mod shutdown;
pub mod udp;
