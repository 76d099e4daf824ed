//! Transfer engine and transfer port

mod broker;
mod connection;
mod engine;

pub use broker::EndpointBroker;
pub use connection::handle_transfer_connection;
pub use engine::{TransferError, pump_download, pump_upload};
