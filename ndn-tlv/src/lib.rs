use log::info;

pub mod name;
pub mod packets;
pub mod signature;
pub mod tlv;
pub mod wire;

pub use name::*;
pub use packets::*;
pub use signature::*;
pub use tlv::*;
pub use wire::*;

pub fn init() {
    info!("NDN-TLV codec initialized");
}
