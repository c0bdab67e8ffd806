// Domain types owned by the core crate. Wire entities are re-exported from
// `ipam_api::entity` at the crate root.

mod mac;

pub use mac::MacAddress;
