// Drift-tolerant reads
//
// A read whose object vanished on the appliance is not an error when the
// caller already held an identifier for it: the identifier is cleared so
// the caller can plan a re-create. Present objects come back with their
// properties narrowed to the keys the caller declared.

use std::future::Future;

use ipam_api::entity::{
    Block, CnameRecord, Configuration, DhcpRange, ExternalHostRecord, GenericRecord, HostRecord,
    IpAddress, Network, SrvRecord, TxtRecord, View, Zone,
};
use ipam_api::properties::{self, PropertyMap};
use tracing::info;

use crate::error::CoreError;

/// Anything carrying an appliance property string.
pub trait PropertyBag {
    fn raw_properties(&self) -> &str;
}

macro_rules! property_bag {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PropertyBag for $ty {
                fn raw_properties(&self) -> &str {
                    &self.properties
                }
            }
        )+
    };
}

property_bag!(
    Configuration,
    View,
    Zone,
    Block,
    Network,
    IpAddress,
    DhcpRange,
    HostRecord,
    CnameRecord,
    TxtRecord,
    SrvRecord,
    GenericRecord,
    ExternalHostRecord,
);

/// A present object as read.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub entity: T,
    /// Server properties restricted to the caller's declared keys.
    pub properties: PropertyMap,
    /// Unfiltered property string.
    pub raw_properties: String,
}

/// Outcome of a drift-tolerant read.
#[derive(Debug, Clone)]
pub enum Observed<T> {
    Present(Snapshot<T>),
    /// The object is gone; the caller's identifier has been cleared.
    Drifted,
}

impl<T> Observed<T> {
    pub fn present(self) -> Option<Snapshot<T>> {
        match self {
            Self::Present(snapshot) => Some(snapshot),
            Self::Drifted => None,
        }
    }
}

/// Run `read`, treating not-found as drift when `identifier` is set.
///
/// Without a prior identifier, not-found is returned as an error.
pub async fn observe<T, F>(
    identifier: &mut Option<String>,
    declared_properties: &str,
    read: F,
) -> Result<Observed<T>, CoreError>
where
    T: PropertyBag,
    F: Future<Output = Result<T, CoreError>>,
{
    match read.await {
        Ok(entity) => {
            let raw = entity.raw_properties().to_owned();
            let filtered =
                properties::filter_by_keys(&properties::parse(&raw), &properties::parse(declared_properties));
            Ok(Observed::Present(Snapshot {
                entity,
                properties: filtered,
                raw_properties: raw,
            }))
        }
        Err(e) if e.is_not_found() => match identifier.take().filter(|id| !id.is_empty()) {
            Some(previous) => {
                info!(identifier = %previous, "object no longer exists, clearing identifier");
                Ok(Observed::Drifted)
            }
            None => Err(e),
        },
        Err(e) => Err(e),
    }
}
