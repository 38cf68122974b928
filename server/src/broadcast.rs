use crate::{
    message::ToIrc,
    registry::{Registry, Scope},
};
use log::warn;
use uuid::Uuid;

/// Send `message` to every connection `scope` reaches except `exclude`.
///
/// A recipient that can't be reached doesn't stop delivery to the rest. Its socket is already
/// shut down by then, so its own handler will deregister it.
pub fn broadcast<T: ToIrc>(
    registry: &Registry,
    message: &T,
    scope: &Scope,
    exclude: Option<Uuid>,
) {
    for connection in registry.recipients(scope, exclude) {
        if let Err(e) = connection.send(message) {
            warn!("Dropped message for {}: {e}", connection.address);
        }
    }
}
