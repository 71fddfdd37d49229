//! Process-wide map from connection identity to its one manager.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use tracing::debug;

use crate::config::DatabaseOptions;
use crate::database::Database;

type Instances = Mutex<HashMap<String, Arc<Database>>>;

static INSTANCES: LazyLock<Instances> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn instances() -> MutexGuard<'static, HashMap<String, Arc<Database>>> {
    // Nothing inside the critical section can leave the map half-updated.
    INSTANCES.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Get the manager registered for `options.identity()`, creating it on first use.
///
/// The lock covers only the check-and-create step. Once an identity is
/// registered, later options for it are ignored.
#[must_use]
pub fn instance(options: DatabaseOptions) -> Arc<Database> {
    let mut map = instances();
    if let Some(existing) = map.get(options.identity()) {
        debug!(identity = %options.identity(), "reusing registered manager; options ignored");
        return Arc::clone(existing);
    }
    let identity = options.identity().to_owned();
    let database = Arc::new(Database::new(options));
    map.insert(identity.clone(), Arc::clone(&database));
    debug!(%identity, "registered manager");
    database
}

/// The manager registered for `identity`, if any.
#[must_use]
pub fn lookup(identity: &str) -> Option<Arc<Database>> {
    instances().get(identity).cloned()
}

/// Unregister `identity` and close its connection.
///
/// Callers still holding the `Arc` keep a usable (disconnected) manager; the
/// next [`instance`] call for the identity builds a fresh one.
pub fn release(identity: &str) -> Option<Arc<Database>> {
    let removed = instances().remove(identity);
    if let Some(database) = &removed {
        database.disconnect();
        debug!(%identity, "released manager");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_options_win() {
        let id = "registry_unit_first_options_win.db";
        let first = instance(DatabaseOptions::new(id));
        let mut other = DatabaseOptions::new(id);
        other.wal = true;
        let second = instance(other);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.options().wal);
        assert!(release(id).is_some());
        assert!(lookup(id).is_none());
    }
}
