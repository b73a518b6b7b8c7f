// ── Route table ──
//
// Concurrent map of printer id -> published routes. Entries are swapped
// in whole; readers clone the `Arc` and release the shard lock before
// any proxying happens.

use std::sync::Arc;

use dashmap::DashMap;

use super::DeviceRoutes;
use crate::model::DeviceId;

#[derive(Default)]
pub struct RouteTable {
    routes: DashMap<DeviceId, Arc<DeviceRoutes>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fully built route set, replacing any previous one.
    pub fn publish(&self, routes: DeviceRoutes) {
        self.routes
            .insert(routes.device_id().clone(), Arc::new(routes));
    }

    pub fn get(&self, id: &DeviceId) -> Option<Arc<DeviceRoutes>> {
        self.routes.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &DeviceId) -> Option<Arc<DeviceRoutes>> {
        self.routes.remove(id).map(|(_, routes)| routes)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.routes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::DeviceConfig;

    fn routes(name: &str) -> DeviceRoutes {
        let config = DeviceConfig::new(name, "192.0.2.5", 7125);
        DeviceRoutes::build(&config, Vec::new(), &[]).unwrap()
    }

    #[test]
    fn publish_replaces_whole_entry() {
        let table = RouteTable::new();
        table.publish(routes("a"));
        let first = table.get(&DeviceId::for_endpoint("192.0.2.5", 7125)).unwrap();
        table.publish(routes("b"));
        let second = table.get(&DeviceId::for_endpoint("192.0.2.5", 7125)).unwrap();

        assert_eq!(table.len(), 1);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn held_routes_survive_removal() {
        let table = RouteTable::new();
        table.publish(routes("a"));
        let id = DeviceId::for_endpoint("192.0.2.5", 7125);
        let held = table.get(&id);

        table.remove(&id);
        assert!(!table.contains(&id));
        assert!(held.is_some());
    }
}
