//! Local object cache in front of a [`DeviceClient`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::kind::ObjectKind;
use crate::objects::{ConfigObject, DynamicIp};
use crate::scope::{Location, Scope};

/// Whether a mutation reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Live,
    /// Test mode: logged and skipped.
    DryRun,
}

type CacheKey = (Location, ObjectKind, String);

pub struct ConfigTree<'d, D: DeviceClient> {
    device: &'d mut D,
    cache: BTreeMap<CacheKey, ConfigObject>,
    test_mode: bool,
}

impl<'d, D: DeviceClient> ConfigTree<'d, D> {
    pub fn new(device: &'d mut D, test_mode: bool) -> Self {
        Self {
            device,
            cache: BTreeMap::new(),
            test_mode,
        }
    }

    pub fn device(&self) -> &D {
        &*self.device
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn find(&self, location: &Location, kind: ObjectKind, name: &str) -> Option<&ConfigObject> {
        self.cache.get(&(location.clone(), kind, name.to_string()))
    }

    pub fn add(&mut self, location: &Location, object: ConfigObject) {
        let key = (location.clone(), object.kind(), object.name().to_string());
        self.cache.insert(key, object);
    }

    /// Re-read one object from the device into the cache.
    pub fn refresh(
        &mut self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<&ConfigObject, DeviceError> {
        let key = (location.clone(), kind, name.to_string());
        match self.device.fetch(location, kind, name) {
            Ok(object) => Ok(match self.cache.entry(key) {
                Entry::Occupied(mut slot) => {
                    slot.insert(object);
                    slot.into_mut()
                }
                Entry::Vacant(slot) => slot.insert(object),
            }),
            Err(err) => {
                self.cache.remove(&key);
                Err(err)
            }
        }
    }

    /// The live state of an object, whether or not it was cached before.
    pub fn locate(
        &mut self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<ConfigObject, DeviceError> {
        if self.find(location, kind, name).is_none() {
            debug!(%location, %kind, name, "not cached, reading from device");
        }
        self.refresh(location, kind, name).cloned()
    }

    /// Merge push: fields the record carries overwrite, the rest stay live.
    pub fn create(&mut self, location: &Location, object: ConfigObject) -> Result<Push, DeviceError> {
        let push = if self.test_mode {
            info!(%location, kind = %object.kind(), name = object.name(), "TEST MODE - not creating");
            Push::DryRun
        } else {
            self.device.create(location, &object)?;
            Push::Live
        };
        self.add(location, object);
        Ok(push)
    }

    /// Overwrite push: the entry is replaced whole.
    pub fn apply(&mut self, location: &Location, object: ConfigObject) -> Result<Push, DeviceError> {
        let push = if self.test_mode {
            info!(%location, kind = %object.kind(), name = object.name(), "TEST MODE - not applying");
            Push::DryRun
        } else {
            self.device.apply(location, &object)?;
            Push::Live
        };
        self.add(location, object);
        Ok(push)
    }

    pub fn delete(
        &mut self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<Push, DeviceError> {
        self.cache.remove(&(location.clone(), kind, name.to_string()));
        if self.test_mode {
            info!(%location, %kind, name, "TEST MODE - not deleting");
            return Ok(Push::DryRun);
        }
        self.device.delete(location, kind, name)?;
        Ok(Push::Live)
    }

    /// Open a registration batch for `scope`; it is closed when the guard drops.
    pub fn ip_batch(&mut self, scope: &Scope) -> IpBatch<'_, 'd, D> {
        if !self.test_mode {
            self.device.batch_start();
        }
        IpBatch {
            tree: self,
            scope: scope.clone(),
            open: true,
        }
    }
}

/// Scoped dynamic-IP batch. `batch_end` runs on drop, including error paths.
pub struct IpBatch<'t, 'd, D: DeviceClient> {
    tree: &'t mut ConfigTree<'d, D>,
    scope: Scope,
    open: bool,
}

impl<D: DeviceClient> IpBatch<'_, '_, D> {
    pub fn register(&mut self, dip: &DynamicIp) -> Result<Push, DeviceError> {
        if self.tree.test_mode {
            info!(scope = %self.scope, dip = %dip, "TEST MODE - not registering");
            return Ok(Push::DryRun);
        }
        self.tree.device.register_ip(&self.scope, dip)?;
        Ok(Push::Live)
    }

    pub fn unregister(&mut self, dip: &DynamicIp) -> Result<Push, DeviceError> {
        if self.tree.test_mode {
            info!(scope = %self.scope, dip = %dip, "TEST MODE - not unregistering");
            return Ok(Push::DryRun);
        }
        self.tree.device.unregister_ip(&self.scope, dip)?;
        Ok(Push::Live)
    }

    /// Close the batch and report whether the device accepted it.
    pub fn finish(mut self) -> Result<(), DeviceError> {
        self.open = false;
        if self.tree.test_mode {
            return Ok(());
        }
        self.tree.device.batch_end()
    }
}

impl<D: DeviceClient> Drop for IpBatch<'_, '_, D> {
    fn drop(&mut self) {
        if !self.open || self.tree.test_mode {
            return;
        }
        if let Err(err) = self.tree.device.batch_end() {
            warn!(scope = %self.scope, error = %err, "failed to close registration batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Namespace;
    use crate::testing;

    fn vsys1() -> Scope {
        Scope::Vsys("vsys1".into())
    }

    fn blocked() -> DynamicIp {
        DynamicIp {
            ips: vec!["10.1.1.5".into()],
            tags: vec!["blocked".into()],
        }
    }

    fn registered<D: DeviceClient>(tree: &ConfigTree<'_, D>) -> bool {
        tree.device()
            .names(&vsys1(), Namespace::DynamicIp)
            .expect("names")
            .contains("10.1.1.5-blocked")
    }

    fn register_then_fail<D: DeviceClient>(tree: &mut ConfigTree<'_, D>) -> Result<(), DeviceError> {
        let mut batch = tree.ip_batch(&vsys1());
        batch.register(&blocked())?;
        Err(DeviceError::Rejected {
            name: "10.1.1.5".into(),
            reason: "later step failed".into(),
        })
    }

    #[test]
    fn dropped_batch_is_still_closed() {
        let mut device = testing::firewall();
        let mut tree = ConfigTree::new(&mut device, false);
        let mut batch = tree.ip_batch(&vsys1());
        assert_eq!(batch.register(&blocked()).expect("register"), Push::Live);
        drop(batch);
        assert!(registered(&tree));
    }

    #[test]
    fn error_exit_closes_the_batch() {
        let mut device = testing::firewall();
        let mut tree = ConfigTree::new(&mut device, false);
        assert!(register_then_fail(&mut tree).is_err());
        assert!(registered(&tree));
    }

    #[test]
    fn test_mode_batch_registers_nothing() {
        let mut device = testing::firewall();
        let mut tree = ConfigTree::new(&mut device, true);
        let mut batch = tree.ip_batch(&vsys1());
        assert_eq!(batch.register(&blocked()).expect("register"), Push::DryRun);
        batch.finish().expect("finish");
        assert!(!registered(&tree));
    }
}
