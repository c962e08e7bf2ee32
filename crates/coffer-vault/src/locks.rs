use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use coffer_core::VaultError;
use tokio::sync::RwLock;

/// Per-name read/write locks. Mutations take the write half, reads the
/// read half: at most one mutation per name is in flight, reads run
/// concurrently with each other, and a reader never interleaves with a
/// same-name mutation. Unrelated names never contend.
///
/// Lock entries live for the lifetime of the vault. Dropping one while a
/// late holder still owns a clone would let two mutations of the same name
/// run under different locks.
#[derive(Default)]
pub(crate) struct NameLocks {
    inner: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl NameLocks {
    pub(crate) fn for_name(&self, name: &str) -> Result<Arc<RwLock<()>>, VaultError> {
        let mut map = self.inner.lock().map_err(|err| VaultError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.entry(name.to_string()).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_yields_the_same_lock() {
        let locks = NameLocks::default();
        let first = locks.for_name("a").expect("lock");
        let second = locks.for_name("a").expect("lock");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn distinct_names_yield_distinct_locks() {
        let locks = NameLocks::default();
        let a = locks.for_name("a").expect("lock");
        let b = locks.for_name("b").expect("lock");
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
