//! Process-wide cache of model definitions.
//!
//! A typed model's definition is derived from its declaration the first time
//! it is needed and kept for the life of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::Result;
use crate::definition::ModelDefinition;
use crate::model::Model;
use crate::types::FieldType;

type Cache = RwLock<HashMap<TypeId, &'static ModelDefinition>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Get the definition of `M`, deriving it on first use.
///
/// Every call for the same type returns the same `'static` reference, from
/// any thread. Derivation failures are returned and not cached.
#[allow(clippy::result_large_err)]
pub fn definition_of<M: Model>() -> Result<&'static ModelDefinition> {
    let key = TypeId::of::<M>();

    // Fast path
    // Use unwrap_or_else to recover from poisoned lock (another thread panicked)
    {
        let cache = cache().read().unwrap_or_else(|e| e.into_inner());
        if let Some(def) = cache.get(&key) {
            return Ok(def);
        }
    }

    let mut cache = cache().write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have won the race while we waited for the lock.
    if let Some(def) = cache.get(&key) {
        return Ok(def);
    }

    let def = ModelDefinition::from_parts(M::MODEL_NAME, M::TABLE_NAME, M::config(), M::fields())?;
    let def: &'static ModelDefinition = Box::leak(Box::new(def));
    cache.insert(key, def);
    tracing::debug!(model = M::MODEL_NAME, fields = def.len(), "Registered model definition");
    Ok(def)
}

/// Declared `(name, type)` pairs of `M` in declaration order.
#[allow(clippy::result_large_err)]
pub fn descriptors<M: Model>() -> Result<Vec<(&'static str, FieldType)>> {
    Ok(definition_of::<M>()?.descriptors())
}
