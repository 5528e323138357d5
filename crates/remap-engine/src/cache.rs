//! The compiled-plan cache.
//!
//! Plans compile once per key and live for the mapper's lifetime; the only
//! eviction is a full [`clear`](PlanCache::clear). Compilation runs outside
//! the lock, so two threads racing on the same key may both compile; the
//! last write wins and both results are equivalent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use remap_config::ConfigurationSet;
use remap_model::TypeRegistry;
use tracing::debug;

use crate::error::MapError;
use crate::plan::{MapperKey, MappingPlan, compile_plan};

#[derive(Debug, Clone)]
enum PlanState {
    /// Compilation in flight on some thread.
    Resolving,
    Compiled(Arc<MappingPlan>),
    /// Compilation failed; the failure is cached and re-reported.
    Failed(String),
}

#[derive(Debug, Default)]
pub(crate) struct PlanCache {
    plans: RwLock<HashMap<MapperKey, PlanState>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &self,
        key: &MapperKey,
        config: &ConfigurationSet,
        types: &TypeRegistry,
    ) -> Result<Arc<MappingPlan>, MapError> {
        if let Some(state) = self
            .plans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
        {
            match state {
                PlanState::Compiled(plan) => return Ok(plan.clone()),
                PlanState::Failed(message) => return Err(self.failure(key, message.clone())),
                PlanState::Resolving => {}
            }
        }

        self.plans
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.clone())
            .or_insert(PlanState::Resolving);

        debug!(
            source = %key.source_type,
            target = %key.target_type,
            intent = ?key.intent,
            path = %key.target_path,
            "compiling mapping plan"
        );
        let result = compile_plan(key, config, types);

        let mut plans = self.plans.write().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(plan) => {
                let plan = Arc::new(plan);
                plans.insert(key.clone(), PlanState::Compiled(plan.clone()));
                Ok(plan)
            }
            Err(err) => {
                plans.insert(key.clone(), PlanState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn clear(&self) {
        self.plans
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of successfully compiled plans currently cached.
    pub fn compiled_count(&self) -> usize {
        self.plans
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|state| matches!(state, PlanState::Compiled(_)))
            .count()
    }

    fn failure(&self, key: &MapperKey, message: String) -> MapError {
        MapError::Compilation {
            source_type: key.source_type.as_str().to_string(),
            target_type: key.target_type.as_str().to_string(),
            message,
        }
    }
}
