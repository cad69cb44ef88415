//! Advanced settings

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::registry::Registry;
use crate::Result;

/// Hook run against the registry right before it is sealed
pub type BeforeSealHook = Arc<dyn Fn(&Registry) -> Result<()> + Send + Sync>;

/// Settings rarely needed outside of tuning or validation
#[derive(Clone)]
pub struct AdvancedConfiguration {
    /// Allow later profiles to add member configuration to an existing pair
    pub allow_additive_type_map_creation: bool,

    /// Depth up to which nested maps are inlined into a plan
    pub max_execution_plan_depth: usize,

    /// Depth limit for self-referencing projections; 0 disables the limit
    pub recursive_queries_max_depth: usize,

    before_seal: Vec<BeforeSealHook>,
    extensions: BTreeMap<String, serde_json::Value>,
}

impl AdvancedConfiguration {
    pub fn new() -> Self {
        Self {
            allow_additive_type_map_creation: false,
            max_execution_plan_depth: 1,
            recursive_queries_max_depth: 0,
            before_seal: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Register a hook run by [`Registry::seal`]
    pub fn before_seal(
        &mut self,
        hook: impl Fn(&Registry) -> Result<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_seal.push(Arc::new(hook));
        self
    }

    pub fn before_seal_hooks(&self) -> &[BeforeSealHook] {
        &self.before_seal
    }

    /// Store a free-form setting for downstream components
    pub fn set_extension(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }

    pub fn extensions(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extensions
    }
}

impl Default for AdvancedConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdvancedConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedConfiguration")
            .field(
                "allow_additive_type_map_creation",
                &self.allow_additive_type_map_creation,
            )
            .field("max_execution_plan_depth", &self.max_execution_plan_depth)
            .field("recursive_queries_max_depth", &self.recursive_queries_max_depth)
            .field("before_seal", &self.before_seal.len())
            .field("extensions", &self.extensions)
            .finish()
    }
}
