//! Annotation-driven profile synthesis

use objmap_meta::TypeDescriptor;
use tracing::debug;

use crate::profile::Profile;
use crate::{Error, Result, SYNTHETIC_PROFILE_NAME};

/// Builds the single synthetic profile of a discovery pass from auto-map
/// annotations
#[derive(Debug)]
pub struct AnnotationProfileSynthesizer {
    profile: Profile,
}

impl AnnotationProfileSynthesizer {
    pub fn new() -> Self {
        Self {
            profile: Profile::new(SYNTHETIC_PROFILE_NAME),
        }
    }

    /// Add the declaration implied by `descriptor`'s auto-map annotation.
    ///
    /// Returns `false` when the type carries no auto-map annotation. The
    /// annotation's blanket policy is applied first, then every override
    /// provider on every public instance member, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Introspection`] when the type's metadata cannot be
    /// loaded or its auto-map annotation is ambiguous.
    pub fn synthesize(&mut self, descriptor: &TypeDescriptor) -> Result<bool> {
        let auto_map = descriptor
            .auto_map()
            .map_err(|e| Error::introspection(descriptor.key(), e))?;
        let Some(auto_map) = auto_map else {
            return Ok(false);
        };

        let declaration = self
            .profile
            .create_map(auto_map.source.clone(), descriptor.key().clone());
        declaration.apply_policy(&auto_map.policy);

        for member in descriptor.public_instance_members() {
            for provider in member.overrides() {
                declaration.for_member(&member.name, |rule| {
                    rule.apply(provider);
                });
            }
        }

        debug!(
            "Synthesized declaration {} -> {} with {} member rules",
            declaration.source(),
            declaration.destination(),
            declaration.member_rules().len()
        );
        Ok(true)
    }

    /// The profile built so far
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn finish(self) -> Profile {
        self.profile
    }
}

impl Default for AnnotationProfileSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
