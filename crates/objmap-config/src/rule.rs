//! Member override rules
//!
//! A rule collects the effects of every override provider attached to one
//! destination member. Providers that decide where the value comes from
//! replace each other; the last one applied wins.

use objmap_meta::{MemberOverride, TypeKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where a destination member's value comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberDisposition {
    /// Matched by naming convention
    #[default]
    Convention,
    Ignored,
    MapFrom {
        source_member: String,
    },
    ResolveUsing {
        resolver: TypeKey,
    },
    ConvertUsing {
        converter: TypeKey,
        source_member: Option<String>,
    },
}

/// Override configuration for one destination member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOverrideRule {
    member: String,
    #[serde(default)]
    disposition: MemberDisposition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    null_substitute: Option<serde_json::Value>,
    #[serde(default)]
    use_destination_value: bool,
    #[serde(default)]
    map_at_runtime: bool,
}

impl MemberOverrideRule {
    /// Rule with no effect yet
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            disposition: MemberDisposition::Convention,
            null_substitute: None,
            use_destination_value: false,
            map_at_runtime: false,
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn disposition(&self) -> &MemberDisposition {
        &self.disposition
    }

    pub fn is_ignored(&self) -> bool {
        self.disposition == MemberDisposition::Ignored
    }

    pub fn null_value(&self) -> Option<&serde_json::Value> {
        self.null_substitute.as_ref()
    }

    pub fn uses_destination_value(&self) -> bool {
        self.use_destination_value
    }

    pub fn is_mapped_at_runtime(&self) -> bool {
        self.map_at_runtime
    }

    pub fn ignore(&mut self) -> &mut Self {
        self.set_disposition(MemberDisposition::Ignored)
    }

    pub fn map_from(&mut self, source_member: impl Into<String>) -> &mut Self {
        self.set_disposition(MemberDisposition::MapFrom {
            source_member: source_member.into(),
        })
    }

    pub fn resolve_using(&mut self, resolver: TypeKey) -> &mut Self {
        self.set_disposition(MemberDisposition::ResolveUsing { resolver })
    }

    pub fn convert_using(&mut self, converter: TypeKey, source_member: Option<String>) -> &mut Self {
        self.set_disposition(MemberDisposition::ConvertUsing {
            converter,
            source_member,
        })
    }

    pub fn null_substitute(&mut self, value: serde_json::Value) -> &mut Self {
        self.null_substitute = Some(value);
        self
    }

    pub fn use_destination_value(&mut self) -> &mut Self {
        self.use_destination_value = true;
        self
    }

    pub fn map_at_runtime(&mut self) -> &mut Self {
        self.map_at_runtime = true;
        self
    }

    /// Apply one override provider's effect
    pub fn apply(&mut self, provider: &MemberOverride) -> &mut Self {
        match provider {
            MemberOverride::Ignore => self.ignore(),
            MemberOverride::MapFrom { source_member } => self.map_from(source_member.clone()),
            MemberOverride::ResolveUsing { resolver } => self.resolve_using(resolver.clone()),
            MemberOverride::ConvertUsing {
                converter,
                source_member,
            } => self.convert_using(converter.clone(), source_member.clone()),
            MemberOverride::NullSubstitute { value } => self.null_substitute(value.clone()),
            MemberOverride::UseExistingValue => self.use_destination_value(),
            MemberOverride::MapAtRuntime => self.map_at_runtime(),
        }
    }

    fn set_disposition(&mut self, disposition: MemberDisposition) -> &mut Self {
        if self.disposition != MemberDisposition::Convention && self.disposition != disposition {
            warn!(
                "Member '{}': {:?} replaces earlier {:?}",
                self.member, disposition, self.disposition
            );
        }
        self.disposition = disposition;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(to: &str) -> MemberOverride {
        MemberOverride::MapFrom {
            source_member: to.to_string(),
        }
    }

    #[test]
    fn test_new_rule_follows_convention() {
        let rule = MemberOverrideRule::new("Total");
        assert_eq!(rule.disposition(), &MemberDisposition::Convention);
        assert!(!rule.is_ignored());
        assert!(rule.null_value().is_none());
    }

    #[test]
    fn test_last_disposition_wins() {
        let mut both = MemberOverrideRule::new("Name");
        both.apply(&MemberOverride::Ignore).apply(&rename("x"));

        let mut rename_only = MemberOverrideRule::new("Name");
        rename_only.apply(&rename("x"));

        assert_eq!(both, rename_only);
        assert!(!both.is_ignored());
    }

    #[test]
    fn test_ignore_after_rename_ignores() {
        let mut rule = MemberOverrideRule::new("Name");
        rule.apply(&rename("x")).apply(&MemberOverride::Ignore);
        assert!(rule.is_ignored());
    }

    #[test]
    fn test_modifiers_combine_with_disposition() {
        let mut rule = MemberOverrideRule::new("Total");
        rule.apply(&MemberOverride::ResolveUsing {
            resolver: TypeKey::new("shop", "TotalResolver"),
        })
        .apply(&MemberOverride::NullSubstitute {
            value: serde_json::json!(0),
        })
        .apply(&MemberOverride::UseExistingValue)
        .apply(&MemberOverride::MapAtRuntime);

        assert_eq!(
            rule.disposition(),
            &MemberDisposition::ResolveUsing {
                resolver: TypeKey::new("shop", "TotalResolver")
            }
        );
        assert_eq!(rule.null_value(), Some(&serde_json::json!(0)));
        assert!(rule.uses_destination_value());
        assert!(rule.is_mapped_at_runtime());
    }

    #[test]
    fn test_convert_using_keeps_source_member() {
        let mut rule = MemberOverrideRule::new("PlacedAt");
        rule.apply(&MemberOverride::ConvertUsing {
            converter: TypeKey::new("shop", "EpochConverter"),
            source_member: Some("CreatedUnix".to_string()),
        });
        assert!(matches!(
            rule.disposition(),
            MemberDisposition::ConvertUsing { source_member: Some(name), .. } if name == "CreatedUnix"
        ));
    }
}
