//! Integration test: manifest-described catalogs feeding a registry
//!
//! Loads a manifest from disk, runs discovery passes, and seals the result.

use objmap_config::{CatalogManifest, Error, Registry, SYNTHETIC_PROFILE_NAME, TypePair};
use objmap_meta::TypeKey;
use std::sync::Arc;

const CATALOG: &str = r"
modules:
  - name: crm
    types:
      - name: Contact
      - name: ContactProfile
        capabilities: [profile]
        profile:
          name: Contacts
          maps:
            - source: crm::Contact
              destination: crm::ContactSummary
      - name: ContactDto
        annotations:
          - kind: auto_map
            source: crm::Contact
            preserve_references: true
        members:
          - name: Email
            annotations:
              - op: null_substitute
                value: unknown@example.com
          - name: Secret
            annotations:
              - op: ignore
  - name: crm_legacy
    types:
      - name: LegacyContactDto
        load_error: assembly crm-legacy could not be loaded
      - name: FaxDto
        annotations:
          - kind: auto_map
            source: crm::Contact
          - kind: auto_map
            source: crm::Fax
";

fn registry() -> anyhow::Result<Registry> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("catalog.yml");
    std::fs::write(&path, CATALOG)?;

    let catalog = CatalogManifest::from_path(&path)?.into_catalog()?;
    Ok(Registry::with_catalog(Arc::new(catalog)))
}

#[test]
fn test_manifest_discovery_and_seal() -> anyhow::Result<()> {
    let mut registry = registry()?;
    registry.add_maps_by_name(["crm"])?;
    registry
        .root_mut()
        .create_map(TypeKey::new("crm", "Contact"), TypeKey::new("crm", "ContactRow"));

    let sealed = registry.seal()?;
    let names: Vec<&str> = sealed.all_profiles().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Root", "Contacts", SYNTHETIC_PROFILE_NAME]);

    let synthetic = &sealed.profiles()[1];
    let declaration = synthetic
        .declaration(&TypeKey::new("crm", "Contact"), &TypeKey::new("crm", "ContactDto"))
        .expect("annotated declaration");
    assert!(declaration.options().preserve_references);
    assert_eq!(
        declaration.member("Email").and_then(|rule| rule.null_value()),
        Some(&serde_json::json!("unknown@example.com"))
    );
    assert!(declaration.member("Secret").is_some_and(|rule| rule.is_ignored()));

    let pair = TypePair::new(TypeKey::new("crm", "Contact"), TypeKey::new("crm", "Contact"));
    assert_eq!(sealed.find_mapper(&pair).map(|m| m.name()), Some("assignable"));
    Ok(())
}

#[test]
fn test_unloadable_type_in_manifest_aborts_pass() -> anyhow::Result<()> {
    let mut registry = registry()?;
    registry.add_maps_by_name(["crm"])?;

    let err = registry
        .add_maps_by_name(["crm_legacy"])
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, Error::Introspection { ref type_key, .. } if type_key.name() == "LegacyContactDto"));
    assert_eq!(registry.profiles().len(), 2);
    Ok(())
}

#[test]
fn test_ambiguous_auto_map_in_manifest_aborts_pass() -> anyhow::Result<()> {
    let yaml = r"
modules:
  - name: fax
    types:
      - name: FaxDto
        annotations:
          - kind: auto_map
            source: crm::Contact
          - kind: auto_map
            source: crm::Fax
";
    let catalog = CatalogManifest::from_yaml(yaml)?.into_catalog()?;
    let mut registry = Registry::with_catalog(Arc::new(catalog));

    let err = registry.add_maps_by_name(["fax"]).map(|_| ()).unwrap_err();
    assert!(err.to_string().contains("2 auto-map annotations"));
    assert!(registry.profiles().is_empty());
    Ok(())
}
