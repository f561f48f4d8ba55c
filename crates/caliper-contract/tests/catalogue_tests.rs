use caliper_contract::{Applicability, Catalogue, CatalogueError, Check, Contract, Profile};
use caliper_probe::ProbeRegistry;

fn always_pass(_: &[caliper_probe::Outcome], _: &caliper_contract::CheckContext<'_>) -> Check {
    Check::new(true, "", "")
}

fn contract(id: &'static str, applicable: Applicability, group: Option<&'static str>) -> Contract {
    Contract {
        id,
        title: "test contract",
        applicable,
        variant_group: group,
        probes: &["entropy.single"],
        predicate: always_pass,
        failure_message: "expected {expected}, got {actual}",
    }
}

#[test]
fn test_builtin_catalogue_validates() {
    Catalogue::builtin()
        .validate(&ProbeRegistry::builtin())
        .unwrap();
}

#[test]
fn test_builtin_ids_are_stable() {
    let ids: Vec<_> = Catalogue::builtin().contracts().iter().map(|c| c.id).collect();
    assert_eq!(
        ids,
        vec![
            "clock.resolution",
            "clock.time",
            "fileopen.traversal.posix",
            "fileopen.traversal.capability",
            "truncate.grow-shrink",
            "entropy.single",
            "entropy.strided",
            "thread.guarded-flag",
            "argv.enumeration",
            "environ.enumeration",
        ]
    );
}

#[test]
fn test_exactly_one_traversal_variant_active_per_profile() {
    let catalogue = Catalogue::builtin();
    for profile in Profile::ALL {
        let active = catalogue.active(profile);
        assert_eq!(active.len(), 9);
        let variants: Vec<_> = active
            .iter()
            .filter(|c| c.variant_group == Some("fileopen.traversal"))
            .map(|c| c.id)
            .collect();
        assert_eq!(variants.len(), 1, "{profile}");
    }
    let posix = catalogue.active(Profile::Posix);
    assert!(posix.iter().any(|c| c.id == "fileopen.traversal.posix"));
    let sandboxed = catalogue.active(Profile::CapabilitySandboxed);
    assert!(sandboxed.iter().any(|c| c.id == "fileopen.traversal.capability"));
}

#[test]
fn test_active_preserves_catalogue_order() {
    let catalogue = Catalogue::builtin();
    let active = catalogue.active(Profile::CapabilitySandboxed);
    assert_eq!(active.first().unwrap().id, "clock.resolution");
    assert_eq!(active.last().unwrap().id, "environ.enumeration");
}

#[test]
fn test_unknown_probe_rejected() {
    let mut bad = contract("x", Applicability::Any, None);
    bad.probes = &["entropy.single", "entropy.missing"];
    let err = Catalogue::new(vec![bad])
        .validate(&ProbeRegistry::builtin())
        .unwrap_err();
    match err {
        CatalogueError::UnknownProbe { contract, probe } => {
            assert_eq!(contract, "x");
            assert_eq!(probe, "entropy.missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_id_rejected() {
    let catalogue = Catalogue::new(vec![
        contract("dup", Applicability::Any, None),
        contract("dup", Applicability::Any, None),
    ]);
    assert!(matches!(
        catalogue.validate(&ProbeRegistry::builtin()),
        Err(CatalogueError::DuplicateId(id)) if id == "dup"
    ));
}

#[test]
fn test_contract_without_probes_rejected() {
    let mut empty = contract("empty", Applicability::Any, None);
    empty.probes = &[];
    assert!(matches!(
        Catalogue::new(vec![empty]).validate(&ProbeRegistry::builtin()),
        Err(CatalogueError::NoProbes(_))
    ));
}

#[test]
fn test_variant_gap_rejected() {
    let catalogue = Catalogue::new(vec![contract("only-posix", Applicability::Posix, Some("g"))]);
    assert!(matches!(
        catalogue.validate(&ProbeRegistry::builtin()),
        Err(CatalogueError::VariantGap { profile: Profile::CapabilitySandboxed, .. })
    ));
}

#[test]
fn test_variant_overlap_rejected() {
    let catalogue = Catalogue::new(vec![
        contract("a", Applicability::Any, Some("g")),
        contract("b", Applicability::CapabilitySandboxed, Some("g")),
    ]);
    assert!(matches!(
        catalogue.validate(&ProbeRegistry::builtin()),
        Err(CatalogueError::VariantOverlap { count: 2, .. })
    ));
}

#[test]
fn test_failure_message_substitution() {
    let c = contract("x", Applicability::Any, None);
    let rendered = c.render_failure(&Check::new(false, "0", "1"));
    assert_eq!(rendered, "expected 0, got 1");
}
