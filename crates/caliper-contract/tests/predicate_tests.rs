use caliper_contract::predicates;
use caliper_contract::{Catalogue, CheckContext, Expectations, Profile};
use caliper_probe::{Outcome, ProbeSettings, Value};
use caliper_rut::Errno;

fn check_ctx<'a>(settings: &'a ProbeSettings, expectations: &'a Expectations) -> CheckContext<'a> {
    CheckContext {
        profile: Profile::Posix,
        settings,
        expectations,
    }
}

fn denied(errno: Errno) -> Outcome {
    Outcome::failed("path_open", errno)
}

#[test]
fn test_traversal_requires_every_open_to_match_the_profile() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let all_noent = vec![denied(Errno::Noent), denied(Errno::Noent), denied(Errno::Noent)];
    assert!(predicates::traversal_not_found(&all_noent, &ctx).passed);
    assert!(!predicates::traversal_capability_denied(&all_noent, &ctx).passed);

    let all_notcap = vec![
        denied(Errno::Notcapable),
        denied(Errno::Perm),
        denied(Errno::Acces),
    ];
    assert!(predicates::traversal_capability_denied(&all_notcap, &ctx).passed);
}

#[test]
fn test_traversal_mix_fails_with_detail() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let mixed = vec![
        denied(Errno::Noent),
        denied(Errno::Notcapable),
        Outcome::ok().with_value(Value::UInt(3)),
    ];
    let check = predicates::traversal_not_found(&mixed, &ctx);
    assert!(!check.passed);
    assert_eq!(check.expected, "every open fails with NotFound");
    assert_eq!(
        check.actual,
        "[NotFound (ENOENT), CapabilityDenied (ENOTCAPABLE), opened]"
    );
}

#[test]
fn test_traversal_setup_failure_is_not_a_denial() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let outcomes = vec![
        denied(Errno::Noent),
        denied(Errno::Noent),
        Outcome::failed("setup:path_open", Errno::Noent),
    ];
    assert!(!predicates::traversal_not_found(&outcomes, &ctx).passed);
}

#[test]
fn test_truncate_predicate() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let good = Outcome::ok()
        .observe("size.initial", 0)
        .observe("cursor.initial", 0)
        .observe("size.grown", 500)
        .observe("cursor.grown", 0)
        .observe("size.shrunk", 300)
        .observe("cursor.shrunk", 0)
        .observe("read.len", 300)
        .observe("read.nonzero", 0);
    assert!(predicates::truncate_grow_shrink(&[good.clone()], &ctx).passed);

    let moved = good.clone().observe("cursor.grown", 500);
    let check = predicates::truncate_grow_shrink(&[moved], &ctx);
    assert!(!check.passed);
    assert!(check.actual.contains("cursors 0/500/0"));

    let dirty = good.observe("read.nonzero", 4);
    assert!(!predicates::truncate_grow_shrink(&[dirty], &ctx).passed);
}

#[test]
fn test_entropy_predicates() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let single = Outcome::ok().observe("len", 256).observe("nonzero", 250);
    assert!(predicates::entropy_single(&[single], &ctx).passed);
    let zeros = Outcome::ok().observe("len", 256).observe("nonzero", 0);
    assert!(!predicates::entropy_single(&[zeros], &ctx).passed);

    let strided = Outcome::ok()
        .observe("errno", 0)
        .observe("filled", 1024)
        .observe("nonzero", 1000);
    assert!(predicates::entropy_strided(&[strided], &ctx).passed);

    let short = Outcome::failed("random_get", Errno::Io)
        .observe("errno", 29)
        .observe("filled", 256)
        .observe("nonzero", 250);
    let check = predicates::entropy_strided(&[short], &ctx);
    assert!(!check.passed);
    assert!(check.actual.starts_with("filled 256/1024, error 29"));
}

#[test]
fn test_thread_predicate_rejects_early_flag() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let good = Outcome::ok()
        .observe("flag.initial", 0)
        .observe("flag.final", 1)
        .observe("flag.first_seen_ms", 1003);
    assert!(predicates::thread_guarded_flag(&[good], &ctx).passed);

    let early = Outcome::ok()
        .observe("flag.initial", 0)
        .observe("flag.final", 1)
        .observe("flag.first_seen_ms", 20);
    assert!(!predicates::thread_guarded_flag(&[early], &ctx).passed);

    let never = Outcome::ok().observe("flag.initial", 0).observe("flag.final", 0);
    let check = predicates::thread_guarded_flag(&[never], &ctx);
    assert!(!check.passed);
    assert!(check.actual.contains("first seen at never"));
}

fn mirror_outcome(entries: &[&str]) -> Outcome {
    let list: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    let buf: usize = list.iter().map(|s| s.len() + 1).sum();
    Outcome::ok()
        .observe("count", list.len() as u64)
        .observe("buf_size", buf as u64)
        .observe("reported.count", list.len() as u64)
        .observe("reported.buf_size", buf as u64)
        .observe("malformed", 0)
        .with_value(Value::Strings(list))
}

#[test]
fn test_argv_matches_expectation_exactly() {
    let settings = ProbeSettings::default();
    let expect = Expectations {
        args: Some(vec!["prog".into(), "a".into(), "b".into()]),
        environ: None,
    };
    let ctx = check_ctx(&settings, &expect);

    assert!(predicates::argv_enumeration(&[mirror_outcome(&["prog", "a", "b"])], &ctx).passed);
    assert!(!predicates::argv_enumeration(&[mirror_outcome(&["prog", "b", "a"])], &ctx).passed);
}

#[test]
fn test_environ_size_mismatch_fails() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let skewed = mirror_outcome(&["X=1"]).observe("reported.buf_size", 3);
    assert!(!predicates::environ_enumeration(&[skewed], &ctx).passed);

    let malformed = mirror_outcome(&["X=1", "Y"]).observe("malformed", 1);
    let check = predicates::environ_enumeration(&[malformed], &ctx);
    assert!(!check.passed);
    assert!(check.actual.contains("1 malformed"));
}

#[test]
fn test_clock_predicates() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);

    let res = Outcome::ok().observe("res.nanos", 1);
    assert!(predicates::clock_resolution(&[res.clone(), res], &ctx).passed);
    let broken = Outcome::failed("clock_res_get", Errno::Inval);
    assert!(!predicates::clock_resolution(&[broken], &ctx).passed);

    let forward = Outcome::ok()
        .observe("first.ms", 10)
        .observe("second.ms", 10)
        .observe("first.nanos", 10_000_000)
        .observe("second.nanos", 10_000_100);
    assert!(predicates::clock_time(&[forward], &ctx).passed);
    let backward = Outcome::ok()
        .observe("first.ms", 10)
        .observe("second.ms", 9)
        .observe("first.nanos", 10_000_000)
        .observe("second.nanos", 9_000_000);
    let check = predicates::clock_time(&[backward], &ctx);
    assert!(!check.passed);
    assert_eq!(check.actual, "10ms -> 9ms");
}

#[test]
fn test_rendered_failure_from_catalogue() {
    let settings = ProbeSettings::default();
    let expect = Expectations::default();
    let ctx = check_ctx(&settings, &expect);
    let catalogue = Catalogue::builtin();
    let contract = catalogue.get("fileopen.traversal.posix").unwrap();

    let outcomes = vec![
        denied(Errno::Notcapable),
        denied(Errno::Notcapable),
        denied(Errno::Notcapable),
    ];
    let check = contract.evaluate(&outcomes, &ctx);
    assert_eq!(
        contract.render_failure(&check),
        "traversal: expected every open fails with NotFound, got [CapabilityDenied (ENOTCAPABLE), CapabilityDenied (ENOTCAPABLE), CapabilityDenied (ENOTCAPABLE)]"
    );
}
