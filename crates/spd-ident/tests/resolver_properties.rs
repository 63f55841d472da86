use proptest::prelude::*;
use spd_ident::{parse_identifier, IdentifierResolver};
use std::collections::BTreeSet;

fn slug() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}"
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(
        system in slug(),
        kind in slug(),
        name in slug(),
    ) {
        let systems: BTreeSet<String> = [system.clone()].into_iter().collect();
        let raw = format!("spd-{system}-{kind}-{name}");

        let first = parse_identifier(&raw, &kind, &systems, None, None);
        let second = parse_identifier(&raw, &kind, &systems, None, None);
        prop_assert_eq!(&first, &second);

        let parsed = first.unwrap();
        prop_assert_eq!(parsed.system, system);
        prop_assert_eq!(parsed.slug, name);
        prop_assert!(parsed.prefix_id.is_none());
    }

    #[test]
    fn prop_longest_registered_system_wins(
        base in slug(),
        suffix in slug(),
        name in slug(),
    ) {
        let long = format!("{base}-{suffix}");
        let resolver = IdentifierResolver::new([base.clone(), long.clone()], None::<Vec<String>>);
        let raw = format!("spd-{long}-spec-{name}");

        let parsed = resolver.resolve(&raw, "spec", None);
        prop_assert!(parsed.is_some());
        prop_assert_eq!(parsed.unwrap().system, long);
    }

    #[test]
    fn prop_composite_parent_is_prefix(
        parent_slug in slug(),
        child_slug in slug(),
    ) {
        prop_assume!(parent_slug != "algo" && child_slug != "algo");
        let systems: BTreeSet<String> = ["app".to_string()].into_iter().collect();
        let raw = format!("spd-app-spec-{parent_slug}-algo-{child_slug}");
        let always: &dyn Fn(&str) -> bool = &|_| true;

        let parsed = parse_identifier(&raw, "algo", &systems, None, Some(always)).unwrap();
        let parent = parsed.prefix_id.clone().unwrap();
        prop_assert!(raw.starts_with(&parent));
        prop_assert_eq!(parent, format!("spd-app-spec-{parent_slug}"));
        prop_assert_eq!(parsed.to_string(), raw);
    }
}

#[test]
fn parent_gate_sees_parent_identifier() {
    let systems: BTreeSet<String> = ["app".to_string()].into_iter().collect();
    let seen = std::cell::RefCell::new(Vec::new());
    let record: &dyn Fn(&str) -> bool = &|id| {
        seen.borrow_mut().push(id.to_string());
        true
    };

    let parsed = parse_identifier("spd-app-spec-auth-algo-hash", "algo", &systems, None, Some(record));
    assert!(parsed.is_some());
    assert_eq!(seen.borrow().as_slice(), ["spd-app-spec-auth".to_string()]);
}
