use proptest::prelude::*;

use history_aggregator::codec::{decode, encode, set_param};
use history_aggregator::{Location, Role};

const PARAM: &str = "__sc";

fn arb_pathname() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9-]{1,8}", 1..4).prop_map(|parts| format!("/{}", parts.join("/")))
}

fn arb_search() -> impl Strategy<Value = String> {
    prop::collection::vec(("[a-z]{1,6}", "[a-zA-Z0-9]{0,6}"), 0..4).prop_map(|pairs| {
        let query: Vec<String> = pairs
            .into_iter()
            .filter(|(k, _)| k != PARAM)
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query.join("&"))
        }
    })
}

fn arb_hash() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z]{1,6}".prop_map(|h| format!("#{h}"))]
}

fn arb_location() -> impl Strategy<Value = Location> {
    (arb_pathname(), arb_search(), arb_hash()).prop_map(|(pathname, search, hash)| Location {
        pathname,
        search,
        hash,
        state: None,
    })
}

/// A secondary location, or the empty location meaning "none".
fn arb_secondary() -> impl Strategy<Value = Location> {
    prop_oneof![Just(Location::default()), arb_location()]
}

/// Full location with the secondary (if any) written as the last parameter,
/// the position the codec itself appends to.
fn arb_full() -> impl Strategy<Value = Location> {
    (arb_location(), arb_secondary()).prop_map(|(mut main, secondary)| {
        if !secondary.is_empty() {
            main.search = set_param(&main.search, PARAM, &secondary.path());
        }
        main
    })
}

proptest! {
    #[test]
    fn round_trip_main(full in arb_full()) {
        let partial = decode(&full, Role::Main, PARAM);
        prop_assert_eq!(encode(&partial, &full, Role::Main, PARAM), full);
    }

    #[test]
    fn round_trip_secondary(full in arb_full()) {
        let partial = decode(&full, Role::Secondary, PARAM);
        prop_assert_eq!(encode(&partial, &full, Role::Secondary, PARAM), full);
    }

    #[test]
    fn main_write_keeps_secondary(full in arb_full(), target in arb_location()) {
        let before = decode(&full, Role::Secondary, PARAM);
        let next = encode(&target, &full, Role::Main, PARAM);
        prop_assert_eq!(decode(&next, Role::Secondary, PARAM), before);
        prop_assert_eq!(decode(&next, Role::Main, PARAM), target);
    }

    #[test]
    fn secondary_write_keeps_main(full in arb_full(), target in arb_secondary()) {
        let before = decode(&full, Role::Main, PARAM);
        let next = encode(&target, &full, Role::Secondary, PARAM);
        prop_assert_eq!(&next.pathname, &full.pathname);
        prop_assert_eq!(&next.hash, &full.hash);
        prop_assert_eq!(decode(&next, Role::Main, PARAM), before);
        prop_assert_eq!(decode(&next, Role::Secondary, PARAM), target);
    }

    #[test]
    fn empty_secondary_leaves_no_parameter(full in arb_full()) {
        let next = encode(&Location::default(), &full, Role::Secondary, PARAM);
        let needle = format!("{PARAM}=");
        prop_assert!(!next.search.contains(&needle));
    }

    #[test]
    fn decode_never_panics_on_garbage(value in ".{0,40}") {
        let full = Location::new("/").with_search(set_param("", PARAM, &value));
        let _ = decode(&full, Role::Secondary, PARAM);
    }
}
