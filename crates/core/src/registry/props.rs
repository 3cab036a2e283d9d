//! Property-based tests for registry transforms.
//!
//! - Referential integrity holds after any sequence of transforms
//! - Unregistering twice equals unregistering once
//! - The canonical currency of a numeric id is the lowest-weight entry

use proptest::prelude::*;

use super::{Registration, Registry};
use crate::currency::{CountryId, Currency, CurrencyId};

const CODES: [&str; 6] = ["AAA", "BBB", "CCC", "crypto/AAA", "crypto/DDD", "old/BBB"];
const COUNTRIES: [&str; 4] = ["AA", "BB", "CC", "DD"];

#[derive(Debug, Clone)]
enum Op {
    Register { code: usize, numeric: u32, weight: i32, update: bool, countries: Vec<usize> },
    Unregister(usize),
    SetWeight(usize, i32),
    ClearWeight(usize),
    AddCountries(usize, Vec<usize>),
    RemoveCountries(Vec<usize>),
    SetTraits(usize, Vec<String>),
}

fn currency(code: usize, numeric: u32, weight: i32) -> Currency {
    Currency::builder(CODES[code])
        .numeric(numeric)
        .scale(2)
        .build()
        .unwrap()
        .with_weight(weight)
}

fn id(code: usize) -> CurrencyId {
    CurrencyId::parse(CODES[code]).unwrap()
}

fn countries(indexes: &[usize]) -> Vec<CountryId> {
    indexes.iter().map(|i| CountryId::new(COUNTRIES[*i]).unwrap()).collect()
}

fn op() -> impl Strategy<Value = Op> {
    let code = 0..CODES.len();
    let country_list = prop::collection::vec(0..COUNTRIES.len(), 0..3);
    prop_oneof![
        (code.clone(), 1u32..4, -2i32..3, any::<bool>(), country_list.clone()).prop_map(
            |(code, numeric, weight, update, countries)| Op::Register { code, numeric, weight, update, countries }
        ),
        code.clone().prop_map(Op::Unregister),
        (code.clone(), -3i32..3).prop_map(|(c, w)| Op::SetWeight(c, w)),
        code.clone().prop_map(Op::ClearWeight),
        (code.clone(), country_list.clone()).prop_map(|(c, cs)| Op::AddCountries(c, cs)),
        country_list.prop_map(Op::RemoveCountries),
        (code, prop::collection::vec("[a-c]", 0..3)).prop_map(|(c, ts)| Op::SetTraits(c, ts)),
    ]
}

fn apply(registry: &Registry, op: &Op) -> Registry {
    let result = match op {
        Op::Register { code, numeric, weight, update, countries: cs } => registry.register(
            currency(*code, *numeric, *weight),
            Registration {
                countries: countries(cs),
                update: *update,
                ..Registration::default()
            },
        ),
        Op::Unregister(code) => Ok(registry.unregister(CODES[*code])),
        Op::SetWeight(code, weight) => registry.set_weight(&id(*code), *weight),
        Op::ClearWeight(code) => Ok(registry.clear_weight(&id(*code))),
        Op::AddCountries(code, cs) => registry.add_countries(&id(*code), &countries(cs)),
        Op::RemoveCountries(cs) => Ok(registry.remove_countries(&countries(cs))),
        Op::SetTraits(code, traits) => registry.set_traits(&id(*code), traits.iter().cloned()),
    };
    // Rejected transforms leave the registry as it was.
    result.unwrap_or_else(|_| registry.clone())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every index agrees with the primary map after any transform sequence.
    #[test]
    fn prop_transforms_keep_integrity(ops in prop::collection::vec(op(), 0..40)) {
        let mut registry = Registry::new();
        for op in &ops {
            registry = apply(&registry, op);
            let problems = registry.check_integrity();
            prop_assert!(problems.is_empty(), "after {:?}: {:?}", op, problems);
        }
    }

    /// Unregistering is idempotent.
    #[test]
    fn prop_unregister_idempotent(ops in prop::collection::vec(op(), 0..30), code in 0..CODES.len()) {
        let registry = ops.iter().fold(Registry::new(), |r, op| apply(&r, op));
        let once = registry.unregister_id(&id(code));
        let twice = once.unregister_id(&id(code));
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains(&id(code)));
    }

    /// The canonical entry of each numeric id has the lowest (weight, id).
    #[test]
    fn prop_canonical_is_minimum(ops in prop::collection::vec(op(), 0..40)) {
        let registry = ops.iter().fold(Registry::new(), |r, op| apply(&r, op));
        for numeric in 1u32..4 {
            let best = registry
                .currencies()
                .filter(|c| c.numeric() == Some(numeric))
                .min_by(|a, b| super::compare(a, b))
                .map(|c| c.id().clone());
            prop_assert_eq!(best, registry.canonical_for_numeric(numeric).map(|c| c.id().clone()));
        }
    }
}
