//! Property-based tests for manifest values and whole-manifest discovery
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use caseforge::cli::commands::{DiscoverArgs, discover_with_reporter};
use caseforge::cli::reporter::DiscoveryReporter;
use caseforge::core::metadata::TypeScope;
use caseforge::core::{TestCase, Value};
use caseforge::manifest::json_to_value;
use caseforge::{Manifest, WalkSummary, discover_assembly};
use proptest::prelude::*;

fn scope() -> TypeScope<'static> {
    TypeScope::new(&[], "Samples")
}

// =============================================================================
// Value Properties
// =============================================================================

proptest! {
    /// Property: Integers pick the narrowest of int and long
    #[test]
    fn integers_pick_narrowest_width(n in any::<i64>()) {
        let value = json_to_value(&serde_json::json!(n), &scope(), "prop").unwrap();
        match i32::try_from(n) {
            Ok(small) => prop_assert_eq!(value, Value::Int(small)),
            Err(_) => prop_assert_eq!(value, Value::Long(n)),
        }
    }

    /// Property: Strings survive conversion unchanged
    #[test]
    fn strings_are_preserved(s in ".*") {
        let value = json_to_value(&serde_json::json!(s.clone()), &scope(), "prop").unwrap();
        prop_assert_eq!(value, Value::Str(s));
    }
}

// =============================================================================
// Discovery Properties
// =============================================================================

fn theory_manifest(rows: &[Vec<i32>]) -> String {
    serde_json::json!({
        "assembly": "Prop",
        "classes": [{
            "name": "Prop.Tests",
            "methods": [{
                "name": "Check",
                "parameters": [{ "name": "a", "type": "int" }, { "name": "b", "type": "int" }],
                "markers": [{ "kind": "theory" }],
                "data": [{ "kind": "inline", "rows": rows }]
            }]
        }]
    })
    .to_string()
}

fn case_ids(text: &str) -> (Vec<String>, WalkSummary) {
    let assembly = Manifest::parse(text).unwrap().into_assembly(None).unwrap();
    let ctx = caseforge::core::DiscoveryContext::with_defaults(
        caseforge::core::DiscoveryOptions::default(),
        assembly.types.clone(),
    );
    let discovery = caseforge::core::Discovery::new(ctx, caseforge::core::DiscovererRegistry::builtin());
    let mut ids = Vec::new();
    let summary = discover_assembly(&assembly, &discovery, |case| {
        ids.push(case.unique_id().to_string());
        true
    });
    (ids, summary)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: Two-value rows bind without error, one case per row, distinct rows get distinct ids
    #[test]
    fn one_case_per_complete_row(rows in prop::collection::vec(prop::collection::vec(any::<i32>(), 2), 1..8)) {
        let (ids, summary) = case_ids(&theory_manifest(&rows));
        prop_assert_eq!(ids.len(), rows.len());
        prop_assert_eq!(summary.errors, 0);

        let mut distinct_rows = rows.clone();
        distinct_rows.sort();
        distinct_rows.dedup();
        let mut distinct_ids = ids.clone();
        distinct_ids.sort();
        distinct_ids.dedup();
        prop_assert_eq!(distinct_ids.len(), distinct_rows.len());
    }

    /// Property: Ids do not depend on how often the manifest is loaded
    #[test]
    fn ids_are_stable_across_loads(rows in prop::collection::vec(prop::collection::vec(any::<i32>(), 2), 1..4)) {
        let text = theory_manifest(&rows);
        prop_assert_eq!(case_ids(&text).0, case_ids(&text).0);
    }
}

// =============================================================================
// Reporter Properties
// =============================================================================

#[derive(Default)]
struct Counting {
    cases: usize,
    completed: bool,
}

impl DiscoveryReporter for Counting {
    fn on_test_case(&mut self, _case: &TestCase) {
        self.cases += 1;
    }

    fn on_discovery_complete(&mut self, _summary: &WalkSummary) {
        self.completed = true;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: The limit caps reported cases and the summary agrees
    #[test]
    fn limit_caps_reported_cases(limit in 1usize..30) {
        let args = DiscoverArgs {
            manifest: std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/manifests/samples.json"),
            limit: Some(limit),
            ..DiscoverArgs::default()
        };
        let mut reporter = Counting::default();
        let summary = discover_with_reporter(&args, &mut reporter).unwrap();
        prop_assert!(reporter.completed);
        prop_assert!(reporter.cases <= limit);
        prop_assert_eq!(reporter.cases, summary.test_cases);
    }
}
