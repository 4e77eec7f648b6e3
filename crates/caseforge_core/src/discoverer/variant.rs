use crate::identity::UniqueIdGenerator;
use crate::metadata::TestMarker;
use crate::testcase::TestCase;

/// How each materialized case is turned into its final form(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseVariant {
    /// Cases are used as built.
    #[default]
    Standard,
    /// Each case is repeated once per culture on the marker.
    Cultured,
}

impl CaseVariant {
    /// Error cases are never expanded; there is nothing culture-specific about them.
    pub fn expand(self, cases: Vec<TestCase>, marker: &TestMarker) -> Vec<TestCase> {
        match self {
            CaseVariant::Standard => cases,
            CaseVariant::Cultured => {
                if marker.cultures.is_empty() {
                    return cases;
                }
                let mut expanded = Vec::with_capacity(cases.len() * marker.cultures.len());
                for case in cases {
                    if case.is_error() {
                        expanded.push(case);
                        continue;
                    }
                    for culture in &marker.cultures {
                        expanded.push(with_culture(&case, culture));
                    }
                }
                expanded
            }
        }
    }
}

fn with_culture(case: &TestCase, culture: &str) -> TestCase {
    let mut cultured = case.clone();
    cultured.details.display_name = format!("{}[{}]", case.details.display_name, culture);
    cultured.details.unique_id = UniqueIdGenerator::extend(&case.details.unique_id, culture);
    cultured.culture = Some(culture.to_string());
    cultured
}
