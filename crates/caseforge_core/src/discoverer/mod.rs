//! Discoverers: one algorithm per marker family, parameterized by a [`CaseVariant`].

mod fact;
mod theory;
mod variant;

pub use fact::FactDiscoverer;
pub use theory::{TheoryDiscoverer, TheoryOutcome};
pub use variant::CaseVariant;

use crate::discovery::DiscoveryContext;
use crate::metadata::TestMarker;
use crate::testcase::{TestCase, TestMethod};

/// Turns one marked method into its test cases.
pub trait TestCaseDiscoverer: Send + Sync {
    fn discover(&self, ctx: &DiscoveryContext, method: &TestMethod, marker: &TestMarker) -> Vec<TestCase>;
}
