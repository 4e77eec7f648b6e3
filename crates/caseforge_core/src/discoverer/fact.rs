use crate::discoverer::{CaseVariant, TestCaseDiscoverer};
use crate::discovery::DiscoveryContext;
use crate::materializer::CaseFactory;
use crate::metadata::TestMarker;
use crate::testcase::{TestCase, TestMethod};

/// Exactly one case for a parameterless, non-generic method.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactDiscoverer {
    variant: CaseVariant,
}

impl FactDiscoverer {
    pub fn new(variant: CaseVariant) -> Self {
        Self { variant }
    }
}

impl TestCaseDiscoverer for FactDiscoverer {
    fn discover(&self, ctx: &DiscoveryContext, method: &TestMethod, marker: &TestMarker) -> Vec<TestCase> {
        let factory = CaseFactory::new(ctx, method, marker);
        let descriptor = &method.descriptor;

        if !descriptor.parameters.is_empty() {
            return vec![factory.error(
                "[Fact] methods are not allowed to have parameters. Did you mean to use [Theory]?".to_string(),
                None,
            )];
        }
        if descriptor.is_generic() {
            return vec![factory.error("[Fact] methods are not allowed to be generic.".to_string(), None)];
        }

        self.variant.expand(vec![factory.standard()], marker)
    }
}
