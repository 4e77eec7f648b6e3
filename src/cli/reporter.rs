//! Discovery output.
//!
//! The discover command reports through the [`DiscoveryReporter`] trait, so output format is
//! independent of the walk. Console output is for people; JSON output is one object per line.

use std::io::Write;

use caseforge_core::{TestCase, TestCaseKind};
use serde_json::json;

use crate::walk::{TestAssembly, WalkSummary};

const ID_PREFIX_LEN: usize = 12;

/// Receives discovery events in walk order.
pub trait DiscoveryReporter {
    /// Called before the first test case of an assembly
    fn on_discovery_start(&mut self, _assembly: &TestAssembly) {}

    /// Called once per discovered test case
    fn on_test_case(&mut self, case: &TestCase);

    /// Called with collected diagnostics, if diagnostics were requested
    fn on_diagnostics(&mut self, _messages: &[String]) {}

    /// Called after the walk finished or was cancelled
    fn on_discovery_complete(&mut self, summary: &WalkSummary);
}

// ============================================================================
// Console
// ============================================================================

pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    /// One line: `display name [kind] id-prefix`, plus skip or error detail.
    pub fn render_test_case(&self, case: &TestCase) -> String {
        let kind = match &case.kind {
            TestCaseKind::Standard => self.paint("32", case.kind.label()),
            TestCaseKind::DelayEnumerated { .. } => self.paint("36", case.kind.label()),
            TestCaseKind::ExecutionError { .. } => self.paint("31", case.kind.label()),
        };
        let id: String = case.unique_id().chars().take(ID_PREFIX_LEN).collect();
        let mut line = format!("{} [{}] {}", case.display_name(), kind, id);
        if let Some(reason) = case.skip_reason() {
            line.push_str(&format!(" {}", self.paint("33", &format!("(skipped: {})", reason))));
        }
        if let Some(message) = case.error_message() {
            line.push_str(&format!("\n    {}", self.paint("31", message)));
        }
        line
    }

    pub fn render_summary(&self, summary: &WalkSummary) -> String {
        let mut parts = vec![format!("{} test cases", summary.test_cases)];
        if summary.errors > 0 {
            parts.push(self.paint("31", &format!("{} errors", summary.errors)));
        }
        parts.push(format!("{} methods", summary.methods));
        parts.push(format!("{} classes", summary.classes));
        let mut line = format!("====== {} ======", parts.join(", "));
        if summary.cancelled {
            line.push_str(" (stopped early)");
        }
        line
    }
}

impl<W: Write> DiscoveryReporter for ConsoleReporter<W> {
    fn on_discovery_start(&mut self, assembly: &TestAssembly) {
        let _ = writeln!(self.out, "Discovering {} ({})", assembly.name, assembly.path);
    }

    fn on_test_case(&mut self, case: &TestCase) {
        let line = self.render_test_case(case);
        let _ = writeln!(self.out, "{}", line);
    }

    fn on_diagnostics(&mut self, messages: &[String]) {
        for message in messages {
            let line = self.paint("33", &format!("diagnostic: {}", message));
            let _ = writeln!(self.out, "{}", line);
        }
    }

    fn on_discovery_complete(&mut self, summary: &WalkSummary) {
        let line = self.render_summary(summary);
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", line);
    }
}

// ============================================================================
// JSON lines
// ============================================================================

pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn test_case_json(case: &TestCase) -> serde_json::Value {
        json!({
            "type": "testCase",
            "displayName": case.display_name(),
            "uniqueId": case.unique_id(),
            "kind": case.kind.label(),
            "className": case.class_name,
            "methodName": case.method_name,
            "skipReason": case.skip_reason(),
            "explicit": case.details.explicit,
            "timeout": case.details.timeout,
            "traits": case.traits,
            "errorMessage": case.error_message(),
            "arguments": case.arguments.as_ref().map(|args| args.iter().map(|a| a.to_string()).collect::<Vec<_>>()),
            "genericTypes": case.generic_types.as_ref().map(|types| types.iter().map(|t| t.to_string()).collect::<Vec<_>>()),
            "culture": case.culture,
            "sourceLocation": case.details.source_location.as_ref().map(|l| l.to_string()),
        })
    }
}

impl<W: Write> DiscoveryReporter for JsonReporter<W> {
    fn on_test_case(&mut self, case: &TestCase) {
        let _ = writeln!(self.out, "{}", Self::test_case_json(case));
    }

    fn on_diagnostics(&mut self, messages: &[String]) {
        for message in messages {
            let _ = writeln!(self.out, "{}", json!({ "type": "diagnostic", "message": message }));
        }
    }

    fn on_discovery_complete(&mut self, summary: &WalkSummary) {
        let value = json!({
            "type": "summary",
            "classes": summary.classes,
            "methods": summary.methods,
            "testCases": summary.test_cases,
            "errors": summary.errors,
            "cancelled": summary.cancelled,
        });
        let _ = writeln!(self.out, "{}", value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use caseforge_core::TestCaseDetails;
    use std::collections::BTreeMap;

    fn case(kind: TestCaseKind, skip: Option<&str>) -> TestCase {
        TestCase {
            details: TestCaseDetails {
                display_name: "Samples.MathTests.Add(a: 1, b: 2)".into(),
                unique_id: "0123456789abcdef0123".into(),
                skip_reason: skip.map(str::to_string),
                explicit: false,
                timeout: 0,
                source_location: None,
            },
            kind,
            class_name: "Samples.MathTests".into(),
            method_name: "Add".into(),
            arguments: None,
            generic_types: None,
            traits: BTreeMap::new(),
            skip_unless: None,
            skip_when: None,
            culture: None,
        }
    }

    #[test]
    fn test_console_line_for_standard_case() {
        let reporter = ConsoleReporter::new(Vec::new(), false);
        insta::assert_snapshot!(
            reporter.render_test_case(&case(TestCaseKind::Standard, None)),
            @"Samples.MathTests.Add(a: 1, b: 2) [standard] 0123456789ab"
        );
    }

    #[test]
    fn test_console_line_for_skipped_and_error_cases() {
        let reporter = ConsoleReporter::new(Vec::new(), false);
        insta::assert_snapshot!(
            reporter.render_test_case(&case(TestCaseKind::Standard, Some("flaky"))),
            @"Samples.MathTests.Add(a: 1, b: 2) [standard] 0123456789ab (skipped: flaky)"
        );
        insta::assert_snapshot!(
            reporter.render_test_case(&case(TestCaseKind::ExecutionError { message: "No data found for Samples.MathTests.Add".into() }, None)),
            @r"
        Samples.MathTests.Add(a: 1, b: 2) [error] 0123456789ab
            No data found for Samples.MathTests.Add
        "
        );
    }

    #[test]
    fn test_console_summary() {
        let reporter = ConsoleReporter::new(Vec::new(), false);
        let summary = WalkSummary {
            classes: 2,
            methods: 3,
            test_cases: 5,
            errors: 1,
            cancelled: true,
        };
        insta::assert_snapshot!(
            reporter.render_summary(&summary),
            @"====== 5 test cases, 1 errors, 3 methods, 2 classes ====== (stopped early)"
        );
    }

    #[test]
    fn test_colors_wrap_kind() {
        let reporter = ConsoleReporter::new(Vec::new(), true);
        let line = reporter.render_test_case(&case(TestCaseKind::DelayEnumerated { skip_test_without_data: false }, None));
        assert!(line.contains("\x1b[36mdelay-enumerated\x1b[0m"));
    }

    #[test]
    fn test_json_reporter_writes_one_object_per_line() {
        let mut reporter = JsonReporter::new(Vec::new());
        reporter.on_test_case(&case(TestCaseKind::Standard, None));
        reporter.on_discovery_complete(&WalkSummary::default());
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "standard");
        assert_eq!(lines[0]["uniqueId"], "0123456789abcdef0123");
        assert_eq!(lines[1]["type"], "summary");
    }
}
