//! Layering guardrails to keep the discovery core free of runner concerns.
//!
//! `caseforge_core` is the engine; manifests, config files, the async walk, and the CLI live in the
//! root crate. This test scans the core `Cargo.toml` and fails if a runner-side crate appears in its
//! `[dependencies]`.

const RUNNER_ONLY: &[&str] = &["tokio", "clap", "serde", "serde_json", "tracing-subscriber"];

fn dependency_names(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn core_does_not_depend_on_runner_crates() {
    let manifest = include_str!("../crates/caseforge_core/Cargo.toml");
    for name in dependency_names(manifest) {
        if RUNNER_ONLY.contains(&name.as_str()) {
            panic!("`{}` must not appear in caseforge_core [dependencies]; keep it in the root crate", name);
        }
    }
}

#[test]
fn dependency_scan_sees_core_stack() {
    let names = dependency_names(include_str!("../crates/caseforge_core/Cargo.toml"));
    assert!(names.iter().any(|n| n == "sha2"), "expected sha2 in {:?}", names);
}
