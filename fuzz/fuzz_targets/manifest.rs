#![no_main]

use std::sync::Arc;

use caseforge::manifest::Manifest;
use caseforge::walk::discover_assembly;
use caseforge_core::{DefaultSerializer, DiscovererRegistry, Discovery, DiscoveryContext, DiscoveryOptions, NullDiagnostics};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Any manifest that loads must discover without panicking
    let Ok(manifest) = Manifest::parse(text) else {
        return;
    };
    let Ok(assembly) = manifest.into_assembly(None) else {
        return;
    };
    let ctx = DiscoveryContext::new(
        DiscoveryOptions::default(),
        Arc::clone(&assembly.types),
        Arc::new(DefaultSerializer),
        Arc::new(NullDiagnostics),
    );
    let discovery = Discovery::new(ctx, DiscovererRegistry::builtin());
    let _ = discover_assembly(&assembly, &discovery, |_| true);
});
