#![no_main]

use ferrous_mvc::routing::{join, normalize_request_path, PathPattern};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // First line is the template, the rest is the request path.
    let (template, path) = text.split_once('\n').unwrap_or((text, "/"));

    let Ok(pattern) = PathPattern::parse(template) else {
        return;
    };
    assert_eq!(pattern.template(), join("", template));

    if let Some(params) = pattern.matches(normalize_request_path(path)) {
        assert_eq!(params.len(), pattern.params().count());
        // Rebuilding from the captured values must match again.
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        if let Ok(rebuilt) = pattern.build(pairs.iter().copied()) {
            assert!(pattern.matches(&rebuilt).is_some());
        }
    }
});
