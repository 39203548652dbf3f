#![no_main]

use ferrous_mvc::binding::coerce;
use ferrous_mvc::ParamType;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let raw = Value::String(text.to_string());

    assert_eq!(coerce(&raw, ParamType::String), Some(raw.clone()));
    assert_eq!(coerce(&raw, ParamType::Any), Some(raw.clone()));

    match coerce(&raw, ParamType::Boolean) {
        Some(Value::Bool(b)) => assert_eq!(b, text == "true" || text == "1"),
        other => panic!("boolean coercion returned {:?}", other),
    }

    match coerce(&raw, ParamType::Number) {
        Some(Value::Number(n)) => assert!(n.as_f64().map_or(false, f64::is_finite)),
        Some(other) => panic!("number coercion returned {:?}", other),
        None => {}
    }

    assert!(coerce(&raw, ParamType::Json).is_some());
});
