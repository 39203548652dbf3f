/// Property-based tests for path templates and parameter coercion

use ferrous_mvc::binding::coerce;
use ferrous_mvc::routing::{join, normalize_request_path, PathPattern};
use ferrous_mvc::ParamType;
use proptest::prelude::*;
use serde_json::{json, Value};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

fn param_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

// Property: join always yields a normalized template
proptest! {
    #[test]
    fn join_is_normalized(prefix in "[a-z/]{0,12}", path in "[a-z/:]{0,12}") {
        let joined = join(&prefix, &path);
        prop_assert!(joined.starts_with('/'));
        prop_assert!(!joined.contains("//"));
        prop_assert!(joined == "/" || !joined.ends_with('/'));
        // Joining again is a no-op
        prop_assert_eq!(join("", &joined), joined.clone());
    }
}

// Property: normalizing strips at most one trailing separator and never empties a path
proptest! {
    #[test]
    fn normalize_request_path_strips_one_slash(path in "/[a-z/]{0,12}") {
        let normalized = normalize_request_path(&path);
        prop_assert!(!normalized.is_empty());
        prop_assert!(path.starts_with(normalized));
        prop_assert!(path.len() - normalized.len() <= 1);
    }
}

// Property: any value written by build is read back unchanged by matches
proptest! {
    #[test]
    fn build_then_match_recovers_values(
        literals in prop::collection::vec(segment(), 1..4),
        names in prop::collection::hash_set(param_name(), 1..4),
        values in prop::collection::vec("\\PC{1,12}", 4),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let mut template = String::new();
        for (i, literal) in literals.iter().enumerate() {
            template.push('/');
            template.push_str(literal);
            if let Some(name) = names.get(i) {
                template.push_str("/:");
                template.push_str(name);
            }
        }
        for name in names.iter().skip(literals.len()) {
            template.push_str("/:");
            template.push_str(name);
        }

        let pattern = PathPattern::parse(&template).unwrap();
        let params: Vec<(&str, &str)> = names
            .iter()
            .zip(&values)
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        let path = pattern.build(params.iter().copied()).unwrap();
        let matched = pattern.matches(&path).unwrap();
        prop_assert_eq!(matched.len(), names.len());
        for (name, value) in &params {
            prop_assert_eq!(matched[*name].as_str(), *value);
        }
    }
}

// Property: a literal template matches itself and nothing with an extra segment
proptest! {
    #[test]
    fn literal_templates_match_exactly(literals in prop::collection::vec(segment(), 0..4), extra in segment()) {
        let template = join("", &literals.join("/"));
        let pattern = PathPattern::parse(&template).unwrap();
        prop_assert!(pattern.is_literal());
        prop_assert!(pattern.matches(&template).is_some());
        prop_assert!(pattern.matches(&join(&template, &extra)).is_none());
    }
}

// Property: integers survive number coercion from their string form
proptest! {
    #[test]
    fn integer_strings_coerce_to_numbers(n in any::<i64>()) {
        prop_assert_eq!(coerce(&Value::String(n.to_string()), ParamType::Number), Some(json!(n)));
    }
}

// Property: boolean coercion is true only for the accepted spellings
proptest! {
    #[test]
    fn boolean_coercion_is_strict(raw in "\\PC{0,6}") {
        let expected = raw == "true" || raw == "1";
        prop_assert_eq!(
            coerce(&Value::String(raw.clone()), ParamType::Boolean),
            Some(Value::Bool(expected))
        );
    }
}

// Property: string coercion never loses the value
proptest! {
    #[test]
    fn string_coercion_is_identity(raw in "\\PC{0,16}") {
        prop_assert_eq!(coerce(&json!(raw.clone()), ParamType::String), Some(json!(raw)));
    }
}
