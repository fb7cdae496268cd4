use adcluster::taxonomy::{Taxonomy, TriggerRule};
use adcluster::ClusterError;

fn rule(label: &str, triggers: &[&str]) -> TriggerRule {
    TriggerRule {
        label: label.to_string(),
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
    }
}

#[test]
fn first_match_honors_priority_order() {
    let tax = Taxonomy::new(vec![
        rule("job", &["hiring", "jobs"]),
        rule("academic", &["course", "jobs"]),
    ])
    .unwrap();
    // "jobs" triggers both categories; the first in table order wins
    let m = tax.first_match("netflix jobs").unwrap();
    assert_eq!(m.label, "job");
    assert_eq!(m.trigger, "jobs");
}

#[test]
fn trigger_matches_as_substring() {
    let tax = Taxonomy::new(vec![rule("job", &["hiring"])]).unwrap();
    assert!(tax.first_match("netflix hiring jobs").is_some());
    // substring semantics: "job" is contained in "jobs"
    let tax = Taxonomy::new(vec![rule("job", &["job"])]).unwrap();
    assert!(tax.first_match("netflix jobs").is_some());
}

#[test]
fn phrase_triggers_match_across_spaces() {
    let tax = Taxonomy::new(vec![rule("Login", &["sign in"])]).unwrap();
    assert!(tax.first_match("netflix sign in").is_some());
    assert!(tax.first_match("netflix signup").is_none());
}

#[test]
fn triggers_are_normalized_at_construction() {
    // "Sign-In" normalizes to "sign in" and matches normalized keyword text
    let tax = Taxonomy::new(vec![rule("Login", &["Sign-In"])]).unwrap();
    assert!(tax.first_match("netflix sign in now").is_some());
}

#[test]
fn no_match_returns_none() {
    let tax = Taxonomy::new(vec![rule("Login", &["login"])]).unwrap();
    assert!(tax.first_match("buy movie tickets").is_none());
}

#[test]
fn empty_taxonomy_matches_nothing() {
    let tax = Taxonomy::new(vec![]).unwrap();
    assert!(tax.is_empty());
    assert!(tax.first_match("anything").is_none());
}

#[test]
fn rejects_empty_label() {
    let err = Taxonomy::new(vec![rule("  ", &["x"])]).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
}

#[test]
fn rejects_duplicate_label() {
    let err = Taxonomy::new(vec![rule("job", &["a"]), rule("job", &["b"])]).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn rejects_rule_without_triggers() {
    let err = Taxonomy::new(vec![rule("job", &[])]).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
}

#[test]
fn rejects_punctuation_only_trigger() {
    let err = Taxonomy::new(vec![rule("job", &["!!!"])]).unwrap_err();
    assert!(matches!(err, ClusterError::Configuration(_)));
}

#[test]
fn taxonomy_deserializes_and_validates() {
    let json = r#"[{"label": "Login", "triggers": ["login", "sign in"]}]"#;
    let tax: Taxonomy = serde_json::from_str(json).unwrap();
    assert_eq!(tax.len(), 1);
    assert!(tax.contains_label("Login"));

    let bad = r#"[{"label": "", "triggers": ["login"]}]"#;
    assert!(serde_json::from_str::<Taxonomy>(bad).is_err());
}
