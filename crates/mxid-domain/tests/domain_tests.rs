use chrono::{TimeZone, Utc};
use mxid_domain::{Account, DomainError, HistoricalInvite, PolicyObject, TermObject, ThreePid, ThreePidInvite, ThreePidSession};
use std::collections::BTreeMap;

fn invite() -> ThreePidInvite {
    let mut properties = BTreeMap::new();
    properties.insert("display_name".to_string(), "a...@example.org".to_string());
    ThreePidInvite { id: "inv1".into(),
                     room_id: "!room:example.org".into(),
                     sender: "@bob:example.org".into(),
                     medium: "email".into(),
                     address: "alice@example.org".into(),
                     token: "tok".into(),
                     properties }
}

#[test]
fn test_threepid_rejects_blank_parts() {
    assert!(matches!(ThreePid::new("", "a@b.c"), Err(DomainError::ValidationError(_))));
    assert!(matches!(ThreePid::new("email", "  "), Err(DomainError::ValidationError(_))));
    let tpid = ThreePid::new("email", "a@b.c").unwrap();
    assert_eq!(tpid.to_string(), "email:a@b.c");
}

#[test]
fn test_historical_invite_copies_fields() {
    let inv = invite();
    let at = Utc.timestamp_opt(1_600_000_000, 987_654_321).unwrap();
    let h = HistoricalInvite::from_invite(&inv, "@alice:example.org", at, true);
    assert_eq!(h.room_id, inv.room_id);
    assert_eq!(h.properties, inv.properties);
    assert_eq!(h.resolved_to, "@alice:example.org");
    // precisión de milisegundos
    assert_eq!(h.resolved_at.timestamp_subsec_nanos(), 987_000_000);
    assert!(h.could_publish);
}

#[test]
fn test_session_validation_and_attempts() {
    let mut s = ThreePidSession { id: "sid".into(),
                                  server: "example.org".into(),
                                  three_pid: ThreePid::new("email", "a@b.c").unwrap(),
                                  secret: "s3cr3t".into(),
                                  attempt: 1,
                                  next_link: None,
                                  token: "123456".into(),
                                  created_at: mxid_domain::time::now(),
                                  validated: false,
                                  validated_at: None };
    s.increase_attempt();
    assert_eq!(s.attempt, 2);
    s.validate(Utc::now());
    assert!(s.validated);
    assert!(s.validated_at.is_some());
}

#[test]
fn test_policy_term_match_is_case_insensitive() {
    let mut terms = BTreeMap::new();
    terms.insert("en".to_string(), TermObject { name: "Terms".into(), url: "https://example.org/Terms-EN.html".into() });
    let policy = PolicyObject { version: "1.0".into(), terms };
    assert!(policy.has_term_url("https://EXAMPLE.org/terms-en.html"));
    assert!(!policy.has_term_url("https://example.org/terms-fr.html"));
}

#[test]
fn test_policy_term_match_folds_non_ascii_case() {
    let mut terms = BTreeMap::new();
    terms.insert("de".to_string(), TermObject { name: "AGB".into(), url: "https://example.org/ÄNDERUNGEN.html".into() });
    terms.insert("el".to_string(), TermObject { name: "Όροι".into(), url: "https://example.org/ΌΡΟΙ.html".into() });
    let policy = PolicyObject { version: "1.0".into(), terms };
    assert!(policy.has_term_url("https://example.org/änderungen.html"));
    assert!(policy.has_term_url("https://EXAMPLE.org/όροι.html"));
    assert!(!policy.has_term_url("https://example.org/anderungen.html"));
}

#[test]
fn test_account_expiry() {
    let mut acc = Account::new("tok", "@alice:example.org");
    assert!(!acc.is_expired(Utc::now()));
    acc.expires_after = Some(60);
    assert!(acc.is_expired(acc.created_at + chrono::Duration::seconds(61)));
    assert!(!acc.is_expired(acc.created_at + chrono::Duration::seconds(59)));
}
