//! End-to-end digest flow over fake capabilities: retrieval → fan-out
//! classification → report → delivery.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use inbox_digest::classify::Classify;
use inbox_digest::error::{ClassifyError, MailError};
use inbox_digest::mail::{AuthStatus, Authorization, MailGateway, OutgoingEmail};
use inbox_digest::pipeline::{EmailCategory, EmailRecord, Orchestrator};
use inbox_digest::report::DigestReport;

// ── Fakes ───────────────────────────────────────────────────────────

/// Scripted classifier: per-email spam/importance scores and a category.
struct ScriptedClassifier {
    // id -> (spam, importance, category)
    scripts: HashMap<String, (u8, u8, EmailCategory)>,
}

impl ScriptedClassifier {
    fn new(scripts: &[(&str, u8, u8, EmailCategory)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(id, spam, importance, category)| {
                    (id.to_string(), (*spam, *importance, *category))
                })
                .collect(),
        }
    }

    fn script(&self, email: &EmailRecord) -> (u8, u8, EmailCategory) {
        *self.scripts.get(&email.id).expect("unscripted email id")
    }
}

#[async_trait]
impl Classify for ScriptedClassifier {
    async fn spam_likelihood(&self, email: &EmailRecord) -> Result<u8, ClassifyError> {
        Ok(self.script(email).0)
    }

    async fn importance(&self, email: &EmailRecord) -> Result<u8, ClassifyError> {
        Ok(self.script(email).1)
    }

    async fn summarize(&self, email: &EmailRecord) -> Result<Vec<String>, ClassifyError> {
        Ok(vec![
            format!("Key point from {}", email.subject),
            "Respond before the deadline".to_string(),
        ])
    }

    async fn categorize(&self, email: &EmailRecord) -> Result<EmailCategory, ClassifyError> {
        Ok(self.script(email).2)
    }
}

/// In-memory mail gateway: a preloaded inbox and a sent-mail log.
struct FakeGateway {
    inbox: Vec<EmailRecord>,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl FakeGateway {
    fn new(inbox: Vec<EmailRecord>) -> Self {
        Self {
            inbox,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MailGateway for FakeGateway {
    async fn authorize(&self, _account: &str) -> Result<Authorization, MailError> {
        Ok(Authorization {
            id: "auth-test".into(),
            status: AuthStatus::Completed,
            url: None,
        })
    }

    async fn wait_for_authorization(&self, _auth: &Authorization) -> Result<(), MailError> {
        Ok(())
    }

    async fn list_recent(
        &self,
        _account: &str,
        count: usize,
    ) -> Result<Vec<EmailRecord>, MailError> {
        Ok(self.inbox.iter().take(count).cloned().collect())
    }

    async fn send(&self, _account: &str, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn email(id: &str, subject: &str) -> EmailRecord {
    EmailRecord {
        id: id.into(),
        from: format!("{id}@example.com"),
        subject: subject.into(),
        date: "2026-08-05 08:00".into(),
        body: format!("body of {subject}"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_run_produces_and_delivers_the_digest() {
    // The worked ranking example: A and D tie at 90 (dispatch order breaks
    // the tie), C at 40, B is spam-scored 80 so its importance defaults to 0.
    let classifier = Arc::new(ScriptedClassifier::new(&[
        ("a", 5, 90, EmailCategory::Work),
        ("c", 5, 40, EmailCategory::Work),
        ("d", 5, 90, EmailCategory::Personal),
        ("b", 80, 0, EmailCategory::Ads),
    ]));
    let gateway = FakeGateway::new(vec![
        email("a", "Contract review"),
        email("c", "Team lunch"),
        email("d", "Visa appointment"),
        email("b", "WIN A PRIZE"),
    ]);

    let account = "user@example.com";
    let auth = gateway.authorize(account).await.unwrap();
    assert_eq!(auth.status, AuthStatus::Completed);
    gateway.wait_for_authorization(&auth).await.unwrap();

    let inbox = gateway.list_recent(account, 4).await.unwrap();
    assert_eq!(inbox.len(), 4);

    let progress: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let orchestrator = Orchestrator::new(classifier)
        .with_concurrency(2)
        .with_progress(Box::new(move |done, total, subject| {
            sink.lock()
                .unwrap()
                .push(format!("Processing email ({done}/{total}): {subject}"));
        }));

    let results = orchestrator.process(inbox).await;
    assert_eq!(results.len(), 4);

    let generated_at = Utc.with_ymd_and_hms(2026, 8, 6, 9, 30, 0).unwrap();
    let report = DigestReport::build(&results, 4, generated_at);

    // Stable tie-break: A (dispatch 0) ahead of D (dispatch 2); B's zero
    // importance keeps it in the list, at the bottom.
    let top_ids: Vec<&str> = report.top.iter().map(|a| a.email.id.as_str()).collect();
    assert_eq!(top_ids, vec!["a", "d", "c", "b"]);

    // Only A and D cleared the summary cutoff.
    assert!(report.top[0].summary.is_some());
    assert!(report.top[1].summary.is_some());
    assert!(report.top[2].summary.is_none());

    let outgoing = OutgoingEmail {
        subject: report.subject(),
        body: report.render(),
        recipient: account.to_string(),
    };
    gateway.send(account, &outgoing).await.unwrap();

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Inbox digest (latest 4 emails)");
    assert!(sent[0].body.contains("Contract review"));
    assert!(sent[0].body.contains("- Work: 2"));
    // One spam-tagged email is below the reporting threshold.
    assert!(!sent[0].body.contains("tagged as SPAM"));

    let mut lines = progress.lock().unwrap().clone();
    assert_eq!(lines.len(), 4);
    lines.sort();
    assert!(lines[0].starts_with("Processing email (1/4): "));
}

#[tokio::test]
async fn histogram_and_spam_section_reflect_the_whole_batch() {
    let classifier = Arc::new(ScriptedClassifier::new(&[
        ("s1", 90, 0, EmailCategory::Ads),
        ("s2", 75, 0, EmailCategory::Ads),
        ("n1", 10, 20, EmailCategory::News),
        ("w1", 10, 80, EmailCategory::Work),
        ("w2", 10, 30, EmailCategory::Work),
    ]));
    let gateway = FakeGateway::new(vec![
        email("s1", "Cheap watches"),
        email("s2", "Final notice!!!"),
        email("n1", "Weekly newsletter"),
        email("w1", "Production incident"),
        email("w2", "Standup notes"),
    ]);

    let inbox = gateway.list_recent("user@example.com", 5).await.unwrap();
    let results = Orchestrator::new(classifier).process(inbox).await;

    let generated_at = Utc.with_ymd_and_hms(2026, 8, 6, 9, 30, 0).unwrap();
    let report = DigestReport::build(&results, 5, generated_at);

    let counted: usize = report.category_counts.iter().sum();
    assert_eq!(counted, 5);
    // Work and Ads tie at 2; declaration order puts Work first.
    assert_eq!(
        report.histogram(),
        vec![
            (EmailCategory::Work, 2),
            (EmailCategory::Ads, 2),
            (EmailCategory::News, 1),
        ]
    );

    // Two emails above the spam cutoff → the section renders.
    let body = report.render();
    assert!(body.contains("2 out of 5 (40.00%) of all analyzed emails tagged as SPAM."));

    // Rebuilding from the same accumulator is byte-identical.
    assert_eq!(body, DigestReport::build(&results, 5, generated_at).render());
}
