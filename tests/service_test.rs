//! Integration tests for the proposal service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use propdocx::{
    Brief, DocxRenderer, Error, GenerationError, GenerationOptions, GenerationRequest,
    PromptBuilder, ProposalService, StaticGenerator, Template, TextGenerator, Tone,
};

/// Generator that records every request it sees.
struct RecordingGenerator {
    requests: Mutex<Vec<GenerationRequest>>,
    reply: String,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: reply.to_string(),
        }
    }
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Generator that fails with a fixed error.
struct FailingGenerator(GenerationError);

impl TextGenerator for FailingGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(self.0.clone())
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
}

fn service<G: TextGenerator>(generator: G) -> ProposalService<G> {
    ProposalService::new(generator, Template::builtin(), DocxRenderer::default())
        .unwrap()
        .with_generation_date(date())
}

fn brief() -> Brief {
    Brief::new("ACME Corp", "Launch a customer portal", "Design, build and host")
        .with_technologies(["Rust", "PostgreSQL"])
        .with_tone(Tone::Marketing)
}

#[test]
fn test_prompt_reaches_generator() {
    let service = service(RecordingGenerator::new("## Executive Summary\nHello."))
        .with_options(GenerationOptions::new().with_max_tokens(512));
    let output = service.generate(&brief()).unwrap();

    let requests = service.generator().requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains("ACME Corp"));
    assert!(prompt.contains("Rust, PostgreSQL"));
    assert!(prompt.contains("Executive Summary"));
    assert_eq!(requests[0].max_tokens, 512);

    assert_eq!(output.filename, "Proposal_ACME_Corp_20260305.docx");
    assert_eq!(output.stats.heading_count, 1);
}

#[test]
fn test_custom_sections() {
    let prompt = PromptBuilder::new()
        .with_sections(["Overview", "Pricing"])
        .build(&brief());
    assert!(prompt.contains("Overview"));
    assert!(prompt.contains("Pricing"));
    assert!(!prompt.contains("Payment Terms"));
}

#[test]
fn test_fenced_response_is_unwrapped() {
    let output = service(StaticGenerator::new("```markdown\n## Scope\n- Build\n```"))
        .generate(&brief())
        .unwrap();
    assert_eq!(output.blocks.len(), 2);
    assert!(output.blocks.iter().all(|b| !b.is_raw()));
    assert!(output.text.starts_with("```markdown"));
}

#[test]
fn test_upstream_failures() {
    for error in [
        GenerationError::Timeout,
        GenerationError::QuotaExceeded,
        GenerationError::Upstream("HTTP 500".into()),
    ] {
        let err = service(FailingGenerator(error.clone()))
            .generate(&brief())
            .unwrap_err();
        assert!(err.is_upstream(), "{err}");
        assert!(matches!(err, Error::Generation(ref e) if *e == error));
    }
}

#[test]
fn test_empty_response() {
    let err = service(StaticGenerator::new("\n \n"))
        .generate(&brief())
        .unwrap_err();
    assert!(matches!(err, Error::Generation(GenerationError::EmptyResponse)));
}

#[test]
fn test_invalid_brief_is_rejected_before_generation() {
    let calls = AtomicUsize::new(0);
    let generator = |_: &GenerationRequest| -> Result<String, GenerationError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok("text".to_string())
    };

    let mut bad = brief();
    bad.client_name = "   ".into();
    bad.contact_email = Some("not-an-email".into());
    let err = service(generator).generate(&bad).unwrap_err();

    let Error::InvalidBrief(fields) = &err else {
        panic!("expected InvalidBrief, got {err:?}");
    };
    let names: Vec<&str> = fields.iter().map(|f| f.field).collect();
    assert!(names.contains(&"client_name"));
    assert!(names.contains(&"contact_email"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_brief_from_json() {
    let json = r#"{
        "client_name": "ACME",
        "project_goal": "goal",
        "scope": "scope",
        "technologies": "Rust, Go",
        "deadline": "2026-06-30",
        "tone": "marketing",
        "unknown": true
    }"#;
    let brief = Brief::from_json(json).unwrap();
    assert_eq!(brief.technologies, vec!["Rust", "Go"]);
    assert_eq!(brief.tone, Tone::Marketing);

    let output = service(StaticGenerator::new("Body text."))
        .render_text(&brief, "Body text.")
        .unwrap();
    assert_eq!(output.filename, "Proposal_ACME_20260305.docx");
}

#[test]
fn test_concurrent_requests() {
    let service = Arc::new(service(StaticGenerator::new("## A\n- b")));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .generate(&Brief::new(format!("Client {i}"), "goal", "scope"))
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let output = handle.join().unwrap();
        assert_eq!(output.filename, format!("Proposal_Client_{i}_20260305.docx"));
    }
}
