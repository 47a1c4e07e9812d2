// Unit tests for the extraction pipeline

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use pretty_assertions::assert_eq;

use super::*;

enum Outcome {
    Raw(RawPost),
    Stale,
    Fail,
}

/// Scripted stand-in for a browser: each URL gets a queue of outcomes,
/// consumed one per attempt.
struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(scripts: Vec<(&str, Vec<Outcome>)>) -> Self {
        Self {
            scripts: Mutex::new(
                scripts
                    .into_iter()
                    .map(|(url, outcomes)| (url.to_string(), outcomes.into_iter().collect()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == url).count()
    }
}

impl PostSource for ScriptedSource {
    async fn load_post(&self, url: &str) -> Result<RawPost> {
        self.calls.lock().unwrap().push(url.to_string());
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| panic!("unscripted URL: {}", url));
        match outcome {
            Outcome::Raw(raw) => Ok(raw),
            Outcome::Stale => Err(anyhow!(
                "stale element reference: element is not attached to the page document"
            )),
            Outcome::Fail => Err(anyhow!("tab crashed")),
        }
    }
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn full_post() -> RawPost {
    RawPost {
        primary: Some("Flood update #rescue #rescue and #relief".to_string()),
        alternate: None,
        reactions: Some("1,234 me gusta".to_string()),
        comments: vec![
            "Flood update".to_string(),
            "Stay safe!".to_string(),
            "   ".to_string(),
            "Thoughts with everyone".to_string(),
        ],
    }
}

#[test]
fn test_clean_text_strips_site_chrome() {
    let text = "A post about floods\nMeta; Información; Blog; Empleo; Ayuda; API; \
                Privacidad; © 2024 Instagram from Meta; Inicio; Buscar; Explorar; Reels";
    assert_eq!(clean_text(text), "A post about floods");
}

#[test]
fn test_clean_text_strips_conversation_prompt() {
    assert_eq!(clean_text("Inicia la conversación.; hello"), "hello");
    assert_eq!(clean_text("before Inicia la conversación. after"), "before  after");
}

#[test]
fn test_clean_text_collapses_echoed_lines() {
    assert_eq!(clean_text("someuser; \u{2022}; someuser caption text"), "someuser caption text");
    // A line that is not echoed stays as it is
    assert_eq!(clean_text("someuser; \u{2022}; otheruser"), "someuser; \u{2022}; otheruser");
}

#[test]
fn test_clean_text_collapse_runs_to_fixed_point() {
    // Nested echo must reduce fully in one pass
    assert_eq!(clean_text("x; \u{2022}; x; \u{2022}; x"), "x");
}

#[test]
fn test_clean_text_is_idempotent() {
    let samples = [
        "plain caption #tag",
        "someuser; \u{2022}; someuser caption",
        "x; \u{2022}; x; \u{2022}; x",
        "  padded  \n lines \n Inicia la conversación.;",
        "",
    ];
    for sample in samples {
        let once = clean_text(sample);
        let twice = clean_text(&once);
        assert_eq!(once, twice, "cleanup not idempotent for {:?}", sample);
    }
}

#[test]
fn test_extract_hashtags_order_and_duplicates() {
    let tags = extract_hashtags("#flood help #rescue now #flood again");
    assert_eq!(tags, vec!["#flood", "#rescue", "#flood"]);
}

#[test]
fn test_extract_hashtags_word_characters_only() {
    let tags = extract_hashtags("#tag1, #tag_two! and #3rd. # alone");
    assert_eq!(tags, vec!["#tag1", "#tag_two", "#3rd"]);
}

#[test]
fn test_extract_reaction_count() {
    assert_eq!(extract_reaction_count("A user y 1,234 personas más me gusta"), Some("1,234".to_string()));
    assert_eq!(extract_reaction_count("1.234 me gusta"), Some("1.234".to_string()));
    assert_eq!(extract_reaction_count("me gusta"), None);
}

#[test]
fn test_build_record_placeholder_when_both_selectors_missed() {
    let record = build_record("https://www.instagram.com/p/ABC123/", RawPost::default());
    assert_eq!(record.content, CONTENT_UNAVAILABLE);
    assert_eq!(record.reactions, REACTIONS_UNAVAILABLE);
    assert!(record.comments.is_empty());
    assert!(record.hashtags.is_empty());
    assert_eq!(record.author, "ABC123");
}

#[test]
fn test_build_record_uses_alternate_text() {
    let raw = RawPost {
        primary: None,
        alternate: Some("fallback caption #tag".to_string()),
        ..RawPost::default()
    };
    let record = build_record("https://www.instagram.com/p/XYZ/", raw);
    assert_eq!(record.content, "fallback caption #tag");
    assert_eq!(record.hashtags, vec!["#tag"]);
}

#[test]
fn test_build_record_drops_body_span_and_blank_comments() {
    let record = build_record("https://www.instagram.com/p/ABC/", full_post());
    assert_eq!(record.comments, vec!["Stay safe!", "Thoughts with everyone"]);
    assert_eq!(record.reactions, "1,234");
}

#[tokio::test]
async fn test_collect_posts_respects_limit() {
    let source = ScriptedSource::new(vec![
        ("u1", vec![Outcome::Raw(full_post())]),
        ("u2", vec![Outcome::Raw(full_post())]),
        ("u3", vec![Outcome::Raw(full_post())]),
    ]);
    let records = collect_posts(&source, &urls(&["u1", "u2", "u3"]), 2).await;
    assert_eq!(records.len(), 2);
    assert_eq!(source.calls_for("u3"), 0);
}

#[tokio::test]
async fn test_collect_posts_fewer_links_than_limit() {
    let source = ScriptedSource::new(vec![("u1", vec![Outcome::Raw(full_post())])]);
    let records = collect_posts(&source, &urls(&["u1"]), 10).await;
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_collect_posts_stale_retries_then_abandons() {
    let source = ScriptedSource::new(vec![
        ("bad", vec![Outcome::Stale, Outcome::Stale, Outcome::Stale]),
        ("good", vec![Outcome::Raw(full_post())]),
    ]);
    let records = collect_posts(&source, &urls(&["bad", "good"]), 10).await;

    // Exactly MAX_ATTEMPTS tries for the stale URL, then it is abandoned
    assert_eq!(source.calls_for("bad"), MAX_ATTEMPTS);
    // The failure does not affect the next URL
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "good");
}

#[tokio::test]
async fn test_collect_posts_stale_then_success() {
    let source = ScriptedSource::new(vec![(
        "flaky",
        vec![Outcome::Stale, Outcome::Raw(full_post())],
    )]);
    let records = collect_posts(&source, &urls(&["flaky"]), 10).await;
    assert_eq!(source.calls_for("flaky"), 2);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_collect_posts_non_stale_fault_abandons_without_retry() {
    let source = ScriptedSource::new(vec![
        ("broken", vec![Outcome::Fail]),
        ("good", vec![Outcome::Raw(full_post())]),
    ]);
    let records = collect_posts(&source, &urls(&["broken", "good"]), 10).await;

    // No retry for non-stale faults
    assert_eq!(source.calls_for("broken"), 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "good");
}

#[tokio::test]
async fn test_collect_posts_end_to_end_scenario() {
    // One full post, one that only the alternate selector catches, and one
    // where both selectors miss entirely.
    let alternate_only = RawPost {
        primary: None,
        alternate: Some("caption seen via fallback #tag".to_string()),
        ..RawPost::default()
    };
    let source = ScriptedSource::new(vec![
        ("https://www.instagram.com/p/AAA/", vec![Outcome::Raw(full_post())]),
        ("https://www.instagram.com/p/BBB/", vec![Outcome::Raw(alternate_only)]),
        ("https://www.instagram.com/p/CCC/", vec![Outcome::Raw(RawPost::default())]),
    ]);
    let post_urls = urls(&[
        "https://www.instagram.com/p/AAA/",
        "https://www.instagram.com/p/BBB/",
        "https://www.instagram.com/p/CCC/",
    ]);
    let records = collect_posts(&source, &post_urls, 10).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].content, "Flood update #rescue #rescue and #relief");
    assert_eq!(records[0].hashtags, vec!["#rescue", "#rescue", "#relief"]);
    assert_eq!(records[1].content, "caption seen via fallback #tag");
    assert_eq!(records[2].content, CONTENT_UNAVAILABLE);
}
