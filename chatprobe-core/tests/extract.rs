use chatprobe_config::SelectorConfig;
use chatprobe_core::extract::BLOCK_SCAN_LABEL;
use chatprobe_core::{ResponseExtractor, SelectorCandidate};
use chatprobe_drivers::fixture::FixturePage;

fn default_extractor() -> ResponseExtractor {
    ResponseExtractor::from_config(&SelectorConfig::default())
}

fn chat(messages: &str) -> String {
    format!(
        r#"<main>
             <div class="message-list">{messages}</div>
             <div class="chat-input"><textarea placeholder="Send a message"></textarea><button>Send</button></div>
           </main>"#
    )
}

#[tokio::test]
async fn last_bot_message_wins_with_its_selector() {
    let answer = "a".repeat(120);
    let html = chat(&format!(
        r#"<div class="message user-message"><div class="message-text">hello</div></div>
           <div class="message bot-message"><div class="message-text">{answer}</div></div>"#
    ));
    let result = default_extractor().extract(&FixturePage::new(html)).await;
    assert_eq!(
        result.selector_used.as_deref(),
        Some(".message.bot-message:last-child .message-text")
    );
    assert_eq!(result.text.chars().count(), 120);
    assert_eq!(result.html, answer);
}

#[tokio::test]
async fn first_candidate_by_order_wins_over_longer_text() {
    let html = format!(
        r#"<div class="first">{}</div><div class="second">{}</div>"#,
        "x".repeat(150),
        "y".repeat(400)
    );
    let ex = ResponseExtractor::with_candidates(vec![
        SelectorCandidate::new(".first", 100),
        SelectorCandidate::new(".second", 100),
    ]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some(".first"));
    assert_eq!(result.text, "x".repeat(150));
}

#[tokio::test]
async fn short_match_does_not_stop_the_search() {
    let html = format!(
        r#"<div class="first">{}</div><div class="second">{}</div>"#,
        "x".repeat(100),
        "y".repeat(101)
    );
    let ex = ResponseExtractor::with_candidates(vec![
        SelectorCandidate::new(".missing", 100),
        SelectorCandidate::new(".first", 100),
        SelectorCandidate::new(".second", 100),
    ]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some(".second"));
}

#[tokio::test]
async fn threshold_is_per_candidate() {
    let html = format!(r#"<div class="first">{}</div>"#, "x".repeat(60));
    let ex = ResponseExtractor::with_candidates(vec![SelectorCandidate::new(".first", 50)]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some(".first"));
}

#[tokio::test]
async fn thinking_lines_are_removed_from_text_only() {
    let body = "M5Stack Core2 is an ESP32 based development kit with a touch screen, \
                speaker, microphone, vibration motor and an RTC.";
    let html = chat(&format!(
        r#"<div class="message bot-message"><div class="message-text">
             考え中...
             {body}
           </div></div>"#
    ));
    let result = default_extractor().extract(&FixturePage::new(html)).await;
    assert_eq!(result.text, body);
    assert!(result.original_text.starts_with("考え中..."));
    assert!(result
        .text
        .lines()
        .all(|line| !line.trim().starts_with("考え中")));
}

#[tokio::test]
async fn generic_container_picks_longest_text() {
    let html = r#"
        <div class="bot-message">short</div>
        <div class="bot-message">a somewhat longer answer</div>
        <div class="ai-message"></div>
    "#;
    let ex = ResponseExtractor::with_candidates(vec![SelectorCandidate::new(".nothing", 100)]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some("generic:.bot-message"));
    assert_eq!(result.text, "a somewhat longer answer");
}

#[tokio::test]
async fn block_scan_skips_blocks_with_controls() {
    let html = format!(
        r#"<article class="nav">{nav}<button>Menu</button></article>
           <p class="answer">{answer}</p>
           <li>{short}</li>
           <div class="composer"><textarea></textarea><span>{long}</span></div>"#,
        nav = "n".repeat(300),
        answer = "p".repeat(130),
        short = "s".repeat(90),
        long = "l".repeat(500),
    );
    let ex = ResponseExtractor::with_candidates(vec![SelectorCandidate::new(".nothing", 100)]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some(BLOCK_SCAN_LABEL));
    assert_eq!(result.text, "p".repeat(130));
}

#[tokio::test]
async fn blank_page_gives_empty_result() {
    let ex = ResponseExtractor::with_candidates(vec![SelectorCandidate::new(".nothing", 100)]);
    let result = ex.extract(&FixturePage::new("<p>hi</p>")).await;
    assert!(result.is_empty());
    assert_eq!(result.selector_used, None);
    assert_eq!(result.text, "");
}

#[tokio::test]
async fn invalid_selector_is_skipped() {
    let html = format!(r#"<div class="ok">{}</div>"#, "z".repeat(120));
    let ex = ResponseExtractor::with_candidates(vec![
        SelectorCandidate::new("div[", 100),
        SelectorCandidate::new(".ok", 100),
    ]);
    let result = ex.extract(&FixturePage::new(html)).await;
    assert_eq!(result.selector_used.as_deref(), Some(".ok"));
}
