//! Prompt rendering and answer generation.
//!
//! Retrieval produces the context; this module renders the fixed prompt
//! and delegates to the answer model. The persona, tone, and sourcing
//! rules in the template are content policy and are passed through to
//! the model unchanged. Unlike the vector stage, answer-generation
//! failures propagate to the caller: the core's responsibility ends at
//! producing the context and delegating.

use anyhow::{anyhow, bail, Result};
use std::time::Duration;
use tracing::debug;

use crate::config::AnswerConfig;
use crate::models::Passage;
use crate::retrieve::Retriever;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const PROMPT_TEMPLATE: &str = "\
You are a careful teacher and archivist answering questions from a corpus of transcribed sermons.

RULES:
- Be faithful to the sermon passages provided.
- Do NOT invent doctrine.
- If something is not clearly stated in the text, say so.
- Use a calm, measured teaching tone.
- Be structured and clear.
- Use headings and bullet points.
- Explain symbols plainly.
- Prefer paraphrase, but preserve meaning.
- Avoid citations like (54) or paragraph numbers.
- Ignore tape noise or filler language.
- If a question asks for a sermon summary, summarize only that sermon.
- If the question names a sermon series, prioritize that series.

CONTEXT:
{context_str}

QUESTION:
{question}

ANSWER:
";

/// A generated answer together with the passages it drew on.
pub struct AskOutcome {
    pub answer: String,
    pub passages: Vec<Passage>,
}

/// Concatenate passage contents into the prompt context string.
pub fn build_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the prompt for one question.
pub fn render_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context_str}", context)
        .replace("{question}", question)
}

/// Retrieve context for a question and generate a sourced answer.
pub async fn ask(
    retriever: &dyn Retriever,
    config: &AnswerConfig,
    question: &str,
) -> Result<AskOutcome> {
    let passages = retriever.retrieve(question).await;
    debug!(passages = passages.len(), "context assembled");

    let prompt = render_prompt(&build_context(&passages), question);
    let answer = generate(config, &prompt).await?;

    Ok(AskOutcome { answer, passages })
}

/// Call the answer model once. Requires `GOOGLE_API_KEY`.
async fn generate(config: &AnswerConfig, prompt: &str) -> Result<String> {
    let api_key =
        std::env::var("GOOGLE_API_KEY").map_err(|_| anyhow!("GOOGLE_API_KEY not set"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "temperature": config.temperature },
    });

    let url = format!(
        "{}/{}:generateContent?key={}",
        GEMINI_API_BASE, config.model, api_key
    );

    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        bail!("answer model error {}: {}", status, text);
    }

    let json: serde_json::Value = resp.json().await?;
    parse_generate_response(&json)
}

/// Extract the generated text from the model response.
fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    json.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|p| p.first())
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid answer response: missing candidate text"))
}
