use crate::config::Config;
use crate::logw;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

fn extract_output_text(raw: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(raw).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error message: {}", msg));
        }
        if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error code: {}", code));
        }
        return None;
    }

    let output = root.get("output")?.as_array()?;
    for item in output {
        let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for entry in content {
            if entry.get("type").and_then(|v| v.as_str()) == Some("output_text") {
                if let Some(text) = entry.get("text").and_then(|v| v.as_str()) {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}

async fn call_responses(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
    timeout_s: u64,
) -> Result<String> {
    let body = json!({
        "model": model,
        "input": [
            {"role": "system", "content": "You are a helpful assistant."},
            {"role": "user", "content": prompt},
        ],
        "temperature": 0.7,
        "text": {"format": {"type": "json_object"}},
    });

    let resp = client
        .post("https://api.openai.com/v1/responses")
        .bearer_auth(&cfg.openai_api_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(timeout_s))
        .send()
        .await
        .context("OpenAI request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        let snippet = raw.chars().take(800).collect::<String>();
        anyhow::bail!("OpenAI HTTP {}: {}", status.as_u16(), snippet);
    }

    let text = extract_output_text(&raw).unwrap_or_default();
    if text.trim().is_empty() {
        let snippet = raw.chars().take(800).collect::<String>();
        anyhow::bail!("OpenAI returned no output text: {}", snippet);
    }
    Ok(text)
}

/// Single JSON-mode call. The caller parses the returned object.
pub async fn call_openai_json(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
) -> Result<serde_json::Value> {
    let text = call_responses(client, cfg, model, prompt, 90).await?;
    serde_json::from_str(&text).context("OpenAI JSON output parse failed")
}

/// Long-form variant for the blog writer; same call, more patience.
pub async fn call_openai_json_long(
    client: &Client,
    cfg: &Config,
    model: &str,
    prompt: &str,
) -> Result<serde_json::Value> {
    let text = call_responses(client, cfg, model, prompt, 120).await?;
    serde_json::from_str(&text).context("OpenAI JSON output parse failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_text_is_extracted_from_responses_shape() {
        let raw = r#"{"output":[{"content":[{"type":"reasoning","text":"x"},{"type":"output_text","text":"{\"a\":1}"}]}]}"#;
        assert_eq!(extract_output_text(raw), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn error_payloads_yield_none() {
        let raw = r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#;
        assert_eq!(extract_output_text(raw), None);
        assert_eq!(extract_output_text("not json"), None);
    }
}
