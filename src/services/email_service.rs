use serde_json::json;

fn relay_config() -> Option<(String, String)> {
    let url = std::env::var("EMAIL_API_URL").ok()?;
    let key = std::env::var("EMAIL_API_KEY").unwrap_or_default();
    Some((url, key))
}

/// Sends a transactional email through the HTTP relay. When no relay is
/// configured the send is skipped and logged, never treated as an error —
/// email is best-effort everywhere it is used.
pub async fn send_email(to: &str, subject: &str, text: &str) {
    let (url, key) = match relay_config() {
        Some(cfg) => cfg,
        None => {
            log::warn!("📧 EMAIL_API_URL not configured, skipping email to {} ({})", to, subject);
            return;
        }
    };

    let client = reqwest::Client::new();
    let result = client
        .post(&url)
        .bearer_auth(&key)
        .json(&json!({
            "to": to,
            "subject": subject,
            "text": text,
        }))
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            log::info!("📧 Email sent to {} ({})", to, subject);
        }
        Ok(resp) => {
            log::error!("❌ Email relay returned {} for {} ({})", resp.status(), to, subject);
        }
        Err(e) => {
            log::error!("❌ Email relay request failed for {}: {}", to, e);
        }
    }
}
