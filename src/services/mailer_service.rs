// Envio de emails transacionais via API HTTP (JSON POST).
// Quando MAIL_API_URL não está configurada, o link de verificação é
// apenas logado (útil em desenvolvimento).

use serde::Serialize;
use std::env;

#[derive(Debug, Serialize)]
struct MailPayload {
    to: String,
    subject: String,
    text: String,
}

fn get_public_base_url() -> String {
    env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3002".to_string())
}

pub fn build_verification_link(token: &str) -> String {
    format!(
        "{}/api/v1/auth/confirm?token={}",
        get_public_base_url(),
        urlencoding::encode(token)
    )
}

pub async fn send_verification_email(to: &str, token: &str) -> Result<(), String> {
    let link = build_verification_link(token);

    let api_url = match env::var("MAIL_API_URL") {
        Ok(url) => url,
        Err(_) => {
            log::warn!("📧 MAIL_API_URL not set, verification link for {}: {}", to, link);
            return Ok(());
        }
    };

    let api_key = env::var("MAIL_API_KEY").unwrap_or_default();

    let payload = MailPayload {
        to: to.to_string(),
        subject: "Verify your MediFind account".to_string(),
        text: format!(
            "Welcome to MediFind!\n\nConfirm your account by opening this link:\n{}\n",
            link
        ),
    };

    let client = reqwest::Client::new();
    let response = client
        .post(&api_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&payload)
        .send()
        .await
        .map_err(|e| format!("Mail API request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Mail API returned status {}", response.status()));
    }

    log::info!("📧 Verification email sent to {}", to);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_link_encodes_token() {
        let link = build_verification_link("abc 123");
        assert!(link.ends_with("/api/v1/auth/confirm?token=abc%20123"));
    }
}
