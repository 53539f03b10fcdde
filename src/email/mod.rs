use crate::config::EmailConfig;
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Delivery seam for verification codes. The mock logs instead of sending,
/// which is what development and tests run against.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_verification_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), AppError>;
}

pub struct MockEmailService;

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_verification_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), AppError> {
        info!("mock email to {} ({}): verification code {}", to, name, code);
        Ok(())
    }
}

/// Posts to an HTTP email provider (Postmark-style JSON API).
pub struct HttpEmailService {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String, from_address: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from_address,
        }
    }
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send_verification_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let body = json!({
            "From": self.from_address,
            "To": to,
            "Subject": "Your SwampStudy verification code",
            "TextBody": format!(
                "Hi {},\n\nYour SwampStudy verification code is {}. It expires in 10 minutes.\n",
                name, code
            ),
        });

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmailError(format!("provider request failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::EmailError(format!(
                "provider returned {}",
                res.status()
            )));
        }

        Ok(())
    }
}

/// Picks the implementation named by `email.provider`.
pub fn from_config(config: &EmailConfig) -> std::sync::Arc<dyn EmailService> {
    match config.provider.as_str() {
        "http" => std::sync::Arc::new(HttpEmailService::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.from_address.clone(),
        )),
        _ => std::sync::Arc::new(MockEmailService),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_send_succeeds() {
        let svc = MockEmailService;
        assert!(svc
            .send_verification_code("a@ufl.edu", "Albert", "123456")
            .await
            .is_ok());
    }
}
