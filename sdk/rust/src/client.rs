use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub sdp: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

/// What the server hands back when a session is created.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedConnection {
    pub id: String,
    pub local_description: SessionDescription,
    #[serde(default)]
    pub user_data: serde_json::Value,
}

pub struct SignalingClient {
    client: Client,
    base_url: String,
    authorization: Option<String>,
}

impl SignalingClient {
    /// `base_url` includes the signaling prefix and version,
    /// e.g. `http://127.0.0.1:3000/.wrtc/v2`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: None,
        }
    }

    /// Send `Authorization` on session creation.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Create a session and receive the server's offer.
    pub async fn create(&self) -> Result<CreatedConnection, ClientError> {
        let mut request = self.client.post(format!("{}/connections", self.base_url));
        if let Some(value) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        let resp = check(request.send().await?)?;
        Ok(resp.json().await?)
    }

    /// Deliver the answer for a session.
    pub async fn set_remote_description(
        &self,
        id: &str,
        description: &SessionDescription,
    ) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(format!("{}/connections/{}/remote-description", self.base_url, id))
            .json(description)
            .send()
            .await?;
        check(resp)?;
        Ok(())
    }

    /// Fetch the candidates gathered since the last poll.
    pub async fn poll_candidates(&self, id: &str) -> Result<Vec<IceCandidate>, ClientError> {
        let resp = self
            .client
            .get(format!("{}/connections/{}/additional-candidates", self.base_url, id))
            .send()
            .await?;
        Ok(check(resp)?.json().await?)
    }

    /// Close a session. Closing an unknown session is not an error.
    pub async fn close(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(format!("{}/connections/{}/close", self.base_url, id))
            .send()
            .await?;
        check(resp)?;
        Ok(())
    }
}

fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status == StatusCode::OK {
        Ok(resp)
    } else {
        Err(ClientError::Status(status.as_u16()))
    }
}
