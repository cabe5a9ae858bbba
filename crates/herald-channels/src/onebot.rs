//! OneBot v11 channel — group enumeration and message sending over the
//! OneBot HTTP API (`get_group_list` / `send_group_msg`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use herald_core::config::OneBotConfig;
use herald_core::error::{HeraldError, Result};
use herald_core::traits::Transport;
use herald_core::types::{Payload, RecipientId};

/// OneBot channel backed by a single HTTP API endpoint.
pub struct OneBotChannel {
    config: OneBotConfig,
    client: reqwest::Client,
}

/// One chat group as reported by `get_group_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: i64,
    #[serde(default)]
    pub group_name: String,
}

/// Standard OneBot API envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    retcode: i64,
    data: Option<T>,
}

impl OneBotChannel {
    pub fn new(config: OneBotConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, action: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), action)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let mut req = self.client.post(self.api_url(action)).json(&params);
        if let Some(token) = &self.config.access_token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| HeraldError::Transport(format!("{action} request failed: {e}")))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| HeraldError::Transport(format!("Invalid {action} response: {e}")))?;

        if body.status == "failed" || body.retcode != 0 {
            return Err(HeraldError::Transport(format!(
                "{action} returned retcode {}",
                body.retcode
            )));
        }
        body.data
            .ok_or_else(|| HeraldError::Transport(format!("{action} returned no data")))
    }

    /// Full group listing (id + name), sorted by group id. Used by the
    /// operator `groups` command; the broadcast core only needs the ids.
    pub async fn group_list(&self) -> Result<Vec<GroupInfo>> {
        let mut groups: Vec<GroupInfo> = self.call("get_group_list", serde_json::json!({})).await?;
        groups.sort_by_key(|g| g.group_id);
        Ok(groups)
    }

    /// Send a plain-text message to one group.
    pub async fn send_group_msg(&self, group_id: i64, message: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "send_group_msg",
                serde_json::json!({
                    "group_id": group_id,
                    "message": message,
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for OneBotChannel {
    fn name(&self) -> &str {
        "onebot"
    }

    async fn list_recipients(&self) -> Result<Vec<RecipientId>> {
        let groups = self.group_list().await?;
        Ok(groups
            .into_iter()
            .map(|g| RecipientId::new(g.group_id.to_string()))
            .collect())
    }

    async fn send(&self, to: &RecipientId, payload: &Payload) -> Result<()> {
        let group_id: i64 = to
            .as_str()
            .parse()
            .map_err(|_| HeraldError::Transport(format!("Not a group id: {to}")))?;
        self.send_group_msg(group_id, &payload.content).await?;
        tracing::debug!("Delivered payload {} to group {to}", payload.id);
        Ok(())
    }
}
