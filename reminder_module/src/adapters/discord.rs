//! Discord REST adapter for reminder delivery.
//!
//! Recipient resolution prefers the guild member endpoint and falls back to
//! the global user endpoint; delivery opens a DM channel and posts a single
//! embed message. A fresh blocking client is built per call, so the adapter
//! stays cheap to clone and safe to hand to the poller thread.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::channel::{
    AdapterError, DeliveryError, DeliveryPayload, DirectMessenger, Recipient, RecipientDirectory,
};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone)]
pub struct DiscordRestClient {
    bot_token: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    username: String,
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberPayload {
    nick: Option<String>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct DmChannelPayload {
    id: String,
}

impl DiscordRestClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_api_base(bot_token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(bot_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str) -> Result<reqwest::blocking::Response, AdapterError> {
        let client = reqwest::blocking::Client::new();
        Ok(client
            .get(format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()?)
    }

    fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::blocking::Response, AdapterError> {
        let client = reqwest::blocking::Client::new();
        Ok(client
            .post(format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(body)
            .send()?)
    }

    fn fetch_guild_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<Recipient>, AdapterError> {
        let response = self.get(&format!("/guilds/{guild_id}/members/{user_id}"))?;
        match response.status().as_u16() {
            200 => {
                let member: MemberPayload = response.json()?;
                let display_name = member
                    .nick
                    .or(member.user.global_name)
                    .unwrap_or(member.user.username);
                Ok(Some(Recipient {
                    id: user_id,
                    display_name,
                }))
            }
            404 => Ok(None),
            status => Err(api_error(status, response)),
        }
    }

    fn fetch_user(&self, user_id: u64) -> Result<Option<Recipient>, AdapterError> {
        let response = self.get(&format!("/users/{user_id}"))?;
        match response.status().as_u16() {
            200 => {
                let user: UserPayload = response.json()?;
                let display_name = user.global_name.unwrap_or(user.username);
                Ok(Some(Recipient {
                    id: user_id,
                    display_name,
                }))
            }
            404 => Ok(None),
            status => Err(api_error(status, response)),
        }
    }

    fn open_dm_channel(&self, recipient_id: u64) -> Result<String, DeliveryError> {
        let response = self.post(
            "/users/@me/channels",
            &json!({ "recipient_id": recipient_id.to_string() }),
        )?;
        match response.status().as_u16() {
            200 | 201 => {
                let dm: DmChannelPayload = response.json().map_err(AdapterError::from)?;
                Ok(dm.id)
            }
            403 => Err(DeliveryError::Refused(read_body(response))),
            status => Err(api_error(status, response).into()),
        }
    }
}

impl RecipientDirectory for DiscordRestClient {
    fn resolve(&self, user_id: u64, guild_id: u64) -> Result<Option<Recipient>, AdapterError> {
        if guild_id > 0 {
            if let Some(member) = self.fetch_guild_member(guild_id, user_id)? {
                return Ok(Some(member));
            }
        }
        self.fetch_user(user_id)
    }
}

impl DirectMessenger for DiscordRestClient {
    fn send_direct(
        &self,
        recipient: &Recipient,
        payload: &DeliveryPayload,
    ) -> Result<(), DeliveryError> {
        let channel_id = self.open_dm_channel(recipient.id)?;
        let body = json!({ "embeds": [embed_from_payload(payload)] });
        let response = self
            .post(&format!("/channels/{channel_id}/messages"), &body)
            .map_err(DeliveryError::from)?;
        match response.status().as_u16() {
            200 => {
                debug!(recipient_id = recipient.id, "sent reminder direct message");
                Ok(())
            }
            403 => Err(DeliveryError::Refused(read_body(response))),
            status => Err(DeliveryError::Transport(api_error(status, response))),
        }
    }
}

fn embed_from_payload(payload: &DeliveryPayload) -> serde_json::Value {
    let mut fields = Vec::new();
    if let Some(reminded_by) = &payload.reminded_by {
        fields.push(json!({ "name": "Reminded by", "value": reminded_by, "inline": true }));
    }
    if let Some(message) = &payload.message {
        fields.push(json!({ "name": "Message", "value": message, "inline": false }));
    }
    if let Some(permalink) = &payload.permalink {
        fields.push(json!({ "name": "URL", "value": permalink, "inline": true }));
    }
    fields.push(json!({
        "name": "Remind date",
        "value": payload.remind_date.to_rfc3339(),
        "inline": false
    }));
    json!({ "title": "Reminder", "fields": fields })
}

fn read_body(response: reqwest::blocking::Response) -> String {
    response.text().unwrap_or_default()
}

fn api_error(status: u16, response: reqwest::blocking::Response) -> AdapterError {
    AdapterError::Api {
        status,
        body: read_body(response),
    }
}
