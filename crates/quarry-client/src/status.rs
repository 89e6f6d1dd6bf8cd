use quarry_types::TextComponent;
use serde::Deserialize;

/// The JSON document a server returns to a status request.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerStatus {
    pub version: StatusVersion,
    #[serde(default)]
    pub players: Option<StatusPlayers>,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    #[serde(default)]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPlayers {
    pub max: i32,
    pub online: i32,
}

impl ServerStatus {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The advertised protocol, if it is a usable number.
    pub fn protocol(&self) -> Option<u32> {
        u32::try_from(self.version.protocol).ok()
    }

    /// The MOTD flattened to plain text.
    pub fn motd(&self) -> String {
        match &self.description {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => TextComponent::from_json(&value.to_string()).to_plain_text(),
            None => String::new(),
        }
    }
}
