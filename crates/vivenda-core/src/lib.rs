//! Shared domain types and configuration for the vivenda lead engine.

mod app_config;
mod config;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Commercial temperature of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualification {
    Frio,
    Morno,
    Quente,
}

impl Qualification {
    /// Parses the persisted lowercase representation; unknown values are `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "frio" => Some(Self::Frio),
            "morno" => Some(Self::Morno),
            "quente" => Some(Self::Quente),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frio => "frio",
            Self::Morno => "morno",
            Self::Quente => "quente",
        }
    }
}

/// Lifecycle status of a lead record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Novo,
    EmAtendimento,
    SemAtendimento,
    Convertido,
    Perdido,
}

impl LeadStatus {
    /// Terminal statuses exit every follow-up campaign.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Convertido | Self::Perdido)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Novo => "novo",
            Self::EmAtendimento => "em_atendimento",
            Self::SemAtendimento => "sem_atendimento",
            Self::Convertido => "convertido",
            Self::Perdido => "perdido",
        }
    }
}

/// Category of an outbound follow-up message, recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LeadFollowup,
    BrokerReminder,
    Nurturing,
}

impl AlertType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeadFollowup => "lead_followup",
            Self::BrokerReminder => "broker_reminder",
            Self::Nurturing => "nurturing",
        }
    }
}

/// Errors raised while loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_role_serializes_lowercase() {
        let msg = ChatMessage::user("olá");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "olá");
    }

    #[test]
    fn qualification_round_trips_persisted_form() {
        for q in [
            Qualification::Frio,
            Qualification::Morno,
            Qualification::Quente,
        ] {
            assert_eq!(Qualification::parse(q.as_str()), Some(q));
        }
        assert_eq!(Qualification::parse("fervendo"), None);
    }

    #[test]
    fn terminal_statuses_exit_campaigns() {
        assert!(LeadStatus::Convertido.is_terminal());
        assert!(LeadStatus::Perdido.is_terminal());
        assert!(!LeadStatus::Novo.is_terminal());
        assert!(!LeadStatus::SemAtendimento.is_terminal());
    }

    #[test]
    fn alert_type_persisted_names() {
        assert_eq!(AlertType::LeadFollowup.as_str(), "lead_followup");
        assert_eq!(AlertType::BrokerReminder.as_str(), "broker_reminder");
        assert_eq!(AlertType::Nurturing.as_str(), "nurturing");
    }
}
