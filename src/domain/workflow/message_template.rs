//! Reusable message templates referenced by send actions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{TemplateId, Timestamp, TrainerId, ValidationError};

pub const SMS_MAX_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Email,
    Sms,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Email => "email",
            TemplateKind::Sms => "sms",
        }
    }
}

impl FromStr for TemplateKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(TemplateKind::Email),
            "sms" => Ok(TemplateKind::Sms),
            other => Err(ValidationError::invalid_format(
                "template_type",
                format!("unknown template type '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: TemplateId,
    pub trainer_id: TrainerId,
    pub kind: TemplateKind,
    pub name: String,
    pub subject: Option<String>,
    pub body: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MessageTemplate {
    pub fn new(
        trainer_id: TrainerId,
        kind: TemplateKind,
        name: &str,
        subject: Option<String>,
        body: String,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let mut template = Self {
            id: TemplateId::new(),
            trainer_id,
            kind,
            name: String::new(),
            subject: None,
            body: String::new(),
            created_at: now,
            updated_at: now,
        };
        template.update(name, subject, body, now)?;
        Ok(template)
    }

    pub fn update(&mut self, name: &str, subject: Option<String>, body: String, now: Timestamp) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if body.trim().is_empty() {
            return Err(ValidationError::empty_field("body"));
        }
        let subject = match self.kind {
            TemplateKind::Email => {
                let subject = subject.filter(|s| !s.trim().is_empty());
                if subject.is_none() {
                    return Err(ValidationError::empty_field("subject"));
                }
                subject
            }
            TemplateKind::Sms => {
                let length = body.chars().count();
                if length > SMS_MAX_CHARS {
                    return Err(ValidationError::out_of_range("body", 1, SMS_MAX_CHARS as i64, length as i64));
                }
                None
            }
        };
        self.name = name.to_string();
        self.subject = subject;
        self.body = body;
        self.updated_at = now;
        Ok(())
    }
}
