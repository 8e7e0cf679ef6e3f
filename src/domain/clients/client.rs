//! Client roster entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    AttributeMap, ClientId, Timestamp, TrainerId, ValidationError,
};
use crate::domain::identity::normalize_email;
use crate::domain::scheduling::append_paragraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
    Athlete,
}

impl FitnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "beginner",
            FitnessLevel::Intermediate => "intermediate",
            FitnessLevel::Advanced => "advanced",
            FitnessLevel::Athlete => "athlete",
        }
    }
}

impl FromStr for FitnessLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(FitnessLevel::Beginner),
            "intermediate" => Ok(FitnessLevel::Intermediate),
            "advanced" => Ok(FitnessLevel::Advanced),
            "athlete" => Ok(FitnessLevel::Athlete),
            other => Err(ValidationError::invalid_format(
                "fitness_level",
                format!("unknown fitness level '{}'", other),
            )),
        }
    }
}

/// Rolled-up payment standing of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl ClientPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientPaymentStatus::Pending => "pending",
            ClientPaymentStatus::Paid => "paid",
            ClientPaymentStatus::Overdue => "overdue",
        }
    }
}

impl FromStr for ClientPaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClientPaymentStatus::Pending),
            "paid" => Ok(ClientPaymentStatus::Paid),
            "overdue" => Ok(ClientPaymentStatus::Overdue),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown payment status '{}'", other),
            )),
        }
    }
}

impl fmt::Display for ClientPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client on a trainer's roster. (trainer, email) is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub trainer_id: TrainerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub fitness_level: FitnessLevel,
    pub goals: Vec<String>,
    pub preferences: AttributeMap,
    pub notes: String,
    pub is_active: bool,
    pub total_paid_cents: i64,
    pub last_payment_date: Option<NaiveDate>,
    pub payment_status: ClientPaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Editable client fields.
#[derive(Debug, Clone, Default)]
pub struct ClientDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub fitness_level: Option<FitnessLevel>,
    pub goals: Vec<String>,
    pub preferences: AttributeMap,
    pub notes: Option<String>,
}

impl Client {
    pub fn new(trainer_id: TrainerId, details: ClientDetails, now: Timestamp) -> Result<Self, ValidationError> {
        let name = validate_name(&details.name)?;
        let email = normalize_email(&details.email)?;
        Ok(Self {
            id: ClientId::new(),
            trainer_id,
            name,
            email,
            phone: details.phone.filter(|p| !p.trim().is_empty()),
            fitness_level: details.fitness_level.unwrap_or(FitnessLevel::Beginner),
            goals: clean_goals(details.goals),
            preferences: details.preferences,
            notes: details.notes.unwrap_or_default(),
            is_active: true,
            total_paid_cents: 0,
            last_payment_date: None,
            payment_status: ClientPaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_details(&mut self, details: ClientDetails, now: Timestamp) -> Result<(), ValidationError> {
        self.name = validate_name(&details.name)?;
        self.email = normalize_email(&details.email)?;
        self.phone = details.phone.filter(|p| !p.trim().is_empty());
        if let Some(level) = details.fitness_level {
            self.fitness_level = level;
        }
        self.goals = clean_goals(details.goals);
        self.preferences = details.preferences;
        if let Some(notes) = details.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_active(&mut self, active: bool, now: Timestamp) {
        self.is_active = active;
        self.updated_at = now;
    }

    /// Folds a manual payment into the rollups.
    pub fn record_payment(&mut self, amount_cents: i64, paid_on: NaiveDate, now: Timestamp) {
        self.total_paid_cents += amount_cents;
        self.last_payment_date = Some(match self.last_payment_date {
            Some(previous) if previous > paid_on => previous,
            _ => paid_on,
        });
        self.payment_status = ClientPaymentStatus::Paid;
        self.updated_at = now;
    }

    pub fn append_note(&mut self, paragraph: &str, now: Timestamp) {
        append_paragraph(&mut self.notes, paragraph);
        self.updated_at = now;
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    if name.chars().count() > 200 {
        return Err(ValidationError::out_of_range("name", 1, 200, name.chars().count() as i64));
    }
    Ok(name.to_string())
}

fn clean_goals(goals: Vec<String>) -> Vec<String> {
    goals
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}
