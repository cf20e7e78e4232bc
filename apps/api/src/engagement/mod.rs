// Engagement: waitlist signups, testimonials, and support tickets.
// Thin CRUD over TailorStore; validation lives on the request types.

pub mod handlers;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::engagement::NewTestimonial;

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    #[serde(default)]
    pub email: String,
}

impl WaitlistRequest {
    /// Returns the normalized (trimmed, lower-cased) email.
    pub fn validate(self) -> Result<String, AppError> {
        let email = self.email.trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        };
        if !valid {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        Ok(email)
    }
}

#[derive(Debug, Deserialize)]
pub struct TestimonialRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    pub rating: i16,
}

impl TestimonialRequest {
    pub fn validate(self) -> Result<NewTestimonial, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::Validation("content cannot be empty".to_string()));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(NewTestimonial {
            name: self.name.trim().to_string(),
            role: self
                .role
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            content: self.content.trim().to_string(),
            rating: self.rating,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl TicketRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.subject.trim().is_empty() {
            return Err(AppError::Validation("subject cannot be empty".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }
        Ok(())
    }
}
