//! Customer testimonials shown on the storefront.

use chrono::{DateTime, Utc};
use serde::Serialize;

use terracotta_core::TestimonialId;

/// A seeded customer testimonial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub name: String,
    pub role: String,
    pub image: Option<String>,
    pub content: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}
