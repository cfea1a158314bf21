//! Testimonial handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::TestimonialRepository;
use crate::error::Result;
use crate::models::Testimonial;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TestimonialsResponse {
    pub testimonials: Vec<Testimonial>,
}

/// `GET /testimonials`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<TestimonialsResponse>> {
    let testimonials = TestimonialRepository::new(state.pool()).list().await?;
    Ok(Json(TestimonialsResponse { testimonials }))
}
