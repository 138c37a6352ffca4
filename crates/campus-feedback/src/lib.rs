//! Survey scoring, testimonial aggregation, and the client-side stores that
//! back the university service-satisfaction platform.

pub mod config;
pub mod directory;
pub mod error;
pub mod state;
pub mod surveys;
pub mod telemetry;
pub mod testimonials;
pub mod util;
