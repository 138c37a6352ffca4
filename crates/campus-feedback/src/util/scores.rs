use serde::{Deserialize, Serialize};

use crate::testimonials::domain::{Sentiment, Testimonial};

/// Rounds to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Mean testimonial rating on the 1-5 scale, one decimal place.
pub fn average_rating_of(testimonials: &[Testimonial]) -> Option<f64> {
    if testimonials.is_empty() {
        return None;
    }
    let total: u32 = testimonials.iter().map(|t| u32::from(t.rating)).sum();
    Some(round_to(total as f64 / testimonials.len() as f64, 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub stars: u8,
    pub count: usize,
    pub percentage: f64,
}

/// Count per star (5 down to 1) with the share of the total, two decimals.
pub fn rating_distribution(testimonials: &[Testimonial]) -> Vec<RatingBucket> {
    let total = testimonials.len();
    (1..=5u8)
        .rev()
        .map(|stars| {
            let count = testimonials.iter().filter(|t| t.rating == stars).count();
            let percentage = if total == 0 {
                0.0
            } else {
                round_to(count as f64 * 100.0 / total as f64, 2)
            };
            RatingBucket {
                stars,
                count,
                percentage,
            }
        })
        .collect()
}

pub fn sentiment_for_rating(rating: u8) -> Sentiment {
    match rating {
        4..=u8::MAX => Sentiment::Positive,
        3 => Sentiment::Neutral,
        _ => Sentiment::Negative,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl ScoreBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 85.0 {
            Self::Excellent
        } else if percentage >= 70.0 {
            Self::Good
        } else if percentage >= 55.0 {
            Self::Fair
        } else if percentage >= 40.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Sangat Baik",
            Self::Good => "Baik",
            Self::Fair => "Cukup",
            Self::Poor => "Kurang",
            Self::VeryPoor => "Sangat Kurang",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Excellent => "#16a34a",
            Self::Good => "#65a30d",
            Self::Fair => "#ca8a04",
            Self::Poor => "#ea580c",
            Self::VeryPoor => "#dc2626",
        }
    }

    pub const fn interpretation(self) -> &'static str {
        match self {
            Self::Excellent => "Layanan sangat memuaskan dan bebas dari praktik korupsi.",
            Self::Good => "Layanan memuaskan dengan sedikit ruang perbaikan.",
            Self::Fair => "Layanan cukup, beberapa aspek perlu ditingkatkan.",
            Self::Poor => "Layanan kurang memuaskan dan perlu evaluasi.",
            Self::VeryPoor => "Layanan tidak memuaskan dan memerlukan tindakan segera.",
        }
    }
}

/// Color for a 0-5 star value.
pub fn star_color(stars: f64) -> &'static str {
    ScoreBand::from_percentage(stars * 20.0).color()
}

/// `100` -> `"100%"`, `87.5` -> `"87.5%"`, `66.666` -> `"66.67%"`.
pub fn format_percentage(value: f64) -> String {
    let rounded = round_to(value, 2);
    let mut text = format!("{rounded:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{text}%")
}
