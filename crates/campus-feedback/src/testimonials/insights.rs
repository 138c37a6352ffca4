use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Sentiment, Testimonial};
use crate::directory::ServiceId;
use crate::util::scores::{average_rating_of, rating_distribution, round_to, RatingBucket};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    Week,
    Month,
    Quarter,
    Year,
    #[default]
    All,
}

impl StatsPeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    /// Earliest timestamp inside the window ending at `now`.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
            Self::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendInterval {
    Day,
    Week,
    #[default]
    Month,
}

impl TrendInterval {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// First day of the bucket containing `date`. Weeks start on Monday.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsQuery {
    pub service_id: Option<ServiceId>,
    pub period: StatsPeriod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendsQuery {
    pub service_id: Option<ServiceId>,
    pub period: StatsPeriod,
    pub interval: TrendInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialStats {
    pub total: usize,
    pub average_rating: Option<f64>,
    pub rating_distribution: Vec<RatingBucket>,
    pub sentiment_breakdown: BTreeMap<Sentiment, usize>,
    pub verified_count: usize,
    pub featured_count: usize,
    pub total_helpful: u64,
    pub reply_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub count: usize,
    pub average_rating: f64,
}

fn in_window(
    testimonials: &[Testimonial],
    service_id: Option<&ServiceId>,
    period: StatsPeriod,
    now: DateTime<Utc>,
) -> Vec<Testimonial> {
    let since = period.since(now);
    testimonials
        .iter()
        .filter(|testimonial| service_id.map_or(true, |id| &testimonial.service_id == id))
        .filter(|testimonial| since.map_or(true, |since| testimonial.date >= since))
        .cloned()
        .collect()
}

pub fn testimonial_stats(
    testimonials: &[Testimonial],
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> TestimonialStats {
    let selected = in_window(testimonials, query.service_id.as_ref(), query.period, now);

    let mut sentiment_breakdown: BTreeMap<Sentiment, usize> = Sentiment::ordered()
        .into_iter()
        .map(|sentiment| (sentiment, 0))
        .collect();
    for testimonial in &selected {
        *sentiment_breakdown.entry(testimonial.sentiment).or_default() += 1;
    }

    TestimonialStats {
        total: selected.len(),
        average_rating: average_rating_of(&selected),
        rating_distribution: rating_distribution(&selected),
        sentiment_breakdown,
        verified_count: selected.iter().filter(|t| t.is_verified).count(),
        featured_count: selected.iter().filter(|t| t.is_featured).count(),
        total_helpful: selected.iter().map(|t| u64::from(t.helpful_count)).sum(),
        reply_count: selected.iter().map(|t| t.replies.len()).sum(),
    }
}

/// Count and mean rating per interval bucket, oldest bucket first.
pub fn testimonial_trends(
    testimonials: &[Testimonial],
    query: &TrendsQuery,
    now: DateTime<Utc>,
) -> Vec<TrendPoint> {
    let selected = in_window(testimonials, query.service_id.as_ref(), query.period, now);

    let mut buckets: BTreeMap<NaiveDate, (usize, u32)> = BTreeMap::new();
    for testimonial in &selected {
        let start = query.interval.bucket_start(testimonial.date.date_naive());
        let entry = buckets.entry(start).or_default();
        entry.0 += 1;
        entry.1 += u32::from(testimonial.rating);
    }

    buckets
        .into_iter()
        .map(|(period_start, (count, rating_sum))| TrendPoint {
            period_start,
            count,
            average_rating: round_to(f64::from(rating_sum) / count as f64, 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testimonials::seed::sample_testimonials;

    fn now() -> DateTime<Utc> {
        "2024-09-15T00:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn stats_cover_whole_dataset_by_default() {
        let testimonials = sample_testimonials();
        let stats = testimonial_stats(&testimonials, &StatsQuery::default(), now());

        assert_eq!(stats.total, 12);
        assert_eq!(stats.sentiment_breakdown[&Sentiment::Mixed], 3);
        assert_eq!(stats.sentiment_breakdown.values().sum::<usize>(), 12);
        assert_eq!(stats.reply_count, 1);
        assert_eq!(stats.featured_count, 3);
        assert_eq!(stats.average_rating, Some(3.7));
    }

    #[test]
    fn stats_respect_service_and_period() {
        let testimonials = sample_testimonials();
        let query = StatsQuery {
            service_id: Some(ServiceId::from("1")),
            period: StatsPeriod::Month,
        };
        let stats = testimonial_stats(&testimonials, &query, now());
        assert_eq!(stats.total, 1);
        assert_eq!(stats.average_rating, Some(5.0));

        let empty = testimonial_stats(
            &testimonials,
            &StatsQuery {
                service_id: Some(ServiceId::from("99")),
                period: StatsPeriod::All,
            },
            now(),
        );
        assert_eq!(empty.total, 0);
        assert_eq!(empty.average_rating, None);
        assert_eq!(empty.sentiment_breakdown[&Sentiment::Positive], 0);
    }

    #[test]
    fn monthly_trends_are_ordered_oldest_first() {
        let testimonials = sample_testimonials();
        let trends = testimonial_trends(&testimonials, &TrendsQuery::default(), now());

        let starts: Vec<String> = trends
            .iter()
            .map(|point| point.period_start.to_string())
            .collect();
        assert_eq!(
            starts,
            vec!["2024-04-01", "2024-05-01", "2024-06-01", "2024-07-01", "2024-08-01", "2024-09-01"]
        );
        let may = &trends[1];
        assert_eq!(may.count, 2);
        assert_eq!(may.average_rating, 3.0);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 9, 15).expect("valid date");
        assert_eq!(
            TrendInterval::Week.bucket_start(sunday).to_string(),
            "2024-09-09"
        );
        assert_eq!(TrendInterval::Month.bucket_start(sunday).to_string(), "2024-09-01");
    }
}
