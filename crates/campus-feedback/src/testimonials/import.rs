use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Sentiment, Testimonial, TestimonialId, UserType};
use crate::directory::{ServiceDirectory, ServiceId};
use crate::util::dates::parse_timestamp;
use crate::util::scores::sentiment_for_rating;

#[derive(Debug)]
pub enum TestimonialImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for TestimonialImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestimonialImportError::Io(err) => {
                write!(f, "failed to read testimonial export: {}", err)
            }
            TestimonialImportError::Csv(err) => write!(f, "invalid testimonial CSV data: {}", err),
            TestimonialImportError::InvalidRow { line, reason } => {
                write!(f, "testimonial CSV line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for TestimonialImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TestimonialImportError::Io(err) => Some(err),
            TestimonialImportError::Csv(err) => Some(err),
            TestimonialImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for TestimonialImportError {
    fn from(err: std::io::Error) -> Self {
        TestimonialImportError::Io(err)
    }
}

impl From<csv::Error> for TestimonialImportError {
    fn from(err: csv::Error) -> Self {
        TestimonialImportError::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct TestimonialRow {
    id: String,
    name: String,
    #[serde(default)]
    role: String,
    content: String,
    rating: u8,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sentiment: Option<String>,
    date: String,
    service_id: String,
    #[serde(default)]
    helpful_count: Option<u32>,
    #[serde(default)]
    is_verified: Option<bool>,
    #[serde(default)]
    is_featured: Option<bool>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    user_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    region: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Loads testimonials from a CSV export, resolving service names through the directory.
pub struct TestimonialCsvImporter;

impl TestimonialCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        directory: &ServiceDirectory,
    ) -> Result<Vec<Testimonial>, TestimonialImportError> {
        let file = File::open(path)?;
        Self::from_reader(file, directory)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        directory: &ServiceDirectory,
    ) -> Result<Vec<Testimonial>, TestimonialImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut testimonials: Vec<Testimonial> = Vec::new();

        for record in csv_reader.deserialize::<TestimonialRow>() {
            let row = record?;
            // header is line 1
            let line = testimonials.len() as u64 + 2;
            let invalid = |reason: String| TestimonialImportError::InvalidRow { line, reason };

            if !(1..=5).contains(&row.rating) {
                return Err(invalid(format!("rating {} outside 1-5", row.rating)));
            }
            let date = parse_timestamp(&row.date)
                .ok_or_else(|| invalid(format!("unparseable date '{}'", row.date)))?;
            let sentiment = match row.sentiment.as_deref() {
                Some(raw) => Sentiment::parse(raw)
                    .ok_or_else(|| invalid(format!("unknown sentiment '{raw}'")))?,
                None => sentiment_for_rating(row.rating),
            };
            let user_type = match row.user_type.as_deref() {
                Some(raw) => Some(
                    UserType::parse(raw)
                        .ok_or_else(|| invalid(format!("unknown user type '{raw}'")))?,
                ),
                None => None,
            };

            let service_id = ServiceId::new(&row.service_id);
            let unit = directory.find(&service_id);
            if testimonials.iter().any(|known| known.id.0 == row.id) {
                return Err(invalid(format!("duplicate id '{}'", row.id)));
            }

            testimonials.push(Testimonial {
                id: TestimonialId(row.id),
                name: row.name,
                role: row.role,
                content: row.content,
                rating: row.rating,
                sentiment,
                date,
                service_name: unit
                    .map(|unit| unit.name.to_string())
                    .unwrap_or_else(|| format!("Layanan {service_id}")),
                region: row.region.or_else(|| unit.map(|unit| unit.region.to_string())),
                category: row
                    .category
                    .or_else(|| unit.map(|unit| unit.category.slug().to_string())),
                service_id,
                helpful_count: row.helpful_count.unwrap_or(0),
                is_verified: row.is_verified.unwrap_or(false),
                is_featured: row.is_featured.unwrap_or(false),
                replies: Vec::new(),
                user_type,
            });
        }

        Ok(testimonials)
    }
}
