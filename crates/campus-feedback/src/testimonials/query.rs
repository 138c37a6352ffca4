use serde::{Deserialize, Serialize};

use super::api::ApiError;
use super::domain::{Sentiment, Testimonial, UserType};
use crate::directory::ServiceId;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
    Helpful,
    /// Any unrecognized key keeps the filtered order.
    #[serde(other)]
    Unsorted,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Self::Newest,
            "oldest" => Self::Oldest,
            "highest" => Self::Highest,
            "lowest" => Self::Lowest,
            "helpful" => Self::Helpful,
            _ => Self::Unsorted,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Highest => "highest",
            Self::Lowest => "lowest",
            Self::Helpful => "helpful",
            Self::Unsorted => "unsorted",
        }
    }
}

/// Filter, sort, and page selection driving every testimonial fetch.
///
/// `None` disables a filter; on the wire that is an absent parameter or `"all"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestimonialFilters {
    pub service_id: Option<ServiceId>,
    pub rating: Option<u8>,
    pub sort_by: SortOrder,
    pub sentiment: Option<Sentiment>,
    pub search: Option<String>,
    pub region: Option<String>,
    pub user_type: Option<UserType>,
    pub category: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for TestimonialFilters {
    fn default() -> Self {
        Self {
            service_id: None,
            rating: None,
            sort_by: SortOrder::default(),
            sentiment: None,
            search: None,
            region: None,
            user_type: None,
            category: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TestimonialFilters {
    /// True when everything except the page cursor matches.
    pub fn same_selection(&self, other: &Self) -> bool {
        Self {
            page: 1,
            ..self.clone()
        } == Self {
            page: 1,
            ..other.clone()
        }
    }

    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn effective_limit(&self) -> u32 {
        match self.limit {
            0 => DEFAULT_PAGE_SIZE,
            limit => limit.min(MAX_PAGE_SIZE),
        }
    }

    /// Query-string pairs understood by the `/testimonials` endpoint.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sortBy", self.sort_by.key().to_string()),
            ("page", self.effective_page().to_string()),
            ("limit", self.effective_limit().to_string()),
        ];
        if let Some(service_id) = &self.service_id {
            pairs.push(("serviceId", service_id.to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.to_string()));
        }
        if let Some(sentiment) = self.sentiment {
            pairs.push(("sentiment", sentiment.label().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|text| !text.trim().is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(region) = &self.region {
            pairs.push(("region", region.clone()));
        }
        if let Some(user_type) = self.user_type {
            pairs.push(("userType", user_type.label().to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

/// Raw query-string form; every value arrives as text and `"all"` disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialQueryParams {
    pub service_id: Option<String>,
    pub rating: Option<String>,
    pub sort_by: Option<String>,
    pub sentiment: Option<String>,
    pub search: Option<String>,
    pub region: Option<String>,
    pub user_type: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn enabled(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>()
        .map_err(|_| ApiError::Validation(format!("{field} must be a number, found '{raw}'")))
}

impl TestimonialQueryParams {
    pub fn into_filters(self) -> Result<TestimonialFilters, ApiError> {
        let defaults = TestimonialFilters::default();

        let rating = enabled(self.rating)
            .map(|raw| parse_number::<u8>("rating", &raw))
            .transpose()?;
        let sentiment = enabled(self.sentiment)
            .map(|raw| {
                Sentiment::parse(&raw)
                    .ok_or_else(|| ApiError::Validation(format!("unknown sentiment '{raw}'")))
            })
            .transpose()?;
        let user_type = enabled(self.user_type)
            .map(|raw| {
                UserType::parse(&raw)
                    .ok_or_else(|| ApiError::Validation(format!("unknown user type '{raw}'")))
            })
            .transpose()?;
        let page = enabled(self.page)
            .map(|raw| parse_number::<u32>("page", &raw))
            .transpose()?
            .unwrap_or(defaults.page);
        let limit = enabled(self.limit)
            .map(|raw| parse_number::<u32>("limit", &raw))
            .transpose()?
            .unwrap_or(defaults.limit);

        Ok(TestimonialFilters {
            service_id: enabled(self.service_id).map(ServiceId::new),
            rating,
            sort_by: self
                .sort_by
                .as_deref()
                .map(SortOrder::parse)
                .unwrap_or_default(),
            sentiment,
            search: enabled(self.search),
            region: enabled(self.region),
            user_type,
            category: enabled(self.category),
            page,
            limit,
        })
    }
}

/// Infers the audience segment from a free-text role such as "Mahasiswa Teknik Sipil".
pub fn derive_user_type(role: &str) -> UserType {
    let role = role.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| role.contains(needle));

    if has(&["calon mahasiswa"]) {
        UserType::Prospective
    } else if has(&["mahasiswa"]) {
        UserType::Student
    } else if has(&["dosen", "guru besar", "professor"]) {
        UserType::Lecturer
    } else if has(&["kepala", "staff", "admin"]) {
        UserType::Staff
    } else if has(&["alumni"]) {
        UserType::Alumni
    } else if has(&["pengunjung", "tamu"]) {
        UserType::Public
    } else if has(&["mitra", "stakeholder"]) {
        UserType::Partner
    } else {
        UserType::Public
    }
}

/// Explicit `user_type` wins; otherwise it is derived from the role.
pub fn effective_user_type(testimonial: &Testimonial) -> UserType {
    testimonial
        .user_type
        .unwrap_or_else(|| derive_user_type(&testimonial.role))
}

pub fn matches(testimonial: &Testimonial, filters: &TestimonialFilters) -> bool {
    if let Some(service_id) = &filters.service_id {
        if &testimonial.service_id != service_id {
            return false;
        }
    }
    if let Some(rating) = filters.rating {
        if testimonial.rating != rating {
            return false;
        }
    }
    if let Some(sentiment) = filters.sentiment {
        if testimonial.sentiment != sentiment {
            return false;
        }
    }
    if let Some(region) = &filters.region {
        if testimonial.region.as_deref() != Some(region.as_str()) {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if testimonial.category.as_deref() != Some(category.as_str()) {
            return false;
        }
    }
    if let Some(user_type) = filters.user_type {
        if effective_user_type(testimonial) != user_type {
            return false;
        }
    }
    if let Some(search) = filters.search.as_deref() {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() {
            let hit = [&testimonial.content, &testimonial.name, &testimonial.role]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
    }
    true
}

/// Stable sort; ties keep their filtered order.
pub fn sort(testimonials: &mut [Testimonial], order: SortOrder) {
    match order {
        SortOrder::Newest => testimonials.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => testimonials.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Highest => testimonials.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortOrder::Lowest => testimonials.sort_by(|a, b| a.rating.cmp(&b.rating)),
        SortOrder::Helpful => testimonials.sort_by(|a, b| b.helpful_count.cmp(&a.helpful_count)),
        SortOrder::Unsorted => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    pub current_page: u32,
    pub per_page: u32,
    pub has_more_pages: bool,
}

/// List envelope: `{ data: [...], meta: {...} }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestimonialPage {
    pub data: Vec<Testimonial>,
    pub meta: PageMeta,
}

/// Filters, sorts, and slices one page out of `testimonials`.
pub fn run_query(testimonials: &[Testimonial], filters: &TestimonialFilters) -> TestimonialPage {
    let mut selected: Vec<Testimonial> = testimonials
        .iter()
        .filter(|testimonial| matches(testimonial, filters))
        .cloned()
        .collect();
    sort(&mut selected, filters.sort_by);

    let page = filters.effective_page();
    let limit = filters.effective_limit();
    let total = selected.len();
    let start = ((page - 1) as usize).saturating_mul(limit as usize);
    let data = selected
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .collect();

    TestimonialPage {
        data,
        meta: PageMeta {
            total,
            current_page: page,
            per_page: limit,
            has_more_pages: (page as usize).saturating_mul(limit as usize) < total,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testimonials::domain::TestimonialId;
    use crate::testimonials::seed::sample_testimonials;

    fn with_rating(id: &str, rating: u8, helpful: u32) -> Testimonial {
        let mut testimonial = sample_testimonials().remove(0);
        testimonial.id = TestimonialId::from(id);
        testimonial.rating = rating;
        testimonial.helpful_count = helpful;
        testimonial
    }

    #[test]
    fn derives_user_type_from_role() {
        assert_eq!(derive_user_type("Mahasiswa Teknik Sipil"), UserType::Student);
        assert_eq!(derive_user_type("Calon Mahasiswa 2025"), UserType::Prospective);
        assert_eq!(derive_user_type("Dosen Fakultas Hukum"), UserType::Lecturer);
        assert_eq!(derive_user_type("Guru Besar Kimia"), UserType::Lecturer);
        assert_eq!(derive_user_type("Kepala Bagian Umum"), UserType::Staff);
        assert_eq!(derive_user_type("Alumni 2019"), UserType::Alumni);
        assert_eq!(derive_user_type("Tamu Seminar"), UserType::Public);
        assert_eq!(derive_user_type("Mitra Industri"), UserType::Partner);
        assert_eq!(derive_user_type("Orang tua wali"), UserType::Public);
    }

    #[test]
    fn explicit_user_type_wins_over_role() {
        let mut testimonial = with_rating("t", 5, 0);
        testimonial.role = "Mahasiswa".to_string();
        testimonial.user_type = Some(UserType::Alumni);
        assert_eq!(effective_user_type(&testimonial), UserType::Alumni);
    }

    #[test]
    fn search_matches_role_only_hits() {
        let mut testimonial = with_rating("t-role", 4, 0);
        testimonial.name = "Budi".to_string();
        testimonial.content = "Pelayanan cepat".to_string();
        testimonial.role = "Staff Laboratorium Fisika".to_string();

        let filters = TestimonialFilters {
            search: Some("LABORATORIUM".to_string()),
            ..TestimonialFilters::default()
        };
        assert!(matches(&testimonial, &filters));

        let miss = TestimonialFilters {
            search: Some("perpustakaan".to_string()),
            ..TestimonialFilters::default()
        };
        assert!(!matches(&testimonial, &miss));
    }

    #[test]
    fn helpful_sort_is_stable_for_ties() {
        let mut list = vec![
            with_rating("a", 5, 2),
            with_rating("b", 4, 7),
            with_rating("c", 3, 2),
            with_rating("d", 2, 2),
        ];
        sort(&mut list, SortOrder::Helpful);
        let ids: Vec<&str> = list.iter().map(|t| t.id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn unknown_sort_keeps_filtered_order() {
        let mut list = vec![with_rating("x", 1, 0), with_rating("y", 5, 0)];
        sort(&mut list, SortOrder::parse("popularity"));
        assert_eq!(list[0].id.0, "x");
    }

    #[test]
    fn pagination_boundaries() {
        let exact: Vec<Testimonial> = (0..5)
            .map(|n| with_rating(&format!("e{n}"), 5, 0))
            .collect();
        let filters = TestimonialFilters {
            limit: 5,
            sort_by: SortOrder::Unsorted,
            ..TestimonialFilters::default()
        };
        let page = run_query(&exact, &filters);
        assert_eq!(page.data.len(), 5);
        assert!(!page.meta.has_more_pages);

        let one_more: Vec<Testimonial> = (0..6)
            .map(|n| with_rating(&format!("m{n}"), 5, 0))
            .collect();
        let first = run_query(&one_more, &filters);
        assert_eq!(first.data.len(), 5);
        assert!(first.meta.has_more_pages);
        assert_eq!(first.meta.total, 6);

        let second = run_query(&one_more, &TestimonialFilters { page: 2, ..filters });
        assert_eq!(second.data.len(), 1);
        assert!(!second.meta.has_more_pages);
    }

    #[test]
    fn query_params_treat_all_as_disabled() {
        let params = TestimonialQueryParams {
            service_id: Some("all".to_string()),
            rating: Some("4".to_string()),
            sentiment: Some("ALL".to_string()),
            user_type: Some("student".to_string()),
            sort_by: Some("helpful".to_string()),
            ..TestimonialQueryParams::default()
        };
        let filters = params.into_filters().expect("valid params");
        assert_eq!(filters.service_id, None);
        assert_eq!(filters.rating, Some(4));
        assert_eq!(filters.sentiment, None);
        assert_eq!(filters.user_type, Some(UserType::Student));
        assert_eq!(filters.sort_by, SortOrder::Helpful);
        assert_eq!(filters.page, 1);

        let invalid = TestimonialQueryParams {
            rating: Some("five".to_string()),
            ..TestimonialQueryParams::default()
        };
        assert!(matches!(invalid.into_filters(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn same_selection_ignores_page() {
        let first = TestimonialFilters::default();
        let later = TestimonialFilters {
            page: 4,
            ..TestimonialFilters::default()
        };
        assert!(first.same_selection(&later));
        let narrowed = TestimonialFilters {
            rating: Some(5),
            ..TestimonialFilters::default()
        };
        assert!(!first.same_selection(&narrowed));
    }
}
