use crate::infra::{describe_source, parse_service_id, stars, state_storage};
use campus_feedback::config::AppConfig;
use campus_feedback::directory::ServiceId;
use campus_feedback::error::AppError;
use campus_feedback::state::{MemoryStateStorage, StateStorage};
use campus_feedback::surveys::router::ScoreReport;
use campus_feedback::surveys::{
    average_rating, Answer, FeedbackMood, QuestionCategory, QuestionKind, ResponseId,
    SurveyCatalog, SurveyFeedback, SurveyResponse, SurveyResponseStore, MAX_ANSWER_SCORE,
};
use campus_feedback::testimonials::{
    ApiError, FallbackTestimonialApi, FetchStatus, HelpfulOutcome, MockTestimonialApi,
    NotificationLevel, StatsPeriod, StatsQuery, TestimonialFilters, TestimonialGateway,
    TestimonialQueryParams, TestimonialStore, TrendInterval, TrendsQuery,
};
use campus_feedback::util::dates::relative_time;
use chrono::Utc;
use clap::Args;
use std::path::Path;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Service unit the answers belong to
    #[arg(long, value_parser = parse_service_id)]
    pub(crate) service: ServiceId,
    /// JSON array of {"questionId", "answer"} objects, inline or as a file path
    #[arg(long)]
    pub(crate) answers: String,
    /// Record the response in the local survey store
    #[arg(long)]
    pub(crate) save: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BrowseArgs {
    /// Only show testimonials for this service unit
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// Exact star rating (1-5)
    #[arg(long)]
    pub(crate) rating: Option<String>,
    /// newest, oldest, highest, lowest or helpful
    #[arg(long)]
    pub(crate) sort: Option<String>,
    /// positive, neutral, negative or mixed
    #[arg(long)]
    pub(crate) sentiment: Option<String>,
    /// Case-insensitive text matched against content, name or role
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// student, lecturer, staff, alumni, prospective, public or partner
    #[arg(long)]
    pub(crate) user_type: Option<String>,
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Page size
    #[arg(long)]
    pub(crate) limit: Option<u32>,
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub(crate) pages: u32,
}

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// week, month, quarter, year or all
    #[arg(long, default_value = "all")]
    pub(crate) period: String,
    /// day, week or month
    #[arg(long, default_value = "month")]
    pub(crate) interval: String,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Service unit surveyed during the walkthrough
    #[arg(long, default_value = "1", value_parser = parse_service_id)]
    pub(crate) service: ServiceId,
    /// Name published on the resulting testimonial
    #[arg(long, default_value = "Rina Lestari")]
    pub(crate) name: String,
    /// Role published on the resulting testimonial
    #[arg(long, default_value = "Mahasiswa Teknik Informatika")]
    pub(crate) role: String,
}

type CliStore<S> = TestimonialStore<FallbackTestimonialApi, S>;

pub(crate) fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        service,
        answers,
        save,
    } = args;

    let answers = read_answers(&answers)?;
    let catalog = SurveyCatalog::default();

    let response = if save {
        let mut store = SurveyResponseStore::open(state_storage(config))?;
        let response = store.save_response(service.clone(), answers, None)?;
        let history = store.responses_for_service(&service);
        println!(
            "Saved response {} ({} on record, average {} stars)",
            response.id,
            history.len(),
            average_rating(history.iter().copied(), &catalog.questionnaire)
        );
        response
    } else {
        SurveyResponse {
            id: ResponseId("cli".to_string()),
            service_id: service,
            answers,
            completed_at: Utc::now(),
            feedback: None,
        }
    };

    render_score(&ScoreReport::build(&catalog, &response));
    Ok(())
}

fn read_answers(raw: &str) -> Result<Vec<Answer>, AppError> {
    let path = Path::new(raw);
    let json = if path.is_file() {
        std::fs::read_to_string(path)?
    } else {
        raw.to_string()
    };
    let answers = serde_json::from_str(&json).map_err(std::io::Error::from)?;
    Ok(answers)
}

fn render_score(report: &ScoreReport) {
    println!(
        "Survey score for {} ({})",
        report.service_name.unwrap_or("unknown service"),
        report.service_id
    );
    println!(
        "- Overall {} -> {} ({})",
        report.overall_display, report.band_label, report.band_color
    );
    println!("  {}", report.interpretation);
    println!(
        "- {} questions answered",
        report.scores.answered_questions
    );
    for category in QuestionCategory::ordered() {
        if let Some(score) = report.scores.categories.get(&category) {
            println!(
                "  - {}: {:.1}% (weight {:.2}, {} answered)",
                category.label(),
                score.score,
                score.weight,
                score.answered
            );
        }
    }
    if !report.scores.dimensions.is_empty() {
        println!("  Service quality dimensions:");
        for (dimension, score) in &report.scores.dimensions {
            println!("    - {dimension}: {score:.1}%");
        }
    }
}

fn open_store<S>(config: &AppConfig, storage: Arc<S>) -> Result<CliStore<S>, AppError>
where
    S: StateStorage,
{
    let gateway =
        FallbackTestimonialApi::from_config(&config.backend, MockTestimonialApi::seeded())?;
    Ok(TestimonialStore::open(Arc::new(gateway), storage)?)
}

pub(crate) fn run_browse(config: &AppConfig, args: BrowseArgs) -> Result<(), AppError> {
    let pages = args.pages.max(1);
    let filters = TestimonialQueryParams {
        service_id: args.service,
        rating: args.rating,
        sort_by: args.sort,
        sentiment: args.sentiment,
        search: args.search,
        region: args.region,
        user_type: args.user_type,
        category: args.category,
        page: None,
        limit: args.limit.map(|limit| limit.to_string()),
    }
    .into_filters()?;

    let mut store = open_store(config, state_storage(config))?;
    store.apply_filters(filters);
    for _ in 1..pages {
        if !store.has_more() {
            break;
        }
        store.load_more();
    }

    render_store(&mut store);
    Ok(())
}

fn render_store<G, S>(store: &mut TestimonialStore<G, S>)
where
    G: TestimonialGateway,
    S: StateStorage + ?Sized,
{
    let now = Utc::now();
    if let Some(source) = store.last_source() {
        println!("Source: {}", describe_source(source));
    }
    println!(
        "Showing {} of {} testimonials{}",
        store.testimonials().len(),
        store.total(),
        if store.has_more() { " (more available)" } else { "" }
    );
    if store.status() == FetchStatus::Error {
        println!("  Load failed: {}", store.error().unwrap_or("unknown error"));
    }

    for testimonial in store.testimonials() {
        println!(
            "\n{} {} - {} | {}",
            stars(testimonial.rating),
            testimonial.name,
            testimonial.role,
            testimonial.service_name
        );
        println!(
            "  {} | {} | {} found this helpful{}",
            relative_time(testimonial.date, now),
            testimonial.sentiment.label(),
            testimonial.helpful_count,
            if testimonial.is_verified { " | verified" } else { "" }
        );
        println!("  {}", testimonial.content);
        for reply in &testimonial.replies {
            let marker = if reply.is_admin { " (admin)" } else { "" };
            println!("    > {}{}: {}", reply.author, marker, reply.content);
        }
    }

    for notification in store.take_notifications() {
        let prefix = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        println!("[{prefix}] {}", notification.message);
    }
}

fn insight_queries(
    service: Option<String>,
    period: &str,
    interval: &str,
) -> Result<(StatsQuery, TrendsQuery), ApiError> {
    let service_id = service
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
        .map(ServiceId::new);
    let period = StatsPeriod::parse(period)
        .ok_or_else(|| ApiError::Validation(format!("unknown period '{period}'")))?;
    let interval = TrendInterval::parse(interval)
        .ok_or_else(|| ApiError::Validation(format!("unknown interval '{interval}'")))?;

    Ok((
        StatsQuery {
            service_id: service_id.clone(),
            period,
        },
        TrendsQuery {
            service_id,
            period,
            interval,
        },
    ))
}

pub(crate) fn run_stats(config: &AppConfig, args: StatsArgs) -> Result<(), AppError> {
    let (stats_query, trends_query) = insight_queries(args.service, &args.period, &args.interval)?;
    let store = open_store(config, state_storage(config))?;

    let stats = store.stats(&stats_query)?;
    let trends = store.trends(&trends_query)?;

    println!(
        "Testimonial statistics ({}, source: {})",
        stats_query.period.key(),
        describe_source(&stats.source)
    );
    let stats = stats.value;
    match stats.average_rating {
        Some(average) => println!("- {} testimonials | average {average:.1} stars", stats.total),
        None => println!("- {} testimonials | no ratings yet", stats.total),
    }
    println!(
        "- {} verified | {} featured | {} helpful marks | {} replies",
        stats.verified_count, stats.featured_count, stats.total_helpful, stats.reply_count
    );
    println!("Rating distribution:");
    for bucket in &stats.rating_distribution {
        println!(
            "  {} {:>3} ({:.1}%)",
            stars(bucket.stars),
            bucket.count,
            bucket.percentage
        );
    }
    println!("Sentiment:");
    for (sentiment, count) in &stats.sentiment_breakdown {
        println!("  - {}: {count}", sentiment.label());
    }

    println!("Trend ({}):", trends_query.interval.key());
    for point in &trends.value {
        println!(
            "  - {}: {} testimonials, average {:.1}",
            point.period_start, point.count, point.average_rating
        );
    }
    Ok(())
}

pub(crate) fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        service,
        name,
        role,
    } = args;

    // Demo state stays in memory so it never touches the user's saved filters.
    let storage = Arc::new(MemoryStateStorage::default());
    let catalog = SurveyCatalog::default();

    println!("Campus feedback demo");
    println!("\n1. Survey");
    let answers: Vec<Answer> = catalog
        .questionnaire
        .questions()
        .iter()
        .filter(|question| question.kind == QuestionKind::Likert && !question.weight_exempt)
        .map(|question| Answer::new(question.id.clone(), MAX_ANSWER_SCORE.to_string()))
        .collect();
    let mut surveys = SurveyResponseStore::open(storage.clone())?;
    let response = surveys.save_response(service.clone(), answers, None)?;
    render_score(&ScoreReport::build(&catalog, &response));

    println!("\n2. Post-survey feedback");
    let mood = FeedbackMood::VerySatisfied;
    let feedback = SurveyFeedback {
        mood,
        comment: None,
        submitted_at: Utc::now(),
    };
    surveys.attach_feedback(&response.id, feedback.clone())?;
    println!("- Feedback {} attached to {}", mood.emoji(), response.id);

    let mut store = open_store(config, storage)?;
    match store.submit_testimonial(feedback.to_testimonial(service.clone(), name, role)) {
        Ok(created) => println!(
            "- Published testimonial {} ({})",
            created.id,
            stars(created.rating)
        ),
        Err(err) => println!("  Submission rejected: {}", err.user_message()),
    }

    println!("\n3. Browse");
    store.apply_filters(TestimonialFilters {
        service_id: Some(service.clone()),
        limit: 3,
        ..TestimonialFilters::default()
    });
    if let Some(first) = store.testimonials().first().map(|testimonial| testimonial.id.clone()) {
        match store.mark_helpful(&first) {
            HelpfulOutcome::Confirmed { helpful_count } => {
                println!("- Marked {first} helpful ({helpful_count} total)")
            }
            HelpfulOutcome::AlreadyMarked => println!("- {first} was already marked helpful"),
            HelpfulOutcome::Reverted => println!("- Helpful mark on {first} was rolled back"),
        }
        if let Err(err) = store.add_reply(
            &first,
            "Humas Kampus",
            "Terima kasih atas masukan Anda!",
            true,
        ) {
            println!("  Reply failed: {}", err.user_message());
        }
    }
    render_store(&mut store);

    println!("\n4. Insights");
    let stats = store.stats(&StatsQuery {
        service_id: Some(service),
        period: StatsPeriod::All,
    })?;
    match stats.value.average_rating {
        Some(average) => println!(
            "- {} testimonials for this service, average {average:.1} stars",
            stats.value.total
        ),
        None => println!("- No testimonials for this service yet"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_answers_accepts_inline_json() {
        let answers = read_answers(r#"[{"questionId":"sq_tangible_1","answer":5}]"#)
            .expect("answers parse");
        assert_eq!(answers, vec![Answer::new("sq_tangible_1", "5")]);
    }

    #[test]
    fn read_answers_rejects_malformed_json() {
        match read_answers("not json") {
            Err(AppError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn insight_queries_validate_period_and_interval() {
        let (stats, trends) =
            insight_queries(Some("all".to_string()), "quarter", "week").expect("valid");
        assert!(stats.service_id.is_none());
        assert_eq!(trends.period, StatsPeriod::Quarter);
        assert_eq!(trends.interval, TrendInterval::Week);

        assert!(matches!(
            insight_queries(None, "decade", "week"),
            Err(ApiError::Validation(_))
        ));
    }
}
