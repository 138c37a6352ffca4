//! Percentage scoring of survey responses.
//!
//! Likert answers sit on a fixed 1-6 scale. A category score is the share of
//! the maximum attainable points across the answered questions, rounded to two
//! decimals. Responses whose answered questions are all at the maximum always
//! score exactly 100, at category and at overall level, so a perfect response
//! never renders as 99.99 after weighted averaging.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use super::domain::{Answer, SurveyResponse};
use super::questionnaire::{Question, QuestionCategory, QuestionKind, Questionnaire};
use crate::util::scores::round_to;

pub const MAX_ANSWER_SCORE: u32 = 6;
const MIN_ANSWER_SCORE: u32 = 1;

/// Answer lookup keyed by question id; a later duplicate replaces an earlier one.
struct AnswerIndex<'a> {
    by_question: HashMap<&'a str, &'a str>,
}

impl<'a> AnswerIndex<'a> {
    fn new(answers: &'a [Answer]) -> Self {
        let by_question = answers
            .iter()
            .map(|answer| (answer.question_id.as_str(), answer.answer.as_str()))
            .collect();
        Self { by_question }
    }

    /// Points for `question`, or `None` when it does not count toward scores.
    fn points(&self, question: &Question) -> Option<u32> {
        if question.weight_exempt || question.kind == QuestionKind::OpenText {
            return None;
        }

        let raw = self.by_question.get(question.id.as_str())?;
        if question
            .option_for(raw)
            .is_some_and(|option| option.score == 0)
        {
            return None;
        }

        raw.trim()
            .parse::<u32>()
            .ok()
            .filter(|value| (MIN_ANSWER_SCORE..=MAX_ANSWER_SCORE).contains(value))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: u32,
    answered: u32,
    all_max: bool,
}

impl Tally {
    fn collect<'q>(
        index: &AnswerIndex<'_>,
        questions: impl IntoIterator<Item = &'q Question>,
    ) -> Self {
        let mut tally = Tally {
            all_max: true,
            ..Tally::default()
        };
        for points in questions.into_iter().filter_map(|question| index.points(question)) {
            tally.total += points;
            tally.answered += 1;
            tally.all_max &= points == MAX_ANSWER_SCORE;
        }
        tally
    }

    fn percentage(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        if self.all_max {
            return 100.0;
        }
        let max_possible = self.answered * MAX_ANSWER_SCORE;
        round_to(self.total as f64 / max_possible as f64 * 100.0, 2)
    }
}

/// Score of one group of questions against a set of answers.
pub fn category_score<'q>(
    answers: &[Answer],
    questions: impl IntoIterator<Item = &'q Question>,
) -> f64 {
    let index = AnswerIndex::new(answers);
    Tally::collect(&index, questions).percentage()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: f64,
    pub answered: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedScores {
    pub categories: BTreeMap<QuestionCategory, CategoryScore>,
    pub dimensions: BTreeMap<String, f64>,
    pub overall: f64,
    pub answered_questions: u32,
}

impl DetailedScores {
    pub fn category(&self, category: QuestionCategory) -> f64 {
        self.categories
            .get(&category)
            .map(|entry| entry.score)
            .unwrap_or(0.0)
    }

    pub fn weight_sum(&self) -> f64 {
        self.categories.values().map(|entry| entry.weight).sum()
    }
}

/// Category, dimension, and overall scores for a response.
///
/// Categories are weighted by how many scorable questions the respondent
/// actually answered in each of them.
pub fn detailed_scores(response: &SurveyResponse, questionnaire: &Questionnaire) -> DetailedScores {
    let index = AnswerIndex::new(&response.answers);

    let tallies: Vec<(QuestionCategory, Tally)> = QuestionCategory::ordered()
        .into_iter()
        .map(|category| {
            let questions = questionnaire
                .questions()
                .iter()
                .filter(move |question| question.category == category);
            (category, Tally::collect(&index, questions))
        })
        .collect();

    let dimensions = questionnaire
        .dimensions()
        .into_iter()
        .map(|dimension| {
            let questions = questionnaire.questions().iter().filter(|question| {
                question.category == QuestionCategory::ServiceQuality
                    && question.dimension.as_deref() == Some(dimension)
            });
            (
                dimension.to_string(),
                Tally::collect(&index, questions).percentage(),
            )
        })
        .collect();

    let answered_questions: u32 = tallies.iter().map(|(_, tally)| tally.answered).sum();

    let categories: BTreeMap<QuestionCategory, CategoryScore> = tallies
        .iter()
        .map(|(category, tally)| {
            let weight = if answered_questions == 0 {
                0.0
            } else {
                tally.answered as f64 / answered_questions as f64
            };
            (
                *category,
                CategoryScore {
                    score: tally.percentage(),
                    weight,
                    answered: tally.answered,
                },
            )
        })
        .collect();

    DetailedScores {
        overall: overall_score(&categories, answered_questions),
        categories,
        dimensions,
        answered_questions,
    }
}

fn overall_score(categories: &BTreeMap<QuestionCategory, CategoryScore>, answered: u32) -> f64 {
    if answered == 0 {
        return 0.0;
    }

    let scored: Vec<&CategoryScore> = categories
        .values()
        .filter(|entry| entry.answered > 0)
        .collect();

    if scored.iter().all(|entry| round_to(entry.score, 2) == 100.0) {
        return 100.0;
    }

    let weighted: f64 = scored.iter().map(|entry| entry.score * entry.weight).sum();
    let overall = round_to(weighted, 2);

    if overall > 99.0 && scored.iter().all(|entry| entry.score >= 99.0) {
        return 100.0;
    }
    overall
}

/// Single-pass percentage of a response across every scorable question.
pub fn response_percentage(response: &SurveyResponse, questionnaire: &Questionnaire) -> f64 {
    let index = AnswerIndex::new(&response.answers);
    Tally::collect(&index, questionnaire.questions()).percentage()
}

/// Mean star rating over many responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AverageRating {
    Stars(f64),
    NotApplicable,
}

impl AverageRating {
    pub fn stars(self) -> Option<f64> {
        match self {
            Self::Stars(stars) => Some(stars),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stars(stars) => write!(f, "{stars:.1}"),
            Self::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Averages response percentages on a 5-star scale.
///
/// Responses scoring exactly 0 carry no usable answers and are left out; when
/// nothing remains the result is `NotApplicable`.
pub fn average_rating<'r>(
    responses: impl IntoIterator<Item = &'r SurveyResponse>,
    questionnaire: &Questionnaire,
) -> AverageRating {
    let percentages: Vec<f64> = responses
        .into_iter()
        .map(|response| response_percentage(response, questionnaire))
        .filter(|percentage| *percentage != 0.0)
        .collect();

    if percentages.is_empty() {
        return AverageRating::NotApplicable;
    }

    let mean = percentages.iter().sum::<f64>() / percentages.len() as f64;
    AverageRating::Stars(round_to(mean / 20.0, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ServiceId;
    use crate::surveys::domain::ResponseId;
    use crate::surveys::questionnaire::CONTACT_CONSENT_QUESTION;
    use chrono::Utc;

    fn response(answers: &[(&str, &str)]) -> SurveyResponse {
        SurveyResponse {
            id: ResponseId("r-test".to_string()),
            service_id: ServiceId::from("1"),
            answers: answers
                .iter()
                .map(|(question, value)| Answer::new(*question, *value))
                .collect(),
            completed_at: Utc::now(),
            feedback: None,
        }
    }

    fn single_question_rubric() -> Questionnaire {
        Questionnaire::new(vec![Question::likert(
            "q1",
            QuestionCategory::ServiceQuality,
            "Satu pertanyaan",
        )])
    }

    #[test]
    fn category_score_rounds_to_two_decimals() {
        let questionnaire = Questionnaire::standard();
        let questions = questionnaire.by_category(QuestionCategory::CorruptionPerception);
        let answers = response(&[
            ("cp_no_extra_fees", "5"),
            ("cp_no_gratuities", "6"),
            ("cp_no_brokers", "4"),
        ])
        .answers;

        // 15 of 18 points
        assert_eq!(category_score(&answers, questions), 83.33);
    }

    #[test]
    fn category_score_ignores_exempt_dont_know_and_invalid_answers() {
        let questionnaire = Questionnaire::standard();
        let answers = response(&[
            ("si_honest_answers", "3"),
            ("si_no_pressure", "0"),
            (CONTACT_CONSENT_QUESTION, "1"),
            ("cp_no_brokers", "abc"),
            ("cp_no_extra_fees", "9"),
        ])
        .answers;

        let integrity = questionnaire.by_category(QuestionCategory::SurveyIntegrity);
        assert_eq!(category_score(&answers, integrity), 50.0);

        let corruption = questionnaire.by_category(QuestionCategory::CorruptionPerception);
        assert_eq!(category_score(&answers, corruption), 0.0);
    }

    #[test]
    fn perfect_response_scores_exactly_one_hundred() {
        let questionnaire = Questionnaire::standard();
        let answers: Vec<(&str, &str)> = vec![
            ("cp_no_extra_fees", "6"),
            ("sq_tangible_facility", "6"),
            ("sq_empathy_needs", "6"),
            ("sq_assurance_security", "6"),
            ("si_honest_answers", "6"),
            ("si_no_pressure", "6"),
            ("open_suggestions", "Pertahankan!"),
        ];
        let scores = detailed_scores(&response(&answers), &questionnaire);

        assert_eq!(scores.overall, 100.0);
        for category in QuestionCategory::ordered() {
            assert_eq!(scores.category(category), 100.0);
        }
        assert_eq!(scores.dimensions.get("tangibles"), Some(&100.0));
        assert_eq!(scores.dimensions.get("reliability"), Some(&0.0));
    }

    #[test]
    fn partially_answered_perfect_response_still_scores_one_hundred() {
        let questionnaire = Questionnaire::standard();
        let scores = detailed_scores(
            &response(&[("sq_reliability_procedure", "6")]),
            &questionnaire,
        );
        assert_eq!(scores.overall, 100.0);
        assert_eq!(scores.category(QuestionCategory::CorruptionPerception), 0.0);
        assert_eq!(scores.answered_questions, 1);
    }

    #[test]
    fn empty_response_scores_zero_everywhere() {
        let scores = detailed_scores(&response(&[]), &Questionnaire::standard());
        assert_eq!(scores.overall, 0.0);
        assert_eq!(scores.answered_questions, 0);
        assert!(scores.categories.values().all(|entry| entry.score == 0.0));
        assert_eq!(scores.weight_sum(), 0.0);
    }

    #[test]
    fn categories_are_weighted_by_answered_questions() {
        let questionnaire = Questionnaire::standard();
        let scores = detailed_scores(
            &response(&[
                ("cp_no_extra_fees", "3"),
                ("sq_tangible_facility", "6"),
                ("sq_tangible_information", "6"),
                ("sq_reliability_procedure", "6"),
            ]),
            &questionnaire,
        );

        let corruption = scores.categories[&QuestionCategory::CorruptionPerception];
        let quality = scores.categories[&QuestionCategory::ServiceQuality];
        assert_eq!(corruption.score, 50.0);
        assert_eq!(corruption.weight, 0.25);
        assert_eq!(quality.weight, 0.75);
        assert_eq!(scores.overall, 87.5);
        assert!((scores.weight_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn near_perfect_weighted_overall_snaps_to_one_hundred() {
        let mut questions: Vec<Question> = (0..120)
            .map(|n| {
                Question::likert(
                    &format!("sq_{n}"),
                    QuestionCategory::ServiceQuality,
                    "kualitas",
                )
            })
            .collect();
        questions.push(Question::likert(
            "cp_0",
            QuestionCategory::CorruptionPerception,
            "korupsi",
        ));
        let questionnaire = Questionnaire::new(questions);

        let mut answers: Vec<(String, String)> = (0..120)
            .map(|n| (format!("sq_{n}"), "6".to_string()))
            .collect();
        answers[0].1 = "1".to_string();
        answers.push(("cp_0".to_string(), "6".to_string()));
        let borrowed: Vec<(&str, &str)> = answers
            .iter()
            .map(|(question, value)| (question.as_str(), value.as_str()))
            .collect();

        let scores = detailed_scores(&response(&borrowed), &questionnaire);
        // 715 / 720 points in service quality
        assert_eq!(scores.category(QuestionCategory::ServiceQuality), 99.31);
        assert_eq!(scores.overall, 100.0);
    }

    #[test]
    fn average_rating_skips_empty_responses() {
        let rubric = single_question_rubric();
        let responses = vec![response(&[("q1", "6")]), response(&[])];
        assert_eq!(average_rating(&responses, &rubric), AverageRating::Stars(5.0));
    }

    #[test]
    fn average_rating_is_not_applicable_without_scorable_answers() {
        let rubric = single_question_rubric();
        let responses = vec![response(&[]), response(&[("q1", "zero")])];
        let rating = average_rating(&responses, &rubric);
        assert_eq!(rating, AverageRating::NotApplicable);
        assert_eq!(rating.to_string(), "N/A");
        assert_eq!(serde_json::to_value(rating).expect("serializes"), serde_json::Value::Null);
    }

    #[test]
    fn average_rating_converts_mean_percentage_to_stars() {
        let rubric = single_question_rubric();
        let responses = vec![response(&[("q1", "3")]), response(&[("q1", "6")])];
        // (50 + 100) / 2 = 75% -> 3.75 -> 3.8
        assert_eq!(average_rating(&responses, &rubric), AverageRating::Stars(3.8));
    }
}
