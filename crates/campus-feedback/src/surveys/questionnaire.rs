use serde::{Deserialize, Serialize};

/// Top-level grouping used for weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    CorruptionPerception,
    ServiceQuality,
    SurveyIntegrity,
}

impl QuestionCategory {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::CorruptionPerception,
            Self::ServiceQuality,
            Self::SurveyIntegrity,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::CorruptionPerception => "corruption_perception",
            Self::ServiceQuality => "service_quality",
            Self::SurveyIntegrity => "survey_integrity",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CorruptionPerception => "Persepsi Anti Korupsi",
            Self::ServiceQuality => "Kualitas Layanan",
            Self::SurveyIntegrity => "Integritas Survei",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Likert,
    OpenText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub category: QuestionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    /// Never contributes to any score, regardless of the answer.
    #[serde(default)]
    pub weight_exempt: bool,
}

impl Question {
    /// Six-point agreement scale plus a zero-score "don't know" option.
    pub fn likert(id: &str, category: QuestionCategory, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            category,
            dimension: None,
            kind: QuestionKind::Likert,
            options: likert_options(),
            weight_exempt: false,
        }
    }

    pub fn open_text(id: &str, category: QuestionCategory, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            category,
            dimension: None,
            kind: QuestionKind::OpenText,
            options: Vec::new(),
            weight_exempt: true,
        }
    }

    pub fn with_dimension(mut self, dimension: &str) -> Self {
        self.dimension = Some(dimension.to_string());
        self
    }

    pub fn weight_exempt(mut self) -> Self {
        self.weight_exempt = true;
        self
    }

    pub fn option_for(&self, value: &str) -> Option<&QuestionOption> {
        let value = value.trim();
        self.options.iter().find(|option| option.value == value)
    }
}

fn likert_options() -> Vec<QuestionOption> {
    const LABELS: [&str; 6] = [
        "Sangat Tidak Setuju",
        "Tidak Setuju",
        "Agak Tidak Setuju",
        "Agak Setuju",
        "Setuju",
        "Sangat Setuju",
    ];

    let mut options: Vec<QuestionOption> = LABELS
        .iter()
        .zip(1u8..)
        .map(|(label, score)| QuestionOption {
            value: score.to_string(),
            label: (*label).to_string(),
            score,
        })
        .collect();
    options.push(QuestionOption {
        value: "0".to_string(),
        label: "Tidak Tahu".to_string(),
        score: 0,
    });
    options
}

/// Id of the consent question that is recorded but never scored.
pub const CONTACT_CONSENT_QUESTION: &str = "si_contact_consent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn standard() -> Self {
        use QuestionCategory::{CorruptionPerception, ServiceQuality, SurveyIntegrity};

        let quality = |id: &str, dimension: &str, text: &str| {
            Question::likert(id, ServiceQuality, text).with_dimension(dimension)
        };

        Self::new(vec![
            Question::likert(
                "cp_no_extra_fees",
                CorruptionPerception,
                "Tidak ada pungutan di luar biaya resmi.",
            ),
            Question::likert(
                "cp_no_gratuities",
                CorruptionPerception,
                "Petugas tidak meminta atau menerima imbalan.",
            ),
            Question::likert(
                "cp_no_brokers",
                CorruptionPerception,
                "Layanan dapat diakses tanpa perantara atau calo.",
            ),
            Question::likert(
                "cp_fair_treatment",
                CorruptionPerception,
                "Semua pengguna layanan diperlakukan setara.",
            ),
            quality("sq_tangible_facility", "tangibles", "Fasilitas layanan bersih dan nyaman."),
            quality(
                "sq_tangible_information",
                "tangibles",
                "Informasi layanan jelas dan mudah ditemukan.",
            ),
            quality("sq_reliability_procedure", "reliability", "Prosedur layanan mudah diikuti."),
            quality(
                "sq_reliability_timeliness",
                "reliability",
                "Layanan selesai sesuai waktu yang dijanjikan.",
            ),
            quality(
                "sq_responsiveness_speed",
                "responsiveness",
                "Petugas merespons permintaan dengan cepat.",
            ),
            quality(
                "sq_responsiveness_complaints",
                "responsiveness",
                "Keluhan ditangani dengan baik.",
            ),
            quality(
                "sq_assurance_competence",
                "assurance",
                "Petugas kompeten dalam memberikan layanan.",
            ),
            quality(
                "sq_assurance_security",
                "assurance",
                "Data dan dokumen pengguna terjaga keamanannya.",
            ),
            quality("sq_empathy_courtesy", "empathy", "Petugas bersikap sopan dan ramah."),
            quality("sq_empathy_needs", "empathy", "Petugas memahami kebutuhan pengguna."),
            Question::likert(
                "si_honest_answers",
                SurveyIntegrity,
                "Saya menjawab survei ini dengan jujur.",
            ),
            Question::likert(
                "si_no_pressure",
                SurveyIntegrity,
                "Saya mengisi survei tanpa tekanan dari pihak mana pun.",
            ),
            Question::likert(
                CONTACT_CONSENT_QUESTION,
                SurveyIntegrity,
                "Saya bersedia dihubungi untuk tindak lanjut survei.",
            )
            .weight_exempt(),
            Question::open_text(
                "open_suggestions",
                ServiceQuality,
                "Saran untuk perbaikan layanan.",
            ),
        ])
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn by_category(&self, category: QuestionCategory) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.category == category)
            .collect()
    }

    /// Distinct service-quality dimensions in declaration order.
    pub fn dimensions(&self) -> Vec<&str> {
        let mut dimensions: Vec<&str> = Vec::new();
        for question in &self.questions {
            if let Some(dimension) = question.dimension.as_deref() {
                if !dimensions.contains(&dimension) {
                    dimensions.push(dimension);
                }
            }
        }
        dimensions
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_questionnaire_covers_all_categories() {
        let questionnaire = Questionnaire::standard();
        assert_eq!(
            questionnaire
                .by_category(QuestionCategory::CorruptionPerception)
                .len(),
            4
        );
        assert_eq!(
            questionnaire.dimensions(),
            vec!["tangibles", "reliability", "responsiveness", "assurance", "empathy"]
        );
        let consent = questionnaire
            .find(CONTACT_CONSENT_QUESTION)
            .expect("consent question present");
        assert!(consent.weight_exempt);
    }

    #[test]
    fn likert_options_include_zero_score_dont_know() {
        let question = Question::likert("q", QuestionCategory::ServiceQuality, "text");
        assert_eq!(question.options.len(), 7);
        assert_eq!(question.option_for(" 6 ").map(|option| option.score), Some(6));
        assert_eq!(question.option_for("0").map(|option| option.score), Some(0));
        assert!(question.option_for("7").is_none());
    }
}
