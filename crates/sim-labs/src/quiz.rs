//! Multiple-choice knowledge checks drawn from a fixed question bank.

use crate::LabError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Percentage needed to pass a quiz.
pub const PASS_MARK: u8 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    PaidSearch,
    PaidSocial,
    Seo,
    AbTesting,
    DataViz,
    Metrics,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::PaidSearch,
        Topic::PaidSocial,
        Topic::Seo,
        Topic::AbTesting,
        Topic::DataViz,
        Topic::Metrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::PaidSearch => "paid_search",
            Topic::PaidSocial => "paid_social",
            Topic::Seo => "seo",
            Topic::AbTesting => "ab_testing",
            Topic::DataViz => "data_viz",
            Topic::Metrics => "metrics",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('/', "").replace(['-', ' '], "_");
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| LabError::InvalidInput(format!("unknown quiz topic {s:?}")))
    }
}

/// One multiple-choice question. The answer and explanation stay out of
/// serialized output so a printed quiz does not give itself away.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub topic: Topic,
    pub prompt: &'static str,
    pub choices: &'static [&'static str],
    #[serde(skip)]
    pub answer: usize,
    #[serde(skip)]
    pub explanation: &'static str,
}

impl Question {
    pub fn correct_choice(&self) -> &'static str {
        self.choices.get(self.answer).copied().unwrap_or_default()
    }
}

const fn q(
    id: &'static str,
    topic: Topic,
    prompt: &'static str,
    choices: &'static [&'static str],
    answer: usize,
    explanation: &'static str,
) -> Question {
    Question {
        id,
        topic,
        prompt,
        choices,
        answer,
        explanation,
    }
}

static BANK: [Question; 18] = [
    q(
        "search-quality-score",
        Topic::PaidSearch,
        "Which three inputs drive a search ad's quality score?",
        &[
            "Budget, bid and schedule",
            "Expected CTR, ad relevance and landing page experience",
            "Impressions, clicks and conversions",
            "Account age, billing method and location",
        ],
        1,
        "Quality score rates how useful the ad is to the searcher, not how much is spent.",
    ),
    q(
        "search-exact-match",
        Topic::PaidSearch,
        "Which keyword match type reaches the smallest, most precise audience?",
        &["Broad", "Phrase", "Exact", "Negative"],
        2,
        "Exact match only serves on queries with the same meaning as the keyword.",
    ),
    q(
        "search-manual-cap",
        Topic::PaidSearch,
        "With manual CPC bidding at $1.50, what is the most a single click can cost?",
        &["$0.75", "$1.50", "$3.00", "Whatever the market sets"],
        1,
        "The manual bid is a hard cap on cost per click.",
    ),
    q(
        "social-interest-targeting",
        Topic::PaidSocial,
        "On Meta, what replaces keywords as the main relevance signal?",
        &[
            "Audience targeting such as interests and demographics",
            "The display URL",
            "The daily budget",
            "The number of headlines",
        ],
        0,
        "Social ads are pushed to people, so relevance comes from who is targeted.",
    ),
    q(
        "social-linkedin-cpc",
        Topic::PaidSocial,
        "Why is LinkedIn usually the most expensive platform per click?",
        &[
            "It charges a flat fee per campaign",
            "Its professional targeting reaches high-value B2B buyers",
            "It only sells video placements",
            "It has the largest audience",
        ],
        1,
        "Job title and company targeting command a premium from B2B advertisers.",
    ),
    q(
        "social-narrow-audience",
        Topic::PaidSocial,
        "An audience that is too narrow most often leads to what?",
        &[
            "Unspent budget and few impressions",
            "A higher quality score",
            "Lower cost per click",
            "More conversions at the same spend",
        ],
        0,
        "Without enough eligible people the platform cannot deliver the budget.",
    ),
    q(
        "seo-title-length",
        Topic::Seo,
        "What title tag length avoids truncation in search results?",
        &["Under 10 characters", "30 to 60 characters", "100 to 150 characters", "Any length"],
        1,
        "Titles longer than about 60 characters are cut off on the results page.",
    ),
    q(
        "seo-keyword-stuffing",
        Topic::Seo,
        "A page repeats its target keyword in 6% of its words. What is the risk?",
        &[
            "None, more mentions always help",
            "It is treated as keyword stuffing and can rank worse",
            "The page loads slower",
            "The meta description is ignored",
        ],
        1,
        "Density above roughly 3% reads as spam to search engines.",
    ),
    q(
        "seo-alt-text",
        Topic::Seo,
        "What does image alt text help with?",
        &[
            "Page load speed",
            "Accessibility and image understanding by crawlers",
            "Backlink count",
            "HTTPS security",
        ],
        1,
        "Alt text describes images to screen readers and to search engines.",
    ),
    q(
        "ab-control",
        Topic::AbTesting,
        "What is the control in an A/B test?",
        &[
            "The variant with the most traffic",
            "The current version every challenger is compared against",
            "The variant that wins",
            "A variant shown only to mobile users",
        ],
        1,
        "Lift and significance are measured relative to the control.",
    ),
    q(
        "ab-p-value",
        Topic::AbTesting,
        "At 95% confidence, which p-value lets you call a difference significant?",
        &["0.50", "0.20", "0.10", "0.03"],
        3,
        "Significance at 95% confidence needs p below 0.05.",
    ),
    q(
        "ab-sample-size",
        Topic::AbTesting,
        "Detecting a smaller lift requires what?",
        &["Fewer samples", "More samples per variant", "More variants", "A shorter test"],
        1,
        "Required sample size grows with the inverse square of the effect.",
    ),
    q(
        "viz-time-series",
        Topic::DataViz,
        "Which chart best shows monthly sessions over a year?",
        &["Pie", "Line", "Scatter", "Histogram"],
        1,
        "Line charts show change over an ordered time axis.",
    ),
    q(
        "viz-composition",
        Topic::DataViz,
        "Which chart shows how a budget is split across five channels?",
        &["Scatter", "Histogram", "Pie", "Line"],
        2,
        "Part-to-whole data with few categories suits a pie or stacked bar.",
    ),
    q(
        "viz-relationship",
        Topic::DataViz,
        "Which chart reveals whether ad spend and revenue move together?",
        &["Scatter", "Pie", "Area", "Table"],
        0,
        "A scatter plot shows the relationship between two numeric measures.",
    ),
    q(
        "metric-ctr",
        Topic::Metrics,
        "An ad gets 2,000 impressions and 50 clicks. What is its CTR?",
        &["0.4%", "2.5%", "25%", "40%"],
        1,
        "CTR is clicks divided by impressions: 50 / 2,000 = 2.5%.",
    ),
    q(
        "metric-roas",
        Topic::Metrics,
        "A campaign spends $500 and brings in $2,000 of revenue. What is its ROAS?",
        &["0.25x", "1.5x", "4x", "2,500x"],
        2,
        "ROAS is revenue divided by spend: 2,000 / 500 = 4x.",
    ),
    q(
        "metric-cpa",
        Topic::Metrics,
        "A campaign spends $300 and gets 12 conversions. What is its CPA?",
        &["$3.60", "$12", "$25", "$36"],
        2,
        "CPA is spend divided by conversions: 300 / 12 = $25.",
    ),
];

/// Every question, in bank order.
pub fn question_bank() -> &'static [Question] {
    &BANK
}

/// A seeded draw of questions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quiz {
    pub seed: u64,
    pub topic: Option<Topic>,
    pub questions: Vec<&'static Question>,
}

/// Draw `count` questions, optionally from one topic. The same seed gives
/// the same questions in the same order.
pub fn draw_quiz(topic: Option<Topic>, count: usize, seed: u64) -> Result<Quiz, LabError> {
    let mut pool: Vec<&'static Question> = BANK
        .iter()
        .filter(|q| topic.map_or(true, |t| q.topic == t))
        .collect();
    if count == 0 || count > pool.len() {
        return Err(LabError::InvalidInput(format!(
            "quiz size must be between 1 and {}, got {count}",
            pool.len()
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    pool.shuffle(&mut rng);
    pool.truncate(count);
    debug!(seed, count, topic = ?topic, "drew quiz");
    Ok(Quiz {
        seed,
        topic,
        questions: pool,
    })
}

/// Letter label for a choice position, `a` for the first.
pub fn choice_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'a' + i))
}

/// Choice picked by a reply: a letter (`b`, `B`) or the choice text.
fn picked_choice(q: &Question, reply: &str) -> Option<usize> {
    let reply = reply.trim();
    let mut chars = reply.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let c = c.to_ascii_lowercase();
        if let Some(i) = (0..q.choices.len()).find(|&i| choice_letter(i) == c) {
            return Some(i);
        }
    }
    q.choices.iter().position(|c| c.eq_ignore_ascii_case(reply))
}

pub fn check_answer(q: &Question, reply: &str) -> bool {
    picked_choice(q, reply) == Some(q.answer)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkedAnswer {
    pub id: &'static str,
    pub given: Option<String>,
    pub correct: bool,
    pub expected: &'static str,
    pub explanation: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuizResult {
    pub correct: usize,
    pub total: usize,
    /// Percentage of correct answers, rounded.
    pub score: u8,
    pub passed: bool,
    pub answers: Vec<MarkedAnswer>,
}

/// Mark replies in question order. Missing replies count as wrong.
pub fn grade_quiz(quiz: &Quiz, replies: &[String]) -> Result<QuizResult, LabError> {
    let total = quiz.questions.len();
    if replies.len() > total {
        return Err(LabError::InvalidInput(format!(
            "{} answers for {total} questions",
            replies.len()
        )));
    }
    let answers: Vec<MarkedAnswer> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let given = replies.get(i).cloned();
            MarkedAnswer {
                id: q.id,
                correct: given.as_deref().is_some_and(|r| check_answer(q, r)),
                given,
                expected: q.correct_choice(),
                explanation: q.explanation,
            }
        })
        .collect();
    let correct = answers.iter().filter(|a| a.correct).count();
    let score = if total == 0 {
        0
    } else {
        (correct as f64 * 100.0 / total as f64).round() as u8
    };
    info!(seed = quiz.seed, correct, total, score, "graded quiz");
    Ok(QuizResult {
        correct,
        total,
        score,
        passed: score >= PASS_MARK,
        answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn letters(quiz: &Quiz, right: bool) -> Vec<String> {
        quiz.questions
            .iter()
            .map(|q| {
                let i = if right { q.answer } else { (q.answer + 1) % q.choices.len() };
                choice_letter(i).to_string()
            })
            .collect()
    }

    #[test]
    fn bank_is_well_formed() {
        let ids: HashSet<_> = question_bank().iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), question_bank().len());
        for q in question_bank() {
            assert!(q.choices.len() >= 2, "{}", q.id);
            assert!(q.answer < q.choices.len(), "{}", q.id);
            assert!(!q.explanation.is_empty(), "{}", q.id);
            let distinct: HashSet<_> = q.choices.iter().map(|c| c.to_lowercase()).collect();
            assert_eq!(distinct.len(), q.choices.len(), "{}", q.id);
        }
        for t in Topic::ALL {
            let n = question_bank().iter().filter(|q| q.topic == t).count();
            assert!(n >= 3, "{t} has {n} questions");
        }
    }

    #[test]
    fn draws_are_seeded_and_filtered() {
        let a = draw_quiz(None, 5, 11).unwrap();
        let b = draw_quiz(None, 5, 11).unwrap();
        assert_eq!(a, b);
        let ids: HashSet<_> = a.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 5);

        let seo = draw_quiz(Some(Topic::Seo), 3, 2).unwrap();
        assert!(seo.questions.iter().all(|q| q.topic == Topic::Seo));
    }

    #[test]
    fn impossible_sizes_are_rejected() {
        assert!(draw_quiz(None, 0, 1).is_err());
        assert!(draw_quiz(None, question_bank().len() + 1, 1).is_err());
        assert!(matches!(
            draw_quiz(Some(Topic::Metrics), 4, 1),
            Err(LabError::InvalidInput(_))
        ));
    }

    #[test]
    fn replies_accept_letters_or_choice_text() {
        let q = question_bank().iter().find(|q| q.id == "metric-roas").unwrap();
        assert!(check_answer(q, "c"));
        assert!(check_answer(q, " C "));
        assert!(check_answer(q, "4X"));
        assert!(!check_answer(q, "a"));
        assert!(!check_answer(q, "z"));
        assert!(!check_answer(q, ""));
    }

    #[test]
    fn scores_and_pass_mark() {
        let quiz = draw_quiz(None, 10, 5).unwrap();
        let perfect = grade_quiz(&quiz, &letters(&quiz, true)).unwrap();
        assert_eq!((perfect.correct, perfect.score), (10, 100));
        assert!(perfect.passed);

        let wrong = grade_quiz(&quiz, &letters(&quiz, false)).unwrap();
        assert_eq!(wrong.score, 0);
        assert!(!wrong.passed);
        assert!(wrong.answers.iter().all(|a| !a.explanation.is_empty()));

        let mut seven = letters(&quiz, true);
        seven.truncate(7);
        let partial = grade_quiz(&quiz, &seven).unwrap();
        assert_eq!((partial.correct, partial.score), (7, 70));
        assert!(partial.passed);
        assert_eq!(partial.answers[9].given, None);

        let mut extra = letters(&quiz, true);
        extra.push("a".into());
        assert!(grade_quiz(&quiz, &extra).is_err());
    }

    #[test]
    fn printed_quiz_hides_answers() {
        let quiz = draw_quiz(Some(Topic::AbTesting), 2, 3).unwrap();
        let v = serde_json::to_value(&quiz).unwrap();
        let first = &v["questions"][0];
        assert!(first.get("prompt").is_some());
        assert!(first.get("answer").is_none());
        assert!(first.get("explanation").is_none());
    }

    #[test]
    fn topics_parse_loosely() {
        assert_eq!("A/B testing".parse::<Topic>().unwrap(), Topic::AbTesting);
        assert_eq!("paid-search".parse::<Topic>().unwrap(), Topic::PaidSearch);
        assert!("email".parse::<Topic>().is_err());
    }
}
