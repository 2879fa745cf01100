//! On-page SEO audit and ranking simulation.

use crate::LabError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_ads::factors::tokens;
use std::fmt;
use std::mem::discriminant;
use tracing::{debug, info};

const TITLE_MIN: usize = 30;
const TITLE_MAX: usize = 60;
const META_MIN: usize = 70;
const META_MAX: usize = 160;
const THIN_CONTENT_WORDS: u32 = 300;
const STUFFING_DENSITY: f64 = 3.0;
const LOW_DENSITY: f64 = 0.5;
const SLOW_PAGE_MS: u32 = 3_000;
const MIN_INTERNAL_LINKS: u32 = 3;

/// Click-through rate for organic positions 1..=10.
const POSITION_CTR: [f64; 10] = [
    0.284, 0.157, 0.110, 0.080, 0.072, 0.051, 0.040, 0.032, 0.028, 0.025,
];

/// Facts about a landing page, as a crawler would report them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeoPage {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub h1: String,
    pub word_count: u32,
    pub target_keyword: String,
    pub keyword_mentions: u32,
    #[serde(default)]
    pub internal_links: u32,
    #[serde(default)]
    pub images: u32,
    #[serde(default)]
    pub images_with_alt: u32,
    pub load_time_ms: u32,
    #[serde(default = "yes")]
    pub mobile_friendly: bool,
    #[serde(default = "yes")]
    pub https: bool,
    #[serde(default)]
    pub backlinks: u32,
}

fn yes() -> bool {
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Content,
    Technical,
}

/// A single audit finding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SeoIssue {
    TitleTooShort { length: usize },
    TitleTooLong { length: usize },
    TitleMissingKeyword,
    MetaDescriptionLength { length: usize },
    MissingH1,
    H1MissingKeyword,
    ThinContent { words: u32 },
    KeywordStuffing { density: f64 },
    LowKeywordDensity { density: f64 },
    MissingAltText { missing: u32 },
    SlowPage { load_time_ms: u32 },
    NotMobileFriendly,
    NoHttps,
    FewInternalLinks { links: u32 },
}

impl SeoIssue {
    pub fn category(&self) -> IssueCategory {
        match self {
            SeoIssue::MissingAltText { .. }
            | SeoIssue::SlowPage { .. }
            | SeoIssue::NotMobileFriendly
            | SeoIssue::NoHttps
            | SeoIssue::FewInternalLinks { .. } => IssueCategory::Technical,
            _ => IssueCategory::Content,
        }
    }

    /// Points deducted from the category score.
    pub fn penalty(&self) -> f64 {
        match self {
            SeoIssue::TitleTooShort { .. } => 10.0,
            SeoIssue::TitleTooLong { .. } => 8.0,
            SeoIssue::TitleMissingKeyword => 15.0,
            SeoIssue::MetaDescriptionLength { .. } => 8.0,
            SeoIssue::MissingH1 => 12.0,
            SeoIssue::H1MissingKeyword => 8.0,
            SeoIssue::ThinContent { .. } => 15.0,
            SeoIssue::KeywordStuffing { .. } => 15.0,
            SeoIssue::LowKeywordDensity { .. } => 8.0,
            SeoIssue::MissingAltText { .. } => 10.0,
            SeoIssue::SlowPage { load_time_ms } => {
                (15.0 + f64::from(load_time_ms.saturating_sub(SLOW_PAGE_MS)) / 200.0).min(35.0)
            }
            SeoIssue::NotMobileFriendly => 25.0,
            SeoIssue::NoHttps => 20.0,
            SeoIssue::FewInternalLinks { .. } => 10.0,
        }
    }

    fn same_kind(&self, other: &SeoIssue) -> bool {
        discriminant(self) == discriminant(other)
    }
}

impl fmt::Display for SeoIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeoIssue::TitleTooShort { length } => {
                write!(f, "title is {length} characters; aim for {TITLE_MIN}-{TITLE_MAX}")
            }
            SeoIssue::TitleTooLong { length } => {
                write!(f, "title is {length} characters and will be truncated after {TITLE_MAX}")
            }
            SeoIssue::TitleMissingKeyword => write!(f, "title does not contain the target keyword"),
            SeoIssue::MetaDescriptionLength { length } => write!(
                f,
                "meta description is {length} characters; aim for {META_MIN}-{META_MAX}"
            ),
            SeoIssue::MissingH1 => write!(f, "page has no H1 heading"),
            SeoIssue::H1MissingKeyword => write!(f, "H1 does not contain the target keyword"),
            SeoIssue::ThinContent { words } => {
                write!(f, "only {words} words of content; aim for {THIN_CONTENT_WORDS}+")
            }
            SeoIssue::KeywordStuffing { density } => {
                write!(f, "keyword density {density:.1}% looks like stuffing")
            }
            SeoIssue::LowKeywordDensity { density } => {
                write!(f, "keyword density {density:.2}% is too low")
            }
            SeoIssue::MissingAltText { missing } => write!(f, "{missing} images lack alt text"),
            SeoIssue::SlowPage { load_time_ms } => write!(f, "page loads in {load_time_ms} ms"),
            SeoIssue::NotMobileFriendly => write!(f, "page is not mobile friendly"),
            SeoIssue::NoHttps => write!(f, "page is served without HTTPS"),
            SeoIssue::FewInternalLinks { links } => {
                write!(f, "only {links} internal links; aim for {MIN_INTERNAL_LINKS}+")
            }
        }
    }
}

/// Scored audit of one page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeoAudit {
    /// Weighted overall score, 0-100.
    pub score: u8,
    pub content: u8,
    pub technical: u8,
    pub authority: u8,
    /// Keyword density in percent of words.
    pub keyword_density: f64,
    pub issues: Vec<SeoIssue>,
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    let haystack = format!(" {} ", tokens(text).join(" "));
    let needle = tokens(phrase).join(" ");
    !needle.is_empty() && haystack.contains(&format!(" {needle} "))
}

fn keyword_density(page: &SeoPage) -> f64 {
    if page.word_count == 0 {
        return 0.0;
    }
    let keyword_words = tokens(&page.target_keyword).len().max(1) as f64;
    f64::from(page.keyword_mentions) * keyword_words / f64::from(page.word_count) * 100.0
}

fn category_score(issues: &[SeoIssue], category: IssueCategory) -> u8 {
    let lost: f64 = issues
        .iter()
        .filter(|i| i.category() == category)
        .map(SeoIssue::penalty)
        .sum();
    (100.0 - lost).clamp(0.0, 100.0).round() as u8
}

fn authority_score(backlinks: u32) -> u8 {
    let s = (1.0 + f64::from(backlinks)).ln() / 1001f64.ln() * 100.0;
    s.clamp(0.0, 100.0).round() as u8
}

/// Audit a page against on-page and technical rules.
pub fn audit(page: &SeoPage) -> SeoAudit {
    let mut issues = Vec::new();

    let title_len = page.title.trim().chars().count();
    if title_len < TITLE_MIN {
        issues.push(SeoIssue::TitleTooShort { length: title_len });
    } else if title_len > TITLE_MAX {
        issues.push(SeoIssue::TitleTooLong { length: title_len });
    }
    if !contains_phrase(&page.title, &page.target_keyword) {
        issues.push(SeoIssue::TitleMissingKeyword);
    }

    let meta_len = page.meta_description.trim().chars().count();
    if !(META_MIN..=META_MAX).contains(&meta_len) {
        issues.push(SeoIssue::MetaDescriptionLength { length: meta_len });
    }

    if page.h1.trim().is_empty() {
        issues.push(SeoIssue::MissingH1);
    } else if !contains_phrase(&page.h1, &page.target_keyword) {
        issues.push(SeoIssue::H1MissingKeyword);
    }

    if page.word_count < THIN_CONTENT_WORDS {
        issues.push(SeoIssue::ThinContent {
            words: page.word_count,
        });
    }
    let density = keyword_density(page);
    if density > STUFFING_DENSITY {
        issues.push(SeoIssue::KeywordStuffing { density });
    } else if page.word_count > 0 && density < LOW_DENSITY {
        issues.push(SeoIssue::LowKeywordDensity { density });
    }

    let missing_alt = page.images.saturating_sub(page.images_with_alt);
    if missing_alt > 0 {
        issues.push(SeoIssue::MissingAltText {
            missing: missing_alt,
        });
    }
    if page.load_time_ms > SLOW_PAGE_MS {
        issues.push(SeoIssue::SlowPage {
            load_time_ms: page.load_time_ms,
        });
    }
    if !page.mobile_friendly {
        issues.push(SeoIssue::NotMobileFriendly);
    }
    if !page.https {
        issues.push(SeoIssue::NoHttps);
    }
    if page.internal_links < MIN_INTERNAL_LINKS {
        issues.push(SeoIssue::FewInternalLinks {
            links: page.internal_links,
        });
    }

    let content = category_score(&issues, IssueCategory::Content);
    let technical = category_score(&issues, IssueCategory::Technical);
    let authority = authority_score(page.backlinks);
    let score = (0.5 * f64::from(content)
        + 0.3 * f64::from(technical)
        + 0.2 * f64::from(authority))
        .round() as u8;

    debug!(
        url = %page.url,
        score,
        content,
        technical,
        authority,
        issues = issues.len(),
        "audited page"
    );
    SeoAudit {
        score,
        content,
        technical,
        authority,
        keyword_density: density,
        issues,
    }
}

/// Estimated search position (1..=100) for an audited page.
///
/// Authority weighs more heavily than in the overall score; the seed adds a
/// jitter of up to two positions.
pub fn estimate_rank(a: &SeoAudit, seed: u64) -> u32 {
    let strength = (0.45 * f64::from(a.content)
        + 0.25 * f64::from(a.technical)
        + 0.30 * f64::from(a.authority))
        / 100.0;
    let base = 1.0 + (1.0 - strength.clamp(0.0, 1.0)).powf(1.5) * 99.0;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let jitter: i64 = rng.gen_range(-2..=2);
    (base.round() as i64 + jitter).clamp(1, 100) as u32
}

/// Expected monthly organic clicks at a position.
pub fn organic_clicks(rank: u32, monthly_volume: u64) -> u64 {
    let ctr = match rank {
        0 => 0.0,
        1..=10 => POSITION_CTR[(rank - 1) as usize],
        11..=20 => 0.01,
        21..=30 => 0.004,
        _ => 0.001,
    };
    (monthly_volume as f64 * ctr).round() as u64
}

/// A proposed page change to evaluate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeoEdit {
    /// Monthly searches for the target keyword.
    pub monthly_volume: u64,
    pub before: SeoPage,
    pub after: SeoPage,
}

/// Before/after comparison of an edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeoOutcome {
    pub before: SeoAudit,
    pub after: SeoAudit,
    pub rank_before: u32,
    pub rank_after: u32,
    pub clicks_before: u64,
    pub clicks_after: u64,
    pub issues_fixed: Vec<SeoIssue>,
    pub issues_introduced: Vec<SeoIssue>,
}

impl SeoOutcome {
    pub fn click_change(&self) -> i64 {
        self.clicks_after as i64 - self.clicks_before as i64
    }
}

/// Audit both versions of a page and compare their ranking and traffic.
///
/// Both ranks use the same seed so the jitter cancels out of the comparison.
pub fn simulate_edit(edit: &SeoEdit, seed: u64) -> Result<SeoOutcome, LabError> {
    for page in [&edit.before, &edit.after] {
        if tokens(&page.target_keyword).is_empty() {
            return Err(LabError::InvalidInput(format!(
                "{}: target keyword is empty",
                page.url
            )));
        }
    }

    let before = audit(&edit.before);
    let after = audit(&edit.after);
    let rank_before = estimate_rank(&before, seed);
    let rank_after = estimate_rank(&after, seed);

    let issues_fixed = before
        .issues
        .iter()
        .filter(|i| !after.issues.iter().any(|j| j.same_kind(i)))
        .cloned()
        .collect();
    let issues_introduced = after
        .issues
        .iter()
        .filter(|i| !before.issues.iter().any(|j| j.same_kind(i)))
        .cloned()
        .collect();

    let outcome = SeoOutcome {
        clicks_before: organic_clicks(rank_before, edit.monthly_volume),
        clicks_after: organic_clicks(rank_after, edit.monthly_volume),
        before,
        after,
        rank_before,
        rank_after,
        issues_fixed,
        issues_introduced,
    };
    info!(
        url = %edit.after.url,
        score_before = outcome.before.score,
        score_after = outcome.after.score,
        rank_before,
        rank_after,
        clicks = outcome.click_change(),
        "simulated seo edit"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn good_page() -> SeoPage {
        SeoPage {
            url: "https://example.com/running-shoes".into(),
            title: "Running Shoes for Every Distance | Example Store".into(),
            meta_description: "Shop lightweight running shoes for road and trail. \
                               Free shipping and 60-day returns on every pair."
                .into(),
            h1: "Running Shoes".into(),
            word_count: 1200,
            target_keyword: "running shoes".into(),
            keyword_mentions: 12,
            internal_links: 8,
            images: 6,
            images_with_alt: 6,
            load_time_ms: 1400,
            mobile_friendly: true,
            https: true,
            backlinks: 150,
        }
    }

    fn poor_page() -> SeoPage {
        SeoPage {
            url: "http://example.com/p?id=7".into(),
            title: "Home".into(),
            meta_description: String::new(),
            h1: String::new(),
            word_count: 120,
            target_keyword: "running shoes".into(),
            keyword_mentions: 0,
            internal_links: 1,
            images: 4,
            images_with_alt: 0,
            load_time_ms: 5200,
            mobile_friendly: false,
            https: false,
            backlinks: 2,
        }
    }

    #[test]
    fn clean_page_has_no_issues() {
        let a = audit(&good_page());
        assert!(a.issues.is_empty(), "{:?}", a.issues);
        assert_eq!(a.content, 100);
        assert_eq!(a.technical, 100);
        assert!((a.keyword_density - 2.0).abs() < 1e-9);
        assert!(a.score >= 85);
    }

    #[test]
    fn poor_page_collects_every_issue_kind() {
        let a = audit(&poor_page());
        let has = |pred: fn(&SeoIssue) -> bool| a.issues.iter().any(pred);
        assert!(has(|i| matches!(i, SeoIssue::TitleTooShort { length: 4 })));
        assert!(has(|i| matches!(i, SeoIssue::TitleMissingKeyword)));
        assert!(has(|i| matches!(i, SeoIssue::MetaDescriptionLength { length: 0 })));
        assert!(has(|i| matches!(i, SeoIssue::MissingH1)));
        assert!(has(|i| matches!(i, SeoIssue::ThinContent { words: 120 })));
        assert!(has(|i| matches!(i, SeoIssue::LowKeywordDensity { .. })));
        assert!(has(|i| matches!(i, SeoIssue::MissingAltText { missing: 4 })));
        assert!(has(|i| matches!(i, SeoIssue::SlowPage { .. })));
        assert!(has(|i| matches!(i, SeoIssue::NotMobileFriendly)));
        assert!(has(|i| matches!(i, SeoIssue::NoHttps)));
        assert!(has(|i| matches!(i, SeoIssue::FewInternalLinks { links: 1 })));
        assert!(a.score < 30);
    }

    #[test]
    fn stuffing_is_flagged() {
        let mut p = good_page();
        p.keyword_mentions = 40;
        let a = audit(&p);
        assert!(a
            .issues
            .iter()
            .any(|i| matches!(i, SeoIssue::KeywordStuffing { .. })));
        assert!(a.issues[0].to_string().contains("stuffing"));
    }

    #[test]
    fn better_pages_rank_higher() {
        let good = estimate_rank(&audit(&good_page()), 5);
        let poor = estimate_rank(&audit(&poor_page()), 5);
        assert!(good < poor);
        assert!((1..=100).contains(&good));
        assert!((1..=100).contains(&poor));
    }

    #[test]
    fn position_curve_drops_off() {
        assert_eq!(organic_clicks(1, 10_000), 2_840);
        assert!(organic_clicks(2, 10_000) < organic_clicks(1, 10_000));
        assert_eq!(organic_clicks(15, 10_000), 100);
        assert_eq!(organic_clicks(80, 10_000), 10);
    }

    #[test]
    fn fixing_a_page_reports_fixed_issues() {
        let edit = SeoEdit {
            monthly_volume: 8_000,
            before: poor_page(),
            after: good_page(),
        };
        let out = simulate_edit(&edit, 11).unwrap();
        assert!(out.rank_after < out.rank_before);
        assert!(out.clicks_after >= out.clicks_before);
        assert_eq!(out.issues_fixed.len(), out.before.issues.len());
        assert!(out.issues_introduced.is_empty());

        let reverse = SeoEdit {
            monthly_volume: 8_000,
            before: good_page(),
            after: poor_page(),
        };
        let out = simulate_edit(&reverse, 11).unwrap();
        assert!(out.issues_fixed.is_empty());
        assert!(!out.issues_introduced.is_empty());
        assert!(out.click_change() <= 0);
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let mut edit = SeoEdit {
            monthly_volume: 100,
            before: good_page(),
            after: good_page(),
        };
        edit.after.target_keyword = "  ".into();
        assert!(matches!(simulate_edit(&edit, 1), Err(LabError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn scores_stay_in_range(
            words in 0u32..5_000,
            mentions in 0u32..200,
            load in 0u32..20_000,
            links in 0u32..10_000,
        ) {
            let mut p = poor_page();
            p.word_count = words;
            p.keyword_mentions = mentions;
            p.load_time_ms = load;
            p.backlinks = links;
            let a = audit(&p);
            prop_assert!(a.score <= 100 && a.content <= 100);
            prop_assert!(a.technical <= 100 && a.authority <= 100);
            prop_assert!((1..=100).contains(&estimate_rank(&a, u64::from(words))));
        }
    }
}
