use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

mod error;

pub use error::ScorerError;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
    pub title: String,
    pub description: String,
    /// Raw HTML produced by the editing surface.
    pub body: String,
}

impl ContentSnapshot {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            body: body.into(),
        }
    }

    /// Parse a `{"title", "description", "body"}` object. Any field that is
    /// present but not a string is rejected.
    pub fn from_json(json: &str) -> Result<Self, ScorerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ScorerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScorerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeywordDensity {
    pub count: usize,
    /// Percentage of all tokens, rounded to two decimals.
    pub density: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    pub densities: BTreeMap<String, KeywordDensity>,
    pub total_density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    pub fn for_score(score: u32) -> Self {
        band_for(score, HP.score_band_medium_min, HP.score_band_high_min)
    }

    pub fn for_danger(danger_score: u32) -> Self {
        band_for(
            danger_score,
            HP.danger_band_medium_min,
            HP.danger_band_high_min,
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreBand::Low => "low",
            ScoreBand::Medium => "medium",
            ScoreBand::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub score: u32,
    pub danger_score: u32,
    pub word_count: usize,
    pub suggestions: Vec<String>,
    pub keyword_analysis: KeywordAnalysis,
    pub score_band: ScoreBand,
    pub danger_band: ScoreBand,
    pub reading_time_minutes: usize,
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

struct Hyperparameters {
    optimal_density_min: f64,
    optimal_density_max: f64,
    spam_density_threshold: f64,
    spam_warning_ratio: f64,
    spam_excess_multiplier: f64,
    spam_warning_penalty: f64,
    spam_total_density_penalty: f64,
    body_points: f64,
    medium_length_words: usize,
    long_length_words: usize,
    length_tier_points: f64,
    title_points: f64,
    description_points: f64,
    keyword_usage_budget: f64,
    heading_points: f64,
    link_points: f64,
    image_points: f64,
    min_word_count: usize,
    structural_heading_min: usize,
    title_min_chars: usize,
    description_min_chars: usize,
    words_per_minute: usize,
    score_max: u32,
    score_band_medium_min: u32,
    score_band_high_min: u32,
    danger_band_medium_min: u32,
    danger_band_high_min: u32,
}

static HP: Hyperparameters = Hyperparameters {
    optimal_density_min: 0.5,
    optimal_density_max: 2.0,
    spam_density_threshold: 2.5,
    spam_warning_ratio: 0.8,
    spam_excess_multiplier: 25.0,
    spam_warning_penalty: 10.0,
    spam_total_density_penalty: 20.0,
    body_points: 20.0,
    medium_length_words: 300,
    long_length_words: 600,
    length_tier_points: 10.0,
    title_points: 10.0,
    description_points: 10.0,
    keyword_usage_budget: 20.0,
    heading_points: 10.0,
    link_points: 10.0,
    image_points: 10.0,
    min_word_count: 300,
    structural_heading_min: 2,
    title_min_chars: 30,
    description_min_chars: 120,
    words_per_minute: 200,
    score_max: 100,
    score_band_medium_min: 50,
    score_band_high_min: 80,
    danger_band_medium_min: 30,
    danger_band_high_min: 60,
};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

// Also matches <abbr>, <aside> and friends; kept as a raw-markup heuristic.
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a[^>]*>").unwrap());

fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
}

// ---------------------------------------------------------------------------
// Keyword set
// ---------------------------------------------------------------------------

/// Tracked keywords for one editing session, normalized to trimmed lowercase.
///
/// Each keyword's whole-word pattern is compiled once on insertion, so a
/// multi-word keyword is matched as a single phrase with boundaries only at
/// its outer edges.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    patterns: BTreeMap<String, Regex>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the keyword was not tracked before. Blank input is
    /// ignored.
    pub fn insert(&mut self, keyword: &str) -> bool {
        let normalized = normalize_keyword(keyword);
        if normalized.is_empty() || self.patterns.contains_key(&normalized) {
            return false;
        }
        match keyword_pattern(&normalized) {
            Ok(pattern) => {
                if !has_word_edges(&normalized) {
                    warn!(
                        keyword = %normalized,
                        "keyword does not start and end with a word character and will never match"
                    );
                }
                debug!(keyword = %normalized, "tracking keyword");
                self.patterns.insert(normalized, pattern);
                true
            }
            Err(err) => {
                warn!(keyword = %normalized, error = %err, "keyword cannot be matched, ignoring");
                false
            }
        }
    }

    pub fn remove(&mut self, keyword: &str) -> bool {
        let normalized = normalize_keyword(keyword);
        let removed = self.patterns.remove(&normalized).is_some();
        if removed {
            debug!(keyword = %normalized, "untracking keyword");
        }
        removed
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.patterns.contains_key(&normalize_keyword(keyword))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// Split a comma-separated entry such as `"seo, Rust ,, blog"` into
    /// trimmed, non-empty keywords.
    pub fn parse_list(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Insert every keyword of a comma-separated entry and return the
    /// normalized forms of those that were newly added, in input order.
    pub fn extend_from_input(&mut self, input: &str) -> Vec<String> {
        Self::parse_list(input)
            .into_iter()
            .filter(|k| self.insert(k))
            .map(|k| normalize_keyword(&k))
            .collect()
    }

    fn compiled(&self) -> impl Iterator<Item = (&String, &Regex)> {
        self.patterns.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for keyword in iter {
            set.insert(keyword.as_ref());
        }
        set
    }
}

fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

// `\b` needs a word character on the inside of each edge.
fn has_word_edges(keyword: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    matches!(
        (keyword.chars().next(), keyword.chars().last()),
        (Some(first), Some(last)) if is_word(first) && is_word(last)
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_score(raw: f64) -> u32 {
    raw.round().clamp(0.0, HP.score_max as f64) as u32
}

fn band_for(value: u32, medium_min: u32, high_min: u32) -> ScoreBand {
    if value >= high_min {
        ScoreBand::High
    } else if value >= medium_min {
        ScoreBand::Medium
    } else {
        ScoreBand::Low
    }
}

fn heading_count(body: &str) -> usize {
    body.matches("<h2").count()
}

fn link_count(body: &str) -> usize {
    LINK_RE.find_iter(body).count()
}

fn image_count(body: &str) -> usize {
    body.matches("<img").count()
}

fn has_list(body: &str) -> bool {
    body.contains("<ul") || body.contains("<ol")
}

fn spam_warning_density() -> f64 {
    HP.spam_density_threshold * HP.spam_warning_ratio
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Number of whitespace-separated tokens left once every tag is replaced by
/// a space.
pub fn count_words(html: &str) -> usize {
    strip_tags(html).split_whitespace().count()
}

/// Per-keyword occurrence counts and densities against the body's tokens.
///
/// Tokens are counted exactly as [`count_words`] counts them. An empty body
/// yields a density of 0 for every keyword.
pub fn analyze_keywords(body: &str, keywords: &KeywordSet) -> KeywordAnalysis {
    let clean_text = strip_tags(body).to_lowercase();
    let total_words = clean_text.split_whitespace().count();

    let mut densities = BTreeMap::new();
    for (keyword, pattern) in keywords.compiled() {
        let count = pattern.find_iter(&clean_text).count();
        let density = if total_words == 0 {
            0.0
        } else {
            round2(count as f64 * 100.0 / total_words as f64)
        };
        trace!(keyword = %keyword, count, density, total_words, "keyword density");
        densities.insert(keyword.clone(), KeywordDensity { count, density });
    }

    let total_density = round2(densities.values().map(|d| d.density).sum());
    KeywordAnalysis {
        densities,
        total_density,
    }
}

/// Composite on-page score in `0..=100`. Always 0 without tracked keywords.
pub fn calculate_score(
    snapshot: &ContentSnapshot,
    keywords: &KeywordSet,
    analysis: &KeywordAnalysis,
) -> u32 {
    if keywords.is_empty() {
        return 0;
    }

    let body = snapshot.body.as_str();
    let mut score = 0.0f64;

    if !body.is_empty() {
        score += HP.body_points;
        let wc = count_words(body);
        if wc >= HP.medium_length_words {
            score += HP.length_tier_points;
        }
        if wc >= HP.long_length_words {
            score += HP.length_tier_points;
        }
    }

    if !snapshot.title.is_empty() {
        score += HP.title_points;
    }
    if !snapshot.description.is_empty() {
        score += HP.description_points;
    }

    let keyword_share = HP.keyword_usage_budget / keywords.len() as f64;
    for data in analysis.densities.values() {
        if data.density >= HP.optimal_density_min && data.density <= HP.optimal_density_max {
            score += keyword_share;
        }
    }

    if heading_count(body) > 0 {
        score += HP.heading_points;
    }
    if link_count(body) > 0 {
        score += HP.link_points;
    }
    if image_count(body) > 0 {
        score += HP.image_points;
    }

    clamp_score(score)
}

/// Keyword-stuffing risk in `0..=100`. Always 0 without tracked keywords.
pub fn calculate_spam_score(analysis: &KeywordAnalysis, keywords: &KeywordSet) -> u32 {
    if keywords.is_empty() {
        return 0;
    }

    let mut spam_score = 0.0f64;
    for data in analysis.densities.values() {
        if data.density > HP.spam_density_threshold {
            spam_score += (data.density - HP.spam_density_threshold) * HP.spam_excess_multiplier;
        }
        if data.density > spam_warning_density() {
            spam_score += HP.spam_warning_penalty;
        }
    }

    if analysis.total_density > HP.spam_density_threshold * keywords.len() as f64 {
        spam_score += HP.spam_total_density_penalty;
    }

    clamp_score(spam_score)
}

/// Ordered improvement advice. An empty body gets a single prompt to start
/// writing and nothing else.
pub fn generate_suggestions(snapshot: &ContentSnapshot) -> Vec<String> {
    let body = snapshot.body.as_str();
    let wc = count_words(body);
    let headings = heading_count(body);
    let mut suggestions = Vec::new();

    if wc == 0 {
        suggestions.push("\u{1F4DD} Start writing your content".to_string());
        return suggestions;
    }

    if headings == 0 {
        suggestions.push("\u{1F4DA} Add H2 subheadings to structure your content".to_string());
    }
    if wc > HP.min_word_count && headings < HP.structural_heading_min {
        suggestions.push("\u{1F50D} Add more subheadings for a clearer structure".to_string());
    }

    if image_count(body) == 0 {
        suggestions.push(
            "\u{1F5BC}\u{FE0F} Add relevant images with descriptive alt attributes".to_string(),
        );
    }
    if link_count(body) == 0 {
        suggestions.push("\u{1F517} Add relevant internal and external links".to_string());
    }

    if wc < HP.min_word_count {
        suggestions.push(format!(
            "\u{1F4C8} Expand your content ({} words minimum)",
            HP.min_word_count
        ));
    }

    if !has_list(body) {
        suggestions.push("\u{1F4CB} Use lists to organize information".to_string());
    }

    if snapshot.title.chars().count() < HP.title_min_chars {
        suggestions.push("\u{1F4CF} Optimize your title (50-60 characters)".to_string());
    }
    if snapshot.description.chars().count() < HP.description_min_chars {
        suggestions
            .push("\u{1F4CF} Optimize your meta description (150-160 characters)".to_string());
    }

    suggestions
}

// ---------------------------------------------------------------------------
// Report helpers
// ---------------------------------------------------------------------------

pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(HP.words_per_minute)
}

pub fn over_optimized_keywords(analysis: &KeywordAnalysis) -> Vec<(String, f64)> {
    analysis
        .densities
        .iter()
        .filter(|(_, data)| data.density > spam_warning_density())
        .map(|(keyword, data)| (keyword.clone(), data.density))
        .collect()
}

/// What is still missing for a perfect score. Empty once the score is 100.
pub fn missing_elements(snapshot: &ContentSnapshot, report: &AnalysisReport) -> Vec<String> {
    let mut missing = Vec::new();
    if report.score >= HP.score_max {
        return missing;
    }

    let body = snapshot.body.as_str();
    if snapshot.title.is_empty() {
        missing.push("Add a page title".to_string());
    }
    if snapshot.description.is_empty() {
        missing.push("Add a meta description".to_string());
    }
    if report.word_count < HP.min_word_count {
        missing.push(format!("Reach at least {} words", HP.min_word_count));
    }
    if !body.contains("<h2") {
        missing.push("Add H2 subheadings".to_string());
    }
    if !body.contains("<a ") {
        missing.push("Add links".to_string());
    }
    if !body.contains("<img ") {
        missing.push("Add images".to_string());
    }
    missing
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn analyze_content(snapshot: &ContentSnapshot, keywords: &KeywordSet) -> AnalysisReport {
    let word_count = count_words(&snapshot.body);
    let keyword_analysis = analyze_keywords(&snapshot.body, keywords);
    let suggestions = generate_suggestions(snapshot);
    let score = calculate_score(snapshot, keywords, &keyword_analysis);
    let danger_score = calculate_spam_score(&keyword_analysis, keywords);

    debug!(
        word_count,
        keywords = keywords.len(),
        score,
        danger_score,
        "analyzed content"
    );

    AnalysisReport {
        score,
        danger_score,
        word_count,
        suggestions,
        keyword_analysis,
        score_band: ScoreBand::for_score(score),
        danger_band: ScoreBand::for_danger(danger_score),
        reading_time_minutes: reading_time_minutes(word_count),
    }
}

/// Scorer for a single editing session. Owns the session's keyword set;
/// every analysis reads the set as it stands at call time.
#[derive(Debug, Clone, Default)]
pub struct ContentScorer {
    keywords: KeywordSet,
}

impl ContentScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords(keywords: KeywordSet) -> Self {
        Self { keywords }
    }

    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        self.keywords.insert(keyword)
    }

    pub fn add_keywords_from_input(&mut self, input: &str) -> Vec<String> {
        self.keywords.extend_from_input(input)
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        self.keywords.remove(keyword)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn analyze_content(&self, snapshot: &ContentSnapshot) -> AnalysisReport {
        analyze_content(snapshot, &self.keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::has_word_edges;

    #[test]
    fn word_edges() {
        assert!(has_word_edges("seo"));
        assert!(has_word_edges("node.js"));
        assert!(has_word_edges("café"));
        assert!(has_word_edges("content marketing"));
        assert!(!has_word_edges("c++"));
        assert!(!has_word_edges(".net"));
        assert!(!has_word_edges(""));
    }
}
