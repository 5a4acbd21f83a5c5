//! Fuzzy student matching for ID card photos.
//!
//! The AI service reads `{name, class, code}` off a card photo, usually with
//! some noise: lowercase codes, missing accents, `"12Tin"` instead of
//! `"12 Tin"`. Every roster student is scored against those fields with the
//! table below (first matching rule per field, fields add up), and students
//! scoring zero are dropped.
//!
//! | field | rule                              | points          |
//! |-------|-----------------------------------|-----------------|
//! | code  | exact (case-insensitive)          | 100             |
//! | code  | one contains the other            | 50              |
//! | class | exact, spaces removed             | 40              |
//! | class | one contains the other            | 20              |
//! | name  | exact                             | 60              |
//! | name  | exact without accents             | 50              |
//! | name  | one contains the other            | 30              |
//! | name  | contains, without accents         | 25              |
//! | name  | similarity > 0.70                 | ⌊ratio × 30⌋    |

use crate::{
    core::student::get_all_students,
    entities::student,
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const CODE_EXACT: u32 = 100;
const CODE_PARTIAL: u32 = 50;
const CLASS_EXACT: u32 = 40;
const CLASS_PARTIAL: u32 = 20;
const NAME_EXACT: u32 = 60;
const NAME_EXACT_UNACCENTED: u32 = 50;
const NAME_PARTIAL: u32 = 30;
const NAME_PARTIAL_UNACCENTED: u32 = 25;
const NAME_SIMILARITY_THRESHOLD: f64 = 0.70;
const NAME_SIMILARITY_WEIGHT: f64 = 30.0;

/// How many runners-up are offered next to the best match
pub const MAX_ALTERNATIVES: usize = 2;

/// Fields read off an ID card. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    /// Student name as printed
    #[serde(default)]
    pub name: String,
    /// Class label as printed
    #[serde(default, alias = "student_class")]
    pub class: String,
    /// Student code as printed
    #[serde(default, alias = "student_code")]
    pub code: String,
}

impl CardFields {
    /// True when no field carries any text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.class.trim().is_empty() && self.code.trim().is_empty()
    }
}

/// Why a candidate earned points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchReason {
    /// Codes are equal ignoring case
    CodeExact,
    /// One code contains the other
    CodePartial,
    /// Classes are equal once spaces are removed
    ClassExact,
    /// One class contains the other once spaces are removed
    ClassPartial,
    /// Names are equal
    NameExact,
    /// Names are equal once accents are removed
    NameExactUnaccented,
    /// One name contains the other
    NamePartial,
    /// One name contains the other once accents are removed
    NamePartialUnaccented,
    /// Names are similar with the given ratio
    NameSimilar(f64),
}

impl MatchReason {
    /// Points this reason contributes.
    #[must_use]
    pub fn points(self) -> u32 {
        match self {
            Self::CodeExact => CODE_EXACT,
            Self::CodePartial => CODE_PARTIAL,
            Self::ClassExact => CLASS_EXACT,
            Self::ClassPartial => CLASS_PARTIAL,
            Self::NameExact => NAME_EXACT,
            Self::NameExactUnaccented => NAME_EXACT_UNACCENTED,
            Self::NamePartial => NAME_PARTIAL,
            Self::NamePartialUnaccented => NAME_PARTIAL_UNACCENTED,
            // ratio is within (0.70, 1.0], so the product fits in 21..=30
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self::NameSimilar(ratio) => (ratio * NAME_SIMILARITY_WEIGHT).floor() as u32,
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeExact => write!(f, "code matches"),
            Self::CodePartial => write!(f, "code partially matches"),
            Self::ClassExact => write!(f, "class matches"),
            Self::ClassPartial => write!(f, "class partially matches"),
            Self::NameExact => write!(f, "name matches"),
            Self::NameExactUnaccented => write!(f, "name matches ignoring accents"),
            Self::NamePartial => write!(f, "name partially matches"),
            Self::NamePartialUnaccented => write!(f, "name partially matches ignoring accents"),
            Self::NameSimilar(ratio) => write!(f, "name is {:.0}% similar", ratio * 100.0),
        }
    }
}

/// A roster student with its score and the reasons behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The matched student
    pub student: student::Model,
    /// Total points across all fields
    pub score: u32,
    /// One reason per field that scored
    pub reasons: Vec<MatchReason>,
}

impl Candidate {
    /// Comma-separated reasons, e.g. `"code matches, class matches"`.
    #[must_use]
    pub fn explain(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Best match plus runners-up for a human to choose from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Highest-scoring candidate, if any scored
    pub best: Option<Candidate>,
    /// Next [`MAX_ALTERNATIVES`] candidates
    pub alternatives: Vec<Candidate>,
}

impl Resolution {
    /// Splits a ranked list into best match and alternatives.
    #[must_use]
    pub fn from_ranked(ranked: Vec<Candidate>) -> Self {
        let mut ranked = ranked.into_iter();
        let best = ranked.next();
        let alternatives = ranked.take(MAX_ALTERNATIVES).collect();
        Self { best, alternatives }
    }

    /// The best candidate when it is safe to act without asking: its code
    /// matched exactly and it strictly outscores the runner-up.
    #[must_use]
    pub fn confident_match(&self) -> Option<&Candidate> {
        let best = self.best.as_ref()?;
        if !best.reasons.contains(&MatchReason::CodeExact) {
            return None;
        }
        match self.alternatives.first() {
            Some(runner_up) if runner_up.score >= best.score => None,
            _ => Some(best),
        }
    }
}

/// Collapses runs of whitespace to one space, trims and lowercases.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Removes diacritics by canonical decomposition, dropping combining marks.
/// `đ`/`Đ` have no decomposition and are mapped to `d`/`D` directly.
///
/// `"nguyễn văn a"` becomes `"nguyen van a"`.
#[must_use]
pub fn strip_accents(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Removes every whitespace character, so `"12 tin"` and `"12tin"` compare equal.
#[must_use]
pub fn remove_spaces(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn either_contains(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Similarity ratio in `[0, 1]` between two strings (normalized Levenshtein).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Scores a normalized card code against a normalized student code.
#[must_use]
pub fn score_code(card: &str, student: &str) -> Option<MatchReason> {
    if card.is_empty() || student.is_empty() {
        return None;
    }
    if card == student {
        Some(MatchReason::CodeExact)
    } else if either_contains(card, student) {
        Some(MatchReason::CodePartial)
    } else {
        None
    }
}

/// Scores a normalized card class against a normalized student class.
#[must_use]
pub fn score_class(card: &str, student: &str) -> Option<MatchReason> {
    let card = remove_spaces(card);
    let student = remove_spaces(student);
    if card.is_empty() || student.is_empty() {
        return None;
    }
    if card == student {
        Some(MatchReason::ClassExact)
    } else if either_contains(&card, &student) {
        Some(MatchReason::ClassPartial)
    } else {
        None
    }
}

/// Scores a normalized card name against a normalized student name.
#[must_use]
pub fn score_name(card: &str, student: &str) -> Option<MatchReason> {
    if card.is_empty() || student.is_empty() {
        return None;
    }
    let card_plain = strip_accents(card);
    let student_plain = strip_accents(student);

    if card == student {
        return Some(MatchReason::NameExact);
    }
    if card_plain == student_plain {
        return Some(MatchReason::NameExactUnaccented);
    }
    if either_contains(card, student) {
        return Some(MatchReason::NamePartial);
    }
    if either_contains(&card_plain, &student_plain) {
        return Some(MatchReason::NamePartialUnaccented);
    }

    let ratio = similarity(&card_plain, &student_plain);
    (ratio > NAME_SIMILARITY_THRESHOLD).then_some(MatchReason::NameSimilar(ratio))
}

/// Scores one student against the card. Returns `None` when nothing matched.
#[must_use]
pub fn score_candidate(card: &CardFields, student: &student::Model) -> Option<Candidate> {
    let reasons: Vec<MatchReason> = [
        score_code(&normalize(&card.code), &normalize(&student.student_code)),
        score_class(&normalize(&card.class), &normalize(&student.student_class)),
        score_name(&normalize(&card.name), &normalize(&student.name)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let score: u32 = reasons.iter().map(|r| r.points()).sum();
    (score > 0).then(|| Candidate {
        student: student.clone(),
        score,
        reasons,
    })
}

/// Ranks the roster against the card, best first. Ties keep roster order.
#[must_use]
pub fn rank_candidates(card: &CardFields, roster: &[student::Model]) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = roster
        .iter()
        .filter_map(|s| score_candidate(card, s))
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Loads the roster and ranks it against the card.
pub async fn resolve<C>(db: &C, card: &CardFields) -> Result<Vec<Candidate>>
where
    C: ConnectionTrait,
{
    if card.is_blank() {
        return Ok(Vec::new());
    }
    let roster = get_all_students(db).await?;
    let ranked = rank_candidates(card, &roster);
    tracing::debug!(
        "Resolved card {:?} against {} students: {} candidates",
        card,
        roster.len(),
        ranked.len()
    );
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn student(id: i64, code: &str, name: &str, class: &str) -> student::Model {
        student::Model {
            id,
            student_code: code.to_string(),
            name: name.to_string(),
            student_class: class.to_string(),
            current_score: 100,
        }
    }

    fn card(name: &str, class: &str, code: &str) -> CardFields {
        CardFields {
            name: name.to_string(),
            class: class.to_string(),
            code: code.to_string(),
        }
    }

    fn roster() -> Vec<student::Model> {
        vec![
            student(1, "12TIN-002", "Trần Thị Bình", "12 Tin"),
            student(2, "12TIN-001", "Nguyễn Văn A", "12 Tin"),
            student(3, "11TOAN-001", "Lê Văn Cường", "11 Toán"),
        ]
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Nguyễn   Văn\tA "), "nguyễn văn a");
        assert_eq!(normalize(""), "");
        assert_eq!(strip_accents("nguyễn văn a"), "nguyen van a");
        assert_eq!(strip_accents("Đặng Thị Đào"), "Dang Thi Dao");
        assert_eq!(remove_spaces("12 tin"), "12tin");
    }

    #[test]
    fn test_exact_code_ranks_first() {
        let ranked = rank_candidates(&card("", "", "12tin-001"), &roster());

        assert_eq!(ranked[0].student.student_code, "12TIN-001");
        assert!(ranked[0].score >= 100);
        assert_eq!(ranked[0].reasons, vec![MatchReason::CodeExact]);
    }

    #[test]
    fn test_empty_card_matches_nobody() {
        assert!(rank_candidates(&card("", "", ""), &roster()).is_empty());
        assert!(rank_candidates(&card("  ", "\t", " "), &roster()).is_empty());
    }

    #[test]
    fn test_empty_roster() {
        assert!(rank_candidates(&card("An", "12 Tin", "X1"), &[]).is_empty());
    }

    #[test]
    fn test_name_without_accents() {
        assert_eq!(
            score_name("nguyen van a", "nguyễn văn a"),
            Some(MatchReason::NameExactUnaccented)
        );
        assert_eq!(MatchReason::NameExactUnaccented.points(), 50);

        let ranked = rank_candidates(&card("Nguyen Van A", "", ""), &roster());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].student.id, 2);
        assert_eq!(ranked[0].score, 50);
    }

    #[test]
    fn test_name_with_d_stroke() {
        assert_eq!(
            score_name(&normalize("Dang Van Duc"), &normalize("Đặng Văn Đức")),
            Some(MatchReason::NameExactUnaccented)
        );
        assert_eq!(
            score_name(&normalize("dang"), &normalize("Đặng Văn Đức")),
            Some(MatchReason::NamePartialUnaccented)
        );
    }

    #[test]
    fn test_name_rule_priority() {
        assert_eq!(
            score_name("nguyễn văn a", "nguyễn văn a"),
            Some(MatchReason::NameExact)
        );
        assert_eq!(
            score_name("văn a", "nguyễn văn a"),
            Some(MatchReason::NamePartial)
        );
        assert_eq!(
            score_name("van a", "nguyễn văn a"),
            Some(MatchReason::NamePartialUnaccented)
        );
        assert_eq!(score_name("", "nguyễn văn a"), None);
    }

    #[test]
    fn test_name_similarity_branch() {
        let reason = score_name("nguyen van b", "nguyễn văn a").unwrap();
        let MatchReason::NameSimilar(ratio) = reason else {
            panic!("expected similarity match, got {reason:?}");
        };
        assert!(ratio > NAME_SIMILARITY_THRESHOLD);
        assert_eq!(reason.points(), 27);

        assert_eq!(score_name("pham", "nguyễn văn a"), None);
    }

    #[test]
    fn test_class_ignores_spaces() {
        assert_eq!(score_class("12tin", "12 tin"), Some(MatchReason::ClassExact));
        assert_eq!(score_class("12", "12 tin"), Some(MatchReason::ClassPartial));
        assert_eq!(score_class("11 toán", "12 tin"), None);
        assert_eq!(score_class("", "12 tin"), None);
    }

    #[test]
    fn test_code_partial() {
        assert_eq!(score_code("tin-001", "12tin-001"), Some(MatchReason::CodePartial));
        assert_eq!(score_code("12tin-001x", "12tin-001"), Some(MatchReason::CodePartial));
        assert_eq!(score_code("", "12tin-001"), None);
    }

    #[test]
    fn test_fields_add_up() {
        let ranked = rank_candidates(&card("Nguyễn Văn A", "12Tin", "12TIN-001"), &roster());

        assert_eq!(ranked[0].student.id, 2);
        assert_eq!(ranked[0].score, 100 + 40 + 60);
        assert_eq!(ranked[0].reasons.len(), 3);
        // Classmate still shows up on class + partial code
        assert_eq!(ranked[1].student.id, 1);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let ranked = rank_candidates(&card("", "12 Tin", ""), &roster());
        let ids: Vec<_> = ranked.iter().map(|c| c.student.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_resolution_split_and_confidence() {
        let ranked = rank_candidates(&card("", "12 Tin", "12TIN-001"), &roster());
        let resolution = Resolution::from_ranked(ranked);

        let best = resolution.confident_match().unwrap();
        assert_eq!(best.student.id, 2);
        // 11TOAN-001 shares neither code nor class and is dropped
        let alt_ids: Vec<_> = resolution.alternatives.iter().map(|c| c.student.id).collect();
        assert_eq!(alt_ids, vec![1]);

        // Class only: best is a tie and has no exact code
        let ranked = rank_candidates(&card("", "12 Tin", ""), &roster());
        assert!(Resolution::from_ranked(ranked).confident_match().is_none());

        assert_eq!(Resolution::from_ranked(Vec::new()), Resolution::default());
    }

    #[test]
    fn test_explain() {
        let ranked = rank_candidates(&card("", "12 Tin", "12TIN-001"), &roster());
        assert_eq!(ranked[0].explain(), "code matches, class matches");
    }

    #[test]
    fn test_card_fields_from_json() {
        let fields: CardFields =
            serde_json::from_str(r#"{"name": "An", "student_code": "X1"}"#).unwrap();
        assert_eq!(fields, card("An", "", "X1"));
    }

    #[tokio::test]
    async fn test_resolve_against_database() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "12TIN-001", "Nguyễn Văn A", "12 Tin").await?;
        create_test_student(&db, "12TIN-002", "Trần Thị Bình", "12Tin").await?;

        let ranked = resolve(&db, &card("", "", "12tin-001")).await?;
        assert_eq!(ranked[0].student.student_code, "12TIN-001");

        assert!(resolve(&db, &CardFields::default()).await?.is_empty());
        Ok(())
    }
}
