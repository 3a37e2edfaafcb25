//! Listings: published offers to teach, or requests to learn, a skill.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{FieldErrors, check_length, normalise_terms};

/// Title length bounds.
pub const TITLE_MIN: usize = 3;
/// Title length bounds.
pub const TITLE_MAX: usize = 100;
/// Description length bounds.
pub const DESCRIPTION_MIN: usize = 10;
/// Description length bounds.
pub const DESCRIPTION_MAX: usize = 2000;
/// Maximum availability text length.
pub const AVAILABILITY_MAX: usize = 200;
/// Maximum number of tags on a listing.
pub const TAGS_MAX: usize = 10;
/// Maximum length of one tag.
pub const TAG_CHARS_MAX: usize = 30;

/// Whether the author offers or seeks the skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// The author offers to teach.
    Teach,
    /// The author wants to learn.
    Learn,
}

impl ListingKind {
    /// Wire name used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teach => "teach",
            Self::Learn => "learn",
        }
    }
}

/// Proficiency level the listing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    /// No prior experience.
    Beginner,
    /// Some experience.
    Intermediate,
    /// Comfortable practitioner.
    Advanced,
    /// Professional depth.
    Expert,
}

impl SkillLevel {
    /// Wire name used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

/// How sessions take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    /// Video call or chat.
    Online,
    /// Face to face.
    InPerson,
    /// Either.
    Hybrid,
}

impl SessionMode {
    /// Wire name used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::InPerson => "inPerson",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Stable listing identifier.
pub type ListingId = Uuid;

/// Published listing as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Identifier.
    pub id: ListingId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Teach or learn.
    #[serde(rename = "type")]
    pub kind: ListingKind,
    /// Targeted proficiency.
    pub skill_level: SkillLevel,
    /// Free-form availability, for example "weekday evenings".
    pub availability: String,
    /// Session mode.
    pub mode: SessionMode,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the signed-in user authored the listing.
    #[serde(default)]
    pub is_owner: bool,
    /// Author display name.
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw listing form input.
#[derive(Debug, Clone)]
pub struct ListingForm {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Teach or learn.
    pub kind: ListingKind,
    /// Targeted proficiency.
    pub skill_level: SkillLevel,
    /// Availability as typed.
    pub availability: String,
    /// Session mode.
    pub mode: SessionMode,
    /// Tags as typed.
    pub tags: Vec<String>,
}

/// Validated listing payload used for create and update.
///
/// ## Invariants
/// - title within [`TITLE_MIN`]..=[`TITLE_MAX`] characters once trimmed;
/// - description within [`DESCRIPTION_MIN`]..=[`DESCRIPTION_MAX`];
/// - availability non-blank;
/// - 1..=[`TAGS_MAX`] distinct (case-insensitive) non-blank tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    title: String,
    description: String,
    #[serde(rename = "type")]
    kind: ListingKind,
    skill_level: SkillLevel,
    availability: String,
    mode: SessionMode,
    tags: Vec<String>,
}

impl ListingDraft {
    /// Validate a listing form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn try_from_form(form: &ListingForm) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = check_length(&mut errors, "title", &form.title, TITLE_MIN, TITLE_MAX);
        let description = check_length(
            &mut errors,
            "description",
            &form.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
        );
        let availability = check_length(
            &mut errors,
            "availability",
            &form.availability,
            1,
            AVAILABILITY_MAX,
        );
        let tags = normalise_terms(&mut errors, "tags", &form.tags, TAGS_MAX, TAG_CHARS_MAX);
        if tags.is_empty() && errors.message_for("tags").is_none() {
            errors.push("tags", "at least one tag is required");
        }
        errors.into_result(Self {
            title,
            description,
            kind: form.kind,
            skill_level: form.skill_level,
            availability,
            mode: form.mode,
            tags,
        })
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalised tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Browse/search filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingQuery {
    /// Free-text search over title, description and tags.
    pub search: Option<String>,
    /// Restrict to teach or learn listings.
    pub kind: Option<ListingKind>,
    /// Restrict to one level.
    pub skill_level: Option<SkillLevel>,
    /// Restrict to one mode.
    pub mode: Option<SessionMode>,
}

impl ListingQuery {
    /// Render as query string pairs, omitting unset and blank filters.
    ///
    /// # Examples
    /// ```
    /// use skillswap_client::domain::{ListingKind, ListingQuery};
    ///
    /// let query = ListingQuery {
    ///     search: Some(" guitar ".to_owned()),
    ///     kind: Some(ListingKind::Teach),
    ///     ..ListingQuery::default()
    /// };
    /// assert_eq!(
    ///     query.to_pairs(),
    ///     vec![
    ///         ("search".to_owned(), "guitar".to_owned()),
    ///         ("type".to_owned(), "teach".to_owned()),
    ///     ]
    /// );
    /// ```
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
        {
            pairs.push(("search".to_owned(), search.to_owned()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type".to_owned(), kind.as_str().to_owned()));
        }
        if let Some(level) = self.skill_level {
            pairs.push(("level".to_owned(), level.as_str().to_owned()));
        }
        if let Some(mode) = self.mode {
            pairs.push(("mode".to_owned(), mode.as_str().to_owned()));
        }
        pairs
    }
}
