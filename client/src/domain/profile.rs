//! User profile model and the validated update form.

use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, check_length, normalise_terms};
use crate::domain::ports::FormPart;

/// Display name length bounds.
pub const DISPLAY_NAME_MIN: usize = 2;
/// Display name length bounds.
pub const DISPLAY_NAME_MAX: usize = 50;
/// Maximum bio length in characters.
pub const BIO_MAX: usize = 500;
/// Maximum location length in characters.
pub const LOCATION_MAX: usize = 100;
/// Maximum number of skills on a profile.
pub const SKILLS_MAX: usize = 20;
/// Maximum length of one skill.
pub const SKILL_CHARS_MAX: usize = 40;
/// Maximum accepted picture size in bytes.
pub const PICTURE_MAX_BYTES: usize = 5 * 1024 * 1024;

const PICTURE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Public display name.
    pub display_name: String,
    /// Free-form biography.
    #[serde(default)]
    pub bio: String,
    /// Free-form location.
    #[serde(default)]
    pub location: String,
    /// Skills the user lists on their profile.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Absolute URL of the profile picture.
    #[serde(default)]
    pub picture_url: Option<String>,
}

/// Raw profile form input.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    /// Public display name.
    pub display_name: String,
    /// Biography.
    pub bio: String,
    /// Location.
    pub location: String,
    /// Skills as typed, possibly with blanks and duplicates.
    pub skills: Vec<String>,
}

/// Validated profile changes sent on create and update.
///
/// ## Invariants
/// - display name is trimmed and within
///   [`DISPLAY_NAME_MIN`]..=[`DISPLAY_NAME_MAX`] characters;
/// - bio and location are trimmed and bounded;
/// - skills are trimmed, non-blank, de-duplicated case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    display_name: String,
    bio: String,
    location: String,
    skills: Vec<String>,
}

impl ProfileUpdate {
    /// Validate a profile form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn try_from_form(form: &ProfileForm) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let display_name = check_length(
            &mut errors,
            "displayName",
            &form.display_name,
            DISPLAY_NAME_MIN,
            DISPLAY_NAME_MAX,
        );
        let bio = check_length(&mut errors, "bio", &form.bio, 0, BIO_MAX);
        let location = check_length(&mut errors, "location", &form.location, 0, LOCATION_MAX);
        let skills = normalise_terms(
            &mut errors,
            "skills",
            &form.skills,
            SKILLS_MAX,
            SKILL_CHARS_MAX,
        );
        errors.into_result(Self {
            display_name,
            bio,
            location,
            skills,
        })
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Normalised skills.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Merge into an existing profile, keeping its picture.
    pub fn apply_to(&self, profile: Option<&Profile>) -> Profile {
        Profile {
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            skills: self.skills.clone(),
            picture_url: profile.and_then(|existing| existing.picture_url.clone()),
        }
    }

    /// Encode as multipart parts, with an optional picture upload last.
    pub fn to_form_parts(&self, picture: Option<&ProfilePicture>) -> Vec<FormPart> {
        let mut parts = vec![
            text_part("displayName", &self.display_name),
            text_part("bio", &self.bio),
            text_part("location", &self.location),
        ];
        parts.extend(self.skills.iter().map(|skill| text_part("skills", skill)));
        if let Some(picture) = picture {
            parts.push(FormPart::File {
                name: "picture".to_owned(),
                file_name: picture.file_name.clone(),
                content_type: picture.content_type.clone(),
                bytes: picture.bytes.clone(),
            });
        }
        parts
    }
}

fn text_part(name: &str, value: &str) -> FormPart {
    FormPart::Text {
        name: name.to_owned(),
        value: value.to_owned(),
    }
}

/// Validated profile picture upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ProfilePicture {
    /// Validate an image upload.
    ///
    /// # Errors
    ///
    /// Returns a `picture` field error for unsupported types, empty files or
    /// files over [`PICTURE_MAX_BYTES`].
    pub fn try_new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, FieldErrors> {
        let file_name = file_name.into();
        let content_type = content_type.into().to_ascii_lowercase();
        let mut errors = FieldErrors::default();
        if !PICTURE_TYPES.contains(&content_type.as_str()) {
            errors.push("picture", "picture must be a JPEG, PNG, WebP or GIF image");
        } else if bytes.is_empty() {
            errors.push("picture", "picture must not be empty");
        } else if bytes.len() > PICTURE_MAX_BYTES {
            errors.push("picture", "picture must be at most 5 MiB");
        }
        errors.into_result(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}
