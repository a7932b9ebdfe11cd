use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::MaterialId;

/// Topic bucket used when a material has no topic of its own.
pub const GENERAL_TOPIC: &str = "general";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material title cannot be empty")]
    EmptyTitle,

    #[error("material subject cannot be empty")]
    EmptySubject,

    #[error("invalid material url: {0}")]
    InvalidUrl(String),

    #[error("unknown material type: {0}")]
    UnknownKind(String),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// The kind of learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialKind {
    Video,
    Document,
    Quiz,
    PastPaper,
}

impl MaterialKind {
    /// Listing order of the dashboard tabs.
    pub const ALL: [MaterialKind; 4] = [
        MaterialKind::PastPaper,
        MaterialKind::Video,
        MaterialKind::Document,
        MaterialKind::Quiz,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::Video => "video",
            MaterialKind::Document => "document",
            MaterialKind::Quiz => "quiz",
            MaterialKind::PastPaper => "past-paper",
        }
    }

    #[must_use]
    pub fn is_video(self) -> bool {
        matches!(self, MaterialKind::Video)
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(MaterialKind::Video),
            "document" => Ok(MaterialKind::Document),
            "quiz" => Ok(MaterialKind::Quiz),
            "past-paper" => Ok(MaterialKind::PastPaper),
            other => Err(MaterialError::UnknownKind(other.to_owned())),
        }
    }
}

//
// ─── MATERIAL ──────────────────────────────────────────────────────────────────
//

/// One learning resource as listed on the dashboard.
///
/// Materials are owned by the catalog; access and progress logic only read
/// them. Ordering is not a property of the material itself but of its
/// position in the persisted catalog list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    id: MaterialId,
    title: String,
    description: Option<String>,
    kind: MaterialKind,
    subject: String,
    topic: Option<String>,
    url: Option<Url>,
}

impl Material {
    /// Creates a validated material.
    ///
    /// Blank topics and descriptions are normalized to `None`, and a blank
    /// url means the content is not available yet.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError` if title or subject is blank, or the url does
    /// not parse.
    pub fn new(
        id: MaterialId,
        title: impl Into<String>,
        kind: MaterialKind,
        subject: impl Into<String>,
        topic: Option<String>,
        url: Option<&str>,
    ) -> Result<Self, MaterialError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(MaterialError::EmptyTitle);
        }
        let subject = subject.into().trim().to_owned();
        if subject.is_empty() {
            return Err(MaterialError::EmptySubject);
        }

        let url = match url.map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                Some(Url::parse(raw).map_err(|_| MaterialError::InvalidUrl(raw.to_owned()))?)
            }
        };

        Ok(Self {
            id,
            title,
            description: None,
            kind,
            subject,
            topic: normalize_topic(topic),
            url,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        self
    }

    #[must_use]
    pub fn id(&self) -> &MaterialId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The explicit topic, if one was set.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The topic used for grouping; falls back to [`GENERAL_TOPIC`].
    #[must_use]
    pub fn topic_bucket(&self) -> &str {
        self.topic.as_deref().unwrap_or(GENERAL_TOPIC)
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    #[must_use]
    pub fn has_url(&self) -> bool {
        self.url.is_some()
    }
}

fn normalize_topic(topic: Option<String>) -> Option<String> {
    topic
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && v != GENERAL_TOPIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> MaterialId {
        MaterialId::new(raw).unwrap()
    }

    #[test]
    fn kind_round_trips_wire_names() {
        for kind in MaterialKind::ALL {
            assert_eq!(kind.as_str().parse::<MaterialKind>().unwrap(), kind);
        }
        assert!(matches!(
            "podcast".parse::<MaterialKind>(),
            Err(MaterialError::UnknownKind(_))
        ));
    }

    #[test]
    fn blank_topic_falls_into_general_bucket() {
        let m = Material::new(
            id("1"),
            "Intro",
            MaterialKind::Video,
            "Physics",
            Some("  ".into()),
            None,
        )
        .unwrap();
        assert_eq!(m.topic(), None);
        assert_eq!(m.topic_bucket(), GENERAL_TOPIC);

        let explicit = Material::new(
            id("2"),
            "Intro",
            MaterialKind::Video,
            "Physics",
            Some("general".into()),
            None,
        )
        .unwrap();
        assert_eq!(explicit.topic_bucket(), m.topic_bucket());
    }

    #[test]
    fn blank_url_means_not_available() {
        let m = Material::new(id("1"), "Notes", MaterialKind::Document, "Math", None, Some(""))
            .unwrap();
        assert!(!m.has_url());
    }

    #[test]
    fn rejects_blank_title_and_bad_url() {
        assert_eq!(
            Material::new(id("1"), " ", MaterialKind::Quiz, "Math", None, None),
            Err(MaterialError::EmptyTitle)
        );
        assert_eq!(
            Material::new(id("1"), "Quiz", MaterialKind::Quiz, "", None, None),
            Err(MaterialError::EmptySubject)
        );
        assert!(matches!(
            Material::new(id("1"), "Quiz", MaterialKind::Quiz, "Math", None, Some("not a url")),
            Err(MaterialError::InvalidUrl(_))
        ));
    }
}
