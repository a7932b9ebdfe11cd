//! What happens when a learner activates a material tile.

use portal_core::model::{DriveVideo, Material, MaterialKind};
use portal_core::{AccessDecision, LockReason};
use tracing::debug;
use url::Url;

use crate::progress_store::ProgressStore;

/// Result of trying to open a material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Locked {
        reason: LockReason,
        message: &'static str,
    },
    /// Nothing to show yet. The material still counts as seen.
    NotYetAvailable { kind: MaterialKind },
    /// Play in the embedded player; the player reports progress itself.
    OpenPlayer {
        embed_url: String,
        download_url: String,
    },
    /// Hand the link to the browser. Counts as complete.
    OpenExternal { url: Url },
}

impl OpenOutcome {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, OpenOutcome::Locked { .. })
    }
}

/// Message shown for a locked material.
#[must_use]
pub fn lock_message(reason: LockReason) -> &'static str {
    match reason {
        LockReason::SequentialPrerequisiteIncomplete => {
            "Please complete the previous video to unlock this one."
        }
        LockReason::TrialExpired => {
            "Please validate your payment to access all learning materials."
        }
    }
}

/// Resolves an open request for `material` and records completion where
/// opening it is all there is to do.
pub fn open_material(
    decision: AccessDecision,
    material: &Material,
    progress: &ProgressStore,
) -> OpenOutcome {
    if let AccessDecision::Locked(reason) = decision {
        return OpenOutcome::Locked {
            reason,
            message: lock_message(reason),
        };
    }

    let url = match material.url() {
        Some(url) if material.kind() != MaterialKind::Quiz => url,
        _ => {
            progress.set_progress(material.id(), 100.0);
            return OpenOutcome::NotYetAvailable {
                kind: material.kind(),
            };
        }
    };

    // Only Drive file links can be embedded; other videos open externally.
    if material.kind().is_video() {
        if let Some(video) = DriveVideo::from_url(url) {
            debug!(material = %material.id(), file = video.file_id(), "opening player");
            return OpenOutcome::OpenPlayer {
                embed_url: video.embed_url(),
                download_url: video.download_url(),
            };
        }
    }

    progress.set_progress(material.id(), 100.0);
    OpenOutcome::OpenExternal { url: url.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{MaterialId, Percent};

    fn material(kind: MaterialKind, url: Option<&str>) -> Material {
        Material::new(MaterialId::new("m1").unwrap(), "Lesson", kind, "Math", None, url).unwrap()
    }

    #[test]
    fn locked_material_is_untouched() {
        let store = ProgressStore::ephemeral();
        let m = material(MaterialKind::Document, Some("https://example.com/a.pdf"));
        let outcome = open_material(
            AccessDecision::Locked(LockReason::TrialExpired),
            &m,
            &store,
        );
        assert_eq!(
            outcome,
            OpenOutcome::Locked {
                reason: LockReason::TrialExpired,
                message: "Please validate your payment to access all learning materials.",
            }
        );
        assert_eq!(store.get_progress(m.id()), Percent::ZERO);
    }

    #[test]
    fn quiz_and_missing_link_complete_without_opening() {
        let store = ProgressStore::ephemeral();
        let quiz = material(MaterialKind::Quiz, Some("https://example.com/quiz"));
        assert_eq!(
            open_material(AccessDecision::Unlocked, &quiz, &store),
            OpenOutcome::NotYetAvailable {
                kind: MaterialKind::Quiz
            }
        );
        assert!(store.get_progress(quiz.id()).is_complete());

        let store = ProgressStore::ephemeral();
        let bare = material(MaterialKind::PastPaper, None);
        assert!(matches!(
            open_material(AccessDecision::Unlocked, &bare, &store),
            OpenOutcome::NotYetAvailable { .. }
        ));
        assert!(store.get_progress(bare.id()).is_complete());
    }

    #[test]
    fn drive_video_opens_player_without_completing() {
        let store = ProgressStore::ephemeral();
        let m = material(
            MaterialKind::Video,
            Some("https://drive.google.com/file/d/abc_123/view?usp=sharing"),
        );
        match open_material(AccessDecision::Unlocked, &m, &store) {
            OpenOutcome::OpenPlayer { embed_url, download_url } => {
                assert!(embed_url.contains("abc_123"));
                assert!(download_url.contains("abc_123"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.get_progress(m.id()), Percent::ZERO);
    }

    #[test]
    fn drive_folder_video_opens_externally() {
        let store = ProgressStore::ephemeral();
        let m = material(
            MaterialKind::Video,
            Some("https://drive.google.com/drive/folders/x"),
        );
        assert_eq!(
            open_material(AccessDecision::Unlocked, &m, &store),
            OpenOutcome::OpenExternal {
                url: Url::parse("https://drive.google.com/drive/folders/x").unwrap(),
            }
        );
        assert!(store.get_progress(m.id()).is_complete());
    }

    #[test]
    fn external_link_completes() {
        let store = ProgressStore::ephemeral();
        let m = material(MaterialKind::Document, Some("https://example.com/notes.pdf"));
        assert!(matches!(
            open_material(AccessDecision::Unlocked, &m, &store),
            OpenOutcome::OpenExternal { .. }
        ));
        assert!(store.get_progress(m.id()).is_complete());
    }
}
