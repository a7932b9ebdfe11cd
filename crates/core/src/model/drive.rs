use url::Url;

const DRIVE_HOST: &str = "drive.google.com";

/// A video hosted on Google Drive, playable in the built-in player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveVideo {
    file_id: String,
}

impl DriveVideo {
    /// Extracts the Drive file id from a share link.
    ///
    /// Accepts `/file/d/<id>/...` and `/open?id=<id>` links.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        if url.host_str() != Some(DRIVE_HOST) {
            return None;
        }

        let candidate = match url.path_segments() {
            Some(mut segments) => match (segments.next(), segments.next(), segments.next()) {
                (Some("file"), Some("d"), Some(id)) => Some(id.to_owned()),
                (Some("open"), ..) => url
                    .query_pairs()
                    .find(|(key, _)| key == "id")
                    .map(|(_, value)| value.into_owned()),
                _ => None,
            },
            None => None,
        }?;

        let file_id: String = candidate
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if file_id.is_empty() {
            return None;
        }
        Some(Self { file_id })
    }

    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    #[must_use]
    pub fn embed_url(&self) -> String {
        format!("https://{DRIVE_HOST}/file/d/{}/preview", self.file_id)
    }

    #[must_use]
    pub fn download_url(&self) -> String {
        format!("https://{DRIVE_HOST}/uc?export=download&id={}", self.file_id)
    }
}
