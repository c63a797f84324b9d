use crate::io::PAGE_IMAGES_DIR;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;

const MAX_FILENAME_LENGTH: usize = 100;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_. -]").expect("static regex"));
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("static regex"));

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadParams {
    pub image_url: Option<String>,
    pub upload: Option<UploadedFile>,
    #[serde(default, deserialize_with = "super::actions::lenient_bool")]
    pub clear_upload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(deserialize_with = "from_base64")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub url: Option<String>,
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

/// Strips a filename down to `[A-Za-z0-9_.-]`, turning spaces into dashes.
pub fn munge_filename(filename: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(filename.trim(), "");
    let dashed = cleaned.replace(' ', "-");
    let munged = DASH_RUNS.replace_all(&dashed, "-").into_owned();

    if munged.chars().count() <= MAX_FILENAME_LENGTH {
        return munged;
    }

    // keep the extension when shortening
    let (stem, ext) = match munged.rfind('.') {
        Some(idx) if idx > 0 => munged.split_at(idx),
        _ => (munged.as_str(), ""),
    };
    let keep = MAX_FILENAME_LENGTH.saturating_sub(ext.chars().count());
    let stem: String = stem.chars().take(keep).collect();
    format!("{}{}", stem, ext)
}

/// Upload name with a timestamp prefix, e.g. `2024-05-01-093000.000000logo.png`.
pub fn stored_filename(original: &str, now: NaiveDateTime) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    munge_filename(&format!("{}{}", stamp, original))
}

/// Fully-qualified URL of a stored page image. Absolute URLs are returned as given.
pub fn qualified_image_url(site_url: &str, image: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        return image.to_string();
    }

    format!(
        "{}/uploads/{}/{}",
        site_url.trim_end_matches('/'),
        PAGE_IMAGES_DIR,
        image.trim_start_matches('/')
    )
}
