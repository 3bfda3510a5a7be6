//! The YouTube collaborator: a pure video id extractor and an oEmbed
//! metadata fetcher. The engine itself never calls into this module; the
//! transport layer resolves urls before handing tracks to a room.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

lazy_static! {
    static ref VIDEO_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref URL_SCHEME_REGEX: Regex = Regex::new(r"^(https?://)?").unwrap();
}

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";
const FETCH_TIMEOUT: Duration = Duration::from_secs(8);
const FALLBACK_TITLE: &str = "Unknown Track";

/// A video reference with its display metadata resolved.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub youtube_id: String,
    pub title: String,
    pub thumbnail: String,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

/// Extracts the 11-character video id from any supported YouTube url shape,
/// or from a raw id. Returns `None` for anything else.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if VIDEO_ID_REGEX.is_match(input) {
        return Some(input.to_string());
    }

    let with_scheme = URL_SCHEME_REGEX.replace(input, "https://");
    let url = Url::parse(&with_scheme).ok()?;

    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" => {
            let mut segments = url.path_segments()?;

            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                "embed" | "shorts" | "v" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    VIDEO_ID_REGEX.is_match(&candidate).then_some(candidate)
}

/// Resolves a url or raw id into a playable video reference.
/// `None` means the input is not a YouTube video reference at all; metadata
/// failures degrade to fallback values instead of failing the resolve.
pub async fn resolve(input: &str) -> Option<ResolvedVideo> {
    let youtube_id = extract_video_id(input)?;
    Some(fetch_metadata(&youtube_id).await)
}

/// Fetches display metadata for a video id. The thumbnail is always derived
/// from the id; the title comes from oEmbed, falling back on any error.
pub async fn fetch_metadata(youtube_id: &str) -> ResolvedVideo {
    let title = fetch_title(youtube_id)
        .await
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    ResolvedVideo {
        youtube_id: youtube_id.to_string(),
        title,
        thumbnail: format!("https://img.youtube.com/vi/{youtube_id}/mqdefault.jpg"),
    }
}

async fn fetch_title(youtube_id: &str) -> Option<String> {
    let watch_url = format!("https://www.youtube.com/watch?v={youtube_id}");

    let client = Client::builder().timeout(FETCH_TIMEOUT).build().ok()?;

    let response = client
        .get(OEMBED_ENDPOINT)
        .query(&[("url", watch_url.as_str()), ("format", "json")])
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }

    let body: OEmbedResponse = response.json().await.ok()?;
    body.title.filter(|title| !title.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_extract_from_supported_shapes() {
        let shapes = [
            ID.to_string(),
            format!("https://youtu.be/{ID}"),
            format!("https://www.youtube.com/watch?v={ID}"),
            format!("https://youtube.com/watch?v={ID}&t=42"),
            format!("https://www.youtube.com/embed/{ID}"),
            format!("https://www.youtube.com/shorts/{ID}"),
            format!("https://www.youtube.com/v/{ID}"),
            format!("https://music.youtube.com/watch?v={ID}"),
            format!("youtube.com/watch?v={ID}"),
            format!("www.youtube.com/watch?v={ID}"),
            format!("youtu.be/{ID}"),
        ];

        for shape in shapes {
            assert_eq!(
                extract_video_id(&shape).as_deref(),
                Some(ID),
                "extracts from {shape}"
            );
        }
    }

    #[test]
    fn test_extract_rejects_near_misses() {
        let rejects = [
            "",
            "dQw4w9WgXc",                                   // 10 chars
            "dQw4w9WgXcQQ",                                 // 12 chars
            "https://youtu.be/dQw4w9WgXc",                  // 10-char path
            "https://vimeo.com/123456789",                  // wrong host
            "https://notyoutube.com/watch?v=dQw4w9WgXcQ",   // wrong host
            "https://youtube.com/playlist?list=PL12345678", // unsupported path
            "https://youtube.com/watch",                    // no v param
            "just some words",
        ];

        for reject in rejects {
            assert_eq!(extract_video_id(reject), None, "rejects {reject:?}");
        }
    }

    #[test]
    fn test_extract_strips_www_only_once() {
        assert_eq!(
            extract_video_id(&format!("https://www.youtu.be/{ID}")).as_deref(),
            Some(ID),
            "www is stripped before host matching"
        );
        assert_eq!(
            extract_video_id(&format!("https://www.www.youtube.com/watch?v={ID}")),
            None,
            "a double www is not a supported host"
        );
    }
}
