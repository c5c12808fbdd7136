//! Content-type lookup by key extension.

use mime::Mime;

/// Guess the content type of an object from the extension of its key.
///
/// Unknown or missing extensions map to `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use bcestack_bos_core::mimetypes::content_type_for_key;
///
/// assert_eq!(content_type_for_key("photos/cat.PNG").essence_str(), "image/png");
/// assert_eq!(content_type_for_key("grammar.gram").essence_str(), "application/srgs");
/// assert_eq!(content_type_for_key("README").essence_str(), "application/octet-stream");
/// ```
#[must_use]
pub fn content_type_for_key(key: &str) -> Mime {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    match file_name.rsplit_once('.') {
        Some((_, extension)) => content_type_for_extension(extension),
        None => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Look up a content type by extension, without the leading dot.
#[must_use]
pub fn content_type_for_extension(extension: &str) -> Mime {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" | "jpe" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "txt" | "text" | "log" => mime::TEXT_PLAIN,
        "htm" | "html" => mime::TEXT_HTML,
        "css" => mime::TEXT_CSS,
        "csv" => mime::TEXT_CSV,
        "xml" => mime::TEXT_XML,
        "js" => mime::APPLICATION_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        "mp3" => parse_or_binary("audio/mpeg"),
        "mp4" => parse_or_binary("video/mp4"),
        "zip" => parse_or_binary("application/zip"),
        "gz" | "tgz" => parse_or_binary("application/gzip"),
        "tar" => parse_or_binary("application/x-tar"),
        "gram" | "grxml" => parse_or_binary("application/srgs"),
        "doc" => parse_or_binary("application/msword"),
        "xls" => parse_or_binary("application/vnd.ms-excel"),
        "ppt" => parse_or_binary("application/vnd.ms-powerpoint"),
        "wav" => parse_or_binary("audio/x-wav"),
        "webp" => parse_or_binary("image/webp"),
        "ico" => parse_or_binary("image/x-icon"),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_or_binary(essence: &str) -> Mime {
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}
