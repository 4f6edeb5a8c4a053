use std::path::Path;

use mime::Mime;

/// Picks the content type for a static asset from its extension.
pub fn for_path(path: impl AsRef<Path>) -> Mime {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "css" => mime::TEXT_CSS_UTF_8,
        "js" | "mjs" => mime::APPLICATION_JAVASCRIPT_UTF_8,
        "json" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "svg" => mime::IMAGE_SVG,
        "webp" => parse_or_default("image/webp"),
        "ico" => parse_or_default("image/x-icon"),
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parse_or_default(essence: &str) -> Mime {
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::for_path;

    #[test]
    fn common_site_assets_are_recognized() {
        assert_eq!(for_path("index.html").as_ref(), "text/html; charset=utf-8");
        assert_eq!(for_path("css/site.CSS").as_ref(), "text/css; charset=utf-8");
        assert_eq!(for_path("docs/agenda.pdf").as_ref(), "application/pdf");
        assert_eq!(for_path("img/banner.jpeg").as_ref(), "image/jpeg");
        assert_eq!(for_path("img/logo.webp").as_ref(), "image/webp");
    }

    #[test]
    fn unknown_extensions_are_binary() {
        assert_eq!(for_path("archive.xyz").as_ref(), "application/octet-stream");
        assert_eq!(for_path("LICENSE").as_ref(), "application/octet-stream");
    }
}
