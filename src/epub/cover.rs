use std::path::Path;

use quick_xml::escape::escape;

use crate::util::{MediaFormat, detect_media_format, extract_image_dimensions};

/// Size of the generated cover, also assumed for images whose size cannot
/// be read.
pub const DEFAULT_COVER_SIZE: (u32, u32) = (1200, 1600);

/// A cover image supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub data: Vec<u8>,
    pub format: MediaFormat,
}

impl Cover {
    /// Wrap image bytes; `file_name` only helps format detection.
    pub fn new(file_name: &str, data: Vec<u8>) -> Self {
        let format = detect_media_format(file_name, &data);
        Self { data, format }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self::new(&path.to_string_lossy(), data))
    }

    /// A plain generated cover with the title in the middle.
    pub fn generated(title: &str) -> Self {
        Self {
            data: generated_svg(title).into_bytes(),
            format: MediaFormat::Svg,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        extract_image_dimensions(&self.data).unwrap_or(DEFAULT_COVER_SIZE)
    }
}

fn generated_svg(title: &str) -> String {
    let (width, height) = DEFAULT_COVER_SIZE;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
<rect x="0" y="0" width="1200" height="1600" fill="#f5f2ea" />
<rect x="90" y="90" width="1020" height="1420" fill="#ffffff" stroke="#d7d0c2" stroke-width="6" />
<line x1="180" y1="350" x2="1020" y2="350" stroke="#99907e" stroke-width="3" />
<text x="600" y="760" text-anchor="middle" font-size="72" fill="#2b2b2b" font-family="serif">{}</text>
</svg>"##,
        escape(title)
    )
}

/// XHTML page showing the cover image, scaled to fit.
pub(crate) fn cover_page(image_href: &str, dimensions: (u32, u32), language: &str) -> String {
    let (width, height) = dimensions;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>Cover</title>
  <style type="text/css">body {{ margin: 0; padding: 0; text-align: center; }} svg {{ height: 100%; width: 100%; }}</style>
</head>
<body epub:type="cover">
  <svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1" viewBox="0 0 {width} {height}" preserveAspectRatio="xMidYMid meet">
    <image width="{width}" height="{height}" xlink:href="{href}"/>
  </svg>
</body>
</html>
"#,
        lang = escape(language),
        href = escape(image_href),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_cover_escapes_title() {
        let cover = Cover::generated("A & B <1>");
        let svg = String::from_utf8(cover.data.clone()).unwrap();
        assert!(svg.contains("A &amp; B &lt;1&gt;"));
        assert_eq!(cover.format, MediaFormat::Svg);
        assert_eq!(cover.dimensions(), DEFAULT_COVER_SIZE);
    }

    #[test]
    fn test_cover_format_from_name() {
        let cover = Cover::new("art.PNG", vec![1, 2, 3]);
        assert_eq!(cover.format, MediaFormat::Png);
    }

    #[test]
    fn test_cover_page_references_image() {
        let page = cover_page("../images/cover.jpg", (600, 900), "zh");
        assert!(page.contains(r#"xlink:href="../images/cover.jpg""#));
        assert!(page.contains(r#"viewBox="0 0 600 900""#));
    }
}
