use super::tree::escape_html;

/// Stylesheet implementing the page-size and density classes.
pub const STYLESHEET: &str = include_str!("../../assets/screenplay.css");

/// Wrap rendered containers in a complete HTML page.
pub fn standalone_html(title: &str, body_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLESHEET,
        body_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_html_embeds_stylesheet_and_body() {
        let html = standalone_html("Act <1>", "<div class=\"screenplay\"></div>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Act &lt;1&gt;</title>"));
        assert!(html.contains("#script.us-letter.dpi150 .page"));
        assert!(html.contains("<body>\n<div class=\"screenplay\"></div>\n</body>"));
    }
}
