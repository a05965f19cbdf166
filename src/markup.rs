//! Plain-text post bodies to paragraph and line-break markup.

/// Split on blank lines into `<p>` blocks, turning single newlines into
/// `<br>`. Text is HTML-escaped; empty paragraphs are dropped.
pub fn body_as_html(body: &str) -> String {
    let body = body.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(body.len() + 16);
    for para in body.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        out.push_str("<p>\n");
        out.push_str(&escape_html(para).replace('\n', "<br>\n"));
        out.push_str("\n</p>\n");
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_is_one_paragraph() {
        assert_eq!(body_as_html("First post"), "<p>\nFirst post\n</p>\n");
    }

    #[test]
    fn blank_lines_split_paragraphs_and_newlines_break() {
        assert_eq!(
            body_as_html("one\ntwo\r\n\r\nthree"),
            "<p>\none<br>\ntwo\n</p>\n<p>\nthree\n</p>\n"
        );
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        assert_eq!(body_as_html("\n\n\n\n  \n\nhi\n\n"), "<p>\nhi\n</p>\n");
        assert_eq!(body_as_html("   "), "");
    }

    #[test]
    fn markup_is_escaped() {
        assert_eq!(
            body_as_html("<b>\"bold\" & 'brave'</b>"),
            "<p>\n&lt;b&gt;&#34;bold&#34; &amp; &#39;brave&#39;&lt;/b&gt;\n</p>\n"
        );
    }
}
