//! Minimal HTML text extraction.
//!
//! Enough of a tokenizer to pull anchors and paragraph text out of a policy
//! page. Script and style bodies, comments and doctypes are skipped. This is
//! not a conforming HTML parser: malformed markup degrades to plain text.

/// A hyperlink with its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Raw href, entity-decoded but not resolved
    pub href: String,

    /// Visible text with whitespace collapsed
    pub text: String,
}

#[derive(Debug)]
enum Token<'a> {
    Open { name: String, attrs: &'a str },
    Close(String),
    Text(&'a str),
}

/// Elements whose body is never page text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn tag_name(inner: &str) -> String {
    if !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return String::new();
    }
    inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(rel) = html[pos..].find('<') else {
            tokens.push(Token::Text(&html[pos..]));
            break;
        };
        let lt = pos + rel;
        if lt > pos {
            tokens.push(Token::Text(&html[pos..lt]));
        }

        if lower[lt..].starts_with("<!--") {
            pos = match html[lt + 4..].find("-->") {
                Some(end) => lt + 4 + end + 3,
                None => html.len(),
            };
            continue;
        }

        let Some(gt_rel) = html[lt..].find('>') else {
            tokens.push(Token::Text(&html[lt..]));
            break;
        };
        let gt = lt + gt_rel;
        let inner = &html[lt + 1..gt];

        if let Some(closing) = inner.strip_prefix('/') {
            tokens.push(Token::Close(tag_name(closing)));
            pos = gt + 1;
            continue;
        }

        if inner.starts_with('!') || inner.starts_with('?') {
            pos = gt + 1;
            continue;
        }

        let name = tag_name(inner);
        if name.is_empty() {
            // a bare '<' in text, e.g. "a < b"
            tokens.push(Token::Text(&html[lt..lt + 1]));
            pos = lt + 1;
            continue;
        }

        pos = gt + 1;
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let close = format!("</{}", name);
            pos = lower[pos..]
                .find(&close)
                .map_or(html.len(), |end| pos + end);
        }

        let attrs = inner[name.len()..].trim_end_matches('/');
        tokens.push(Token::Open { name, attrs });
    }

    tokens
}

/// Value of attribute `wanted` in a tag's attribute text.
fn attr_value<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let mut rest = attrs.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c == '/' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let mut value = None;
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (found, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    match body.find(quote) {
                        Some(end) => (&body[..end], &body[end + 1..]),
                        None => (body, ""),
                    }
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    after_eq.split_at(end)
                }
            };
            value = Some(found);
            rest = remaining.trim_start();
        } else if name.is_empty() {
            let skip = rest.chars().next().map_or(0, char::len_utf8);
            rest = &rest[skip..];
            continue;
        }

        if name.eq_ignore_ascii_case(wanted) {
            return value;
        }
    }

    None
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(ch)
}

/// Decode named and numeric character references. Unknown ones are kept.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| decode_entity(&after[..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every `<a href>` in document order.
pub fn extract_links(html: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut current: Option<(String, String)> = None;

    let finish = |current: &mut Option<(String, String)>, links: &mut Vec<Link>| {
        if let Some((href, text)) = current.take() {
            links.push(Link {
                href,
                text: clean_text(&text),
            });
        }
    };

    for token in tokenize(html) {
        match token {
            Token::Open { name, attrs } if name == "a" => {
                // anchors do not nest; an unclosed one ends here
                finish(&mut current, &mut links);
                current = attr_value(attrs, "href")
                    .map(|href| (decode_entities(href.trim()), String::new()));
            }
            Token::Close(name) if name == "a" => finish(&mut current, &mut links),
            Token::Open { name, .. } if name == "br" => {
                if let Some((_, ref mut text)) = current {
                    text.push(' ');
                }
            }
            Token::Text(text) => {
                if let Some((_, ref mut buf)) = current {
                    buf.push_str(text);
                }
            }
            _ => {}
        }
    }
    finish(&mut current, &mut links);

    links
}

/// Text of every non-empty `<p>` element, trimmed, in document order.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    let finish = |current: &mut Option<String>, paragraphs: &mut Vec<String>| {
        if let Some(raw) = current.take() {
            let text = clean_text(&raw);
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }
    };

    for token in tokenize(html) {
        match token {
            Token::Open { name, .. } if name == "p" => {
                // an open <p> is implicitly closed by the next one
                finish(&mut current, &mut paragraphs);
                current = Some(String::new());
            }
            Token::Close(name) if name == "p" || name == "body" => {
                finish(&mut current, &mut paragraphs)
            }
            Token::Open { name, .. } if name == "br" => {
                if let Some(ref mut text) = current {
                    text.push(' ');
                }
            }
            Token::Text(text) => {
                if let Some(ref mut buf) = current {
                    buf.push_str(text);
                }
            }
            _ => {}
        }
    }
    finish(&mut current, &mut paragraphs);

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text() {
        let html = "<html><body><h1>Privacy</h1>\
                    <p>Hello <b>world</b></p>\
                    <div><p>\n  We   keep data\nfor 30 days.  </p></div>\
                    <p>   </p></body></html>";
        assert_eq!(
            extract_paragraphs(html),
            vec!["Hello world", "We keep data for 30 days."]
        );
    }

    #[test]
    fn test_scripts_styles_and_comments_are_skipped() {
        let html = "<p>Visible<script>var p = '<p>hidden</p>';</script></p>\
                    <style>p { color: red; }</style>\
                    <!-- <p>commented</p> -->\
                    <p>Also visible</p>";
        assert_eq!(extract_paragraphs(html), vec!["Visible", "Also visible"]);
    }

    #[test]
    fn test_unclosed_paragraphs() {
        let html = "<p>First paragraph<p>Second paragraph";
        assert_eq!(
            extract_paragraphs(html),
            vec!["First paragraph", "Second paragraph"]
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            decode_entities("Terms &amp; Privacy &#8212; &#x41;&lt;&gt; &bogus; & more"),
            "Terms & Privacy \u{2014} A<> &bogus; & more"
        );
        assert_eq!(
            extract_paragraphs("<p>We&nbsp;don&rsquo;t sell</p>"),
            vec!["We don\u{2019}t sell"]
        );
    }

    #[test]
    fn test_links() {
        let html = r#"<nav><a href="/about">About us</a>
            <A HREF='/legal/privacy?lang=en&amp;v=2' class=nav>Privacy <span>Notice</span></A>
            <a name="anchor">no href</a>
            <a href=https://example.com/terms>Terms</a></nav>"#;

        let links = extract_links(html);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].href, "/about");
        assert_eq!(links[1].href, "/legal/privacy?lang=en&v=2");
        assert_eq!(links[1].text, "Privacy Notice");
        assert_eq!(links[2].href, "https://example.com/terms");
    }

    #[test]
    fn test_attr_value_edge_cases() {
        assert_eq!(attr_value(r#" data-x="1" href="/a" "#, "href"), Some("/a"));
        assert_eq!(attr_value(" disabled href=/b", "href"), Some("/b"));
        assert_eq!(attr_value(" / ", "href"), None);
        assert_eq!(attr_value(r#" href="/unterminated"#, "href"), Some("/unterminated"));
    }

    #[test]
    fn test_bare_angle_bracket_is_text() {
        assert_eq!(extract_paragraphs("<p>1 < 2 and 3 > 2</p>"), vec!["1 < 2 and 3 > 2"]);
    }
}
