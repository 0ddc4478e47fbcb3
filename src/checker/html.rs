// src/checker/html.rs
// =============================================================================
// This module pulls page features out of a parsed HTML document.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (built on html5ever, Mozilla's HTML parser)
// - Exposes the raw node tree, including the doctype node
//
// Everything here is a pure function over an `Html` tree, except
// `extract_features`, which parses a body and returns owned data.
//
// What we extract:
// - HTML version from the doctype
// - The first <title>
// - How many h1..h6 headings there are
// - Every <a href> value, unresolved
// - Whether the page looks like it has a login form
// - Whether a link points at the same host as the page (classify_link)
// =============================================================================

use scraper::{ElementRef, Html, Node};
use std::collections::BTreeMap;
use url::Url;

/// Tags counted by `count_headings`
const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Everything the analysis needs from a page, detached from the DOM.
///
/// `scraper::Html` is not `Send`, so the pipeline extracts this in one
/// synchronous step and lets the tree go before any `.await`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFeatures {
    pub html_version: String,
    pub title: String,
    pub headings: BTreeMap<String, usize>,
    pub has_login_form: bool,
    pub links: Vec<String>,
}

// Parses an HTML body and runs every extractor over it
pub fn extract_features(body: &str) -> PageFeatures {
    let document = Html::parse_document(body);

    PageFeatures {
        html_version: detect_version(&document),
        title: extract_title(&document),
        headings: count_headings(&document),
        has_login_form: has_login_form(&document),
        links: extract_links(&document),
    }
}

// Works out the HTML version from the top-level doctype
//
// Returns one of:
//   "HTML5"     - <!DOCTYPE html> with no public/system identifier
//   "XHTML"     - identifier mentions xhtml
//   "HTML 4.01" - identifier mentions html 4.01
//   "HTML 4.0"  - identifier mentions html 4.0
//   "Unknown"   - no doctype, or an identifier we don't recognise
pub fn detect_version(document: &Html) -> String {
    let doctype = document.tree.root().children().find_map(|node| match node.value() {
        Node::Doctype(doctype) => Some(doctype),
        _ => None,
    });

    let Some(doctype) = doctype else {
        return "Unknown".to_string();
    };

    let public_id = doctype.public_id();
    let system_id = doctype.system_id();

    if doctype.name().eq_ignore_ascii_case("html") && public_id.is_empty() && system_id.is_empty() {
        return "HTML5".to_string();
    }

    // Public identifier is checked before the system identifier
    for identifier in [public_id, system_id] {
        let identifier = identifier.to_lowercase();
        if identifier.contains("xhtml") {
            return "XHTML".to_string();
        }
        if identifier.contains("html 4.01") {
            return "HTML 4.01".to_string();
        }
        if identifier.contains("html 4.0") {
            return "HTML 4.0".to_string();
        }
    }

    "Unknown".to_string()
}

// Returns the text of the first <title> anywhere in the document
//
// Not limited to <head>: the first title in document order wins. The text
// is returned as written, whitespace included. No title gives "".
pub fn extract_title(document: &Html) -> String {
    elements(document, "title")
        .next()
        .map(|title| title.text().collect::<String>())
        .unwrap_or_default()
}

// Counts h1..h6 elements; all six keys are always present
pub fn count_headings(document: &Html) -> BTreeMap<String, usize> {
    let mut headings: BTreeMap<String, usize> =
        HEADING_TAGS.iter().map(|tag| (tag.to_string(), 0)).collect();

    for element in all_elements(document) {
        if let Some(count) = headings.get_mut(element.value().name()) {
            *count += 1;
        }
    }

    headings
}

// Collects the href of every <a> that has one, in document order
//
// Values are returned exactly as written. Resolution and filtering happen
// later in the prober.
pub fn extract_links(document: &Html) -> Vec<String> {
    elements(document, "a")
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

// Heuristic login-form detection
//
// True when the page has at least one password input AND at least one
// input that looks like a user field:
//   - type="text" or type="email", or
//   - a name containing "user", "email" or "login"
//
// The two inputs don't need to share a <form>.
pub fn has_login_form(document: &Html) -> bool {
    let mut has_password = false;
    let mut has_user_field = false;

    for input in elements(document, "input") {
        let input_type = lowercase_attr(&input, "type");
        let name = lowercase_attr(&input, "name");

        match input_type.as_str() {
            "password" => has_password = true,
            "text" | "email" => has_user_field = true,
            _ => {}
        }

        if name.contains("user") || name.contains("email") || name.contains("login") {
            has_user_field = true;
        }

        if has_password && has_user_field {
            return true;
        }
    }

    false
}

// Decides whether a link stays on the analyzed site
//
// - Empty link: internal (same-page reference)
// - No scheme: internal, without looking at the base. That includes
//   protocol-relative links ("//cdn.other.host/x")
// - Scheme present: internal iff host and explicit port match the base
pub fn classify_link(link: &str, base: &Url) -> LinkScope {
    if link.is_empty() {
        return LinkScope::Internal;
    }

    let target = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => return LinkScope::Internal,
        Err(_) => return LinkScope::External,
    };

    if target.host_str() == base.host_str() && target.port() == base.port() {
        LinkScope::Internal
    } else {
        LinkScope::External
    }
}

/// Which side of the site boundary a link falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    Internal,
    External,
}

// Every element in the document, depth-first, in document order
fn all_elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.tree.root().descendants().filter_map(ElementRef::wrap)
}

fn elements<'a>(document: &'a Html, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    all_elements(document).filter(move |element| element.value().name() == tag)
}

fn lowercase_attr(element: &ElementRef<'_>, name: &str) -> String {
    element
        .value()
        .attr(name)
        .map(str::to_lowercase)
        .unwrap_or_default()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why walk `document.tree` instead of using CSS selectors?
//    - The doctype is a node, not an element, so selectors can't see it
//    - descendants() visits every node exactly once, in document order
//    - ElementRef::wrap() returns None for text, comments and the doctype
//
// 2. What is a BTreeMap?
//    - A sorted map: keys come out in order (h1, h2, ... h6)
//    - That keeps the JSON report and the table output stable
//
// 3. What does `let Some(x) = ... else { ... }` do?
//    - "let-else": bind x if the pattern matches, otherwise run the else
//      block, which must leave the function (return, break, ...)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://myapp.test/page").unwrap()
    }

    #[test]
    fn test_html5_doctype() {
        let doc = Html::parse_document("<!DOCTYPE html><html><head></head><body></body></html>");
        assert_eq!(detect_version(&doc), "HTML5");
    }

    #[test]
    fn test_xhtml_doctype() {
        let doc = Html::parse_document(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"><html></html>"#,
        );
        assert_eq!(detect_version(&doc), "XHTML");
    }

    #[test]
    fn test_html401_doctype() {
        let doc = Html::parse_document(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"><html></html>"#,
        );
        assert_eq!(detect_version(&doc), "HTML 4.01");
    }

    #[test]
    fn test_html40_doctype() {
        let doc = Html::parse_document(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.0 Transitional//EN"><html></html>"#,
        );
        assert_eq!(detect_version(&doc), "HTML 4.0");
    }

    #[test]
    fn test_missing_doctype() {
        let doc = Html::parse_document("<html><head><title>x</title></head></html>");
        assert_eq!(detect_version(&doc), "Unknown");
    }

    #[test]
    fn test_unrecognised_identifier() {
        let doc = Html::parse_document(r#"<!DOCTYPE html PUBLIC "-//IETF//DTD HTML 2.0//EN"><html></html>"#);
        assert_eq!(detect_version(&doc), "Unknown");
    }

    #[test]
    fn test_title_first_occurrence_wins() {
        let doc = Html::parse_document(
            "<html><head><title>First</title></head><body><title>Second</title></body></html>",
        );
        assert_eq!(extract_title(&doc), "First");
    }

    #[test]
    fn test_title_keeps_whitespace() {
        let doc = Html::parse_document("<html><head><title>\n  Spaced Out  </title></head></html>");
        assert_eq!(extract_title(&doc), "\n  Spaced Out  ");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let doc = Html::parse_document("<html><body><p>no title</p></body></html>");
        assert_eq!(extract_title(&doc), "");
    }

    #[test]
    fn test_empty_title_element() {
        let doc = Html::parse_document("<html><head><title></title></head></html>");
        assert_eq!(extract_title(&doc), "");
    }

    #[test]
    fn test_heading_counts() {
        let doc = Html::parse_document("<h1>A</h1><h1>B</h1><h2>C</h2>");
        let headings = count_headings(&doc);
        let expected: BTreeMap<String, usize> = [
            ("h1", 2),
            ("h2", 1),
            ("h3", 0),
            ("h4", 0),
            ("h5", 0),
            ("h6", 0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(headings, expected);
    }

    #[test]
    fn test_extract_links_in_document_order() {
        let doc = Html::parse_document(
            r##"
            <a href="/one">1</a>
            <div><a href="https://other.test/two">2</a></div>
            <a>no href</a>
            <a href="">empty</a>
            <a href="#top">anchor</a>
            "##,
        );
        assert_eq!(
            extract_links(&doc),
            vec!["/one", "https://other.test/two", "", "#top"]
        );
    }

    #[test]
    fn test_login_form_detected() {
        let doc = Html::parse_document(
            r#"<form><input type="text" name="q"><input type="password" name="pw"></form>"#,
        );
        assert!(has_login_form(&doc));
    }

    #[test]
    fn test_login_form_by_field_name() {
        let doc = Html::parse_document(
            r#"<input type="hidden" name="UserName"><input type="PASSWORD">"#,
        );
        assert!(has_login_form(&doc));
    }

    #[test]
    fn test_login_form_across_forms() {
        let doc = Html::parse_document(
            r#"<form><input type="email"></form><form><input type="password"></form>"#,
        );
        assert!(has_login_form(&doc));
    }

    #[test]
    fn test_password_alone_is_not_login_form() {
        let doc = Html::parse_document(r#"<form><input type="password"></form>"#);
        assert!(!has_login_form(&doc));
    }

    #[test]
    fn test_search_box_is_not_login_form() {
        let doc = Html::parse_document(r#"<form><input type="text" name="q"></form>"#);
        assert!(!has_login_form(&doc));
    }

    #[test]
    fn test_classify_links() {
        let base = base();
        assert_eq!(classify_link("http://myapp.test/x", &base), LinkScope::Internal);
        assert_eq!(classify_link("http://other.test", &base), LinkScope::External);
        assert_eq!(classify_link("/relative", &base), LinkScope::Internal);
        assert_eq!(classify_link("", &base), LinkScope::Internal);
        assert_eq!(classify_link("//cdn.other.test/lib.js", &base), LinkScope::Internal);
        assert_eq!(classify_link("../up/x", &base), LinkScope::Internal);
        assert_eq!(classify_link("tel:+15555550100", &base), LinkScope::External);
        assert_eq!(classify_link("http://myapp.test:8080/x", &base), LinkScope::External);
    }

    #[test]
    fn test_extract_features() {
        let features = extract_features(
            r#"<!DOCTYPE html>
            <html><head><title> Welcome </title></head>
            <body>
              <h1>Hi</h1><h3>Sub</h3>
              <a href="/about">About</a>
              <a href="https://example.org">Out</a>
              <form><input name="login"><input type="password"></form>
            </body></html>"#,
        );
        assert_eq!(features.html_version, "HTML5");
        assert_eq!(features.title, " Welcome ");
        assert_eq!(features.headings["h1"], 1);
        assert_eq!(features.headings["h3"], 1);
        assert_eq!(features.headings["h2"], 0);
        assert!(features.has_login_form);
        assert_eq!(features.links, vec!["/about", "https://example.org"]);
    }
}
