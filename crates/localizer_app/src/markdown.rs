//! Image references inside Markdown documents.
//!
//! Only two syntaxes are recognized: inline images (`![alt](ref "title")`,
//! with an optional `<...>` wrapped destination) and HTML `<img src="...">`.

use std::collections::HashSet;

use localizer_core::ReplacementMapping;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Group 1 holds an angle-bracketed destination, group 2 a bare one. Bare
/// destinations may contain one level of balanced parentheses.
static RE_INLINE_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"!\[[^\]]*\]\(\s*(?:<([^>]+)>|((?:[^()\s]|\([^()\s]*\))+))(?:\s+"[^"]*")?\s*\)"#,
    )
    .unwrap()
});

/// Group 1 (double quotes) or group 2 (single quotes) holds the source.
static RE_HTML_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]+)"|'([^']+)')"#).unwrap()
});

/// Image references in first-appearance order, each listed once.
pub fn extract_image_references(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = [&*RE_INLINE_IMAGE, &*RE_HTML_IMAGE]
        .into_iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            let target = reference_group(&caps)?;
            Some((start, target.as_str()))
        })
        .collect();
    found.sort_by_key(|(start, _)| *start);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, reference)| reference.trim())
        .filter(|reference| !reference.is_empty() && seen.insert(*reference))
        .map(ToOwned::to_owned)
        .collect()
}

/// Replaces every mapped image reference with its document path.
///
/// Text outside image syntax and unmapped references are left as they are.
pub fn rewrite_image_references(text: &str, mapping: &ReplacementMapping) -> String {
    let inline = substitute(&RE_INLINE_IMAGE, text, mapping);
    substitute(&RE_HTML_IMAGE, &inline, mapping)
}

fn reference_group<'t>(caps: &Captures<'t>) -> Option<regex::Match<'t>> {
    caps.get(1).or_else(|| caps.get(2))
}

fn substitute(re: &Regex, text: &str, mapping: &ReplacementMapping) -> String {
    re.replace_all(text, |caps: &Captures| {
        let whole = &caps[0];
        let (Some(outer), Some(target)) = (caps.get(0), reference_group(caps)) else {
            return whole.to_string();
        };
        match mapping.get(target.as_str().trim()) {
            Some(document_path) => {
                let start = target.start() - outer.start();
                let end = target.end() - outer.start();
                format!("{}{}{}", &whole[..start], document_path, &whole[end..])
            }
            None => whole.to_string(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"# Post

Intro ![chart](https://a.com/chart.png "Sales") and a [link](https://a.com/page).

<img src="pics/logo.svg" width="40"> <IMG alt='x' SRC='https://b.com/p.gif'>

![again](https://a.com/chart.png)
![spaced](<pics/my photo.png>)
"#;

    #[test]
    fn extracts_in_document_order_without_duplicates() {
        assert_eq!(
            extract_image_references(DOCUMENT),
            vec![
                "https://a.com/chart.png",
                "pics/logo.svg",
                "https://b.com/p.gif",
                "pics/my photo.png",
            ]
        );
    }

    #[test]
    fn balanced_parentheses_stay_in_the_destination() {
        let text = "![f](https://a.com/File_(1).png) and ![g](https://a.com/g.png \"T\")";
        assert_eq!(
            extract_image_references(text),
            vec!["https://a.com/File_(1).png", "https://a.com/g.png"]
        );

        let mut mapping = ReplacementMapping::new();
        mapping.insert("https://a.com/File_(1).png", "images/file_1.png");
        assert_eq!(
            rewrite_image_references(text, &mapping),
            "![f](images/file_1.png) and ![g](https://a.com/g.png \"T\")"
        );
    }

    #[test]
    fn plain_links_are_ignored() {
        assert!(extract_image_references("[x](https://a.com/x.png)").is_empty());
    }

    #[test]
    fn rewrites_mapped_references_only() {
        let mut mapping = ReplacementMapping::new();
        mapping.insert("https://a.com/chart.png", "images/chart.png");
        mapping.insert("https://b.com/p.gif", "images/p.gif");
        mapping.insert("pics/my photo.png", "images/my-photo.png");

        let rewritten = rewrite_image_references(DOCUMENT, &mapping);

        assert_eq!(
            rewritten,
            r#"# Post

Intro ![chart](images/chart.png "Sales") and a [link](https://a.com/page).

<img src="pics/logo.svg" width="40"> <IMG alt='x' SRC='images/p.gif'>

![again](images/chart.png)
![spaced](<images/my-photo.png>)
"#
        );
    }

    #[test]
    fn link_text_matching_a_reference_is_untouched() {
        let mut mapping = ReplacementMapping::new();
        mapping.insert("https://a.com/x.png", "images/x.png");

        let text = "See [https://a.com/x.png](https://a.com/x.png).";
        assert_eq!(rewrite_image_references(text, &mapping), text);
    }
}
