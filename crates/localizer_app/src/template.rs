//! `$name` substitution in the image folder and public path arguments.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `$$` escapes a dollar; `$name` and `${name}` are variables.
static RE_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(\$)|([A-Za-z_][A-Za-z0-9_]*)|\{([A-Za-z_][A-Za-z0-9_]*)\})").unwrap()
});

/// Values available to `--images-dirname` and `--images-publicpath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub article_name: String,
    pub date: String,
    pub time: String,
    pub dt: String,
    pub base_url: String,
}

impl TemplateVars {
    pub fn new(article_name: impl Into<String>, base_url: &str, now: NaiveDateTime) -> Self {
        Self {
            article_name: article_name.into(),
            date: now.format("%Y%m%d").to_string(),
            time: now.format("%H%M%S").to_string(),
            dt: timestamp(now),
            base_url: strip_protocol(base_url).to_string(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "article_name" => Some(&self.article_name),
            "date" => Some(&self.date),
            "time" => Some(&self.time),
            "dt" => Some(&self.dt),
            "base_url" => Some(&self.base_url),
            _ => None,
        }
    }
}

/// `YYYYmmdd_HHMMSS`, shared by `$dt` and timestamped output names.
pub fn timestamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Substitutes known variables; unknown ones are left as written.
pub fn expand_template(template: &str, vars: &TemplateVars) -> String {
    RE_VARIABLE
        .replace_all(template, |caps: &Captures| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            caps.get(2)
                .or_else(|| caps.get(3))
                .and_then(|name| vars.lookup(name.as_str()))
                .map_or_else(|| caps[0].to_string(), ToOwned::to_owned)
        })
        .into_owned()
}

fn strip_protocol(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn vars() -> TemplateVars {
        let now = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();
        TemplateVars::new("post", "https://site.com/blog", now)
    }

    #[test]
    fn known_variables_are_substituted() {
        let vars = vars();
        assert_eq!(expand_template("img/$article_name", &vars), "img/post");
        assert_eq!(expand_template("$date-$time", &vars), "20240305-140709");
        assert_eq!(expand_template("${dt}_x", &vars), "20240305_140709_x");
        assert_eq!(expand_template("/static/$base_url", &vars), "/static/site.com/blog");
    }

    #[test]
    fn unknown_variables_and_escapes_are_kept() {
        let vars = vars();
        assert_eq!(expand_template("$nope/${also}", &vars), "$nope/${also}");
        assert_eq!(expand_template("cost$$", &vars), "cost$");
        assert_eq!(expand_template("images", &vars), "images");
    }

    #[test]
    fn protocol_is_stripped_from_base_url() {
        assert_eq!(strip_protocol("http://a.com/x"), "a.com/x");
        assert_eq!(strip_protocol("https://a.com"), "a.com");
        assert_eq!(strip_protocol("docs/posts"), "docs/posts");
    }
}
