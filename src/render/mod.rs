use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys consulted, in order, when looking for an image inside an object.
pub const IMAGE_PRIORITY_KEYS: &[&str] = &[
    "url",
    "src",
    "data",
    "image",
    "photo",
    "avatar",
    "picture",
    "thumbnail",
];

const IMAGE_EXT: &str = r"(?:png|jpe?g|gif|webp|avif|svg)";

/// Display fragment for one field value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    Empty,
    Text { text: String },
    Link { href: String },
    Image { src: String },
    List { items: Vec<Fragment> },
    Pairs { entries: Vec<(String, Fragment)> },
}

impl Fragment {
    pub fn text(value: impl Into<String>) -> Self {
        Fragment::Text { text: value.into() }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Fragment::Empty)
    }
}

fn direct_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)(^data:image/)|\.{IMAGE_EXT}(\?|$)"))
            .expect("direct image pattern")
    })
}

fn markdown_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"!\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
            .expect("markdown image pattern")
    })
}

fn html_img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]+)"|'([^']+)'|([^\s>]+))"#)
            .expect("html img pattern")
    })
}

fn embedded_image_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"(?i)(data:image/[a-z0-9.+-]+;base64,[a-z0-9+/=]+|https?://[^\s"'<>()]+?\.{IMAGE_EXT}(?:\?[^\s"'<>()]*)?)(?:[\s"'<>()]|$)"#
        ))
        .expect("embedded image url pattern")
    })
}

/// Extract an image reference from a string: the string itself when it is a
/// data URI or ends in an image extension, else the first reference embedded
/// as a markdown image, an HTML `img` tag, or a bare image URL.
pub fn find_image_reference(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.contains(char::is_whitespace) && direct_image_re().is_match(trimmed) {
        return Some(trimmed.to_string());
    }
    if let Some(caps) = markdown_image_re().captures(trimmed) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if let Some(caps) = html_img_re().captures(trimmed) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string());
    }
    embedded_image_url_re()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_absolute_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// First image reference inside an object: priority keys holding strings,
/// then nested objects under the priority keys, then every other nested
/// object in field order.
pub fn find_image_in_object(map: &Map<String, Value>) -> Option<String> {
    for key in IMAGE_PRIORITY_KEYS {
        if let Some(Value::String(s)) = crate::identity::field(map, key) {
            if let Some(found) = find_image_reference(s) {
                return Some(found);
            }
        }
    }
    for key in IMAGE_PRIORITY_KEYS {
        if let Some(Value::Object(inner)) = crate::identity::field(map, key) {
            if let Some(found) = find_image_in_object(inner) {
                return Some(found);
            }
        }
    }
    map.iter()
        .filter(|(k, _)| {
            !IMAGE_PRIORITY_KEYS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(k))
        })
        .find_map(|(_, v)| match v {
            Value::Object(inner) => find_image_in_object(inner),
            _ => None,
        })
}

fn render_string(value: &str) -> Fragment {
    if let Some(src) = find_image_reference(value) {
        return Fragment::Image { src };
    }
    let trimmed = value.trim();
    if is_absolute_url(trimmed) && !trimmed.contains(char::is_whitespace) {
        return Fragment::Link {
            href: trimmed.to_string(),
        };
    }
    Fragment::text(trimmed)
}

/// Map a field value to its display fragment.
pub fn render_value(value: &Value) -> Fragment {
    match value {
        Value::Null => Fragment::Empty,
        Value::Bool(b) => Fragment::text(b.to_string()),
        Value::Number(n) => Fragment::text(n.to_string()),
        Value::String(s) => render_string(s),
        Value::Array(items) => Fragment::List {
            items: items.iter().map(render_value).collect(),
        },
        Value::Object(map) => match find_image_in_object(map) {
            Some(src) => Fragment::Image { src },
            None => Fragment::Pairs {
                entries: map
                    .iter()
                    .map(|(k, v)| (k.clone(), render_value(v)))
                    .collect(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(src: &str) -> Fragment {
        Fragment::Image {
            src: src.to_string(),
        }
    }

    #[test]
    fn direct_image_urls() {
        assert_eq!(render_value(&json!("https://x/p.png")), image("https://x/p.png"));
        assert_eq!(
            render_value(&json!(" https://x/p.JPEG?w=200 ")),
            image("https://x/p.JPEG?w=200")
        );
        assert_eq!(
            render_value(&json!("data:image/png;base64,AAAA")),
            image("data:image/png;base64,AAAA")
        );
        assert_eq!(render_value(&json!("me.webp")), image("me.webp"));
    }

    #[test]
    fn markdown_image_is_extracted() {
        assert_eq!(
            render_value(&json!("Here I am: ![me](https://cdn.x/me) on a hike")),
            image("https://cdn.x/me")
        );
    }

    #[test]
    fn html_img_is_extracted() {
        assert_eq!(
            render_value(&json!(r#"<p><img alt="x" src='/media/a.gif'></p>"#)),
            image("/media/a.gif")
        );
    }

    #[test]
    fn bare_embedded_image_url_is_extracted() {
        assert_eq!(
            render_value(&json!("My dog (see https://pics.x/dog.jpg) is great")),
            image("https://pics.x/dog.jpg")
        );
    }

    #[test]
    fn links_and_text() {
        assert_eq!(
            render_value(&json!("https://github.com/ana")),
            Fragment::Link {
                href: "https://github.com/ana".to_string()
            }
        );
        assert_eq!(render_value(&json!("  hello  ")), Fragment::text("hello"));
        assert_eq!(
            render_value(&json!("pngs are nice")),
            Fragment::text("pngs are nice")
        );
    }

    #[test]
    fn scalars_and_null() {
        assert_eq!(render_value(&json!(3)), Fragment::text("3"));
        assert_eq!(render_value(&json!(true)), Fragment::text("true"));
        assert!(render_value(&json!(null)).is_empty());
    }

    #[test]
    fn object_with_priority_key_renders_image() {
        let v = json!({"caption": "me", "src": "https://x/a.svg", "url": "https://x/page"});
        assert_eq!(render_value(&v), image("https://x/a.svg"));
    }

    #[test]
    fn nested_object_image_is_found() {
        let v = json!({"caption": "me", "file": {"meta": {"thumbnail": "t.avif"}}});
        assert_eq!(render_value(&v), image("t.avif"));
    }

    #[test]
    fn object_without_image_renders_pairs_in_order() {
        let v = json!({"zeta": "z", "alpha": {"x": 1}});
        assert_eq!(
            render_value(&v),
            Fragment::Pairs {
                entries: vec![
                    ("zeta".to_string(), Fragment::text("z")),
                    (
                        "alpha".to_string(),
                        Fragment::Pairs {
                            entries: vec![("x".to_string(), Fragment::text("1"))]
                        }
                    ),
                ]
            }
        );
    }

    #[test]
    fn arrays_keep_order() {
        let v = json!(["a", "https://x/b.gif", ["c"]]);
        assert_eq!(
            render_value(&v),
            Fragment::List {
                items: vec![
                    Fragment::text("a"),
                    image("https://x/b.gif"),
                    Fragment::List {
                        items: vec![Fragment::text("c")]
                    },
                ]
            }
        );
    }

    #[test]
    fn rendering_is_repeatable() {
        let v = json!({"a": ["x", {"b": "https://x/y.png"}], "c": null});
        assert_eq!(render_value(&v), render_value(&v));
    }
}
