use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Name,
    Mascot,
    Image,
    PersonalStatement,
    Backgrounds,
    Classes,
    ExtraInformation,
    ComputerFunFact,
    Quote,
    Links,
}

/// Order in which categories are laid out on a card. Classification also
/// walks this order, so the first listed category that matches owns a field.
pub const DISPLAY_ORDER: [FieldCategory; 10] = [
    FieldCategory::Image,
    FieldCategory::Name,
    FieldCategory::PersonalStatement,
    FieldCategory::Backgrounds,
    FieldCategory::Classes,
    FieldCategory::ComputerFunFact,
    FieldCategory::Quote,
    FieldCategory::Links,
    FieldCategory::Mascot,
    FieldCategory::ExtraInformation,
];

/// Field-name keywords per category, matched as lowercase substrings.
pub const CATEGORY_KEYWORDS: &[(FieldCategory, &[&str])] = &[
    (
        FieldCategory::Image,
        &[
            "photo",
            "image",
            "avatar",
            "picture",
            "img",
            "thumbnail",
            "headshot",
            "figure",
        ],
    ),
    (
        FieldCategory::Name,
        &["name", "preferred", "first", "last", "middle"],
    ),
    (
        FieldCategory::PersonalStatement,
        &["statement", "bio", "about", "introduction", "intro", "summary"],
    ),
    (FieldCategory::Backgrounds, &["background", "hometown", "major"]),
    (
        FieldCategory::Classes,
        &["course", "class", "schedule", "semester"],
    ),
    (
        FieldCategory::ComputerFunFact,
        &["computer", "fun", "fact", "interesting"],
    ),
    (FieldCategory::Quote, &["quote", "saying", "motto"]),
    (
        FieldCategory::Links,
        &[
            "link", "url", "website", "site", "github", "linkedin", "portfolio", "social",
        ],
    ),
    (
        FieldCategory::Mascot,
        &["mascot", "animal", "adjective", "divider"],
    ),
    (
        FieldCategory::ExtraInformation,
        &["extra", "additional", "hobby", "hobbies", "note", "misc"],
    ),
];

impl FieldCategory {
    pub fn label(self) -> &'static str {
        match self {
            FieldCategory::Name => "Name",
            FieldCategory::Mascot => "Mascot",
            FieldCategory::Image => "Image",
            FieldCategory::PersonalStatement => "Personal Statement",
            FieldCategory::Backgrounds => "Backgrounds",
            FieldCategory::Classes => "Classes",
            FieldCategory::ExtraInformation => "Extra Information",
            FieldCategory::ComputerFunFact => "Computer/Fun Fact",
            FieldCategory::Quote => "Quote",
            FieldCategory::Links => "Links",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        CATEGORY_KEYWORDS
            .iter()
            .find(|(c, _)| *c == self)
            .map(|(_, k)| *k)
            .unwrap_or(&[])
    }

    /// Accepts labels, snake_case names and compact forms, e.g.
    /// `"Computer/Fun Fact"`, `"computer_fun_fact"`, `"funfact"`.
    pub fn parse(value: &str) -> Option<Self> {
        let compact: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "name" | "names" => Some(Self::Name),
            "mascot" => Some(Self::Mascot),
            "image" | "images" | "photo" => Some(Self::Image),
            "personalstatement" | "statement" => Some(Self::PersonalStatement),
            "backgrounds" | "background" => Some(Self::Backgrounds),
            "classes" | "courses" => Some(Self::Classes),
            "extrainformation" | "extra" | "extrainfo" | "others" => {
                Some(Self::ExtraInformation)
            }
            "computerfunfact" | "funfact" | "computer" => Some(Self::ComputerFunFact),
            "quote" | "quotes" => Some(Self::Quote),
            "links" | "link" => Some(Self::Links),
            _ => None,
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category visibility. Every category starts enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryToggles(BTreeMap<FieldCategory, bool>);

impl Default for CategoryToggles {
    fn default() -> Self {
        Self(DISPLAY_ORDER.iter().map(|c| (*c, true)).collect())
    }
}

impl CategoryToggles {
    pub fn all_disabled() -> Self {
        Self(DISPLAY_ORDER.iter().map(|c| (*c, false)).collect())
    }

    /// Only the given categories enabled.
    pub fn only(enabled: &[FieldCategory]) -> Self {
        let mut toggles = Self::all_disabled();
        for c in enabled {
            toggles.set(*c, true);
        }
        toggles
    }

    pub fn is_enabled(&self, category: FieldCategory) -> bool {
        self.0.get(&category).copied().unwrap_or(true)
    }

    pub fn set(&mut self, category: FieldCategory, enabled: bool) {
        self.0.insert(category, enabled);
    }

    pub fn toggle(&mut self, category: FieldCategory) {
        let current = self.is_enabled(category);
        self.set(category, !current);
    }

    pub fn others_visible(&self) -> bool {
        self.is_enabled(FieldCategory::ExtraInformation)
    }

    /// Categories in display order with their state.
    pub fn iter(&self) -> impl Iterator<Item = (FieldCategory, bool)> + '_ {
        DISPLAY_ORDER.iter().map(|c| (*c, self.is_enabled(*c)))
    }
}

/// Owning category of a field name, if any.
pub fn classify_field(name: &str) -> Option<FieldCategory> {
    let lower = name.to_lowercase();
    DISPLAY_ORDER
        .iter()
        .copied()
        .find(|c| c.keywords().iter().any(|k| lower.contains(k)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "category", rename_all = "snake_case")]
pub enum SectionKind {
    Category(FieldCategory),
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub field: &'a str,
    pub value: &'a Value,
}

impl Section<'_> {
    /// Heading shown above the section: the category label, or the raw field
    /// name for uncategorized fields.
    pub fn title(&self) -> &str {
        match self.kind {
            SectionKind::Category(c) => c.label(),
            SectionKind::Other => self.field,
        }
    }
}

/// Lay out a record's fields by category.
///
/// Each field belongs to at most one category. A field whose category is
/// disabled is dropped rather than moved to the uncategorized tail, which is
/// only shown while Extra Information is enabled.
pub fn build_sections<'a>(record: &'a Value, toggles: &CategoryToggles) -> Vec<Section<'a>> {
    let Some(map) = record.as_object() else {
        return Vec::new();
    };
    let owned: Vec<(&'a str, &'a Value, Option<FieldCategory>)> = map
        .iter()
        .map(|(k, v)| (k.as_str(), v, classify_field(k)))
        .collect();

    let mut out = Vec::new();
    for category in DISPLAY_ORDER {
        if !toggles.is_enabled(category) {
            continue;
        }
        out.extend(
            owned
                .iter()
                .filter(|(_, _, owner)| *owner == Some(category))
                .map(|&(field, value, _)| Section {
                    kind: SectionKind::Category(category),
                    field,
                    value,
                }),
        );
    }
    if toggles.others_visible() {
        out.extend(
            owned
                .iter()
                .filter(|(_, _, owner)| owner.is_none())
                .map(|&(field, value, _)| Section {
                    kind: SectionKind::Other,
                    field,
                    value,
                }),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_uses_display_order() {
        assert_eq!(classify_field("profilePhoto"), Some(FieldCategory::Image));
        assert_eq!(classify_field("imageName"), Some(FieldCategory::Image));
        assert_eq!(classify_field("Full_Name"), Some(FieldCategory::Name));
        assert_eq!(
            classify_field("personalBackground"),
            Some(FieldCategory::Backgrounds)
        );
        assert_eq!(classify_field("courses"), Some(FieldCategory::Classes));
        assert_eq!(classify_field("funFact"), Some(FieldCategory::ComputerFunFact));
        assert_eq!(classify_field("favQuote"), Some(FieldCategory::Quote));
        assert_eq!(classify_field("mascotAnimal"), Some(FieldCategory::Mascot));
        assert_eq!(classify_field("links"), Some(FieldCategory::Links));
        assert_eq!(classify_field("email"), None);
    }

    #[test]
    fn sections_follow_category_order_then_others() {
        let rec = json!({
            "email": "a@b.c",
            "quote": "Carpe diem",
            "name": "Ana",
            "photo": "https://x/p.png",
            "links": ["https://github.com/ana"],
        });
        let sections = build_sections(&rec, &CategoryToggles::default());
        let fields: Vec<&str> = sections.iter().map(|s| s.field).collect();
        assert_eq!(fields, vec!["photo", "name", "quote", "links", "email"]);
        assert_eq!(sections[4].kind, SectionKind::Other);
        assert_eq!(sections[4].title(), "email");
        assert_eq!(sections[2].title(), "Quote");
    }

    #[test]
    fn only_name_keeps_name_sections() {
        let rec = json!({
            "name": {"first": "Ana"},
            "preferredName": "A",
            "photo": "p.png",
            "email": "a@b.c",
            "quote": "q",
        });
        let sections = build_sections(&rec, &CategoryToggles::only(&[FieldCategory::Name]));
        assert_eq!(sections.len(), 2);
        assert!(sections
            .iter()
            .all(|s| s.kind == SectionKind::Category(FieldCategory::Name)));
    }

    #[test]
    fn disabled_owner_does_not_fall_through() {
        let rec = json!({"photoUrl": "https://x/p.png", "pets": "two cats"});
        let mut toggles = CategoryToggles::default();
        toggles.set(FieldCategory::Image, false);
        let sections = build_sections(&rec, &toggles);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].field, "pets");
    }

    #[test]
    fn others_hidden_with_extra_information() {
        let rec = json!({"pets": "two cats", "hobbies": "chess"});
        let mut toggles = CategoryToggles::default();
        toggles.toggle(FieldCategory::ExtraInformation);
        assert!(build_sections(&rec, &toggles).is_empty());
    }

    #[test]
    fn non_object_record_has_no_sections() {
        assert!(build_sections(&json!("x"), &CategoryToggles::default()).is_empty());
    }

    #[test]
    fn parse_accepts_labels_and_short_forms() {
        assert_eq!(
            FieldCategory::parse("Computer/Fun Fact"),
            Some(FieldCategory::ComputerFunFact)
        );
        assert_eq!(
            FieldCategory::parse("personal_statement"),
            Some(FieldCategory::PersonalStatement)
        );
        assert_eq!(FieldCategory::parse("extra"), Some(FieldCategory::ExtraInformation));
        assert_eq!(FieldCategory::parse("nope"), None);
    }

    #[test]
    fn every_category_has_keywords() {
        for c in DISPLAY_ORDER {
            assert!(!c.keywords().is_empty(), "{c} has no keywords");
        }
    }
}
