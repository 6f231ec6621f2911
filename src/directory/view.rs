use serde::Serialize;

use crate::identity;
use crate::loader::Roster;
use crate::render::{self, Fragment};
use crate::sections::{self, FieldCategory, SectionKind};

use super::{filtered_indices, next_in, previous_in, Phase, Route, ViewState};

pub const NO_DATA_MESSAGE: &str = "No student data found.";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Loading,
    Error { message: String },
    Empty { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToggleView {
    pub category: FieldCategory,
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingEntry {
    pub index: usize,
    pub name: String,
    pub key: String,
    pub path: String,
    pub photo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionView {
    pub kind: SectionKind,
    pub title: String,
    pub field: String,
    pub fragment: Fragment,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StudentCard {
    pub index: usize,
    /// 1-based rank within the filtered set; `None` when the search
    /// excludes this record.
    pub position: Option<usize>,
    /// Size of the filtered set.
    pub total: usize,
    pub name: String,
    pub key: String,
    pub path: String,
    pub email: Option<String>,
    pub photo: Option<String>,
    /// Shown in place of a missing photo.
    pub initial: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub sections: Vec<SectionView>,
}

impl StudentCard {
    pub fn position_label(&self) -> String {
        match self.position {
            Some(rank) => format!("{rank} of {}", self.total),
            None => format!("outside search, {} match(es)", self.total),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Body {
    Nothing,
    Blob { json: String },
    Listing { entries: Vec<ListingEntry> },
    Viewing { card: Box<StudentCard> },
}

/// Everything a renderer needs to draw the directory page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectoryView {
    pub route: String,
    pub search_text: String,
    pub matches: usize,
    pub total: usize,
    pub toggles: Vec<ToggleView>,
    pub status: Option<Status>,
    pub body: Body,
}

fn initial_of(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn status_of(state: &ViewState) -> Option<Status> {
    if state.loading {
        return Some(Status::Loading);
    }
    if let Some(message) = state.error.as_ref() {
        return Some(Status::Error {
            message: message.clone(),
        });
    }
    let empty = state.students.as_deref().map_or(true, Roster::is_empty);
    empty.then(|| Status::Empty {
        message: NO_DATA_MESSAGE.to_string(),
    })
}

fn listing(state: &ViewState, filtered: &[usize]) -> Vec<ListingEntry> {
    let records = state.records();
    filtered
        .iter()
        .filter_map(|&i| {
            let entry = records.get(i)?;
            let id = identity::resolve_identity(identity::unwrap_entry(entry), i);
            Some(ListingEntry {
                index: i,
                path: Route::detail(id.stable_key.clone()).path(),
                name: id.name,
                key: id.stable_key,
                photo: id.photo_url,
            })
        })
        .collect()
}

/// Card for the record at `index`, with sections laid out under the current
/// toggles and prev/next availability within `filtered`.
pub fn build_card(state: &ViewState, index: usize, filtered: &[usize]) -> Option<StudentCard> {
    let records = state.records();
    let record = identity::unwrap_entry(records.get(index)?);
    let id = identity::resolve_identity(record, index);
    let sections = sections::build_sections(record, &state.toggles)
        .into_iter()
        .map(|s| SectionView {
            kind: s.kind,
            title: s.title().to_string(),
            field: s.field.to_string(),
            fragment: render::render_value(s.value),
        })
        .collect();

    Some(StudentCard {
        index,
        position: filtered.iter().position(|&i| i == index).map(|rank| rank + 1),
        total: filtered.len(),
        initial: initial_of(&id.name),
        path: Route::detail(id.stable_key.clone()).path(),
        name: id.name,
        key: id.stable_key,
        email: id.email,
        photo: id.photo_url,
        has_prev: previous_in(filtered, index).is_some(),
        has_next: next_in(filtered, index).is_some(),
        sections,
    })
}

pub fn build_view(state: &ViewState) -> DirectoryView {
    let filtered = filtered_indices(state);
    let body = match (state.students.as_deref(), state.phase()) {
        (Some(Roster::Blob(value)), _) => Body::Blob {
            json: serde_json::to_string_pretty(value).unwrap_or_default(),
        },
        (_, Phase::Viewing(i)) => match build_card(state, i, &filtered) {
            Some(card) => Body::Viewing {
                card: Box::new(card),
            },
            None => Body::Nothing,
        },
        (_, Phase::Listing) => Body::Listing {
            entries: listing(state, &filtered),
        },
        (_, Phase::Idle) => Body::Nothing,
    };

    DirectoryView {
        route: state.route.path(),
        search_text: state.search_text.clone(),
        matches: filtered.len(),
        total: state.records().len(),
        toggles: state
            .toggles
            .iter()
            .map(|(category, enabled)| ToggleView {
                category,
                label: category.label(),
                enabled,
            })
            .collect(),
        status: status_of(state),
        body,
    }
}
