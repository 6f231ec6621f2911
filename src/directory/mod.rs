pub mod route;
pub mod view;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{self, Identity};
use crate::loader::Roster;
use crate::sections::{CategoryToggles, FieldCategory};

pub use route::{Route, RouteError};

/// How the view treats "no record selected".
///
/// `AutoOpen` is the long-standing page behavior: a load without an
/// identifier opens the first record, and going back to the list only
/// changes the location while the selected record stays open. `Explicit`
/// keeps listing and viewing apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    #[default]
    AutoOpen,
    Explicit,
}

impl ListMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto_open" | "auto-open" | "auto" | "autoopen" => Some(Self::AutoOpen),
            "explicit" | "list" => Some(Self::Explicit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "index", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Listing,
    Viewing(usize),
}

/// State of one directory view, from activation until the host navigates
/// away.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub students: Option<Arc<Roster>>,
    pub loading: bool,
    pub error: Option<String>,
    pub search_text: String,
    pub toggles: CategoryToggles,
    pub selected_index: Option<usize>,
    pub route: Route,
    pub activation: Option<u64>,
    pub list_mode: ListMode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            students: None,
            loading: false,
            error: None,
            search_text: String::new(),
            toggles: CategoryToggles::default(),
            selected_index: None,
            route: Route::List,
            activation: None,
            list_mode: ListMode::default(),
        }
    }
}

#[derive(Debug)]
pub enum Action {
    Activate { activation: u64, route: Route },
    Deactivate,
    LoadStarted,
    Loaded {
        activation: u64,
        result: Result<Roster, String>,
    },
    Search(String),
    SetCategory(FieldCategory, bool),
    ToggleCategory(FieldCategory),
    Select(usize),
    Prev,
    Next,
    BackToList,
}

/// Result of a transition: the next state and, when the location changes,
/// the route the host should push.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub navigate: Option<Route>,
}

impl ViewState {
    pub fn new(list_mode: ListMode) -> Self {
        Self {
            list_mode,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[Value] {
        self.students.as_deref().map(Roster::records).unwrap_or(&[])
    }

    pub fn phase(&self) -> Phase {
        match (&self.students, self.selected_index) {
            (None, _) => Phase::Idle,
            (Some(_), Some(i)) if i < self.records().len() => Phase::Viewing(i),
            (Some(_), _) => Phase::Listing,
        }
    }

    /// Effective record and identity of the entry at `index`.
    pub fn identity_at(&self, index: usize) -> Option<Identity> {
        self.records()
            .get(index)
            .map(|entry| identity::resolve_identity(identity::unwrap_entry(entry), index))
    }

    pub fn apply(&self, action: Action) -> Transition {
        transition(self, action)
    }
}

/// Record positions whose resolved name contains the search text, ignoring
/// case. An empty query keeps every record.
pub fn filtered_indices(state: &ViewState) -> Vec<usize> {
    let query = state.search_text.to_lowercase();
    state
        .records()
        .iter()
        .enumerate()
        .filter(|(i, entry)| {
            query.is_empty()
                || identity::resolve_identity(identity::unwrap_entry(entry), *i)
                    .name
                    .to_lowercase()
                    .contains(&query)
        })
        .map(|(i, _)| i)
        .collect()
}

/// First record whose stable key equals `id`. A position is only consulted
/// when no key matches, so a key never loses to another record's position.
pub fn resolve_route_id(records: &[Value], id: &str) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .position(|(i, entry)| identity::key_for(entry, i) == id)
        .or_else(|| (0..records.len()).find(|i| i.to_string() == id))
}

fn previous_in(filtered: &[usize], current: usize) -> Option<usize> {
    filtered.iter().rev().copied().find(|i| *i < current)
}

fn next_in(filtered: &[usize], current: usize) -> Option<usize> {
    filtered.iter().copied().find(|i| *i > current)
}

fn select(state: &mut ViewState, index: usize) -> Option<Route> {
    let key = identity::key_for(state.records().get(index)?, index);
    state.selected_index = Some(index);
    Some(Route::detail(key))
}

fn index_for_route(state: &ViewState) -> Option<usize> {
    let records = state.records();
    let index = match state.route.id() {
        Some(id) => Some(resolve_route_id(records, id).unwrap_or(0)),
        None => match state.list_mode {
            ListMode::AutoOpen => Some(0),
            ListMode::Explicit => None,
        },
    };
    index.filter(|i| *i < records.len())
}

/// Pure transition function of the directory view.
pub fn transition(state: &ViewState, action: Action) -> Transition {
    let mut next = state.clone();
    let mut navigate = None;

    match action {
        Action::Activate { activation, route } => {
            next = ViewState {
                route,
                activation: Some(activation),
                ..ViewState::new(state.list_mode)
            };
        }
        Action::Deactivate => {
            next.activation = None;
            next.loading = false;
        }
        Action::LoadStarted => {
            next.loading = true;
            next.error = None;
        }
        Action::Loaded { activation, result } => {
            if state.activation != Some(activation) {
                return Transition {
                    state: next,
                    navigate: None,
                };
            }
            next.loading = false;
            match result {
                Ok(roster) => {
                    next.error = None;
                    next.students = Some(Arc::new(roster));
                    next.selected_index = index_for_route(&next);
                }
                Err(message) => {
                    next.error = Some(message);
                }
            }
        }
        Action::Search(text) => {
            next.search_text = text;
        }
        Action::SetCategory(category, enabled) => {
            next.toggles.set(category, enabled);
        }
        Action::ToggleCategory(category) => {
            next.toggles.toggle(category);
        }
        Action::Select(index) => {
            navigate = select(&mut next, index);
        }
        Action::Prev | Action::Next => {
            if let Some(current) = state.selected_index {
                let filtered = filtered_indices(state);
                let target = match action {
                    Action::Prev => previous_in(&filtered, current),
                    _ => next_in(&filtered, current),
                };
                if let Some(target) = target {
                    navigate = select(&mut next, target);
                }
            }
        }
        Action::BackToList => {
            if state.list_mode == ListMode::Explicit {
                next.selected_index = None;
            }
            navigate = Some(Route::List);
        }
    }

    Transition {
        state: next,
        navigate,
    }
}
