use serde_json::{json, Value};

use crate::directory::view::{build_view, Body};
use crate::directory::{filtered_indices, resolve_route_id, Action, ListMode, Phase, Route, ViewState};
use crate::identity::{key_for, resolve_identity, NameSource};
use crate::loader::{Loader, LoaderOptions, PayloadSource, Roster, Session};
use crate::render::{render_value, Fragment};
use crate::sections::{build_sections, CategoryToggles, FieldCategory, SectionKind};

fn class_roster() -> Vec<Value> {
    vec![
        json!({"name": "Ana Lee", "email": "alee3@x.edu", "quote": "Carpe diem"}),
        json!({"student": {"name": {"preferred": "Bo Chen"}, "mascot": "Otter"}}),
        json!({"fields": {"name": {"first": "Cy", "last": "Diaz"}, "links": ["https://cy.dev"]}}),
        json!({"username": "dpatel", "major": "Computer Science"}),
        json!({"photo": "https://x/p.png"}),
    ]
}

fn loaded(records: Vec<Value>, route: Route, mode: ListMode) -> ViewState {
    ViewState::new(mode)
        .apply(Action::Activate {
            activation: 7,
            route,
        })
        .state
        .apply(Action::LoadStarted)
        .state
        .apply(Action::Loaded {
            activation: 7,
            result: Ok(Roster::Records(records)),
        })
        .state
}

#[test]
fn identity_is_total_and_keys_are_url_safe() {
    let odd = [
        json!(null),
        json!(42),
        json!("just text"),
        json!([]),
        json!({"email": "Weird.Name+tag@X.edu"}),
        json!({"name": "  "}),
    ];
    for (i, record) in class_roster().iter().chain(odd.iter()).enumerate() {
        let key = key_for(record, i);
        let positional = key == format!("s-{i}");
        let slug = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        assert!(positional || slug, "unexpected key {key:?}");
        assert_eq!(key_for(record, i), key);
    }
}

#[test]
fn selecting_any_filtered_record_round_trips_through_route() {
    let state = loaded(class_roster(), Route::List, ListMode::Explicit);
    for index in filtered_indices(&state) {
        let t = state.apply(Action::Select(index));
        let route = t.navigate.expect("select navigates");
        let reparsed = Route::parse(&route.path()).unwrap();
        let id = reparsed.id().unwrap();
        assert_eq!(resolve_route_id(state.records(), id), Some(index));

        let reopened = loaded(class_roster(), reparsed, ListMode::Explicit);
        assert_eq!(reopened.phase(), Phase::Viewing(index));
    }
}

fn round_trip(records: Vec<Value>, index: usize) -> (Route, Phase) {
    let state = loaded(records.clone(), Route::List, ListMode::Explicit);
    let route = state
        .apply(Action::Select(index))
        .navigate
        .expect("select navigates");
    let reparsed = Route::parse(&route.path()).unwrap();
    let reopened = loaded(records, reparsed.clone(), ListMode::Explicit);
    (reparsed, reopened.phase())
}

#[test]
fn numeric_ids_round_trip_to_their_own_record() {
    let records = vec![
        json!({"name": "Ana", "id": 17}),
        json!({"name": "Bo", "id": 42}),
        json!({"name": "Cy", "id": 8}),
        json!({"name": "Di", "id": 9}),
        json!({"name": "Ed", "id": 3}),
    ];
    for index in 0..records.len() {
        let (route, phase) = round_trip(records.clone(), index);
        assert_eq!(phase, Phase::Viewing(index), "route {route}");
    }
    let (route, _) = round_trip(records, 4);
    assert_eq!(route, Route::detail("3"));
}

#[test]
fn duplicate_names_resolve_to_first_record() {
    let records = vec![
        json!({"name": "Ana Lee"}),
        json!({"name": "Ana Lee"}),
        json!({"name": "Bo"}),
    ];
    assert_eq!(key_for(&records[0], 0), key_for(&records[1], 1));
    let (route, phase) = round_trip(records.clone(), 1);
    assert_eq!(route, Route::detail("ana-lee"));
    assert_eq!(phase, Phase::Viewing(0));
    assert_eq!(round_trip(records, 2).1, Phase::Viewing(2));
}

#[test]
fn rendering_is_repeatable() {
    for record in class_roster() {
        assert_eq!(render_value(&record), render_value(&record));
    }
}

#[test]
fn only_name_toggle_leaves_name_sections() {
    let toggles = CategoryToggles::only(&[FieldCategory::Name]);
    for record in class_roster() {
        let record = crate::identity::unwrap_entry(&record);
        for section in build_sections(record, &toggles) {
            assert_eq!(section.kind, SectionKind::Category(FieldCategory::Name));
        }
    }
}

#[test]
fn single_search_match_has_nowhere_to_go() {
    let state = loaded(class_roster(), Route::List, ListMode::AutoOpen)
        .apply(Action::Search("diaz".to_string()))
        .state;
    assert_eq!(filtered_indices(&state), vec![2]);
    let state = state.apply(Action::Select(2)).state;
    for action in [Action::Prev, Action::Next] {
        let t = state.apply(action);
        assert_eq!(t.state.selected_index, Some(2));
        assert!(t.navigate.is_none());
    }
}

#[test]
fn structured_name_with_email_and_quote() {
    let record = json!({
        "name": {"first": "Ana", "last": "Lee"},
        "email": "alee3@x.edu",
        "quote": "Carpe diem"
    });
    let id = resolve_identity(&record, 2);
    assert_eq!(id.name, "Ana Lee");
    assert_eq!(id.stable_key, "alee3");

    let sections = build_sections(&record, &CategoryToggles::default());
    let quote = sections
        .iter()
        .find(|s| s.kind == SectionKind::Category(FieldCategory::Quote))
        .expect("quote section");
    assert_eq!(quote.title(), "Quote");
    assert_eq!(render_value(quote.value), Fragment::text("Carpe diem"));
}

#[test]
fn photo_only_record_gets_placeholder_name() {
    let record = json!({"photo": "https://x/p.png"});
    let id = resolve_identity(&record, 0);
    assert_eq!(id.name, "Student 1");
    assert_eq!(id.name_source, NameSource::Positional);
    assert_eq!(id.stable_key, "s-0");

    let sections = build_sections(&record, &CategoryToggles::default());
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].kind, SectionKind::Category(FieldCategory::Image));
    assert_eq!(
        render_value(sections[0].value),
        Fragment::Image {
            src: "https://x/p.png".to_string()
        }
    );
}

#[test]
fn wrapped_record_card_shows_inner_fields() {
    let state = loaded(class_roster(), Route::detail("1"), ListMode::AutoOpen);
    let view = build_view(&state);
    let card = match view.body {
        Body::Viewing { card } => card,
        other => panic!("expected a card, got {other:?}"),
    };
    assert_eq!(card.name, "Bo Chen");
    assert_eq!(card.position, Some(2));
    assert_eq!(card.total, 5);
    assert!(card.sections.iter().any(|s| s.title == "Mascot"));
}

#[tokio::test]
async fn load_from_file_and_open_by_key() {
    let path = std::env::temp_dir().join(format!("intros-roster-{}.json", std::process::id()));
    let payload = json!({"students": class_roster()});
    tokio::fs::write(&path, serde_json::to_vec(&payload).unwrap())
        .await
        .unwrap();

    let loader = Loader::new(LoaderOptions {
        source: PayloadSource::File(path.clone()),
        no_proxy: true,
        ..LoaderOptions::default()
    })
    .unwrap();
    let session = Session::new();
    let activation = session.activate();
    let roster = loader.fetch().await.unwrap();
    let _ = tokio::fs::remove_file(&path).await;

    let state = ViewState::new(ListMode::AutoOpen)
        .apply(Action::Activate {
            activation: activation.id(),
            route: Route::detail("dpatel"),
        })
        .state
        .apply(Action::Loaded {
            activation: activation.id(),
            result: Ok(roster),
        })
        .state;
    assert_eq!(state.phase(), Phase::Viewing(3));
}

#[tokio::test]
async fn reactivation_discards_earlier_load() {
    let path = std::env::temp_dir().join(format!("intros-stale-{}.json", std::process::id()));
    tokio::fs::write(&path, b"[{\"name\": \"Ana\"}]").await.unwrap();
    let loader = Loader::new(LoaderOptions {
        source: PayloadSource::File(path.clone()),
        no_proxy: true,
        ..LoaderOptions::default()
    })
    .unwrap();

    let session = Session::new();
    let first = session.activate();
    let _second = session.activate();
    let outcome = loader.load(&first).await;
    let _ = tokio::fs::remove_file(&path).await;
    assert!(matches!(outcome, crate::loader::LoadOutcome::Discarded));
}
