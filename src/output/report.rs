use crate::directory::view::{Body, DirectoryView, ListingEntry, Status, StudentCard};
use crate::render::Fragment;
use crate::sections::SectionKind;

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

/// Only http(s), data URIs and site-relative references are emitted as
/// attributes.
fn safe_href(value: &str) -> Option<String> {
    let lower = value.trim().to_ascii_lowercase();
    let ok = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:image/")
        || lower.starts_with('/')
        || !lower.contains(':');
    ok.then(|| escape_html(value.trim()))
}

pub fn render_fragment(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Empty => String::new(),
        Fragment::Text { text } => format!(r#"<span class="card-text">{}</span>"#, escape_html(text)),
        Fragment::Link { href } => match safe_href(href) {
            Some(safe) => format!(
                r#"<a class="text-primary underline break-all" href="{safe}" target="_blank" rel="noopener noreferrer">{safe}</a>"#
            ),
            None => format!(r#"<span class="card-text">{}</span>"#, escape_html(href)),
        },
        Fragment::Image { src } => match safe_href(src) {
            Some(safe) => format!(
                r#"<img src="{safe}" alt="student media" class="student-image max-w-xs rounded-lg my-2"/>"#
            ),
            None => format!(r#"<span class="card-text">{}</span>"#, escape_html(src)),
        },
        Fragment::List { items } => {
            let inner: String = items
                .iter()
                .map(|i| format!("<li>{}</li>", render_fragment(i)))
                .collect();
            format!(r#"<ul class="list-disc ml-6">{inner}</ul>"#)
        }
        Fragment::Pairs { entries } => {
            let inner: String = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        r#"<li><strong class="capitalize">{}:</strong> {}</li>"#,
                        escape_html(k),
                        render_fragment(v)
                    )
                })
                .collect();
            format!(r#"<ul class="ml-4">{inner}</ul>"#)
        }
    }
}

fn render_card(card: &StudentCard) -> String {
    let avatar = match card.photo.as_deref().and_then(safe_href) {
        Some(src) => format!(
            r#"<img src="{src}" alt="{}" class="w-24 h-24 object-cover rounded-lg"/>"#,
            escape_html(&card.name)
        ),
        None => format!(
            r#"<div class="w-24 h-24 bg-slate-200 rounded-lg flex items-center justify-center"><strong>{}</strong></div>"#,
            escape_html(&card.initial)
        ),
    };
    let email = card
        .email
        .as_deref()
        .map(|e| format!(r#"<div class="text-slate-500">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    let mut sections = String::new();
    for s in card.sections.iter() {
        let label = match s.kind {
            SectionKind::Category(_) => format!(
                r#"{} <span class="text-slate-400 text-xs">{}</span>"#,
                escape_html(&s.title),
                escape_html(&s.field)
            ),
            SectionKind::Other => escape_html(&s.title),
        };
        sections.push_str(&format!(
            r#"<div class="mb-3"><h4 class="font-bold">{label}</h4>{}</div>"#,
            render_fragment(&s.fragment)
        ));
    }

    let nav_state = |enabled: bool, label: &str| {
        let tone = if enabled { "text-slate-900" } else { "text-slate-400" };
        format!(r#"<span class="px-3 py-1 rounded-lg bg-slate-100 {tone}">{label}</span>"#)
    };

    format!(
        r#"<div class="col-span-full">
  <div class="flex justify-between items-center mb-2">
    <div class="flex gap-2"><a href="/intros" class="px-3 py-1 rounded-lg bg-slate-100">Back to list</a>{prev}{next}</div>
    <div class="text-sm text-slate-600">{position}</div>
  </div>
  <article class="card bg-white rounded-2xl border border-slate-200 p-5 break-words" data-key="{key}">
    <header class="flex gap-3 items-center">{avatar}<div><h3 class="text-xl m-0">{name}</h3>{email}</div></header>
    <div class="mt-3 text-sm">{sections}</div>
  </article>
</div>"#,
        prev = nav_state(card.has_prev, "Prev"),
        next = nav_state(card.has_next, "Next"),
        position = escape_html(&card.position_label()),
        key = escape_html(&card.key),
        name = escape_html(&card.name),
    )
}

fn render_listing(entries: &[ListingEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let photo = e
                .photo
                .as_deref()
                .and_then(safe_href)
                .map(|src| {
                    format!(
                        r#"<img src="{src}" alt="{}" class="w-16 h-16 object-cover rounded-lg"/>"#,
                        escape_html(&e.name)
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<article class="card bg-white rounded-2xl border border-slate-200 p-5">
  <div class="flex gap-3 items-center">{photo}<h3 class="mt-0">{name}</h3></div>
  <div class="mt-2"><a class="px-3 py-1 rounded-lg bg-slate-100" href="{path}">Open</a></div>
</article>"#,
                name = escape_html(&e.name),
                path = escape_html(&e.path),
            )
        })
        .collect()
}

fn search_summary(search_text: &str) -> String {
    if search_text.is_empty() {
        r#"<span class="text-sm text-slate-500">All students</span>"#.to_string()
    } else {
        format!(
            r#"<span class="text-sm">Search: <strong>{}</strong></span>"#,
            escape_html(search_text)
        )
    }
}

pub fn render_html(view: &DirectoryView) -> Vec<u8> {
    let json = serde_json::to_string(view).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);

    let status = match view.status.as_ref() {
        Some(Status::Loading) => "<p>Loading student data…</p>".to_string(),
        Some(Status::Error { message }) => format!(
            r#"<p class="text-red-700">Error loading data: {}</p>"#,
            escape_html(message)
        ),
        Some(Status::Empty { message }) => format!("<p>{}</p>", escape_html(message)),
        None => String::new(),
    };

    let toggles: String = view
        .toggles
        .iter()
        .map(|t| {
            format!(
                r#"<span class="text-xs font-bold {}" data-category="{}">{}</span>"#,
                if t.enabled { "text-primary" } else { "text-slate-400 line-through" },
                serde_json::to_string(&t.category)
                    .unwrap_or_default()
                    .trim_matches('"'),
                escape_html(t.label)
            )
        })
        .collect();

    let body = match &view.body {
        Body::Nothing => String::new(),
        Body::Blob { json } => format!(
            r#"<pre class="col-span-full bg-white p-3">{}</pre>"#,
            escape_html(json)
        ),
        Body::Listing { entries } => render_listing(entries),
        Body::Viewing { card } => render_card(card),
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Student Introductions</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms,container-queries"></script>
  <script id="tailwind-config">
    tailwind.config = {{
      theme: {{
        extend: {{
          colors: {{
            "primary": "#135bec",
            "background-light": "#f8fafc"
          }}
        }}
      }}
    }};
  </script>
</head>
<body class="bg-background-light text-slate-900 min-h-screen">
  <script type="application/json" id="directory-data">{json}</script>
  <main class="max-w-[1440px] mx-auto w-full px-8 py-10">
    <h2 class="text-3xl mb-4">Student Introductions</h2>
    <section class="bg-white rounded-2xl border border-slate-200 p-5 mb-6 flex flex-wrap gap-4 items-center">
      {search}
      <div class="flex flex-wrap gap-3">{toggles}</div>
      <span class="text-xs text-slate-500">{matches} of {total}</span>
    </section>
    {status}
    <div class="grid gap-4" style="grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));">
      {body}
    </div>
  </main>
</body>
</html>
"####,
        search = search_summary(&view.search_text),
        matches = view.matches,
        total = view.total,
    );
    html.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::view::build_view;
    use crate::directory::{Action, ListMode, Route, ViewState};
    use crate::loader::Roster;
    use serde_json::json;

    fn page(roster: Roster, route: Route) -> String {
        let state = ViewState::new(ListMode::AutoOpen)
            .apply(Action::Activate {
                activation: 1,
                route,
            })
            .state
            .apply(Action::Loaded {
                activation: 1,
                result: Ok(roster),
            })
            .state;
        String::from_utf8(render_html(&build_view(&state))).unwrap()
    }

    #[test]
    fn card_page_escapes_content() {
        let html = page(
            Roster::Records(vec![json!({"name": "<b>Ana</b>", "quote": "a & b"})]),
            Route::List,
        );
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<b>Ana</b>"));
    }

    #[test]
    fn script_payload_cannot_close_tag() {
        let html = page(
            Roster::Records(vec![json!({"name": "</script><script>x()"})]),
            Route::List,
        );
        assert!(!html.contains("</script><script>x()"));
    }

    #[test]
    fn page_state_is_read_only() {
        let html = page(
            Roster::Records(vec![json!({"name": "Ana"}), json!({"name": "Bo"})]),
            Route::detail("bo"),
        );
        assert!(!html.contains("<form"));
        assert!(!html.contains("<input"));
        assert!(!html.contains("<button"));
        assert!(html.contains("2 of 2"));
        assert!(html.contains(r#"data-category="quote""#));
    }

    #[test]
    fn unsafe_links_are_not_attributes() {
        assert_eq!(
            render_fragment(&Fragment::Link {
                href: "javascript:alert(1)".to_string()
            }),
            r#"<span class="card-text">javascript:alert(1)</span>"#
        );
    }

    #[test]
    fn images_render_img_tags() {
        let html = render_fragment(&Fragment::Image {
            src: "https://x/p.png".to_string(),
        });
        assert!(html.starts_with(r#"<img src="https://x/p.png""#));
    }
}
