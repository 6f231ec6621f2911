use crate::cli::args::CliArgs;
use crate::directory::Route;
use crate::output::OutputFormat;
use crate::sections::FieldCategory;

pub fn parse_categories(values: &[String]) -> Result<Vec<FieldCategory>, String> {
    let mut out = Vec::new();
    for raw in values.iter().flat_map(|v| v.split(',')) {
        let item = raw.trim();
        if item.is_empty() {
            continue;
        }
        let category =
            FieldCategory::parse(item).ok_or_else(|| format!("unknown category '{item}'"))?;
        if !out.contains(&category) {
            out.push(category);
        }
    }
    Ok(out)
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    parse_categories(&args.hide).map_err(|e| format!("invalid --hide: {e}"))?;
    parse_categories(&args.only).map_err(|e| format!("invalid --only: {e}"))?;
    if let Some(raw) = args.output_format.as_deref() {
        OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text, json or html"))?;
    }
    if let Some(raw) = args.route.as_deref() {
        Route::parse(raw).map_err(|e| format!("invalid --route: {e}"))?;
    }
    if let Some(id) = args.id.as_deref() {
        if id.trim().is_empty() {
            return Err("invalid --id, expected a non-empty identifier".to_string());
        }
    }
    if let Some(endpoint) = args.endpoint.as_deref() {
        reqwest::Url::parse(endpoint.trim())
            .map_err(|e| format!("invalid --endpoint '{endpoint}': {e}"))?;
    }
    if args.timeout == Some(0) {
        return Err("invalid --timeout, expected positive integer".to_string());
    }
    Ok(())
}
