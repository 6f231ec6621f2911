use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::AsyncWriteExt;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::directory::view::build_view;
use crate::directory::{self, Action, ListMode, Route, ViewState};
use crate::loader::{self, LoadOutcome, Loader, LoaderOptions, PayloadSource, Session};
use crate::output::{self, OutputFormat};
use crate::sections::CategoryToggles;

fn log_line(tag: ColoredString, message: &str) {
    eprintln!("{}{}{} {}", "[".bold().white(), tag, "]".bold().white(), message);
}

fn info(message: &str) {
    log_line("INF".bold().blue(), message);
}

fn warn(message: &str) {
    log_line("WRN".bold().yellow(), message);
}

fn debug(verbose: u8, message: &str) {
    if verbose > 0 {
        log_line("DBG".bold().magenta(), message);
    }
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!("{} {}\n", cmd.get_name(), cmd.get_version().unwrap_or_default());
    if let Some(long_about) = cmd.get_long_about() {
        out.push_str(&format!("\n{long_about}\n"));
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n", cmd.get_name()));

    let heading_of = |arg: &clap::Arg| arg.get_help_heading().unwrap_or("Options").to_string();
    let mut headings: Vec<String> = Vec::new();
    for arg in cmd.get_arguments() {
        let heading = heading_of(arg);
        if !headings.contains(&heading) {
            headings.push(heading);
        }
    }

    for heading in headings {
        out.push_str(&format!("\n{heading}:\n"));
        for arg in cmd.get_arguments().filter(|a| heading_of(*a) == heading) {
            let mut flags: Vec<String> = arg.get_short().map(|s| format!("-{s}")).into_iter().collect();
            flags.extend(arg.get_long().map(|l| format!("--{l}")));
            flags.extend(
                arg.get_visible_aliases()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| format!("--{a}")),
            );
            let value = match arg.get_value_names().and_then(|names| names.first()) {
                Some(name) if arg.get_action().takes_values() => format!(" <{name}>"),
                _ => String::new(),
            };
            out.push_str(&format!("  {}{value}\n", flags.join(", ")));
            if let Some(help) = arg.get_help() {
                out.push_str(&format!("          {help}\n"));
            }
        }
    }
    out
}

fn toggle_summary(toggles: &CategoryToggles) -> String {
    let hidden: Vec<String> = toggles
        .iter()
        .filter(|(_, enabled)| !enabled)
        .map(|(category, _)| category.to_string())
        .collect();
    if hidden.is_empty() {
        "all".to_string()
    } else {
        format!("hiding {}", hidden.join(", "))
    }
}

fn format_label(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: PayloadSource,
    timeout: Option<u64>,
    proxy: Option<String>,
    no_proxy: bool,
    route: Route,
    search: String,
    toggles: CategoryToggles,
    list_mode: ListMode,
    next: u8,
    prev: u8,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

impl RunConfig {
    fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            source: self.source.clone(),
            timeout_seconds: self.timeout,
            proxy: self.proxy.clone(),
            no_proxy: self.no_proxy,
        }
    }

    fn source_label(&self) -> String {
        match &self.source {
            PayloadSource::Endpoint(url) => url.clone(),
            PayloadSource::File(path) => path.display().to_string(),
        }
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let source = match args.input_file.or(cfg.input_file) {
        Some(path) => PayloadSource::File(config::expand_tilde(path.trim())),
        None => {
            let endpoint = args
                .endpoint
                .or(cfg.endpoint)
                .unwrap_or_else(|| loader::DEFAULT_ENDPOINT.to_string());
            let endpoint = endpoint.trim().to_string();
            reqwest::Url::parse(&endpoint)
                .map_err(|e| format!("invalid endpoint '{endpoint}': {e}"))?;
            PayloadSource::Endpoint(endpoint)
        }
    };

    let timeout = args.timeout.or(cfg.timeout).filter(|t| *t > 0);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let no_proxy = args.no_proxy || cfg.no_proxy.unwrap_or(false);

    let route = match (args.route, args.id) {
        (Some(raw), _) => Route::parse(&raw).map_err(|e| format!("invalid --route: {e}"))?,
        (None, Some(id)) => Route::detail(id.trim()),
        (None, None) => Route::List,
    };

    let toggles = if !args.only.is_empty() {
        CategoryToggles::only(&validation::parse_categories(&args.only)?)
    } else {
        let hidden = if args.hide.is_empty() {
            let from_cfg = cfg.hidden_categories.unwrap_or_default();
            validation::parse_categories(&from_cfg)
                .map_err(|e| format!("invalid hidden_categories in config: {e}"))?
        } else {
            validation::parse_categories(&args.hide)?
        };
        let mut toggles = CategoryToggles::default();
        for category in hidden {
            toggles.set(category, false);
        }
        toggles
    };

    let list_mode = if args.list {
        ListMode::Explicit
    } else {
        match cfg.list_mode.as_deref() {
            Some(raw) => ListMode::parse(raw).ok_or_else(|| {
                format!("invalid list_mode '{raw}' in config, expected auto_open or explicit")
            })?,
            None => ListMode::default(),
        }
    };

    let output = args
        .output
        .or(cfg.output)
        .filter(|o| !o.trim().is_empty())
        .map(|o| config::expand_tilde_string(o.trim()));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw).ok_or_else(|| {
            format!("invalid output format '{raw}', expected text, json or html")
        })?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        source,
        timeout,
        proxy,
        no_proxy,
        route,
        search: args.search.unwrap_or_default(),
        toggles,
        list_mode,
        next: args.next,
        prev: args.prev,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn print_settings(run: &RunConfig) {
    format_kv_line("Source", &run.source_label());
    format_kv_line("Route", &run.route.to_string());
    if !run.search.is_empty() {
        format_kv_line("Search", &run.search);
    }
    format_kv_line("Fields", &toggle_summary(&run.toggles));
    format_kv_line(
        "Output",
        &format!(
            "{} ({})",
            run.output.as_deref().unwrap_or("stdout"),
            format_label(run.output_format)
        ),
    );
    if let Some(t) = run.timeout {
        format_kv_line("Timeout", &format!("{t}s"));
    }
    if let Some(p) = run.proxy.as_deref() {
        format_kv_line("Proxy", p);
    }
    eprintln!();
}

fn spinner(message: String) -> Result<ProgressBar, String> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?,
    );
    pb.set_message(message);
    Ok(pb)
}

/// Applies `action` and follows any navigation it requests.
fn step(state: ViewState, action: Action, verbose: u8) -> ViewState {
    let transition = state.apply(action);
    let mut next = transition.state;
    if let Some(route) = transition.navigate {
        debug(verbose, &format!("navigate {route}"));
        next.route = route;
    }
    next
}

async fn write_output(run: &RunConfig, bytes: &[u8]) -> Result<(), String> {
    match run.output.as_deref() {
        Some(path) if path != "-" => {
            tokio::fs::write(path, bytes)
                .await
                .map_err(|e| format!("failed to write output '{path}': {e}"))?;
            info(&format!("Wrote {} view to {path}", format_label(run.output_format)));
        }
        _ => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(bytes)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }
    Ok(())
}

/// Fresh view for `activation`, with the configured categories applied on
/// top of the all-enabled defaults.
fn activate_view(run: &RunConfig, activation: u64) -> ViewState {
    let mut state = step(
        ViewState::new(run.list_mode),
        Action::Activate {
            activation,
            route: run.route.clone(),
        },
        run.verbose,
    );
    for (category, enabled) in run.toggles.iter() {
        state = step(state, Action::SetCategory(category, enabled), run.verbose);
    }
    state
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_settings(&run);

    let loader = Loader::new(run.loader_options()).map_err(|e| e.to_string())?;
    let session = Session::new();
    let activation = session.activate();
    debug(run.verbose, &format!("activation {}", activation.id()));

    let mut state = activate_view(&run, activation.id());
    state = step(state, Action::LoadStarted, run.verbose);

    let pb = spinner(format!("Loading {}", run.source_label()))?;
    let outcome = loader.load(&activation).await;
    pb.finish_and_clear();

    let result = match outcome {
        LoadOutcome::Applied(Ok(roster)) => {
            info(&format!("Loaded {} student(s)", roster.len()));
            debug(run.verbose, &format!("payload shape: {}", roster.shape()));
            Ok(roster)
        }
        LoadOutcome::Applied(Err(e)) => {
            warn(&format!("Error loading data: {e}"));
            Err(e.to_string())
        }
        LoadOutcome::Discarded => {
            warn("Load finished after the view was closed, result dropped");
            return Ok(());
        }
    };

    if let (Ok(roster), Some(id)) = (result.as_ref(), run.route.id()) {
        match directory::resolve_route_id(roster.records(), id) {
            Some(index) => debug(run.verbose, &format!("'{id}' resolved to record {index}")),
            None if !roster.records().is_empty() => {
                warn(&format!("No student matches '{id}', opening the first one"))
            }
            None => {}
        }
    }

    state = step(
        state,
        Action::Loaded {
            activation: activation.id(),
            result,
        },
        run.verbose,
    );
    if !run.search.is_empty() {
        state = step(state, Action::Search(run.search.clone()), run.verbose);
        debug(
            run.verbose,
            &format!("{} match(es)", directory::filtered_indices(&state).len()),
        );
    }
    for _ in 0..run.prev {
        state = step(state, Action::Prev, run.verbose);
    }
    for _ in 0..run.next {
        state = step(state, Action::Next, run.verbose);
    }

    let view = build_view(&state);
    session.deactivate();

    let bytes = output::render(&view, run.output_format);
    write_output(&run, &bytes).await
}

fn config_path(args: &CliArgs) -> Option<PathBuf> {
    match args.config.as_deref() {
        Some(p) => Some(config::expand_tilde(p)),
        None => config::default_config_path(),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = config_path(&args).ok_or("could not determine home directory")?;
        config::ensure_default_config_file(&path)?;
        info(&format!("Config file at {}", path.display()));
        return Ok(());
    }

    let cfg = match (args.config.is_some(), config_path(&args)) {
        (explicit, Some(path)) => config::load_config(&path, !explicit)?,
        (_, None) => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
