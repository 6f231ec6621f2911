use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "intros",
    version,
    about = "browse a class roster of student introductions",
    long_about = "Intros fetches the student introductions roster and renders one student card (or the list) with search, field-category filters and prev/next navigation.\n\nExamples:\n  intros\n  intros --id alee3 --hide quote --hide links\n  intros --search ana --next\n  intros --list -o roster.html\n  intros --input ./students.json --route /intros/3 --output-format json\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered view to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "endpoint",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Roster API endpoint."
    )]
    pub endpoint: Option<String>,

    #[arg(
        short = 'i',
        long = "input",
        visible_alias = "input-file",
        value_name = "FILE",
        help_heading = "Input",
        help = "Read the roster payload from a local JSON file instead of the endpoint."
    )]
    pub input_file: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.intros/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'r',
        long = "route",
        value_name = "PATH",
        conflicts_with = "id",
        help_heading = "View",
        help = "Location to open, e.g. /intros or /intros/alee3."
    )]
    pub route: Option<String>,

    #[arg(
        long = "id",
        value_name = "ID",
        help_heading = "View",
        help = "Student to open by stable key or list position."
    )]
    pub id: Option<String>,

    #[arg(
        short = 's',
        long = "search",
        value_name = "TEXT",
        help_heading = "View",
        help = "Filter students by name (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        long = "hide",
        value_name = "CATEGORY",
        action = ArgAction::Append,
        help_heading = "View",
        help = "Hide a field category (repeatable)."
    )]
    pub hide: Vec<String>,

    #[arg(
        long = "only",
        value_name = "CATEGORY",
        action = ArgAction::Append,
        conflicts_with = "hide",
        help_heading = "View",
        help = "Show only these field categories (repeatable)."
    )]
    pub only: Vec<String>,

    #[arg(
        short = 'n',
        long = "next",
        action = ArgAction::Count,
        help_heading = "View",
        help = "Step to the next matching student (repeatable)."
    )]
    pub next: u8,

    #[arg(
        short = 'p',
        long = "prev",
        action = ArgAction::Count,
        help_heading = "View",
        help = "Step to the previous matching student (repeatable)."
    )]
    pub prev: u8,

    #[arg(
        short = 'l',
        long = "list",
        help_heading = "View",
        help = "Show the list instead of opening the first student."
    )]
    pub list: bool,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds (no timeout by default)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Proxy for the roster request."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "no-proxy",
        help_heading = "HTTP",
        help = "Ignore proxies from the environment."
    )]
    pub no_proxy: bool,
}
