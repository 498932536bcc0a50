//! Command-line inspector for MSBuild project files
//! Exposes the position index, expression parser and semantic model of msbuild-parser.
//!
//! Usage:
//!   msbuild-inspect expr `<text>` [--mode root|list|simple-list]   - Print an expression tree
//!   msbuild-inspect model `<path>`                                 - Print the semantic model
//!   msbuild-inspect at `<path>` `<line:column>`                    - Describe what is at a position
//!
//! Every subcommand accepts `--format treeviz|json`, `--ranges` and `--config <file>`.
//! Settings can also come from `msbuild-inspect.toml` in the working directory and from
//! `MSBUILD_INSPECT_*` environment variables.

use clap::{Arg, ArgAction, ArgMatches, Command};
use msbuild_config::{InputBasis, InspectorConfig, Loader, OutputFormat};
use msbuild_parser::msbuild::diagnostics::TracingSink;
use msbuild_parser::msbuild::document::ProjectDocument;
use msbuild_parser::msbuild::expressions::{parse_as, ExpressionSyntax};
use msbuild_parser::msbuild::formats::{
    expression_to_treeviz_with_params, model_to_treeviz_with_params,
};
use msbuild_parser::msbuild::semantic::XsNode;
use msbuild_parser::msbuild::text::Position;
use serde_json::json;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("msbuild-inspect")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect MSBuild project files and expressions the way an editor sees them")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            with_common_args(Command::new("expr"))
                .about("Parse an MSBuild expression and print its tree")
                .arg(
                    Arg::new("text")
                        .help("Expression text, e.g. \"'$(Configuration)' == 'Debug'\"")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .help("Grammar rule to parse with")
                        .value_parser(["root", "list", "simple-list"])
                        .default_value("root"),
                ),
        )
        .subcommand(
            with_common_args(Command::new("model"))
                .about("Read a project file and print its semantic model")
                .arg(path_arg()),
        )
        .subcommand(
            with_common_args(Command::new("at"))
                .about("Describe the node and expression at a position in a project file")
                .arg(path_arg())
                .arg(
                    Arg::new("position")
                        .help("Position as LINE:COLUMN, numbered per positions.input_basis")
                        .required(true)
                        .index(2),
                ),
        )
        .get_matches();

    let Some((name, sub)) = matches.subcommand() else {
        eprintln!("No subcommand given");
        std::process::exit(1);
    };

    let config = load_config(sub).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    init_logging(&config);

    let result = match name {
        "expr" => handle_expr_command(sub, &config),
        "model" => handle_model_command(sub, &config),
        "at" => handle_at_command(sub, &config),
        other => Err(format!("Unknown subcommand '{}'", other)),
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
}

fn with_common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default: output.format from the configuration)")
                .value_parser(["treeviz", "json"]),
        )
        .arg(
            Arg::new("ranges")
                .long("ranges")
                .help("Show ranges and spans in treeviz output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the project file")
        .required(true)
        .index(1)
}

fn load_config(matches: &ArgMatches) -> Result<InspectorConfig, String> {
    let mut loader = Loader::new().local_file(".");
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.user_file(path);
    }
    if let Some(format) = matches
        .get_one::<String>("format")
        .and_then(|name| OutputFormat::from_name(name))
    {
        loader = loader.output_format(format).map_err(|e| e.to_string())?;
    }
    if matches.get_flag("ranges") {
        loader = loader.show_ranges().map_err(|e| e.to_string())?;
    }
    loader.build().map_err(|e| e.to_string())
}

/// Log to stderr; `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &InspectorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn treeviz_params(config: &InspectorConfig, key: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert(key.to_string(), config.output.show_ranges.to_string());
    params
}

fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|e| format!("Error formatting JSON: {}", e))
}

fn read_project(matches: &ArgMatches, config: &InspectorConfig) -> Result<ProjectDocument, String> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| "A project path is required".to_string())?;
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path, e))?;
    let mut sink = TracingSink::new().with_trace(config.logging.trace_reader);
    let document = ProjectDocument::parse_with_sink(&text, &mut sink);
    tracing::info!(path = path.as_str(), nodes = document.model().len(), "read project");
    Ok(document)
}

/// Handle the expr command
fn handle_expr_command(matches: &ArgMatches, config: &InspectorConfig) -> Result<String, String> {
    let text = matches
        .get_one::<String>("text")
        .ok_or_else(|| "Expression text is required".to_string())?;
    let syntax = match matches.get_one::<String>("mode").map(String::as_str) {
        Some("list") => ExpressionSyntax::List,
        Some("simple-list") => ExpressionSyntax::SimpleList,
        _ => ExpressionSyntax::Root,
    };

    let outcome = parse_as(text, syntax);
    let Some(tree) = outcome.tree else {
        let messages: Vec<String> = outcome
            .diagnostics
            .iter()
            .map(|diagnostic| format!("error: {}", diagnostic))
            .collect();
        return Err(messages.join("\n"));
    };

    match config.output.format {
        OutputFormat::Treeviz => Ok(expression_to_treeviz_with_params(
            &tree,
            &treeviz_params(config, "show-spans"),
        )),
        OutputFormat::Json => to_json(&tree),
    }
}

/// Handle the model command
fn handle_model_command(matches: &ArgMatches, config: &InspectorConfig) -> Result<String, String> {
    let document = read_project(matches, config)?;

    match config.output.format {
        OutputFormat::Treeviz => Ok(model_to_treeviz_with_params(
            document.model(),
            &treeviz_params(config, "show-ranges"),
        )),
        OutputFormat::Json => {
            let nodes: Vec<&XsNode> = document.model().nodes().collect();
            to_json(&json!({
                "nodes": nodes,
                "diagnostics": document.diagnostics(),
            }))
        }
    }
}

fn parse_position(text: &str, basis: InputBasis) -> Result<Position, String> {
    let invalid = || format!("Invalid position '{}', expected LINE:COLUMN", text);
    let (line, column) = text.split_once(':').ok_or_else(invalid)?;
    let line: usize = line.trim().parse().map_err(|_| invalid())?;
    let column: usize = column.trim().parse().map_err(|_| invalid())?;
    match basis {
        InputBasis::OneBased if line == 0 || column == 0 => {
            Err(format!("Position '{}' is not one-based", text))
        }
        InputBasis::OneBased => Ok(Position::one_based(line, column)),
        InputBasis::ZeroBased => Ok(Position::zero_based(line, column)),
    }
}

/// Handle the at command
fn handle_at_command(matches: &ArgMatches, config: &InspectorConfig) -> Result<String, String> {
    let document = read_project(matches, config)?;
    let argument = matches
        .get_one::<String>("position")
        .ok_or_else(|| "A position is required".to_string())?;
    let position = parse_position(argument, config.positions.input_basis)?;

    let location = document
        .inspect(position)
        .ok_or_else(|| format!("Nothing at {} in this document", argument))?;
    let expression = document.expression_at(position);

    match config.output.format {
        OutputFormat::Treeviz => {
            let node = location.node;
            let mut output = String::new();
            output.push_str(&format!("node: {}\n", node.path));
            output.push_str(&format!("kind: {}\n", node.kind()));
            output.push_str(&format!("range: {}\n", node.range));
            output.push_str(&format!("flags: {}\n", location.flags));
            if let Some(found) = &expression {
                output.push_str(&format!("syntax: {:?}\n", found.syntax));
                if let Some(expression_node) = found.node() {
                    output.push_str(&format!(
                        "expression: {} @{}..{}\n",
                        expression_node.expression_kind(),
                        expression_node.start,
                        expression_node.end()
                    ));
                }
                if let Some(tree) = &found.tree {
                    output.push_str(&expression_to_treeviz_with_params(
                        tree,
                        &treeviz_params(config, "show-spans"),
                    ));
                }
            }
            Ok(output)
        }
        OutputFormat::Json => {
            let expression = expression.as_ref().map(|found| {
                let node = found.node();
                json!({
                    "syntax": found.syntax,
                    "base_offset": found.base_offset,
                    "kind": node.map(|node| node.expression_kind().to_string()),
                    "name": node.and_then(|node| node.name()),
                    "span": node.map(|node| [node.start, node.end()]),
                    "diagnostics": found.diagnostics,
                })
            });
            to_json(&json!({
                "path": location.node.path,
                "kind": location.node.kind(),
                "range": location.node.range,
                "offset": location.offset,
                "flags": location.flags.to_string(),
                "expression": expression,
            }))
        }
    }
}
