use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use log::error;
use lucent::{Environment, Value};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template, loading every file in a directory as a named
    /// template first.
    Render {
        #[arg(long)]
        dir: PathBuf,

        #[arg(long)]
        template: String,

        /// Path to a JSON object used to populate the variable mapping.
        #[arg(long)]
        vars: Option<PathBuf>,
    },
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let cli = Cli::parse();

    match cli.command {
        Command::Render { dir, template, vars } => render(dir, template, vars),
    }
}

fn render(dir: PathBuf, template: String, vars: Option<PathBuf>) {
    let mut env = Environment::new();
    env.load_dir(&dir);

    if let Some(path) = vars {
        if let Err(message) = load_vars(&mut env, &path) {
            error!("{message}");
            std::process::exit(1);
        }
    }

    let output = env.render(&template);

    if let Some(errors) = env.check_errors() {
        for error in errors {
            eprintln!("{error}");
        }
    }

    match output {
        Some(text) => println!("{text}"),
        None => std::process::exit(1),
    }

    if env.check_errors().is_some() {
        std::process::exit(1);
    }
}

fn load_vars(env: &mut Environment, path: &PathBuf) -> Result<(), String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read '{}': {err}", path.display()))?;
    let parsed: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse '{}': {err}", path.display()))?;
    let serde_json::Value::Object(map) = parsed else {
        return Err(format!("'{}' must contain a JSON object", path.display()));
    };
    for (name, value) in map {
        env.set_variable(name, json_to_value(value));
    }
    Ok(())
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Int(n.as_i64().unwrap_or_default()),
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => {
            Value::sequence(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => {
            let mut entries = IndexMap::new();
            for (key, value) in map {
                entries.insert(Rc::from(key.as_str()), json_to_value(value));
            }
            Value::mapping(entries)
        }
    }
}
