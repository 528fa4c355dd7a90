use clap::{Parser, Subcommand};
use clinicalc_core::history::{recent, HISTORY_FILE};
use clinicalc_core::*;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clinicalc")]
#[command(about = "Clinical calculators for bedside decision support", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available calculators
    List,

    /// Show the input fields of a calculator
    Fields {
        /// Calculator id
        id: String,
    },

    /// Show the bibliographic references of a calculator
    Refs {
        /// Calculator id
        id: String,
    },

    /// Check inputs without calculating
    Validate {
        /// Calculator id
        id: String,

        /// Input as key=value (repeatable)
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,
    },

    /// Calculate and interpret
    Calc {
        /// Calculator id
        id: String,

        /// Input as key=value (repeatable)
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Do not save the result to history
        #[arg(long)]
        no_save: bool,
    },

    /// Show saved results, most recent first
    History {
        /// Only results from this calculator
        #[arg(long)]
        calculator: Option<String>,

        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export saved results to CSV
    Export {
        /// Destination CSV file
        path: PathBuf,
    },
}

fn parse_input(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    clinicalc_core::logging::init_with_level(&config.logging.level);

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let json = cli.json || config.output.format == OutputFormat::Json;
    let service = default_service();

    match cli.command {
        Commands::List => cmd_list(service, json),
        Commands::Fields { id } => cmd_fields(service, &id, json),
        Commands::Refs { id } => cmd_refs(service, &id, json),
        Commands::Validate { id, inputs } => cmd_validate(service, &id, inputs, json),
        Commands::Calc {
            id,
            inputs,
            no_save,
        } => {
            let save = config.history.enabled && !no_save;
            cmd_calc(service, &id, inputs, save, data_dir, json)
        }
        Commands::History { calculator, limit } => cmd_history(data_dir, calculator, limit, json),
        Commands::Export { path } => cmd_export(data_dir, path),
    }
}

fn cmd_list(service: &CalculatorService, json: bool) -> Result<()> {
    let calculators = service.calculators();
    if json {
        let listing: Vec<_> = calculators
            .iter()
            .map(|c| json!({ "id": c.id(), "name": c.name() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for calculator in calculators {
        println!("{:<20} {}", calculator.id(), calculator.name());
    }
    Ok(())
}

fn cmd_fields(service: &CalculatorService, id: &str, json: bool) -> Result<()> {
    let fields = service.fields(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(fields)?);
        return Ok(());
    }

    println!("{}", service.get(id)?.name());
    println!();
    for field in fields {
        let constraint = match field.kind {
            FieldKind::Number { min, max } => match field.unit {
                Some(unit) => format!("{} - {} {}", min, max, unit),
                None => format!("{} - {}", min, max),
            },
            FieldKind::Flag => "true | false".to_string(),
            FieldKind::Choice { options } | FieldKind::Text { options } => options.join(" | "),
        };
        let mut notes = Vec::new();
        if !field.required {
            notes.push("opcional".to_string());
        }
        if let Some(default) = field.default {
            notes.push(format!("por defecto {}", default));
        }
        if let Some(gate) = field.only_when {
            notes.push(format!("si {}=true", gate));
        }

        println!("  {:<24} {}", field.id, field.label);
        println!("  {:<24} {}", "", constraint);
        if !notes.is_empty() {
            println!("  {:<24} ({})", "", notes.join(", "));
        }
    }
    Ok(())
}

fn cmd_refs(service: &CalculatorService, id: &str, json: bool) -> Result<()> {
    let references = service.list_references(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(references)?);
        return Ok(());
    }

    for reference in references {
        let year = reference.year.map(|y| format!(" ({})", y)).unwrap_or_default();
        println!("- {}. {}{}", reference.title, reference.source, year);
        if let Some(url) = reference.url {
            println!("  {}", url);
        }
    }
    Ok(())
}

fn cmd_validate(
    service: &CalculatorService,
    id: &str,
    inputs: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let inputs = input_set(inputs);
    let validation = service.validate(id, &inputs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&validation)?);
    } else if validation.is_valid() {
        println!("✓ Entradas válidas");
    } else {
        print_errors(&validation);
    }

    if validation.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidInput {
            calculator_id: id.to_string(),
            message: validation.joined(),
        })
    }
}

fn cmd_calc(
    service: &CalculatorService,
    id: &str,
    inputs: Vec<(String, String)>,
    save: bool,
    data_dir: PathBuf,
    json: bool,
) -> Result<()> {
    let inputs = input_set(inputs);
    let validation = service.validate(id, &inputs)?;
    if !validation.is_valid() {
        print_errors(&validation);
        return Err(Error::InvalidInput {
            calculator_id: id.to_string(),
            message: validation.joined(),
        });
    }

    let result = service.calculate(id, &inputs)?;
    let interpretation = service.interpret(id, &result)?;

    let saved = if save {
        let mut history = JsonlHistory::new(data_dir.join(HISTORY_FILE));
        Some(history.record(&result)?)
    } else {
        None
    };

    if json {
        let output = json!({
            "result": result,
            "interpretation": interpretation,
            "history_id": saved.as_ref().map(|e| e.id.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", interpretation);
    println!();
    println!("Resultados:");
    for (key, value) in result.result_values() {
        println!("  {:<28} {}", key, value);
    }
    if let Some(entry) = saved {
        println!();
        println!("✓ Guardado en el historial ({})", entry.id);
    }
    Ok(())
}

fn cmd_history(data_dir: PathBuf, calculator: Option<String>, limit: usize, json: bool) -> Result<()> {
    let entries = read_history(&data_dir.join(HISTORY_FILE))?;
    let selected = recent(&entries, calculator.as_deref(), limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    if selected.is_empty() {
        println!("No hay resultados guardados.");
        return Ok(());
    }

    for entry in &selected {
        let summary = entry
            .result
            .result_values()
            .iter()
            .take(3)
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{}  {:<20} {}",
            entry.saved_at.format("%Y-%m-%d %H:%M:%S"),
            entry.result.calculator_id(),
            summary
        );
    }
    Ok(())
}

fn cmd_export(data_dir: PathBuf, path: PathBuf) -> Result<()> {
    let entries = read_history(&data_dir.join(HISTORY_FILE))?;
    let count = export_csv(&entries, &path)?;

    println!("✓ Exported {} results to CSV", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

fn print_errors(validation: &ValidationResult) {
    eprintln!("Entradas no válidas:");
    for error in validation.errors() {
        eprintln!("  - {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_splits_on_first_equals() {
        assert_eq!(
            parse_input("formula=a=b").unwrap(),
            ("formula".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_input(" weight =70").unwrap(),
            ("weight".to_string(), "70".to_string())
        );
    }

    #[test]
    fn test_parse_input_rejects_malformed() {
        assert!(parse_input("weight").is_err());
        assert!(parse_input("=70").is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
