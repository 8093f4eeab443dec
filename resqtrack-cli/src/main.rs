use clap::{Parser, Subcommand, ValueEnum};
use resqtrack::records::{CaseStatusUpdate, NewCase};
use resqtrack::{Collection, Records, Row, TabularStore};
use std::process;

/// ResQTrack CLI: inspect and edit the rescue record files directly
#[derive(Parser)]
#[command(name = "resqtrack", version, about)]
struct Cli {
    /// Directory holding the collection CSV files
    #[arg(long, default_value = "database", env = "RESQTRACK_DATA_DIR")]
    data_dir: String,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create any missing collection files
    Init,

    /// List every row of a collection
    List {
        /// Collection name
        collection: String,
    },

    /// Show a single case
    Get {
        /// Case ID (e.g. RSQ-00001)
        case_id: String,
    },

    /// Report a new case
    Report {
        /// Case fields (e.g. --field animal_type=Dog)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Change the status of a case
    UpdateStatus {
        /// Case ID
        case_id: String,
        /// New status
        status: String,
        /// Hospital now handling the case
        #[arg(long)]
        hospital: Option<String>,
    },

    /// Add a row to a registered collection
    Add {
        /// Collection name
        collection: String,
        /// Field values (e.g. --field donor_name="Ravi Kumar")
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Delete a case
    Delete {
        /// Collection name
        collection: String,
        /// Record ID
        id: String,
        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the dashboard totals
    Stats,

    /// Print the ID the next reported case will get
    NextId,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid key=value pair: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Using data directory {}", cli.data_dir);
    let records = Records::new(TabularStore::open(&cli.data_dir));

    match cli.command {
        Command::Init => {
            records.ensure_all()?;
            let collections: Vec<&str> = Collection::ALL.iter().map(Collection::as_str).collect();
            print_output(
                &serde_json::json!({ "ok": true, "collections": collections }),
                &cli.format,
            )?;
        }

        Command::List { collection } => {
            let rows = records.list_all(&collection)?;
            print_output(&serde_json::to_value(rows)?, &cli.format)?;
        }

        Command::Get { case_id } => {
            let case = records.get_case(&case_id)?;
            print_output(&serde_json::to_value(case)?, &cli.format)?;
        }

        Command::Report { fields } => {
            let case: NewCase = resqtrack::records::from_fields(&to_row(fields))?;
            let case_id = records.report_case(case)?;
            print_output(&serde_json::json!({ "case_id": case_id }), &cli.format)?;
        }

        Command::UpdateStatus {
            case_id,
            status,
            hospital,
        } => {
            records.update_case_status(CaseStatusUpdate {
                case_id: case_id.clone(),
                status,
                assigned_hospital: hospital,
            })?;
            print_output(&serde_json::json!({ "ok": true, "case_id": case_id }), &cli.format)?;
        }

        Command::Add { collection, fields } => {
            let collection: Collection = collection.parse()?;
            let case_id = records.add_record(collection, to_row(fields))?;
            print_output(
                &serde_json::json!({ "ok": true, "collection": collection.as_str(), "case_id": case_id }),
                &cli.format,
            )?;
        }

        Command::Delete {
            collection,
            id,
            dry_run,
        } => {
            let collection: Collection = collection.parse()?;
            if dry_run {
                if collection != Collection::Cases {
                    return Err(format!("Delete action not implemented for '{collection}'").into());
                }
                let case = records.get_case(&id)?;
                print_output(
                    &serde_json::json!({
                        "dry_run": true,
                        "would_delete": { "collection": collection.as_str(), "id": id },
                        "record": case,
                    }),
                    &cli.format,
                )?;
            } else {
                records.delete_record(collection, &id)?;
                print_output(&serde_json::json!({ "ok": true, "deleted": id }), &cli.format)?;
            }
        }

        Command::Stats => {
            let stats = records.stats()?;
            print_output(&serde_json::to_value(stats)?, &cli.format)?;
        }

        Command::NextId => {
            let next = records.next_case_id()?;
            print_output(&serde_json::json!({ "next_case_id": next }), &cli.format)?;
        }
    }

    Ok(())
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

fn to_row(fields: Vec<(String, String)>) -> Row {
    fields.into_iter().collect()
}
