//! Chronicle Query CLI
//!
//! Command-line client for a running query server:
//! - Structured and SQL queries
//! - Stored range of a bucket
//! - Symbol listing
//! - Default config generation

use chronicle_query::api::dto::{
    ListSymbolsReply, MultiQueryRequest, QueryRequestDto, RangeLimitArgs, RangeLimitReply,
};
use chronicle_query::service::{MultiDataset, ResultEnvelope};
use chronicle_query::storage::{Column, EPOCH};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chronicle-query-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query a Chronicle Query server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:5993", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a structured query against a destination key
    Query {
        /// Destination, e.g. AAPL,TSLA/1Min/OHLCV
        destination: String,
        /// Range start: Unix seconds, RFC 3339 or YYYY-MM-DD
        #[arg(short, long)]
        start: Option<String>,
        /// Range end: Unix seconds, RFC 3339 or YYYY-MM-DD
        #[arg(short, long)]
        end: Option<String>,
        /// Keep at most this many records (0 = all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Count the limit from the start of the range instead of the end
        #[arg(long)]
        ascending: bool,
        /// Aggregate calls applied in order, e.g. "Resample('1H', Open, High, Low, Close)"
        #[arg(short = 'F', long = "function")]
        functions: Vec<String>,
    },

    /// Run a SQL statement
    Sql {
        /// e.g. "SELECT Close FROM 'AAPL/1Min/OHLCV' LIMIT 10"
        statement: String,
    },

    /// Show the first and last stored epochs of a bucket
    Range {
        destination: String,
    },

    /// List stored symbols
    Symbols,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Query {
            destination,
            start,
            end,
            limit,
            ascending,
            functions,
        } => {
            let request = QueryRequestDto {
                destination,
                time_start: start.as_deref().map(parse_time).transpose()?.unwrap_or(0),
                time_end: end.as_deref().map(parse_time).transpose()?.unwrap_or(0),
                limit_record_count: limit,
                time_order_ascending: ascending,
                functions,
                ..Default::default()
            };
            let envelope: ResultEnvelope =
                rpc(&client, &cli.api_url, "query", &batch(request)).await?;
            print_envelope(&envelope, &cli.format)?;
        }

        Commands::Sql { statement } => {
            let request = QueryRequestDto::sql(statement);
            let envelope: ResultEnvelope =
                rpc(&client, &cli.api_url, "query", &batch(request)).await?;
            print_envelope(&envelope, &cli.format)?;
        }

        Commands::Range { destination } => {
            let reply: RangeLimitReply = rpc(
                &client,
                &cli.api_url,
                "range_limit",
                &RangeLimitArgs { destination },
            )
            .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                println!("Start: {}", format_epoch(reply.start));
                println!("End:   {}", format_epoch(reply.end));
            }
        }

        Commands::Symbols => {
            let reply: ListSymbolsReply =
                rpc(&client, &cli.api_url, "list_symbols", &serde_json::json!({})).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else if reply.results.is_empty() {
                println!("No symbols stored.");
            } else {
                for symbol in reply.results {
                    println!("{}", symbol);
                }
            }
        }

        Commands::Config { output } => {
            let config = chronicle_query::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn batch(request: QueryRequestDto) -> MultiQueryRequest {
    MultiQueryRequest {
        requests: vec![request],
    }
}

/// POST `body` to `/rpc/<method>`, exiting with the server's message on failure
async fn rpc<B: Serialize, T: DeserializeOwned>(
    client: &reqwest::Client,
    api_url: &str,
    method: &str,
    body: &B,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = match client
        .post(format!("{}/rpc/{}", api_url, method))
        .json(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Cannot connect to Chronicle Query at {}", api_url);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);
        eprintln!("Request failed ({}): {}", status, message);
        std::process::exit(1);
    }

    Ok(response.json().await?)
}

/// Unix seconds, RFC 3339 or a UTC date
fn parse_time(s: &str) -> Result<i64, Box<dyn std::error::Error>> {
    if let Ok(ts) = s.parse::<i64>() {
        return Ok(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    Err(format!("Invalid time: {}. Use Unix seconds, RFC 3339 or YYYY-MM-DD", s).into())
}

fn format_epoch(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn format_cell(column: &Column, row: usize) -> String {
    match column {
        Column::Int64(values) => values.get(row).map(|v| v.to_string()),
        Column::Float64(values) => values.get(row).map(|v| format!("{:.4}", v)),
    }
    .unwrap_or_default()
}

fn print_envelope(
    envelope: &ResultEnvelope,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(envelope)?),
        "csv" => {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(std::io::stdout());
            for response in &envelope.responses {
                write_csv(&mut writer, &response.result)?;
            }
            writer.flush()?;
        }
        _ => {
            for response in &envelope.responses {
                print_table(&response.result);
            }
        }
    }
    Ok(())
}

fn print_table(dataset: &MultiDataset) {
    if dataset.is_empty() {
        println!("No data for the selected range");
        return;
    }

    for key in dataset.keys() {
        let Some(series) = dataset.series_for(key) else {
            continue;
        };
        println!("{}", key);

        let names = series.column_names();
        for name in names {
            print!("{:<22}", name);
        }
        println!();
        println!("{}", "-".repeat(22 * names.len()));

        for row in 0..series.len() {
            for name in names {
                let cell = match series.get(name) {
                    Some(Column::Int64(values)) if name == EPOCH => {
                        values.get(row).map(|e| format_epoch(*e)).unwrap_or_default()
                    }
                    Some(column) => format_cell(column, row),
                    None => String::new(),
                };
                print!("{:<22}", cell);
            }
            println!();
        }
        println!();
    }
}

fn write_csv<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    dataset: &MultiDataset,
) -> Result<(), Box<dyn std::error::Error>> {
    for key in dataset.keys() {
        let Some(series) = dataset.series_for(key) else {
            continue;
        };

        let mut header = vec!["Key".to_string()];
        header.extend(series.column_names().iter().cloned());
        writer.write_record(&header)?;

        for row in 0..series.len() {
            let mut record = vec![key.to_string()];
            for name in series.column_names() {
                record.push(series.get(name).map(|c| format_cell(c, row)).unwrap_or_default());
            }
            writer.write_record(&record)?;
        }
    }
    Ok(())
}
