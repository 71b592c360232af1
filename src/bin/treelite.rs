//! Thin command-line wrapper over the library: load a model, dump it as
//! JSON, or run it over a row-major CSV of feature values. No engine logic
//! lives here; every subcommand is a couple of calls into `treelite::*`.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use treelite::predict::{self, Configuration, Input, Output};
use treelite::serialize;
use treelite::typeinfo::TypeInfo;
use treelite::Model;

#[derive(Parser)]
#[command(name = "treelite", about = "Inspect and run decision-tree ensemble models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a serialized model as deterministic JSON.
    Dump {
        model: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Run a model over a CSV of feature rows and print the output.
    Predict {
        model: PathBuf,
        input: PathBuf,
        #[arg(long, default_value = "default")]
        predict_type: String,
        #[arg(long, default_value_t = 0)]
        nthread: i32,
    },
}

fn load_model(path: &PathBuf) -> anyhow::Result<Model> {
    let mut f = BufReader::new(File::open(path)?);
    Ok(serialize::from_stream(&mut f)?)
}

fn read_csv_rows(path: &PathBuf, num_feature: usize) -> anyhow::Result<Vec<f64>> {
    let f = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    for line in f.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: Vec<f64> = line
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<_, _>>()?;
        if row.len() != num_feature {
            anyhow::bail!(
                "row has {} values, expected num_feature = {}",
                row.len(),
                num_feature
            );
        }
        values.extend(row);
    }
    Ok(values)
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new().env().init().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Dump { model, pretty } => {
            let model = load_model(&model)?;
            println!("{}", model.dump_as_json(pretty)?);
        }
        Command::Predict {
            model,
            input,
            predict_type,
            nthread,
        } => {
            let model = load_model(&model)?;
            let num_feature = model.num_feature() as usize;
            let config_json = format!(r#"{{"predict_type":"{}","nthread":{}}}"#, predict_type, nthread);
            let config = Configuration::from_json(&config_json)?;

            let rows = read_csv_rows(&input, num_feature)?;
            let num_row = rows.len() / num_feature.max(1);

            let output = match model.leaf_output_type() {
                TypeInfo::Float64 => predict::predict(&model, Input::F64(&rows), num_row, &config)?,
                TypeInfo::Float32 => {
                    let rows32: Vec<f32> = rows.iter().map(|&v| v as f32).collect();
                    predict::predict(&model, Input::F32(&rows32), num_row, &config)?
                }
                TypeInfo::UInt32 => unreachable!("no committed model has a uint32 leaf type"),
            };

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match output {
                Output::Scores(scores) => {
                    for row in scores.chunks(scores.len() / num_row.max(1)) {
                        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                        writeln!(out, "{}", line.join(","))?;
                    }
                }
                Output::LeafId(ids) => {
                    for row in ids.chunks(ids.len() / num_row.max(1)) {
                        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                        writeln!(out, "{}", line.join(","))?;
                    }
                }
            }
        }
    }
    Ok(())
}
