//! Logicsim - Combinational Logic Simulator
//!
//! Settles a gate netlist and prints its outputs.
//!
//! # Usage
//!
//! ```bash
//! logicsim adder.lsim --defs gates.json --set a=1 --set b=1
//! logicsim adder.lsim --truth-table
//! ```

use std::path::PathBuf;

use clap::Parser;
use logicsim_core::{
    circuit::{validate_circuit, Netlist},
    dsl,
    error::{LogicSimError, Result},
    GateLibrary, SimulatorConfig, MAX_PASSES,
};

/// Combinational logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// JSON file of custom gate definitions (repeatable)
    #[arg(short, long = "defs", value_name = "FILE")]
    defs: Vec<PathBuf>,

    /// Set an input before stepping, as NAME=0 or NAME=1 (repeatable)
    #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, bool)>,

    /// Print the full truth table instead of a single step
    #[arg(short, long)]
    truth_table: bool,

    /// Pass ceiling per step
    #[arg(short, long, default_value_t = MAX_PASSES)]
    max_passes: usize,
}

fn parse_assignment(text: &str) -> std::result::Result<(String, bool), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", text))?;
    let value = match value {
        "0" => false,
        "1" => true,
        other => return Err(format!("value must be 0 or 1, got '{}'", other)),
    };
    Ok((name.to_string(), value))
}

fn main() -> Result<()> {
    clilog::init_stderr_color_debug();
    let args = Args::parse();
    clilog::debug!("args: {:#?}", args);

    let mut library = GateLibrary::new();
    for path in &args.defs {
        let count = library.load_file(path)?;
        clilog::info!("loaded {} gate definitions from {}", count, path.display());
    }

    let ast = dsl::parse_file(&args.circuit_file)?;
    let config = SimulatorConfig::new().with_max_passes(args.max_passes);
    let mut netlist = Netlist::from_ast(ast, &library, config)?;
    validate_circuit(netlist.simulator().circuit())?;

    for (name, value) in &args.set {
        netlist.set_input(name, *value)?;
    }

    if args.truth_table {
        print!("{}", netlist.truth_table()?);
        return Ok(());
    }

    let report = netlist.step();
    for (name, value) in netlist.outputs() {
        println!("{} = {}", name, u8::from(value));
    }
    clilog::info!("{}", report);

    if report.oscillating {
        return Err(LogicSimError::InvalidTopology {
            message: format!("circuit did not settle within {} passes", report.passes),
        });
    }
    Ok(())
}
