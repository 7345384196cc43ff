//! WASM bindings for Logicsim Core.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmLogicSim } from 'logicsim_core';
//!
//! await init();
//!
//! const sim = new WasmLogicSim(`
//!   .input a
//!   .input b
//!   .output y x
//!   XOR x a b
//! `);
//!
//! sim.set_input("a", true);
//! sim.step();
//! console.log(sim.output("y"));
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::Netlist;
use crate::error::LogicSimError;
use crate::gates::GateLibrary;
use crate::solver::{SimulatorConfig, StepReport, MAX_PASSES};

fn to_js(error: LogicSimError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// WASM-compatible logic simulator built from netlist text.
#[wasm_bindgen]
pub struct WasmLogicSim {
    netlist: Netlist,
    last_report: Option<StepReport>,
}

#[wasm_bindgen]
impl WasmLogicSim {
    /// Create a simulator from netlist DSL text.
    ///
    /// # Example
    /// ```javascript
    /// const sim = new WasmLogicSim(netlistText);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(circuit_dsl: &str) -> Result<WasmLogicSim, JsValue> {
        Self::with_config(circuit_dsl, "[]", MAX_PASSES)
    }

    /// Create a simulator with custom gate definitions and a pass ceiling.
    ///
    /// # Arguments
    /// * `circuit_dsl` - The netlist text
    /// * `definitions_json` - JSON array of custom gate definitions
    /// * `max_passes` - Pass ceiling per step (default: 64)
    #[wasm_bindgen]
    pub fn with_config(
        circuit_dsl: &str,
        definitions_json: &str,
        max_passes: usize,
    ) -> Result<WasmLogicSim, JsValue> {
        let mut library = GateLibrary::new();
        library.extend_from_json(definitions_json).map_err(to_js)?;

        let config = SimulatorConfig::new().with_max_passes(max_passes);
        let netlist = Netlist::parse(circuit_dsl, &library, config).map_err(to_js)?;
        crate::circuit::validate_circuit(netlist.simulator().circuit()).map_err(to_js)?;

        Ok(WasmLogicSim {
            netlist,
            last_report: None,
        })
    }

    /// Set a named input. Takes effect on the next step.
    #[wasm_bindgen]
    pub fn set_input(&mut self, name: &str, value: bool) -> Result<(), JsValue> {
        self.netlist.set_input(name, value).map(|_| ()).map_err(to_js)
    }

    /// Run one step. Returns `true` if the circuit settled.
    #[wasm_bindgen]
    pub fn step(&mut self) -> bool {
        let report = self.netlist.step();
        self.last_report = Some(report);
        report.stable
    }

    /// Read a named output, or `undefined` if there is none.
    #[wasm_bindgen]
    pub fn output(&self, name: &str) -> Option<bool> {
        self.netlist.output(name).ok()
    }

    /// Read any signal (`gate` or `gate.N`), or `undefined`.
    #[wasm_bindgen]
    pub fn signal(&self, signal: &str) -> Option<bool> {
        self.netlist.signal(signal).ok()
    }

    /// Passes run by the last step.
    #[wasm_bindgen(getter)]
    pub fn last_passes(&self) -> usize {
        self.last_report.map_or(0, |r| r.passes)
    }

    /// Whether the last step hit the pass ceiling.
    #[wasm_bindgen(getter)]
    pub fn oscillating(&self) -> bool {
        self.last_report.map_or(false, |r| r.oscillating)
    }

    /// Truth table rendered as text.
    #[wasm_bindgen]
    pub fn truth_table(&mut self) -> Result<String, JsValue> {
        self.netlist
            .truth_table()
            .map(|table| table.to_string())
            .map_err(to_js)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
