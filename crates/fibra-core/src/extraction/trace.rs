use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Command;

use crate::error::FibraError;
use crate::profile::schema::DecoderCommand;

/// What a decoded OTDR trace exposes. Distances are in metres, as most
/// trace formats store them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub fiber_length_m: Option<f64>,
    pub end_to_end_loss_db: Option<f64>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    pub position_m: Option<f64>,
    pub loss_db: Option<f64>,
    #[serde(default)]
    pub reflectance_db: Option<f64>,
    #[serde(default)]
    pub cumulative_loss_db: Option<f64>,
}

/// Trait for binary trace decoding backends.
pub trait TraceDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<TraceSummary, FibraError>;

    /// Name of this decoding backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Reads a trace that was already decoded to the JSON summary form.
pub struct JsonTraceDecoder;

impl TraceDecoder for JsonTraceDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TraceSummary, FibraError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn backend_name(&self) -> &str {
        "json"
    }
}

/// Runs an external decoder on a temp copy of the trace.
///
/// The program receives the configured arguments followed by the trace path
/// and must print a JSON `TraceSummary` on stdout.
pub struct CommandTraceDecoder {
    program: String,
    args: Vec<String>,
}

impl CommandTraceDecoder {
    pub fn new(command: &DecoderCommand) -> Self {
        CommandTraceDecoder {
            program: command.program.clone(),
            args: command.args.clone(),
        }
    }
}

impl TraceDecoder for CommandTraceDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TraceSummary, FibraError> {
        let mut tmpfile = tempfile::Builder::new()
            .suffix(".sor")
            .tempfile()
            .map_err(|e| FibraError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(bytes)
            .map_err(|e| FibraError::Extraction(e.to_string()))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(tmpfile.path())
            .output()
            .map_err(|e| {
                FibraError::Extraction(format!("could not run trace decoder '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FibraError::DecoderFailed { code, stderr });
        }

        JsonTraceDecoder.decode(&output.stdout)
    }

    fn backend_name(&self) -> &str {
        &self.program
    }
}
