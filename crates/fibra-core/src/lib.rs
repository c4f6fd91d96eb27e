pub mod cache;
pub mod diagnose;
pub mod error;
pub mod export;
pub mod extraction;
pub mod history;
pub mod model;
pub mod parsing;
pub mod profile;

use std::path::Path;

use cache::DocumentCache;
use diagnose::outcome::DiagnosisResult;
use diagnose::DiagnosisRequest;
use error::FibraError;
use extraction::delimited::CsvExtractor;
use extraction::pdftotext::PdftotextExtractor;
use extraction::spreadsheet::SpreadsheetExtractor;
use extraction::trace::{CommandTraceDecoder, JsonTraceDecoder, TraceDecoder};
use extraction::{DocumentExtractor, InputFormat, PageContent};
use parsing::{FieldLocator, ParsedDocument};
use profile::schema::DiagnosisProfile;

/// Pluggable collaborators for the formats that need an external tool.
pub struct Backends<'a> {
    pub pdf: &'a dyn DocumentExtractor,
    /// Decoder for binary traces. When unset, the profile's
    /// `trace_decoder` command is used.
    pub trace: Option<&'a dyn TraceDecoder>,
}

impl Default for Backends<'static> {
    fn default() -> Self {
        Backends {
            pdf: &PdftotextExtractor,
            trace: None,
        }
    }
}

/// Default fiber identifier: the file stem.
pub fn fiber_id_from_name(name: &Path) -> String {
    name.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".into())
}

/// Read one input document into fields and events.
///
/// The format is chosen by file extension. Collaborator failures are
/// returned as errors; use [`diagnose_input`] for the never-abort path.
pub fn parse_input(
    name: &Path,
    bytes: &[u8],
    backends: &Backends<'_>,
    profile: &DiagnosisProfile,
) -> Result<ParsedDocument, FibraError> {
    let format = InputFormat::from_path(name)?;
    parse_as(format, bytes, backends, profile)
}

/// Text pages of a document, for searching it by hand.
///
/// Trace inputs carry no text and are rejected.
pub fn extract_pages(
    name: &Path,
    bytes: &[u8],
    backends: &Backends<'_>,
) -> Result<Vec<PageContent>, FibraError> {
    let format = InputFormat::from_path(name)?;
    pages_of(format, bytes, backends)
}

fn pages_of(
    format: InputFormat,
    bytes: &[u8],
    backends: &Backends<'_>,
) -> Result<Vec<PageContent>, FibraError> {
    match format {
        InputFormat::Pdf => backends.pdf.extract_pages(bytes),
        InputFormat::Csv => CsvExtractor.extract_pages(bytes),
        InputFormat::Spreadsheet => SpreadsheetExtractor.extract_pages(bytes),
        InputFormat::Trace | InputFormat::DecodedTrace => Err(FibraError::Extraction(format!(
            "{format} input has no text pages"
        ))),
    }
}

fn parse_as(
    format: InputFormat,
    bytes: &[u8],
    backends: &Backends<'_>,
    profile: &DiagnosisProfile,
) -> Result<ParsedDocument, FibraError> {
    match format {
        InputFormat::Trace => {
            let summary = match (backends.trace, &profile.trace_decoder) {
                (Some(decoder), _) => decoder.decode(bytes)?,
                (None, Some(command)) => CommandTraceDecoder::new(command).decode(bytes)?,
                (None, None) => return Err(FibraError::DecoderNotConfigured),
            };
            Ok(parsing::parse_trace(&summary))
        }
        InputFormat::DecodedTrace => {
            let summary = JsonTraceDecoder.decode(bytes)?;
            Ok(parsing::parse_trace(&summary))
        }
        InputFormat::Pdf | InputFormat::Csv | InputFormat::Spreadsheet => {
            let pages = pages_of(format, bytes, backends)?;
            Ok(parsing::parse_document(&pages, &FieldLocator::new(profile)))
        }
    }
}

/// Main API entry point: diagnose one input document.
///
/// Only an unsupported file type is an error. A document that cannot be read
/// still yields a result, with status "insufficient data" and the failure
/// among its warnings.
pub fn diagnose_input(
    name: &Path,
    bytes: &[u8],
    backends: &Backends<'_>,
    request: &DiagnosisRequest,
    profile: &DiagnosisProfile,
) -> Result<DiagnosisResult, FibraError> {
    let format = InputFormat::from_path(name)?;
    let parsed = parse_as(format, bytes, backends, profile)
        .unwrap_or_else(|e| unreadable(name, e));
    Ok(finish(name, format, &parsed, request, profile))
}

/// Like [`diagnose_input`], reusing earlier parses of identical bytes.
pub fn diagnose_cached(
    cache: &mut DocumentCache,
    name: &Path,
    bytes: &[u8],
    backends: &Backends<'_>,
    request: &DiagnosisRequest,
    profile: &DiagnosisProfile,
) -> Result<DiagnosisResult, FibraError> {
    let format = InputFormat::from_path(name)?;
    let context = parse_context(format, backends, profile)?;
    let parsed = cache
        .get_or_try_insert_with(bytes, &context, || parse_as(format, bytes, backends, profile))
        .unwrap_or_else(|e| unreadable(name, e));
    Ok(finish(name, format, &parsed, request, profile))
}

/// Everything besides the bytes that shapes a parse.
fn parse_context(
    format: InputFormat,
    backends: &Backends<'_>,
    profile: &DiagnosisProfile,
) -> Result<String, FibraError> {
    Ok(format!(
        "{}|{}|{}|{}",
        format,
        backends.pdf.backend_name(),
        backends.trace.map(|t| t.backend_name()).unwrap_or("-"),
        serde_json::to_string(profile)?
    ))
}

fn unreadable(name: &Path, e: FibraError) -> ParsedDocument {
    tracing::warn!(file = %name.display(), "could not read document: {e}");
    ParsedDocument::unreadable(e.to_string())
}

fn finish(
    name: &Path,
    format: InputFormat,
    parsed: &ParsedDocument,
    request: &DiagnosisRequest,
    profile: &DiagnosisProfile,
) -> DiagnosisResult {
    let mut request = request.clone();
    if request.fiber_id.is_empty() {
        request.fiber_id = fiber_id_from_name(name);
    }
    diagnose::diagnose(parsed, &request, profile, &format.to_string())
}
