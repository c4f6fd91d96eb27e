use fibra_core::error::FibraError;
use fibra_core::history::{write_summary, SummaryRow};

pub fn print(rows: &[SummaryRow]) -> Result<(), FibraError> {
    write_summary(std::io::stdout().lock(), rows)
}
