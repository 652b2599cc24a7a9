//! Human-facing sequence numbers for jobs and invoices.
//!
//! Both numbers derive deterministically from the freshly assigned primary
//! key, formatted inside the creating transaction. A number therefore becomes
//! visible only once the row is durably committed and is never reused, even
//! when creation fails downstream.

/// Prefix for job numbers.
pub const JOB_PREFIX: &str = "JOB";

/// Prefix for invoice numbers.
pub const INVOICE_PREFIX: &str = "INV";

/// Zero-padding width for the id portion.
const ID_WIDTH: usize = 6;

/// Format a display number: `{prefix}-{year}-{zero-padded id}`.
///
/// Ids wider than the padding print in full; padding widens, never truncates.
fn format_number(prefix: &str, year: i32, id: i64) -> String {
    format!("{}-{}-{:0width$}", prefix, year, id, width = ID_WIDTH)
}

/// Display number for a job, e.g. "JOB-2026-000042".
pub fn job_number(year: i32, id: i64) -> String {
    format_number(JOB_PREFIX, year, id)
}

/// Display number for an invoice, e.g. "INV-2026-000007".
pub fn invoice_number(year: i32, id: i64) -> String {
    format_number(INVOICE_PREFIX, year, id)
}

/// Check a string against the external-number pattern for the given prefix.
pub fn matches_pattern(number: &str, prefix: &str) -> bool {
    let mut parts = number.splitn(3, '-');
    let (Some(p), Some(year), Some(id)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    p == prefix
        && year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && id.len() >= ID_WIDTH
        && id.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_number_format() {
        assert_eq!(job_number(2026, 42), "JOB-2026-000042");
        assert_eq!(job_number(2026, 1), "JOB-2026-000001");
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(invoice_number(2026, 7), "INV-2026-000007");
    }

    #[test]
    fn test_large_ids_are_not_truncated() {
        assert_eq!(job_number(2026, 1_234_567), "JOB-2026-1234567");
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("JOB-2026-000042", JOB_PREFIX));
        assert!(matches_pattern("INV-2026-1234567", INVOICE_PREFIX));
        assert!(!matches_pattern("JOB-2026-000042", INVOICE_PREFIX));
        assert!(!matches_pattern("JOB-26-000042", JOB_PREFIX));
        assert!(!matches_pattern("JOB-2026-42", JOB_PREFIX));
        assert!(!matches_pattern("not-a-number", JOB_PREFIX));
    }
}
