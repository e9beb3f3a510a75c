use crate::error::{DetectorError, Result};
use crate::record::EmailRecord;
use crate::scorer::{PhishingScorer, ScoreResult};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredEmail {
    #[serde(flatten)]
    pub record: EmailRecord,
    #[serde(flatten)]
    pub result: ScoreResult,
}

/// A row that was only partly readable. Rows with invalid UTF-8 are still
/// scored with the bad bytes replaced; a read error ends the batch early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub line: u64,
    pub record_id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "line {} (id={}): {}", self.line, id, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

/// Scored emails ranked by score (highest first, ties in input order).
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub emails: Vec<ScoredEmail>,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn from_records(scorer: &PhishingScorer, records: Vec<EmailRecord>) -> Self {
        let mut emails: Vec<ScoredEmail> = records
            .into_iter()
            .map(|record| {
                let result = scorer.score(&record);
                ScoredEmail { record, result }
            })
            .collect();
        rank(&mut emails);

        Self {
            emails,
            failures: Vec::new(),
        }
    }

    /// Load a CSV file and score every row.
    pub fn from_csv_file<P: AsRef<Path>>(scorer: &PhishingScorer, path: P) -> Result<Self> {
        let (records, failures) = load_records(path)?;
        let mut report = Self::from_records(scorer, records);
        report.failures = failures;
        Ok(report)
    }

    pub fn loaded(&self) -> usize {
        self.emails.len()
    }

    pub fn at_least(&self, min_score: u32) -> Vec<&ScoredEmail> {
        filter_min_score(&self.emails, min_score)
    }
}

/// Stable sort by score, highest first.
pub fn rank(emails: &mut [ScoredEmail]) {
    emails.sort_by(|a, b| b.result.score.cmp(&a.result.score));
}

pub fn filter_min_score(emails: &[ScoredEmail], min_score: u32) -> Vec<&ScoredEmail> {
    emails
        .iter()
        .filter(|e| e.result.score >= min_score)
        .collect()
}

/// Read email rows from a headed CSV file. Short rows leave the missing
/// fields empty. Rows that are not valid UTF-8 are decoded lossily and kept,
/// and each one is also returned as a failure.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<(Vec<EmailRecord>, Vec<RowFailure>)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DetectorError::SourceUnavailable(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("id"));

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut row = ByteRecord::new();

    loop {
        let line = reader.position().line();
        match reader.read_byte_record(&mut row) {
            Ok(false) => break,
            Ok(true) => match StringRecord::from_byte_record(row.clone()) {
                Ok(fields) => {
                    records.push(EmailRecord::from_fields(headers.iter().zip(fields.iter())))
                }
                Err(e) => {
                    let failure = RowFailure {
                        line: row.position().map(|p| p.line()).unwrap_or(line),
                        record_id: id_column
                            .and_then(|i| row.get(i))
                            .map(|id| String::from_utf8_lossy(id).into_owned()),
                        message: e.to_string(),
                    };
                    log::warn!("Replaced invalid UTF-8 in row at {}", failure);
                    let fields = row.iter().map(String::from_utf8_lossy);
                    records.push(EmailRecord::from_fields(headers.iter().zip(fields)));
                    failures.push(failure);
                }
            },
            Err(e) => {
                // The reader cannot resume after an I/O error; keep what was read so far.
                let failure = RowFailure {
                    line: e.position().map(|p| p.line()).unwrap_or(line),
                    record_id: None,
                    message: e.to_string(),
                };
                log::warn!("Stopped reading at {}", failure);
                failures.push(failure);
                break;
            }
        }
    }

    log::info!(
        "Loaded {} emails from {} ({} with read problems)",
        records.len(),
        path.display(),
        failures.len()
    );
    Ok((records, failures))
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    id: &'a str,
    sender: &'a str,
    subject: &'a str,
    links: &'a str,
    attachments: &'a str,
    score: u32,
    reasons: String,
}

/// Write the full ranked report, one row per email, reasons joined with `;`.
pub fn write_report<P: AsRef<Path>>(path: P, emails: &[ScoredEmail]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for email in emails {
        writer.serialize(ReportRow {
            id: &email.record.id,
            sender: &email.record.sender,
            subject: &email.record.subject,
            links: &email.record.links,
            attachments: &email.record.attachments,
            score: email.result.score,
            reasons: email.result.reasons.join(";"),
        })?;
    }
    writer.flush()?;
    Ok(())
}
