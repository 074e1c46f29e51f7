//! Report generation module.
//!
//! A [`CleaningReport`] collects the profile, summary and action log of one
//! pipeline run. The CLI prints it with `--json` and writes it to disk with
//! `--emit-report`.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabular_cleaning::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/customers.csv", None, &critical, &outcome);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! ReportGenerator::new("results").write_report_to_file(&report, "customers")?;
//! ```

mod generator;

pub use generator::{CleaningReport, ProcessingSummaryReport, QualityAssessment, ReportGenerator};
