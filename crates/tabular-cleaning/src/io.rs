//! CSV codec and dataset sources.
//!
//! Every stage works on a polars [`DataFrame`]; this module is the only place
//! that turns text into frames and frames back into text.

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result, ResultExt};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

fn read_options(config: &CleaningConfig, infer_schema_length: Option<usize>) -> CsvReadOptions {
    let null_values = NullValues::AllColumns(
        config
            .null_markers
            .iter()
            .map(|marker| marker.as_str().into())
            .collect(),
    );

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(false)
                .with_null_values(Some(null_values)),
        )
}

/// Parse CSV text (header row first) into a DataFrame.
///
/// Any failure to produce a rectangular table is reported as
/// [`CleaningError::Parse`].
pub fn parse_csv(data: &str, config: &CleaningConfig) -> Result<DataFrame> {
    parse_csv_bytes(data.as_bytes().to_vec(), config)
}

fn parse_csv_bytes(bytes: Vec<u8>, config: &CleaningConfig) -> Result<DataFrame> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CleaningError::Parse("input is empty".to_string()));
    }

    // Strategy 1: configured inference window
    let df = match config.infer_schema_length {
        Some(rows) => match read_csv(bytes.clone(), config, Some(rows)) {
            Ok(df) => df,
            Err(e) => {
                // Strategy 2: a late row may not fit the sampled dtypes
                debug!("Parsing with a {}-row schema window failed: {}", rows, e);
                read_csv(bytes, config, None)?
            }
        },
        None => read_csv(bytes, config, None)?,
    };

    debug!("Parsed CSV into {:?}", df.shape());
    Ok(df)
}

fn read_csv(
    bytes: Vec<u8>,
    config: &CleaningConfig,
    infer_schema_length: Option<usize>,
) -> Result<DataFrame> {
    read_options(config, infer_schema_length)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| CleaningError::Parse(e.to_string()))
}

/// Read a CSV file from disk.
pub fn load_csv_path(path: impl AsRef<Path>, config: &CleaningConfig) -> Result<DataFrame> {
    let path = path.as_ref();
    info!("Loading dataset from: {}", path.display());

    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    parse_csv_bytes(bytes, config)
}

/// Check whether a source string names an HTTP(S) resource.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load a dataset from a file path or, with the `remote` feature, a URL.
pub fn load_source(source: &str, config: &CleaningConfig) -> Result<DataFrame> {
    if is_url(source) {
        return fetch_csv(source, config);
    }
    load_csv_path(source, config)
}

#[cfg(feature = "remote")]
fn fetch_csv(url: &str, config: &CleaningConfig) -> Result<DataFrame> {
    info!("Fetching dataset from: {}", url);

    let body = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(|e| CleaningError::Http(e).with_context(format!("Failed to fetch {}", url)))?;

    parse_csv_bytes(body.to_vec(), config)
}

#[cfg(not(feature = "remote"))]
fn fetch_csv(url: &str, _config: &CleaningConfig) -> Result<DataFrame> {
    Err(CleaningError::InvalidConfig(format!(
        "cannot fetch {}: compiled without the `remote` feature",
        url
    )))
}

/// Serialize a DataFrame to CSV text with a header row.
pub fn to_csv_string(df: &DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(df, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CleaningError::Internal(e.to_string()))
}

/// Write a DataFrame as CSV (with header) into any writer.
pub fn write_csv<W: std::io::Write>(df: &DataFrame, writer: &mut W) -> Result<()> {
    let mut df = df.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut df)
        .context("Failed to serialize dataset as CSV")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CleaningConfig {
        CleaningConfig::default()
    }

    #[test]
    fn test_parse_csv_basic() {
        let df = parse_csv("id,name\n1,Ann\n2,Bob\n", &config()).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_parse_csv_preserves_column_order() {
        let df = parse_csv("zeta,alpha,mid\n1,2,3\n", &config()).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_csv_null_markers() {
        let df = parse_csv("id,v\n1,10\n2,NA\n3,\n4,null\n", &config()).unwrap();
        let v = df.column("v").unwrap();
        assert_eq!(v.dtype(), &DataType::Int64);
        assert_eq!(v.null_count(), 3);
    }

    #[test]
    fn test_parse_csv_custom_null_markers() {
        let config = CleaningConfig::builder().null_markers(["?"]).build().unwrap();
        let df = parse_csv("v\n1\n?\n", &config).unwrap();
        assert_eq!(df.column("v").unwrap().null_count(), 1);
    }

    #[test]
    fn test_parse_csv_empty_input() {
        let result = parse_csv("  \n", &config());
        assert!(matches!(result, Err(CleaningError::Parse(_))));
    }

    #[test]
    fn test_parse_csv_ragged_row_is_parse_error() {
        let result = parse_csv("a,b\n1,2\n3,4,5\n", &config());
        let err = result.unwrap_err();
        assert!(matches!(err, CleaningError::Parse(_)));
        assert_eq!(err.error_code(), "PARSE_ERROR");
    }

    fn late_text_csv(rows: usize) -> String {
        let mut data = String::from("id,code\n");
        for i in 0..rows {
            data.push_str(&format!("{},{}\n", i, i * 10));
        }
        data.push_str(&format!("{},ABC\n", rows));
        data
    }

    #[test]
    fn test_parse_csv_late_text_value_past_default_window() {
        let df = parse_csv(&late_text_csv(1200), &config()).unwrap();

        assert_eq!(df.height(), 1201);
        let code = df.column("code").unwrap();
        assert_eq!(code.dtype(), &DataType::String);
        assert_eq!(code.str().unwrap().get(1200), Some("ABC"));
        assert_eq!(code.null_count(), 0);
    }

    #[test]
    fn test_parse_csv_small_window_falls_back_to_full_scan() {
        let config = CleaningConfig::builder().infer_schema_length(10).build().unwrap();
        let df = parse_csv(&late_text_csv(50), &config).unwrap();

        assert_eq!(df.height(), 51);
        assert_eq!(df.column("code").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_csv_path("/definitely/not/here.csv", &config());
        let err = result.unwrap_err();
        assert!(err.is_io());
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("http://localhost:8002/files/a.csv"));
        assert!(is_url("https://example.com/a.csv"));
        assert!(!is_url("uploads/a.csv"));
    }

    #[test]
    fn test_csv_round_trip() {
        let input = "id,city,score\n1,Oslo,1.5\n2,,2.5\n3,Rome,\n";
        let df = parse_csv(input, &config()).unwrap();
        let text = to_csv_string(&df).unwrap();
        let back = parse_csv(&text, &config()).unwrap();
        assert!(df.equals_missing(&back));
    }
}
