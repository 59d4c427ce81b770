use crate::domain::errors::Result;
use crate::domain::market::price_table::{PriceTable, RawBar};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Reads headed OHLCV CSV files into a [`PriceTable`].
///
/// Columns are matched by exact header name and extra columns are ignored.
/// Cells that are empty or fail to parse become missing values; schema and
/// content checks are left to the validator.
pub struct CsvPriceLoader;

impl CsvPriceLoader {
    pub fn from_path(path: impl AsRef<Path>) -> Result<PriceTable> {
        let path = path.as_ref();
        let table = Self::from_reader(File::open(path)?)?;
        info!("Loaded {} rows from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<PriceTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let position = |name: &str| columns.iter().position(|c| c == name);
        let date_idx = position("Date");
        let open_idx = position("Open");
        let high_idx = position("High");
        let low_idx = position("Low");
        let close_idx = position("Close");
        let volume_idx = position("Volume");

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));
            let number = |idx: Option<usize>| cell(idx).and_then(parse_number);

            rows.push(RawBar {
                date: cell(date_idx).and_then(parse_date),
                open: number(open_idx),
                high: number(high_idx),
                low: number(low_idx),
                close: number(close_idx),
                volume: number(volume_idx),
            });
        }

        Ok(PriceTable::new(columns, rows))
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let day = cell.get(..10).unwrap_or(cell);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_columns_in_any_order() {
        let data = "\
Volume,Close,Date,Low,High,Open,Symbol
1500,10.5,2024-01-02,9.5,11.0,10.0,ABC
1600,11.0,2024-01-03,10.0,11.5,10.5,ABC
";
        let table = CsvPriceLoader::from_reader(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.missing_columns().is_empty());
        let row = &table.rows()[1];
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(row.close, Some(11.0));
        assert_eq!(row.volume, Some(1600.0));
    }

    #[test]
    fn test_bad_cells_become_missing() {
        let data = "\
Date,Open,High,Low,Close,Volume
2024-01-02,10.0,,9.5,abc,100
not-a-date,10.0,11.0,9.5,10.2,NaN
";
        let table = CsvPriceLoader::from_reader(data.as_bytes()).unwrap();

        assert_eq!(table.rows()[0].high, None);
        assert_eq!(table.rows()[0].close, None);
        assert_eq!(table.rows()[1].date, None);
        assert_eq!(table.rows()[1].volume, None);
    }

    #[test]
    fn test_datetime_dates_are_truncated() {
        let data = "Date,Open,High,Low,Close,Volume\n2024-03-05 00:00:00,1,2,0.5,1.5,10\n";
        let table = CsvPriceLoader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_missing_columns_are_reported_by_table() {
        let data = "Date,Open,Close\n2024-01-02,1,2\n";
        let table = CsvPriceLoader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.missing_columns(), vec!["High", "Low", "Volume"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvPriceLoader::from_path("/nonexistent/prices.csv").unwrap_err();
        assert!(matches!(err, crate::domain::errors::PredictionError::Io(_)));
    }
}
