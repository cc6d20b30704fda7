//! CSV projection of saved queries: one row per (query, sample) pair.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::{
    error::{QueryError, Result},
    model::SavedQuery,
};

pub const CSV_COLUMNS: [&str; 6] =
    ["location", "startDate", "endDate", "date", "temp", "description"];

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn export_all_filename() -> &'static str {
    "weather_data.csv"
}

pub fn export_one_filename(id: &str) -> String {
    format!("weather_query_{id}.csv")
}

/// Flatten `records` (in the given order) into CSV text with a header row.
///
/// Records without samples contribute no rows; an empty input still yields the header.
/// Every text column is quoted, including numeric-looking locations such as zip
/// codes; only `temp` is written bare.
pub fn project<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a SavedQuery>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_COLUMNS.map(quoted))
        .map_err(csv_error)?;

    for query in records {
        let location = quoted(&query.raw_location);
        let start = quoted(&query.date_range.start().format(DATE_FORMAT).to_string());
        let end = quoted(&query.date_range.end().format(DATE_FORMAT).to_string());

        for sample in &query.samples {
            let date = quoted(&sample.date.format(DATE_FORMAT).to_string());
            let temp = sample.temperature.to_string();
            writer
                .write_record([
                    location.as_str(),
                    start.as_str(),
                    end.as_str(),
                    date.as_str(),
                    temp.as_str(),
                    quoted(&sample.description).as_str(),
                ])
                .map_err(csv_error)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| QueryError::store(format!("Failed to finish CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| QueryError::store(format!("CSV was not UTF-8: {e}")))
}

// The writer never quotes on its own, so text fields arrive pre-escaped.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_error(err: csv::Error) -> QueryError {
    QueryError::store(format!("Failed to write CSV: {err}"))
}
