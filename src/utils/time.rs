use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today(offset: FixedOffset) -> NaiveDate {
    now().with_timezone(&offset).date_naive()
}

/// `DD/MM/YYYY, HH.MM.SS` in the given offset, the layout of the id-ID locale.
pub fn format_local(dt: DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset)
        .format("%d/%m/%Y, %H.%M.%S")
        .to_string()
}
