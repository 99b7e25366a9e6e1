//! Injectable time source.
//!
//! Contract text embeds the current date, saved files embed a timestamp, and
//! the PDF carries a creation date. All three read from a `Clock` so a fixed
//! clock gives byte-identical output.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date printed on the contract.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock. The printed date follows the machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC on the given date. Returns `None` for an invalid date.
    pub fn on(year: i32, month: u32, day: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .map(FixedClock)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Date as printed on contracts: `dd/mm/yyyy`.
pub fn format_contract_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// PDF date string, e.g. `D:20261017093000Z`.
pub fn format_pdf_date(instant: DateTime<Utc>) -> String {
    instant.format("D:%Y%m%d%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_is_stable() {
        let clock = FixedClock::on(2026, 3, 9).unwrap();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(format_contract_date(clock.today()), "09/03/2026");
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(FixedClock::on(2026, 2, 30).is_none());
    }

    #[test]
    fn test_pdf_date_format() {
        let clock = FixedClock::on(2026, 10, 17).unwrap();
        assert_eq!(format_pdf_date(clock.now()), "D:20261017000000Z");
    }
}
