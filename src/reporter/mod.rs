pub mod json;
pub mod terminal;

use crate::report::AggregatedReport;

pub trait Reporter {
    fn report(&self, report: &AggregatedReport) -> String;
}
