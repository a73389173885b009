// File I/O: ledger import and trace report export

pub mod ledger;
pub mod report;

pub use ledger::{read_dataset, sheet_names};
pub use report::{write_json, write_report_csv, write_report_xlsx};
