// SQLite glue: value conversion, parameter binding and result extraction.
//
// - params: named and positional binding of `RowValues`
// - query: running bound statements and building `ResultSet`s

pub mod params;
pub mod query;

pub use params::{bind_named, bind_positional, row_value_to_sqlite_value};
pub use query::{build_result_set, run_bound, sqlite_extract_value};
