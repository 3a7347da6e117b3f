use std::path::Path;

use crate::output::output_data;
use crate::sqlite::fetch_all_rows;

pub fn handle_sqlite_command(
    path: &Path,
    table: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = fetch_all_rows(path, table)?;
    output_data(&rows, format)?;
    Ok(())
}
