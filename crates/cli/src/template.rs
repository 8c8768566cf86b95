//! `smaster template`: empty input batch with the required headers.

use std::path::PathBuf;

use seriesmaster_config::Settings;
use seriesmaster_recon::input_template;

use crate::CliError;

const TEMPLATE_SHEET: &str = "Updates";

pub fn cmd_template(output: PathBuf, settings: &Settings) -> Result<(), CliError> {
    let table = input_template(&settings.schema);
    seriesmaster_io::write_table(&table, &output, TEMPLATE_SHEET).map_err(CliError::io)?;
    eprintln!("wrote {} ({})", output.display(), table.columns.join(", "));
    Ok(())
}
