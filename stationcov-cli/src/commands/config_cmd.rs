use crate::config::{render_toml, FileConfig};
use crate::error::CliResult;

/// Print the effective optimizer configuration (file over defaults).
pub fn run(file: &FileConfig) -> CliResult<()> {
    print!("{}", render_toml(&file.optimizer_config())?);
    Ok(())
}
