use anyhow::{bail, Result};
use zettel_core::Prefix;

use crate::cli::OutputFormat;
use crate::output::print_json;

/// `zk prefix`: read the prefix of `name`, or mint one from the clock
pub fn execute(name: Option<&str>, format: OutputFormat) -> Result<()> {
    let prefix = match name {
        Some(name) => match Prefix::extract(name) {
            Some(prefix) => prefix,
            None => bail!("'{}' does not start with a zk prefix", name),
        },
        None => Prefix::now(),
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "prefix": prefix })),
        OutputFormat::Table => {
            println!("{}", prefix);
            Ok(())
        }
    }
}
