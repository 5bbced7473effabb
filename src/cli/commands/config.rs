use anyhow::Result;

use crate::Config;

/// Print every effective setting with the layer it came from.
pub fn execute_config_command(config: &Config) -> Result<()> {
    println!("Effective configuration:");
    let effective = config.effective_config();
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  [{source}]");
    }
    Ok(())
}
