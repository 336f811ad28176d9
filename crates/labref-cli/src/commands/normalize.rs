use std::path::Path;

use super::load_config;

pub fn run(name: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    let normalizer = load_config(config_path)?.normalizer();

    let canonical = normalizer.normalize(name);
    println!("{canonical}");
    println!("  key: {}", normalizer.identity_key(&canonical));

    Ok(())
}
