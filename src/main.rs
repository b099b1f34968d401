use anyhow::Context;
use float_folder::replay::{ReplayRunner, ReplayScript};
use float_folder::FolderConfig;
use log::info;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = FolderConfig::load();
    let script_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.last_script.clone());

    let script = match &script_path {
        Some(path) => {
            info!("replaying {}", path.display());
            ReplayScript::load(path)
                .with_context(|| format!("loading replay script {}", path.display()))?
        }
        None => {
            info!("no script given, replaying the built-in two-page reorder");
            ReplayScript::demo().context("parsing the built-in script")?
        }
    };

    let profile = script
        .profile
        .clone()
        .unwrap_or_else(|| config.profile.clone());
    let report = ReplayRunner::new(profile)
        .run(&script.steps)
        .context("replay failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
