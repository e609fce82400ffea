use crate::config::ServerConfig;
use crate::push::VapidKeys;

pub fn run_vapid_show(data_dir: String, json: bool) -> anyhow::Result<()> {
    let config = ServerConfig::with_data_dir(data_dir);
    let path = config.vapid_path();

    if !path.exists() {
        anyhow::bail!(
            "VAPID key file not found at {}. Run 'herald admin init' first.",
            path.display()
        );
    }

    let keys = VapidKeys::load(&path)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "public_key": keys.public_key() }))?
        );
    } else {
        println!("{}", keys.public_key());
    }

    Ok(())
}
