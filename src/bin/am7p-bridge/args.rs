use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "AM7P_OPTIONS", default_value = "/data/options.json")]
    pub options: PathBuf,

    #[arg(long, env = "AM7P_MQTT_CLIENT_ID", default_value = "am7p-bridge")]
    pub client_id: String,
}
