use clap::Parser;

/// Reads every configured Renogy device once and prints the decoded registers as JSON
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Only read the device with this name
    #[clap(short = 'd', long = "device")]
    pub device: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
