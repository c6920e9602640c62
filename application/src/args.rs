//! [`Args`] definitions.

use clap::Parser;

/// Backend server of the travel packages catalogue.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// Missing file is fine, defaults and `CONF.*` environment variables are
    /// used then.
    #[arg(short, long, env = "CONF_FILE", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn takes_config_path() {
        let args = Args::try_parse_from(["server", "-c", "prod.toml"]).unwrap();

        assert_eq!(args.config, "prod.toml");
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["server", "--verbose"]).is_err());
    }
}
