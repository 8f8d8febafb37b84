use clap::ValueEnum;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables and colored verdicts
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}
