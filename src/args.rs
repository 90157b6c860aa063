use clap::Parser;

/// Assigns roll numbers to applicants and allots them to examination venues and labs.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the run: input tables, column names and rules.
    /// For more information about the file format, read the documentation of the
    /// `seat_allocation::manual` module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory path, optional) Where to write the output tables. Setting this option
    /// overrides the directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) A reference file containing a summary in JSON format. If provided,
    /// rollallot will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (integer, optional) The first roll number. Overrides the configuration.
    #[clap(long, value_parser)]
    pub roll_start: Option<u64>,

    /// (number in (0, 1], optional) The usable fraction of the capacity of each lab.
    /// Overrides the configuration.
    #[clap(long, value_parser)]
    pub buffer_fraction: Option<f64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
