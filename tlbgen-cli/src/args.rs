//! Command-line arguments.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use tlbgen::{Dialect, Generator, MissingTypes};

/// Output dialect selected on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialectArg {
    /// winapi 0.2
    #[value(name = "0.2")]
    Winapi02,
    /// winapi 0.3
    #[value(name = "0.3")]
    Winapi03,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Winapi02 => Dialect::Winapi02,
            DialectArg::Winapi03 => Dialect::Winapi03,
        }
    }
}

/// Handling of referenced types that cannot be loaded.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum MissingTypesArg {
    /// Stop with an error.
    Fail,
    /// Substitute `__missing_type__` and continue.
    Placeholder,
}

impl From<MissingTypesArg> for MissingTypes {
    fn from(arg: MissingTypesArg) -> Self {
        match arg {
            MissingTypesArg::Fail => MissingTypes::Fail,
            MissingTypesArg::Placeholder => MissingTypes::Placeholder,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tlbgen",
    version,
    about = "Generate winapi FFI declarations from a type-library manifest"
)]
pub struct Args {
    /// Path of the type-library manifest
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Output dialect
    #[arg(long, value_enum, default_value = "0.3")]
    pub dialect: DialectArg,

    /// Write declarations to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// What to do with referenced types that cannot be loaded
    #[arg(long, value_enum, default_value = "fail")]
    pub missing_types: MissingTypesArg,

    /// Emit dual dispatch interfaces from their interface half
    #[arg(long)]
    pub dual_interfaces: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Builds the generator described by the arguments.
    #[must_use]
    pub fn generator(&self) -> Generator {
        Generator::new()
            .dialect(self.dialect.into())
            .missing_types(self.missing_types.into())
            .dual_interfaces(self.dual_interfaces)
    }

    /// Returns the log filter directive implied by `-v`, if any.
    #[must_use]
    pub fn log_directive(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
