use std::path::PathBuf;

use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command};

use mas_receipt::util::identity::{FixedIdentity, DEFAULT_INTERFACE};

use crate::app::{error::RuntimeError, report_type::ReportType};

/// Option to set the application bundle or receipt file to check
pub const OPTION_PATH: &str = "path";
/// Option to treat the path as a receipt file instead of an application bundle
pub const OPTION_RECEIPT: &str = "receipt";
/// Option to set the network interface that identifies this machine
pub const OPTION_INTERFACE: &str = "interface";
/// Option to provide the machine identifier directly
pub const OPTION_MACHINE_ID: &str = "machine-id";
/// Option to skip the identity hash check
pub const OPTION_SKIP_IDENTITY_HASH: &str = "skip-identity-hash";
/// Option to set the report format
pub const OPTION_FORMAT: &str = "format";

/// Report formats the CLI can emit
pub const SUPPORTED_FORMATS: &str = "txt, json";

/// Represents the options the user passed to the validator
#[derive(Debug)]
pub struct Options {
    /// The application bundle, or the receipt file if `is_receipt` is set
    pub path: PathBuf,
    /// Whether `path` points directly at a receipt file
    pub is_receipt: bool,
    /// The network interface used to identify this machine
    pub interface: Option<String>,
    /// A machine identifier that overrides the network interface
    pub machine_id: Option<FixedIdentity>,
    /// Whether to recompute and compare the identity hash
    pub verify_identity_hash: bool,
    /// The format the report is printed in
    pub format: ReportType,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let path = args.get_one::<String>(OPTION_PATH);
        let is_receipt = args.get_flag(OPTION_RECEIPT);
        let interface = args.get_one::<String>(OPTION_INTERFACE);
        let machine_id = args.get_one::<String>(OPTION_MACHINE_ID);
        let skip_identity_hash = args.get_flag(OPTION_SKIP_IDENTITY_HASH);
        let format = args.get_one::<String>(OPTION_FORMAT);

        // Ensure a path was provided
        let path = path.ok_or_else(|| {
            RuntimeError::InvalidOptions(format!(
                "An application bundle or receipt path is required (`{OPTION_PATH}`)"
            ))
        })?;

        // Ensure the machine is identified only one way
        if interface.is_some() && machine_id.is_some() {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option --{OPTION_INTERFACE} cannot be used with --{OPTION_MACHINE_ID}"
            )));
        }

        // Ensure identity options are not passed when they would be ignored
        if skip_identity_hash && (interface.is_some() || machine_id.is_some()) {
            return Err(RuntimeError::InvalidOptions(format!(
                "Options --{OPTION_INTERFACE} and --{OPTION_MACHINE_ID} have no effect with --{OPTION_SKIP_IDENTITY_HASH}"
            )));
        }

        // Ensure the machine identifier is valid hex
        let machine_id = match machine_id {
            Some(digits) => Some(FixedIdentity::from_hex(digits).map_err(|why| {
                RuntimeError::InvalidOptions(format!("Invalid --{OPTION_MACHINE_ID}: {why}"))
            })?),
            None => None,
        };

        // Ensure the report format is supported
        let format = match format {
            Some(format) => ReportType::from_cli(format).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{format} is not a valid report format! Must be one of <{SUPPORTED_FORMATS}>"
                ))
            })?,
            None => ReportType::default(),
        };

        Ok(Options {
            path: PathBuf::from(path),
            is_receipt,
            interface: interface.cloned(),
            machine_id,
            verify_identity_hash: !skip_identity_hash,
            format,
        })
    }
}

/// Build the command line interface
pub fn get_command() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_PATH)
                .help("Path to the application bundle, i.e. /Applications/Example.app")
                .value_name("PATH")
                .required(true)
                .display_order(0),
        )
        .arg(
            Arg::new(OPTION_RECEIPT)
                .short('r')
                .long(OPTION_RECEIPT)
                .help("Treat PATH as a receipt file instead of an application bundle\nThe bundle's Info.plist is not checked in this mode\n")
                .action(ArgAction::SetTrue)
                .display_order(1),
        )
        .arg(
            Arg::new(OPTION_INTERFACE)
                .short('i')
                .long(OPTION_INTERFACE)
                .help(format!("Network interface whose hardware address identifies this machine\nIf omitted, the default is `{DEFAULT_INTERFACE}`\n"))
                .value_name("NAME")
                .display_order(2),
        )
        .arg(
            Arg::new(OPTION_MACHINE_ID)
                .short('m')
                .long(OPTION_MACHINE_ID)
                .help("Machine identifier as hex digits, i.e. 00:1b:63:84:45:e6\nUse this to check a receipt issued for another machine\n")
                .value_name("HEX")
                .display_order(3),
        )
        .arg(
            Arg::new(OPTION_SKIP_IDENTITY_HASH)
                .long(OPTION_SKIP_IDENTITY_HASH)
                .help("Do not check that the receipt was issued for this machine\n")
                .action(ArgAction::SetTrue)
                .display_order(4),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
                .short('f')
                .long(OPTION_FORMAT)
                .help("Specify the report format\nIf omitted, the default is `txt`\n")
                .value_name(SUPPORTED_FORMATS)
                .display_order(5),
        )
}
