use std::{fs, path::PathBuf};

use tracing::debug;

use mas_receipt::{
    error::receipt::ReceiptError,
    receipt::{
        container::ReceiptContainer, fields::ReceiptAttributes, parser::ReceiptValidator,
        validation::ValidationPolicy,
    },
    util::{
        bundle::{AppBundle, BundleInfo},
        identity::{HostIdentity, NetworkInterface},
    },
};

use crate::{
    app::{error::RuntimeError, options::Options, report_type::ReportType},
    reporters::{
        json::JSON,
        reporter::{Report, Reporter},
        txt::TXT,
    },
};

/// Stores the application state and handles application lifecycle
pub struct Config {
    /// App configuration options
    pub options: Options,
    /// The receipt file that will be checked
    pub receipt_path: PathBuf,
    /// The identity the application bundle declares, if a bundle was provided
    pub bundle_info: Option<BundleInfo>,
}

impl Config {
    /// Create a new instance of the application, reading the bundle's `Info.plist` if needed
    pub fn new(options: Options) -> Result<Config, RuntimeError> {
        let (receipt_path, bundle_info) = if options.is_receipt {
            (options.path.clone(), None)
        } else {
            let bundle = AppBundle::new(&options.path)?;
            let info = bundle.info()?;
            debug!(
                bundle = %bundle.path().display(),
                identifier = %info.identifier,
                "read bundle info"
            );
            (bundle.receipt_path(), Some(info))
        };

        Ok(Config {
            options,
            receipt_path,
            bundle_info,
        })
    }

    /// Build the validation policy from the user's options and the bundle's declared identity
    pub fn policy(&self) -> ValidationPolicy {
        let mut policy = ValidationPolicy::default();
        if let Some(info) = &self.bundle_info {
            policy = policy.expect_bundle(info);
        }
        if !self.options.verify_identity_hash {
            policy = policy.without_identity_hash();
        }
        policy
    }

    /// Determine how this machine is identified
    pub fn identity(&self) -> Box<dyn HostIdentity> {
        match (&self.options.machine_id, &self.options.interface) {
            (Some(machine_id), _) => Box::new(machine_id.clone()),
            (None, Some(interface)) => Box::new(NetworkInterface::new(interface.as_str())),
            (None, None) => Box::new(NetworkInterface::default()),
        }
    }

    /// Check the receipt and collect everything needed to report on it
    pub fn run(&self) -> Report {
        let bytes = match fs::read(&self.receipt_path) {
            Ok(bytes) => bytes,
            Err(why) => {
                let why = ReceiptError::NotFound {
                    path: self.receipt_path.clone(),
                    why,
                };
                debug!(%why, "unable to read receipt");
                return self.report(false, None, Some(why.to_string()));
            }
        };

        // Display and validation both work from the same bytes
        let (attributes, mut problem) = match ReceiptContainer::from_bytes(&bytes) {
            Ok(container) => (Some(ReceiptAttributes::from(&container)), None),
            Err(why) => (None, Some(ReceiptError::from(why).to_string())),
        };

        let validator = ReceiptValidator::new(self.policy(), self.identity());
        let valid = match validator.check_bytes(&bytes) {
            Ok(_) => true,
            Err(why) => {
                // A decode failure already explains why the check failed
                if problem.is_none() {
                    problem = Some(why.to_string());
                }
                false
            }
        };
        debug!(receipt = %self.receipt_path.display(), valid, "checked receipt");

        self.report(valid, attributes, problem)
    }

    fn report(
        &self,
        valid: bool,
        attributes: Option<ReceiptAttributes>,
        problem: Option<String>,
    ) -> Report {
        Report {
            receipt_path: self.receipt_path.clone(),
            valid,
            attributes,
            problem,
            bundle: self.bundle_info.clone(),
        }
    }

    /// Render a report in the format the user requested
    pub fn render(&self, report: &Report) -> String {
        match self.options.format {
            ReportType::Txt => TXT::new(report).render(),
            ReportType::Json => JSON::new(report).render(),
        }
    }
}
