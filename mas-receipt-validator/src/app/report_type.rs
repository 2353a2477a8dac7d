use std::fmt::Display;

/// Output formats the validation report can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportType {
    /// Plain text, one field per line
    #[default]
    Txt,
    /// A single JSON document containing every receipt attribute
    Json,
}

impl ReportType {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(report_type: &str) -> Option<Self> {
        match report_type.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Display for ReportType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Txt => write!(fmt, "txt"),
            ReportType::Json => write!(fmt, "json"),
        }
    }
}
