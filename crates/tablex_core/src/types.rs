use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format requested for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    #[serde(alias = "xls", alias = "xlsx")]
    Excel,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xls" | "xlsx" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            other => Err(format!("Unsupported format: {other}")),
        }
    }
}

/// Quoting policy applied by the CSV serializer.
///
/// Both policies produce valid RFC-4180 output; they differ only in which
/// cells get wrapped in double quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CsvQuoting {
    /// Every cell is quoted.
    #[default]
    Always,
    /// Only cells containing a comma, quote or line break are quoted.
    IfNeeded,
}

impl fmt::Display for CsvQuoting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::IfNeeded => f.write_str("if-needed"),
        }
    }
}

impl FromStr for CsvQuoting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" | "always-quote" => Ok(Self::Always),
            "if-needed" | "quote-if-needed" | "necessary" => Ok(Self::IfNeeded),
            other => Err(format!("Unknown CSV quoting policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!(" json ".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_serde_is_lowercase() {
        let json = serde_json::to_string(&ExportFormat::Excel).unwrap();
        assert_eq!(json, "\"excel\"");
        let parsed: ExportFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(parsed, ExportFormat::Csv);
    }

    #[test]
    fn test_csv_quoting_names() {
        assert_eq!(
            serde_json::to_string(&CsvQuoting::IfNeeded).unwrap(),
            "\"if-needed\""
        );
        assert_eq!("always-quote".parse::<CsvQuoting>().unwrap(), CsvQuoting::Always);
        assert_eq!(CsvQuoting::IfNeeded.to_string(), "if-needed");
    }

    #[test]
    fn test_default_format_is_excel() {
        assert_eq!(ExportFormat::default(), ExportFormat::Excel);
    }
}
